//! Linkup - debounced user search and friend-request confirmation.
//!
//! The dialog is headless: it owns no UI, only state and the async work that
//! feeds it. Front ends drive it with input events and render the snapshots
//! it publishes.
//!
//! # Modules
//!
//! - [`types`] - Keyword, candidates, outcome, dialog state
//! - [`store`] - Shared dialog state with generation-based staleness checks
//! - [`cancel`] - Cancellation tokens, task handles, trailing-edge debouncer
//! - [`search`] - Search coordinator and confirm-time resolution
//! - [`confirm`] - Friend-request confirmation flow
//! - [`dialog`] - Coordinator and flow wired to one store
//! - [`service`] - Collaborator traits (directory, friend requests, notices)
//! - [`config`] - `.linkup.toml` loading
//! - [`error`] - Error types

pub mod cancel;
pub mod config;
pub mod confirm;
pub mod dialog;
pub mod error;
pub mod search;
pub mod service;
pub mod store;
pub mod types;

pub use config::{load_config, try_load_config, LinkupConfig};
pub use confirm::{EdgeConfirmationFlow, SubmitOutcome};
pub use dialog::{DialogServices, FriendRequestDialog};
pub use error::{ApiError, ConfigError};
pub use search::{resolve_confirm, SearchCoordinator};
pub use service::{EdgeService, Notice, NoticeKind, Notifier, TracingNotifier, UserDirectory};
pub use store::{DialogStore, SubmitTicket};
pub use types::{Candidate, DialogPhase, DialogState, Keyword, PendingEdgeRequest, SearchOutcome};
