//! HTTP side of Linkup.
//!
//! - [`client`] - reqwest-backed [`ApiClient`] implementing the dialog's
//!   directory and friend-request seams
//! - [`stub`] - axum stand-in for the user API, for local runs and tests

pub mod client;
pub mod stub;

pub use client::ApiClient;
pub use stub::{StubError, StubState};
