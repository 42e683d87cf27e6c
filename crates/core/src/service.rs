//! Collaborator seams: the user directory, the friend-request service, and the
//! notification sink. Implemented over HTTP in `linkup-http`, with in-memory
//! fakes in tests.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::types::Candidate;

/// Looks up users by keyword.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn search_users(&self, keyword: &str) -> Result<Vec<Candidate>, ApiError>;
}

/// Sends friend requests. Returns the server's confirmation text on success.
#[async_trait]
pub trait EdgeService: Send + Sync {
    async fn establish_edge(&self, candidate_id: &str, message: &str) -> Result<String, ApiError>;
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A toast-style message surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into() }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => info!(text = %notice.text, "notice"),
            NoticeKind::Error => warn!(text = %notice.text, "notice"),
        }
    }
}
