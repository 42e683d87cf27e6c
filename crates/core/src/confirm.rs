//! Edge-confirmation flow: compose and send a friend request to the selected
//! candidate, then reset the dialog or keep it open for a retry.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::service::{EdgeService, Notice, Notifier};
use crate::store::DialogStore;
use crate::types::SearchOutcome;

/// Fallback shown when a failed request carries no server message.
pub const DEFAULT_SUBMIT_FALLBACK: &str = "Không thể gửi lời mời kết bạn";

/// What a call to [`EdgeConfirmationFlow::on_submit`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum SubmitOutcome {
    /// Nothing selected, or a submission was already running.
    Skipped,
    Sent(String),
    Failed(String),
}

pub struct EdgeConfirmationFlow {
    store: Arc<DialogStore>,
    edges: Arc<dyn EdgeService>,
    notifier: Arc<dyn Notifier>,
    fallback: String,
}

impl EdgeConfirmationFlow {
    pub fn new(
        store: Arc<DialogStore>,
        edges: Arc<dyn EdgeService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { store, edges, notifier, fallback: DEFAULT_SUBMIT_FALLBACK.to_string() }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn is_open(&self) -> bool {
        self.store.snapshot().outcome == SearchOutcome::Found
    }

    pub fn set_message(&self, text: &str) -> bool {
        self.store.set_message(text)
    }

    /// Send the friend request. Success notifies and resets the dialog;
    /// failure notifies and keeps the selection and message for a retry.
    pub async fn on_submit(&self) -> SubmitOutcome {
        let Some((ticket, request)) = self.store.begin_submit() else {
            return SubmitOutcome::Skipped;
        };
        let message = request.trimmed_message();

        match self.edges.establish_edge(&request.recipient_id, message).await {
            Ok(confirmation) => {
                info!(recipient = %request.recipient_id, "friend request sent");
                self.notifier.notify(Notice::success(confirmation.clone()));
                self.store.finish_submit(ticket, true);
                SubmitOutcome::Sent(confirmation)
            }
            Err(e) => {
                warn!(recipient = %request.recipient_id, error = %e, "friend request failed");
                let text = e.server_message().unwrap_or(self.fallback.as_str()).to_string();
                self.notifier.notify(Notice::error(text.clone()));
                self.store.finish_submit(ticket, false);
                SubmitOutcome::Failed(text)
            }
        }
    }

    /// Back to the search screen with keyword and results intact.
    pub fn on_back(&self) {
        self.store.back();
    }

    /// Full reset. Calling it twice is the same as calling it once.
    pub fn on_cancel(&self) {
        self.store.reset();
    }
}
