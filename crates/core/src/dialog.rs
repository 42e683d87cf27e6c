//! The friend-request dialog: one store shared by a search coordinator and a
//! confirmation flow, behind a single handle.

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::LinkupConfig;
use crate::confirm::{EdgeConfirmationFlow, SubmitOutcome};
use crate::search::SearchCoordinator;
use crate::service::{EdgeService, Notifier, UserDirectory};
use crate::store::DialogStore;
use crate::types::{Candidate, DialogState};

/// Collaborators the dialog talks to.
#[derive(Clone)]
pub struct DialogServices {
    pub directory: Arc<dyn UserDirectory>,
    pub edges: Arc<dyn EdgeService>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct FriendRequestDialog {
    store: Arc<DialogStore>,
    search: SearchCoordinator,
    confirm: EdgeConfirmationFlow,
}

impl FriendRequestDialog {
    pub fn new(services: DialogServices, config: &LinkupConfig) -> Self {
        Self::with_store(Arc::new(DialogStore::new()), services, config)
    }

    /// Build the dialog around an existing store.
    pub fn with_store(store: Arc<DialogStore>, services: DialogServices, config: &LinkupConfig) -> Self {
        let search = SearchCoordinator::new(Arc::clone(&store), services.directory, config.debounce());
        let confirm = EdgeConfirmationFlow::new(Arc::clone(&store), services.edges, services.notifier)
            .with_fallback(config.submit_error_fallback.clone());
        Self { store, search, confirm }
    }

    pub fn snapshot(&self) -> DialogState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<DialogState> {
        self.store.subscribe()
    }

    pub fn search(&self) -> &SearchCoordinator {
        &self.search
    }

    pub fn confirm(&self) -> &EdgeConfirmationFlow {
        &self.confirm
    }

    pub fn on_keyword_change(&self, raw: &str) {
        self.search.on_keyword_change(raw);
    }

    pub fn on_confirm_submit(&self, keyword: &str) -> Option<Candidate> {
        self.search.on_confirm_submit(keyword)
    }

    pub fn on_select_candidate(&self, candidate: Candidate) {
        self.search.on_select_candidate(candidate);
    }

    pub fn set_message(&self, text: &str) -> bool {
        self.confirm.set_message(text)
    }

    pub async fn on_submit(&self) -> SubmitOutcome {
        self.confirm.on_submit().await
    }

    pub fn on_back(&self) {
        self.confirm.on_back();
    }

    pub fn on_cancel(&self) {
        self.confirm.on_cancel();
    }

    /// Close the dialog. Pending and in-flight lookups are discarded.
    pub fn teardown(&self) {
        self.search.teardown();
    }
}
