//! Search coordinator: keyword input, debounced user lookup, and confirm-time
//! resolution of the keyword to a single candidate.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::cancel::Debouncer;
use crate::service::UserDirectory;
use crate::store::DialogStore;
use crate::types::{fold, Candidate, Keyword};

/// Quiet period between the last keystroke and the lookup.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(220);

/// Resolve a confirm keyword against the current results.
///
/// An exact (trimmed, case-folded) match on display name or username wins.
/// Otherwise the first result is taken, even if it has nothing to do with the
/// keyword. `None` only when there are no results.
pub fn resolve_confirm<'a>(results: &'a [Candidate], keyword: &str) -> Option<&'a Candidate> {
    let folded = fold(keyword);
    results.iter().find(|c| c.matches_exactly(&folded)).or_else(|| results.first())
}

pub struct SearchCoordinator {
    store: Arc<DialogStore>,
    directory: Arc<dyn UserDirectory>,
    debouncer: Mutex<Debouncer>,
}

impl SearchCoordinator {
    pub fn new(store: Arc<DialogStore>, directory: Arc<dyn UserDirectory>, debounce: Duration) -> Self {
        Self { store, directory, debouncer: Mutex::new(Debouncer::new(debounce)) }
    }

    pub fn store(&self) -> &Arc<DialogStore> {
        &self.store
    }

    /// Handle an input event. Empty input clears results right away; anything
    /// else (re)starts the debounce timer. Must be called inside a Tokio runtime.
    pub fn on_keyword_change(&self, raw: &str) {
        let keyword = Keyword::new(raw);
        let mut debouncer = self.debouncer.lock().unwrap_or_else(PoisonError::into_inner);
        debouncer.cancel();
        let generation = self.store.set_keyword(keyword.clone());

        if keyword.is_empty() {
            debug!("keyword cleared");
            return;
        }

        let store = Arc::clone(&self.store);
        let directory = Arc::clone(&self.directory);
        debug!(keyword = %keyword, generation, "lookup scheduled");
        debouncer.schedule(move |token| async move {
            let Some(keyword) = store.lookup_target(generation) else {
                return;
            };
            debug!(keyword = %keyword, "lookup issued");
            let results = match directory.search_users(keyword.as_str()).await {
                Ok(users) => users,
                Err(e) => {
                    warn!(keyword = %keyword, error = %e, "user lookup failed");
                    Vec::new()
                }
            };
            let count = results.len();
            if store.apply_lookup(generation, &token, keyword.clone(), results) {
                debug!(keyword = %keyword, count, "lookup applied");
            } else {
                debug!(keyword = %keyword, "stale lookup discarded");
            }
        });
    }

    /// Resolve `keyword` against the current results and record the outcome.
    /// Returns the chosen candidate, if any.
    pub fn on_confirm_submit(&self, keyword: &str) -> Option<Candidate> {
        let chosen = self.store.resolve_and_select(keyword);
        match &chosen {
            Some(candidate) => debug!(keyword, id = %candidate.id, "keyword resolved"),
            None => debug!(keyword, "keyword did not resolve"),
        }
        chosen
    }

    /// Pick a candidate directly, skipping resolution.
    pub fn on_select_candidate(&self, candidate: Candidate) {
        self.store.select(candidate);
    }

    /// Stop the pending timer and make in-flight lookups stale.
    pub fn teardown(&self) {
        self.debouncer.lock().unwrap_or_else(PoisonError::into_inner).cancel();
        self.store.close();
    }
}

impl Drop for SearchCoordinator {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Candidate> {
        vec![Candidate::new("u1", "An Nguyen", "an2"), Candidate::new("u2", "An", "an")]
    }

    #[test]
    fn exact_handle_match_beats_list_order() {
        let results = sample();
        assert_eq!(resolve_confirm(&results, "an").unwrap().id, "u2");
    }

    #[test]
    fn exact_match_is_trimmed_and_case_folded() {
        let results = sample();
        assert_eq!(resolve_confirm(&results, "  AN NGUYEN ").unwrap().id, "u1");
    }

    #[test]
    fn no_exact_match_falls_back_to_first() {
        let results = sample();
        assert_eq!(resolve_confirm(&results, "zzz").unwrap().id, "u1");
    }

    #[test]
    fn empty_results_resolve_to_nothing() {
        assert!(resolve_confirm(&[], "an").is_none());
    }
}
