//! Shared dialog state.
//!
//! One [`DialogStore`] is created per dialog and handed to both the search
//! coordinator and the confirmation flow. Every transition goes through a
//! method here so the selection invariants hold after each call, and each
//! change is published as a snapshot on a watch channel.
//!
//! A generation counter is bumped whenever the keyword changes or the dialog
//! resets. Async work captures the generation when it starts and is dropped
//! on completion if the generation has moved on. Friend-request submissions
//! are tracked by their own sequence number, so a keyword change during a
//! send never strands the in-flight flag.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::cancel::CancellationToken;
use crate::search::resolve_confirm;
use crate::types::{Candidate, DialogState, Keyword, PendingEdgeRequest, SearchOutcome};

struct Inner {
    state: DialogState,
    generation: u64,
    /// Sequence number of the submission currently in flight, if any.
    in_flight: Option<u64>,
    submissions: u64,
    closed: bool,
}

/// Handed out by [`DialogStore::begin_submit`] and given back to
/// [`DialogStore::finish_submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitTicket {
    generation: u64,
    submission: u64,
}

pub struct DialogStore {
    inner: Mutex<Inner>,
    tx: watch::Sender<DialogState>,
}

impl Default for DialogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DialogStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DialogState::default());
        Self {
            inner: Mutex::new(Inner {
                state: DialogState::default(),
                generation: 0,
                in_flight: None,
                submissions: 0,
                closed: false,
            }),
            tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, inner: &Inner) {
        debug_assert!(inner.state.is_consistent(), "dialog invariants violated: {:?}", inner.state);
        self.tx.send_replace(inner.state.clone());
    }

    pub fn snapshot(&self) -> DialogState {
        self.lock().state.clone()
    }

    /// Receive a snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<DialogState> {
        self.tx.subscribe()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    // -----------------------------------------------------------------------
    // Search side
    // -----------------------------------------------------------------------

    /// Store a new keyword and return the generation it starts. The outcome
    /// drops back to unknown; an empty keyword also clears the result list.
    pub fn set_keyword(&self, keyword: Keyword) -> u64 {
        let mut inner = self.lock();
        inner.generation += 1;
        let state = &mut inner.state;
        if keyword.is_empty() {
            state.results.clear();
            state.results_for = None;
        }
        state.keyword = keyword;
        state.outcome = SearchOutcome::Unknown;
        state.unresolved = None;
        state.selected = None;
        state.pending = None;
        let generation = inner.generation;
        self.publish(&inner);
        generation
    }

    /// Keyword to look up for `generation`, or `None` if that generation is
    /// no longer current or there is nothing to search for.
    pub fn lookup_target(&self, generation: u64) -> Option<Keyword> {
        let inner = self.lock();
        if inner.closed || inner.generation != generation || inner.state.keyword.is_empty() {
            return None;
        }
        Some(inner.state.keyword.clone())
    }

    /// Install lookup results unless they went stale. Returns whether they landed.
    pub fn apply_lookup(
        &self,
        generation: u64,
        token: &CancellationToken,
        keyword: Keyword,
        results: Vec<Candidate>,
    ) -> bool {
        let mut inner = self.lock();
        if inner.closed || inner.generation != generation || token.is_cancelled() {
            return false;
        }
        inner.state.results = results;
        inner.state.results_for = Some(keyword);
        self.publish(&inner);
        true
    }

    /// Make `candidate` the target of the friend request and open the form.
    pub fn select(&self, candidate: Candidate) {
        let mut inner = self.lock();
        select_locked(&mut inner.state, candidate);
        self.publish(&inner);
    }

    pub fn mark_not_found(&self, keyword: Keyword) {
        let mut inner = self.lock();
        mark_not_found_locked(&mut inner.state, keyword);
        self.publish(&inner);
    }

    /// Resolve `keyword` against the results held right now and record the
    /// outcome in the same critical section, so a lookup landing concurrently
    /// cannot slip in between.
    pub fn resolve_and_select(&self, keyword: &str) -> Option<Candidate> {
        let mut inner = self.lock();
        let chosen = resolve_confirm(&inner.state.results, keyword).cloned();
        match &chosen {
            Some(candidate) => select_locked(&mut inner.state, candidate.clone()),
            None => mark_not_found_locked(&mut inner.state, Keyword::new(keyword)),
        }
        self.publish(&inner);
        chosen
    }

    // -----------------------------------------------------------------------
    // Confirmation side
    // -----------------------------------------------------------------------

    /// Edit the request message. Ignored when no form is open.
    pub fn set_message(&self, text: &str) -> bool {
        let mut inner = self.lock();
        let Some(pending) = inner.state.pending.as_mut() else {
            return false;
        };
        pending.message = text.to_string();
        self.publish(&inner);
        true
    }

    /// Mark a submission as in flight. Returns the request to send with its
    /// ticket, or `None` if there is nothing to submit or a submission is
    /// already running.
    pub fn begin_submit(&self) -> Option<(SubmitTicket, PendingEdgeRequest)> {
        let mut inner = self.lock();
        if inner.closed || inner.in_flight.is_some() || inner.state.selected.is_none() {
            return None;
        }
        let pending = inner.state.pending.clone()?;
        inner.submissions += 1;
        let ticket = SubmitTicket { generation: inner.generation, submission: inner.submissions };
        inner.in_flight = Some(ticket.submission);
        inner.state.submitting = true;
        self.publish(&inner);
        Some((ticket, pending))
    }

    /// Settle the submission behind `ticket`. The in-flight flag is always
    /// released if it still belongs to this submission. Success resets the
    /// dialog only when the keyword has not changed since the send started;
    /// failure leaves selection and message in place.
    pub fn finish_submit(&self, ticket: SubmitTicket, succeeded: bool) {
        let mut inner = self.lock();
        if inner.in_flight != Some(ticket.submission) {
            return;
        }
        inner.in_flight = None;
        inner.state.submitting = false;
        if succeeded && inner.generation == ticket.generation {
            reset_locked(&mut inner);
        }
        self.publish(&inner);
    }

    /// Return to the search screen, keeping keyword and results.
    pub fn back(&self) {
        let mut inner = self.lock();
        let state = &mut inner.state;
        state.outcome = SearchOutcome::Unknown;
        state.unresolved = None;
        state.selected = None;
        state.pending = None;
        self.publish(&inner);
    }

    /// Clear everything and invalidate in-flight work.
    pub fn reset(&self) {
        let mut inner = self.lock();
        reset_locked(&mut inner);
        self.publish(&inner);
    }

    /// Permanently stop accepting async results.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.generation += 1;
    }
}

fn reset_locked(inner: &mut Inner) {
    inner.generation += 1;
    inner.in_flight = None;
    inner.state = DialogState::default();
}

fn select_locked(state: &mut DialogState, candidate: Candidate) {
    state.pending = Some(PendingEdgeRequest::new(&candidate.id));
    state.selected = Some(candidate);
    state.outcome = SearchOutcome::Found;
    state.unresolved = None;
}

fn mark_not_found_locked(state: &mut DialogState, keyword: Keyword) {
    state.outcome = SearchOutcome::NotFound;
    state.unresolved = Some(keyword);
    state.selected = None;
    state.pending = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_token() -> (CancellationToken, crate::cancel::CancellationHandle) {
        CancellationToken::new()
    }

    #[test]
    fn empty_keyword_clears_results() {
        let store = DialogStore::new();
        let gen = store.set_keyword(Keyword::new("hai"));
        let (token, _h) = live_token();
        assert!(store.apply_lookup(gen, &token, Keyword::new("hai"), vec![Candidate::new("u1", "Hai", "hai")]));

        store.set_keyword(Keyword::new("   "));
        let s = store.snapshot();
        assert!(s.results.is_empty());
        assert!(s.results_for.is_none());
        assert_eq!(s.outcome, SearchOutcome::Unknown);
    }

    #[test]
    fn stale_generation_is_rejected() {
        let store = DialogStore::new();
        let old = store.set_keyword(Keyword::new("k1"));
        store.set_keyword(Keyword::new("k2"));
        let (token, _h) = live_token();
        assert!(!store.apply_lookup(old, &token, Keyword::new("k1"), vec![Candidate::new("a", "A", "a")]));
        assert!(store.snapshot().results.is_empty());
        assert!(store.lookup_target(old).is_none());
    }

    #[test]
    fn cancelled_token_is_rejected() {
        let store = DialogStore::new();
        let gen = store.set_keyword(Keyword::new("k1"));
        let (token, handle) = live_token();
        handle.cancel();
        assert!(!store.apply_lookup(gen, &token, Keyword::new("k1"), vec![]));
        assert!(store.snapshot().results_for.is_none());
    }

    #[test]
    fn closed_store_ignores_lookups() {
        let store = DialogStore::new();
        let gen = store.set_keyword(Keyword::new("k1"));
        store.close();
        assert!(store.lookup_target(gen).is_none());
    }

    #[test]
    fn select_then_back_keeps_keyword_and_results() {
        let store = DialogStore::new();
        let gen = store.set_keyword(Keyword::new("an"));
        let (token, _h) = live_token();
        let results = vec![Candidate::new("u1", "An", "an")];
        store.apply_lookup(gen, &token, Keyword::new("an"), results.clone());

        store.select(results[0].clone());
        assert_eq!(store.snapshot().pending.unwrap().recipient_id, "u1");

        store.back();
        let s = store.snapshot();
        assert_eq!(s.outcome, SearchOutcome::Unknown);
        assert!(s.selected.is_none());
        assert!(s.pending.is_none());
        assert_eq!(s.keyword.as_str(), "an");
        assert_eq!(s.results, results);
    }

    #[test]
    fn message_requires_open_form() {
        let store = DialogStore::new();
        assert!(!store.set_message("hello"));
        store.select(Candidate::new("u1", "An", "an"));
        assert!(store.set_message(" hello "));
        assert_eq!(store.snapshot().pending.unwrap().message, " hello ");
    }

    #[test]
    fn second_begin_submit_is_refused_while_in_flight() {
        let store = DialogStore::new();
        store.select(Candidate::new("u1", "An", "an"));
        let (ticket, req) = store.begin_submit().unwrap();
        assert_eq!(req.recipient_id, "u1");
        assert!(store.begin_submit().is_none());

        store.finish_submit(ticket, false);
        let s = store.snapshot();
        assert!(!s.submitting);
        assert_eq!(s.selected.unwrap().id, "u1");
    }

    #[test]
    fn finish_submit_after_reset_leaves_state_alone() {
        let store = DialogStore::new();
        store.select(Candidate::new("u1", "An", "an"));
        let (ticket, _) = store.begin_submit().unwrap();
        store.reset();
        store.set_keyword(Keyword::new("new"));
        store.finish_submit(ticket, true);
        assert_eq!(store.snapshot().keyword.as_str(), "new");
    }

    #[test]
    fn keyword_change_during_submit_releases_in_flight_flag() {
        let store = DialogStore::new();
        store.select(Candidate::new("u1", "An", "an"));
        let (ticket, _) = store.begin_submit().unwrap();
        store.set_keyword(Keyword::new("lan"));
        store.finish_submit(ticket, true);

        let s = store.snapshot();
        assert!(!s.submitting);
        assert_eq!(s.keyword.as_str(), "lan");

        store.select(Candidate::new("u4", "Lan Pham", "lanpham"));
        assert!(store.begin_submit().is_some());
    }

    #[test]
    fn late_finish_does_not_release_a_newer_submission() {
        let store = DialogStore::new();
        store.select(Candidate::new("u1", "An", "an"));
        let (old, _) = store.begin_submit().unwrap();
        store.reset();
        store.select(Candidate::new("u2", "Hai", "hai"));
        let (_current, _) = store.begin_submit().unwrap();

        store.finish_submit(old, false);
        assert!(store.snapshot().submitting);
        assert!(store.begin_submit().is_none());
    }

    #[test]
    fn resolve_and_select_records_outcome() {
        let store = DialogStore::new();
        let gen = store.set_keyword(Keyword::new("an"));
        let (token, _h) = live_token();
        let results = vec![Candidate::new("u2", "An Nguyen", "an2"), Candidate::new("u3", "An", "an")];
        store.apply_lookup(gen, &token, Keyword::new("an"), results);

        assert_eq!(store.resolve_and_select(" AN ").unwrap().id, "u3");
        assert_eq!(store.snapshot().pending.unwrap().recipient_id, "u3");

        store.set_keyword(Keyword::new(""));
        assert!(store.resolve_and_select("zed").is_none());
        let s = store.snapshot();
        assert_eq!(s.outcome, SearchOutcome::NotFound);
        assert_eq!(s.unresolved.unwrap().as_str(), "zed");
    }

    #[test]
    fn subscribers_see_changes() {
        let store = DialogStore::new();
        let mut rx = store.subscribe();
        store.set_keyword(Keyword::new("x"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().keyword.as_str(), "x");
    }
}
