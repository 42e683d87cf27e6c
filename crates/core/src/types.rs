//! Core types shared across Linkup: the search keyword, candidate records returned
//! by the user directory, the tri-state search outcome, the pending friend request,
//! and the dialog state that ties them together.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Keyword
// ---------------------------------------------------------------------------

/// Search keyword as typed by the user, stored trimmed.
///
/// Comparisons against candidates go through [`Keyword::folded`], so "An" and
/// " an " address the same user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Keyword(String);

impl Keyword {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Case-folded form used for exact-match resolution.
    pub fn folded(&self) -> String {
        fold(&self.0)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim and lowercase. Unicode-aware so Vietnamese names fold correctly.
pub fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// A remote user record eligible as a friend-request target.
///
/// Field names follow the REST API's JSON (`_id`, `displayName`, `username`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, alias = "handle")]
    pub username: String,
    #[serde(default, alias = "avatarUrl", skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl Candidate {
    pub fn new(id: &str, display_name: &str, username: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            username: username.to_string(),
            avatar: None,
        }
    }

    /// True when the folded display name or username equals `folded_keyword`.
    pub fn matches_exactly(&self, folded_keyword: &str) -> bool {
        fold(&self.display_name) == folded_keyword || fold(&self.username) == folded_keyword
    }
}

// ---------------------------------------------------------------------------
// Outcome + pending request
// ---------------------------------------------------------------------------

/// Whether a confirmed match exists for the current keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchOutcome {
    #[default]
    Unknown,
    Found,
    NotFound,
}

/// The friend request being composed while the confirmation form is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEdgeRequest {
    pub recipient_id: String,
    /// Raw message text; trimmed only when submitted.
    pub message: String,
}

impl PendingEdgeRequest {
    pub fn new(recipient_id: &str) -> Self {
        Self { recipient_id: recipient_id.to_string(), message: String::new() }
    }

    pub fn trimmed_message(&self) -> &str {
        self.message.trim()
    }
}

/// Which screen of the dialog is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogPhase {
    Searching,
    Confirming,
}

// ---------------------------------------------------------------------------
// Dialog state
// ---------------------------------------------------------------------------

/// Everything the dialog shows. Published to observers as a snapshot after
/// each change; only [`crate::store::DialogStore`] mutates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DialogState {
    pub keyword: Keyword,
    pub results: Vec<Candidate>,
    /// Keyword whose lookup produced `results`. `None` while nothing has landed.
    pub results_for: Option<Keyword>,
    pub outcome: SearchOutcome,
    /// Keyword named in the "not found" message after a failed confirm.
    pub unresolved: Option<Keyword>,
    pub selected: Option<Candidate>,
    pub pending: Option<PendingEdgeRequest>,
    /// A friend request is in flight.
    pub submitting: bool,
}

impl DialogState {
    pub fn phase(&self) -> DialogPhase {
        if self.outcome == SearchOutcome::Found {
            DialogPhase::Confirming
        } else {
            DialogPhase::Searching
        }
    }

    /// Inline status shown under the search field, if any.
    pub fn inline_message(&self) -> Option<String> {
        match (self.outcome, &self.unresolved) {
            (SearchOutcome::NotFound, Some(kw)) => {
                Some(format!("Không tìm thấy người dùng \"{kw}\""))
            }
            _ => None,
        }
    }

    /// Check the selection/outcome invariants. Used by tests and debug assertions.
    pub fn is_consistent(&self) -> bool {
        let selection_ok = self.selected.is_some() == (self.outcome == SearchOutcome::Found);
        let pending_ok = match (&self.pending, &self.selected) {
            (Some(p), Some(c)) => p.recipient_id == c.id,
            (Some(_), None) => false,
            (None, _) => true,
        };
        selection_ok && pending_ok
    }
}
