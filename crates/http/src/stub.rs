//! In-memory stand-in for the user API.
//!
//! Serves the two endpoints [`crate::ApiClient`] talks to from a fixed user
//! list, so the dialog can run without the real backend. Friend requests are
//! kept in memory for the life of the process.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use linkup_core::types::fold;
use linkup_core::Candidate;

use crate::client::DEFAULT_SENT_MESSAGE;

/// Most users a single search returns.
pub const MAX_SEARCH_RESULTS: usize = 20;

/// Failure to load a user list for the stub.
#[derive(thiserror::Error, Debug)]
pub enum StubError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid user list in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentRequest {
    pub recipient_id: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct StubState {
    users: Vec<Candidate>,
    requests: Mutex<Vec<SentRequest>>,
}

impl StubState {
    pub fn new(users: Vec<Candidate>) -> Self {
        Self { users, requests: Mutex::new(Vec::new()) }
    }

    /// A handful of users to search for.
    pub fn demo() -> Self {
        Self::new(vec![
            Candidate::new("u1", "Hai Tran", "haitran"),
            Candidate::new("u2", "An Nguyen", "an2"),
            Candidate::new("u3", "An", "an"),
            Candidate::new("u4", "Lan Pham", "lanpham"),
            Candidate::new("u5", "Đức Lê", "ducle"),
        ])
    }

    /// Load users from a JSON array in the API's user shape.
    pub fn from_json_file(path: &Path) -> Result<Self, StubError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| StubError::Read { path: path.to_path_buf(), source })?;
        let users: Vec<Candidate> = serde_json::from_str(&content)
            .map_err(|source| StubError::Parse { path: path.to_path_buf(), source })?;
        Ok(Self::new(users))
    }

    pub fn users(&self) -> &[Candidate] {
        &self.users
    }

    pub fn sent_requests(&self) -> Vec<SentRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Case-insensitive substring match on display name or username.
    pub fn search(&self, keyword: &str) -> Vec<Candidate> {
        let needle = fold(keyword);
        if needle.is_empty() {
            return Vec::new();
        }
        self.users
            .iter()
            .filter(|u| fold(&u.display_name).contains(&needle) || fold(&u.username).contains(&needle))
            .take(MAX_SEARCH_RESULTS)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    keyword: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestIn {
    recipient_id: String,
    #[serde(default)]
    message: String,
}

pub async fn api_search_users(
    State(state): State<Arc<StubState>>,
    Query(q): Query<SearchQuery>,
) -> Json<Vec<Candidate>> {
    let users = state.search(&q.keyword);
    debug!(keyword = %q.keyword, count = users.len(), "stub search");
    Json(users)
}

pub async fn api_send_request(
    State(state): State<Arc<StubState>>,
    Json(body): Json<FriendRequestIn>,
) -> impl IntoResponse {
    if !state.users.iter().any(|u| u.id == body.recipient_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": "Không tìm thấy người dùng" })),
        );
    }

    let mut requests = state.requests.lock().unwrap_or_else(PoisonError::into_inner);
    if requests.iter().any(|r| r.recipient_id == body.recipient_id) {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({ "message": "Đã gửi lời mời trước đó" })),
        );
    }
    requests.push(SentRequest { recipient_id: body.recipient_id.clone(), message: body.message });
    info!(recipient = %body.recipient_id, "stub friend request stored");

    (StatusCode::OK, Json(serde_json::json!({ "message": DEFAULT_SENT_MESSAGE })))
}

pub async fn api_health() -> &'static str {
    "ok"
}

/// Routes mounted under `/api`, matching the default `api_base_url`.
pub fn router(state: Arc<StubState>) -> Router {
    let api = Router::new()
        .route("/users/search", get(api_search_users))
        .route("/friends/requests", post(api_send_request));

    Router::new()
        .route("/health", get(api_health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the stub on an already-bound listener until the future is dropped or
/// `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: Arc<StubState>, shutdown: F) -> std::io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await
}

/// Bind an ephemeral localhost port and serve the stub in the background.
/// Returns the API base URL (ending in `/api`).
pub async fn spawn_local(state: Arc<StubState>) -> std::io::Result<(String, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router(state)).await {
            warn!(%addr, error = %e, "stub server stopped");
        }
    });
    Ok((format!("http://{addr}/api"), addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_matches_name_or_handle_ignoring_case() {
        let state = StubState::demo();
        let ids: Vec<_> = state.search("AN").into_iter().map(|u| u.id).collect();
        // "Hai Tran" matches too.
        assert_eq!(ids, vec!["u1", "u2", "u3", "u4"]);
        assert_eq!(state.search("ducle")[0].id, "u5");
    }

    #[test]
    fn blank_search_returns_nothing() {
        assert!(StubState::demo().search("  ").is_empty());
    }

    #[test]
    fn user_list_loads_from_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"[{"_id":"x1","displayName":"Mai","username":"mai"}]"#).unwrap();
        let state = StubState::from_json_file(&path).unwrap();
        assert_eq!(state.users()[0].id, "x1");
    }

    #[test]
    fn bad_user_list_reports_typed_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(StubState::from_json_file(&missing), Err(StubError::Read { .. })));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "[{").unwrap();
        let err = StubState::from_json_file(&broken).unwrap_err();
        assert!(matches!(err, StubError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn search_is_capped() {
        let users = (0..50).map(|i| Candidate::new(&format!("u{i}"), "Same", "same")).collect();
        assert_eq!(StubState::new(users).search("same").len(), MAX_SEARCH_RESULTS);
    }
}
