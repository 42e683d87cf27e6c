//! REST client for the user API.
//!
//! - `GET  {base}/users/search?keyword=…` → `[user, …]` or `{ "users": [user, …] }`
//! - `POST {base}/friends/requests` with `{ "recipientId", "message" }` → `{ "message": … }`
//!
//! Error responses may carry `{ "message": … }`, which ends up in
//! [`ApiError::Status`] so the dialog can show it.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use linkup_core::{ApiError, Candidate, EdgeService, LinkupConfig, UserDirectory};

/// Used when the server accepts a friend request but sends no text.
pub const DEFAULT_SENT_MESSAGE: &str = "Đã gửi lời mời kết bạn";

#[derive(Deserialize)]
#[serde(untagged)]
enum SearchBody {
    List(Vec<Candidate>),
    Wrapped { users: Vec<Candidate> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FriendRequestBody<'a> {
    recipient_id: &'a str,
    message: &'a str,
}

#[derive(Deserialize, Default)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &LinkupConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageBody>(&body).unwrap_or_default().message;
        Err(ApiError::Status { status, message })
    }
}

#[async_trait]
impl UserDirectory for ApiClient {
    async fn search_users(&self, keyword: &str) -> Result<Vec<Candidate>, ApiError> {
        let req = self.client.get(self.url("/users/search")).query(&[("keyword", keyword)]);
        let resp = self.send(req).await?;
        let body: SearchBody = resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        let users = match body {
            SearchBody::List(users) | SearchBody::Wrapped { users } => users,
        };
        debug!(keyword, count = users.len(), "search_users");
        Ok(users)
    }
}

#[async_trait]
impl EdgeService for ApiClient {
    async fn establish_edge(&self, candidate_id: &str, message: &str) -> Result<String, ApiError> {
        let body = FriendRequestBody { recipient_id: candidate_id, message };
        let req = self.client.post(self.url("/friends/requests")).json(&body);
        let resp = self.send(req).await?;
        let text = resp.text().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        let confirmation = serde_json::from_str::<MessageBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SENT_MESSAGE.to_string());
        debug!(candidate_id, "establish_edge");
        Ok(confirmation)
    }
}
