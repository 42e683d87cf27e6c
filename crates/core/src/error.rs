//! Error types for collaborator calls and config loading.
//!
//! Dialog operations themselves never fail; failures of the directory and
//! friend-request services are caught where the call is issued.

use std::path::PathBuf;

/// Failure of a call to the external user service.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Human-readable message supplied by the server, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message: Some(m), .. } if !m.trim().is_empty() => Some(m.as_str()),
            _ => None,
        }
    }
}

/// Failure to read or parse `.linkup.toml`.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for `{key}`: {reason}")]
    Value { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_only_for_status_with_text() {
        let e = ApiError::Status { status: 409, message: Some("Đã gửi lời mời trước đó".into()) };
        assert_eq!(e.server_message(), Some("Đã gửi lời mời trước đó"));

        let blank = ApiError::Status { status: 500, message: Some("  ".into()) };
        assert_eq!(blank.server_message(), None);

        assert_eq!(ApiError::Transport("refused".into()).server_message(), None);
    }

    #[test]
    fn status_display_includes_message_when_present() {
        let e = ApiError::Status { status: 404, message: Some("gone".into()) };
        assert_eq!(e.to_string(), "server responded 404: gone");
        let bare = ApiError::Status { status: 502, message: None };
        assert_eq!(bare.to_string(), "server responded 502");
    }
}
