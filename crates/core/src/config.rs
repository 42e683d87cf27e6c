//! `.linkup.toml` config loading.
//!
//! Defaults are merged with whatever the file sets. Unknown keys are reported
//! with a typo suggestion instead of failing the load.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::confirm::DEFAULT_SUBMIT_FALLBACK;
use crate::error::ConfigError;

pub const CONFIG_FILE: &str = ".linkup.toml";

/// Known keys in `.linkup.toml`.
const KNOWN_CONFIG_KEYS: &[&str] =
    &["api_base_url", "api_token", "debounce_ms", "request_timeout_secs", "submit_error_fallback"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkupConfig {
    /// Base URL of the REST API, without trailing slash.
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    /// Shown when a friend request fails without a server message.
    pub submit_error_fallback: String,
}

impl Default for LinkupConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8787/api".to_string(),
            api_token: None,
            debounce_ms: 220,
            request_timeout_secs: 15,
            submit_error_fallback: DEFAULT_SUBMIT_FALLBACK.to_string(),
        }
    }
}

impl LinkupConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply `LINKUP_API_URL` / `LINKUP_API_TOKEN` if set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("LINKUP_API_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }
        if let Ok(token) = std::env::var("LINKUP_API_TOKEN") {
            if !token.trim().is_empty() {
                self.api_token = Some(token.trim().to_string());
            }
        }
        self
    }
}

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn warn_unknown_keys(table: &toml::Table) {
    for key in table.keys() {
        if KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
            continue;
        }
        let suggestion = KNOWN_CONFIG_KEYS
            .iter()
            .min_by_key(|k| edit_distance(key, k))
            .copied()
            .unwrap_or_default();
        if edit_distance(key, suggestion) <= 3 {
            warn!(
                key = key.as_str(),
                suggestion,
                "Unknown key in {CONFIG_FILE} - did you mean '{suggestion}'?"
            );
        } else {
            warn!(
                key = key.as_str(),
                "Unknown key in {CONFIG_FILE} (known keys: {})",
                KNOWN_CONFIG_KEYS.join(", ")
            );
        }
    }
}

fn positive_int(table: &toml::Table, key: &str) -> Result<Option<u64>, ConfigError> {
    match table.get(key) {
        None => Ok(None),
        Some(v) => match v.as_integer() {
            Some(n) if n > 0 => Ok(Some(n as u64)),
            _ => Err(ConfigError::Value {
                key: key.to_string(),
                reason: "expected a positive integer".to_string(),
            }),
        },
    }
}

/// Parse config text. Keys left out keep their defaults.
pub fn parse_config(content: &str, path: &Path) -> Result<LinkupConfig, ConfigError> {
    let table = content
        .parse::<toml::Table>()
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
    warn_unknown_keys(&table);

    let mut config = LinkupConfig::default();

    if let Some(url) = table.get("api_base_url").and_then(|v| v.as_str()) {
        config.api_base_url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(token) = table.get("api_token").and_then(|v| v.as_str()) {
        if !token.trim().is_empty() {
            config.api_token = Some(token.trim().to_string());
        }
    }
    if let Some(ms) = positive_int(&table, "debounce_ms")? {
        config.debounce_ms = ms;
    }
    if let Some(secs) = positive_int(&table, "request_timeout_secs")? {
        config.request_timeout_secs = secs;
    }
    if let Some(text) = table.get("submit_error_fallback").and_then(|v| v.as_str()) {
        config.submit_error_fallback = text.to_string();
    }

    Ok(config)
}

/// Load `.linkup.toml` from `dir`, failing on unreadable or invalid files.
/// A missing file yields defaults.
pub fn try_load_config(dir: &Path) -> Result<LinkupConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(LinkupConfig::default());
    }
    debug!(path = %path.display(), "Loading {CONFIG_FILE}");
    let content = std::fs::read_to_string(&path)
        .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
    parse_config(&content, &path)
}

/// Load `.linkup.toml` from `dir`, falling back to defaults with a warning.
pub fn load_config(dir: &Path) -> LinkupConfig {
    match try_load_config(dir) {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load {CONFIG_FILE}, using defaults");
            LinkupConfig::default()
        }
    }
}
