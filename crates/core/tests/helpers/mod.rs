//! Test harness for dialog integration tests.
//!
//! In-memory directory, friend-request service, and notifier that record every
//! call. Lookup latency is simulated with `tokio::time::sleep`, so tests run on
//! a paused clock.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use linkup_core::{
    ApiError, Candidate, DialogServices, EdgeService, FriendRequestDialog, LinkupConfig, Notice,
    Notifier, UserDirectory,
};

/// Something comfortably past the 220 ms debounce.
pub const SETTLE: Duration = Duration::from_millis(300);

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    response: Result<Vec<Candidate>, ApiError>,
}

#[derive(Default)]
pub struct FakeDirectory {
    scripts: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub fn respond(&self, keyword: &str, users: Vec<Candidate>) {
        self.respond_after(keyword, Duration::ZERO, users);
    }

    pub fn respond_after(&self, keyword: &str, delay: Duration, users: Vec<Candidate>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(keyword.to_string(), Scripted { delay, response: Ok(users) });
    }

    pub fn fail(&self, keyword: &str, err: ApiError) {
        self.scripts
            .lock()
            .unwrap()
            .insert(keyword.to_string(), Scripted { delay: Duration::ZERO, response: Err(err) });
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl UserDirectory for FakeDirectory {
    async fn search_users(&self, keyword: &str) -> Result<Vec<Candidate>, ApiError> {
        self.calls.lock().unwrap().push(keyword.to_string());
        let script = self.scripts.lock().unwrap().get(keyword).cloned();
        match script {
            Some(s) => {
                if !s.delay.is_zero() {
                    tokio::time::sleep(s.delay).await;
                }
                s.response
            }
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Default)]
pub struct FakeEdges {
    responses: Mutex<VecDeque<Result<String, ApiError>>>,
    calls: Mutex<Vec<(String, String)>>,
    delay: Mutex<Duration>,
}

impl FakeEdges {
    /// Make every following request take `delay` to answer.
    pub fn answer_after(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn push(&self, response: Result<String, ApiError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EdgeService for FakeEdges {
    async fn establish_edge(&self, candidate_id: &str, message: &str) -> Result<String, ApiError> {
        self.calls.lock().unwrap().push((candidate_id.to_string(), message.to_string()));
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Đã gửi lời mời kết bạn".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub struct Harness {
    pub dialog: FriendRequestDialog,
    pub directory: Arc<FakeDirectory>,
    pub edges: Arc<FakeEdges>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(&LinkupConfig::default())
    }

    pub fn with_config(config: &LinkupConfig) -> Self {
        let directory = Arc::new(FakeDirectory::default());
        let edges = Arc::new(FakeEdges::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let services = DialogServices {
            directory: directory.clone(),
            edges: edges.clone(),
            notifier: notifier.clone(),
        };
        Self { dialog: FriendRequestDialog::new(services, config), directory, edges, notifier }
    }

    /// Type `keyword` and let the debounce and lookup finish.
    pub async fn search(&self, keyword: &str) {
        self.dialog.on_keyword_change(keyword);
        tokio::time::sleep(SETTLE).await;
    }
}

pub fn user(id: &str, display_name: &str, username: &str) -> Candidate {
    Candidate::new(id, display_name, username)
}
