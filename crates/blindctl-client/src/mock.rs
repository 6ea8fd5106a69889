//! In-memory [`Transport`] for tests.
//!
//! Records every request and replies with canned bodies. Endpoints marked
//! as failing return [`NetworkError::ConnectionFailed`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::endpoint::Endpoint;
use crate::error::{NetworkError, Result};
use crate::transport::Transport;

/// A recorded call: endpoint plus the POST payload (`None` for GET).
pub type RecordedRequest = (Endpoint, Option<Value>);

#[derive(Default)]
struct MockState {
    requests: Vec<RecordedRequest>,
    responses: HashMap<Endpoint, VecDeque<Value>>,
    failing: HashSet<Endpoint>,
}

/// Test transport that never touches the network.
#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `endpoint`. The last queued reply is reused once
    /// the queue is down to one entry.
    pub fn with_response(self, endpoint: Endpoint, body: Value) -> Self {
        self.push_response(endpoint, body);
        self
    }

    /// Make every call to `endpoint` fail.
    pub fn with_failure(self, endpoint: Endpoint) -> Self {
        self.set_failing(endpoint, true);
        self
    }

    pub fn push_response(&self, endpoint: Endpoint, body: Value) {
        self.lock()
            .responses
            .entry(endpoint)
            .or_default()
            .push_back(body);
    }

    /// Replace any queued replies for `endpoint` with `body`.
    pub fn set_response(&self, endpoint: Endpoint, body: Value) {
        self.lock()
            .responses
            .insert(endpoint, VecDeque::from([body]));
    }

    pub fn set_failing(&self, endpoint: Endpoint, failing: bool) {
        let mut state = self.lock();
        if failing {
            state.failing.insert(endpoint);
        } else {
            state.failing.remove(&endpoint);
        }
    }

    /// All requests seen so far, in call order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Payloads posted to `endpoint`, in call order.
    pub fn payloads(&self, endpoint: Endpoint) -> Vec<Value> {
        self.lock()
            .requests
            .iter()
            .filter(|(e, _)| *e == endpoint)
            .filter_map(|(_, payload)| payload.clone())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded calls.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn respond(&self, endpoint: Endpoint, payload: Option<Value>) -> Result<Value> {
        let mut state = self.lock();
        state.requests.push((endpoint, payload));

        if state.failing.contains(&endpoint) {
            return Err(NetworkError::ConnectionFailed(format!(
                "mock failure for {endpoint}"
            )));
        }

        let reply = match state.responses.get_mut(&endpoint) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        Ok(reply.unwrap_or_else(|| default_reply(endpoint)))
    }
}

fn default_reply(endpoint: Endpoint) -> Value {
    match endpoint {
        Endpoint::Remotes | Endpoint::WifiNetworks => json!([]),
        _ => json!({"message": "ok"}),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, endpoint: Endpoint) -> Result<Value> {
        self.respond(endpoint, None)
    }

    async fn post(&self, endpoint: Endpoint, payload: Value) -> Result<Value> {
        self.respond(endpoint, Some(payload))
    }
}
