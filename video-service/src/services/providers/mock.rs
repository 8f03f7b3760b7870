//! Scripted provider for tests.

use super::{ProviderError, QueueUpdateSender, VideoProvider};
use crate::models::QueueUpdate;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What a scripted call resolves to.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Resolve with this payload.
    Resolve(Value),
    /// Resolve with `{"data": <input>, "requestId": "mock-<n>"}`.
    Echo,
    /// Reject with an API error.
    Reject {
        status: u16,
        message: String,
        body: Option<Value>,
    },
}

/// Mock video provider for testing.
///
/// Publishes its scripted updates, waits `delay`, then resolves with its
/// outcome. Records every input it receives.
pub struct MockVideoProvider {
    outcome: MockOutcome,
    updates: Vec<QueueUpdate>,
    delay: Duration,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    inputs: Mutex<Vec<Value>>,
}

impl MockVideoProvider {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            updates: Vec::new(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn with_updates(mut self, updates: Vec<QueueUpdate>) -> Self {
        self.updates = updates;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of completed or in-flight calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls that ran to resolution.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<Value> {
        self.inputs.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl VideoProvider for MockVideoProvider {
    async fn subscribe(
        &self,
        input: Value,
        updates: QueueUpdateSender,
    ) -> Result<Value, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Ok(mut inputs) = self.inputs.lock() {
            inputs.push(input.clone());
        }

        for update in &self.updates {
            let _ = updates.send(update.clone());
        }
        drop(updates);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            MockOutcome::Resolve(value) => Ok(value.clone()),
            MockOutcome::Echo => Ok(json!({
                "data": input,
                "requestId": format!("mock-{n}"),
            })),
            MockOutcome::Reject {
                status,
                message,
                body,
            } => Err(ProviderError::Api {
                status: *status,
                message: message.clone(),
                body: body.clone(),
            }),
        }
    }

    fn model(&self) -> &str {
        "mock/video"
    }
}
