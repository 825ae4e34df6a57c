//! Test gateways: mock `GenerationGateway` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use storyloom_core::error::StoryError;
use storyloom_core::gateway::{GenerationGateway, GenerationRequest};
use tokio::sync::{Semaphore, watch};

fn next_scripted(
    responses: &Mutex<VecDeque<Result<String, StoryError>>>,
) -> Result<String, StoryError> {
    responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(StoryError::GenerationFailed("script exhausted".into())))
}

/// A gateway that replays a fixed list of results in order and records every
/// request it receives. Once the script is exhausted every call fails.
#[derive(Debug)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, StoryError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    /// Create a gateway that answers successive calls with `responses`.
    #[must_use]
    pub fn new(responses: Vec<Result<String, StoryError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a gateway whose calls all succeed with the given texts.
    #[must_use]
    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_owned())).collect())
    }

    /// Returns a snapshot of all requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, StoryError> {
        self.requests.lock().unwrap().push(request.clone());
        next_scripted(&self.responses)
    }
}

/// A gateway that always fails. Useful for testing error-handling paths.
#[derive(Debug)]
pub struct FailingGateway;

#[async_trait]
impl GenerationGateway for FailingGateway {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, StoryError> {
        Err(StoryError::GenerationFailed("connection refused".into()))
    }
}

/// A scripted gateway whose calls block until the test releases them, for
/// exercising requests that are still outstanding.
#[derive(Debug)]
pub struct GatedGateway {
    responses: Mutex<VecDeque<Result<String, StoryError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
    calls: watch::Sender<usize>,
    gate: Semaphore,
}

impl GatedGateway {
    /// Create a gated gateway that answers successive calls with `texts`.
    #[must_use]
    pub fn replying(texts: &[&str]) -> Self {
        Self {
            responses: Mutex::new(texts.iter().map(|t| Ok((*t).to_owned())).collect()),
            requests: Mutex::new(Vec::new()),
            calls: watch::Sender::new(0),
            gate: Semaphore::new(0),
        }
    }

    /// Waits until at least `count` calls have arrived.
    ///
    /// # Panics
    ///
    /// Panics if the call counter channel is closed.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut calls = self.calls.subscribe();
        calls.wait_for(|n| *n >= count).await.unwrap();
    }

    /// Lets `count` blocked calls return.
    pub fn release(&self, count: usize) {
        self.gate.add_permits(count);
    }

    /// Returns a snapshot of all requests received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationGateway for GatedGateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, StoryError> {
        self.requests.lock().unwrap().push(request.clone());
        let response = next_scripted(&self.responses);
        self.calls.send_modify(|n| *n += 1);

        self.gate
            .acquire()
            .await
            .map_err(|e| StoryError::GenerationFailed(e.to_string()))?
            .forget();
        response
    }
}
