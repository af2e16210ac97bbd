// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Mock invoker for testing
//!
//! Provides a configurable mock implementation of the ModelInvoker trait
//! that can be used in unit tests without making real provider calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{EvalError, ProviderError, Result};
use crate::provider::invoker::{Invocation, InvokeParams, ModelInvoker, ProviderKind};

/// A pre-configured outcome for the mock invoker
#[derive(Clone, Debug)]
pub enum MockOutcome {
    /// Succeed with the given text and reported latency
    Success { text: String, latency: Duration },
    /// Fail with a provider error
    Failure(MockFailure),
    /// Sleep past any reasonable timeout so the caller's deadline fires
    Hang,
}

/// Failure shapes the mock can produce
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockFailure {
    Auth,
    RateLimited,
    Server,
    Network,
}

impl MockFailure {
    fn into_error(self) -> ProviderError {
        match self {
            MockFailure::Auth => ProviderError::AuthenticationFailed,
            MockFailure::RateLimited => ProviderError::RateLimited(60),
            MockFailure::Server => ProviderError::ServerError {
                status: 500,
                message: "internal error".to_string(),
            },
            MockFailure::Network => ProviderError::Network("connection refused".to_string()),
        }
    }
}

/// A mock invoker for testing. Outcomes are consumed in order; the last
/// one repeats once the script is exhausted.
#[derive(Clone)]
pub struct MockInvoker {
    kind: ProviderKind,
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    call_count: Arc<AtomicUsize>,
    recorded_prompts: Arc<Mutex<Vec<String>>>,
}

impl MockInvoker {
    /// Create a mock that always succeeds with a canned reply
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            outcomes: Arc::new(Mutex::new(vec![MockOutcome::Success {
                text: "pong".to_string(),
                latency: Duration::from_millis(120),
            }])),
            call_count: Arc::new(AtomicUsize::new(0)),
            recorded_prompts: Arc::new(Mutex::new(vec![])),
        }
    }

    /// Replace the script with a single success outcome
    pub fn with_reply(self, text: impl Into<String>, latency: Duration) -> Self {
        *self.outcomes.lock().unwrap() = vec![MockOutcome::Success {
            text: text.into(),
            latency,
        }];
        self
    }

    /// Replace the script with an always-failing outcome
    pub fn always_failing(self, failure: MockFailure) -> Self {
        *self.outcomes.lock().unwrap() = vec![MockOutcome::Failure(failure)];
        self
    }

    /// Replace the script with an explicit outcome sequence
    pub fn with_script(self, outcomes: Vec<MockOutcome>) -> Self {
        *self.outcomes.lock().unwrap() = outcomes;
        self
    }

    /// Number of invocations made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts seen so far, in order
    pub fn recorded_prompts(&self) -> Vec<String> {
        self.recorded_prompts.lock().unwrap().clone()
    }

    fn next_outcome(&self) -> MockOutcome {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        let outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            MockOutcome::Failure(MockFailure::Server)
        } else {
            outcomes[count.min(outcomes.len() - 1)].clone()
        }
    }
}

#[async_trait]
impl ModelInvoker for MockInvoker {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn invoke(
        &self,
        _model_name: &str,
        prompt: &str,
        _params: &InvokeParams,
    ) -> Result<Invocation> {
        self.recorded_prompts
            .lock()
            .unwrap()
            .push(prompt.to_string());

        match self.next_outcome() {
            MockOutcome::Success { text, latency } => Ok(Invocation {
                tokens_in: (prompt.len() / 4).max(1) as u32,
                tokens_out: (text.len() / 4).max(1) as u32,
                text,
                latency,
            }),
            MockOutcome::Failure(failure) => Err(EvalError::Provider(failure.into_error())),
            MockOutcome::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(EvalError::Provider(ProviderError::Timeout))
            }
        }
    }
}
