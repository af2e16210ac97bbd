// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! ModelInvoker trait and related types
//!
//! Defines the abstraction layer through which the Tester and Comparator
//! reach external providers. Implementations are registered per provider
//! tag at startup; nothing here dispatches on strings at runtime.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};

/// Closed set of supported provider backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI platform API
    OpenAi,
    /// Anthropic API
    Anthropic,
    /// Novita AI hosted open-weight models
    Novita,
    /// Local Ollama daemon
    Ollama,
}

impl ProviderKind {
    /// Canonical lowercase tag, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "open_ai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Novita => "novita",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// All supported provider tags
    pub fn all() -> &'static [ProviderKind] {
        &[
            ProviderKind::OpenAi,
            ProviderKind::Anthropic,
            ProviderKind::Novita,
            ProviderKind::Ollama,
        ]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open_ai" | "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "novita" => Ok(ProviderKind::Novita),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(EvalError::Validation(format!(
                "unknown provider '{}'",
                other
            ))),
        }
    }
}

/// Parameters for one invocation
#[derive(Debug, Clone)]
pub struct InvokeParams {
    /// Maximum tokens in the response
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Per-call timeout; on expiry only this call is marked failed
    pub timeout: Duration,
}

impl Default for InvokeParams {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            temperature: 0.0,
            timeout: Duration::from_secs(10),
        }
    }
}

impl InvokeParams {
    /// Set the per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Result of one provider invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invocation {
    /// Response text
    pub text: String,

    /// Prompt tokens consumed
    pub tokens_in: u32,

    /// Completion tokens produced
    pub tokens_out: u32,

    /// Wall-clock latency of the call
    pub latency: Duration,
}

impl Invocation {
    /// Total tokens billed for this call
    pub fn total_tokens(&self) -> u32 {
        self.tokens_in + self.tokens_out
    }
}

/// One external model call. Implemented per provider outside the core
/// components; the Tester and Comparator only ever see this trait.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Which provider this invoker serves
    fn kind(&self) -> ProviderKind;

    /// Send one prompt to the named model and wait for its completion
    async fn invoke(
        &self,
        model_name: &str,
        prompt: &str,
        params: &InvokeParams,
    ) -> Result<Invocation>;
}

/// Startup registration table mapping provider tags to invokers
#[derive(Clone, Default)]
pub struct InvokerTable {
    invokers: HashMap<ProviderKind, Arc<dyn ModelInvoker>>,
}

impl InvokerTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an invoker for its provider tag, replacing any previous one
    pub fn register(&mut self, invoker: Arc<dyn ModelInvoker>) {
        self.invokers.insert(invoker.kind(), invoker);
    }

    /// Builder-style registration
    pub fn with(mut self, invoker: Arc<dyn ModelInvoker>) -> Self {
        self.register(invoker);
        self
    }

    /// Look up the invoker for a provider
    pub fn get(&self, kind: ProviderKind) -> Result<Arc<dyn ModelInvoker>> {
        self.invokers.get(&kind).cloned().ok_or_else(|| {
            EvalError::Config(format!("no invoker registered for provider '{}'", kind))
        })
    }

    /// Whether an invoker is registered for a provider
    pub fn supports(&self, kind: ProviderKind) -> bool {
        self.invokers.contains_key(&kind)
    }

    /// Registered provider tags
    pub fn registered(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.invokers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}
