// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Comparator
//!
//! Runs one prompt across several models concurrently and returns a
//! uniform side-by-side result set. A failing model yields an error entry
//! in its slot; entries always come back in input order and the result
//! length always equals the number of models requested.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use uuid::Uuid;

use crate::error::{EvalError, ProviderError, Result};
use crate::monitor::{EventRecord, PerformanceMonitor};
use crate::provider::{InvokeParams, InvokerTable};
use crate::registry::model::Model;
use crate::registry::ModelRegistry;

/// What one model produced for the shared prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// The model answered
    Text { text: String },
    /// The invocation failed; the message describes why
    Error { message: String },
}

/// One model's slot in a comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub model_id: String,
    pub outcome: EntryOutcome,
    /// Latency of the call; zero for failures
    pub latency: Duration,
    /// Tokens billed (prompt + completion); zero for failures
    pub tokens: u32,
    /// Attributed cost in USD
    pub cost: f64,
}

impl ComparisonEntry {
    /// Whether this slot holds a successful answer
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Text { .. })
    }
}

/// Side-by-side result of one `compare` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub id: Uuid,
    pub prompt: String,
    /// One entry per requested model, in input order
    pub entries: Vec<ComparisonEntry>,
    pub timestamp: DateTime<Utc>,
}

/// Per-model timeout applied to each comparison invocation
const COMPARE_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs one prompt across several registered models
pub struct Comparator {
    registry: Arc<ModelRegistry>,
    invokers: InvokerTable,
    monitor: Arc<PerformanceMonitor>,
    limiter: Arc<Semaphore>,
    per_model_timeout: Duration,
}

impl Comparator {
    /// Create a comparator sharing the system-wide in-flight limiter
    pub fn new(
        registry: Arc<ModelRegistry>,
        invokers: InvokerTable,
        monitor: Arc<PerformanceMonitor>,
        limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            registry,
            invokers,
            monitor,
            limiter,
            per_model_timeout: COMPARE_TIMEOUT,
        }
    }

    /// Override the per-model timeout
    pub fn with_timeout(mut self, per_model_timeout: Duration) -> Self {
        self.per_model_timeout = per_model_timeout;
        self
    }

    /// Invoke each model exactly once with the prompt. Validation covers
    /// the shape of the request and that every ID resolves; after that,
    /// per-model failures land in the entries rather than aborting.
    pub async fn compare(&self, model_ids: &[String], prompt: &str) -> Result<ComparisonResult> {
        if model_ids.len() < 2 {
            return Err(EvalError::Validation(
                "compare needs at least two models".to_string(),
            ));
        }
        if prompt.trim().is_empty() {
            return Err(EvalError::Validation("prompt must not be empty".to_string()));
        }
        for (i, id) in model_ids.iter().enumerate() {
            if model_ids[..i].contains(id) {
                return Err(EvalError::Validation(format!(
                    "model '{}' listed more than once",
                    id
                )));
            }
        }

        // Resolve everything up front so an unknown ID fails the call
        // instead of producing a half-validated result.
        let mut models = Vec::with_capacity(model_ids.len());
        for id in model_ids {
            let model = self
                .registry
                .get(id)
                .await
                .map_err(|_| EvalError::Validation(format!("unknown model '{}'", id)))?;
            models.push(model);
        }

        let params = InvokeParams::default()
            .with_timeout(self.per_model_timeout)
            .with_max_tokens(1024);
        let invocations = models.iter().map(|model| {
            let params = params.clone();
            let limiter = self.limiter.clone();
            let invoker = self.invokers.get(model.provider);
            async move {
                let invoker = invoker?;
                let _permit = limiter
                    .acquire()
                    .await
                    .map_err(|_| EvalError::Provider(ProviderError::Timeout))?;
                match timeout(
                    params.timeout,
                    invoker.invoke(&model.model_name, prompt, &params),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(EvalError::Provider(ProviderError::Timeout)),
                }
            }
        });

        let outcomes = join_all(invocations).await;
        let timestamp = Utc::now();

        let entries: Vec<ComparisonEntry> = models
            .iter()
            .zip(outcomes)
            .map(|(model, outcome)| Self::build_entry(model, outcome))
            .collect();

        for entry in &entries {
            self.monitor.record(EventRecord {
                model_id: entry.model_id.clone(),
                timestamp,
                success: entry.is_success(),
                latency: entry.is_success().then_some(entry.latency),
                cost: entry.cost,
            });
        }

        let failed = entries.iter().filter(|e| !e.is_success()).count();
        tracing::info!(models = entries.len(), failed, "comparison finished");

        Ok(ComparisonResult {
            id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            entries,
            timestamp,
        })
    }

    fn build_entry(
        model: &Model,
        outcome: Result<crate::provider::Invocation>,
    ) -> ComparisonEntry {
        match outcome {
            Ok(invocation) => {
                let tokens = invocation.total_tokens();
                ComparisonEntry {
                    model_id: model.model_id.clone(),
                    outcome: EntryOutcome::Text {
                        text: invocation.text,
                    },
                    latency: invocation.latency,
                    tokens,
                    cost: f64::from(tokens) * model.cost_per_token,
                }
            }
            Err(error) => ComparisonEntry {
                model_id: model.model_id.clone(),
                outcome: EntryOutcome::Error {
                    message: error.to_string(),
                },
                latency: Duration::ZERO,
                tokens: 0,
                cost: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::Timeframe;
    use crate::provider::mock::{MockFailure, MockInvoker};
    use crate::provider::ProviderKind;
    use crate::registry::model::{Capability, NewModel};
    use std::collections::BTreeSet;

    fn sample_model(model_id: &str, provider: ProviderKind, cost_per_token: f64) -> NewModel {
        NewModel {
            model_id: model_id.to_string(),
            provider,
            model_name: model_id.to_string(),
            display_name: model_id.to_uppercase(),
            capabilities: BTreeSet::from([Capability::TextGeneration]),
            cost_per_token,
            max_tokens: 4096,
            context_window: 8192,
            quality_score: 0.9,
            speed_score: 0.7,
            cost_score: 0.3,
            reliability_score: 0.9,
            is_default: false,
        }
    }

    async fn comparator_with(
        invokers: InvokerTable,
    ) -> (Comparator, Arc<ModelRegistry>, Arc<PerformanceMonitor>) {
        let registry = Arc::new(ModelRegistry::in_memory());
        let monitor = Arc::new(PerformanceMonitor::default());
        let comparator = Comparator::new(
            registry.clone(),
            invokers,
            monitor.clone(),
            Arc::new(Semaphore::new(8)),
        )
        .with_timeout(Duration::from_secs(1));
        (comparator, registry, monitor)
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_compare_rejects_fewer_than_two_models() {
        let (comparator, _registry, _monitor) = comparator_with(InvokerTable::new()).await;
        let result = comparator.compare(&ids(&["gpt-4"]), "hello").await;
        assert!(matches!(result, Err(EvalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_compare_rejects_empty_prompt() {
        let (comparator, _registry, _monitor) = comparator_with(InvokerTable::new()).await;
        let result = comparator.compare(&ids(&["gpt-4", "claude-3"]), "   ").await;
        assert!(matches!(result, Err(EvalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_compare_rejects_duplicate_ids() {
        let (comparator, _registry, _monitor) = comparator_with(InvokerTable::new()).await;
        let result = comparator.compare(&ids(&["gpt-4", "gpt-4"]), "hello").await;
        assert!(matches!(result, Err(EvalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_compare_rejects_unknown_id() {
        let table =
            InvokerTable::new().with(Arc::new(MockInvoker::new(ProviderKind::OpenAi)));
        let (comparator, registry, _monitor) = comparator_with(table).await;
        registry
            .create(sample_model("gpt-4", ProviderKind::OpenAi, 0.00003))
            .await
            .unwrap();

        let result = comparator.compare(&ids(&["gpt-4", "ghost"]), "hello").await;
        assert!(matches!(result, Err(EvalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_compare_preserves_input_order() {
        let table = InvokerTable::new()
            .with(Arc::new(MockInvoker::new(ProviderKind::OpenAi)))
            .with(Arc::new(MockInvoker::new(ProviderKind::Anthropic)));
        let (comparator, registry, _monitor) = comparator_with(table).await;
        registry
            .create(sample_model("gpt-4", ProviderKind::OpenAi, 0.00003))
            .await
            .unwrap();
        registry
            .create(sample_model("claude-3", ProviderKind::Anthropic, 0.000015))
            .await
            .unwrap();

        let result = comparator
            .compare(&ids(&["claude-3", "gpt-4"]), "compare me")
            .await
            .unwrap();

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.entries[0].model_id, "claude-3");
        assert_eq!(result.entries[1].model_id, "gpt-4");
        assert!(result.entries.iter().all(|e| e.is_success()));
    }

    #[tokio::test]
    async fn test_compare_failure_becomes_entry_not_omission() {
        let table = InvokerTable::new()
            .with(Arc::new(MockInvoker::new(ProviderKind::OpenAi)))
            .with(Arc::new(
                MockInvoker::new(ProviderKind::Anthropic).always_failing(MockFailure::Server),
            ));
        let (comparator, registry, monitor) = comparator_with(table).await;
        registry
            .create(sample_model("gpt-4", ProviderKind::OpenAi, 0.00003))
            .await
            .unwrap();
        registry
            .create(sample_model("claude-3", ProviderKind::Anthropic, 0.000015))
            .await
            .unwrap();

        let result = comparator
            .compare(&ids(&["gpt-4", "claude-3"]), "compare me")
            .await
            .unwrap();

        assert_eq!(result.entries.len(), 2);
        assert!(result.entries[0].is_success());
        assert!(!result.entries[1].is_success());
        match &result.entries[1].outcome {
            EntryOutcome::Error { message } => assert!(message.contains("Provider error")),
            other => panic!("expected error entry, got {:?}", other),
        }
        assert_eq!(result.entries[1].cost, 0.0);

        // Both entries recorded, success and failure alike
        let now = Utc::now();
        assert_eq!(
            monitor.get_metrics("gpt-4", Timeframe::Day, now).sample_count,
            1
        );
        let claude = monitor.get_metrics("claude-3", Timeframe::Day, now);
        assert_eq!(claude.sample_count, 1);
        assert!((claude.success_rate - 0.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_compare_cost_uses_model_rate() {
        let invoker = MockInvoker::new(ProviderKind::OpenAi)
            .with_reply("four token reply", Duration::from_millis(50));
        let table = InvokerTable::new()
            .with(Arc::new(invoker))
            .with(Arc::new(MockInvoker::new(ProviderKind::Anthropic)));
        let (comparator, registry, _monitor) = comparator_with(table).await;
        registry
            .create(sample_model("gpt-4", ProviderKind::OpenAi, 0.001))
            .await
            .unwrap();
        registry
            .create(sample_model("claude-3", ProviderKind::Anthropic, 0.002))
            .await
            .unwrap();

        let result = comparator
            .compare(&ids(&["gpt-4", "claude-3"]), "what is two plus two")
            .await
            .unwrap();

        for entry in &result.entries {
            assert!(entry.is_success());
            let rate = if entry.model_id == "gpt-4" { 0.001 } else { 0.002 };
            assert!((entry.cost - f64::from(entry.tokens) * rate).abs() < 1e-12);
            assert!(entry.tokens > 0);
        }
    }
}
