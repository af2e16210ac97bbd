// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Connection tester
//!
//! Probes a registered model with a fixed canary prompt and derives a
//! health score from the success ratio and observed latency. Probes fan
//! out concurrently under the shared in-flight limiter; one probe failing
//! or timing out never aborts the others.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::settings::ProbeConfig;
use crate::error::Result;
use crate::monitor::{EventRecord, PerformanceMonitor};
use crate::provider::{InvokeParams, InvokerTable};
use crate::registry::ModelRegistry;

/// Provider-agnostic canary prompt used by every probe
pub const CANARY_PROMPT: &str = "Reply with the single word: pong";

/// Outcome of one `test_connection` call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub model_id: String,
    pub total_tests: u32,
    pub successful_tests: u32,
    /// Average latency over successful probes; zero when none succeeded
    pub avg_response_time: Duration,
    /// Combined success/latency score in [0, 1]
    pub health_score: f64,
    pub is_healthy: bool,
    pub timestamp: DateTime<Utc>,
}

/// Health formula: 70% success ratio, 30% latency headroom against the
/// configured baseline. Deterministic given its inputs.
pub fn health_score(
    successful_tests: u32,
    total_tests: u32,
    avg_response_time: Duration,
    speed_baseline_secs: f64,
) -> f64 {
    let success_ratio = if total_tests == 0 {
        0.0
    } else {
        successful_tests as f64 / total_tests as f64
    };
    let speed_term = if speed_baseline_secs > 0.0 {
        (1.0 - avg_response_time.as_secs_f64() / speed_baseline_secs).clamp(0.0, 1.0)
    } else {
        0.0
    };
    0.7 * success_ratio + 0.3 * speed_term
}

/// Issues bounded canary probes against registered models
pub struct ConnectionTester {
    registry: Arc<ModelRegistry>,
    invokers: InvokerTable,
    monitor: Arc<PerformanceMonitor>,
    config: ProbeConfig,
    limiter: Arc<Semaphore>,
}

impl ConnectionTester {
    /// Create a tester sharing the system-wide in-flight limiter
    pub fn new(
        registry: Arc<ModelRegistry>,
        invokers: InvokerTable,
        monitor: Arc<PerformanceMonitor>,
        config: ProbeConfig,
        limiter: Arc<Semaphore>,
    ) -> Self {
        Self {
            registry,
            invokers,
            monitor,
            config,
            limiter,
        }
    }

    /// Probe a model and compute its health metrics. Fails with NotFound
    /// for unregistered IDs; provider failures are folded into the result.
    pub async fn test_connection(&self, model_id: &str) -> Result<TestResult> {
        let model = self.registry.get(model_id).await?;
        let invoker = self.invokers.get(model.provider)?;

        let params = InvokeParams::default().with_timeout(self.config.timeout());
        let probes = (0..self.config.probe_count).map(|_| {
            let invoker = invoker.clone();
            let params = params.clone();
            let limiter = self.limiter.clone();
            let model_name = model.model_name.clone();
            async move {
                // Closed semaphores don't occur here; treat it as a failed probe
                let Ok(_permit) = limiter.acquire().await else {
                    return None;
                };
                match timeout(params.timeout, invoker.invoke(&model_name, CANARY_PROMPT, &params))
                    .await
                {
                    Ok(Ok(invocation)) => Some(invocation),
                    Ok(Err(error)) => {
                        tracing::debug!(model_name = %model_name, %error, "probe failed");
                        None
                    }
                    Err(_) => {
                        tracing::debug!(model_name = %model_name, "probe timed out");
                        None
                    }
                }
            }
        });

        let outcomes = join_all(probes).await;
        let timestamp = Utc::now();

        let total_tests = self.config.probe_count;
        let successes: Vec<_> = outcomes.iter().flatten().collect();
        let successful_tests = successes.len() as u32;
        let avg_response_time = if successes.is_empty() {
            Duration::ZERO
        } else {
            let total: Duration = successes.iter().map(|i| i.latency).sum();
            total / successful_tests
        };

        let score = health_score(
            successful_tests,
            total_tests,
            avg_response_time,
            self.config.speed_baseline_secs,
        );

        for outcome in &outcomes {
            self.monitor.record(EventRecord {
                model_id: model.model_id.clone(),
                timestamp,
                success: outcome.is_some(),
                latency: outcome.as_ref().map(|i| i.latency),
                cost: outcome
                    .as_ref()
                    .map(|i| f64::from(i.total_tokens()) * model.cost_per_token)
                    .unwrap_or(0.0),
            });
        }

        let result = TestResult {
            model_id: model.model_id,
            total_tests,
            successful_tests,
            avg_response_time,
            health_score: score,
            is_healthy: score >= self.config.healthy_threshold,
            timestamp,
        };
        tracing::info!(
            model_id = %result.model_id,
            successful = result.successful_tests,
            total = result.total_tests,
            health_score = result.health_score,
            "connection test finished"
        );
        Ok(result)
    }
}
