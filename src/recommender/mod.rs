// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Recommender
//!
//! Multi-criteria ranking over active registry entries for a request
//! profile. The ranking is a pure function of registry state and the
//! request: no randomness, no wall clock. Observed monitor metrics ride
//! along for explainability but never influence the order.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::settings::RecommenderConfig;
use crate::error::Result;
use crate::monitor::{Metrics, PerformanceMonitor, Timeframe};
use crate::registry::model::{Capability, Model, ModelFilter, ModelStatus};
use crate::registry::ModelRegistry;

/// Requirement level for one ranking criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Criterion weight before normalization
    pub fn weight(&self) -> f64 {
        match self {
            Priority::Low => 0.2,
            Priority::Medium => 0.5,
            Priority::High => 0.8,
        }
    }
}

/// What the caller wants the model for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    TextGeneration,
    Analysis,
    Coding,
    Evaluation,
    Summarization,
    Translation,
}

impl TaskType {
    /// Capability tags that qualify a model for this task. A model needs
    /// at least one of them.
    pub fn relevant_capabilities(&self) -> &'static [Capability] {
        match self {
            TaskType::TextGeneration => &[Capability::TextGeneration],
            TaskType::Analysis => &[Capability::Analysis],
            TaskType::Coding => &[Capability::Coding],
            TaskType::Evaluation => &[Capability::Evaluation, Capability::Analysis],
            TaskType::Summarization => {
                &[Capability::Summarization, Capability::TextGeneration]
            }
            TaskType::Translation => &[Capability::Translation, Capability::TextGeneration],
        }
    }
}

/// Request profile driving one recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub budget_level: Priority,
    pub quality_requirement: Priority,
    pub speed_requirement: Priority,
    pub task_type: TaskType,
    /// Tokens one request is expected to need; models with a smaller
    /// context window are filtered out
    pub expected_tokens: u32,
    /// Expected monthly request volume, used for the cost estimate
    pub monthly_requests: u32,
}

/// Weighted terms behind one composite score, for explainability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Normalized quality weight times the model's quality score
    pub quality_term: f64,
    /// Normalized speed weight times the model's speed score
    pub speed_term: f64,
    /// Normalized budget weight times (1 - cost score)
    pub budget_term: f64,
    /// Fixed 0.1 times the model's reliability score
    pub reliability_term: f64,
    /// expected_tokens * monthly_requests * cost_per_token, in USD
    pub estimated_monthly_cost: f64,
}

/// One ranked candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedModel {
    pub model_id: String,
    pub composite_score: f64,
    pub breakdown: ScoreBreakdown,
    /// Observed 7-day metrics, informational only
    pub observed: Option<Metrics>,
}

/// Ranked list plus a reason when it is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub rankings: Vec<RankedModel>,
    /// Set when no candidate survived filtering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Composite score and its breakdown for one model under one request.
/// The quality/speed/budget weights are normalized to sum 1; reliability
/// contributes a fixed 0.1 on top.
pub fn composite_score(model: &Model, request: &RecommendationRequest) -> (f64, ScoreBreakdown) {
    let w_quality = request.quality_requirement.weight();
    let w_speed = request.speed_requirement.weight();
    let w_budget = request.budget_level.weight();
    let weight_sum = w_quality + w_speed + w_budget;

    let quality_term = w_quality / weight_sum * model.quality_score;
    let speed_term = w_speed / weight_sum * model.speed_score;
    let budget_term = w_budget / weight_sum * (1.0 - model.cost_score);
    let reliability_term = 0.1 * model.reliability_score;

    let breakdown = ScoreBreakdown {
        quality_term,
        speed_term,
        budget_term,
        reliability_term,
        estimated_monthly_cost: f64::from(request.expected_tokens)
            * f64::from(request.monthly_requests)
            * model.cost_per_token,
    };
    (
        quality_term + speed_term + budget_term + reliability_term,
        breakdown,
    )
}

/// Capability-based recommendation engine over the registry
pub struct Recommender {
    registry: Arc<ModelRegistry>,
    monitor: Arc<PerformanceMonitor>,
    config: RecommenderConfig,
}

impl Recommender {
    /// Create a recommender over the given registry and monitor
    pub fn new(
        registry: Arc<ModelRegistry>,
        monitor: Arc<PerformanceMonitor>,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            registry,
            monitor,
            config,
        }
    }

    /// Rank active capable models for the request. An empty candidate set
    /// is a successful, empty result with a reason, never an error.
    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResult> {
        let active = self
            .registry
            .list(Some(&ModelFilter {
                status: Some(ModelStatus::Active),
                ..Default::default()
            }))
            .await?;

        let relevant = request.task_type.relevant_capabilities();
        let candidates: Vec<&Model> = active
            .iter()
            .filter(|m| relevant.iter().any(|c| m.capabilities.contains(c)))
            .filter(|m| m.context_window >= request.expected_tokens)
            .collect();

        if candidates.is_empty() {
            let reason = format!(
                "no active model advertises a capability for {:?} tasks with a context window of at least {} tokens",
                request.task_type, request.expected_tokens
            );
            tracing::debug!(%reason, "recommendation produced no candidates");
            return Ok(RecommendationResult {
                rankings: vec![],
                reason: Some(reason),
            });
        }

        let mut scored: Vec<(&Model, f64, ScoreBreakdown)> = candidates
            .into_iter()
            .map(|m| {
                let (score, breakdown) = composite_score(m, request);
                (m, score, breakdown)
            })
            .collect();

        // Composite desc, then reliability desc, then cost asc, then ID
        // asc: a total order, so identical inputs rank identically.
        scored.sort_by(|(a, score_a, _), (b, score_b, _)| {
            score_b
                .partial_cmp(score_a)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    b.reliability_score
                        .partial_cmp(&a.reliability_score)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| {
                    a.cost_per_token
                        .partial_cmp(&b.cost_per_token)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.model_id.cmp(&b.model_id))
        });

        let now = Utc::now();
        let rankings = scored
            .into_iter()
            .take(self.config.top_n)
            .map(|(model, score, breakdown)| {
                let observed = self.monitor.get_metrics(&model.model_id, Timeframe::Week, now);
                RankedModel {
                    model_id: model.model_id.clone(),
                    composite_score: score,
                    breakdown,
                    observed: (observed.sample_count > 0).then_some(observed),
                }
            })
            .collect();

        Ok(RecommendationResult {
            rankings,
            reason: None,
        })
    }
}
