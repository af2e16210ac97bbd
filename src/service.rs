// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Service facade
//!
//! Wires the registry, template catalog, tester, comparator, recommender
//! and monitor into one object built from [`Settings`]. The CLI and any
//! embedding application talk to this instead of the components directly,
//! so the shared pieces (in-flight limiter, monitor, registry) are
//! constructed once and threaded through consistently.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::comparator::{Comparator, ComparisonResult};
use crate::config::settings::Settings;
use crate::error::Result;
use crate::monitor::{Metrics, PerformanceMonitor, Timeframe};
use crate::provider::{
    HttpInvoker, InvokerTable, MockInvoker, ModelInvoker, ProviderKind, RetryConfig,
};
use crate::recommender::{RecommendationRequest, RecommendationResult, Recommender};
use crate::registry::model::{Model, ModelFilter, ModelPatch, NewModel};
use crate::registry::ModelRegistry;
use crate::templates::{ModelTemplate, TemplateCatalog, TemplateOverrides};
use crate::tester::{ConnectionTester, TestResult};

/// Top-level handle over all model-management components
pub struct EvalService {
    registry: Arc<ModelRegistry>,
    templates: TemplateCatalog,
    tester: ConnectionTester,
    comparator: Comparator,
    recommender: Recommender,
    monitor: Arc<PerformanceMonitor>,
}

impl EvalService {
    /// Build a service backed by HTTP providers. Endpoints that are not
    /// configured (no key and not keyless) are skipped; calls routed to
    /// them later fail with a configuration error.
    pub fn new(settings: Settings) -> Self {
        let retry = RetryConfig::from(&settings.resilience);
        let mut invokers = InvokerTable::new();
        for kind in ProviderKind::all().iter().copied() {
            let endpoint = settings.providers.endpoint(kind);
            if !endpoint.is_configured() {
                tracing::debug!(provider = kind.as_str(), "skipping unconfigured provider");
                continue;
            }
            let invoker = HttpInvoker::new(kind, &endpoint.base_url, endpoint.resolve_api_key())
                .with_retry_config(retry.clone());
            invokers.register(Arc::new(invoker) as Arc<dyn ModelInvoker>);
        }
        Self::with_invokers(settings, invokers)
    }

    /// Build a service where every provider is a scripted mock that
    /// answers instantly. Used by the CLI's offline mode and by tests.
    pub fn with_mock_providers(settings: Settings) -> Self {
        let mut invokers = InvokerTable::new();
        for kind in ProviderKind::all().iter().copied() {
            invokers.register(Arc::new(MockInvoker::new(kind)) as Arc<dyn ModelInvoker>);
        }
        Self::with_invokers(settings, invokers)
    }

    /// Build a service over an explicit invoker table
    pub fn with_invokers(settings: Settings, invokers: InvokerTable) -> Self {
        let registry = Arc::new(ModelRegistry::in_memory());
        let monitor = Arc::new(PerformanceMonitor::new(settings.monitor.clone()));
        let limiter = Arc::new(Semaphore::new(settings.limits.max_in_flight));

        let tester = ConnectionTester::new(
            registry.clone(),
            invokers.clone(),
            monitor.clone(),
            settings.probes.clone(),
            limiter.clone(),
        );
        let comparator = Comparator::new(
            registry.clone(),
            invokers,
            monitor.clone(),
            limiter,
        );
        let recommender = Recommender::new(
            registry.clone(),
            monitor.clone(),
            settings.recommender.clone(),
        );

        Self {
            registry,
            templates: TemplateCatalog::builtin(),
            tester,
            comparator,
            recommender,
            monitor,
        }
    }

    /// Registry handle, for callers that need direct access
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    // --- registry ---

    pub async fn create_model(&self, new_model: NewModel) -> Result<Model> {
        self.registry.create(new_model).await
    }

    pub async fn update_model(&self, model_id: &str, patch: ModelPatch) -> Result<Model> {
        self.registry.update(model_id, patch).await
    }

    pub async fn delete_model(&self, model_id: &str) -> Result<()> {
        self.registry.delete(model_id).await
    }

    pub async fn set_default_model(&self, model_id: &str) -> Result<Model> {
        self.registry.set_default(model_id).await
    }

    pub async fn get_model(&self, model_id: &str) -> Result<Model> {
        self.registry.get(model_id).await
    }

    pub async fn list_models(&self, filter: Option<&ModelFilter>) -> Result<Vec<Model>> {
        self.registry.list(filter).await
    }

    pub async fn default_model(&self) -> Result<Option<Model>> {
        self.registry.default_model().await
    }

    // --- templates ---

    pub fn list_templates(&self) -> &[ModelTemplate] {
        self.templates.list()
    }

    pub async fn create_from_template(
        &self,
        name: &str,
        overrides: TemplateOverrides,
    ) -> Result<Model> {
        self.templates
            .create_from_template(&self.registry, name, overrides)
            .await
    }

    // --- provider operations ---

    pub async fn test_connection(&self, model_id: &str) -> Result<TestResult> {
        self.tester.test_connection(model_id).await
    }

    pub async fn compare(&self, model_ids: &[String], prompt: &str) -> Result<ComparisonResult> {
        self.comparator.compare(model_ids, prompt).await
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResult> {
        self.recommender.recommend(request).await
    }

    // --- monitor ---

    /// Observed metrics for a model over the timeframe ending now
    pub fn get_metrics(&self, model_id: &str, timeframe: Timeframe) -> Metrics {
        self.monitor.get_metrics(model_id, timeframe, Utc::now())
    }

    /// Roll aged raw events into daily aggregates and evict expired ones
    pub fn sweep_metrics(&self) {
        self.monitor.sweep(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::{Priority, TaskType};

    fn mock_service() -> EvalService {
        EvalService::with_mock_providers(Settings::default())
    }

    #[tokio::test]
    async fn test_template_to_healthy_connection() {
        let service = mock_service();

        let model = service
            .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
            .await
            .unwrap();

        let result = service.test_connection(&model.model_id).await.unwrap();
        assert_eq!(result.successful_tests, result.total_tests);
        assert!(result.is_healthy);

        // Probes were recorded and are visible through the facade
        let metrics = service.get_metrics(&model.model_id, Timeframe::Day);
        assert_eq!(metrics.sample_count, result.total_tests as u64);
    }

    #[tokio::test]
    async fn test_compare_through_facade() {
        let service = mock_service();
        service
            .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
            .await
            .unwrap();
        service
            .create_from_template("anthropic-claude-evaluation", TemplateOverrides::default())
            .await
            .unwrap();

        let ids = vec![
            "openai-gpt4-evaluation".to_string(),
            "anthropic-claude-evaluation".to_string(),
        ];
        let result = service.compare(&ids, "Summarize: the quick brown fox").await.unwrap();
        assert_eq!(result.entries.len(), 2);
        assert!(result.entries.iter().all(|e| e.is_success()));
    }

    #[tokio::test]
    async fn test_recommend_through_facade() {
        let service = mock_service();
        service
            .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
            .await
            .unwrap();
        service
            .create_from_template("anthropic-claude-evaluation", TemplateOverrides::default())
            .await
            .unwrap();

        let request = RecommendationRequest {
            budget_level: Priority::Medium,
            quality_requirement: Priority::High,
            speed_requirement: Priority::Medium,
            task_type: TaskType::Evaluation,
            expected_tokens: 500,
            monthly_requests: 1000,
        };
        let result = service.recommend(&request).await.unwrap();
        assert_eq!(result.rankings.len(), 2);
        assert_eq!(result.rankings[0].model_id, "anthropic-claude-evaluation");
    }

    #[tokio::test]
    async fn test_first_created_model_becomes_reachable_default() {
        let service = mock_service();
        service
            .create_from_template(
                "openai-gpt4-evaluation",
                TemplateOverrides {
                    is_default: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let default = service.default_model().await.unwrap().unwrap();
        assert_eq!(default.model_id, "openai-gpt4-evaluation");
    }
}
