// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

use std::sync::Arc;
use std::time::Duration;

use evalhub::config::Settings;
use evalhub::monitor::Timeframe;
use evalhub::provider::{
    InvokerTable, MockFailure, MockInvoker, ModelInvoker, ProviderKind,
};
use evalhub::recommender::{Priority, RecommendationRequest, TaskType};
use evalhub::service::EvalService;
use evalhub::templates::TemplateOverrides;
use evalhub::EvalError;

fn mock_service() -> EvalService {
    EvalService::with_mock_providers(Settings::default())
}

fn evaluation_request(expected_tokens: u32) -> RecommendationRequest {
    RecommendationRequest {
        budget_level: Priority::Medium,
        quality_requirement: Priority::High,
        speed_requirement: Priority::Medium,
        task_type: TaskType::Evaluation,
        expected_tokens,
        monthly_requests: 1000,
    }
}

// Register a model, verify it, set it as default and watch its metrics
// accumulate: the happy path an operator walks on day one.
#[tokio::test]
async fn register_verify_promote_flow() {
    let service = mock_service();

    let model = service
        .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
        .await
        .unwrap();
    assert_eq!(model.provider, ProviderKind::OpenAi);

    let health = service.test_connection(&model.model_id).await.unwrap();
    assert_eq!(health.successful_tests, health.total_tests);
    assert!(health.is_healthy);

    service.set_default_model(&model.model_id).await.unwrap();
    let default = service.default_model().await.unwrap().unwrap();
    assert_eq!(default.model_id, model.model_id);

    let metrics = service.get_metrics(&model.model_id, Timeframe::Day);
    assert_eq!(metrics.sample_count, health.total_tests as u64);
    assert!((metrics.success_rate - 1.0).abs() < 1e-9);
    assert!(metrics.total_cost > 0.0);
}

// Quality-weighted recommendation prefers the higher-quality model even
// when it is slower, as long as the requester asked for quality.
#[tokio::test]
async fn quality_requirement_dominates_ranking() {
    let service = mock_service();
    service
        .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
        .await
        .unwrap();
    service
        .create_from_template("anthropic-claude-evaluation", TemplateOverrides::default())
        .await
        .unwrap();

    let result = service.recommend(&evaluation_request(500)).await.unwrap();
    assert_eq!(result.rankings.len(), 2);
    assert_eq!(result.rankings[0].model_id, "anthropic-claude-evaluation");
    assert!(result.rankings[0].composite_score > result.rankings[1].composite_score);
}

// A provider that always fails must show up as unhealthy in the tester
// and as error entries in the comparator, never as a top-level failure.
#[tokio::test]
async fn failing_provider_is_reported_not_fatal() {
    let invokers = InvokerTable::new()
        .with(Arc::new(
            MockInvoker::new(ProviderKind::OpenAi).always_failing(MockFailure::Server),
        ) as Arc<dyn ModelInvoker>)
        .with(Arc::new(MockInvoker::new(ProviderKind::Anthropic))
            as Arc<dyn ModelInvoker>);
    let service = EvalService::with_invokers(Settings::default(), invokers);

    service
        .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
        .await
        .unwrap();
    service
        .create_from_template("anthropic-claude-evaluation", TemplateOverrides::default())
        .await
        .unwrap();

    let health = service.test_connection("openai-gpt4-evaluation").await.unwrap();
    assert_eq!(health.successful_tests, 0);
    assert!(!health.is_healthy);

    let ids = vec![
        "openai-gpt4-evaluation".to_string(),
        "anthropic-claude-evaluation".to_string(),
    ];
    let comparison = service.compare(&ids, "Rate this answer from 1 to 5").await.unwrap();
    assert_eq!(comparison.entries.len(), 2);
    assert!(!comparison.entries[0].is_success());
    assert!(comparison.entries[1].is_success());

    // Failed probes and entries still land in the monitor
    let metrics = service.get_metrics("openai-gpt4-evaluation", Timeframe::Day);
    assert!(metrics.sample_count > 0);
    assert!((metrics.success_rate - 0.0).abs() < 1e-9);
}

// Template instantiation carries the blueprint over verbatim unless
// overridden, including the capability set.
#[tokio::test]
async fn template_instantiation_preserves_blueprint() {
    let service = mock_service();

    let template = service
        .list_templates()
        .iter()
        .find(|t| t.name == "openai-gpt4-evaluation")
        .cloned()
        .unwrap();

    let model = service
        .create_from_template(
            "openai-gpt4-evaluation",
            TemplateOverrides {
                model_id: Some("eval-primary".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(model.model_id, "eval-primary");
    assert_eq!(model.capabilities, template.capabilities);
    assert_eq!(model.context_window, template.context_window);
    assert!((model.quality_score - template.quality_score).abs() < 1e-9);
}

#[tokio::test]
async fn compare_rejects_malformed_requests() {
    let service = mock_service();
    service
        .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
        .await
        .unwrap();

    let one = vec!["openai-gpt4-evaluation".to_string()];
    assert!(matches!(
        service.compare(&one, "prompt").await.unwrap_err(),
        EvalError::Validation(_)
    ));

    let unknown = vec![
        "openai-gpt4-evaluation".to_string(),
        "no-such-model".to_string(),
    ];
    assert!(matches!(
        service.compare(&unknown, "prompt").await.unwrap_err(),
        EvalError::Validation(_)
    ));
}

// Recommendation filters on context window before ranking; a request too
// large for every model yields an explained empty result.
#[tokio::test]
async fn oversized_requests_yield_empty_recommendation() {
    let service = mock_service();
    service
        .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
        .await
        .unwrap();

    let result = service
        .recommend(&evaluation_request(1_000_000))
        .await
        .unwrap();
    assert!(result.rankings.is_empty());
    assert!(result.reason.is_some());
}

// Raw probe events survive a same-day sweep and stay queryable.
#[tokio::test]
async fn sweep_keeps_fresh_metrics_queryable() {
    let service = mock_service();
    let model = service
        .create_from_template(
            "anthropic-claude-evaluation",
            TemplateOverrides::default(),
        )
        .await
        .unwrap();

    service.test_connection(&model.model_id).await.unwrap();
    let before = service.get_metrics(&model.model_id, Timeframe::Week);

    service.sweep_metrics();
    let after = service.get_metrics(&model.model_id, Timeframe::Week);
    assert_eq!(before.sample_count, after.sample_count);
    assert!((before.avg_latency_ms - after.avg_latency_ms).abs() < 1e-6);
}

// The probe layer enforces its own timeout, so a hanging backend cannot
// pin a test run; it just counts as failed probes.
#[tokio::test(start_paused = true)]
async fn hanging_backend_times_out_per_probe() {
    let mut settings = Settings::default();
    settings.probes.timeout_secs = 1;

    let invokers = InvokerTable::new().with(Arc::new(
        MockInvoker::new(ProviderKind::OpenAi).with_script(vec![
            evalhub::provider::MockOutcome::Hang,
        ]),
    ) as Arc<dyn ModelInvoker>);
    let service = EvalService::with_invokers(settings, invokers);

    service
        .create_from_template("openai-gpt4-evaluation", TemplateOverrides::default())
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let health = tokio::time::timeout(
        Duration::from_secs(60),
        service.test_connection("openai-gpt4-evaluation"),
    )
    .await
    .expect("probe timeouts must bound the whole test")
    .unwrap();
    assert_eq!(health.successful_tests, 0);
    assert!(!health.is_healthy);
    // Paused clock: virtual time advanced, wall time barely moved
    assert!(started.elapsed() < Duration::from_secs(5));
}
