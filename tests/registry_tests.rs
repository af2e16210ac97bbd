// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use evalhub::provider::ProviderKind;
use evalhub::registry::{
    Capability, ModelFilter, ModelPatch, ModelRegistry, ModelStatus, NewModel,
};
use evalhub::EvalError;

fn gpt4(is_default: bool) -> NewModel {
    NewModel {
        model_id: "gpt-4".to_string(),
        provider: ProviderKind::OpenAi,
        model_name: "gpt-4".to_string(),
        display_name: "GPT-4".to_string(),
        capabilities: BTreeSet::from([Capability::TextGeneration, Capability::Evaluation]),
        cost_per_token: 0.00003,
        max_tokens: 4096,
        context_window: 8192,
        quality_score: 0.95,
        speed_score: 0.70,
        cost_score: 0.30,
        reliability_score: 0.90,
        is_default,
    }
}

fn claude(is_default: bool) -> NewModel {
    NewModel {
        model_id: "claude-3-5-sonnet".to_string(),
        provider: ProviderKind::Anthropic,
        model_name: "claude-3-5-sonnet-latest".to_string(),
        display_name: "Claude 3.5 Sonnet".to_string(),
        capabilities: BTreeSet::from([Capability::TextGeneration, Capability::Analysis]),
        cost_per_token: 0.000015,
        max_tokens: 8192,
        context_window: 200_000,
        quality_score: 0.98,
        speed_score: 0.60,
        cost_score: 0.20,
        reliability_score: 0.95,
        is_default,
    }
}

#[tokio::test]
async fn registration_lifecycle() {
    let registry = ModelRegistry::in_memory();

    let created = registry.create(gpt4(true)).await.unwrap();
    assert_eq!(created.status, ModelStatus::Active);
    assert_eq!(created.version, 1);
    assert!(created.is_default);

    // Duplicate IDs are rejected without touching the stored record
    let err = registry.create(gpt4(false)).await.unwrap_err();
    assert!(matches!(err, EvalError::Validation(_)));
    assert_eq!(registry.list(None).await.unwrap().len(), 1);

    let updated = registry
        .update(
            "gpt-4",
            ModelPatch {
                quality_score: Some(0.97),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!((updated.quality_score - 0.97).abs() < 1e-9);
    assert_eq!(updated.version, 2);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn default_model_cannot_be_deleted_until_replaced() {
    let registry = ModelRegistry::in_memory();
    registry.create(gpt4(true)).await.unwrap();
    registry.create(claude(false)).await.unwrap();

    let err = registry.delete("gpt-4").await.unwrap_err();
    assert!(matches!(err, EvalError::Forbidden(_)));

    registry.set_default("claude-3-5-sonnet").await.unwrap();
    registry.delete("gpt-4").await.unwrap();

    let remaining = registry.list(None).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].is_default);
}

#[tokio::test]
async fn promoting_a_model_demotes_the_previous_default() {
    let registry = ModelRegistry::in_memory();
    registry.create(gpt4(true)).await.unwrap();
    registry.create(claude(false)).await.unwrap();

    registry.set_default("claude-3-5-sonnet").await.unwrap();

    let models = registry.list(None).await.unwrap();
    let defaults: Vec<_> = models.iter().filter(|m| m.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].model_id, "claude-3-5-sonnet");
}

#[tokio::test]
async fn filters_compose_over_status_and_provider() {
    let registry = ModelRegistry::in_memory();
    registry.create(gpt4(false)).await.unwrap();
    registry.create(claude(false)).await.unwrap();
    registry
        .update(
            "gpt-4",
            ModelPatch {
                status: Some(ModelStatus::Inactive),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let active = registry
        .list(Some(&ModelFilter {
            status: Some(ModelStatus::Active),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].model_id, "claude-3-5-sonnet");

    let openai = registry
        .list(Some(&ModelFilter {
            provider: Some(ProviderKind::OpenAi),
            ..Default::default()
        }))
        .await
        .unwrap();
    assert_eq!(openai.len(), 1);
    assert_eq!(openai[0].model_id, "gpt-4");
}

#[tokio::test]
async fn concurrent_promotions_leave_exactly_one_default() {
    let registry = Arc::new(ModelRegistry::in_memory());
    for i in 0..4 {
        let mut model = gpt4(i == 0);
        model.model_id = format!("model-{}", i);
        registry.create(model).await.unwrap();
    }

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.set_default(&format!("model-{}", i)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let defaults = registry
        .list(None)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.is_default)
        .count();
    assert_eq!(defaults, 1);
}

proptest! {
    // Any sequence of promotions over a four-model registry keeps the
    // single-default invariant.
    #[test]
    fn single_default_survives_arbitrary_promotions(ops in prop::collection::vec(0usize..4, 1..24)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let registry = ModelRegistry::in_memory();
            for i in 0..4 {
                let mut model = gpt4(i == 0);
                model.model_id = format!("model-{}", i);
                registry.create(model).await.unwrap();
            }

            for i in &ops {
                registry.set_default(&format!("model-{}", i)).await.unwrap();
            }

            let models = registry.list(None).await.unwrap();
            let defaults: Vec<_> = models.iter().filter(|m| m.is_default).collect();
            assert_eq!(defaults.len(), 1);
            assert_eq!(defaults[0].model_id, format!("model-{}", ops.last().unwrap()));
        });
    }
}
