// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Template catalog
//!
//! Admin-curated blueprints for instantiating registry entries quickly.
//! Templates are immutable; `create_from_template` merges overrides onto a
//! template and delegates to the registry, propagating its validation
//! errors unchanged.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::provider::ProviderKind;
use crate::registry::model::{Capability, Model, NewModel};
use crate::registry::ModelRegistry;

/// A reusable blueprint for a model record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTemplate {
    /// Unique template name, also the default model ID of instances
    pub name: String,
    pub provider: ProviderKind,
    /// Provider-side model name instances are created with
    pub model_name: String,
    pub display_name: String,
    pub description: String,
    pub capabilities: BTreeSet<Capability>,
    pub cost_per_token: f64,
    pub max_tokens: u32,
    pub context_window: u32,
    pub quality_score: f64,
    pub speed_score: f64,
    pub cost_score: f64,
    pub reliability_score: f64,
}

/// Caller-supplied overrides merged onto a template
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateOverrides {
    /// Model ID for the instance; defaults to the template name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Replaces the template's capability set when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<BTreeSet<Capability>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_token: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

/// Static, admin-curated template set
pub struct TemplateCatalog {
    templates: Vec<ModelTemplate>,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateCatalog {
    /// The built-in template set shipped with the platform
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
        }
    }

    /// Build a catalog from a custom template set
    pub fn from_templates(templates: Vec<ModelTemplate>) -> Self {
        Self { templates }
    }

    /// The full template set
    pub fn list(&self) -> &[ModelTemplate] {
        &self.templates
    }

    /// Resolve a template by name
    pub fn find(&self, name: &str) -> Result<&ModelTemplate> {
        self.templates
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| EvalError::NotFound(format!("no template named '{}'", name)))
    }

    /// Instantiate a template into the registry. Overrides replace the
    /// corresponding template fields; registry validation errors propagate
    /// unchanged.
    pub async fn create_from_template(
        &self,
        registry: &ModelRegistry,
        name: &str,
        overrides: TemplateOverrides,
    ) -> Result<Model> {
        let template = self.find(name)?;

        let capabilities = overrides
            .capabilities
            .unwrap_or_else(|| template.capabilities.clone());
        if capabilities.is_empty() {
            return Err(EvalError::Validation(format!(
                "instantiating template '{}' with an empty capability set",
                name
            )));
        }

        let new_model = NewModel {
            model_id: overrides.model_id.unwrap_or_else(|| template.name.clone()),
            provider: template.provider,
            model_name: template.model_name.clone(),
            display_name: overrides
                .display_name
                .unwrap_or_else(|| template.display_name.clone()),
            capabilities,
            cost_per_token: overrides.cost_per_token.unwrap_or(template.cost_per_token),
            max_tokens: overrides.max_tokens.unwrap_or(template.max_tokens),
            context_window: overrides.context_window.unwrap_or(template.context_window),
            quality_score: overrides.quality_score.unwrap_or(template.quality_score),
            speed_score: overrides.speed_score.unwrap_or(template.speed_score),
            cost_score: overrides.cost_score.unwrap_or(template.cost_score),
            reliability_score: overrides
                .reliability_score
                .unwrap_or(template.reliability_score),
            is_default: overrides.is_default.unwrap_or(false),
        };

        registry.create(new_model).await
    }
}

fn builtin_templates() -> Vec<ModelTemplate> {
    vec![
        ModelTemplate {
            name: "openai-gpt4-evaluation".to_string(),
            provider: ProviderKind::OpenAi,
            model_name: "gpt-4".to_string(),
            display_name: "GPT-4 (Evaluation)".to_string(),
            description: "GPT-4 tuned defaults for scored evaluation assists".to_string(),
            capabilities: BTreeSet::from([
                Capability::TextGeneration,
                Capability::Analysis,
                Capability::Evaluation,
            ]),
            cost_per_token: 0.00003,
            max_tokens: 4096,
            context_window: 8192,
            quality_score: 0.95,
            speed_score: 0.70,
            cost_score: 0.30,
            reliability_score: 0.90,
        },
        ModelTemplate {
            name: "openai-gpt4o-mini-summarization".to_string(),
            provider: ProviderKind::OpenAi,
            model_name: "gpt-4o-mini".to_string(),
            display_name: "GPT-4o mini (Summaries)".to_string(),
            description: "Low-cost summarization of evaluation submissions".to_string(),
            capabilities: BTreeSet::from([
                Capability::TextGeneration,
                Capability::Summarization,
            ]),
            cost_per_token: 0.0000006,
            max_tokens: 16384,
            context_window: 128_000,
            quality_score: 0.80,
            speed_score: 0.92,
            cost_score: 0.05,
            reliability_score: 0.93,
        },
        ModelTemplate {
            name: "anthropic-claude-evaluation".to_string(),
            provider: ProviderKind::Anthropic,
            model_name: "claude-3-5-sonnet-latest".to_string(),
            display_name: "Claude Sonnet (Evaluation)".to_string(),
            description: "High-quality evaluation and analysis assists".to_string(),
            capabilities: BTreeSet::from([
                Capability::TextGeneration,
                Capability::Analysis,
                Capability::Evaluation,
            ]),
            cost_per_token: 0.000015,
            max_tokens: 8192,
            context_window: 200_000,
            quality_score: 0.97,
            speed_score: 0.65,
            cost_score: 0.22,
            reliability_score: 0.95,
        },
        ModelTemplate {
            name: "anthropic-claude-coding".to_string(),
            provider: ProviderKind::Anthropic,
            model_name: "claude-3-5-sonnet-latest".to_string(),
            display_name: "Claude Sonnet (Coding)".to_string(),
            description: "Code review and rubric checks on coding submissions".to_string(),
            capabilities: BTreeSet::from([Capability::Coding, Capability::Analysis]),
            cost_per_token: 0.000015,
            max_tokens: 8192,
            context_window: 200_000,
            quality_score: 0.96,
            speed_score: 0.65,
            cost_score: 0.22,
            reliability_score: 0.95,
        },
        ModelTemplate {
            name: "novita-llama-chat".to_string(),
            provider: ProviderKind::Novita,
            model_name: "meta-llama/llama-3.1-70b-instruct".to_string(),
            display_name: "Llama 3.1 70B (Novita)".to_string(),
            description: "Budget open-weight option for bulk text generation".to_string(),
            capabilities: BTreeSet::from([
                Capability::TextGeneration,
                Capability::Translation,
            ]),
            cost_per_token: 0.0000005,
            max_tokens: 4096,
            context_window: 32_768,
            quality_score: 0.78,
            speed_score: 0.85,
            cost_score: 0.04,
            reliability_score: 0.85,
        },
    ]
}
