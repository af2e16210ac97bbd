// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Model record, capability tags, and validation rules

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::provider::ProviderKind;

static MODEL_ID_REGEX: OnceLock<Regex> = OnceLock::new();

/// Pattern every model ID must match: lowercase token, up to 64 chars
fn model_id_regex() -> &'static Regex {
    MODEL_ID_REGEX.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9._/-]{0,63}$").expect("model ID pattern is valid")
    })
}

/// Capability tags a model can advertise
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    TextGeneration,
    Analysis,
    Coding,
    Evaluation,
    Summarization,
    Translation,
}

impl Capability {
    /// Canonical tag, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::TextGeneration => "text-generation",
            Capability::Analysis => "analysis",
            Capability::Coding => "coding",
            Capability::Evaluation => "evaluation",
            Capability::Summarization => "summarization",
            Capability::Translation => "translation",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text-generation" => Ok(Capability::TextGeneration),
            "analysis" => Ok(Capability::Analysis),
            "coding" => Ok(Capability::Coding),
            "evaluation" => Ok(Capability::Evaluation),
            "summarization" => Ok(Capability::Summarization),
            "translation" => Ok(Capability::Translation),
            other => Err(EvalError::Validation(format!(
                "unrecognized capability '{}'",
                other
            ))),
        }
    }
}

/// Lifecycle status of a registered model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Active,
    Inactive,
}

/// A registered, invocable configuration of a provider's offering.
/// Owned exclusively by the registry; mutate through `ModelRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Immutable, unique, pattern-constrained token
    pub model_id: String,

    /// Provider backend, immutable after creation
    pub provider: ProviderKind,

    /// Name the provider knows this model by (sent on the wire)
    pub model_name: String,

    /// Human-readable name
    pub display_name: String,

    /// Lifecycle status
    pub status: ModelStatus,

    /// Non-empty set of advertised capability tags
    pub capabilities: BTreeSet<Capability>,

    /// Cost per token in USD, >= 0
    pub cost_per_token: f64,

    /// Maximum output tokens
    pub max_tokens: u32,

    /// Context window in tokens, >= max_tokens
    pub context_window: u32,

    /// Quality score in [0, 1]
    pub quality_score: f64,

    /// Speed score in [0, 1]
    pub speed_score: f64,

    /// Cost score in [0, 1] (higher = more expensive)
    pub cost_score: f64,

    /// Reliability score in [0, 1]
    pub reliability_score: f64,

    /// Whether this is the registry-wide default model
    pub is_default: bool,

    /// Monotone version, bumped on every mutation
    #[serde(default)]
    pub version: u64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a model. `status` is forced to `Active`
/// and `version`/timestamps are assigned by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewModel {
    pub model_id: String,
    pub provider: ProviderKind,
    pub model_name: String,
    pub display_name: String,
    pub capabilities: BTreeSet<Capability>,
    pub cost_per_token: f64,
    pub max_tokens: u32,
    pub context_window: u32,
    pub quality_score: f64,
    pub speed_score: f64,
    pub cost_score: f64,
    pub reliability_score: f64,
    #[serde(default)]
    pub is_default: bool,
}

impl NewModel {
    /// Validate everything that does not require registry state
    pub fn validate(&self) -> Result<()> {
        validate_model_id(&self.model_id)?;
        if self.capabilities.is_empty() {
            return Err(EvalError::Validation(
                "capabilities must not be empty".to_string(),
            ));
        }
        if self.cost_per_token < 0.0 {
            return Err(EvalError::Validation(
                "cost_per_token must be >= 0".to_string(),
            ));
        }
        if self.context_window < self.max_tokens {
            return Err(EvalError::Validation(format!(
                "context_window ({}) must be >= max_tokens ({})",
                self.context_window, self.max_tokens
            )));
        }
        validate_score("quality_score", self.quality_score)?;
        validate_score("speed_score", self.speed_score)?;
        validate_score("cost_score", self.cost_score)?;
        validate_score("reliability_score", self.reliability_score)?;
        Ok(())
    }

    /// Materialize into a full record at the given instant
    pub fn into_model(self, now: DateTime<Utc>) -> Model {
        Model {
            model_id: self.model_id,
            provider: self.provider,
            model_name: self.model_name,
            display_name: self.display_name,
            status: ModelStatus::Active,
            capabilities: self.capabilities,
            cost_per_token: self.cost_per_token,
            max_tokens: self.max_tokens,
            context_window: self.context_window,
            quality_score: self.quality_score,
            speed_score: self.speed_score,
            cost_score: self.cost_score,
            reliability_score: self.reliability_score,
            is_default: self.is_default,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Patch applied by `ModelRegistry::update`. `model_id` and `provider`
/// are deliberately absent: both are immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ModelStatus>,
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

impl ModelPatch {
    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.model_name.is_none()
            && self.display_name.is_none()
            && self.status.is_none()
            && self.capabilities.is_none()
            && self.cost_per_token.is_none()
            && self.max_tokens.is_none()
            && self.context_window.is_none()
            && self.quality_score.is_none()
            && self.speed_score.is_none()
            && self.cost_score.is_none()
            && self.reliability_score.is_none()
            && self.is_default.is_none()
    }

    /// Apply onto an existing record, validating the result.
    /// Does not touch `is_default`; default handling needs registry-wide
    /// coordination and lives in the store.
    pub fn apply_to(&self, model: &mut Model, now: DateTime<Utc>) -> Result<()> {
        if let Some(ref capabilities) = self.capabilities {
            if capabilities.is_empty() {
                return Err(EvalError::Validation(
                    "capabilities must not be empty".to_string(),
                ));
            }
            model.capabilities = capabilities.clone();
        }
        if let Some(cost) = self.cost_per_token {
            if cost < 0.0 {
                return Err(EvalError::Validation(
                    "cost_per_token must be >= 0".to_string(),
                ));
            }
            model.cost_per_token = cost;
        }
        if let Some(score) = self.quality_score {
            validate_score("quality_score", score)?;
            model.quality_score = score;
        }
        if let Some(score) = self.speed_score {
            validate_score("speed_score", score)?;
            model.speed_score = score;
        }
        if let Some(score) = self.cost_score {
            validate_score("cost_score", score)?;
            model.cost_score = score;
        }
        if let Some(score) = self.reliability_score {
            validate_score("reliability_score", score)?;
            model.reliability_score = score;
        }
        if let Some(ref name) = self.model_name {
            model.model_name = name.clone();
        }
        if let Some(ref name) = self.display_name {
            model.display_name = name.clone();
        }
        if let Some(status) = self.status {
            model.status = status;
        }

        let max_tokens = self.max_tokens.unwrap_or(model.max_tokens);
        let context_window = self.context_window.unwrap_or(model.context_window);
        if context_window < max_tokens {
            return Err(EvalError::Validation(format!(
                "context_window ({}) must be >= max_tokens ({})",
                context_window, max_tokens
            )));
        }
        model.max_tokens = max_tokens;
        model.context_window = context_window;

        model.updated_at = now;
        Ok(())
    }
}

/// Filter for `ModelRegistry::list`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelFilter {
    /// Only models with this status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ModelStatus>,

    /// Only models from this provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderKind>,

    /// Only models whose capabilities are a superset of these
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub capabilities: BTreeSet<Capability>,
}

impl ModelFilter {
    /// Whether a model passes the filter
    pub fn matches(&self, model: &Model) -> bool {
        if let Some(status) = self.status {
            if model.status != status {
                return false;
            }
        }
        if let Some(provider) = self.provider {
            if model.provider != provider {
                return false;
            }
        }
        self.capabilities.is_subset(&model.capabilities)
    }
}

/// Validate a model ID against the registry token pattern
pub fn validate_model_id(model_id: &str) -> Result<()> {
    if model_id_regex().is_match(model_id) {
        Ok(())
    } else {
        Err(EvalError::Validation(format!(
            "invalid model ID '{}': expected lowercase token matching {}",
            model_id,
            model_id_regex().as_str()
        )))
    }
}

fn validate_score(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EvalError::Validation(format!(
            "{} must be within [0, 1], got {}",
            field, value
        )))
    }
}
