// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Settings management
//!
//! All the named, overridable constants the components depend on (probe
//! counts, timeouts, score weights' inputs, retention windows) live here
//! instead of being scattered through the logic. Persisted as JSON under
//! ~/.evalhub/settings.json.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::provider::ProviderKind;

/// Main settings structure, stored in ~/.evalhub/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Provider endpoint configurations
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Connection tester probe settings
    #[serde(default)]
    pub probes: ProbeConfig,

    /// System-wide provider call concurrency limits
    #[serde(default)]
    pub limits: ConcurrencyConfig,

    /// Recommendation engine settings
    #[serde(default)]
    pub recommender: RecommenderConfig,

    /// Performance monitor retention settings
    #[serde(default)]
    pub monitor: RetentionConfig,

    /// Retry and resilience settings for provider calls
    #[serde(default)]
    pub resilience: ResilienceConfig,
}

/// Configuration for provider endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI platform
    #[serde(default = "default_openai_endpoint")]
    pub openai: ProviderEndpoint,

    /// Anthropic (OpenAI-compatible endpoint)
    #[serde(default = "default_anthropic_endpoint")]
    pub anthropic: ProviderEndpoint,

    /// Novita AI
    #[serde(default = "default_novita_endpoint")]
    pub novita: ProviderEndpoint,

    /// Local Ollama daemon (no API key required)
    #[serde(default = "default_ollama_endpoint")]
    pub ollama: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: default_openai_endpoint(),
            anthropic: default_anthropic_endpoint(),
            novita: default_novita_endpoint(),
            ollama: default_ollama_endpoint(),
        }
    }
}

/// One provider endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// API key (if stored directly, not recommended)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name for the API key
    pub api_key_env: String,

    /// Base URL of the API root
    pub base_url: String,

    /// Whether this endpoint can be called without a key
    #[serde(default)]
    pub keyless: bool,
}

impl ProviderEndpoint {
    /// Resolve the API key: direct value first, then environment
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.is_empty())
    }

    /// Whether the endpoint is usable (keyless or key resolvable)
    pub fn is_configured(&self) -> bool {
        self.keyless || self.resolve_api_key().is_some()
    }
}

fn default_openai_endpoint() -> ProviderEndpoint {
    ProviderEndpoint {
        api_key: None,
        api_key_env: "OPENAI_API_KEY".to_string(),
        base_url: "https://api.openai.com/v1".to_string(),
        keyless: false,
    }
}

fn default_anthropic_endpoint() -> ProviderEndpoint {
    ProviderEndpoint {
        api_key: None,
        api_key_env: "ANTHROPIC_API_KEY".to_string(),
        base_url: "https://api.anthropic.com/v1".to_string(),
        keyless: false,
    }
}

fn default_novita_endpoint() -> ProviderEndpoint {
    ProviderEndpoint {
        api_key: None,
        api_key_env: "NOVITA_API_KEY".to_string(),
        base_url: "https://api.novita.ai/v3/openai".to_string(),
        keyless: false,
    }
}

fn default_ollama_endpoint() -> ProviderEndpoint {
    ProviderEndpoint {
        api_key: None,
        api_key_env: "OLLAMA_API_KEY".to_string(),
        base_url: "http://localhost:11434/v1".to_string(),
        keyless: true,
    }
}

impl ProvidersConfig {
    /// Endpoint for a provider tag
    pub fn endpoint(&self, kind: ProviderKind) -> &ProviderEndpoint {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Novita => &self.novita,
            ProviderKind::Ollama => &self.ollama,
        }
    }
}

/// Connection tester probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Number of independent canary probes per test
    #[serde(default = "default_probe_count")]
    pub probe_count: u32,

    /// Per-probe timeout in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,

    /// Latency considered "slow" for the health formula, in seconds
    #[serde(default = "default_speed_baseline_secs")]
    pub speed_baseline_secs: f64,

    /// Health score at or above which a model is considered healthy
    #[serde(default = "default_healthy_threshold")]
    pub healthy_threshold: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_count: default_probe_count(),
            timeout_secs: default_probe_timeout_secs(),
            speed_baseline_secs: default_speed_baseline_secs(),
            healthy_threshold: default_healthy_threshold(),
        }
    }
}

impl ProbeConfig {
    /// Per-probe timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_probe_count() -> u32 {
    4
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_speed_baseline_secs() -> f64 {
    5.0
}

fn default_healthy_threshold() -> f64 {
    0.7
}

/// System-wide provider call concurrency limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Maximum provider calls in flight across all operations
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_max_in_flight() -> usize {
    8
}

/// Recommendation engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Maximum number of ranked models returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

/// Performance monitor retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Hours raw events are kept before rolling into daily aggregates
    #[serde(default = "default_raw_retention_hours")]
    pub raw_retention_hours: u64,

    /// Days daily aggregates are kept before eviction
    #[serde(default = "default_aggregate_retention_days")]
    pub aggregate_retention_days: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            raw_retention_hours: default_raw_retention_hours(),
            aggregate_retention_days: default_aggregate_retention_days(),
        }
    }
}

fn default_raw_retention_hours() -> u64 {
    24
}

fn default_aggregate_retention_days() -> u64 {
    30
}

/// Retry and resilience settings for provider calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResilienceConfig {
    /// Maximum retry attempts for transient provider failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter percentage (0.0 to 1.0)
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_jitter() -> f64 {
    0.25
}

impl Settings {
    /// Default settings path: ~/.evalhub/settings.json
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| EvalError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".evalhub").join("settings.json"))
    }

    /// Load settings from a file, falling back to defaults when absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    /// Save settings, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}
