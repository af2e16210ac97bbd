// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Retry logic for provider calls with exponential backoff

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::config::settings::ResilienceConfig;
use crate::error::{EvalError, ProviderError, Result};

/// Retry configuration with smart defaults
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Base delay in milliseconds (exponentially increased)
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds
    pub max_delay_ms: u64,
    /// Jitter percentage (0.0 to 1.0)
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&ResilienceConfig::default())
    }
}

impl From<&ResilienceConfig> for RetryConfig {
    fn from(config: &ResilienceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter: config.jitter,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt number
    fn calculate_delay(&self, attempt: u32) -> Duration {
        // Exponential backoff: base * 2^attempt
        let exponential_ms = self.base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
        let capped_ms = exponential_ms.min(self.max_delay_ms);

        let jitter_range = (capped_ms as f64 * self.jitter) as i64;
        let jitter_ms = if jitter_range > 0 {
            rand::rng().random_range(-jitter_range..=jitter_range)
        } else {
            0
        };

        let final_ms = (capped_ms as i64 + jitter_ms).max(0) as u64;
        Duration::from_millis(final_ms)
    }
}

/// Determine if an error is retryable
pub fn is_retryable(error: &EvalError) -> bool {
    match error {
        EvalError::Provider(provider_error) => match provider_error {
            // Retry on transient failures
            ProviderError::Network(_) => true,
            ProviderError::RateLimited(_) => true,
            ProviderError::Timeout => true,
            // Retry on 5xx errors only
            ProviderError::ServerError { status, .. } => *status >= 500 && *status < 600,

            // Don't retry on client errors
            ProviderError::AuthenticationFailed => false,
            ProviderError::InvalidResponse(_) => false,
        },
        _ => false,
    }
}

/// Retry a provider operation with exponential backoff
///
/// # Arguments
/// * `operation` - The async operation to retry
/// * `config` - Retry configuration (uses default if None)
/// * `operation_name` - Name of the operation for logging
pub async fn with_retry<F, Fut, T>(
    mut operation: F,
    config: Option<RetryConfig>,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let config = config.unwrap_or_default();
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        "operation succeeded after retries"
                    );
                }
                return Ok(result);
            }
            Err(error) => {
                if !is_retryable(&error) {
                    return Err(error);
                }

                if attempt >= config.max_retries {
                    tracing::warn!(
                        operation = operation_name,
                        retries = config.max_retries,
                        "exhausted all retries"
                    );
                    return Err(error);
                }

                let delay = config.calculate_delay(attempt);
                tracing::debug!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "retrying after transient provider failure"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
