// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! HTTP invoker for OpenAI-compatible chat completion APIs
//!
//! OpenAI, Novita and Ollama all speak the OpenAI chat/completions wire
//! format, so one client covers them; the Anthropic messages API differs
//! only in shape we do not use for single-turn canary/comparison calls,
//! and is exposed through Anthropic's OpenAI-compatible endpoint.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, ProviderError, Result};
use crate::provider::invoker::{Invocation, InvokeParams, ModelInvoker, ProviderKind};
use crate::provider::retry::{with_retry, RetryConfig};

/// Invoker for one OpenAI-compatible provider endpoint
pub struct HttpInvoker {
    kind: ProviderKind,
    client: Client,
    api_key: Option<String>,
    base_url: String,
    retry: RetryConfig,
}

impl HttpInvoker {
    /// Create a new invoker for the given provider endpoint.
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(
        kind: ProviderKind,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            kind,
            client: Client::new(),
            api_key,
            base_url: base_url.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry policy
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Parse an error response body into the provider taxonomy
    fn parse_error(status: u16, body: &str) -> ProviderError {
        if let Ok(error_response) = serde_json::from_str::<ChatError>(body) {
            let message = error_response.error.message;
            let code = error_response.error.code.as_deref().unwrap_or("");

            match (status, code) {
                (401, _) | (_, "invalid_api_key") | (_, "authentication_error") => {
                    ProviderError::AuthenticationFailed
                }
                (429, _) | (_, "rate_limit_exceeded") => ProviderError::RateLimited(60),
                _ => ProviderError::ServerError { status, message },
            }
        } else {
            match status {
                401 => ProviderError::AuthenticationFailed,
                429 => ProviderError::RateLimited(60),
                _ => ProviderError::ServerError {
                    status,
                    message: body.to_string(),
                },
            }
        }
    }

    async fn send_once(
        &self,
        model_name: &str,
        prompt: &str,
        params: &InvokeParams,
    ) -> Result<Invocation> {
        let body = ChatRequest {
            model: model_name.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(params.max_tokens),
            temperature: Some(params.temperature),
        };

        let mut request = self
            .client
            .post(self.completions_url())
            .timeout(params.timeout)
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                EvalError::Provider(ProviderError::Timeout)
            } else {
                EvalError::Provider(ProviderError::Network(e.to_string()))
            }
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| EvalError::Provider(ProviderError::Network(e.to_string())))?;
        let latency = started.elapsed();

        if !(200..300).contains(&status) {
            return Err(EvalError::Provider(Self::parse_error(status, &text)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| EvalError::Provider(ProviderError::InvalidResponse(e.to_string())))?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            EvalError::Provider(ProviderError::InvalidResponse(
                "response contained no choices".to_string(),
            ))
        })?;

        Ok(Invocation {
            text: choice.message.content.unwrap_or_default(),
            tokens_in: parsed.usage.as_ref().map(|u| u.prompt_tokens).unwrap_or(0),
            tokens_out: parsed
                .usage
                .as_ref()
                .map(|u| u.completion_tokens)
                .unwrap_or(0),
            latency,
        })
    }
}

#[async_trait]
impl ModelInvoker for HttpInvoker {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn invoke(
        &self,
        model_name: &str,
        prompt: &str,
        params: &InvokeParams,
    ) -> Result<Invocation> {
        with_retry(
            || self.send_once(model_name, prompt, params),
            Some(self.retry.clone()),
            &format!("{}::invoke", self.kind),
        )
        .await
    }
}

// ===== Wire types (OpenAI chat/completions format) =====

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    error: ChatErrorBody,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    message: String,
    code: Option<String>,
}
