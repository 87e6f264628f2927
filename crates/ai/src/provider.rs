// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text completion providers.
//!
//! A provider is an opaque endpoint that takes a prompt and returns text.
//! The HTTP implementation speaks the common chat-completions shape; which
//! vendor sits behind the base URL is irrelevant to the rest of the crate.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Ask the endpoint for a JSON object response.
    pub json: bool,
}

impl CompletionRequest {
    pub fn json(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), json: true }
    }

    pub fn text(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), json: false }
    }
}

/// Message markers that classify a provider failure as transient.
const RETRIABLE_MARKERS: &[&str] = &[
    "429",
    "500",
    "502",
    "503",
    "504",
    "5xx",
    "timeout",
    "temporar",
    "rate",
    "fetch failed",
    "econnreset",
];

/// A failed provider call, classified by message content.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ProviderCallError {
    pub message: String,
}

impl ProviderCallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Transient errors are retried with backoff; everything else skips to
    /// the next model/provider.
    pub fn is_retriable(&self) -> bool {
        let lowered = self.message.to_lowercase();
        RETRIABLE_MARKERS.iter().any(|marker| lowered.contains(marker))
    }
}

/// An ordered-model text completion provider.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Models in fallback order.
    fn models(&self) -> &[String];

    async fn complete(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderCallError>;
}

/// Chat-completions HTTP provider.
pub struct HttpProvider {
    name: String,
    base_url: String,
    api_key: String,
    models: Vec<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl HttpProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        models: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            models,
            client: reqwest::Client::new(),
        }
    }

    /// Load one provider from `AI_<NAME>_BASE_URL` / `_API_KEY` / `_MODELS`.
    ///
    /// Returns `None` (with a warning) when the key or model list is absent.
    pub fn from_env(name: &str) -> Option<Self> {
        let upper = name.to_uppercase().replace('-', "_");
        let base_url = std::env::var(format!("AI_{upper}_BASE_URL")).ok()?;
        let api_key = match std::env::var(format!("AI_{upper}_API_KEY")) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(provider = name, "skipping provider without API key");
                return None;
            }
        };
        let models: Vec<String> = std::env::var(format!("AI_{upper}_MODELS"))
            .ok()?
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if models.is_empty() {
            tracing::warn!(provider = name, "skipping provider without models");
            return None;
        }
        Some(Self::new(name, base_url, api_key, models))
    }
}

#[async_trait]
impl TextProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<String, ProviderCallError> {
        let mut body = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if request.json {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderCallError::new(format!("fetch failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(ProviderCallError::new(format!("{} {}", status.as_u16(), snippet)));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderCallError::new(format!("malformed provider response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderCallError::new("provider response had no choices"))
    }
}

/// Build the provider ladder from `AI_PROVIDERS` (ordered, comma-separated).
pub fn providers_from_env() -> Vec<Arc<dyn TextProvider>> {
    let Ok(list) = std::env::var("AI_PROVIDERS") else {
        return Vec::new();
    };
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| {
            HttpProvider::from_env(name).map(|p| Arc::new(p) as Arc<dyn TextProvider>)
        })
        .collect()
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
