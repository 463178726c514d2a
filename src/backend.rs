//! Translate backend: the external machine-translation collaborator.
//!
//! The resolver only ever sees the [`TranslateBackend`] trait. Production
//! wires an HTTP provider through [`HttpBackend`]; without one configured the
//! [`StubBackend`] placeholder wraps the text with a language tag, which is
//! enough for development and tests.

use crate::config::Config;
use crate::retry::{with_retry_if, RetryConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Source language sentinel meaning "let the backend detect it".
pub const AUTO_SOURCE: &str = "auto";

#[allow(async_fn_in_trait)]
pub trait TranslateBackend {
    /// Translate `text` from `source` (or `"auto"`) into `target`.
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String>;
}

/// Placeholder backend: prefixes the text with an uppercase language tag,
/// e.g. `"Welcome"` → `"[ES] Welcome"`. The integration point for a real
/// MT provider is [`HttpBackend`].
#[derive(Debug, Clone, Default)]
pub struct StubBackend;

impl TranslateBackend for StubBackend {
    async fn translate(&self, text: &str, _source: &str, target: &str) -> Result<String> {
        Ok(format!("[{}] {}", target.to_uppercase(), text))
    }
}

/// JSON request sent to the HTTP translate provider.
#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_language: &'a str,
    target_language: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

/// Backend that calls a real translation provider over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpBackend {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }

    async fn request(&self, text: &str, source: &str, target: &str) -> Result<String> {
        let body = TranslateRequest {
            text,
            source_language: source,
            target_language: target,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to translate backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Translate backend error ({}): {}", status, body);
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .context("Failed to parse translate backend response")?;

        Ok(parsed.translated_text)
    }
}

impl TranslateBackend for HttpBackend {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        with_retry_if(
            &RetryConfig::api_call(),
            &format!("Translate to {}", target),
            || self.request(text, source, target),
            is_retryable_error,
        )
        .await
    }
}

/// Retry 429 (rate limit), 5xx and network errors; fail fast on other 4xx.
fn is_retryable_error(error: &anyhow::Error) -> bool {
    let error_str = error.to_string();

    // Error format: "Translate backend error (400 Bad Request): ..."
    if error_str.contains("Translate backend error") {
        if let Some(start) = error_str.find('(') {
            if let Some(end) = error_str[start..].find(')') {
                let status_str = &error_str[start + 1..start + end];
                let status_num = status_str.split_whitespace().next().unwrap_or("");
                if let Ok(status) = status_num.parse::<u16>() {
                    return status == 429 || status >= 500;
                }
            }
        }
    }

    // Network errors, timeouts and parse failures may be transient.
    true
}

/// Runtime-selected backend. Keeps the resolver generic over one concrete
/// type without a boxed trait object.
#[derive(Debug, Clone)]
pub enum Backend {
    Stub(StubBackend),
    Http(HttpBackend),
}

impl Backend {
    /// Pick the backend from configuration: the HTTP provider when a URL is
    /// set, the placeholder otherwise.
    pub fn from_config(config: &Config) -> Self {
        match &config.backend_url {
            Some(url) => Backend::Http(HttpBackend::new(
                url.clone(),
                config.backend_api_key.clone(),
            )),
            None => Backend::Stub(StubBackend),
        }
    }
}

impl TranslateBackend for Backend {
    async fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
        match self {
            Backend::Stub(stub) => stub.translate(text, source, target).await,
            Backend::Http(http) => http.translate(text, source, target).await,
        }
    }
}
