use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Lightweight Gemini REST client.
///
/// Owns exactly one outbound call per invocation; retries are the caller's
/// decision and none are made here.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example
    /// `gemini-3-pro-image-preview`), not a `models/...`-prefixed path
    /// segment.
    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Calls Gemini's `generateContent` endpoint with a single attempt.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach generation backend: {}", e);
                Error::BackendUnavailable(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .map_err(|e| Error::BackendUnavailable(e.to_string()))?;
            tracing::error!("Generation backend error (status {}): {}", status, error_text);
            return Err(Error::BackendRejected {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::BackendUnavailable(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse backend response: {}\nBody: {}", e, body);
            Error::BackendUnavailable(format!("unparseable response: {}", e))
        })
    }
}
