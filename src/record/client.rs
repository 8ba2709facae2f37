use super::RecordService;
use crate::models::{GenerationRecord, NewGenerationRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Writes generation records through a PostgREST-style endpoint.
pub struct RecordClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RecordClient {
    pub fn new(base_url: String, api_key: String, table: String) -> Self {
        Self::new_with_client(base_url, api_key, table, reqwest::Client::new())
    }

    pub fn new_with_client(
        base_url: String,
        api_key: String,
        table: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            table,
        }
    }
}

#[async_trait]
impl RecordService for RecordClient {
    async fn save_record(&self, record: &NewGenerationRecord) -> Result<GenerationRecord> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);

        let response = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            // PostgREST inserts take an array of rows.
            .json(&[record])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach record store: {}", e);
                Error::Record(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Record store error (status {}): {}", status, error_text);
            return Err(Error::Record(format!(
                "status {}: {}",
                status, error_text
            )));
        }

        let body = response.text().await.map_err(|e| Error::Record(e.to_string()))?;
        let mut rows: Vec<GenerationRecord> = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse record response: {}\nBody: {}", e, body);
            Error::Record(format!("unparseable record response: {}", e))
        })?;

        if rows.is_empty() {
            return Err(Error::Record("empty insert representation".to_string()));
        }
        Ok(rows.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PromptMetadata;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_client(server: &MockServer) -> RecordClient {
        RecordClient::new(
            server.uri(),
            "service-key".to_string(),
            "stage_generations".to_string(),
        )
    }

    fn sample_record() -> NewGenerationRecord {
        NewGenerationRecord {
            drawing_url: "https://cdn.test/sketches/a.png".to_string(),
            result_url: "https://cdn.test/results/a.png".to_string(),
            photo_url: "https://cdn.test/photos/a.jpg".to_string(),
            prompts_used: PromptMetadata {
                instruction: "Create a photorealistic performance scene.".to_string(),
                fallback_text: None,
            },
            stage: "Stage 2".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_record_parses_representation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/stage_generations"))
            .and(header("apikey", "service-key"))
            .and(header("Prefer", "return=representation"))
            .and(body_string_contains("\"stage\":\"Stage 2\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([{
                "id": 12,
                "drawing_url": "https://cdn.test/sketches/a.png",
                "result_url": "https://cdn.test/results/a.png",
                "photo_url": "https://cdn.test/photos/a.jpg",
                "prompts_used": { "instruction": "Create a photorealistic performance scene." },
                "stage": "Stage 2",
                "created_at": "2026-08-07T12:00:00Z"
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let saved = make_client(&server)
            .save_record(&sample_record())
            .await
            .unwrap();

        assert_eq!(saved.id, 12);
        assert_eq!(saved.stage, "Stage 2");
        assert!(saved.created_at.is_some());
    }

    #[tokio::test]
    async fn test_save_record_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/stage_generations"))
            .respond_with(ResponseTemplate::new(401).set_body_string("permission denied"))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .save_record(&sample_record())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Record(_)));
        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_save_record_empty_representation_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/v1/stage_generations"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let err = make_client(&server)
            .save_record(&sample_record())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Record(_)));
    }
}
