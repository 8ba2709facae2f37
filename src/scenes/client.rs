use super::{Scene, SceneImageService};
use crate::encoding::{detect_image_mime, VisualInput};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Fetches scene reference images over HTTP from a static asset host.
pub struct SceneImageClient {
    client: reqwest::Client,
    base_url: String,
}

impl SceneImageClient {
    pub fn new(base_url: String) -> Self {
        Self::new_with_client(base_url, reqwest::Client::new())
    }

    pub fn new_with_client(base_url: String, client: reqwest::Client) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl SceneImageService for SceneImageClient {
    async fn fetch_reference(&self, scene: &Scene) -> Result<VisualInput> {
        let url = format!("{}{}", self.base_url, scene.image_path);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::SceneFetch(format!(
                "status {} fetching {}",
                status, url
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let bytes = response.bytes().await?.to_vec();

        // Prefer the declared content type; sniff when the host omits it.
        let mime_type = match content_type {
            Some(value) if value.starts_with("image/") => value,
            _ => detect_image_mime(&bytes).to_string(),
        };

        Ok(VisualInput::new(mime_type, bytes))
    }
}
