use super::StageImageService;
use crate::encoding::VisualInput;
use crate::models::GenerationOutcome;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Summary of the last dispatched request, for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub instruction: String,
    pub scene_attached: bool,
}

#[derive(Clone)]
pub struct MockStageImageClient {
    outcomes: Arc<Mutex<Vec<GenerationOutcome>>>,
    should_fail: Arc<Mutex<bool>>,
    call_count: Arc<Mutex<usize>>,
    last_request: Arc<Mutex<Option<RecordedRequest>>>,
}

impl MockStageImageClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            call_count: Arc::new(Mutex::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_outcome(self, outcome: GenerationOutcome) -> Self {
        self.outcomes.lock().unwrap().push(outcome);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

impl Default for MockStageImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageImageService for MockStageImageClient {
    async fn generate_stage_image(
        &self,
        _sketch: &VisualInput,
        _photo: &VisualInput,
        scene: Option<&VisualInput>,
        instruction: &str,
    ) -> Result<GenerationOutcome> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        *self.last_request.lock().unwrap() = Some(RecordedRequest {
            instruction: instruction.to_string(),
            scene_attached: scene.is_some(),
        });

        if *self.should_fail.lock().unwrap() {
            return Err(Error::BackendUnavailable("mock backend offline".to_string()));
        }

        let outcomes = self.outcomes.lock().unwrap();
        if outcomes.is_empty() {
            // Tiny valid PNG as default artifact
            Ok(GenerationOutcome::Image(VisualInput::new(
                "image/png",
                vec![
                    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
                    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
                    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 pixel
                    0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53, 0xDE, 0x00, 0x00, 0x00,
                    0x0C, 0x49, 0x44, 0x41, // IDAT chunk
                    0x54, 0x08, 0x99, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x00, 0x01, 0x00,
                    0x01, 0xE2, 0x25, 0x00, 0xBC, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45,
                    0x4E, // IEND chunk
                    0x44, 0xAE, 0x42, 0x60, 0x82,
                ],
            )))
        } else {
            let index = (*count - 1) % outcomes.len();
            Ok(outcomes[index].clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sketch() -> VisualInput {
        VisualInput::new("image/png", vec![1])
    }

    fn photo() -> VisualInput {
        VisualInput::new("image/jpeg", vec![2])
    }

    #[tokio::test]
    async fn test_mock_default_outcome_is_image() {
        let client = MockStageImageClient::new();

        let outcome = client
            .generate_stage_image(&sketch(), &photo(), None, "instruction")
            .await
            .unwrap();

        assert!(matches!(outcome, GenerationOutcome::Image(_)));
        assert_eq!(client.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_cycles_configured_outcomes() {
        let client = MockStageImageClient::new()
            .with_outcome(GenerationOutcome::TextFallback("first".to_string()))
            .with_outcome(GenerationOutcome::Failure("second".to_string()));

        let first = client
            .generate_stage_image(&sketch(), &photo(), None, "i")
            .await
            .unwrap();
        let second = client
            .generate_stage_image(&sketch(), &photo(), None, "i")
            .await
            .unwrap();
        let third = client
            .generate_stage_image(&sketch(), &photo(), None, "i")
            .await
            .unwrap();

        assert_eq!(first, GenerationOutcome::TextFallback("first".to_string()));
        assert_eq!(second, GenerationOutcome::Failure("second".to_string()));
        assert_eq!(third, GenerationOutcome::TextFallback("first".to_string()));
    }

    #[tokio::test]
    async fn test_mock_records_scene_presence() {
        let client = MockStageImageClient::new();
        let scene = VisualInput::new("image/png", vec![3]);

        client
            .generate_stage_image(&sketch(), &photo(), Some(&scene), "with scene")
            .await
            .unwrap();

        let recorded = client.last_request().unwrap();
        assert!(recorded.scene_attached);
        assert_eq!(recorded.instruction, "with scene");

        client
            .generate_stage_image(&sketch(), &photo(), None, "without scene")
            .await
            .unwrap();

        assert!(!client.last_request().unwrap().scene_attached);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let client = MockStageImageClient::new().with_failure(true);

        let err = client
            .generate_stage_image(&sketch(), &photo(), None, "i")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BackendUnavailable(_)));
        assert_eq!(client.get_call_count(), 1);
    }
}
