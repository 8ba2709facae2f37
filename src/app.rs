//! Workflow orchestration: one user-initiated generation run end to end.
//!
//! The workflow validates the captured inputs, assembles and dispatches the
//! generation request, applies the fallback policy when the backend answers
//! with text instead of an image, persists all three assets, and writes one
//! generation record.

use crate::ai::{GeminiStageClient, StageImageService};
use crate::encoding::VisualInput;
use crate::models::{Config, GenerationOutcome, NewGenerationRecord, PromptMetadata};
use crate::prompts;
use crate::record::{RecordClient, RecordService};
use crate::scenes::{self, SceneImageClient, SceneImageService};
use crate::storage::{StorageClient, StorageService};
use crate::{Error, Result};
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Workflow states in transition order. `Failed` is reachable from every
/// state after `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Validating,
    Composing,
    Dispatching,
    Interpreting,
    Persisting,
    Done,
    Failed,
}

/// Advisory progress listener for the UI layer.
///
/// Transitions drive progress display only; they are not part of the
/// correctness contract.
pub trait StatusObserver: Send + Sync {
    fn on_transition(&self, state: WorkflowState);
}

/// Observer that drops every transition.
pub struct NullObserver;

impl StatusObserver for NullObserver {
    fn on_transition(&self, _state: WorkflowState) {}
}

/// Terminal result of a successful workflow run.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalArtifact {
    /// Public URL of the uploaded result image.
    pub result_url: String,
    /// Backend explanation when the sketch was substituted for a declined
    /// synthesis; `None` on a clean image outcome.
    pub fallback_text: Option<String>,
}

/// Coordinates generation, fallback handling, and asset persistence.
///
/// Each run owns its request and outcome exclusively; the only shared
/// object is the HTTP connection pool inside the service clients.
pub struct App {
    generator: Box<dyn StageImageService>,
    scene_images: Box<dyn SceneImageService>,
    storage: Box<dyn StorageService>,
    records: Box<dyn RecordService>,
    observer: Box<dyn StatusObserver>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub generator: Box<dyn StageImageService>,
    pub scene_images: Box<dyn SceneImageService>,
    pub storage: Box<dyn StorageService>,
    pub records: Box<dyn RecordService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            generator: services.generator,
            scene_images: services.scene_images,
            storage: services.storage,
            records: services.records,
            observer: Box::new(NullObserver),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn StatusObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub async fn new() -> Result<Self> {
        let config = Config::from_env()?;

        // Reuse one HTTP connection pool across backend clients.
        let http_client = reqwest::Client::new();

        let generator = Box::new(GeminiStageClient::new_with_client(
            config.gemini_api_key.clone(),
            config.image_model.clone(),
            http_client.clone(),
        ));

        let scene_images = Box::new(SceneImageClient::new_with_client(
            config.scene_base_url.clone(),
            http_client.clone(),
        ));

        let records = Box::new(RecordClient::new_with_client(
            config.record_api_url.clone(),
            config.record_api_key.clone(),
            config.record_table.clone(),
            http_client,
        ));

        let storage = Box::new(
            StorageClient::new(
                config.storage_access_key_id.clone(),
                config.storage_secret_access_key.clone(),
                config.storage_endpoint.clone(),
                config.storage_bucket.clone(),
                config.storage_base_url.clone(),
            )
            .await?,
        );

        Ok(Self::with_services(AppServices {
            generator,
            scene_images,
            storage,
            records,
        }))
    }

    /// Run one generation workflow.
    ///
    /// `photo` and `sketch` are the encoded (data URL) inputs supplied by
    /// the capture and drawing collaborators; `scene_id` selects a catalog
    /// entry. The UI must not start a second run while one is in flight.
    pub async fn generate(
        &self,
        photo: Option<&str>,
        sketch: Option<&str>,
        scene_id: &str,
    ) -> Result<FinalArtifact> {
        match self.run_workflow(photo, sketch, scene_id).await {
            Ok(artifact) => {
                self.observer.on_transition(WorkflowState::Done);
                info!("Generation complete: {}", artifact.result_url);
                Ok(artifact)
            }
            Err(e) => {
                self.observer.on_transition(WorkflowState::Failed);
                error!("Generation workflow failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_workflow(
        &self,
        photo: Option<&str>,
        sketch: Option<&str>,
        scene_id: &str,
    ) -> Result<FinalArtifact> {
        self.observer.on_transition(WorkflowState::Validating);

        // Preconditions fail before any network activity.
        let photo = photo
            .filter(|p| !p.is_empty())
            .ok_or(Error::MissingInput("photo"))?;
        let sketch = sketch
            .filter(|s| !s.is_empty())
            .ok_or(Error::MissingInput("sketch"))?;

        let photo = VisualInput::from_data_url(photo)?;
        let sketch = VisualInput::from_data_url(sketch)?;

        self.observer.on_transition(WorkflowState::Composing);

        let scene = scenes::find(scene_id).unwrap_or_else(|| {
            let fallback = scenes::default_scene();
            warn!("Unknown scene '{}', falling back to {}", scene_id, fallback.id);
            fallback
        });
        let instruction = prompts::compose(scene.directive);

        // Reference image loss downgrades to a 3-part request; the scene
        // directive still rides in the instruction text.
        let scene_image = match self.scene_images.fetch_reference(scene).await {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(
                    "Could not fetch reference image for {}: {}. Proceeding without a scene part.",
                    scene.id, e
                );
                None
            }
        };

        self.observer.on_transition(WorkflowState::Dispatching);

        let outcome = self
            .generator
            .generate_stage_image(&sketch, &photo, scene_image.as_ref(), &instruction)
            .await?;

        self.observer.on_transition(WorkflowState::Interpreting);

        let (artifact, fallback_text) = match outcome {
            GenerationOutcome::Image(image) => (image, None),
            GenerationOutcome::TextFallback(text) => {
                // The user still gets a visible result: the sketch stands in
                // and the explanation is surfaced and recorded.
                warn!("Backend declined to synthesize, substituting sketch: {}", text);
                (sketch.clone(), Some(text))
            }
            GenerationOutcome::Failure(reason) => {
                return Err(Error::EmptyGeneration(reason));
            }
        };

        self.observer.on_transition(WorkflowState::Persisting);

        let run_id = asset_run_id();
        let photo_key = format!("photos/{}_photo.jpg", run_id);
        let sketch_key = format!("sketches/{}_sketch.png", run_id);
        let result_key = format!("results/{}_result.png", run_id);
        let (photo_url, sketch_url, result_url) = tokio::join!(
            self.storage.upload_file(
                &photo_key,
                &photo.data,
                &photo.mime_type,
            ),
            self.storage.upload_file(
                &sketch_key,
                &sketch.data,
                &sketch.mime_type,
            ),
            self.storage.upload_file(
                &result_key,
                &artifact.data,
                &artifact.mime_type,
            ),
        );

        let (Some(photo_url), Some(sketch_url), Some(result_url)) =
            (photo_url, sketch_url, result_url)
        else {
            // Partial uploads stay behind as orphaned objects; no record
            // references them.
            return Err(Error::Upload(
                "one or more asset uploads failed".to_string(),
            ));
        };

        let record = self
            .records
            .save_record(&NewGenerationRecord {
                drawing_url: sketch_url,
                result_url: result_url.clone(),
                photo_url,
                prompts_used: PromptMetadata {
                    instruction,
                    fallback_text: fallback_text.clone(),
                },
                stage: scene.id.to_string(),
            })
            .await?;
        info!("Saved generation record {} for {}", record.id, record.stage);

        Ok(FinalArtifact {
            result_url,
            fallback_text,
        })
    }
}

fn asset_run_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}_{}", Utc::now().timestamp_millis(), &uuid[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockStageImageClient;
    use crate::record::MockRecordClient;
    use crate::scenes::MockSceneImageClient;
    use crate::storage::MockStorageClient;
    use std::sync::{Arc, Mutex};

    const TEST_STORAGE_BASE_URL: &str = "https://cdn.test";

    struct RecordingObserver {
        states: Arc<Mutex<Vec<WorkflowState>>>,
    }

    impl StatusObserver for RecordingObserver {
        fn on_transition(&self, state: WorkflowState) {
            self.states.lock().unwrap().push(state);
        }
    }

    struct TestHarness {
        app: App,
        generator: MockStageImageClient,
        scene_images: MockSceneImageClient,
        storage: MockStorageClient,
        records: MockRecordClient,
        states: Arc<Mutex<Vec<WorkflowState>>>,
    }

    fn build_harness(
        generator: MockStageImageClient,
        scene_images: MockSceneImageClient,
        storage: MockStorageClient,
        records: MockRecordClient,
    ) -> TestHarness {
        let states = Arc::new(Mutex::new(Vec::new()));
        let app = App::with_services(AppServices {
            generator: Box::new(generator.clone()),
            scene_images: Box::new(scene_images.clone()),
            storage: Box::new(storage.clone()),
            records: Box::new(records.clone()),
        })
        .with_observer(Box::new(RecordingObserver {
            states: states.clone(),
        }));

        TestHarness {
            app,
            generator,
            scene_images,
            storage,
            records,
            states,
        }
    }

    fn default_harness() -> TestHarness {
        build_harness(
            MockStageImageClient::new(),
            MockSceneImageClient::new(),
            MockStorageClient::new().with_base_url(TEST_STORAGE_BASE_URL.to_string()),
            MockRecordClient::new(),
        )
    }

    fn sketch_data_url() -> String {
        VisualInput::new("image/png", vec![0x89, 0x50, 0x4E, 0x47]).to_data_url()
    }

    fn photo_data_url() -> String {
        VisualInput::new("image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0]).to_data_url()
    }

    #[tokio::test]
    async fn test_generate_happy_path_persists_and_records() {
        let generated = VisualInput::new("image/png", vec![9, 9, 9]);
        let harness = build_harness(
            MockStageImageClient::new().with_outcome(GenerationOutcome::Image(generated.clone())),
            MockSceneImageClient::new(),
            MockStorageClient::new().with_base_url(TEST_STORAGE_BASE_URL.to_string()),
            MockRecordClient::new(),
        );

        let artifact = harness
            .app
            .generate(
                Some(&photo_data_url()),
                Some(&sketch_data_url()),
                "Stage 2",
            )
            .await
            .unwrap();

        assert!(artifact.result_url.starts_with("https://cdn.test/results/"));
        assert!(artifact.fallback_text.is_none());

        assert_eq!(harness.storage.get_upload_count(), 3);
        let files = harness.storage.get_files();
        let result_key = files.keys().find(|k| k.starts_with("results/")).unwrap();
        assert_eq!(files[result_key], generated.data);
        assert!(files.keys().any(|k| k.starts_with("photos/")));
        assert!(files.keys().any(|k| k.starts_with("sketches/")));

        let saved = harness.records.get_saved_records();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].stage, "Stage 2");
        assert!(saved[0].prompts_used.fallback_text.is_none());
        assert!(saved[0]
            .prompts_used
            .instruction
            .contains("magical forest"));

        assert_eq!(
            *harness.states.lock().unwrap(),
            vec![
                WorkflowState::Validating,
                WorkflowState::Composing,
                WorkflowState::Dispatching,
                WorkflowState::Interpreting,
                WorkflowState::Persisting,
                WorkflowState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_generate_without_photo_fails_before_any_network_call() {
        let harness = default_harness();

        let err = harness
            .app
            .generate(None, Some(&sketch_data_url()), "Stage 1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingInput("photo")));
        assert_eq!(harness.generator.get_call_count(), 0);
        assert_eq!(harness.scene_images.get_call_count(), 0);
        assert_eq!(harness.storage.get_upload_count(), 0);
        assert_eq!(*harness.states.lock().unwrap().last().unwrap(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn test_generate_with_empty_sketch_fails_validation() {
        let harness = default_harness();

        let err = harness
            .app
            .generate(Some(&photo_data_url()), Some(""), "Stage 1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingInput("sketch")));
        assert_eq!(harness.generator.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_text_fallback_substitutes_sketch_and_records_reason() {
        let harness = build_harness(
            MockStageImageClient::new()
                .with_outcome(GenerationOutcome::TextFallback("no image possible".to_string())),
            MockSceneImageClient::new(),
            MockStorageClient::new().with_base_url(TEST_STORAGE_BASE_URL.to_string()),
            MockRecordClient::new(),
        );

        let sketch = sketch_data_url();
        let artifact = harness
            .app
            .generate(Some(&photo_data_url()), Some(&sketch), "Stage 3")
            .await
            .unwrap();

        assert_eq!(artifact.fallback_text.as_deref(), Some("no image possible"));

        // The substituted result is the original sketch, byte for byte.
        let sketch_bytes = VisualInput::from_data_url(&sketch).unwrap().data;
        let files = harness.storage.get_files();
        let result_key = files.keys().find(|k| k.starts_with("results/")).unwrap();
        assert_eq!(files[result_key], sketch_bytes);

        let saved = harness.records.get_saved_records();
        assert_eq!(saved.len(), 1);
        assert_eq!(
            saved[0].prompts_used.fallback_text.as_deref(),
            Some("no image possible")
        );
    }

    #[tokio::test]
    async fn test_failure_outcome_aborts_without_persistence() {
        let harness = build_harness(
            MockStageImageClient::new()
                .with_outcome(GenerationOutcome::Failure("no candidates".to_string())),
            MockSceneImageClient::new(),
            MockStorageClient::new(),
            MockRecordClient::new(),
        );

        let err = harness
            .app
            .generate(Some(&photo_data_url()), Some(&sketch_data_url()), "Stage 1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyGeneration(_)));
        assert_eq!(harness.storage.get_upload_count(), 0);
        assert_eq!(harness.records.get_save_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_error_aborts_without_persistence() {
        let harness = build_harness(
            MockStageImageClient::new().with_failure(true),
            MockSceneImageClient::new(),
            MockStorageClient::new(),
            MockRecordClient::new(),
        );

        let err = harness
            .app
            .generate(Some(&photo_data_url()), Some(&sketch_data_url()), "Stage 1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::BackendUnavailable(_)));
        assert_eq!(harness.storage.get_upload_count(), 0);
        assert_eq!(*harness.states.lock().unwrap().last().unwrap(), WorkflowState::Failed);
    }

    #[tokio::test]
    async fn test_single_upload_failure_skips_record() {
        let harness = build_harness(
            MockStageImageClient::new(),
            MockSceneImageClient::new(),
            MockStorageClient::new().with_failure_on("results/"),
            MockRecordClient::new(),
        );

        let err = harness
            .app
            .generate(Some(&photo_data_url()), Some(&sketch_data_url()), "Stage 1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Upload(_)));
        // All three uploads are attempted; the group fails as one.
        assert_eq!(harness.storage.get_upload_count(), 3);
        assert_eq!(harness.records.get_save_count(), 0);
    }

    #[tokio::test]
    async fn test_scene_fetch_failure_downgrades_to_three_part_request() {
        let harness = build_harness(
            MockStageImageClient::new(),
            MockSceneImageClient::new().with_failure(true),
            MockStorageClient::new(),
            MockRecordClient::new(),
        );

        harness
            .app
            .generate(Some(&photo_data_url()), Some(&sketch_data_url()), "Stage 2")
            .await
            .unwrap();

        let recorded = harness.generator.last_request().unwrap();
        assert!(!recorded.scene_attached);
        // The directive context still reaches the backend as text.
        assert!(recorded.instruction.contains("magical forest"));
        assert_eq!(harness.records.get_save_count(), 1);
    }

    #[tokio::test]
    async fn test_scene_reference_is_attached_when_fetch_succeeds() {
        let harness = default_harness();

        harness
            .app
            .generate(Some(&photo_data_url()), Some(&sketch_data_url()), "Stage 2")
            .await
            .unwrap();

        assert!(harness.generator.last_request().unwrap().scene_attached);
        assert_eq!(harness.scene_images.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_scene_falls_back_to_catalog_default() {
        let harness = default_harness();

        harness
            .app
            .generate(
                Some(&photo_data_url()),
                Some(&sketch_data_url()),
                "Stage 99",
            )
            .await
            .unwrap();

        let saved = harness.records.get_saved_records();
        assert_eq!(saved[0].stage, "Stage 1");
    }

    #[tokio::test]
    async fn test_record_failure_fails_workflow() {
        let harness = build_harness(
            MockStageImageClient::new(),
            MockSceneImageClient::new(),
            MockStorageClient::new(),
            MockRecordClient::new().with_failure(true),
        );

        let err = harness
            .app
            .generate(Some(&photo_data_url()), Some(&sketch_data_url()), "Stage 1")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Record(_)));
    }

    #[test]
    fn test_asset_run_ids_are_unique() {
        assert_ne!(asset_run_id(), asset_run_id());
    }
}
