//! Generative backend integration for stage image synthesis.
//!
//! Provides the interface for the one generation invocation per workflow
//! run: multi-part request out, polymorphic outcome back.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiStageClient;
pub use mock::MockStageImageClient;

use crate::encoding::VisualInput;
use crate::models::GenerationOutcome;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StageImageService: Send + Sync {
    /// Dispatch one composited-generation request: pose sketch, subject
    /// photo, optional scene reference, and the composed instruction text.
    ///
    /// Exactly one attempt, no internal retry. Errors cover transport
    /// failure and backend rejection; a backend that answers without an
    /// image still succeeds with a non-`Image` outcome.
    async fn generate_stage_image(
        &self,
        sketch: &VisualInput,
        photo: &VisualInput,
        scene: Option<&VisualInput>,
        instruction: &str,
    ) -> Result<GenerationOutcome>;
}
