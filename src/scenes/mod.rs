//! Stage scene catalog and reference image retrieval.
//!
//! Scenes are a small fixed catalog; each entry pairs a reference image with
//! the directive text fragment that steers the generative model. Fetching
//! the reference image is a network operation that may fail independently
//! of generation.

pub mod client;
pub mod mock;

pub use client::SceneImageClient;
pub use mock::MockSceneImageClient;

use crate::encoding::VisualInput;
use crate::Result;
use async_trait::async_trait;

/// One selectable stage scene. Immutable once selected; looked up by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scene {
    pub id: &'static str,
    pub image_path: &'static str,
    pub directive: &'static str,
}

pub const SCENES: &[Scene] = &[
    Scene {
        id: "Stage 1",
        image_path: "/stages/stage1.png",
        directive: "The character is a DJ performing a set. Ensure they are positioned \
                    correctly behind the decks if visible, or commanding the stage. Scale \
                    them to fit a realistic human proportion within this specific concert \
                    venue.",
    },
    Scene {
        id: "Stage 2",
        image_path: "/stages/stage2.png",
        directive: "The character is standing in a magical forest. Ensure the lighting \
                    from the glowing plants reflects on them.",
    },
    Scene {
        id: "Stage 3",
        image_path: "/stages/stage3.png",
        directive: "The character is an explorer on Mars. Adjust lighting to match the \
                    reddish atmospheric haze.",
    },
];

pub fn find(id: &str) -> Option<&'static Scene> {
    SCENES.iter().find(|scene| scene.id == id)
}

/// Catalog entry used when an unknown identifier is selected.
pub fn default_scene() -> &'static Scene {
    &SCENES[0]
}

#[async_trait]
pub trait SceneImageService: Send + Sync {
    /// Fetch the scene's reference image in transport form.
    ///
    /// Callers treat failure as non-fatal and proceed without a scene part.
    async fn fetch_reference(&self, scene: &Scene) -> Result<VisualInput>;
}
