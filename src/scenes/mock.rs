use super::{Scene, SceneImageService};
use crate::encoding::VisualInput;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockSceneImageClient {
    references: Arc<Mutex<Vec<VisualInput>>>,
    should_fail: Arc<Mutex<bool>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockSceneImageClient {
    pub fn new() -> Self {
        Self {
            references: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_reference(self, reference: VisualInput) -> Self {
        self.references.lock().unwrap().push(reference);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockSceneImageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SceneImageService for MockSceneImageClient {
    async fn fetch_reference(&self, scene: &Scene) -> Result<VisualInput> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        if *self.should_fail.lock().unwrap() {
            return Err(Error::SceneFetch(format!(
                "mock fetch failure for {}",
                scene.id
            )));
        }

        let references = self.references.lock().unwrap();
        if references.is_empty() {
            // Tiny valid 1x1 PNG as default
            Ok(VisualInput::new(
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
            ))
        } else {
            let index = (*count - 1) % references.len();
            Ok(references[index].clone())
        }
    }
}
