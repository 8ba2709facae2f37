//! Object storage integration for captured and generated assets.
//!
//! Handles uploading photos, sketches, and result images to S3-compatible
//! storage (DigitalOcean Spaces) for public serving.

pub mod client;
pub mod mock;

pub use client::StorageClient;
pub use mock::MockStorageClient;

use async_trait::async_trait;

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Upload a blob and return its public URL, or `None` on failure.
    ///
    /// Failures are logged inside the implementation and never propagate
    /// past this boundary.
    async fn upload_file(&self, key: &str, data: &[u8], content_type: &str) -> Option<String>;
}
