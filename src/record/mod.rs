//! Generation record persistence.
//!
//! One row is written per completed workflow run through a PostgREST-style
//! REST endpoint; rows are never updated in place.

pub mod client;
pub mod mock;

pub use client::RecordClient;
pub use mock::MockRecordClient;

use crate::models::{GenerationRecord, NewGenerationRecord};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait RecordService: Send + Sync {
    async fn save_record(&self, record: &NewGenerationRecord) -> Result<GenerationRecord>;
}
