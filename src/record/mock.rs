use super::RecordService;
use crate::models::{GenerationRecord, NewGenerationRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockRecordClient {
    saved: Arc<Mutex<Vec<NewGenerationRecord>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockRecordClient {
    pub fn new() -> Self {
        Self {
            saved: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_saved_records(&self) -> Vec<NewGenerationRecord> {
        self.saved.lock().unwrap().clone()
    }

    pub fn get_save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }
}

impl Default for MockRecordClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordService for MockRecordClient {
    async fn save_record(&self, record: &NewGenerationRecord) -> Result<GenerationRecord> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Record("mock record failure".to_string()));
        }

        let mut saved = self.saved.lock().unwrap();
        saved.push(record.clone());

        Ok(GenerationRecord {
            id: saved.len() as i64,
            drawing_url: record.drawing_url.clone(),
            result_url: record.result_url.clone(),
            photo_url: record.photo_url.clone(),
            prompts_used: record.prompts_used.clone(),
            stage: record.stage.clone(),
            created_at: None,
        })
    }
}
