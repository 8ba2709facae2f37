use super::StorageService;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockStorageClient {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    base_url: String,
    upload_count: Arc<Mutex<usize>>,
    fail_prefixes: Arc<Mutex<Vec<String>>>,
}

impl MockStorageClient {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            base_url: "https://mock-storage.example.com".to_string(),
            upload_count: Arc::new(Mutex::new(0)),
            fail_prefixes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Make every upload whose key starts with `prefix` fail.
    pub fn with_failure_on(self, prefix: impl Into<String>) -> Self {
        self.fail_prefixes.lock().unwrap().push(prefix.into());
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockStorageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageService for MockStorageClient {
    async fn upload_file(&self, key: &str, data: &[u8], _content_type: &str) -> Option<String> {
        let mut count = self.upload_count.lock().unwrap();
        *count += 1;

        let fail = self
            .fail_prefixes
            .lock()
            .unwrap()
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()));
        if fail {
            return None;
        }

        self.files
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Some(format!("{}/{}", self.base_url, key))
    }
}
