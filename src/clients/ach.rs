//! File-transfer processor client

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::ClientError;
use super::{check_status, http_client};
use crate::ach::AchFile;

const SERVICE: &str = "ach";

#[async_trait]
pub trait AchClient: Send + Sync {
    /// Submit a file. Retried submissions with the same key are not
    /// processed twice by the processor.
    async fn create_file(&self, idempotency_key: &str, file: &AchFile)
    -> Result<String, ClientError>;

    /// Ask the processor to validate a stored file
    async fn validate_file(&self, file_id: &str) -> Result<(), ClientError>;

    /// Read a stored file back
    async fn get_file(&self, file_id: &str) -> Result<AchFile, ClientError>;
}

#[derive(Deserialize)]
struct CreateFileResponse {
    id: String,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ValidateFileResponse {
    #[serde(default)]
    error: Option<String>,
}

pub struct HttpAchClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAchClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client(timeout)?,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AchClient for HttpAchClient {
    async fn create_file(
        &self,
        idempotency_key: &str,
        file: &AchFile,
    ) -> Result<String, ClientError> {
        let response = self
            .client
            .post(format!("{}/files/create", self.endpoint))
            .header("X-Idempotency-Key", idempotency_key)
            .json(file)
            .send()
            .await?;
        let body: CreateFileResponse = check_status(SERVICE, response).await?.json().await?;

        if let Some(message) = body.error.filter(|e| !e.is_empty()) {
            return Err(ClientError::Rejected {
                service: SERVICE,
                message,
            });
        }
        debug!(file_id = %body.id, idempotency_key, "ACH file created");
        Ok(body.id)
    }

    async fn validate_file(&self, file_id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .get(format!("{}/files/{}/validate", self.endpoint, file_id))
            .send()
            .await?;
        let body: ValidateFileResponse = check_status(SERVICE, response).await?.json().await?;

        match body.error.filter(|e| !e.is_empty()) {
            Some(message) => Err(ClientError::Rejected {
                service: SERVICE,
                message,
            }),
            None => Ok(()),
        }
    }

    async fn get_file(&self, file_id: &str) -> Result<AchFile, ClientError> {
        let response = self
            .client
            .get(format!("{}/files/{}", self.endpoint, file_id))
            .send()
            .await?;
        Ok(check_status(SERVICE, response).await?.json().await?)
    }
}

/// Mock processor for testing
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub struct MockAchClient {
        files: Mutex<HashMap<String, AchFile>>,
        keys: Mutex<Vec<String>>,
        create_count: AtomicUsize,
        /// Fail the n-th create call (1-based)
        fail_create_on: Mutex<Option<usize>>,
        /// Drop entries from files handed back by `get_file`
        truncate_read_back: Mutex<bool>,
    }

    impl MockAchClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail_create_on(&self, call: usize) {
            *self.fail_create_on.lock().unwrap() = Some(call);
        }

        pub fn set_truncate_read_back(&self, truncate: bool) {
            *self.truncate_read_back.lock().unwrap() = truncate;
        }

        pub fn create_count(&self) -> usize {
            self.create_count.load(Ordering::SeqCst)
        }

        pub fn idempotency_keys(&self) -> Vec<String> {
            self.keys.lock().unwrap().clone()
        }

        pub fn file(&self, file_id: &str) -> Option<AchFile> {
            self.files.lock().unwrap().get(file_id).cloned()
        }

        pub fn insert_file(&self, file_id: &str, file: AchFile) {
            self.files.lock().unwrap().insert(file_id.to_string(), file);
        }
    }

    #[async_trait]
    impl AchClient for MockAchClient {
        async fn create_file(
            &self,
            idempotency_key: &str,
            file: &AchFile,
        ) -> Result<String, ClientError> {
            let n = self.create_count.fetch_add(1, Ordering::SeqCst) + 1;
            if *self.fail_create_on.lock().unwrap() == Some(n) {
                return Err(ClientError::Status {
                    service: SERVICE,
                    status: 500,
                    body: "mock create failure".to_string(),
                });
            }
            self.keys.lock().unwrap().push(idempotency_key.to_string());
            let file_id = format!("file-{}", n);
            self.insert_file(&file_id, file.clone());
            Ok(file_id)
        }

        async fn validate_file(&self, file_id: &str) -> Result<(), ClientError> {
            match self.file(file_id) {
                Some(_) => Ok(()),
                None => Err(ClientError::Status {
                    service: SERVICE,
                    status: 404,
                    body: format!("file {} not found", file_id),
                }),
            }
        }

        async fn get_file(&self, file_id: &str) -> Result<AchFile, ClientError> {
            let mut file = self.file(file_id).ok_or_else(|| ClientError::Status {
                service: SERVICE,
                status: 404,
                body: format!("file {} not found", file_id),
            })?;
            if *self.truncate_read_back.lock().unwrap() {
                file.batches.clear();
            }
            Ok(file)
        }
    }
}
