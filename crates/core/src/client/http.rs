//! HTTP implementation of the conversion backend.

use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{multipart, Body, Client, Response};
use tokio::sync::mpsc;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::config::{BackendConfig, Config};
use crate::job::JobCredentials;
use crate::upload::{SourceFile, UploadProgress};

use super::{
    ArtifactResponse, ClientError, ConversionBackend, ErrorBody, JobStatusResponse,
    UploadResponse,
};

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Conversion backend reached over HTTP.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    chunk_size: usize,
}

impl HttpBackend {
    /// Create a client for the backend at `config.base_url`.
    pub fn new(config: &BackendConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| ClientError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Create a client from the full configuration.
    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Ok(Self::new(&config.backend)?.with_chunk_size(config.upload.chunk_size_bytes))
    }

    /// Read size used when streaming upload bodies.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn job_url(&self, job: &JobCredentials) -> String {
        format!(
            "{}/api/jobs/{}",
            self.base_url,
            urlencoding::encode(job.id())
        )
    }

    /// Turn a non-success response into an error, preferring the backend's
    /// own message.
    async fn error_from_response(response: Response, fallback: &str) -> ClientError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if !parsed.message.trim().is_empty() => {
                ClientError::backend(status, parsed.message)
            }
            _ => ClientError::backend(status, format!("{} with status {}", fallback, status)),
        }
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, ClientError> {
        let body = response.text().await.map_err(ClientError::from_reqwest)?;
        serde_json::from_str(&body).map_err(|e| ClientError::invalid_response(e.to_string()))
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(
        &self,
        file: &SourceFile,
        target_format: &str,
        progress: mpsc::Sender<UploadProgress>,
    ) -> Result<UploadResponse, ClientError> {
        let url = format!(
            "{}/api/upload?targetFormat={}",
            self.base_url,
            urlencoding::encode(target_format)
        );

        let handle = tokio::fs::File::open(&file.path).await?;
        let total = file.size;
        let mut loaded = 0u64;
        let chunks = ReaderStream::with_capacity(handle, self.chunk_size).inspect(move |chunk| {
            if let Ok(bytes) = chunk {
                loaded += bytes.len() as u64;
                // Full size is reported once the backend acknowledges.
                if loaded < total {
                    let _ = progress.try_send(UploadProgress::new(loaded, total));
                }
            }
        });

        let part = multipart::Part::stream_with_length(Body::wrap_stream(chunks), total)
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| ClientError::InvalidRequest(format!("invalid MIME type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        debug!(url = %url, file = %file.file_name, size = total, "POST upload");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Upload failed").await);
        }

        Self::parse_json(response).await
    }

    async fn job_status(&self, job: &JobCredentials) -> Result<JobStatusResponse, ClientError> {
        let response = self
            .client
            .get(self.job_url(job))
            .bearer_auth(job.token())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Status request failed").await);
        }

        Self::parse_json(response).await
    }

    async fn download(&self, job: &JobCredentials) -> Result<ArtifactResponse, ClientError> {
        let url = format!("{}/download", self.job_url(job));
        let response = self
            .client
            .get(&url)
            .bearer_auth(job.token())
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            warn!(job_id = %job.id(), status = status.as_u16(), "Artifact download refused");
            return Err(ClientError::Download {
                status: status.as_u16(),
            });
        }

        let content_length = response.content_length();
        let body = response.bytes_stream().map_err(ClientError::from_reqwest);

        Ok(ArtifactResponse {
            content_length,
            body: Some(Box::pin(body)),
        })
    }

    async fn delete_job(&self, job: &JobCredentials) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.job_url(job))
            .bearer_auth(job.token())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, "Delete failed").await);
        }

        debug!(job_id = %job.id(), "Job deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = BackendConfig {
            base_url: "http://converter.local:8080/".to_string(),
            ..Default::default()
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.base_url(), "http://converter.local:8080");
    }

    #[test]
    fn test_job_url_encodes_id() {
        let backend = HttpBackend::new(&BackendConfig::default()).unwrap();
        let job = JobCredentials::new("a b/c", "t");
        assert_eq!(
            backend.job_url(&job),
            "http://localhost:8080/api/jobs/a%20b%2Fc"
        );
    }

    #[test]
    fn test_zero_chunk_size_is_raised() {
        let backend = HttpBackend::new(&BackendConfig::default())
            .unwrap()
            .with_chunk_size(0);
        assert_eq!(backend.chunk_size, 1);
    }
}
