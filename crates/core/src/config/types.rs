use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::download::DownloadMode;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Conversion backend connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL of the conversion service (e.g., "http://localhost:8080")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Timeout for status and delete requests, in seconds.
    /// Uploads and downloads are bounded only by the connect timeout.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Upload settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Largest file accepted for submission (default: 500 MiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Read size used when streaming the file body.
    #[serde(default = "default_chunk_size")]
    pub chunk_size_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            chunk_size_bytes: default_chunk_size(),
        }
    }
}

fn default_max_file_size() -> u64 {
    500 * 1024 * 1024
}

fn default_chunk_size() -> usize {
    64 * 1024
}

/// Job status polling settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Delay between the end of one status request and the start of the next.
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1000
}

/// Artifact retrieval settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadConfig {
    /// Directory converted files are saved into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub mode: DownloadMode,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            mode: DownloadMode::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:8080");
        assert_eq!(config.backend.request_timeout_secs, 30);
        assert_eq!(config.upload.max_file_size_bytes, 524_288_000);
        assert_eq!(config.upload.chunk_size_bytes, 65_536);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.download.output_dir, PathBuf::from("."));
        assert_eq!(config.download.mode, DownloadMode::Streamed);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
[backend]
base_url = "https://convert.example.com"
request_timeout_secs = 5
connect_timeout_secs = 2

[upload]
max_file_size_bytes = 1048576
chunk_size_bytes = 4096

[polling]
interval_ms = 250

[download]
output_dir = "/tmp/converted"
mode = "buffered"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.backend.base_url, "https://convert.example.com");
        assert_eq!(config.backend.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.backend.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.upload.max_file_size_bytes, 1_048_576);
        assert_eq!(config.upload.chunk_size_bytes, 4096);
        assert_eq!(config.polling.interval(), Duration::from_millis(250));
        assert_eq!(config.download.output_dir, PathBuf::from("/tmp/converted"));
        assert_eq!(config.download.mode, DownloadMode::Buffered);
    }

    #[test]
    fn test_deserialize_partial_section() {
        let toml = r#"
[polling]
interval_ms = 50
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.polling.interval_ms, 50);
        assert_eq!(config.backend.connect_timeout_secs, 10);
    }

    #[test]
    fn test_unknown_download_mode_fails() {
        let toml = r#"
[download]
mode = "carrier-pigeon"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }
}
