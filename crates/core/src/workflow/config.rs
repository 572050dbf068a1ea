//! Workflow configuration.

use std::time::Duration;

use crate::config::Config;
use crate::download::DownloadMode;

/// Settings for a conversion workflow.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Delay between job status requests.
    pub poll_interval: Duration,
    /// Files larger than this are rejected before upload.
    pub max_file_size_bytes: u64,
    pub download_mode: DownloadMode,
    /// Capacity of the update broadcast channel. Slow subscribers that fall
    /// further behind miss updates.
    pub update_buffer: usize,
}

fn default_update_buffer() -> usize {
    64
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl WorkflowConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.polling.interval(),
            max_file_size_bytes: config.upload.max_file_size_bytes,
            download_mode: config.download.mode,
            update_buffer: default_update_buffer(),
        }
    }
}
