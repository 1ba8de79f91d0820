//! Timing, limits, storage and logging configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Coordinator-side deadlines, one per action class.
///
/// When a deadline passes, the Coordinator reports `Timeout` and releases
/// the chat lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_prepare_ms")]
    pub prepare_ms: u64,

    #[serde(default = "default_submit_ms")]
    pub submit_ms: u64,

    #[serde(default = "default_await_response_ms")]
    pub await_response_ms: u64,

    #[serde(default = "default_extract_image_ms")]
    pub extract_image_ms: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            prepare_ms: default_prepare_ms(),
            submit_ms: default_submit_ms(),
            await_response_ms: default_await_response_ms(),
            extract_image_ms: default_extract_image_ms(),
        }
    }
}

impl TimeoutsConfig {
    /// Same deadline for every class. Handy in tests.
    pub fn uniform(ms: u64) -> Self {
        Self {
            prepare_ms: ms,
            submit_ms: ms,
            await_response_ms: ms,
            extract_image_ms: ms,
        }
    }
}

fn default_prepare_ms() -> u64 {
    10_000
}

fn default_submit_ms() -> u64 {
    15_000
}

fn default_await_response_ms() -> u64 {
    180_000
}

fn default_extract_image_ms() -> u64 {
    30_000
}

/// Automation-side polling.
///
/// The page-side waits should end before the matching Coordinator deadline
/// so the Coordinator sees a typed page failure instead of a bare timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Consecutive identical samples that count as "generation stopped".
    #[serde(default = "default_stable_samples")]
    pub stable_samples: u32,

    #[serde(default = "default_prepare_wait_ms")]
    pub prepare_wait_ms: u64,

    #[serde(default = "default_submit_wait_ms")]
    pub submit_wait_ms: u64,

    #[serde(default = "default_response_max_wait_ms")]
    pub response_max_wait_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            stable_samples: default_stable_samples(),
            prepare_wait_ms: default_prepare_wait_ms(),
            submit_wait_ms: default_submit_wait_ms(),
            response_max_wait_ms: default_response_max_wait_ms(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

fn default_interval_ms() -> u64 {
    250
}

fn default_stable_samples() -> u32 {
    3
}

fn default_prepare_wait_ms() -> u64 {
    8_000
}

fn default_submit_wait_ms() -> u64 {
    5_000
}

fn default_response_max_wait_ms() -> u64 {
    170_000
}

/// Bounds on in-memory growth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Oldest messages beyond this are evicted from a chat.
    #[serde(default = "default_max_messages_per_chat")]
    pub max_messages_per_chat: usize,

    /// Completed command outcomes remembered for idempotency.
    #[serde(default = "default_ledger_capacity")]
    pub ledger_capacity: usize,

    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Buffer size of the Coordinator ↔ Automation channels.
    #[serde(default = "default_link_capacity")]
    pub link_capacity: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_messages_per_chat: default_max_messages_per_chat(),
            ledger_capacity: default_ledger_capacity(),
            max_prompt_chars: default_max_prompt_chars(),
            link_capacity: default_link_capacity(),
        }
    }
}

fn default_max_messages_per_chat() -> usize {
    500
}

fn default_ledger_capacity() -> usize {
    1024
}

fn default_max_prompt_chars() -> usize {
    32_000
}

fn default_link_capacity() -> usize {
    64
}

/// Key-value store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".pagepilot").join("state"))
        .unwrap_or_else(|| PathBuf::from("/tmp/pagepilot/state"))
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily-rotated log files. `None` disables file output.
    #[serde(default = "default_log_dir")]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: default_log_dir(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".pagepilot").join("logs"))
}

fn default_max_log_files() -> usize {
    14
}
