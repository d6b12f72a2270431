use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct RootConfig {
    #[serde(default)]
    pub background_tasks: BackgroundTaskConfig,
    #[serde(default)]
    pub request_timeouts: RequestTimeoutConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Timing of the progress simulator and the automatic retry.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BackgroundTaskConfig {
    pub tick_interval_ms: u64,
    /// A status line is surfaced every this many ticks.
    pub progress_message_every_ticks: u32,
    pub auto_retry_delay_ms: u64,
    pub max_auto_retries: u32,
    pub estimates: DurationEstimates,
}

impl Default for BackgroundTaskConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 2_000,
            progress_message_every_ticks: 15,
            auto_retry_delay_ms: 5_000,
            max_auto_retries: 1,
            estimates: DurationEstimates::default(),
        }
    }
}

impl BackgroundTaskConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn auto_retry_delay(&self) -> Duration {
        Duration::from_millis(self.auto_retry_delay_ms)
    }
}

/// Expected wall-clock time per operation, used to pace simulated progress.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DurationEstimates {
    pub learning_path_secs: u64,
    pub modules_secs: u64,
    pub topics_secs: u64,
}

impl Default for DurationEstimates {
    fn default() -> Self {
        Self {
            learning_path_secs: 120,
            modules_secs: 180,
            topics_secs: 180,
        }
    }
}

/// Per-operation request timeouts enforced at the generation API boundary.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RequestTimeoutConfig {
    pub learning_path_secs: u64,
    pub modules_secs: u64,
    pub topics_secs: u64,
}

impl Default for RequestTimeoutConfig {
    fn default() -> Self {
        Self {
            learning_path_secs: 300,
            modules_secs: 300,
            topics_secs: 300,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NotificationConfig {
    /// Whether a permission request is granted.
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
