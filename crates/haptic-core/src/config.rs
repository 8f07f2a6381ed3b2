use crate::error::Result;
use crate::types::HapticStrength;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "haptitalk.yaml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HAPTITALK_CONFIG";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// HapticsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HapticsConfig {
    #[serde(default)]
    pub strength: HapticStrength,
    /// Repetitions of the test sequence, 1 to 4.
    #[serde(default = "default_count")]
    pub count: u8,
}

fn default_count() -> u8 {
    2
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            strength: HapticStrength::default(),
            count: default_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_dismiss_after_ms")]
    pub dismiss_after_ms: u64,
}

fn default_dismiss_after_ms() -> u64 {
    5_000
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: default_dismiss_after_ms(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// How many recent `(action, timestamp)` pairs to remember for duplicate
    /// detection. Zero disables it.
    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
    /// How many recent send attempts the in-memory link keeps for
    /// inspection. Older attempts are dropped.
    #[serde(default = "default_outbox_capacity")]
    pub outbox_capacity: usize,
}

fn default_dedup_window() -> usize {
    256
}

fn default_outbox_capacity() -> usize {
    1024
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            dedup_window: default_dedup_window(),
            outbox_capacity: default_outbox_capacity(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeviceConfig / ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Shown in the connection label, e.g. "연결됨: Apple Watch".
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Apple Watch".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub haptics: HapticsConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Resolve which file to read: an explicit path wins, then
    /// `HAPTITALK_CONFIG` (handled by the CLI through clap's `env`), then
    /// `haptitalk.yaml` in the working directory.
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load from `path`, or return defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if !(1..=4).contains(&self.haptics.count) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "haptics.count={} is outside 1..=4 and will be clamped",
                    self.haptics.count
                ),
            });
        }

        if self.notification.dismiss_after_ms == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "notification.dismiss_after_ms is 0; notifications would never be visible"
                    .to_string(),
            });
        } else if self.notification.dismiss_after_ms > 60_000 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "notification.dismiss_after_ms={} keeps notifications up for over a minute",
                    self.notification.dismiss_after_ms
                ),
            });
        }

        if self.delivery.dedup_window == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "delivery.dedup_window is 0; duplicate deliveries will be re-applied"
                    .to_string(),
            });
        }

        if self.delivery.outbox_capacity == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "delivery.outbox_capacity is 0; /api/outbox will always be empty"
                    .to_string(),
            });
        }

        if self.device.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "device.name is empty".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
