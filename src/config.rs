use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{DashboardError, Result};
use crate::kernel::event::Channel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub device: DeviceConfig,
    pub stream: StreamConfig,
    pub thresholds: Thresholds,
    pub export: ExportConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            stream: StreamConfig::default(),
            thresholds: Thresholds::default(),
            export: ExportConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub base_url: String,
    pub events_path: String,
    pub command_path: String,
    pub firmware_path: String,
    pub request_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://192.168.4.1".to_string(),
            events_path: "/events".to_string(),
            command_path: "/command".to_string(),
            firmware_path: "/firmware".to_string(),
            request_timeout_ms: 5_000,
        }
    }
}

impl DeviceConfig {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Host shown by the connection indicator while connected. Falls back
    /// to the raw base URL when it does not parse.
    pub fn host(&self) -> String {
        match Url::parse(&self.base_url) {
            Ok(url) => url.host_str().unwrap_or(&self.base_url).to_string(),
            Err(e) => {
                tracing::warn!("Cannot parse device.base_url '{}': {}", self.base_url, e);
                self.base_url.clone()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub reconnect_delay_ms: u64,
    /// 600 samples is ten minutes at the device's 1 Hz update rate.
    pub window_capacity: usize,
    pub channels: Vec<Channel>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 3_000,
            window_capacity: 600,
            channels: vec![Channel::Temperature, Channel::Flow],
        }
    }
}

impl StreamConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// Display range and alert levels for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLimits {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub warning: Option<f64>,
    #[serde(default)]
    pub danger: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub pressure: ChannelLimits,
    pub temperature: ChannelLimits,
    pub flow: ChannelLimits,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            pressure: ChannelLimits { min: 2.0, max: 4.0, warning: Some(3.5), danger: Some(4.0) },
            temperature: ChannelLimits { min: 0.0, max: 100.0, warning: Some(85.0), danger: Some(90.0) },
            flow: ChannelLimits { min: 0.0, max: 100.0, warning: None, danger: None },
        }
    }
}

impl Thresholds {
    pub fn for_channel(&self, channel: Channel) -> &ChannelLimits {
        match channel {
            Channel::Pressure => &self.pressure,
            Channel::Temperature => &self.temperature,
            Channel::Flow => &self.flow,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name prefix. Derived from the exported channel names when unset.
    pub prefix: Option<String>,
    pub include_statistics: bool,
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.stream.window_capacity == 0 {
            return Err(DashboardError::Config("stream.window_capacity must be positive".into()));
        }
        if self.stream.channels.is_empty() {
            return Err(DashboardError::Config("stream.channels must not be empty".into()));
        }
        if self.stream.reconnect_delay_ms == 0 {
            return Err(DashboardError::Config("stream.reconnect_delay_ms must be positive".into()));
        }
        for channel in Channel::ALL {
            let limits = self.thresholds.for_channel(channel);
            if limits.max <= limits.min {
                return Err(DashboardError::Config(format!(
                    "thresholds.{channel}: max must exceed min"
                )));
            }
            if let (Some(warning), Some(danger)) = (limits.warning, limits.danger) {
                if warning > danger {
                    return Err(DashboardError::Config(format!(
                        "thresholds.{channel}: warning ({warning}) above danger ({danger})"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Load configuration from a TOML file. A missing file yields defaults so
/// the dashboard can start against a factory-configured device.
pub fn load(path: impl AsRef<Path>) -> Result<DashboardConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!("Config file not found at '{}'; using defaults.", path.display());
        return Ok(DashboardConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| DashboardError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: DashboardConfig =
        toml::from_str(&raw).map_err(|e| DashboardError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// `$XDG_CONFIG_HOME/sv7200/<file>`, falling back to `~/.config`.
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("sv7200")
}

pub fn default_path() -> PathBuf {
    config_dir().join("dashboard.toml")
}
