use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::time::Timestamp;
use crate::error::DashboardError;

/// Chart-bearing numeric channels reported by the SV7200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Pressure,
    Temperature,
    Flow,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Pressure, Channel::Temperature, Channel::Flow];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Pressure => "pressure",
            Channel::Temperature => "temperature",
            Channel::Flow => "flow",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pressure" => Ok(Channel::Pressure),
            "temperature" | "temp" => Ok(Channel::Temperature),
            "flow" => Ok(Channel::Flow),
            other => Err(DashboardError::Config(format!("unknown channel '{other}'"))),
        }
    }
}

/// Payload of one `update` stream event. Every field is optional; a record
/// only touches what it carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor: Option<bool>,
    #[serde(default, rename = "manualOverride", skip_serializing_if = "Option::is_none")]
    pub manual_override: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
}

impl UpdateRecord {
    pub fn decode(payload: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(payload).map_err(|e| DashboardError::Decode(e.to_string()))
    }

    pub fn value(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Pressure => self.pressure,
            Channel::Temperature => self.temperature,
            Channel::Flow => self.flow,
        }
    }

    /// Numeric channels present in this record, in channel order.
    pub fn readings(&self) -> impl Iterator<Item = (Channel, f64)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(move |c| self.value(c).map(|v| (c, v)))
    }
}

/// Identifies one stream subscription. Strictly increasing per connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Toggle,
    Override,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Toggle => "toggle",
            CommandKind::Override => "override",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "toggle" => Ok(CommandKind::Toggle),
            "override" => Ok(CommandKind::Override),
            other => Err(DashboardError::CommandRejected(format!("invalid command '{other}'"))),
        }
    }
}

/// Firmware metadata as served by the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareInfo {
    pub version: String,
    pub compile_date: String,
    pub compile_time: String,
}

/// Everything the reactor reacts to. Delivered through a single ordered
/// channel by the runtime.
#[derive(Debug, Clone)]
pub enum Event {
    /// User (or startup) request to (re)establish the stream.
    Connect,
    StreamOpened {
        subscription: SubscriptionId,
    },
    StreamMessage {
        subscription: SubscriptionId,
        payload: String,
        received_at: Timestamp,
    },
    StreamLost {
        subscription: SubscriptionId,
        reason: String,
    },
    /// Reconnect timer armed after `subscription` was lost has fired.
    ReconnectDue {
        subscription: SubscriptionId,
    },
    Command {
        name: String,
    },
    CommandFinished {
        command: CommandKind,
        result: Result<String, String>,
    },
    FirmwareLoaded(FirmwareInfo),
    FirmwareUnavailable(String),
}
