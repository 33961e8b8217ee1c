use serde::Serialize;

use super::connection::ConnectionState;
use super::event::{Channel, FirmwareInfo};
use crate::config::{ChannelLimits, Thresholds};

/// Shown in place of firmware metadata the device could not provide.
pub const FIRMWARE_PLACEHOLDER: &str = "N/A";

const EMPTY_READING: &str = "--";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Level {
    #[default]
    Normal,
    Warning,
    Danger,
}

impl Level {
    /// `>= danger` wins over `>= warning`. Channels without levels stay Normal.
    pub fn classify(value: f64, limits: &ChannelLimits) -> Self {
        match (limits.warning, limits.danger) {
            (_, Some(danger)) if value >= danger => Level::Danger,
            (Some(warning), _) if value >= warning => Level::Warning,
            _ => Level::Normal,
        }
    }
}

/// Threshold-derived display hints, recomputed after each record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Indicators {
    /// 0..=100, fraction of the pressure scale maximum.
    pub pressure_fill: f64,
    pub pressure_level: Level,
    pub temperature_level: Level,
}

impl Indicators {
    pub fn derive(state: &DashboardState, thresholds: &Thresholds) -> Self {
        let mut out = state.indicators;
        if let Some(p) = state.reading(Channel::Pressure) {
            out.pressure_fill = (p / thresholds.pressure.max * 100.0).clamp(0.0, 100.0);
            out.pressure_level = Level::classify(p, &thresholds.pressure);
        }
        if let Some(t) = state.reading(Channel::Temperature) {
            out.temperature_level = Level::classify(t, &thresholds.temperature);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Firmware {
    Unknown,
    Known(FirmwareInfo),
    /// Version string pushed over the stream without compile metadata.
    Reported(String),
    Unavailable,
}

/// The only ways display state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    Reading { channel: Channel, value: f64 },
    Motor(bool),
    ManualOverride(bool),
    Firmware(Firmware),
    Indicators(Indicators),
    Connection(ConnectionState),
}

/// Last known value of every dashboard field.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
    pub flow: Option<f64>,
    pub motor: Option<bool>,
    pub manual_override: Option<bool>,
    pub firmware: Firmware,
    pub indicators: Indicators,
    pub connection: ConnectionState,
    /// Bumped on every reduction.
    pub version: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            pressure: None,
            temperature: None,
            flow: None,
            motor: None,
            manual_override: None,
            firmware: Firmware::Unknown,
            indicators: Indicators::default(),
            connection: ConnectionState::Disconnected,
            version: 0,
        }
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::Reading { channel, value } => match channel {
                Channel::Pressure => self.pressure = Some(value),
                Channel::Temperature => self.temperature = Some(value),
                Channel::Flow => self.flow = Some(value),
            },
            StateDelta::Motor(on) => self.motor = Some(on),
            StateDelta::ManualOverride(manual) => self.manual_override = Some(manual),
            StateDelta::Firmware(fw) => {
                // Full metadata is never downgraded by a bare stream version.
                if let (Firmware::Known(_), Firmware::Reported(_)) = (&self.firmware, &fw) {
                    return;
                }
                self.firmware = fw;
            }
            StateDelta::Indicators(ind) => self.indicators = ind,
            StateDelta::Connection(c) => self.connection = c,
        }
        self.version += 1;
    }

    pub fn reading(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Pressure => self.pressure,
            Channel::Temperature => self.temperature,
            Channel::Flow => self.flow,
        }
    }

    pub fn view(&self, host: &str) -> DashboardView {
        let fmt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| EMPTY_READING.to_string());
        let connected = self.connection == ConnectionState::Connected;

        DashboardView {
            pressure: fmt(self.pressure),
            temperature: fmt(self.temperature),
            flow: fmt(self.flow),
            motor: match self.motor {
                Some(true) => "ON",
                Some(false) => "OFF",
                None => EMPTY_READING,
            }
            .to_string(),
            mode: match self.manual_override {
                Some(true) => "MANUAL",
                Some(false) => "AUTO",
                None => EMPTY_READING,
            }
            .to_string(),
            firmware: match &self.firmware {
                Firmware::Unknown => EMPTY_READING.to_string(),
                Firmware::Known(info) => {
                    format!("{} ({} {})", info.version, info.compile_date, info.compile_time)
                }
                Firmware::Reported(v) => v.clone(),
                Firmware::Unavailable => FIRMWARE_PLACEHOLDER.to_string(),
            },
            indicators: self.indicators,
            connection: if connected { host.to_string() } else { "Disconnected".to_string() },
            controls_enabled: connected,
        }
    }
}

/// Copy of everything a front-end needs to draw the status panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub pressure: String,
    pub temperature: String,
    pub flow: String,
    pub motor: String,
    pub mode: String,
    pub firmware: String,
    pub indicators: Indicators,
    pub connection: String,
    pub controls_enabled: bool,
}
