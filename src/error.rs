use thiserror::Error;

use crate::kernel::event::Channel;

/// Crate-wide error type. Nothing in here is fatal to the dashboard process;
/// the driver logs and carries on.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("config error: {0}")]
    Config(String),

    #[error("channel '{0}' is not tracked by this window")]
    UnknownChannel(Channel),

    #[error("non-finite sample for '{channel}': {value}")]
    NonFiniteSample { channel: Channel, value: f64 },

    #[error("decode error: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("command rejected: {0}")]
    CommandRejected(String),

    #[error("device returned {status} for command '{command}'")]
    CommandFailed { command: String, status: u16 },

    #[error("firmware metadata unavailable: {0}")]
    Firmware(String),

    #[error("export error: {0}")]
    Export(String),

    #[error("preference store error: {0}")]
    Preferences(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        DashboardError::Transport(e.to_string())
    }
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::Export(e.to_string())
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;
