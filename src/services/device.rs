use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::config::DeviceConfig;
use crate::error::{DashboardError, Result};
use crate::kernel::event::{CommandKind, FirmwareInfo};

/// Request/response calls to the SV7200 web server.
#[derive(Clone)]
pub struct DeviceClient {
    client: Client,
    command_url: String,
    firmware_url: String,
}

#[derive(Serialize)]
struct CommandRequest<'a> {
    command: &'a str,
}

impl DeviceClient {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout())
                .build()
                .unwrap_or_default(),
            command_url: config.url(&config.command_path),
            firmware_url: config.url(&config.firmware_path),
        }
    }

    /// Client for the long-lived event stream. Only connecting is bounded;
    /// a total timeout would cut the stream.
    pub fn stream_client(config: &DeviceConfig) -> Client {
        Client::builder()
            .connect_timeout(config.request_timeout())
            .tcp_keepalive(Duration::from_secs(30))
            .build()
            .unwrap_or_default()
    }

    /// Fire one command. Delivered at most once; the caller decides whether
    /// to retry.
    pub async fn send_command(&self, command: CommandKind) -> Result<String> {
        let response = self
            .client
            .post(&self.command_url)
            .json(&CommandRequest { command: command.as_str() })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::CommandFailed {
                command: command.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?.trim().to_string())
    }

    pub async fn fetch_firmware(&self) -> Result<FirmwareInfo> {
        let response = self
            .client
            .get(&self.firmware_url)
            .send()
            .await
            .map_err(|e| DashboardError::Firmware(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DashboardError::Firmware(format!("server returned {}", response.status())));
        }

        response
            .json::<FirmwareInfo>()
            .await
            .map_err(|e| DashboardError::Firmware(e.to_string()))
    }
}
