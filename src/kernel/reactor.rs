use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::connection::{ConnectionManager, ConnectionState};
use super::effect::SideEffect;
use super::event::{Channel, CommandKind, Event, SubscriptionId, UpdateRecord};
use super::state::{DashboardState, DashboardView, Firmware, Indicators, StateDelta};
use super::stats::{Observation, StatsTracker};
use super::telemetry::event::{CommandEventKind, DiagnosticEvent};
use super::telemetry::recorder::DiagnosticRecorder;
use super::time::{self, Timestamp};
use super::window::RollingWindow;
use crate::config::{DashboardConfig, Thresholds};
use crate::error::{DashboardError, Result};
use crate::export::{self, ExportArtifact, ExportOptions};

/// What became of a command request.
#[derive(Debug)]
pub enum CommandOutcome {
    Dispatched(CommandKind),
    Rejected(DashboardError),
}

/// Per-record ingestion summary.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestReport {
    pub observations: Vec<(Channel, Observation)>,
    pub rejected: Vec<Channel>,
}

/// Both means side by side: `all_time_mean` covers every accepted sample
/// since start, `windowed_mean` only what the window still holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel: Channel,
    pub latest: Option<f64>,
    pub count: u64,
    pub all_time_mean: Option<f64>,
    pub window_len: usize,
    pub windowed_mean: Option<f64>,
}

/// Owns every piece of dashboard state and advances it one event at a time.
///
/// `step` never awaits and never touches the network. It hands back the
/// side effects the runtime must perform.
pub struct Reactor {
    pub window: RollingWindow,
    pub stats: StatsTracker,
    pub state: DashboardState,
    pub connection: ConnectionManager,
    pub diagnostics: DiagnosticRecorder,
    thresholds: Thresholds,
    host: String,
}

impl Reactor {
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: RollingWindow::new(&config.stream.channels, config.stream.window_capacity)?,
            stats: StatsTracker::new(),
            state: DashboardState::new(),
            connection: ConnectionManager::new(config.stream.reconnect_delay()),
            diagnostics: DiagnosticRecorder::new(),
            thresholds: config.thresholds.clone(),
            host: config.device.host(),
        })
    }

    pub fn step(&mut self, event: Event) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        match event {
            Event::Connect => {
                effects.extend(self.connection.connect().into_iter().map(SideEffect::from));
                self.sync_connection(&mut effects);
            }
            Event::StreamOpened { subscription } => {
                if self.connection.on_open(subscription) {
                    info!("Stream {:?} open", subscription);
                    self.diagnostics.record(DiagnosticEvent::opened(subscription, time::now()));
                    self.sync_connection(&mut effects);
                }
            }
            Event::StreamMessage { subscription, payload, received_at } => {
                if !self.connection.accepts(subscription) {
                    debug!("Dropping message from stale subscription {:?}", subscription);
                } else {
                    match UpdateRecord::decode(&payload) {
                        Ok(record) => {
                            self.diagnostics.record(DiagnosticEvent::MessageDecoded);
                            self.ingest(&record, received_at);
                            effects.push(SideEffect::Render);
                        }
                        Err(e) => {
                            error!("Error parsing stream data: {}", e);
                            self.diagnostics.record(DiagnosticEvent::DecodeFailed);
                        }
                    }
                }
            }
            Event::StreamLost { subscription, reason } => {
                let actions = self.connection.on_lost(subscription);
                if !actions.is_empty() {
                    warn!("Stream {:?} lost: {}", subscription, reason);
                    self.diagnostics.record(DiagnosticEvent::lost(subscription, time::now()));
                    self.diagnostics.record(DiagnosticEvent::ReconnectScheduled {
                        after: subscription.0,
                        delay_ms: self.connection.reconnect_delay().as_millis() as u64,
                    });
                    effects.extend(actions.into_iter().map(SideEffect::from));
                    self.sync_connection(&mut effects);
                }
            }
            Event::ReconnectDue { subscription } => {
                let actions = self.connection.on_reconnect_due(subscription);
                if !actions.is_empty() {
                    info!("Reconnecting after loss of {:?}", subscription);
                    self.diagnostics.record(DiagnosticEvent::ReconnectFired { after: subscription.0 });
                    effects.extend(actions.into_iter().map(SideEffect::from));
                    self.sync_connection(&mut effects);
                }
            }
            Event::Command { name } => {
                if let CommandOutcome::Dispatched(kind) = self.command(&name) {
                    effects.push(SideEffect::SendCommand(kind));
                }
            }
            Event::CommandFinished { command, result } => {
                let outcome = match result {
                    Ok(body) => {
                        info!("Command '{}' response: {}", command, body);
                        CommandEventKind::Succeeded
                    }
                    Err(e) => {
                        warn!("Error sending command '{}': {}", command, e);
                        CommandEventKind::Failed
                    }
                };
                self.diagnostics.record(DiagnosticEvent::Command { command: Some(command), outcome });
            }
            Event::FirmwareLoaded(info) => {
                info!("Firmware {} ({} {})", info.version, info.compile_date, info.compile_time);
                self.state.reduce(StateDelta::Firmware(Firmware::Known(info)));
                effects.push(SideEffect::Render);
            }
            Event::FirmwareUnavailable(reason) => {
                warn!("Firmware metadata unavailable: {}", reason);
                self.state.reduce(StateDelta::Firmware(Firmware::Unavailable));
                effects.push(SideEffect::Render);
            }
        }

        effects
    }

    /// Validate a command locally. Only a `Dispatched` outcome may reach the
    /// device.
    pub fn command(&mut self, name: &str) -> CommandOutcome {
        let kind = match name.parse::<CommandKind>() {
            Ok(kind) => kind,
            Err(e) => {
                error!("Invalid command: {}", name);
                self.diagnostics.record(DiagnosticEvent::Command {
                    command: None,
                    outcome: CommandEventKind::Rejected,
                });
                return CommandOutcome::Rejected(e);
            }
        };

        if !self.connection.is_connected() {
            error!("Cannot send command '{}': not connected to device", kind);
            self.diagnostics.record(DiagnosticEvent::Command {
                command: Some(kind),
                outcome: CommandEventKind::Rejected,
            });
            return CommandOutcome::Rejected(DashboardError::CommandRejected(
                "not connected to device".into(),
            ));
        }

        self.diagnostics.record(DiagnosticEvent::Command {
            command: Some(kind),
            outcome: CommandEventKind::Sent,
        });
        CommandOutcome::Dispatched(kind)
    }

    /// Apply one decoded record: display fields first, then window and
    /// statistics for tracked channels, then threshold indicators.
    pub fn ingest(&mut self, record: &UpdateRecord, at: Timestamp) -> IngestReport {
        let mut report = IngestReport::default();
        let mut accepted = Vec::new();

        for (channel, value) in record.readings() {
            if !value.is_finite() {
                warn!("Rejecting non-finite {} reading: {}", channel, value);
                self.diagnostics.record(DiagnosticEvent::SampleRejected { channel });
                report.rejected.push(channel);
                continue;
            }
            self.state.reduce(StateDelta::Reading { channel, value });
            accepted.push((channel, value));
        }
        if let Some(on) = record.motor {
            self.state.reduce(StateDelta::Motor(on));
        }
        if let Some(manual) = record.manual_override {
            self.state.reduce(StateDelta::ManualOverride(manual));
        }
        if let Some(version) = &record.firmware_version {
            self.state.reduce(StateDelta::Firmware(Firmware::Reported(version.clone())));
        }

        for (channel, value) in accepted {
            if !self.window.tracks(channel) {
                continue;
            }
            match self.stats.observe(channel, value) {
                Ok(obs) => {
                    if let Err(e) = self.window.push(channel, at, value) {
                        error!("Window push failed: {}", e);
                        continue;
                    }
                    debug!("{} = {} (mean {:.3}, diff {:+.3})", channel, value, obs.mean, obs.difference);
                    report.observations.push((channel, obs));
                }
                Err(e) => {
                    warn!("{}", e);
                    report.rejected.push(channel);
                }
            }
        }

        let indicators = Indicators::derive(&self.state, &self.thresholds);
        if indicators != self.state.indicators {
            self.state.reduce(StateDelta::Indicators(indicators));
        }

        report
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn live_subscription(&self) -> Option<SubscriptionId> {
        self.connection.live_subscription()
    }

    pub fn view(&self) -> DashboardView {
        self.state.view(&self.host)
    }

    pub fn summaries(&self) -> Vec<ChannelSummary> {
        self.window
            .channels()
            .filter_map(|channel| {
                let buffer = self.window.buffer(channel).ok()?;
                let stats = self.stats.stats(channel);
                Some(ChannelSummary {
                    channel,
                    latest: buffer.latest().map(|s| s.value),
                    count: stats.count,
                    all_time_mean: stats.mean(),
                    window_len: buffer.len(),
                    windowed_mean: buffer.windowed_mean(),
                })
            })
            .collect()
    }

    pub fn export(&self, channels: &[Channel], options: &ExportOptions, now: Timestamp) -> Result<ExportArtifact> {
        export::serialize(&self.window, channels, options, now)
    }

    fn sync_connection(&mut self, effects: &mut Vec<SideEffect>) {
        let current = self.connection.state();
        if self.state.connection != current {
            self.state.reduce(StateDelta::Connection(current));
            effects.push(SideEffect::Render);
        }
    }
}
