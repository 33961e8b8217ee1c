use std::time::Duration;

use reqwest::Client;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::Result;
use crate::export::{ExportArtifact, ExportOptions};
use crate::kernel::effect::SideEffect;
use crate::kernel::event::{Channel, Event, SubscriptionId};
use crate::kernel::reactor::{ChannelSummary, Reactor};
use crate::kernel::state::DashboardView;
use crate::kernel::telemetry::metrics::DiagnosticSnapshot;
use crate::kernel::time;
use crate::services::device::DeviceClient;
use crate::services::sse;

const EVENT_QUEUE: usize = 256;

/// Read-side requests answered from the reactor's current state.
pub enum Query {
    Export {
        channels: Vec<Channel>,
        options: ExportOptions,
        reply: oneshot::Sender<Result<ExportArtifact>>,
    },
    Summaries {
        reply: oneshot::Sender<Vec<ChannelSummary>>,
    },
    Diagnostics {
        reply: oneshot::Sender<DiagnosticSnapshot>,
    },
}

/// Single-shot reconnect timer. Arming replaces any previous timer.
#[derive(Debug, Default)]
pub struct ReconnectTimer {
    pending: Option<JoinHandle<()>>,
}

impl ReconnectTimer {
    pub fn arm(&mut self, after: SubscriptionId, delay: Duration, tx: mpsc::Sender<Event>) {
        self.disarm();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Event::ReconnectDue { subscription: after }).await;
        }));
    }

    pub fn disarm(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

struct LiveStream {
    id: SubscriptionId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl LiveStream {
    fn close(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Cloneable entry point for front-ends.
#[derive(Clone)]
pub struct RuntimeHandle {
    events: mpsc::Sender<Event>,
    queries: mpsc::Sender<Query>,
    view: watch::Receiver<DashboardView>,
    shutdown: CancellationToken,
}

impl RuntimeHandle {
    pub async fn send(&self, event: Event) -> bool {
        self.events.send(event).await.is_ok()
    }

    pub async fn export(&self, channels: Vec<Channel>, options: ExportOptions) -> Option<Result<ExportArtifact>> {
        let (reply, rx) = oneshot::channel();
        self.queries.send(Query::Export { channels, options, reply }).await.ok()?;
        rx.await.ok()
    }

    pub async fn summaries(&self) -> Option<Vec<ChannelSummary>> {
        let (reply, rx) = oneshot::channel();
        self.queries.send(Query::Summaries { reply }).await.ok()?;
        rx.await.ok()
    }

    pub async fn diagnostics(&self) -> Option<DiagnosticSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.queries.send(Query::Diagnostics { reply }).await.ok()?;
        rx.await.ok()
    }

    pub fn view(&self) -> watch::Receiver<DashboardView> {
        self.view.clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Async driver around the reactor. Every event, whether from the stream,
/// a timer or the user, funnels through one queue and is applied in order.
pub struct Runtime {
    reactor: Reactor,
    events_tx: mpsc::Sender<Event>,
    events_rx: mpsc::Receiver<Event>,
    queries_rx: mpsc::Receiver<Query>,
    view_tx: watch::Sender<DashboardView>,
    device: DeviceClient,
    stream_client: Client,
    events_url: String,
    stream: Option<LiveStream>,
    reconnect: ReconnectTimer,
    shutdown: CancellationToken,
}

impl Runtime {
    pub fn new(config: &DashboardConfig) -> Result<(Self, RuntimeHandle)> {
        let reactor = Reactor::new(config)?;
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        let (queries_tx, queries_rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(reactor.view());
        let shutdown = CancellationToken::new();

        let handle = RuntimeHandle {
            events: events_tx.clone(),
            queries: queries_tx,
            view: view_rx,
            shutdown: shutdown.clone(),
        };

        let runtime = Self {
            reactor,
            events_tx,
            events_rx,
            queries_rx,
            view_tx,
            device: DeviceClient::new(&config.device),
            stream_client: DeviceClient::stream_client(&config.device),
            events_url: config.device.url(&config.device.events_path),
            stream: None,
            reconnect: ReconnectTimer::default(),
            shutdown,
        };
        Ok((runtime, handle))
    }

    /// Fetch firmware metadata once, connect, then process events until
    /// shutdown.
    pub async fn run(mut self) {
        info!("Dashboard runtime started against {}", self.events_url);

        let device = self.device.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match device.fetch_firmware().await {
                Ok(info) => Event::FirmwareLoaded(info),
                Err(e) => Event::FirmwareUnavailable(e.to_string()),
            };
            let _ = tx.send(event).await;
        });

        self.dispatch(Event::Connect);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                Some(event) = self.events_rx.recv() => self.dispatch(event),
                Some(query) = self.queries_rx.recv() => self.answer(query),
            }
        }

        self.reconnect.disarm();
        if let Some(stream) = self.stream.take() {
            stream.close();
        }
        info!("Dashboard runtime stopped");
    }

    fn dispatch(&mut self, event: Event) {
        let effects = self.reactor.step(event);
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: SideEffect) {
        match effect {
            SideEffect::OpenStream(id) => {
                if let Some(previous) = self.stream.take() {
                    debug!("Closing stream {:?} before opening {:?}", previous.id, id);
                    previous.close();
                }
                let cancel = self.shutdown.child_token();
                let task = tokio::spawn(sse::subscribe(
                    self.stream_client.clone(),
                    self.events_url.clone(),
                    id,
                    self.events_tx.clone(),
                    cancel.clone(),
                ));
                self.stream = Some(LiveStream { id, cancel, task });
            }
            SideEffect::CloseStream(id) => {
                if self.stream.as_ref().is_some_and(|s| s.id == id) {
                    if let Some(stream) = self.stream.take() {
                        stream.close();
                    }
                }
            }
            SideEffect::ArmReconnect { after, delay } => {
                info!("Reconnecting in {} ms", delay.as_millis());
                self.reconnect.arm(after, delay, self.events_tx.clone());
            }
            SideEffect::DisarmReconnect => self.reconnect.disarm(),
            SideEffect::SendCommand(command) => {
                let device = self.device.clone();
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = device.send_command(command).await.map_err(|e| e.to_string());
                    let _ = tx.send(Event::CommandFinished { command, result }).await;
                });
            }
            SideEffect::Render => {
                self.view_tx.send_replace(self.reactor.view());
            }
        }
    }

    fn answer(&mut self, query: Query) {
        match query {
            Query::Export { channels, options, reply } => {
                let result = self.reactor.export(&channels, &options, time::now());
                if let Err(e) = &result {
                    warn!("Export failed: {}", e);
                }
                let _ = reply.send(result);
            }
            Query::Summaries { reply } => {
                let _ = reply.send(self.reactor.summaries());
            }
            Query::Diagnostics { reply } => {
                let _ = reply.send(self.reactor.diagnostics.snapshot());
            }
        }
    }
}
