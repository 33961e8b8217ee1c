use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use super::event::{CommandEventKind, DiagnosticEvent};

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticSnapshot {
    pub stream: StreamStats,
    pub ingest: IngestStats,
    pub commands: CommandStats,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamStats {
    pub opened: u64,
    pub lost: u64,
    pub reconnects_scheduled: u64,
    pub reconnects_fired: u64,
    /// Mean lifetime of subscriptions that opened and were later lost.
    pub avg_session_ms: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub decoded: u64,
    pub decode_failures: u64,
    pub rejected_samples: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandStats {
    pub sent: u64,
    pub rejected: u64,
    pub succeeded: u64,
    pub failed: u64,
}

pub fn compute_snapshot(events: &VecDeque<DiagnosticEvent>) -> DiagnosticSnapshot {
    let mut snap = DiagnosticSnapshot::default();

    let mut open_at = HashMap::new();
    let mut session_total_ms: i64 = 0;
    let mut sessions = 0u64;

    for event in events {
        match event {
            DiagnosticEvent::StreamOpened { subscription, at } => {
                snap.stream.opened += 1;
                open_at.insert(*subscription, *at);
            }
            DiagnosticEvent::StreamLost { subscription, at } => {
                snap.stream.lost += 1;
                if let Some(start) = open_at.remove(subscription) {
                    session_total_ms += (*at - start).num_milliseconds().max(0);
                    sessions += 1;
                }
            }
            DiagnosticEvent::ReconnectScheduled { .. } => snap.stream.reconnects_scheduled += 1,
            DiagnosticEvent::ReconnectFired { .. } => snap.stream.reconnects_fired += 1,
            DiagnosticEvent::MessageDecoded => snap.ingest.decoded += 1,
            DiagnosticEvent::DecodeFailed => snap.ingest.decode_failures += 1,
            DiagnosticEvent::SampleRejected { .. } => snap.ingest.rejected_samples += 1,
            DiagnosticEvent::Command { outcome, .. } => match outcome {
                CommandEventKind::Sent => snap.commands.sent += 1,
                CommandEventKind::Rejected => snap.commands.rejected += 1,
                CommandEventKind::Succeeded => snap.commands.succeeded += 1,
                CommandEventKind::Failed => snap.commands.failed += 1,
            },
        }
    }

    if sessions > 0 {
        snap.stream.avg_session_ms = session_total_ms as f64 / sessions as f64;
    }

    snap
}
