use serde::{Deserialize, Serialize};

use crate::kernel::event::{Channel, CommandKind, SubscriptionId};
use crate::kernel::time::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DiagnosticEvent {
    StreamOpened {
        subscription: u64,
        at: Timestamp,
    },
    StreamLost {
        subscription: u64,
        at: Timestamp,
    },
    ReconnectScheduled {
        after: u64,
        delay_ms: u64,
    },
    ReconnectFired {
        after: u64,
    },
    MessageDecoded,
    DecodeFailed,
    SampleRejected {
        channel: Channel,
    },
    Command {
        command: Option<CommandKind>,
        outcome: CommandEventKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandEventKind {
    Sent,
    Rejected,
    Succeeded,
    Failed,
}

impl DiagnosticEvent {
    pub fn opened(id: SubscriptionId, at: Timestamp) -> Self {
        DiagnosticEvent::StreamOpened { subscription: id.0, at }
    }

    pub fn lost(id: SubscriptionId, at: Timestamp) -> Self {
        DiagnosticEvent::StreamLost { subscription: id.0, at }
    }
}
