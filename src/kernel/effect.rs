use std::time::Duration;

use super::connection::ConnectionAction;
use super::event::{CommandKind, SubscriptionId};

/// Work requested by the reactor. Executed by the runtime, never by the
/// reactor itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    OpenStream(SubscriptionId),
    CloseStream(SubscriptionId),
    ArmReconnect { after: SubscriptionId, delay: Duration },
    DisarmReconnect,
    SendCommand(CommandKind),
    /// Display state changed; the front-end should redraw.
    Render,
}

impl From<ConnectionAction> for SideEffect {
    fn from(action: ConnectionAction) -> Self {
        match action {
            ConnectionAction::Open(id) => SideEffect::OpenStream(id),
            ConnectionAction::Close(id) => SideEffect::CloseStream(id),
            ConnectionAction::ArmReconnect { after, delay } => SideEffect::ArmReconnect { after, delay },
            ConnectionAction::DisarmReconnect => SideEffect::DisarmReconnect,
        }
    }
}
