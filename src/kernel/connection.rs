use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::event::SubscriptionId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Inputs that may move the connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionRequest {
    Connect,
    Opened,
    Lost,
}

pub struct ConnectionGraph;

impl ConnectionGraph {
    /// Pure function: (current, request) -> next. `None` means the request
    /// does not apply in the current state and is ignored.
    pub fn transition(current: ConnectionState, request: ConnectionRequest) -> Option<ConnectionState> {
        use ConnectionRequest::*;
        use ConnectionState::*;

        match (current, request) {
            (_, Connect) => Some(Connecting),
            (Connecting, Opened) => Some(Connected),
            (Connecting, Lost) | (Connected, Lost) => Some(Disconnected),
            _ => None,
        }
    }
}

/// Work the runtime must carry out on behalf of the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    Open(SubscriptionId),
    Close(SubscriptionId),
    /// Single-shot timer; fires `ReconnectDue` for `after` once `delay` elapses.
    ArmReconnect { after: SubscriptionId, delay: Duration },
    DisarmReconnect,
}

/// Owns the one logical subscription to the device's event stream.
///
/// At most one subscription is live at any time. A lost subscription arms
/// exactly one reconnect timer at a flat delay; there is no backoff.
#[derive(Debug)]
pub struct ConnectionManager {
    state: ConnectionState,
    next_id: u64,
    live: Option<SubscriptionId>,
    pending_reconnect: Option<SubscriptionId>,
    reconnect_delay: Duration,
}

impl ConnectionManager {
    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            next_id: 0,
            live: None,
            pending_reconnect: None,
            reconnect_delay,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn live_subscription(&self) -> Option<SubscriptionId> {
        self.live
    }

    pub fn pending_reconnect(&self) -> Option<SubscriptionId> {
        self.pending_reconnect
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    fn apply(&mut self, request: ConnectionRequest) -> bool {
        match ConnectionGraph::transition(self.state, request) {
            Some(next) => {
                if next != self.state {
                    info!("Connection {:?} -> {:?}", self.state, next);
                }
                self.state = next;
                true
            }
            None => false,
        }
    }

    /// Tear down whatever exists and open a fresh subscription.
    pub fn connect(&mut self) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();

        if self.pending_reconnect.take().is_some() {
            actions.push(ConnectionAction::DisarmReconnect);
        }
        if let Some(old) = self.live.take() {
            actions.push(ConnectionAction::Close(old));
        }

        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.live = Some(id);
        self.apply(ConnectionRequest::Connect);
        actions.push(ConnectionAction::Open(id));
        actions
    }

    /// Returns false for a stale subscription or an open in the wrong state.
    pub fn on_open(&mut self, id: SubscriptionId) -> bool {
        if self.live != Some(id) {
            debug!("Ignoring open for stale subscription {:?}", id);
            return false;
        }
        self.apply(ConnectionRequest::Opened)
    }

    pub fn on_lost(&mut self, id: SubscriptionId) -> Vec<ConnectionAction> {
        if self.live != Some(id) {
            debug!("Ignoring loss of stale subscription {:?}", id);
            return Vec::new();
        }
        if !self.apply(ConnectionRequest::Lost) {
            return Vec::new();
        }

        self.live = None;
        self.pending_reconnect = Some(id);
        vec![
            ConnectionAction::Close(id),
            ConnectionAction::ArmReconnect { after: id, delay: self.reconnect_delay },
        ]
    }

    /// Acts only if this timer is still the pending one and nothing has
    /// reconnected in the meantime.
    pub fn on_reconnect_due(&mut self, after: SubscriptionId) -> Vec<ConnectionAction> {
        if self.pending_reconnect != Some(after) || self.state != ConnectionState::Disconnected {
            debug!("Reconnect timer for {:?} superseded", after);
            return Vec::new();
        }
        self.pending_reconnect = None;
        self.connect()
    }

    /// Accepts stream payloads only from the live subscription.
    pub fn accepts(&self, id: SubscriptionId) -> bool {
        self.live == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionRequest::*;
    use ConnectionState::*;

    #[test]
    fn graph_matches_stream_lifecycle() {
        assert_eq!(ConnectionGraph::transition(Disconnected, Connect), Some(Connecting));
        assert_eq!(ConnectionGraph::transition(Connected, Connect), Some(Connecting));
        assert_eq!(ConnectionGraph::transition(Connecting, Opened), Some(Connected));
        assert_eq!(ConnectionGraph::transition(Connected, Lost), Some(Disconnected));
        assert_eq!(ConnectionGraph::transition(Disconnected, Opened), None);
        assert_eq!(ConnectionGraph::transition(Disconnected, Lost), None);
    }
}
