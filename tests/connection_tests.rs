use std::collections::HashSet;
use std::time::Duration;

use sv7200_dashboard::config::DashboardConfig;
use sv7200_dashboard::kernel::connection::ConnectionState;
use sv7200_dashboard::kernel::effect::SideEffect;
use sv7200_dashboard::kernel::event::{Event, SubscriptionId};
use sv7200_dashboard::Reactor;

/// Mirrors what the runtime does with stream effects.
#[derive(Default)]
struct Subscriptions {
    live: HashSet<SubscriptionId>,
}

impl Subscriptions {
    fn apply(&mut self, effects: &[SideEffect]) {
        for effect in effects {
            match effect {
                SideEffect::OpenStream(id) => {
                    self.live.insert(*id);
                }
                SideEffect::CloseStream(id) => {
                    self.live.remove(id);
                }
                _ => {}
            }
        }
    }
}

fn reactor() -> Reactor {
    Reactor::new(&DashboardConfig::default()).unwrap()
}

fn connected(reactor: &mut Reactor, subs: &mut Subscriptions) -> SubscriptionId {
    subs.apply(&reactor.step(Event::Connect));
    let id = reactor.live_subscription().unwrap();
    subs.apply(&reactor.step(Event::StreamOpened { subscription: id }));
    assert_eq!(reactor.connection_state(), ConnectionState::Connected);
    id
}

fn arms(effects: &[SideEffect]) -> Vec<(SubscriptionId, Duration)> {
    effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::ArmReconnect { after, delay } => Some((*after, *delay)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_connect_transitions_to_connecting_then_connected() {
    let mut reactor = reactor();
    assert_eq!(reactor.connection_state(), ConnectionState::Disconnected);

    reactor.step(Event::Connect);
    assert_eq!(reactor.connection_state(), ConnectionState::Connecting);

    let id = reactor.live_subscription().unwrap();
    reactor.step(Event::StreamOpened { subscription: id });
    assert_eq!(reactor.connection_state(), ConnectionState::Connected);
    assert!(reactor.view().controls_enabled, "Controls enabled once connected");
}

#[test]
fn test_repeated_connect_keeps_one_subscription() {
    let mut reactor = reactor();
    let mut subs = Subscriptions::default();
    connected(&mut reactor, &mut subs);

    for _ in 0..5 {
        subs.apply(&reactor.step(Event::Connect));
        assert!(subs.live.len() <= 1, "At most one live subscription");
    }

    assert_eq!(subs.live.len(), 1);
    assert_eq!(subs.live.iter().next().copied(), reactor.live_subscription());
    assert_eq!(reactor.connection_state(), ConnectionState::Connecting);
}

#[test]
fn test_error_while_connected_schedules_exactly_one_reconnect() {
    let mut reactor = reactor();
    let mut subs = Subscriptions::default();
    let id = connected(&mut reactor, &mut subs);

    let effects = reactor.step(Event::StreamLost { subscription: id, reason: "reset".into() });
    subs.apply(&effects);

    assert_eq!(reactor.connection_state(), ConnectionState::Disconnected, "Disconnected immediately");
    assert_eq!(arms(&effects), vec![(id, Duration::from_millis(3000))]);
    assert!(subs.live.is_empty(), "Lost subscription is torn down");
    assert!(!reactor.view().controls_enabled);
    assert_eq!(reactor.connection.pending_reconnect(), Some(id));

    // Timer fires: one reconnect attempt.
    let effects = reactor.step(Event::ReconnectDue { subscription: id });
    subs.apply(&effects);
    assert_eq!(reactor.connection_state(), ConnectionState::Connecting);
    assert_eq!(subs.live.len(), 1);

    // A duplicate fire of the same timer does nothing.
    let effects = reactor.step(Event::ReconnectDue { subscription: id });
    assert!(effects.is_empty(), "Stale timer must be a no-op");
}

#[test]
fn test_manual_connect_supersedes_pending_reconnect() {
    let mut reactor = reactor();
    let mut subs = Subscriptions::default();
    let id = connected(&mut reactor, &mut subs);

    reactor.step(Event::StreamLost { subscription: id, reason: "reset".into() });
    let effects = reactor.step(Event::Connect);
    assert!(effects.contains(&SideEffect::DisarmReconnect), "Manual connect cancels the timer");
    assert_eq!(reactor.connection.pending_reconnect(), None);

    let next = reactor.live_subscription().unwrap();
    reactor.step(Event::StreamOpened { subscription: next });

    let effects = reactor.step(Event::ReconnectDue { subscription: id });
    assert!(effects.is_empty());
    assert_eq!(reactor.connection_state(), ConnectionState::Connected);
}

#[test]
fn test_repeated_errors_use_flat_interval() {
    let mut reactor = reactor();
    let mut delays = Vec::new();

    reactor.step(Event::Connect);
    for _ in 0..4 {
        let id = reactor.live_subscription().unwrap();
        let effects = reactor.step(Event::StreamLost { subscription: id, reason: "refused".into() });
        delays.extend(arms(&effects).into_iter().map(|(_, d)| d));
        reactor.step(Event::ReconnectDue { subscription: id });
    }

    assert_eq!(delays, vec![Duration::from_millis(3000); 4], "No backoff between attempts");
}

#[test]
fn test_stale_stream_events_are_ignored() {
    let mut reactor = reactor();
    let mut subs = Subscriptions::default();
    let old = connected(&mut reactor, &mut subs);

    reactor.step(Event::Connect);
    let effects = reactor.step(Event::StreamLost { subscription: old, reason: "late".into() });
    assert!(effects.is_empty(), "Loss of a replaced subscription changes nothing");
    assert_eq!(reactor.connection_state(), ConnectionState::Connecting);

    reactor.step(Event::StreamOpened { subscription: old });
    assert_eq!(reactor.connection_state(), ConnectionState::Connecting);
}
