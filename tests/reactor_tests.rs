use chrono::{TimeZone, Utc};
use sv7200_dashboard::config::DashboardConfig;
use sv7200_dashboard::kernel::effect::SideEffect;
use sv7200_dashboard::kernel::event::{Channel, Event, FirmwareInfo, SubscriptionId, UpdateRecord};
use sv7200_dashboard::kernel::state::{Level, FIRMWARE_PLACEHOLDER};
use sv7200_dashboard::kernel::time::Timestamp;
use sv7200_dashboard::Reactor;

fn at(secs: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, secs).unwrap()
}

fn connected_reactor(config: &DashboardConfig) -> (Reactor, SubscriptionId) {
    let mut reactor = Reactor::new(config).unwrap();
    reactor.step(Event::Connect);
    let id = reactor.live_subscription().unwrap();
    reactor.step(Event::StreamOpened { subscription: id });
    (reactor, id)
}

fn message(id: SubscriptionId, payload: &str, secs: u32) -> Event {
    Event::StreamMessage { subscription: id, payload: payload.to_string(), received_at: at(secs) }
}

#[test]
fn test_partial_update_leaves_other_fields() {
    let (mut reactor, id) = connected_reactor(&DashboardConfig::default());

    reactor.step(message(id, r#"{"pressure": 3.1, "temperature": 21.5, "flow": 4.0, "motor": true}"#, 0));
    let before = reactor.view();

    let effects = reactor.step(message(id, r#"{"flow": 12.5}"#, 1));
    let after = reactor.view();

    assert!(effects.contains(&SideEffect::Render));
    assert_eq!(after.flow, "12.50");
    assert_eq!(after.temperature, before.temperature, "Temperature untouched by flow-only record");
    assert_eq!(after.pressure, before.pressure, "Pressure untouched by flow-only record");
    assert_eq!(after.motor, "ON");

    let temps = reactor.window.snapshot(Channel::Temperature).unwrap();
    assert_eq!(temps.len(), 1, "Only present channels are pushed");
    assert_eq!(reactor.window.snapshot(Channel::Flow).unwrap().len(), 2);
}

#[test]
fn test_status_fields_render_labels() {
    let (mut reactor, id) = connected_reactor(&DashboardConfig::default());

    reactor.step(message(id, r#"{"motor": false, "manualOverride": true, "firmware_version": "2.0.1"}"#, 0));
    let view = reactor.view();

    assert_eq!(view.motor, "OFF");
    assert_eq!(view.mode, "MANUAL");
    assert_eq!(view.firmware, "2.0.1");
    assert_eq!(view.connection, "192.168.4.1");
}

#[test]
fn test_untracked_channel_is_displayed_but_not_buffered() {
    // Default chart set is temperature + flow.
    let (mut reactor, id) = connected_reactor(&DashboardConfig::default());

    reactor.step(message(id, r#"{"pressure": 3.7}"#, 0));

    assert_eq!(reactor.view().pressure, "3.70");
    assert!(!reactor.window.tracks(Channel::Pressure));
    assert_eq!(reactor.stats.stats(Channel::Pressure).count, 0);
    assert_eq!(reactor.view().indicators.pressure_level, Level::Warning);
}

#[test]
fn test_three_channel_configuration_buffers_pressure() {
    let mut config = DashboardConfig::default();
    config.stream.channels = vec![Channel::Pressure, Channel::Temperature, Channel::Flow];
    config.stream.window_capacity = 3600;
    let (mut reactor, id) = connected_reactor(&config);

    reactor.step(message(id, r#"{"pressure": 2.5}"#, 0));

    assert_eq!(reactor.window.capacity(), 3600);
    assert_eq!(reactor.window.snapshot(Channel::Pressure).unwrap().len(), 1);
}

#[test]
fn test_malformed_payload_is_discarded() {
    let (mut reactor, id) = connected_reactor(&DashboardConfig::default());
    reactor.step(message(id, r#"{"temperature": 30}"#, 0));
    let version = reactor.state.version;
    let state = reactor.connection_state();

    let effects = reactor.step(message(id, "{not json", 1));
    reactor.step(message(id, r#"{"temperature": "hot"}"#, 2));

    assert!(effects.is_empty());
    assert_eq!(reactor.state.version, version, "Decode failure must not touch state");
    assert_eq!(reactor.connection_state(), state, "Decode failure is not a connection failure");
    assert_eq!(reactor.diagnostics.snapshot().ingest.decode_failures, 2);
}

#[test]
fn test_messages_from_stale_subscription_are_dropped() {
    let (mut reactor, old) = connected_reactor(&DashboardConfig::default());
    reactor.step(Event::Connect);

    reactor.step(message(old, r#"{"flow": 99.0}"#, 0));

    assert_eq!(reactor.view().flow, "--");
    assert!(reactor.window.snapshot(Channel::Flow).unwrap().is_empty());
}

#[test]
fn test_non_finite_sample_is_rejected_rest_applied() {
    let (mut reactor, _) = connected_reactor(&DashboardConfig::default());
    let record = UpdateRecord {
        temperature: Some(f64::NAN),
        flow: Some(5.0),
        motor: Some(true),
        ..Default::default()
    };

    let report = reactor.ingest(&record, at(0));

    assert_eq!(report.rejected, vec![Channel::Temperature]);
    assert_eq!(report.observations.len(), 1);
    assert_eq!(reactor.view().temperature, "--");
    assert_eq!(reactor.view().flow, "5.00");
    assert_eq!(reactor.view().motor, "ON");
    assert_eq!(reactor.stats.stats(Channel::Temperature).count, 0);
    assert_eq!(reactor.diagnostics.snapshot().ingest.rejected_samples, 1);
}

#[test]
fn test_ingest_reports_running_statistics() {
    let (mut reactor, _) = connected_reactor(&DashboardConfig::default());

    let mut last = None;
    for (i, t) in [20.0, 22.0, 24.0].into_iter().enumerate() {
        let record = UpdateRecord { temperature: Some(t), ..Default::default() };
        last = reactor.ingest(&record, at(i as u32)).observations.pop();
    }

    let (channel, obs) = last.unwrap();
    assert_eq!(channel, Channel::Temperature);
    assert_eq!(obs.mean, 22.0);
    assert_eq!(obs.difference, 2.0);
}

#[test]
fn test_summaries_expose_both_means() {
    let mut config = DashboardConfig::default();
    config.stream.window_capacity = 2;
    let (mut reactor, _) = connected_reactor(&config);

    for (i, t) in [10.0, 20.0, 30.0].into_iter().enumerate() {
        reactor.ingest(&UpdateRecord { temperature: Some(t), ..Default::default() }, at(i as u32));
    }

    let temp = reactor
        .summaries()
        .into_iter()
        .find(|s| s.channel == Channel::Temperature)
        .unwrap();
    assert_eq!(temp.count, 3);
    assert_eq!(temp.all_time_mean, Some(20.0));
    assert_eq!(temp.window_len, 2);
    assert_eq!(temp.windowed_mean, Some(25.0));
    assert_eq!(temp.latest, Some(30.0));
}

#[test]
fn test_temperature_levels_follow_thresholds() {
    let (mut reactor, id) = connected_reactor(&DashboardConfig::default());

    reactor.step(message(id, r#"{"temperature": 86.0}"#, 0));
    assert_eq!(reactor.view().indicators.temperature_level, Level::Warning);

    reactor.step(message(id, r#"{"temperature": 91.0}"#, 1));
    assert_eq!(reactor.view().indicators.temperature_level, Level::Danger);

    reactor.step(message(id, r#"{"flow": 1.0}"#, 2));
    assert_eq!(
        reactor.view().indicators.temperature_level,
        Level::Danger,
        "Level persists until a new temperature arrives"
    );
}

#[test]
fn test_firmware_metadata_and_fallback() {
    let mut reactor = Reactor::new(&DashboardConfig::default()).unwrap();
    reactor.step(Event::FirmwareUnavailable("timeout".into()));
    assert_eq!(reactor.view().firmware, FIRMWARE_PLACEHOLDER);

    reactor.step(Event::FirmwareLoaded(FirmwareInfo {
        version: "1.2.3".into(),
        compile_date: "Mar  3 2025".into(),
        compile_time: "10:11:12".into(),
    }));
    assert_eq!(reactor.view().firmware, "1.2.3 (Mar  3 2025 10:11:12)");
}
