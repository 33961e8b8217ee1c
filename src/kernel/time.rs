use chrono::{DateTime, Utc};

/// Capture instant of an inbound record. One per update, shared by every
/// channel the record carries.
pub type Timestamp = DateTime<Utc>;

pub fn now() -> Timestamp {
    Utc::now()
}

/// Axis label used by the chart front-end.
pub fn clock_label(ts: &Timestamp) -> String {
    ts.format("%H:%M:%S").to_string()
}

/// Date stamp used in export file names.
pub fn date_stamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Row key written to the export time column.
pub fn export_stamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
