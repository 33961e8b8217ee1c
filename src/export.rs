//! CSV snapshot of the rolling window.
//!
//! Statistics columns are prefix means over exactly the exported samples, so
//! they describe the window and not the all-time history kept by
//! [`StatsTracker`](crate::kernel::stats::StatsTracker).

use std::collections::vec_deque::Iter;
use std::iter::Peekable;

use crate::error::{DashboardError, Result};
use crate::kernel::event::Channel;
use crate::kernel::time::{self, Timestamp};
use crate::kernel::window::{RollingWindow, Sample};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_statistics: bool,
    pub prefix: Option<String>,
}

/// Generated file content plus a suggested name. Writing it anywhere is
/// the front-end's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content: String,
}

pub fn suggested_filename(channels: &[Channel], prefix: Option<&str>, now: &Timestamp) -> String {
    let prefix = match prefix {
        Some(p) => p.to_string(),
        None => {
            let names: Vec<&str> = channels.iter().map(Channel::as_str).collect();
            format!("{}_data", names.join("_"))
        }
    };
    format!("{}_{}.csv", prefix, time::date_stamp(now))
}

struct Column<'a> {
    channel: Channel,
    samples: Peekable<Iter<'a, Sample>>,
    sum: f64,
    count: u64,
}

impl Column<'_> {
    fn head(&mut self) -> Option<Timestamp> {
        self.samples.peek().map(|s| s.timestamp)
    }
}

/// Rows merge the requested buffers oldest first. Each row takes the
/// earliest pending timestamp and one sample from every channel whose next
/// sample carries it; the other cells stay blank. Every buffered sample is
/// written exactly once.
pub fn serialize(
    window: &RollingWindow,
    channels: &[Channel],
    options: &ExportOptions,
    now: Timestamp,
) -> Result<ExportArtifact> {
    let mut requested: Vec<Channel> = Vec::with_capacity(channels.len());
    for &c in channels {
        if !requested.contains(&c) {
            requested.push(c);
        }
    }
    if requested.is_empty() {
        return Err(DashboardError::Export("no channels requested".into()));
    }

    let mut columns: Vec<Column> = requested
        .iter()
        .map(|&channel| {
            window.buffer(channel).map(|buffer| Column {
                channel,
                samples: buffer.iter().peekable(),
                sum: 0.0,
                count: 0,
            })
        })
        .collect::<Result<_>>()?;

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["time".to_string()];
    for col in &columns {
        header.push(col.channel.to_string());
        if options.include_statistics {
            header.push(format!("{}_mean", col.channel));
            header.push(format!("{}_difference", col.channel));
        }
    }
    writer.write_record(&header)?;

    while let Some(ts) = columns.iter_mut().filter_map(Column::head).min() {
        let mut row = vec![time::export_stamp(&ts)];
        for col in columns.iter_mut() {
            let sample = match col.head() {
                Some(head) if head == ts => col.samples.next(),
                _ => None,
            };
            match sample {
                Some(sample) => {
                    row.push(sample.value.to_string());
                    if options.include_statistics {
                        col.sum += sample.value;
                        col.count += 1;
                        let mean = col.sum / col.count as f64;
                        row.push(mean.to_string());
                        row.push((sample.value - mean).to_string());
                    }
                }
                None => {
                    row.push(String::new());
                    if options.include_statistics {
                        row.push(String::new());
                        row.push(String::new());
                    }
                }
            }
        }
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DashboardError::Export(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|e| DashboardError::Export(e.to_string()))?;

    Ok(ExportArtifact {
        filename: suggested_filename(&requested, options.prefix.as_deref(), &now),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn filename_defaults_to_channel_names() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(
            suggested_filename(&[Channel::Temperature], None, &now),
            "temperature_data_2025-06-01.csv"
        );
        assert_eq!(
            suggested_filename(&[Channel::Temperature, Channel::Flow], Some("sv7200"), &now),
            "sv7200_2025-06-01.csv"
        );
    }
}
