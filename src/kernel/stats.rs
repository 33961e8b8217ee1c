use std::collections::BTreeMap;

use serde::Serialize;

use super::event::Channel;
use crate::error::{DashboardError, Result};

/// All-time aggregate for one channel. Never windowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunningStats {
    pub count: u64,
    pub sum: f64,
}

impl RunningStats {
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }

    fn add(&mut self, value: f64) -> f64 {
        self.count += 1;
        self.sum += value;
        self.sum / self.count as f64
    }
}

/// Result of observing one value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub value: f64,
    pub mean: f64,
    pub difference: f64,
}

#[derive(Debug, Default)]
pub struct StatsTracker {
    channels: BTreeMap<Channel, RunningStats>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) update. Non-finite values are refused so one bad reading cannot
    /// poison the sum for the rest of the session.
    pub fn observe(&mut self, channel: Channel, value: f64) -> Result<Observation> {
        if !value.is_finite() {
            return Err(DashboardError::NonFiniteSample { channel, value });
        }
        let mean = self.channels.entry(channel).or_default().add(value);
        Ok(Observation {
            value,
            mean,
            difference: value - mean,
        })
    }

    pub fn stats(&self, channel: Channel) -> RunningStats {
        self.channels.get(&channel).copied().unwrap_or_default()
    }

    pub fn mean(&self, channel: Channel) -> Option<f64> {
        self.stats(channel).mean()
    }
}

/// Running prefix means over `values`, in order: element `i` is the mean of
/// `values[..=i]`.
pub fn prefix_means(values: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            sum += v;
            sum / (i + 1) as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_means_track_running_average() {
        assert_eq!(prefix_means(&[20.0, 22.0, 24.0]), vec![20.0, 21.0, 22.0]);
        assert!(prefix_means(&[]).is_empty());
    }

    #[test]
    fn empty_stats_have_no_mean() {
        assert_eq!(RunningStats::default().mean(), None);
    }
}
