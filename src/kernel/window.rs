use std::collections::{vec_deque, BTreeMap, VecDeque};

use serde::Serialize;

use super::event::Channel;
use super::time::Timestamp;
use crate::error::{DashboardError, Result};

/// One channel reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub value: f64,
}

/// Fixed-capacity FIFO of samples for a single channel, oldest first.
#[derive(Debug, Clone)]
pub struct ChannelBuffer {
    entries: VecDeque<Sample>,
    capacity: usize,
}

impl ChannelBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, evicting exactly one oldest entry when full.
    pub fn push(&mut self, sample: Sample) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, Sample> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.entries.back()
    }

    /// Mean over what the window currently holds. Differs from the all-time
    /// mean kept by the stats tracker once anything has been evicted.
    pub fn windowed_mean(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|s| s.value).sum();
        Some(sum / self.entries.len() as f64)
    }

    pub fn snapshot(&self) -> Vec<Sample> {
        self.entries.iter().copied().collect()
    }
}

/// Per-channel rolling history. The channel set is fixed at construction.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    buffers: BTreeMap<Channel, ChannelBuffer>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(channels: &[Channel], capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DashboardError::Config("window capacity must be positive".into()));
        }
        if channels.is_empty() {
            return Err(DashboardError::Config("window needs at least one channel".into()));
        }
        let buffers = channels
            .iter()
            .map(|&c| (c, ChannelBuffer::new(capacity)))
            .collect();
        Ok(Self { buffers, capacity })
    }

    pub fn push(&mut self, channel: Channel, timestamp: Timestamp, value: f64) -> Result<()> {
        let buffer = self
            .buffers
            .get_mut(&channel)
            .ok_or(DashboardError::UnknownChannel(channel))?;
        buffer.push(Sample { timestamp, value });
        Ok(())
    }

    pub fn tracks(&self, channel: Channel) -> bool {
        self.buffers.contains_key(&channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.buffers.keys().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn buffer(&self, channel: Channel) -> Result<&ChannelBuffer> {
        self.buffers
            .get(&channel)
            .ok_or(DashboardError::UnknownChannel(channel))
    }

    /// Owned copy of a channel's history; later pushes are not observed.
    pub fn snapshot(&self, channel: Channel) -> Result<Vec<Sample>> {
        self.buffer(channel).map(ChannelBuffer::snapshot)
    }

    pub fn windowed_mean(&self, channel: Channel) -> Result<Option<f64>> {
        self.buffer(channel).map(ChannelBuffer::windowed_mean)
    }
}
