use std::collections::VecDeque;

use super::event::DiagnosticEvent;
use super::metrics::{compute_snapshot, DiagnosticSnapshot};

const MAX_EVENTS: usize = 10_000;

#[derive(Debug)]
pub struct DiagnosticRecorder {
    buffer: VecDeque<DiagnosticEvent>,
}

impl Default for DiagnosticRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(1024),
        }
    }

    pub fn record(&mut self, event: DiagnosticEvent) {
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn snapshot(&self) -> DiagnosticSnapshot {
        compute_snapshot(&self.buffer)
    }
}
