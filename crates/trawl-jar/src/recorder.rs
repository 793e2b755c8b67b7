//! Request recording

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use trawl_net::Request;

/// One request captured while recording was on.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Position in the recording, starting at 0 and never reused
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub request: Request,
}

/// Captures completed requests so they can be replayed later.
pub trait Recorder: Send + Sync {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_recording(&self) -> bool;

    /// Append a request. Ignored while stopped.
    fn record(&mut self, request: &Request);

    /// The log in recorded order.
    fn entries(&self) -> Vec<RecordedRequest>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);
}

#[derive(Debug, Default)]
pub struct MemoryRecorder {
    entries: VecDeque<RecordedRequest>,
    recording: bool,
    next_sequence: u64,
    capacity: Option<usize>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` entries, evicting the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::default()
        }
    }
}

impl Recorder for MemoryRecorder {
    fn start(&mut self) {
        self.recording = true;
    }

    fn stop(&mut self) {
        self.recording = false;
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn record(&mut self, request: &Request) {
        if !self.recording {
            return;
        }

        self.entries.push_back(RecordedRequest {
            sequence: self.next_sequence,
            recorded_at: Utc::now(),
            request: request.clone(),
        });
        self.next_sequence += 1;

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
            }
        }
    }

    fn entries(&self) -> Vec<RecordedRequest> {
        self.entries.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
