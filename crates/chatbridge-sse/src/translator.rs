//! Event-to-chunk translation.

use crate::chunk::OutputChunk;
use crate::event::BackendEvent;

/// Source of the `created` timestamp (epoch seconds).
pub type Clock = fn() -> i64;

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Per-stream state carried from `message_start` to later deltas.
///
/// One instance belongs to exactly one stream; ids are empty strings until a
/// `message_start` has been seen.
#[derive(Debug, Clone)]
pub struct TranslatorState {
    stream_id: String,
    model: String,
    clock: Clock,
}

impl Default for TranslatorState {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslatorState {
    pub fn new() -> Self {
        Self::with_clock(unix_now)
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            stream_id: String::new(),
            model: String::new(),
            clock,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Map one backend event to at most one client chunk.
    ///
    /// A delta with neither text nor stop reason still yields a chunk with an
    /// empty delta, so the client sees the same cadence as the backend.
    pub fn translate(&mut self, event: BackendEvent) -> Option<OutputChunk> {
        match event {
            BackendEvent::MessageStart { id, model } => {
                self.stream_id = id;
                self.model = model;
                None
            }
            BackendEvent::ContentBlockDelta { text, stop_reason } => Some(OutputChunk {
                id: self.stream_id.clone(),
                created: (self.clock)(),
                model: self.model.clone(),
                content: text.filter(|t| !t.is_empty()),
                finish_reason: stop_reason,
            }),
            BackendEvent::Other => None,
        }
    }
}
