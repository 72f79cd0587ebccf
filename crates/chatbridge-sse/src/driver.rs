//! Stream driver.
//!
//! Owns one framer and one translator state for the lifetime of a single
//! backend response and turns reads into client frames as they arrive.
//! Per-event failures are logged and skipped; a read failure ends the stream
//! but the `[DONE]` sentinel is still written.
//!
//! Cancellation is by drop: when the client goes away, the HTTP server drops
//! the output stream, which drops the backend stream it owns and releases the
//! upstream connection.

use crate::chunk::DONE_FRAME;
use crate::event::parse_event;
use crate::framer::EventFramer;
use crate::translator::TranslatorState;
use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Idle,
    Streaming,
    Closed,
}

#[derive(Debug)]
pub struct StreamDriver {
    phase: DriverPhase,
    framer: EventFramer,
    state: TranslatorState,
}

impl Default for StreamDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDriver {
    pub fn new() -> Self {
        Self::with_state(TranslatorState::new())
    }

    pub fn with_state(state: TranslatorState) -> Self {
        Self {
            phase: DriverPhase::Idle,
            framer: EventFramer::new(),
            state,
        }
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    pub fn state(&self) -> &TranslatorState {
        &self.state
    }

    /// Process one backend read and return the client frames it produced,
    /// in backend order. Returns nothing once the driver is closed.
    pub fn on_chunk(&mut self, bytes: &[u8]) -> Vec<Bytes> {
        match self.phase {
            DriverPhase::Closed => {
                debug!(len = bytes.len(), "ignoring read after stream close");
                return Vec::new();
            }
            DriverPhase::Idle => self.phase = DriverPhase::Streaming,
            DriverPhase::Streaming => {}
        }

        let mut frames = Vec::new();
        for block in self.framer.feed(bytes) {
            let event = match parse_event(&block) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, block = %block, "skipping backend event");
                    continue;
                }
            };
            let Some(chunk) = self.state.translate(event) else {
                continue;
            };
            match chunk.to_sse_frame() {
                Ok(frame) => frames.push(frame),
                Err(e) => warn!(error = %e, "failed to serialize chunk"),
            }
        }
        frames
    }

    /// Close the stream. Returns the `[DONE]` frame the first time only.
    pub fn finish(&mut self) -> Option<Bytes> {
        if self.phase == DriverPhase::Closed {
            return None;
        }
        self.phase = DriverPhase::Closed;

        let tail = self.framer.buffered();
        if !tail.is_empty() {
            debug!(tail = %tail, "discarding unterminated backend event");
        }
        Some(Bytes::from_static(DONE_FRAME))
    }

    /// Drive a backend byte stream to completion, yielding client frames.
    pub fn run<S, E>(self, backend: S) -> impl Stream<Item = Bytes> + Send
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: Display + Send,
    {
        let mut driver = self;
        stream! {
            let mut backend = Box::pin(backend);
            driver.phase = DriverPhase::Streaming;

            while let Some(read) = backend.next().await {
                match read {
                    Ok(bytes) => {
                        for frame in driver.on_chunk(&bytes) {
                            yield frame;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "backend stream read failed");
                        break;
                    }
                }
            }

            if let Some(done) = driver.finish() {
                yield done;
            }
        }
    }
}

/// Translate an Anthropic SSE byte stream into an OpenAI SSE byte stream.
pub fn translate_stream<S, E>(backend: S) -> impl Stream<Item = Bytes> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Display + Send,
{
    StreamDriver::new().run(backend)
}
