//! chatbridge SSE - streaming response translation.
//!
//! Anthropic's `/v1/messages` streams Server-Sent Events in the form
//! `event: <name>\ndata: <json>\n\n`. OpenAI-style clients expect
//! `data: <json>\n\n` chunk frames ending with `data: [DONE]`. This crate
//! converts the former into the latter incrementally, one network read at a
//! time, without ever holding the whole response.
//!
//! Pipeline:
//! - [`EventFramer`]: raw bytes -> complete event blocks.
//! - [`parse_event`]: event block -> [`BackendEvent`].
//! - [`TranslatorState`]: [`BackendEvent`] -> optional [`OutputChunk`].
//! - [`StreamDriver`]: runs the above over a byte stream and writes frames.

pub mod chunk;
pub mod driver;
pub mod event;
pub mod framer;
pub mod translator;

pub use chunk::{map_finish_reason, ChatCompletionChunk, OutputChunk, DONE_FRAME};
pub use driver::{translate_stream, DriverPhase, StreamDriver};
pub use event::{parse_event, BackendEvent, EventError};
pub use framer::EventFramer;
pub use translator::{unix_now, Clock, TranslatorState};
