//! chatbridge proxy - OpenAI-compatible front end for Anthropic models.
//!
//! Clients speak OpenAI's `/v1/chat/completions`. This crate accepts that
//! wire format, reshapes the request into Anthropic's `/v1/messages`, calls
//! the backend, and reshapes the answer back, streaming included.
//!
//! Request flow:
//! - Resolve the API key from `Authorization` (or the configured default).
//! - Move the `system` message out of the message list.
//! - Forward to `{backend}/v1/messages`.
//! - Non-streaming: map the JSON body. Streaming: hand the byte stream to
//!   [`chatbridge_sse::translate_stream`].

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod translation;
pub mod types;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use server::{configure, cors, serve, AppState};
