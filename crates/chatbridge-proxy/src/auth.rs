//! API key resolution.
//!
//! Clients send their Anthropic key as an OpenAI-style bearer token:
//! `Authorization: Bearer sk-ant-...`. The scheme is not checked; the second
//! token of the header is the key. Requests without one fall back to the
//! configured default key.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use secrecy::SecretString;

pub fn extract_api_key(
    headers: &HeaderMap,
    default_key: Option<&SecretString>,
) -> Option<SecretString> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_whitespace().nth(1))
        .map(SecretString::from)
        .or_else(|| default_key.cloned())
}
