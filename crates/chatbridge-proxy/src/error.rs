//! Proxy error types

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Not Allowed")]
    MissingApiKey,

    #[error("invalid request body: {0}")]
    InvalidRequest(#[from] serde_json::Error),

    #[error("backend request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("invalid backend response: {0}")]
    UpstreamDecode(String),
}

impl ResponseError for ProxyError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingApiKey => StatusCode::FORBIDDEN,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::UpstreamDecode(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }
}
