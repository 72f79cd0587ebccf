//! Actix Web HTTP server.
//!
//! Routing follows the method, not the path:
//! - `GET /health` -> `OK`
//! - any other `GET` -> 404
//! - `OPTIONS` -> permissive CORS headers
//! - `POST` (normally `/v1/chat/completions`) -> chat completion
//! - anything else -> 405

use crate::{
    auth,
    config::ProxyConfig,
    error::ProxyError,
    translation,
    types::ChatCompletionRequest,
};
use actix_cors::Cors;
use actix_web::{
    http::{header, Method, StatusCode},
    middleware::Logger,
    web, App, HttpRequest, HttpResponse, HttpResponseBuilder, HttpServer, ResponseError,
};
use anyhow::{Context, Result};
use chatbridge_sse::{translate_stream, unix_now};
use futures::StreamExt;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: ProxyConfig,
    pub client: reqwest::Client,
}

impl AppState {
    pub fn new(config: ProxyConfig) -> Result<Self> {
        // Bounds idle time between reads, not the length of a stream.
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { config, client })
    }
}

pub async fn serve(config: ProxyConfig) -> Result<()> {
    let addr = config.bind_addr();
    info!(addr = %addr, backend = %config.backend_base_url, "chatbridge listening");

    let state = web::Data::new(AppState::new(config)?);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(&addr)
    .with_context(|| format!("failed to bind {}", addr))?
    .run()
    .await
    .context("server error")?;

    Ok(())
}

/// CORS layer wrapped around the app. Preflight requests fall through to
/// [`configure`]'s `OPTIONS` handler like any other method.
pub fn cors() -> Cors {
    Cors::permissive().disable_preflight()
}

/// Register all routes. Expects `web::Data<AppState>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.default_service(web::to(dispatch));
}

async fn dispatch(
    state: web::Data<AppState>,
    req_http: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    match *req_http.method() {
        Method::GET if req_http.path() == "/health" => HttpResponse::Ok().body("OK"),
        Method::GET => HttpResponse::NotFound().body("Not Found"),
        Method::OPTIONS => preflight(),
        Method::POST => match handle_chat_completions(&state, &req_http, &body).await {
            Ok(resp) => resp,
            Err(e) => {
                if e.status_code().is_server_error() {
                    error!(error = %e, path = %req_http.path(), "chat completion failed");
                } else {
                    warn!(error = %e, path = %req_http.path(), "chat completion rejected");
                }
                e.error_response()
            }
        },
        _ => HttpResponse::MethodNotAllowed().body("Method not allowed"),
    }
}

fn preflight() -> HttpResponse {
    with_cors_headers(HttpResponse::Ok()).finish()
}

fn with_cors_headers(mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"));
    builder
}

async fn handle_chat_completions(
    state: &AppState,
    req_http: &HttpRequest,
    body: &[u8],
) -> Result<HttpResponse, ProxyError> {
    let api_key = auth::extract_api_key(req_http.headers(), state.config.default_api_key.as_ref())
        .ok_or(ProxyError::MissingApiKey)?;

    let req: ChatCompletionRequest = serde_json::from_slice(body)?;
    let outgoing = translation::convert_openai_to_anthropic(&req, state.config.max_tokens);

    debug!(
        model = %outgoing.model,
        stream = outgoing.stream,
        messages = outgoing.messages.len(),
        has_system = outgoing.system.is_some(),
        "forwarding chat completion"
    );

    let upstream = state
        .client
        .post(state.config.messages_url())
        .header("accept", "application/json")
        .header("x-api-key", api_key.expose_secret())
        .header("anthropic-version", &state.config.anthropic_version)
        .json(&outgoing)
        .send()
        .await?;

    let status = upstream.status();
    if outgoing.stream && status.is_success() {
        let frames = translate_stream(upstream.bytes_stream()).map(Ok::<_, actix_web::Error>);

        return Ok(with_cors_headers(HttpResponse::Ok())
            .content_type("text/event-stream")
            .insert_header((header::CACHE_CONTROL, "no-cache"))
            .streaming(frames));
    }

    let bytes = upstream.bytes().await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ProxyError::UpstreamDecode(format!("{} (status {})", e, status)))?;
    if !status.is_success() {
        warn!(%status, body = %value, "backend returned an error");
    }

    let shaped = translation::shape_backend_body(value, unix_now())?;
    Ok(
        HttpResponse::build(StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY))
            .json(shaped),
    )
}
