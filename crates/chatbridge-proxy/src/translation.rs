//! OpenAI <-> Anthropic translation for request bodies and non-streaming
//! responses.

use crate::error::ProxyError;
use crate::types::{
    AssistantMessage, ChatCompletion, ChatCompletionRequest, CompletionChoice, CompletionUsage,
    MessagesRequest, MessagesResponse, ResponseBlock, COMPLETION_OBJECT,
};
use chatbridge_sse::map_finish_reason;
use serde_json::{json, Value};

/// Convert an OpenAI chat completion request into an Anthropic Messages
/// request.
///
/// `system` messages are removed from the list; the last one wins.
pub fn convert_openai_to_anthropic(req: &ChatCompletionRequest, max_tokens: u32) -> MessagesRequest {
    let mut system = None;
    let mut messages = Vec::with_capacity(req.messages.len());
    for msg in &req.messages {
        if msg.is_system() {
            system = Some(msg.content_text());
        } else {
            messages.push(msg.clone());
        }
    }

    MessagesRequest {
        model: req.model.clone(),
        messages,
        max_tokens,
        stream: req.stream.unwrap_or(false),
        system: system.filter(|s| !s.is_empty()),
        temperature: req.temperature,
        stop_sequences: req.stop.clone().map(|s| s.into_vec()),
    }
}

/// Convert an Anthropic Messages response into an OpenAI chat completion.
pub fn convert_anthropic_to_openai(resp: MessagesResponse, created: i64) -> ChatCompletion {
    let content = resp
        .content
        .into_iter()
        .find_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Other => None,
        })
        .unwrap_or_default();

    ChatCompletion {
        id: resp.id,
        object: COMPLETION_OBJECT.to_string(),
        created,
        model: resp.model,
        choices: vec![CompletionChoice {
            index: 0,
            message: AssistantMessage {
                role: "assistant".to_string(),
                content,
            },
            logprobs: None,
            finish_reason: resp
                .stop_reason
                .as_deref()
                .map(|r| map_finish_reason(r).to_string()),
        }],
        usage: CompletionUsage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
            total_tokens: resp
                .usage
                .input_tokens
                .saturating_add(resp.usage.output_tokens),
        },
    }
}

/// Shape a raw backend body for the client.
///
/// Anthropic error bodies (`{"type":"error","error":{...}}`) are forwarded as
/// `{"error": {...}}`; everything else must be a Messages response.
pub fn shape_backend_body(body: Value, created: i64) -> Result<Value, ProxyError> {
    if let Some(error) = body.get("error") {
        return Ok(json!({ "error": error }));
    }

    let resp: MessagesResponse = serde_json::from_value(body)
        .map_err(|e| ProxyError::UpstreamDecode(e.to_string()))?;
    serde_json::to_value(convert_anthropic_to_openai(resp, created))
        .map_err(|e| ProxyError::UpstreamDecode(e.to_string()))
}
