//! Client-facing (OpenAI) streaming chunk.
//!
//! [`OutputChunk`] is what the translator produces; [`ChatCompletionChunk`] is
//! its JSON wire shape. Stop reasons are kept in Anthropic vocabulary until
//! serialization, where [`map_finish_reason`] converts them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub const CHUNK_OBJECT: &str = "chat.completion.chunk";

/// Terminal frame of an OpenAI stream.
pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// One increment of the translated stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub id: String,
    pub created: i64,
    pub model: String,
    pub content: Option<String>,
    /// Backend stop reason, verbatim.
    pub finish_reason: Option<String>,
}

impl OutputChunk {
    pub fn to_wire(&self) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: CHUNK_OBJECT.to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    content: self.content.clone(),
                },
                logprobs: None,
                finish_reason: self
                    .finish_reason
                    .as_deref()
                    .map(|reason| map_finish_reason(reason).to_string()),
            }],
        }
    }

    /// Serialize as a single `data: <json>\n\n` frame.
    pub fn to_sse_frame(&self) -> Result<Bytes, serde_json::Error> {
        let json = serde_json::to_string(&self.to_wire())?;
        Ok(Bytes::from(format!("data: {}\n\n", json)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    pub logprobs: Option<serde_json::Value>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Anthropic stop reason -> OpenAI finish reason. Unknown values pass through.
pub fn map_finish_reason(reason: &str) -> &str {
    match reason {
        "stop_sequence" => "stop",
        "max_tokens" => "length",
        other => other,
    }
}
