//! Backend (Anthropic) stream events.
//!
//! Only the two events that carry data for the client are interpreted:
//! `message_start` (stream id and model) and `content_block_delta` (text and,
//! possibly, a stop reason). Every other event name maps to
//! [`BackendEvent::Other`] so protocol additions pass through harmlessly.
//!
//! A block must be exactly `event: <name>` followed by `data: <json>`. A data
//! payload that itself contains raw newlines is therefore rejected as a
//! framing anomaly rather than reassembled.

use serde::Deserialize;
use thiserror::Error;

pub const MESSAGE_START_HEADER: &str = "event: message_start";
pub const CONTENT_BLOCK_DELTA_HEADER: &str = "event: content_block_delta";

const DATA_FIELD: &str = "data:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendEvent {
    MessageStart {
        id: String,
        model: String,
    },
    ContentBlockDelta {
        text: Option<String>,
        stop_reason: Option<String>,
    },
    Other,
}

/// Why an event block was skipped.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("expected an event line and a data line, got {0} line(s)")]
    LineCount(usize),

    #[error("second line is not a `data:` field")]
    MissingData,

    #[error("invalid event payload: {0}")]
    Payload(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct MessageStartPayload {
    message: StartedMessage,
}

#[derive(Debug, Deserialize)]
struct StartedMessage {
    id: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ContentBlockDeltaPayload {
    #[serde(default)]
    delta: Option<DeltaPayload>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeltaPayload {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    stop_reason: Option<String>,
}

/// Interpret one framed event block.
pub fn parse_event(block: &str) -> Result<BackendEvent, EventError> {
    let lines: Vec<&str> = block.split('\n').collect();
    let [header, data] = lines.as_slice() else {
        return Err(EventError::LineCount(lines.len()));
    };

    match *header {
        MESSAGE_START_HEADER => {
            let payload: MessageStartPayload = serde_json::from_str(data_payload(data)?)?;
            Ok(BackendEvent::MessageStart {
                id: payload.message.id,
                model: payload.message.model,
            })
        }
        CONTENT_BLOCK_DELTA_HEADER => {
            let payload: ContentBlockDeltaPayload = serde_json::from_str(data_payload(data)?)?;
            let (text, delta_stop) = payload
                .delta
                .map(|d| (d.text, d.stop_reason))
                .unwrap_or_default();
            Ok(BackendEvent::ContentBlockDelta {
                text,
                stop_reason: payload.stop_reason.or(delta_stop),
            })
        }
        _ => Ok(BackendEvent::Other),
    }
}

fn data_payload(line: &str) -> Result<&str, EventError> {
    let value = line.strip_prefix(DATA_FIELD).ok_or(EventError::MissingData)?;
    Ok(value.strip_prefix(' ').unwrap_or(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_start_extracts_id_and_model() {
        let event = parse_event(
            "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\",\"model\":\"claude-3\",\"role\":\"assistant\"}}",
        )
        .unwrap();
        assert_eq!(
            event,
            BackendEvent::MessageStart {
                id: "msg_1".to_string(),
                model: "claude-3".to_string(),
            }
        );
    }

    #[test]
    fn content_block_delta_with_text() {
        let event = parse_event(
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}",
        )
        .unwrap();
        assert_eq!(
            event,
            BackendEvent::ContentBlockDelta {
                text: Some("Hi".to_string()),
                stop_reason: None,
            }
        );
    }

    #[test]
    fn stop_reason_at_top_level() {
        let event =
            parse_event("event: content_block_delta\ndata: {\"stop_reason\":\"stop_sequence\"}")
                .unwrap();
        assert_eq!(
            event,
            BackendEvent::ContentBlockDelta {
                text: None,
                stop_reason: Some("stop_sequence".to_string()),
            }
        );
    }

    #[test]
    fn stop_reason_inside_delta() {
        let event = parse_event(
            "event: content_block_delta\ndata: {\"delta\":{\"text\":\"end\",\"stop_reason\":\"max_tokens\"}}",
        )
        .unwrap();
        assert_eq!(
            event,
            BackendEvent::ContentBlockDelta {
                text: Some("end".to_string()),
                stop_reason: Some("max_tokens".to_string()),
            }
        );
    }

    #[test]
    fn top_level_stop_reason_wins_over_delta() {
        let event = parse_event(
            "event: content_block_delta\ndata: {\"stop_reason\":\"end_turn\",\"delta\":{\"text\":\"bye\",\"stop_reason\":\"max_tokens\"}}",
        )
        .unwrap();
        assert_eq!(
            event,
            BackendEvent::ContentBlockDelta {
                text: Some("bye".to_string()),
                stop_reason: Some("end_turn".to_string()),
            }
        );
    }

    #[test]
    fn data_without_space_is_accepted() {
        let event = parse_event("event: content_block_delta\ndata:{\"delta\":{\"text\":\"x\"}}").unwrap();
        assert!(matches!(event, BackendEvent::ContentBlockDelta { text: Some(t), .. } if t == "x"));
    }

    #[test]
    fn unknown_event_is_other() {
        assert_eq!(
            parse_event("event: ping\ndata: {\"type\":\"ping\"}").unwrap(),
            BackendEvent::Other
        );
        assert_eq!(
            parse_event("event: message_stop\ndata: not even json").unwrap(),
            BackendEvent::Other
        );
    }

    #[test]
    fn wrong_line_count_is_rejected() {
        assert!(matches!(
            parse_event(": keep-alive"),
            Err(EventError::LineCount(1))
        ));
        assert!(matches!(
            parse_event("event: content_block_delta\ndata: {\ndata: }"),
            Err(EventError::LineCount(3))
        ));
    }

    #[test]
    fn missing_data_field_is_rejected() {
        assert!(matches!(
            parse_event("event: content_block_delta\nid: 7"),
            Err(EventError::MissingData)
        ));
    }

    #[test]
    fn malformed_payload_is_rejected() {
        assert!(matches!(
            parse_event("event: content_block_delta\ndata: {\"delta\":"),
            Err(EventError::Payload(_))
        ));
        assert!(matches!(
            parse_event("event: message_start\ndata: {\"message\":{}}"),
            Err(EventError::Payload(_))
        ));
    }
}
