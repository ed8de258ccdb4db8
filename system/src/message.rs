use crate::types::{ChatMessage, Session, SessionId, Stroke, StrokeId};
use serde::{Deserialize, Serialize};

/// Wire envelope is `{ "type": "...", "data": {...} }` in both directions.
/// Unknown `type` values fail deserialization and are dropped by the
/// connection layer, never crashing the handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    StrokeBegin {
        x: f32,
        y: f32,
        color: String,
        width: f32,
    },
    StrokeContinue {
        stroke_id: StrokeId,
        x: f32,
        y: f32,
    },
    StrokeEnd {
        stroke_id: StrokeId,
    },
    CursorUpdate {
        x: f32,
        y: f32,
    },
    CanvasClear {},
    ChatPost {
        message: String,
        timestamp: i64,
    },
    TypingState {
        typing: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// Full state, sent once immediately after connection accept.
    CanvasSnapshot {
        strokes: Vec<Stroke>,
        sessions: Vec<Session>,
    },
    /// The new session's own identity, sent only to it.
    SessionInfo {
        session_id: SessionId,
        color: String,
    },
    StrokeBegin(Stroke),
    StrokeContinue {
        stroke_id: StrokeId,
        x: f32,
        y: f32,
    },
    StrokeEnd {
        stroke_id: StrokeId,
    },
    CursorUpdate {
        session_id: SessionId,
        x: f32,
        y: f32,
        color: String,
    },
    CanvasClear {},
    SessionJoined(Session),
    SessionLeft {
        session_id: SessionId,
    },
    ChatMessage(ChatMessage),
    TypingState {
        session_id: SessionId,
        typing: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use uuid::Uuid;

    #[test]
    fn client_message_envelope_shape() {
        let json = serde_json::to_value(&ClientMessage::StrokeBegin {
            x: 10.0,
            y: 10.0,
            color: "#FF0000".into(),
            width: 3.0,
        })
        .unwrap();
        assert_eq!(json["type"], "stroke-begin");
        assert_eq!(json["data"]["x"], 10.0);
        assert_eq!(json["data"]["color"], "#FF0000");
    }

    #[test]
    fn stroke_continue_uses_camel_case_stroke_id() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(&ClientMessage::StrokeContinue {
            stroke_id: id,
            x: 1.0,
            y: 2.0,
        })
        .unwrap();
        assert_eq!(json["type"], "stroke-continue");
        assert_eq!(json["data"]["strokeId"], id.to_string());
    }

    #[test]
    fn canvas_clear_round_trips_with_empty_data() {
        let text = r#"{"type":"canvas-clear","data":{}}"#;
        let parsed: ClientMessage = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, ClientMessage::CanvasClear {});
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let text = r#"{"type":"reticulate-splines","data":{}}"#;
        assert!(serde_json::from_str::<ClientMessage>(text).is_err());
    }

    #[test]
    fn garbage_fails_to_parse() {
        assert!(serde_json::from_str::<ClientMessage>("not json at all").is_err());
    }

    #[test]
    fn stroke_begin_event_payload_is_the_stroke() {
        let stroke = Stroke {
            stroke_id: Uuid::new_v4(),
            owner_session_id: Uuid::new_v4(),
            color: "#3498DB".into(),
            width: 2.0,
            points: vec![Point::new(10.0, 10.0)],
            created_at: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&ServerEvent::StrokeBegin(stroke.clone())).unwrap();
        assert_eq!(json["type"], "stroke-begin");
        assert_eq!(json["data"]["strokeId"], stroke.stroke_id.to_string());
        assert_eq!(json["data"]["points"][0]["x"], 10.0);
        assert_eq!(json["data"]["ownerSessionId"], stroke.owner_session_id.to_string());
    }

    #[test]
    fn server_event_round_trip() {
        let event = ServerEvent::CursorUpdate {
            session_id: Uuid::new_v4(),
            x: 4.0,
            y: 5.0,
            color: "#2ECC71".into(),
        };
        let text = serde_json::to_string(&event).unwrap();
        let parsed: ServerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, event);
    }
}
