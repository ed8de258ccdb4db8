use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SessionId = Uuid;
pub type StrokeId = Uuid;
pub type ChatMessageId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One live connection's identity and presence data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: SessionId,
    pub color: String,
    pub cursor: Option<Point>,
}

/// One drawing gesture, pointer-down to pointer-up. `points` is append-only
/// and order-preserving; styling and owner never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub stroke_id: StrokeId,
    pub owner_session_id: SessionId,
    pub color: String,
    pub width: f32,
    pub points: Vec<Point>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: ChatMessageId,
    pub session_id: SessionId,
    pub color: String,
    pub message: String,
    pub timestamp: i64,
}

impl ChatMessage {
    /// Wraps chat text with the sender's identity, stamped at acceptance
    /// time so chat ordering matches broadcast ordering.
    pub fn new(sender: &Session, message: String) -> Self {
        Self {
            id: ChatMessageId::new_v4(),
            session_id: sender.session_id,
            color: sender.color.clone(),
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}
