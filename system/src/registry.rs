use std::collections::HashMap;

use rand::seq::IndexedRandom;

use crate::types::{Point, Session, SessionId};

/// Colors are a usability aid, not an identity guarantee: each session draws
/// independently at random, so duplicates across users are permitted.
pub const PALETTE: [&str; 8] = [
    "#E74C3C", "#3498DB", "#2ECC71", "#F39C12", "#9B59B6", "#1ABC9C", "#E91E63", "#34495E",
];

/// Tracks every live connection. Session ids are uuids and never reused.
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub fn register(&mut self) -> Session {
        let color = PALETTE
            .choose(&mut rand::rng())
            .expect("palette is non-empty");
        let session = Session {
            session_id: SessionId::new_v4(),
            color: (*color).to_string(),
            cursor: None,
        };
        self.sessions.insert(session.session_id, session.clone());
        session
    }

    pub fn unregister(&mut self, session_id: &SessionId) -> Option<Session> {
        self.sessions.remove(session_id)
    }

    /// Unknown ids are tolerated: the message raced with disconnect
    /// processing and the session is already gone.
    pub fn update_cursor(&mut self, session_id: &SessionId, point: Point) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(session) => {
                session.cursor = Some(point);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn get(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn list(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_palette_color_and_no_cursor() {
        let mut registry = SessionRegistry::new();
        let session = registry.register();
        assert!(PALETTE.contains(&session.color.as_str()));
        assert!(session.cursor.is_none());
        assert!(registry.contains(&session.session_id));
    }

    #[test]
    fn session_ids_are_unique() {
        let mut registry = SessionRegistry::new();
        let a = registry.register();
        let b = registry.register();
        assert_ne!(a.session_id, b.session_id);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unregister_removes_the_session() {
        let mut registry = SessionRegistry::new();
        let session = registry.register();
        assert!(registry.unregister(&session.session_id).is_some());
        assert!(!registry.contains(&session.session_id));
        assert!(registry.unregister(&session.session_id).is_none());
    }

    #[test]
    fn update_cursor_on_unknown_session_is_a_noop() {
        let mut registry = SessionRegistry::new();
        assert!(!registry.update_cursor(&SessionId::new_v4(), Point::new(1.0, 2.0)));
    }

    #[test]
    fn update_cursor_records_last_position() {
        let mut registry = SessionRegistry::new();
        let session = registry.register();
        assert!(registry.update_cursor(&session.session_id, Point::new(3.0, 4.0)));
        assert!(registry.update_cursor(&session.session_id, Point::new(5.0, 6.0)));
        let cursor = registry.get(&session.session_id).unwrap().cursor;
        assert_eq!(cursor, Some(Point::new(5.0, 6.0)));
    }
}
