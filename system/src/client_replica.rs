use std::collections::HashMap;

use crate::message::ServerEvent;
use crate::traits::RenderSurface;
use crate::types::{Point, Session, SessionId, Stroke, StrokeId};

/// Client-side mirror of the server's canvas and session state.
///
/// Rebuilt wholesale from the snapshot at every (re)connection, then kept
/// current by applying broadcast events in arrival order. Events naming ids
/// this client has never seen (joined mid-stroke, raced a clear) are benign
/// no-ops.
pub struct ClientReplica {
    session_id: Option<SessionId>,
    color: Option<String>,
    strokes: Vec<Stroke>,
    sessions: HashMap<SessionId, Session>,
    // Derived routing index so continuations don't re-scan the stroke log.
    // Disposable: rebuilt from snapshots, pruned by stroke-end.
    active_strokes: HashMap<StrokeId, usize>,
    current_stroke: Option<StrokeId>,
}

impl ClientReplica {
    pub fn new() -> Self {
        Self {
            session_id: None,
            color: None,
            strokes: Vec::new(),
            sessions: HashMap::new(),
            active_strokes: HashMap::new(),
            current_stroke: None,
        }
    }

    /// The id the server assigned to this client, once session-info arrived.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// The own in-progress stroke that pointer movement should extend.
    pub fn current_stroke(&self) -> Option<StrokeId> {
        self.current_stroke
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn sessions(&self) -> &HashMap<SessionId, Session> {
        &self.sessions
    }

    pub fn apply(&mut self, event: ServerEvent, surface: &mut impl RenderSurface) {
        match event {
            ServerEvent::CanvasSnapshot { strokes, sessions } => {
                log::debug!(
                    "applying snapshot: {} strokes, {} sessions",
                    strokes.len(),
                    sessions.len()
                );
                self.strokes = strokes;
                self.sessions = sessions
                    .into_iter()
                    .map(|s| (s.session_id, s))
                    .collect();
                // A stroke begun before we joined may still be continued, and
                // liveness is advisory, so index every snapshot stroke.
                self.active_strokes = self
                    .strokes
                    .iter()
                    .enumerate()
                    .map(|(i, s)| (s.stroke_id, i))
                    .collect();
                self.current_stroke = None;
                self.redraw(surface);
            }
            ServerEvent::SessionInfo { session_id, color } => {
                self.session_id = Some(session_id);
                self.color = Some(color);
            }
            ServerEvent::StrokeBegin(stroke) => {
                if self.session_id == Some(stroke.owner_session_id) {
                    self.current_stroke = Some(stroke.stroke_id);
                }
                self.active_strokes.insert(stroke.stroke_id, self.strokes.len());
                self.strokes.push(stroke);
            }
            ServerEvent::StrokeContinue { stroke_id, x, y } => {
                let Some(&i) = self.active_strokes.get(&stroke_id) else {
                    // Joined mid-stroke or raced a clear; nothing to extend.
                    log::debug!("continuation for unknown stroke {}", stroke_id);
                    return;
                };
                let stroke = &mut self.strokes[i];
                let to = Point::new(x, y);
                let from = *stroke.points.last().expect("strokes begin with a point");
                stroke.points.push(to);
                surface.draw_segment(from, to, &stroke.color, stroke.width);
            }
            ServerEvent::StrokeEnd { stroke_id } => {
                self.active_strokes.remove(&stroke_id);
                if self.current_stroke == Some(stroke_id) {
                    self.current_stroke = None;
                }
            }
            ServerEvent::CursorUpdate { session_id, x, y, .. } => {
                if let Some(session) = self.sessions.get_mut(&session_id) {
                    session.cursor = Some(Point::new(x, y));
                }
            }
            ServerEvent::CanvasClear {} => {
                self.strokes.clear();
                self.active_strokes.clear();
                self.current_stroke = None;
                surface.clear_all();
            }
            ServerEvent::SessionJoined(session) => {
                self.sessions.insert(session.session_id, session);
            }
            ServerEvent::SessionLeft { session_id } => {
                self.sessions.remove(&session_id);
            }
            // Chat and typing feed UI collaborators outside this mirror.
            ServerEvent::ChatMessage(_) | ServerEvent::TypingState { .. } => {}
        }
    }

    fn redraw(&self, surface: &mut impl RenderSurface) {
        surface.clear_all();
        for stroke in &self.strokes {
            for pair in stroke.points.windows(2) {
                surface.draw_segment(pair[0], pair[1], &stroke.color, stroke.width);
            }
        }
    }
}

impl Default for ClientReplica {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingSurface {
        segments: Vec<(Point, Point, String, f32)>,
        clears: usize,
    }

    impl RenderSurface for RecordingSurface {
        fn draw_segment(&mut self, from: Point, to: Point, color: &str, width: f32) {
            self.segments.push((from, to, color.to_string(), width));
        }

        fn clear_all(&mut self) {
            self.clears += 1;
        }
    }

    fn stroke(owner: SessionId, points: Vec<Point>) -> Stroke {
        Stroke {
            stroke_id: Uuid::new_v4(),
            owner_session_id: owner,
            color: "#E74C3C".into(),
            width: 3.0,
            points,
            created_at: 0,
        }
    }

    fn session(id: SessionId) -> Session {
        Session {
            session_id: id,
            color: "#3498DB".into(),
            cursor: None,
        }
    }

    #[test]
    fn snapshot_replaces_mirror_and_redraws() {
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        let owner = Uuid::new_v4();

        let s = stroke(
            owner,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)],
        );
        replica.apply(
            ServerEvent::CanvasSnapshot {
                strokes: vec![s],
                sessions: vec![session(owner)],
            },
            &mut surface,
        );

        assert_eq!(replica.strokes().len(), 1);
        assert_eq!(replica.sessions().len(), 1);
        assert_eq!(surface.clears, 1);
        assert_eq!(surface.segments.len(), 2);
    }

    #[test]
    fn continuation_of_snapshot_stroke_is_routed() {
        // Joined mid-stroke: the snapshot carried it, continuations extend it.
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        let s = stroke(Uuid::new_v4(), vec![Point::new(0.0, 0.0)]);
        let id = s.stroke_id;
        replica.apply(
            ServerEvent::CanvasSnapshot {
                strokes: vec![s],
                sessions: vec![],
            },
            &mut surface,
        );
        replica.apply(
            ServerEvent::StrokeContinue {
                stroke_id: id,
                x: 4.0,
                y: 4.0,
            },
            &mut surface,
        );
        assert_eq!(replica.strokes()[0].points.len(), 2);
        assert_eq!(surface.segments.len(), 1);
    }

    #[test]
    fn own_stroke_begin_becomes_current() {
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        let me = Uuid::new_v4();
        replica.apply(
            ServerEvent::SessionInfo {
                session_id: me,
                color: "#E74C3C".into(),
            },
            &mut surface,
        );

        let other = stroke(Uuid::new_v4(), vec![Point::new(0.0, 0.0)]);
        replica.apply(ServerEvent::StrokeBegin(other), &mut surface);
        assert_eq!(replica.current_stroke(), None);

        let mine = stroke(me, vec![Point::new(0.0, 0.0)]);
        let mine_id = mine.stroke_id;
        replica.apply(ServerEvent::StrokeBegin(mine), &mut surface);
        assert_eq!(replica.current_stroke(), Some(mine_id));

        replica.apply(ServerEvent::StrokeEnd { stroke_id: mine_id }, &mut surface);
        assert_eq!(replica.current_stroke(), None);
    }

    #[test]
    fn continue_draws_one_incremental_segment() {
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        let s = stroke(Uuid::new_v4(), vec![Point::new(1.0, 1.0)]);
        let id = s.stroke_id;
        replica.apply(ServerEvent::StrokeBegin(s), &mut surface);
        assert!(surface.segments.is_empty());

        replica.apply(
            ServerEvent::StrokeContinue {
                stroke_id: id,
                x: 2.0,
                y: 2.0,
            },
            &mut surface,
        );
        assert_eq!(
            surface.segments,
            vec![(
                Point::new(1.0, 1.0),
                Point::new(2.0, 2.0),
                "#E74C3C".to_string(),
                3.0
            )]
        );
    }

    #[test]
    fn continue_for_unknown_stroke_is_a_noop() {
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        replica.apply(
            ServerEvent::StrokeContinue {
                stroke_id: Uuid::new_v4(),
                x: 1.0,
                y: 1.0,
            },
            &mut surface,
        );
        assert!(replica.strokes().is_empty());
        assert!(surface.segments.is_empty());
    }

    #[test]
    fn continue_after_end_is_dropped_by_the_mirror() {
        // The routing index is gone after stroke-end; a late continuation is
        // ignored locally even though the server may still have appended it.
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        let s = stroke(Uuid::new_v4(), vec![Point::new(0.0, 0.0)]);
        let id = s.stroke_id;
        replica.apply(ServerEvent::StrokeBegin(s), &mut surface);
        replica.apply(ServerEvent::StrokeEnd { stroke_id: id }, &mut surface);
        replica.apply(
            ServerEvent::StrokeContinue {
                stroke_id: id,
                x: 1.0,
                y: 1.0,
            },
            &mut surface,
        );
        assert_eq!(replica.strokes()[0].points.len(), 1);
    }

    #[test]
    fn clear_empties_mirror_and_surface() {
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        replica.apply(
            ServerEvent::StrokeBegin(stroke(Uuid::new_v4(), vec![Point::new(0.0, 0.0)])),
            &mut surface,
        );
        replica.apply(ServerEvent::CanvasClear {}, &mut surface);
        assert!(replica.strokes().is_empty());
        assert_eq!(surface.clears, 1);
    }

    #[test]
    fn join_and_leave_update_sessions() {
        let mut replica = ClientReplica::new();
        let mut surface = RecordingSurface::default();
        let id = Uuid::new_v4();
        replica.apply(ServerEvent::SessionJoined(session(id)), &mut surface);
        assert!(replica.sessions().contains_key(&id));

        replica.apply(
            ServerEvent::CursorUpdate {
                session_id: id,
                x: 7.0,
                y: 8.0,
                color: "#3498DB".into(),
            },
            &mut surface,
        );
        assert_eq!(
            replica.sessions()[&id].cursor,
            Some(Point::new(7.0, 8.0))
        );

        replica.apply(ServerEvent::SessionLeft { session_id: id }, &mut surface);
        assert!(!replica.sessions().contains_key(&id));
    }
}
