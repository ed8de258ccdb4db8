use std::collections::{HashMap, HashSet};

use crate::types::{Point, SessionId, Stroke, StrokeId};

/// The authoritative stroke log. Insertion order is the server's acceptance
/// order, which every broadcast preserves.
///
/// Liveness (`live`) is advisory only: `end_stroke` stops nothing, and a
/// continuation arriving after the end is still appended as long as the
/// stroke exists.
pub struct CanvasState {
    strokes: Vec<Stroke>,
    index: HashMap<StrokeId, usize>,
    live: HashSet<StrokeId>,
}

impl CanvasState {
    pub fn new() -> Self {
        Self {
            strokes: Vec::new(),
            index: HashMap::new(),
            live: HashSet::new(),
        }
    }

    /// Allocates a fresh stroke id and appends a single-point stroke.
    /// Color and width are bound here and never change afterwards.
    pub fn begin_stroke(
        &mut self,
        owner_session_id: SessionId,
        first_point: Point,
        color: String,
        width: f32,
    ) -> &Stroke {
        let stroke_id = StrokeId::new_v4();
        let stroke = Stroke {
            stroke_id,
            owner_session_id,
            color,
            width,
            points: vec![first_point],
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        self.index.insert(stroke_id, self.strokes.len());
        self.live.insert(stroke_id);
        self.strokes.push(stroke);
        self.strokes.last().expect("just pushed")
    }

    /// Appends a point if a stroke with this id exists. Returns whether the
    /// point was appended. The owner-still-registered precondition is the
    /// caller's to check, since sessions live in the registry.
    pub fn continue_stroke(&mut self, stroke_id: &StrokeId, point: Point) -> bool {
        match self.index.get(stroke_id) {
            Some(&i) => {
                self.strokes[i].points.push(point);
                true
            }
            None => false,
        }
    }

    /// Advisory: the stroke stays in the log, it just stops being "live".
    pub fn end_stroke(&mut self, stroke_id: &StrokeId) {
        self.live.remove(stroke_id);
    }

    /// Atomically replaces the stroke log with an empty one.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.index.clear();
        self.live.clear();
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn stroke_owner(&self, stroke_id: &StrokeId) -> Option<SessionId> {
        self.index
            .get(stroke_id)
            .map(|&i| self.strokes[i].owner_session_id)
    }

    pub fn is_live(&self, stroke_id: &StrokeId) -> bool {
        self.live.contains(stroke_id)
    }
}

impl Default for CanvasState {
    fn default() -> Self {
        Self::new()
    }
}
