use crate::types::Point;

/// The drawing surface collaborator. Rendering itself is outside this
/// system; the replica only tells the surface what changed.
pub trait RenderSurface {
    fn draw_segment(&mut self, from: Point, to: Point, color: &str, width: f32);
    fn clear_all(&mut self);
}

/// User-facing connection indicator collaborator.
pub trait StatusIndicator {
    fn set_status(&mut self, connected: bool);
}
