use system::{CanvasState, ServerEvent, SessionRegistry};

/// The authoritative state the single-writer loop owns. Only
/// `Server::handle_connection_command` ever touches it, so no mutation can
/// interleave with a snapshot.
pub struct ServerState {
    pub registry: SessionRegistry,
    pub canvas: CanvasState,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            registry: SessionRegistry::new(),
            canvas: CanvasState::new(),
        }
    }

    /// Consistent point-in-time view for a freshly accepted connection.
    pub fn snapshot(&self) -> ServerEvent {
        ServerEvent::CanvasSnapshot {
            strokes: self.canvas.strokes().to_vec(),
            sessions: self.registry.list(),
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}
