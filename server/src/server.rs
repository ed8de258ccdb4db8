use tokio::sync::mpsc::{channel, Sender};

use system::{ChatMessage, ClientMessage, Point, ServerEvent, SessionId};

use crate::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::ConnectionTxStorage;
use crate::server_state::ServerState;

pub type ServerTx = Sender<ConnectionCommand>;

/// The single writer. All inbound messages, regardless of originating
/// connection, pass through `handle_connection_command` one at a time; the
/// handler is synchronous, so no mutation ever interleaves with another and
/// broadcast enqueue order equals store-mutation order.
pub struct Server {
    state: ServerState,
    connections: ConnectionTxStorage,
}

impl Server {
    pub fn new() -> Self {
        Self {
            state: ServerState::new(),
            connections: ConnectionTxStorage::new(),
        }
    }

    pub fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx } => {
                let session = self.state.registry.register();
                let session_id = session.session_id;
                log::info!("session {} connected", session_id);

                self.connections.insert(session_id, tx);
                self.connections
                    .send(&session_id, ConnectionEvent::Connected { session_id });
                self.connections.send(
                    &session_id,
                    ConnectionEvent::Event(ServerEvent::SessionInfo {
                        session_id,
                        color: session.color.clone(),
                    }),
                );
                self.connections
                    .send(&session_id, ConnectionEvent::Event(self.state.snapshot()));

                self.broadcast(ServerEvent::SessionJoined(session), Some(&session_id));
            }
            ConnectionCommand::Disconnect { from } => {
                self.connections.remove(&from);
                if self.state.registry.unregister(&from).is_some() {
                    log::info!("session {} disconnected", from);
                    self.broadcast(ServerEvent::SessionLeft { session_id: from }, None);
                }
            }
            ConnectionCommand::Message { from, message } => {
                self.handle_message(from, message);
            }
        }
    }

    fn handle_message(&mut self, from: SessionId, message: ClientMessage) {
        match message {
            ClientMessage::StrokeBegin { x, y, color, width } => {
                if !self.state.registry.contains(&from) {
                    log::warn!("stroke-begin from unregistered session {}", from);
                    return;
                }
                // The server-assigned stroke id is authoritative; the
                // originator finalizes from this echo like everyone else.
                let stroke = self
                    .state
                    .canvas
                    .begin_stroke(from, Point::new(x, y), color, width)
                    .clone();
                self.broadcast(ServerEvent::StrokeBegin(stroke), None);
            }
            ClientMessage::StrokeContinue { stroke_id, x, y } => {
                let owner_registered = self
                    .state
                    .canvas
                    .stroke_owner(&stroke_id)
                    .map(|owner| self.state.registry.contains(&owner))
                    .unwrap_or(false);
                if !owner_registered {
                    // Cleared canvas or disconnected owner: a benign race.
                    log::debug!("stale continuation for stroke {}", stroke_id);
                    return;
                }
                self.state.canvas.continue_stroke(&stroke_id, Point::new(x, y));
                self.broadcast(ServerEvent::StrokeContinue { stroke_id, x, y }, None);
            }
            ClientMessage::StrokeEnd { stroke_id } => {
                self.state.canvas.end_stroke(&stroke_id);
                self.broadcast(ServerEvent::StrokeEnd { stroke_id }, None);
            }
            ClientMessage::CursorUpdate { x, y } => {
                if !self.state.registry.update_cursor(&from, Point::new(x, y)) {
                    return;
                }
                let color = self
                    .state
                    .registry
                    .get(&from)
                    .map(|s| s.color.clone())
                    .unwrap_or_default();
                self.broadcast(
                    ServerEvent::CursorUpdate {
                        session_id: from,
                        x,
                        y,
                        color,
                    },
                    Some(&from),
                );
            }
            ClientMessage::CanvasClear {} => {
                self.state.canvas.clear();
                // Broadcast even when the canvas was already empty.
                self.broadcast(ServerEvent::CanvasClear {}, None);
            }
            ClientMessage::ChatPost { message, .. } => {
                let text = message.trim();
                if text.is_empty() {
                    return;
                }
                let Some(session) = self.state.registry.get(&from) else {
                    return;
                };
                let chat = ChatMessage::new(session, text.to_string());
                self.broadcast(ServerEvent::ChatMessage(chat), None);
            }
            ClientMessage::TypingState { typing } => {
                if !self.state.registry.contains(&from) {
                    return;
                }
                self.broadcast(
                    ServerEvent::TypingState {
                        session_id: from,
                        typing,
                    },
                    Some(&from),
                );
            }
        }
    }

    /// Fans one event out to every registered session, optionally excluding
    /// the originator. Per-session delivery order follows call order because
    /// each session is bound to a single FIFO channel.
    fn broadcast(&mut self, event: ServerEvent, without: Option<&SessionId>) {
        for session_id in self.state.registry.session_ids() {
            if without.map_or(true, |w| *w != session_id) {
                self.connections
                    .send(&session_id, ConnectionEvent::Event(event.clone()));
            }
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

pub fn spawn_server() -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ConnectionCommand>(64);

    tokio::spawn(async move {
        let mut server = Server::new();

        while let Some(command) = srv_rx.recv().await {
            server.handle_connection_command(command);
        }
    });

    srv_tx
}
