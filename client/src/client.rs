use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use system::{ClientMessage, ClientReplica, RenderSurface, ServerEvent, StatusIndicator};

use crate::backoff::Backoff;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle: `Disconnected → Connecting → Connected`, back to
/// `Connecting` on loss, terminal `Failed` once retries are exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Terminal: requires manual intervention, the client will not retry.
    #[error("reconnection attempts exhausted")]
    ReconnectExhausted,
}

/// Local user intents, translated into protocol messages against the
/// replica. Pointer movement extends the current in-progress stroke if the
/// server's stroke-begin echo has arrived, and is presence otherwise.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    BeginStroke { x: f32, y: f32, color: String, width: f32 },
    MovePointer { x: f32, y: f32 },
    EndStroke,
    ClearCanvas,
    PostChat { message: String },
    SetTyping(bool),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: String,
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            base_delay: Duration::from_millis(500),
            max_attempts: 6,
        }
    }
}

/// Sender half handed to the embedding UI.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::Sender<ClientCommand>,
}

impl ClientHandle {
    pub fn channel() -> (Self, mpsc::Receiver<ClientCommand>) {
        let (tx, rx) = mpsc::channel(256);
        (Self { tx }, rx)
    }

    /// Returns false once the client task is gone.
    pub async fn send(&self, command: ClientCommand) -> bool {
        self.tx.send(command).await.is_ok()
    }
}

/// Owns the replica and the connection. Every (re)connection consumes a
/// fresh session-info + canvas-snapshot; history is never replayed across a
/// gap.
pub struct CanvasClient<S: RenderSurface, I: StatusIndicator> {
    config: ClientConfig,
    replica: ClientReplica,
    surface: S,
    indicator: I,
    status: ConnectionStatus,
    backoff: Backoff,
}

impl<S: RenderSurface, I: StatusIndicator> CanvasClient<S, I> {
    pub fn new(config: ClientConfig, surface: S, indicator: I) -> Self {
        let backoff = Backoff::new(config.base_delay, config.max_attempts);
        Self {
            config,
            replica: ClientReplica::new(),
            surface,
            indicator,
            status: ConnectionStatus::Disconnected,
            backoff,
        }
    }

    /// Runs until the command channel closes (clean shutdown) or retries are
    /// exhausted (terminal error, surfaced to the caller).
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<ClientCommand>,
    ) -> Result<(), ClientError> {
        loop {
            self.set_status(ConnectionStatus::Connecting);
            match connect_async(self.config.url.as_str()).await {
                Ok((stream, _)) => {
                    log::info!("connected to {}", self.config.url);
                    self.backoff.reset();
                    self.set_status(ConnectionStatus::Connected);
                    let finished = self.drive(stream, &mut commands).await;
                    self.set_status(ConnectionStatus::Disconnected);
                    if finished {
                        return Ok(());
                    }
                }
                Err(e) => {
                    log::warn!("connect to {} failed: {}", self.config.url, e);
                    self.set_status(ConnectionStatus::Disconnected);
                }
            }

            match self.backoff.next_delay() {
                Some(delay) => {
                    log::info!("reconnecting in {:?} (attempt {})", delay, self.backoff.attempt());
                    tokio::time::sleep(delay).await;
                }
                None => {
                    self.set_status(ConnectionStatus::Failed);
                    log::error!("reconnection attempts exhausted");
                    return Err(ClientError::ReconnectExhausted);
                }
            }
        }
    }

    /// Pumps one connection until it drops. Returns true when the command
    /// channel closed, i.e. the embedding UI is shutting the client down.
    async fn drive(&mut self, stream: WsStream, commands: &mut mpsc::Receiver<ClientCommand>) -> bool {
        let (mut sink, mut source) = stream.split();

        loop {
            tokio::select! {
                inbound = source.next() => match inbound {
                    Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()),
                    Some(Ok(Message::Close(_))) | None => return false,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::warn!("websocket error: {}", e);
                        return false;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => {
                        let Some(message) = translate(&self.replica, command) else {
                            continue;
                        };
                        let json = serde_json::to_string(&message)
                            .expect("protocol messages serialize");
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            return false;
                        }
                    }
                    None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return true;
                    }
                },
            }
        }
    }

    fn handle_frame(&mut self, text: &str) {
        match serde_json::from_str::<ServerEvent>(text) {
            Ok(event) => self.replica.apply(event, &mut self.surface),
            Err(e) => log::warn!("unparseable frame: {}", e),
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        if self.status != status {
            log::debug!("connection status: {:?} -> {:?}", self.status, status);
            self.status = status;
            self.indicator
                .set_status(status == ConnectionStatus::Connected);
        }
    }
}

/// Resolves a local intent against the mirror. Returns `None` when there is
/// nothing to send (ending a stroke that never got its echo).
fn translate(replica: &ClientReplica, command: ClientCommand) -> Option<ClientMessage> {
    match command {
        ClientCommand::BeginStroke { x, y, color, width } => {
            Some(ClientMessage::StrokeBegin { x, y, color, width })
        }
        ClientCommand::MovePointer { x, y } => match replica.current_stroke() {
            Some(stroke_id) => Some(ClientMessage::StrokeContinue { stroke_id, x, y }),
            None => Some(ClientMessage::CursorUpdate { x, y }),
        },
        ClientCommand::EndStroke => replica
            .current_stroke()
            .map(|stroke_id| ClientMessage::StrokeEnd { stroke_id }),
        ClientCommand::ClearCanvas => Some(ClientMessage::CanvasClear {}),
        ClientCommand::PostChat { message } => Some(ClientMessage::ChatPost {
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }),
        ClientCommand::SetTyping(typing) => Some(ClientMessage::TypingState { typing }),
    }
}
