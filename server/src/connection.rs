use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use system::{ClientMessage, ServerEvent, SessionId};

use crate::connection_tx_storage::ConnectionTx;
use crate::server::ServerTx;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect { tx: ConnectionTx },
    Disconnect { from: SessionId },
    Message { from: SessionId, message: ClientMessage },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { session_id: SessionId },
    Event(ServerEvent),
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    Idle,
    Connected(SessionId),
}

pub struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
}

impl ConnectionActor {
    fn new(srv_tx: ServerTx) -> Self {
        Self {
            state: ConnectionState::Idle,
            srv_tx,
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(64);

        if self
            .srv_tx
            .try_send(ConnectionCommand::Connect { tx })
            .is_err()
        {
            log::error!("server task unavailable; refusing connection");
            ctx.stop();
            return;
        }

        let addr = ctx.address().recipient();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if addr.try_send(ConnectionActorMessage(event)).is_err() {
                    break;
                }
            }
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(id) = self.state {
            let _ = self.srv_tx.try_send(ConnectionCommand::Disconnect { from: id });
        }
        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => {
                let ConnectionState::Connected(from) = self.state else {
                    return;
                };
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => {
                        log::debug!("ingress {:?}", message);
                        if self
                            .srv_tx
                            .try_send(ConnectionCommand::Message { from, message })
                            .is_err()
                        {
                            log::warn!("server queue full; dropping message from {}", from);
                        }
                    }
                    // Malformed frames are logged and dropped; the
                    // connection stays open and nothing is broadcast.
                    Err(e) => log::warn!("unparseable frame from {}: {}", from, e),
                }
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                log::warn!("websocket protocol error: {}", e);
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0 {
            ConnectionEvent::Connected { session_id } => {
                self.state = ConnectionState::Connected(session_id);
            }
            ConnectionEvent::Event(event) => {
                log::debug!("egress {:?}", event);
                match serde_json::to_string(&event) {
                    Ok(json) => ctx.text(json),
                    Err(e) => log::error!("failed to serialize event: {}", e),
                }
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse, Error> {
    ws::start(ConnectionActor::new(srv_tx.get_ref().clone()), &req, stream)
}
