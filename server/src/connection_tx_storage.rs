use std::collections::HashMap;

use crate::connection::ConnectionEvent;
use system::SessionId;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

/// Outbound half of every live connection, keyed by session id.
pub struct ConnectionTxStorage {
    connection_txs: HashMap<SessionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, session_id: SessionId, tx: ConnectionTx) {
        self.connection_txs.insert(session_id, tx);
    }

    /// Best-effort delivery: a full or closed buffer loses the event for
    /// this session only. The session catches up from the snapshot at its
    /// next connection; the single-writer loop never blocks on a receiver.
    pub fn send(&mut self, to: &SessionId, event: ConnectionEvent) {
        if let Some(tx) = self.connection_txs.get(to) {
            if let Err(e) = tx.try_send(event) {
                log::warn!("dropping event for session {}: {}", to, e);
            }
        }
    }

    pub fn remove(&mut self, session_id: &SessionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(session_id)
    }
}

impl Default for ConnectionTxStorage {
    fn default() -> Self {
        Self::new()
    }
}
