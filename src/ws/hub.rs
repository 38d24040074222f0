//! Outbound message routing to live connections

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::game::ConnectionId;
use crate::ws::protocol::ServerMsg;

/// Outbound queue depth per connection
pub const OUTBOUND_BUFFER: usize = 64;

/// Sending half of a connection's outbound queue
pub type Outbound = mpsc::Sender<ServerMsg>;

/// Best-effort delivery to connections by id
///
/// Sends never wait: a full or closed queue drops the message so one slow
/// client cannot stall a tick.
pub struct ConnectionHub {
    senders: DashMap<ConnectionId, Outbound>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
        }
    }

    /// Create and register an outbound queue for a new connection
    pub fn open(&self, connection: ConnectionId) -> mpsc::Receiver<ServerMsg> {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);
        self.register(connection, tx);
        rx
    }

    pub fn register(&self, connection: ConnectionId, tx: Outbound) {
        self.senders.insert(connection, tx);
    }

    pub fn unregister(&self, connection: ConnectionId) {
        self.senders.remove(&connection);
    }

    /// Queue a message for one connection; returns false if it was dropped
    pub fn send(&self, connection: ConnectionId, msg: ServerMsg) -> bool {
        let Some(tx) = self.senders.get(&connection).map(|tx| tx.value().clone()) else {
            debug!(connection_id = %connection, "Send to unknown connection dropped");
            return false;
        };

        match tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!(connection_id = %connection, "Outbound queue full, message dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(connection_id = %connection, "Outbound queue closed, message dropped");
                false
            }
        }
    }

    /// Send the same message to several connections
    pub fn broadcast(&self, connections: &[ConnectionId], msg: &ServerMsg) -> usize {
        connections
            .iter()
            .filter(|connection| self.send(**connection, msg.clone()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new()
    }
}
