//! Lobby service - seats connections in rooms and relays their messages

use std::sync::Arc;

use serde_json::Number;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::game::player::DEFAULT_NAME;
use crate::game::{ConnectionId, GameError, InputPatch, RoomId, RoomRegistry, Slot};
use crate::util::time::{iso_timestamp, unix_millis};
use crate::ws::hub::ConnectionHub;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Lobby service
pub struct LobbyService {
    registry: Arc<RoomRegistry>,
    hub: Arc<ConnectionHub>,
}

impl LobbyService {
    pub fn new(registry: Arc<RoomRegistry>, hub: Arc<ConnectionHub>) -> Self {
        Self { registry, hub }
    }

    /// Register a new connection and greet it
    /// Returns the receiving end of its outbound queue
    pub fn connect(&self, connection: ConnectionId) -> mpsc::Receiver<ServerMsg> {
        let rx = self.hub.open(connection);
        self.hub.send(connection, ServerMsg::Hello { ts: iso_timestamp() });
        info!(connection_id = %connection, connections = self.hub.len(), "Connection opened");
        rx
    }

    /// Leave any room and drop the outbound queue
    pub fn disconnect(&self, connection: ConnectionId) {
        self.leave(connection);
        self.hub.unregister(connection);
        info!(connection_id = %connection, connections = self.hub.len(), "Connection closed");
    }

    /// Handle one decoded client message
    pub fn handle(&self, connection: ConnectionId, msg: ClientMsg) {
        let result = match msg {
            ClientMsg::Join { room, name } => self.join(connection, &room, name.as_deref()),
            ClientMsg::Input { pressed } => self.input(connection, &pressed),
            ClientMsg::Leave => self.leave(connection).map(|_| ()).ok_or(GameError::NotInRoom),
            ClientMsg::Ping { ts } => {
                self.pong(connection, ts);
                Ok(())
            }
            ClientMsg::Unknown => Err(GameError::UnknownMessageType),
        };

        if let Err(err) = result {
            debug!(connection_id = %connection, error = %err, "Client message rejected");
            if !err.is_silent() {
                self.hub.send(connection, err.into());
            }
        }
    }

    fn join(&self, connection: ConnectionId, room: &str, name: Option<&str>) -> Result<(), GameError> {
        let room = room.trim();
        if room.is_empty() {
            return Err(GameError::RoomRequired);
        }
        let room_id = RoomId::from(room);
        let name = name.unwrap_or(DEFAULT_NAME);

        let previous = self.registry.room_of(connection);
        let already_seated = previous.as_ref() == Some(&room_id);

        // A full target room leaves the current seat untouched
        let (room, slot) = self.registry.join(&room_id, connection, name)?;

        if let Some(previous) = previous.filter(|previous| *previous != room_id) {
            if let Some((old_room, freed)) = self.registry.vacate(&previous, connection) {
                self.hub
                    .broadcast(&old_room.connections(), &ServerMsg::PeerLeft { slot: freed });
            }
        }

        self.hub.send(
            connection,
            ServerMsg::Joined {
                room: room_id.to_string(),
                slot,
            },
        );

        if !already_seated {
            let peers: Vec<_> = room
                .connections()
                .into_iter()
                .filter(|peer| *peer != connection)
                .collect();
            self.hub.broadcast(
                &peers,
                &ServerMsg::PeerJoined {
                    name: name.to_string(),
                    slot,
                },
            );
        }

        Ok(())
    }

    fn input(&self, connection: ConnectionId, pressed: &InputPatch) -> Result<(), GameError> {
        let room = self
            .registry
            .room_of(connection)
            .and_then(|id| self.registry.get(&id))
            .ok_or(GameError::NotInRoom)?;
        room.update_input(connection, pressed);
        Ok(())
    }

    /// Vacate the connection's seat and tell whoever is left
    fn leave(&self, connection: ConnectionId) -> Option<Slot> {
        let (room, slot) = self.registry.leave(connection)?;
        self.hub
            .broadcast(&room.connections(), &ServerMsg::PeerLeft { slot });
        Some(slot)
    }

    fn pong(&self, connection: ConnectionId, ts: Option<Number>) {
        debug!(connection_id = %connection, "Ping");
        self.hub.send(
            connection,
            ServerMsg::Pong {
                ts,
                server_ts: unix_millis(),
            },
        );
    }
}
