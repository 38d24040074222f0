//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::game::{GameError, InputPatch, Slot, StateSnapshot};

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Take a seat in a room, creating it if needed
    Join {
        #[serde(default)]
        room: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },

    /// Partial button state update
    Input {
        #[serde(default)]
        pressed: InputPatch,
    },

    /// Leave the current room
    Leave,

    /// Latency probe
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<Number>,
    },

    /// Anything with an unrecognised or missing type
    #[serde(other)]
    Unknown,
}

impl ClientMsg {
    /// Wire names of the message types the server understands
    pub const KNOWN_TYPES: [&'static str; 4] = ["join", "input", "leave", "ping"];

    /// Decode a text frame
    ///
    /// An unrecognised or missing `type` becomes `Unknown`. A known type
    /// with badly typed fields is `Malformed`, text that is not JSON is
    /// `Syntax`.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        match serde_json::from_str(text) {
            Ok(msg) => Ok(msg),
            Err(e) if e.is_data() => match Self::type_of(text) {
                Some(kind) if Self::KNOWN_TYPES.contains(&kind.as_str()) => {
                    Err(DecodeError::Malformed { kind, source: e })
                }
                _ => Ok(Self::Unknown),
            },
            Err(e) => Err(DecodeError::Syntax(e)),
        }
    }

    fn type_of(text: &str) -> Option<String> {
        let value: Value = serde_json::from_str(text).ok()?;
        value.get("type")?.as_str().map(str::to_string)
    }
}

/// Frame that could not be turned into a `ClientMsg`
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("malformed {kind} message: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Greeting sent right after the upgrade
    Hello {
        /// ISO-8601 server time
        ts: String,
    },

    /// Confirmation of a join
    Joined { room: String, slot: Slot },

    /// The other seat was taken
    PeerJoined { name: String, slot: Slot },

    /// The other seat was vacated
    PeerLeft { slot: Slot },

    /// Room state, once per tick
    State(StateSnapshot),

    /// Pong response
    Pong {
        /// Echo of the client timestamp, if it sent one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<Number>,
        #[serde(rename = "serverTs")]
        server_ts: u64,
    },

    /// Error message
    Error { reason: String },
}

impl From<GameError> for ServerMsg {
    fn from(err: GameError) -> Self {
        Self::Error {
            reason: err.reason().to_string(),
        }
    }
}
