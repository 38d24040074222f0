//! Recoverable errors reported back to the originating connection

/// Errors raised while routing a client message
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("A room id is required to join")]
    RoomRequired,

    #[error("Room already has two players")]
    RoomFull,

    #[error("Unknown message type")]
    UnknownMessageType,

    #[error("Connection is not in a room")]
    NotInRoom,
}

impl GameError {
    /// Wire reason code sent in `error` messages
    pub fn reason(self) -> &'static str {
        match self {
            Self::RoomRequired => "room_required",
            Self::RoomFull => "room_full",
            Self::UnknownMessageType => "unknown_type",
            Self::NotInRoom => "not_in_room",
        }
    }

    /// Silent errors are logged but never sent to the client
    pub fn is_silent(self) -> bool {
        matches!(self, Self::NotInRoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_match_wire_format() {
        assert_eq!(GameError::RoomRequired.reason(), "room_required");
        assert_eq!(GameError::RoomFull.reason(), "room_full");
        assert_eq!(GameError::UnknownMessageType.reason(), "unknown_type");
        assert!(GameError::NotInRoom.is_silent());
        assert!(!GameError::RoomFull.is_silent());
    }
}
