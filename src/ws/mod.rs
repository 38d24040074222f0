//! WebSocket gateway: upgrade handler, outbound hub, wire protocol

pub mod handler;
pub mod hub;
pub mod protocol;
