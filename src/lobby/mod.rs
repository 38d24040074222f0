//! Routing of client messages onto rooms

pub mod service;

pub use service::LobbyService;
