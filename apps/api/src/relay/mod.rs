//! Upload relay: inbound multipart → policy check → backend → response relay.

pub mod backend;
pub mod handlers;
