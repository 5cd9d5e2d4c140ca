//! # courier-server
//!
//! Axum WebSocket host for the `courier-rpc` dispatch core.
//!
//! - WebSocket gateway: upgrade handling, per-connection session loop,
//!   heartbeat, outbound send queue
//! - Connection lifecycle hooks: identity extraction, connect/disconnect
//!   bookkeeping
//! - HTTP endpoints: health check
//! - Messages on one connection are handled strictly in arrival order;
//!   connections run independently of each other

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod context;
pub mod health;
pub mod hooks;
pub mod server;
pub mod session;
