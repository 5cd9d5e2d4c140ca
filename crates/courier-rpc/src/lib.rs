//! # courier-rpc
//!
//! The dispatch core that bridges a persistent text-message connection to a
//! request/response model. Each inbound text frame is decoded as a
//! JSON-RPC-shaped envelope, resolved to either the external router or an
//! in-process handler, and answered with a correlated response envelope.
//!
//! - Envelope codec: decode raw text, build/encode response envelopes
//! - Parameter binder: named-parameter object → string parameter pairs
//! - Handler registry: immutable method → capability map (fallback path)
//! - Router gateway: synthesized request to the external routing subsystem
//! - Dispatcher: the per-message state machine tying the above together
//!
//! Transport (WebSocket framing, upgrade, heartbeat) lives in
//! `courier-server`; this crate is pure protocol logic.

#![deny(unsafe_code)]

pub mod binder;
pub mod context;
pub mod dispatcher;
pub mod envelope;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod registry;
