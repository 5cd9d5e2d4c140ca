//! Error taxonomy for the dispatch core.

use std::time::Duration;

// ── Wire-visible error codes ────────────────────────────────────────

/// Request envelope is missing a method (or the method is empty).
pub const INVALID_REQUEST: u16 = 400;
/// Router call exceeded the configured deadline.
pub const ROUTER_TIMEOUT: u16 = 504;

/// Message text could not be decoded into a request envelope.
///
/// There is no correlatable `id` in this case, so the message is logged
/// and dropped rather than answered.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Text is not well-formed JSON, or not a JSON object.
    #[error("malformed message: {source}")]
    Malformed {
        /// The underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

/// Parameter payload could not be bound.
#[derive(Debug, thiserror::Error)]
pub enum BindError {
    /// Params were present but not a named-parameter object.
    #[error("named parameters only, got {shape}")]
    UnsupportedShape {
        /// JSON shape of the rejected payload (e.g. `"array"`).
        shape: &'static str,
    },
}

/// Router gateway failure.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The routing subsystem is not wired into this process.
    #[error("routing subsystem is not available")]
    Unavailable,

    /// The router did not answer within the deadline.
    #[error("router call for '{method}' timed out after {timeout:?}")]
    Timeout {
        /// Method whose route call stalled.
        method: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },
}
