//! Session context providers — how a live connection yields its session
//! attributes and authenticated identity.

use std::collections::HashMap;

use axum::http::HeaderMap;
use courier_rpc::context::{SessionSnapshot, IDENTITY_ATTRIBUTE};
use serde_json::Value;

/// Collaborator that yields a read-only session snapshot for a connection
/// being established, given the upgrade request's headers.
pub trait SessionProvider: Send + Sync {
    /// Capture the session attributes for this connection.
    fn snapshot(&self, headers: &HeaderMap) -> SessionSnapshot;
}

/// Provider for deployments without an authentication layer: every
/// connection gets an empty, anonymous snapshot.
pub struct AnonymousProvider;

impl SessionProvider for AnonymousProvider {
    fn snapshot(&self, _headers: &HeaderMap) -> SessionSnapshot {
        SessionSnapshot::empty()
    }
}

/// Default header carrying the authenticated principal, as set by a
/// fronting auth proxy.
pub const IDENTITY_HEADER: &str = "x-authenticated-user";

/// Provider that trusts an upstream-injected identity header.
pub struct HeaderIdentityProvider {
    header: String,
}

impl HeaderIdentityProvider {
    /// Provider reading [`IDENTITY_HEADER`].
    pub fn new() -> Self {
        Self {
            header: IDENTITY_HEADER.to_owned(),
        }
    }

    /// Provider reading a custom header name.
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl Default for HeaderIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProvider for HeaderIdentityProvider {
    fn snapshot(&self, headers: &HeaderMap) -> SessionSnapshot {
        let Some(principal) = headers.get(&self.header).and_then(|v| v.to_str().ok()) else {
            return SessionSnapshot::empty();
        };
        let mut attributes = HashMap::new();
        let _ = attributes.insert(
            IDENTITY_ATTRIBUTE.to_owned(),
            Value::String(principal.to_owned()),
        );
        SessionSnapshot::new(attributes)
    }
}
