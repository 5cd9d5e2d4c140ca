//! Per-connection identity and session context.

use std::collections::HashMap;

use serde_json::Value;

/// Session attribute under which the authenticated principal is stored.
pub const IDENTITY_ATTRIBUTE: &str = "principal";

/// Read-only snapshot of a connection's session attributes, captured when
/// the connection is established.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    attributes: HashMap<String, Value>,
}

impl SessionSnapshot {
    /// Snapshot over the given attributes.
    pub fn new(attributes: HashMap<String, Value>) -> Self {
        Self { attributes }
    }

    /// Snapshot with no attributes (unauthenticated connection).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Look up a session attribute.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The authenticated identity, if the session carries one.
    pub fn identity(&self) -> Option<&str> {
        self.attributes.get(IDENTITY_ATTRIBUTE)?.as_str()
    }
}

/// Per-connection context: remote address plus the session snapshot.
///
/// Owned by the connection's session task and read-only after
/// establishment; a copy rides along on every routed request.
#[derive(Clone, Debug)]
pub struct ConnectionContext {
    /// Remote peer address, for diagnostics.
    pub remote_addr: String,
    /// Session attributes captured at connect time.
    pub session: SessionSnapshot,
}

impl ConnectionContext {
    /// Context for a newly established connection.
    pub fn new(remote_addr: impl Into<String>, session: SessionSnapshot) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            session,
        }
    }

    /// The authenticated identity, if present in the session.
    pub fn identity(&self) -> Option<&str> {
        self.session.identity()
    }
}
