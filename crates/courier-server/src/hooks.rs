//! Connection lifecycle hooks — connect/disconnect bookkeeping.

use std::time::Duration;

use courier_rpc::context::ConnectionContext;
use metrics::{counter, gauge, histogram};
use tracing::info;

/// Record an established connection: log the remote address and the
/// authenticated identity taken from the session snapshot.
pub fn on_connect(client_id: &str, context: &ConnectionContext) {
    info!(
        client_id,
        remote = %context.remote_addr,
        identity = context.identity().unwrap_or("anonymous"),
        "client connected"
    );
    counter!("ws_connections_total").increment(1);
    gauge!("ws_connections_active").increment(1.0);
}

/// Record a closed connection and how long it lived.
pub fn on_disconnect(client_id: &str, context: &ConnectionContext, connected_for: Duration) {
    info!(
        client_id,
        remote = %context.remote_addr,
        identity = context.identity().unwrap_or("anonymous"),
        connected_secs = connected_for.as_secs(),
        "client disconnected"
    );
    counter!("ws_disconnections_total").increment(1);
    gauge!("ws_connections_active").decrement(1.0);
    histogram!("ws_connection_duration_seconds").record(connected_for.as_secs_f64());
}
