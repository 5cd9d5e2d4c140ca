//! Health check endpoint payload.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Response body for `GET /health`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process is serving.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Currently connected WebSocket clients.
    pub connections: usize,
}

/// Build the health payload.
pub fn health_check(start_time: Instant, connections: usize) -> HealthResponse {
    HealthResponse {
        status: "ok".to_owned(),
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), 0);
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.connections, 0);
    }

    #[test]
    fn reports_connection_count() {
        let resp = health_check(Instant::now(), 3);
        assert_eq!(resp.connections, 3);
    }

    #[test]
    fn serializes_expected_fields() {
        let resp = health_check(Instant::now(), 1);
        let v: serde_json::Value = serde_json::to_value(&resp).unwrap();
        assert!(v.get("status").is_some());
        assert!(v.get("uptime_secs").is_some());
        assert!(v.get("connections").is_some());
    }
}
