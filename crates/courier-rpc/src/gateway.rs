//! Router gateway — the primary dispatch path through the external
//! routing/dispatch subsystem.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::binder::BoundParams;
use crate::context::ConnectionContext;
use crate::errors::GatewayError;

/// Status a route reply uses to signal success.
pub const STATUS_OK: u16 = 200;
/// Status reserved to mean "no route for this method" — the explicit
/// fallback signal that sends the dispatcher to the handler registry.
pub const STATUS_UNRESOLVED: u16 = 404;

/// Default deadline for a single route call. A stalled external call must
/// not block the connection's message queue indefinitely.
const DEFAULT_ROUTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Ephemeral request synthesized for the routing subsystem — created per
/// message and discarded once the router replies.
#[derive(Clone, Debug)]
pub struct RoutedRequest {
    /// Synthetic path derived from the method (`/api/<method>`).
    pub path: String,
    /// String parameters produced by the binder.
    pub params: BoundParams,
    /// Identity and session context copied from the live connection.
    pub context: ConnectionContext,
}

/// Reply from the routing subsystem.
#[derive(Clone, Debug)]
pub struct RouteReply {
    /// Outcome status.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

/// The external routing/dispatch subsystem the core depends on but does
/// not implement.
#[async_trait]
pub trait RouteService: Send + Sync {
    /// Resolve and execute the routed request.
    async fn route(&self, request: &RoutedRequest) -> RouteReply;
}

/// Interpreted outcome of a route call.
#[derive(Clone, Debug)]
pub enum RouteOutcome {
    /// Router handled the method; the payload becomes the response result.
    Resolved(Value),
    /// Router has no route for the method — fall back to the registry.
    Unresolved {
        /// The reserved unresolved status, surfaced if the registry also
        /// misses.
        status: u16,
        /// Router body accompanying the miss.
        body: String,
    },
    /// Router failed with some other status.
    Failed {
        /// Failure status, surfaced as the error code.
        status: u16,
        /// Failure body, surfaced as the error message.
        body: String,
    },
}

/// Gateway wrapping the (possibly absent) routing subsystem.
pub struct RouterGateway {
    service: Option<Arc<dyn RouteService>>,
    timeout: Duration,
}

impl RouterGateway {
    /// Gateway over a wired routing subsystem.
    pub fn new(service: Arc<dyn RouteService>) -> Self {
        Self {
            service: Some(service),
            timeout: DEFAULT_ROUTE_TIMEOUT,
        }
    }

    /// Gateway for a process without a routing subsystem. Every forward
    /// fails with [`GatewayError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            service: None,
            timeout: DEFAULT_ROUTE_TIMEOUT,
        }
    }

    /// Override the route call deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Synthesize a routed request for `method` and forward it.
    pub async fn forward(
        &self,
        method: &str,
        params: BoundParams,
        context: &ConnectionContext,
    ) -> Result<RouteOutcome, GatewayError> {
        let Some(service) = &self.service else {
            return Err(GatewayError::Unavailable);
        };

        let request = RoutedRequest {
            path: format!("/api/{method}"),
            params,
            context: context.clone(),
        };

        let reply = tokio::time::timeout(self.timeout, service.route(&request))
            .await
            .map_err(|_| GatewayError::Timeout {
                method: method.to_owned(),
                timeout: self.timeout,
            })?;

        Ok(match reply.status {
            STATUS_OK => RouteOutcome::Resolved(parse_payload(reply.body)),
            STATUS_UNRESOLVED => {
                debug!(method, "router has no route, falling back to registry");
                RouteOutcome::Unresolved {
                    status: STATUS_UNRESOLVED,
                    body: reply.body,
                }
            }
            status => RouteOutcome::Failed {
                status,
                body: reply.body,
            },
        })
    }
}

/// Parse a successful route body as JSON; a body that is not valid JSON is
/// carried as a plain string payload.
fn parse_payload(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}
