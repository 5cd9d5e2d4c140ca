//! Per-message dispatch — validates the envelope, chooses a path, and
//! normalizes the outcome into a response envelope.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, error, instrument, warn};

use crate::binder;
use crate::context::ConnectionContext;
use crate::envelope::{self, RequestEnvelope, ResponseEnvelope};
use crate::errors::{self, GatewayError};
use crate::gateway::{RouteOutcome, RouterGateway};
use crate::registry::HandlerRegistry;

/// Orchestrates codec, binder, gateway, and registry for each inbound
/// message. One dispatch runs at a time per connection; across connections
/// dispatches are independent.
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    gateway: RouterGateway,
}

impl Dispatcher {
    /// Dispatcher over the given registry and gateway.
    pub fn new(registry: Arc<HandlerRegistry>, gateway: RouterGateway) -> Self {
        Self { registry, gateway }
    }

    /// The handler registry used for fallback dispatch.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Handle one inbound text message.
    ///
    /// Returns the serialized response to send back, or `None` when the
    /// message produces no reply: unparseable text, a message without the
    /// protocol marker, or a fault that leaves nothing to correlate. The
    /// connection always survives.
    #[instrument(skip_all, fields(remote = %context.remote_addr, method))]
    pub async fn dispatch(&self, text: &str, context: &ConnectionContext) -> Option<String> {
        let request = match envelope::decode(text) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "dropping unparseable message");
                counter!("dispatch_dropped_total", "reason" => "malformed").increment(1);
                return None;
            }
        };

        // Some other consumer may care about non-protocol messages.
        if request.jsonrpc.is_none() {
            debug!("message has no protocol marker, ignoring");
            return None;
        }

        let body = self.dispatch_request(&request, context).await?;
        let response = envelope::build_response(&request, body);
        match envelope::encode(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                error!(error = %e, "failed to serialize response");
                None
            }
        }
    }

    /// Run the validated protocol message through one of the two paths and
    /// produce the response body, or `None` to drop the message.
    async fn dispatch_request(
        &self,
        request: &RequestEnvelope,
        context: &ConnectionContext,
    ) -> Option<ResponseEnvelope> {
        let Some(method) = request.method.as_deref().filter(|m| !m.is_empty()) else {
            counter!("dispatch_requests_total", "outcome" => "invalid").increment(1);
            return Some(envelope::error_body(errors::INVALID_REQUEST, "Invalid request"));
        };
        let _ = tracing::Span::current().record("method", method);

        let params = match &request.params {
            None => Vec::new(),
            Some(value) => match binder::bind(value) {
                Ok(params) => params,
                Err(e) => {
                    // Degraded, not fatal: the request proceeds unparameterized.
                    warn!(method, error = %e, "continuing with empty parameters");
                    Vec::new()
                }
            },
        };

        match self.gateway.forward(method, params, context).await {
            Ok(RouteOutcome::Resolved(payload)) => {
                counter!("dispatch_requests_total", "outcome" => "routed").increment(1);
                Some(envelope::result_body(payload))
            }
            Ok(RouteOutcome::Failed { status, body }) => {
                counter!("dispatch_requests_total", "outcome" => "route_failed").increment(1);
                Some(envelope::error_body(status, body))
            }
            Ok(RouteOutcome::Unresolved { status, body }) => {
                match self.registry.lookup(method) {
                    Some(handler) => {
                        debug!(method, "dispatching through handler registry");
                        counter!("dispatch_requests_total", "outcome" => "registry").increment(1);
                        Some(handler.handle(request).await)
                    }
                    None => {
                        counter!("dispatch_requests_total", "outcome" => "unresolved").increment(1);
                        Some(envelope::error_body(status, body))
                    }
                }
            }
            Err(GatewayError::Unavailable) => {
                error!(method, "routing subsystem unavailable, dropping message");
                counter!("dispatch_dropped_total", "reason" => "router_unavailable").increment(1);
                None
            }
            Err(e @ GatewayError::Timeout { .. }) => {
                error!(method, error = %e, "router call timed out");
                counter!("dispatch_requests_total", "outcome" => "route_timeout").increment(1);
                Some(envelope::error_body(errors::ROUTER_TIMEOUT, "Router timed out"))
            }
        }
    }
}
