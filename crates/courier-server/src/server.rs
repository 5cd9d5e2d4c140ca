//! `CourierServer` — axum HTTP + WebSocket server wiring.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use courier_rpc::context::ConnectionContext;
use courier_rpc::dispatcher::Dispatcher;
use courier_rpc::gateway::{RouteService, RouterGateway};
use courier_rpc::registry::HandlerRegistry;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::context::SessionProvider;
use crate::health::{self, HealthResponse};
use crate::session::run_ws_session;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Protocol dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Session context provider consulted at upgrade time.
    pub provider: Arc<dyn SessionProvider>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Currently connected clients.
    pub connections: Arc<AtomicUsize>,
    /// When the server started.
    pub start_time: Instant,
}

/// The courier server: owns the dispatcher and serves `/ws` and `/health`.
pub struct CourierServer {
    state: AppState,
}

impl CourierServer {
    /// Assemble a server from its collaborators.
    ///
    /// `router` is the external routing subsystem; pass `None` for a
    /// process without one (router-path messages are then dropped with a
    /// diagnostic, per the gateway contract).
    pub fn new(
        config: ServerConfig,
        registry: HandlerRegistry,
        router: Option<Arc<dyn RouteService>>,
        provider: Arc<dyn SessionProvider>,
    ) -> Self {
        let gateway = match router {
            Some(service) => RouterGateway::new(service),
            None => RouterGateway::unavailable(),
        }
        .with_timeout(Duration::from_secs(config.route_timeout_secs));

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry), gateway));
        let state = AppState {
            dispatcher,
            provider,
            config: Arc::new(config),
            connections: Arc::new(AtomicUsize::new(0)),
            start_time: Instant::now(),
        };
        Self { state }
    }

    /// Build the axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .with_state(self.state.clone())
            .layer(CorsLayer::permissive())
    }

    /// Bind the configured address and serve. Returns the bound address
    /// and the serve task's handle.
    pub async fn listen(
        &self,
    ) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
        let listener = tokio::net::TcpListener::bind((
            self.state.config.host.as_str(),
            self.state.config.port,
        ))
        .await?;
        let addr = listener.local_addr()?;
        let app = self.router();

        tracing::info!(%addr, "courier server started");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await;
        });

        Ok((addr, handle))
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// The protocol dispatcher.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.state.dispatcher
    }

    /// Currently connected clients.
    pub fn connection_count(&self) -> usize {
        self.state.connections.load(Ordering::Relaxed)
    }
}

/// GET /ws — upgrade to a WebSocket session.
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let snapshot = state.provider.snapshot(&headers);
    let context = ConnectionContext::new(remote.to_string(), snapshot);
    let client_id = format!("conn_{}", Uuid::now_v7());

    let ping_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let pong_timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);

    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| {
            run_ws_session(
                socket,
                client_id,
                context,
                state.dispatcher,
                state.connections,
                ping_interval,
                pong_timeout,
            )
        })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.connections.load(Ordering::Relaxed);
    Json(health::health_check(state.start_time, connections))
}
