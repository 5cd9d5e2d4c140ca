//! WebSocket session — handles a single connected client from upgrade
//! through disconnect.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use courier_rpc::context::ConnectionContext;
use courier_rpc::dispatcher::Dispatcher;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::connection::ClientConnection;
use crate::hooks;

/// Run a WebSocket session for a connected client.
///
/// 1. Runs the connect hook and announces `connection.established`
/// 2. Dispatches incoming text frames through the protocol dispatcher,
///    strictly in arrival order — the next frame is not read until the
///    previous one has been answered (or deliberately dropped)
/// 3. Forwards outbound responses via the send channel
/// 4. Sends periodic Ping frames and disconnects unresponsive clients
/// 5. Runs the disconnect hook on teardown
#[instrument(skip_all, fields(client_id = %client_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    client_id: String,
    context: ConnectionContext,
    dispatcher: Arc<Dispatcher>,
    connections: Arc<AtomicUsize>,
    ping_interval: Duration,
    pong_timeout: Duration,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<String>(1024);
    let connection = Arc::new(ClientConnection::new(client_id.clone(), send_tx));

    let _ = connections.fetch_add(1, Ordering::Relaxed);
    hooks::on_connect(&client_id, &context);

    let established = serde_json::json!({
        "type": "connection.established",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "data": {
            "clientId": client_id,
        },
    });
    if let Ok(json) = serde_json::to_string(&established) {
        let _ = ws_tx.send(Message::Text(json.into())).await;
    }

    // Outbound forwarder with periodic Ping frames.
    let outbound_conn = connection.clone();
    let outbound = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ticker.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > pong_timeout
                    {
                        warn!("client unresponsive for {:?}, disconnecting", pong_timeout);
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Process incoming messages, one dispatch at a time.
    while let Some(Ok(msg)) = ws_rx.next().await {
        // Accept text from either Text or UTF-8 Binary frames.
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    Some(s.to_owned())
                } else {
                    info!(len = data.len(), "received non-UTF8 binary frame");
                    None
                }
            }
            Message::Close(_) => {
                info!("client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };

        let Some(text) = text else { continue };
        connection.mark_alive();

        // Sending is fire-and-forget: a full or closed queue is logged,
        // never retried, and never closes the connection.
        if let Some(response) = dispatcher.dispatch(&text, &context).await {
            if !connection.send(response) {
                warn!(
                    dropped = connection.drop_count(),
                    "failed to enqueue response (channel full or closed)"
                );
            }
        }
    }

    let _ = connections.fetch_sub(1, Ordering::Relaxed);
    hooks::on_disconnect(&client_id, &context, connection.age());
    outbound.abort();
}
