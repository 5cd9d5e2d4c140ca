//! End-to-end tests using a real WebSocket client against a booted server.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;

use courier_rpc::envelope::{RequestEnvelope, ResponseEnvelope};
use courier_rpc::gateway::{RouteReply, RouteService, RoutedRequest};
use courier_rpc::handlers::builtin_capabilities;
use courier_rpc::registry::{HandlerRegistry, RequestHandler};
use courier_server::config::ServerConfig;
use courier_server::context::HeaderIdentityProvider;
use courier_server::server::CourierServer;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Router with two scripted routes; everything else is a 404 miss.
struct ScriptedRouter;

#[async_trait]
impl RouteService for ScriptedRouter {
    async fn route(&self, request: &RoutedRequest) -> RouteReply {
        match request.path.as_str() {
            "/api/system.status" => RouteReply {
                status: 200,
                body: json!({
                    "up": true,
                    "identity": request.context.identity(),
                    "params": request.params,
                })
                .to_string(),
            },
            "/api/x" => RouteReply {
                status: 500,
                body: "boom".to_owned(),
            },
            _ => RouteReply {
                status: 404,
                body: "Not found".to_owned(),
            },
        }
    }
}

/// Registry fallback capability for the method the router misses.
struct GreetHandler;

#[async_trait]
impl RequestHandler for GreetHandler {
    fn method(&self) -> &str {
        "greet"
    }

    async fn handle(&self, _request: &RequestEnvelope) -> ResponseEnvelope {
        let mut body = Map::new();
        let _ = body.insert("result".to_owned(), json!("Hello"));
        body
    }
}

/// Boot a test server and return its base address.
async fn boot_server() -> std::net::SocketAddr {
    let mut capabilities = builtin_capabilities();
    capabilities.push(Arc::new(GreetHandler));
    let registry = HandlerRegistry::build(capabilities);

    let server = CourierServer::new(
        ServerConfig::default(), // port 0 = auto-assign
        registry,
        Some(Arc::new(ScriptedRouter)),
        Arc::new(HeaderIdentityProvider::new()),
    );

    let (addr, _handle) = server.listen().await.unwrap();
    addr
}

/// Connect as `alice` and consume the `connection.established` notice.
async fn connect(addr: std::net::SocketAddr) -> WsStream {
    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    let _ = request
        .headers_mut()
        .insert("x-authenticated-user", "alice".parse().unwrap());

    let (mut ws, _) = timeout(TIMEOUT, connect_async(request)).await.unwrap().unwrap();
    let established = next_json(&mut ws).await;
    assert_eq!(established["type"], "connection.established");
    ws
}

/// Read frames until the next text payload.
async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("transport error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_text(ws: &mut WsStream, text: &str) {
    timeout(TIMEOUT, ws.send(Message::Text(text.into())))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn established_notice_carries_client_id() {
    let addr = boot_server().await;
    let mut request = format!("ws://{addr}/ws").into_client_request().unwrap();
    let _ = request
        .headers_mut()
        .insert("x-authenticated-user", "alice".parse().unwrap());
    let (mut ws, _) = connect_async(request).await.unwrap();

    let established = next_json(&mut ws).await;
    assert_eq!(established["type"], "connection.established");
    assert!(established["data"]["clientId"]
        .as_str()
        .unwrap()
        .starts_with("conn_"));
}

#[tokio::test]
async fn router_miss_falls_back_to_registry() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"jsonrpc":"2.0","id":7,"method":"greet"}"#).await;
    let resp = next_json(&mut ws).await;

    assert_eq!(resp["id"], json!(7));
    assert_eq!(resp["jsonrpc"], json!("2.0"));
    assert_eq!(resp["result"], json!("Hello"));
}

#[tokio::test]
async fn routed_method_returns_result_with_identity() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(
        &mut ws,
        r#"{"jsonrpc":"2.0","id":1,"method":"system.status","params":{"verbose":true}}"#,
    )
    .await;
    let resp = next_json(&mut ws).await;

    assert_eq!(resp["result"]["up"], json!(true));
    // Identity from the upgrade headers rode along on the routed request.
    assert_eq!(resp["result"]["identity"], json!("alice"));
    assert_eq!(resp["result"]["params"], json!([["verbose", "true"]]));
}

#[tokio::test]
async fn router_failure_surfaces_status_and_body() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"jsonrpc":"2.0","id":2,"method":"x"}"#).await;
    let resp = next_json(&mut ws).await;

    assert_eq!(resp["error"]["code"], json!(500));
    assert_eq!(resp["error"]["message"], json!("boom"));
    assert_eq!(resp["id"], json!(2));
}

#[tokio::test]
async fn unknown_method_surfaces_router_miss() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"jsonrpc":"2.0","id":3,"method":"no.such"}"#).await;
    let resp = next_json(&mut ws).await;

    assert_eq!(resp["error"]["code"], json!(404));
    assert_eq!(resp["error"]["message"], json!("Not found"));
}

#[tokio::test]
async fn missing_method_yields_invalid_request() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"jsonrpc":"2.0","id":4}"#).await;
    let resp = next_json(&mut ws).await;

    assert_eq!(resp["error"]["code"], json!(400));
    assert_eq!(resp["error"]["message"], json!("Invalid request"));
    assert_eq!(resp["id"], json!(4));
}

#[tokio::test]
async fn malformed_text_gets_no_reply() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, "{not json").await;
    // The very next reply belongs to the follow-up request, proving the
    // malformed message produced zero outbound frames.
    send_text(&mut ws, r#"{"jsonrpc":"2.0","id":5,"method":"greet"}"#).await;
    let resp = next_json(&mut ws).await;
    assert_eq!(resp["id"], json!(5));
}

#[tokio::test]
async fn non_protocol_message_is_ignored() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"id":1,"method":"greet"}"#).await;
    send_text(&mut ws, r#"{"jsonrpc":"2.0","id":6,"method":"greet"}"#).await;
    let resp = next_json(&mut ws).await;
    assert_eq!(resp["id"], json!(6));
}

#[tokio::test]
async fn responses_arrive_in_request_order() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    for id in 1..=3 {
        send_text(
            &mut ws,
            &format!(r#"{{"jsonrpc":"2.0","id":{id},"method":"greet"}}"#),
        )
        .await;
    }
    for id in 1..=3 {
        let resp = next_json(&mut ws).await;
        assert_eq!(resp["id"], json!(id));
    }
}

#[tokio::test]
async fn builtin_greeting_handler_answers() {
    let addr = boot_server().await;
    let mut ws = connect(addr).await;

    send_text(&mut ws, r#"{"jsonrpc":"2.0","id":8,"method":"greeting"}"#).await;
    let resp = next_json(&mut ws).await;
    assert_eq!(resp["result"], json!("Hello from the greeting handler!"));
}

#[tokio::test]
async fn health_reports_live_connection() {
    let addr = boot_server().await;
    let _ws = connect(addr).await;

    let url = format!("http://{addr}/health");
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], json!(1));
}
