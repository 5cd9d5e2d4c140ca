//! Built-in handler capabilities.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::registry::RequestHandler;

/// Answers `greeting` with a fixed hello payload.
pub struct GreetingHandler;

#[async_trait]
impl RequestHandler for GreetingHandler {
    fn method(&self) -> &str {
        "greeting"
    }

    async fn handle(&self, _request: &RequestEnvelope) -> ResponseEnvelope {
        let mut body = Map::new();
        let _ = body.insert(
            "result".to_owned(),
            Value::String("Hello from the greeting handler!".to_owned()),
        );
        body
    }
}

/// The capabilities every process registers at startup.
pub fn builtin_capabilities() -> Vec<Arc<dyn RequestHandler>> {
    vec![Arc::new(GreetingHandler)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HandlerRegistry;
    use serde_json::json;

    #[test]
    fn builtin_set_registers_greeting() {
        let registry = HandlerRegistry::build(builtin_capabilities());
        assert!(registry.has_method("greeting"));
    }

    #[tokio::test]
    async fn greeting_returns_hello() {
        let request = RequestEnvelope {
            id: Some(json!(1)),
            jsonrpc: Some("2.0".into()),
            method: Some("greeting".into()),
            params: None,
        };
        let body = GreetingHandler.handle(&request).await;
        assert_eq!(body["result"], json!("Hello from the greeting handler!"));
    }
}
