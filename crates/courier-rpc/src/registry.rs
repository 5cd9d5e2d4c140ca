//! In-process handler registry — the fallback dispatch path.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::envelope::{RequestEnvelope, ResponseEnvelope};

/// Trait implemented by every in-process request handler capability.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// The method name this capability answers to. This declared identity
    /// is the registration key, not the implementing type's name.
    fn method(&self) -> &str;

    /// Execute the handler against the original decoded request envelope.
    ///
    /// The returned object becomes the full response body — handlers supply
    /// their own shape, e.g. `{"result": ...}`.
    async fn handle(&self, request: &RequestEnvelope) -> ResponseEnvelope;
}

/// Immutable mapping from method name to handler capability.
///
/// Built once at process startup by enumerating the available capabilities;
/// never mutated afterward, so concurrent reads need no locking.
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
}

impl HandlerRegistry {
    /// Assemble the registry from the given capabilities, keyed by each
    /// capability's declared method name. A duplicate declaration replaces
    /// the earlier one and is logged.
    pub fn build(capabilities: impl IntoIterator<Item = Arc<dyn RequestHandler>>) -> Self {
        let mut handlers: HashMap<String, Arc<dyn RequestHandler>> = HashMap::new();
        for capability in capabilities {
            let method = capability.method().to_owned();
            if handlers.insert(method.clone(), capability).is_some() {
                warn!(method, "duplicate handler declaration, keeping the later one");
            }
        }
        Self { handlers }
    }

    /// Registry with no capabilities.
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Look up the capability for a method.
    pub fn lookup(&self, method: &str) -> Option<&Arc<dyn RequestHandler>> {
        self.handlers.get(method)
    }

    /// Check whether a method is registered.
    pub fn has_method(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// All registered method names (sorted).
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry holds no capabilities.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
