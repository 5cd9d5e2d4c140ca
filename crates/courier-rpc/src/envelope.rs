//! Wire envelope codec: request decoding and response construction.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::CodecError;

/// Decoded inbound request envelope. Every field is optional on the wire;
/// the dispatcher branches on presence rather than walking a JSON tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Opaque correlation value, echoed verbatim into the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Protocol marker. Messages without it are not for this system.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    /// Method to invoke.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Named parameters, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// Response envelope under construction — a flat JSON object.
pub type ResponseEnvelope = Map<String, Value>;

/// Decode raw message text into a request envelope.
///
/// Fails with [`CodecError::Malformed`] when the text is not a well-formed
/// JSON object. Pure; no side effects.
pub fn decode(text: &str) -> Result<RequestEnvelope, CodecError> {
    serde_json::from_str(text).map_err(|source| CodecError::Malformed { source })
}

/// Serialize a response envelope back into message text.
pub fn encode(envelope: &ResponseEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}

/// Build the outbound envelope for a request.
///
/// `id` and `jsonrpc` are copied verbatim from the request when present —
/// absence means absence, never a synthesized default. The computed body is
/// merged afterward, so a body key named `id` or `jsonrpc` overrides the
/// correlation fields; handlers should avoid those keys.
pub fn build_response(request: &RequestEnvelope, body: ResponseEnvelope) -> ResponseEnvelope {
    let mut envelope = Map::new();
    if let Some(id) = &request.id {
        let _ = envelope.insert("id".to_owned(), id.clone());
    }
    if let Some(version) = &request.jsonrpc {
        let _ = envelope.insert("jsonrpc".to_owned(), Value::String(version.clone()));
    }
    envelope.extend(body);
    envelope
}

/// Body carrying a successful result payload.
pub fn result_body(payload: Value) -> ResponseEnvelope {
    let mut body = Map::new();
    let _ = body.insert("result".to_owned(), payload);
    body
}

/// Body carrying an error with a numeric code and human-readable message.
///
/// No stack traces or internal identifiers belong in here.
pub fn error_body(code: u16, message: impl Into<String>) -> ResponseEnvelope {
    let mut error = Map::new();
    let _ = error.insert("code".to_owned(), Value::from(code));
    let _ = error.insert("message".to_owned(), Value::String(message.into()));
    let mut body = Map::new();
    let _ = body.insert("error".to_owned(), Value::Object(error));
    body
}
