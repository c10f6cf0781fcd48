//! JSON-RPC 2.0 Wire Types
//!
//! This module implements the JSON-RPC 2.0 specification types used
//! throughout linerpc.
//!
//! # JSON-RPC 2.0 Compliance
//!
//! - JSON-RPC version: "2.0"
//! - Request format: `{"jsonrpc": "2.0", "method": "...", "params": ..., "id": ...}`
//! - Notification format: `{"jsonrpc": "2.0", "method": "...", "params": ...}` (no id)
//! - Response format: `{"jsonrpc": "2.0", "result": ..., "id": ...}` or
//!   `{"jsonrpc": "2.0", "error": {...}, "id": ...}`
//! - Error format: `{"code": ..., "message": "...", "data": ...}`
//!
//! # Inbound classification
//!
//! Incoming messages are first decoded into the permissive [`UnionRequest`]
//! shape, which records which fields were present. [`UnionRequest::classify`]
//! then sorts each message into one of the three [`MessageKind`]s or rejects
//! it with a wire [`ErrorObject`].
//!
//! # Error Codes
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32700`: Parse error
//! - `-32600`: Invalid request
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error
//!
//! Application-defined codes outside the reserved band pass through
//! untouched.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version tag. The only accepted value.
pub const JSONRPC_VERSION: &str = "2.0";

// Standard JSON-RPC 2.0 error codes
/// Invalid JSON was received by the server
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid Request object
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist / is not available
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameter(s)
pub const INVALID_PARAMS: i64 = -32602;
/// Internal JSON-RPC error
pub const INTERNAL_ERROR: i64 = -32603;

/// Returns the canonical description for a reserved error code, or an empty
/// string for application-defined codes.
pub fn default_error_message(code: i64) -> &'static str {
    match code {
        PARSE_ERROR => "An error occurred on the server while parsing JSON object",
        INVALID_REQUEST => "The JSON sent is not a valid Request object",
        METHOD_NOT_FOUND => "The method does not exist / is not available",
        INVALID_PARAMS => "Invalid method parameter(s)",
        INTERNAL_ERROR => "Internal JSON-RPC error",
        _ => "",
    }
}

/// A request identifier: exactly an integer or a string, never anything else.
///
/// Decoding rejects null, booleans, fractional numbers, arrays and objects.
/// Equality and hashing follow variant plus value; an integer id never
/// equals a string id, even when the digits match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

impl RequestId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for RequestId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            RequestId::Number(n) => serializer.serialize_i64(*n),
            RequestId::String(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = RequestId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(RequestId::Number(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                i64::try_from(v)
                    .map(RequestId::Number)
                    .map_err(|_| E::custom(format!("request id {} out of range", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(RequestId::String(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(RequestId::String(v))
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// A JSON-RPC error object carried inside a response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorObject {
    /// Error code (reserved codes are negative integers)
    pub code: i64,
    /// Short description of the error
    pub message: String,
    /// Additional data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Create a parse error (-32700) with detail appended to the canonical
    /// description.
    pub fn parse_error(detail: &str) -> Self {
        Self::reserved(PARSE_ERROR, detail)
    }

    /// Create an invalid request error (-32600).
    pub fn invalid_request(detail: &str) -> Self {
        Self::reserved(INVALID_REQUEST, detail)
    }

    /// Create a method not found error (-32601).
    pub fn method_not_found(detail: &str) -> Self {
        Self::reserved(METHOD_NOT_FOUND, detail)
    }

    /// Create an invalid params error (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::reserved(INVALID_PARAMS, detail)
    }

    /// Create an internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::reserved(INTERNAL_ERROR, detail)
    }

    fn reserved(code: i64, detail: &str) -> Self {
        Self {
            code,
            message: format!("{}: {}", default_error_message(code), detail),
            data: None,
        }
    }
}

impl fmt::Display for ErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(default_error_message(self.code))
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for ErrorObject {}

/// A JSON-RPC method call. Always carries an id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request<P> {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Request identifier, echoed back in the matching response
    pub id: RequestId,
    /// Name of the method to invoke
    pub method: String,
    /// Method parameters, absent for parameterless calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
}

impl<P> Request<P> {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>, params: Option<P>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params,
        }
    }
}

/// A one-way request-shaped message. Must not carry an id; the server never
/// replies to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification<P> {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Name of the method to invoke
    pub method: String,
    /// Notification parameters, absent when there are none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<P>,
}

impl<P> Notification<P> {
    pub fn new(method: impl Into<String>, params: Option<P>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// A reply to a method call, carrying exactly one of `result` or `error`.
///
/// `id` is `None` only when the server could not recover an id from the
/// inbound bytes; it then encodes as JSON `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response<R> {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,
    /// Request identifier this response answers, null when unrecoverable
    pub id: Option<RequestId>,
    /// Success payload (absent on error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<R>,
    /// Error payload (absent on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl<R> Response<R> {
    /// Create a success response.
    pub fn success(id: RequestId, result: R) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response. `id` is `None` when the request id could
    /// not be parsed.
    pub fn error(id: Option<RequestId>, error: ErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// The three inbound message flavors a peer can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// A method call expecting a response
    Method,
    /// A one-way notification
    Notification,
    /// A response to a call this side made earlier
    Response,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Method => f.write_str("method"),
            MessageKind::Notification => f.write_str("notification"),
            MessageKind::Response => f.write_str("response"),
        }
    }
}

/// Deserializes a field that was present, wrapping it in `Some` even when its
/// value is JSON `null`. Combined with `#[serde(default)]` this tells absent
/// fields (`None`) apart from explicit nulls (`Some(Value::Null)`).
fn some_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Permissive decode target for a single element of an incoming batch.
///
/// Requests, notifications and responses all decode into this shape; only
/// [`classify`](Self::classify) decides which one actually arrived. `params`
/// and `result` record presence, so `{"result": null, "id": 1}` is a
/// well-formed response with a null result, not a message without one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UnionRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, deserialize_with = "some_value", skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, deserialize_with = "some_value", skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl UnionRequest {
    /// Sort this message into one of the three [`MessageKind`]s, or reject
    /// it with the wire error the peer should see.
    ///
    /// The rules are evaluated in order: version tag first, then the
    /// method-bearing shapes, then the response shapes.
    pub fn classify(&self) -> Result<MessageKind, ErrorObject> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(ErrorObject::invalid_request(&format!(
                "Invalid JSON-RPC version: '{}'",
                self.jsonrpc
            )));
        }

        if self.method.is_some() {
            if self.result.is_some() || self.error.is_some() {
                return Err(ErrorObject::invalid_request(
                    "Invalid message: 'method' cannot coexist with 'result' or 'error'",
                ));
            }
            if self.id.is_some() {
                return Ok(MessageKind::Method);
            }
            return Ok(MessageKind::Notification);
        }

        if self.result.is_some() || self.error.is_some() {
            if self.result.is_some() && self.error.is_some() {
                return Err(ErrorObject::internal_error(
                    "Invalid message: 'result' and 'error' cannot coexist",
                ));
            }
            if self.id.is_some() {
                return Ok(MessageKind::Response);
            }
            return Err(ErrorObject::internal_error("Invalid response: missing 'id'"));
        }

        Err(ErrorObject::invalid_request(
            "Unknown message type: missing both 'method' and 'result'/'error'",
        ))
    }
}
