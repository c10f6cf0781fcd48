//! linerpc Protocol Definitions
//!
//! This module defines the JSON-RPC 2.0 wire types and the batch container
//! used throughout the system.
//!
//! # Protocol Types
//!
//! - **[`Request`]** / **[`Notification`]** / **[`Response`]**: the three
//!   typed message shapes, parameterized over their payloads
//! - **[`UnionRequest`]**: permissive decode target that records field
//!   presence so [`UnionRequest::classify`] can sort inbound messages
//! - **[`Batch`]**: a single message or an array of them, preserving the
//!   distinction across decode and encode
//! - **[`ErrorObject`]**: the wire error carried inside responses
//! - **[`LinerpcError`]**: process-level errors that never reach the wire
//!
//! # Id Semantics
//!
//! A [`RequestId`] is exactly an integer or a string. Method calls always
//! carry one, notifications never do, and responses carry the caller's id or
//! JSON `null` when the inbound id could not be parsed.
//!
//! # Example
//!
//! ```
//! use linerpc_common::protocol::{Batch, Request, RequestId, Response};
//! use serde_json::json;
//!
//! let request = Request::new(1, "add", Some(json!({"a": 2, "b": 3})));
//! let wire = Batch::single(request).to_vec().unwrap();
//!
//! let reply: Response<serde_json::Value> =
//!     Response::success(RequestId::Number(1), json!({"sum": 5}));
//! ```

pub mod batch;
pub mod error;
pub mod jsonrpc;

#[cfg(test)]
mod tests;

pub use batch::Batch;
pub use error::{LinerpcError, Result};
pub use jsonrpc::{
    default_error_message, ErrorObject, MessageKind, Notification, Request, RequestId, Response,
    UnionRequest, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR,
};
