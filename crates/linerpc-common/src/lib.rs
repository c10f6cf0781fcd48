//! linerpc Common Types, Dispatch and Framing
//!
//! This crate provides the transport-agnostic core of linerpc, a JSON-RPC
//! 2.0 server/client runtime for line-framed duplex streams.
//!
//! # Overview
//!
//! - **[`protocol`]**: JSON-RPC 2.0 wire types, the permissive inbound
//!   union shape with its classifier, the one-or-many batch container, and
//!   the process-level error type
//! - **[`dispatch`]**: the typed handler registry and the batch-aware
//!   dispatcher that routes method calls, notifications and inbound
//!   responses
//! - **[`transport`]**: newline-delimited message framing over any
//!   `AsyncRead`/`AsyncWrite` pair
//!
//! # Architecture
//!
//! Bytes flow as: frames → decoded batch → per-item classification → typed
//! handler → response assembly → batch encode → frames. The dispatcher is
//! purely sequential per batch; transports provide concurrency across
//! batches.
//!
//! # Example
//!
//! ```
//! use linerpc_common::dispatch::{CallContext, Dispatcher, HandlerError, MethodFn};
//! use linerpc_common::protocol::{Batch, UnionRequest};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct AddParams { a: i64, b: i64 }
//!
//! #[derive(Serialize)]
//! struct AddResult { sum: i64 }
//!
//! async fn add(_ctx: CallContext, p: AddParams) -> Result<AddResult, HandlerError> {
//!     Ok(AddResult { sum: p.a + p.b })
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let dispatcher = Dispatcher::builder()
//!     .method("add", MethodFn::new(add))
//!     .build();
//!
//! let input = Batch::<UnionRequest>::from_slice(
//!     br#"{"jsonrpc":"2.0","method":"add","params":{"a":2,"b":3},"id":1}"#,
//! ).unwrap();
//! let reply = dispatcher.dispatch(input).await.unwrap();
//! assert_eq!(
//!     reply.to_vec().unwrap(),
//!     br#"{"jsonrpc":"2.0","id":1,"result":{"sum":5}}"#
//! );
//! # }
//! ```

pub mod dispatch;
pub mod protocol;
pub mod transport;

pub use protocol::*;
