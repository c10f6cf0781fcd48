//! linerpc Framed Server
//!
//! Serves a JSON-RPC 2.0 dispatcher over a newline-framed duplex byte
//! stream. One read loop per connection fans each frame out to a concurrent
//! handler task; replies are framed under a per-connection write mutex.
//!
//! # Components
//!
//! - [`StreamServer`]: the per-connection read loop with cooperative
//!   shutdown
//! - [`MessageHandler`]: message-in, bytes-out handler interface
//! - [`DispatchHandler`]: mounts a shared
//!   [`Dispatcher`](linerpc_common::dispatch::Dispatcher) as the message
//!   handler
//! - [`HttpMessageHandler`]: adapts an existing HTTP-style handler to the
//!   stream interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use linerpc_common::dispatch::{CallContext, Dispatcher, HandlerError, MethodFn};
//! use linerpc_common::transport::LineFramer;
//! use linerpc_server::{DispatchHandler, StreamServer};
//!
//! async fn ping(_ctx: CallContext, _params: Option<()>) -> Result<String, HandlerError> {
//!     Ok("pong".to_string())
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = Arc::new(
//!     Dispatcher::builder().method("ping", MethodFn::new(ping)).build(),
//! );
//!
//! let server = StreamServer::new(
//!     tokio::io::stdin(),
//!     tokio::io::stdout(),
//!     Arc::new(LineFramer),
//!     Arc::new(DispatchHandler::new(dispatcher)),
//! );
//! server.serve().await?;
//! server.shutdown(None).await?;
//! # Ok(())
//! # }
//! ```

pub mod http_adapter;
pub mod router;
pub mod server;

pub use http_adapter::{HttpMessageHandler, HttpRequest, HttpResponse, RequestParams};
pub use router::DispatchHandler;
pub use server::{MessageHandler, StreamServer};
