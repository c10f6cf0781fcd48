//! Typed handler registry and batch dispatcher.
//!
//! User code registers async endpoints under method names with
//! [`DispatcherBuilder`]; the [`Dispatcher`] routes each element of an
//! inbound batch to the right handler and assembles the reply. Handlers see
//! a [`CallContext`] carrying the method name, message kind and request id.
//!
//! # Example
//!
//! ```
//! use linerpc_common::dispatch::{CallContext, Dispatcher, HandlerError, MethodFn};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! struct AddParams { a: i64, b: i64 }
//!
//! #[derive(Serialize)]
//! struct AddResult { sum: i64 }
//!
//! async fn add(_ctx: CallContext, params: AddParams) -> Result<AddResult, HandlerError> {
//!     Ok(AddResult { sum: params.a + params.b })
//! }
//!
//! let dispatcher = Dispatcher::builder()
//!     .method("add", MethodFn::new(add))
//!     .build();
//! ```

pub mod context;
pub mod dispatcher;
pub mod handler;


pub use context::CallContext;
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use handler::{
    HandlerError, MethodFn, MethodHandler, NotificationFn, NotificationHandler, ResponseFn,
    ResponseHandler,
};
