//! Stream transport building blocks.
//!
//! Messages travel over any duplex byte stream as newline-delimited frames:
//!
//! ```text
//! [JSON message] \n [JSON message] \n ...
//! ```
//!
//! The framer is shared by the framed server (linerpc-server) and the
//! correlating client (linerpc-client); both are generic over
//! `AsyncRead`/`AsyncWrite`, so the same code serves TCP sockets, child
//! process stdio, or `tokio::io::duplex` pairs in tests. Streams that need
//! per-operation read/write deadlines wrap themselves in
//! [`DeadlineStream`]; deadlines are unset by default.

pub mod deadline;
pub mod framing;

pub use deadline::DeadlineStream;
pub use framing::{LineFramer, MessageFramer};
