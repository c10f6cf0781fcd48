//! linerpc Stream Client
//!
//! A client for newline-framed duplex streams with optional response
//! correlation.
//!
//! # Modes
//!
//! Without a correlator the client is strictly synchronous: each
//! [`Client::send`] writes one frame and reads one frame back, and callers
//! must serialize their sends. Supplying a correlator pair at build time
//! switches the client to concurrent mode: a dedicated receiver task
//! demultiplexes replies by id, so any number of callers can have requests
//! in flight on the same connection.
//!
//! Frames the receiver cannot route end up in a bounded dead-letter queue
//! for diagnostics; overflow drops silently, and the caller whose reply
//! was dropped observes a timeout.
//!
//! # Example
//!
//! ```no_run
//! use linerpc_client::{json_rpc_correlator, Client};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:9001").await?;
//! let (reader, writer) = stream.into_split();
//!
//! let (assign, extract) = json_rpc_correlator();
//! let client = Client::builder()
//!     .correlated(assign, extract)
//!     .connect(reader, writer);
//!
//! let reply = client
//!     .send(br#"{"jsonrpc":"2.0","method":"add","params":{"a":2,"b":3},"id":1}"#)
//!     .await?;
//! println!("{}", String::from_utf8_lossy(&reply.unwrap()));
//! client.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod correlate;
pub mod rpc;

pub use client::{
    Client, ClientBuilder, DeadLetterItem, DEFAULT_REQUEST_TIMEOUT, MIN_DEAD_LETTER_CAPACITY,
};
pub use correlate::{json_rpc_correlator, AssignId, ExtractId, IdSequence};
pub use rpc::{CallError, RpcClient};
