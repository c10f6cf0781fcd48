//! Bytes-to-dispatcher glue.
//!
//! [`DispatchHandler`] is the [`MessageHandler`] that feeds inbound frames
//! through the batch codec and the dispatcher, and encodes whatever comes
//! back. It is the default handler to mount on a [`StreamServer`] when the
//! server itself owns the method registry.
//!
//! [`StreamServer`]: crate::server::StreamServer

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use linerpc_common::dispatch::Dispatcher;
use linerpc_common::protocol::{Batch, Response, UnionRequest};

use crate::server::MessageHandler;

/// Runs each inbound message through a shared [`Dispatcher`].
pub struct DispatchHandler {
    dispatcher: Arc<Dispatcher>,
}

impl DispatchHandler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl MessageHandler for DispatchHandler {
    async fn handle_message(&self, msg: &[u8]) -> Vec<u8> {
        let batch = match Batch::<UnionRequest>::from_slice(msg) {
            Ok(batch) => batch,
            Err(err) => {
                // The whole payload was unusable; answer with the single
                // non-batch error response carrying a null id.
                let reply: Batch<Response<Value>> = Batch::single(Response::error(None, err));
                return encode_or_empty(&reply);
            }
        };

        match self.dispatcher.dispatch(batch).await {
            // Nothing to send back (notifications / inbound responses only).
            None => Vec::new(),
            Some(reply) => encode_or_empty(&reply),
        }
    }
}

fn encode_or_empty(batch: &Batch<Response<Value>>) -> Vec<u8> {
    match batch.to_vec() {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to encode response batch");
            Vec::new()
        }
    }
}
