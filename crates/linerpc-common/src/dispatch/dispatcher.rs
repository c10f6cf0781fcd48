//! Batch-aware message dispatch.
//!
//! The dispatcher owns three registries keyed by method name (method call,
//! notification, response handlers) plus the mapper that recovers a method
//! name from an inbound response. It walks a decoded batch item by item,
//! classifies each message, routes it, and reassembles the batch response in
//! input order. Notifications and inbound responses contribute nothing to
//! the output; a batch of only those produces no reply at all.

use std::collections::HashMap;

use serde_json::Value;

use super::context::CallContext;
use super::handler::{HandlerError, MethodHandler, NotificationHandler, ResponseHandler};
use crate::protocol::{Batch, ErrorObject, MessageKind, Response, UnionRequest};

type ResponseMapperFn =
    Box<dyn Fn(&Response<Value>) -> Result<String, HandlerError> + Send + Sync>;

/// Builder for a [`Dispatcher`]. The registry is immutable once built;
/// share the dispatcher behind an `Arc` across connections and workers.
#[derive(Default)]
pub struct DispatcherBuilder {
    methods: HashMap<String, Box<dyn MethodHandler>>,
    notifications: HashMap<String, Box<dyn NotificationHandler>>,
    responses: HashMap<String, Box<dyn ResponseHandler>>,
    response_mapper: Option<ResponseMapperFn>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a method call.
    pub fn method(mut self, name: impl Into<String>, handler: impl MethodHandler + 'static) -> Self {
        self.methods.insert(name.into(), Box::new(handler));
        self
    }

    /// Register a handler for a notification.
    pub fn notification(
        mut self,
        name: impl Into<String>,
        handler: impl NotificationHandler + 'static,
    ) -> Self {
        self.notifications.insert(name.into(), Box::new(handler));
        self
    }

    /// Register a handler for responses arriving on this side. Routing
    /// additionally requires a mapper (see
    /// [`response_mapper`](Self::response_mapper)) because responses do not
    /// carry a method name.
    pub fn response(
        mut self,
        name: impl Into<String>,
        handler: impl ResponseHandler + 'static,
    ) -> Self {
        self.responses.insert(name.into(), Box::new(handler));
        self
    }

    /// Install the mapper that recovers the originating method name from an
    /// inbound response, typically by looking the id up in a table of
    /// outstanding calls.
    pub fn response_mapper(
        mut self,
        mapper: impl Fn(&Response<Value>) -> Result<String, HandlerError> + Send + Sync + 'static,
    ) -> Self {
        self.response_mapper = Some(Box::new(mapper));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            methods: self.methods,
            notifications: self.notifications,
            responses: self.responses,
            response_mapper: self.response_mapper,
        }
    }
}

/// Routes each message of a batch to its registered handler and assembles
/// the batch response.
pub struct Dispatcher {
    methods: HashMap<String, Box<dyn MethodHandler>>,
    notifications: HashMap<String, Box<dyn NotificationHandler>>,
    responses: HashMap<String, Box<dyn ResponseHandler>>,
    response_mapper: Option<ResponseMapperFn>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Names of all registered method handlers.
    pub fn registered_methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    /// Process one decoded batch.
    ///
    /// Returns `None` when there is nothing to send back (the input held
    /// only notifications and inbound responses); callers must then write
    /// no bytes to the peer. Any `Some` batch is sent, even when it holds a
    /// single error item.
    ///
    /// An empty input batch is unanswerable and collapses to the single
    /// non-batch ParseError response with a null id.
    pub async fn dispatch(&self, input: Batch<UnionRequest>) -> Option<Batch<Response<Value>>> {
        if input.is_empty() {
            return Some(Batch::single(Response::error(
                None,
                ErrorObject::parse_error("No input received"),
            )));
        }

        let is_batch = input.is_batch;
        let mut replies = Vec::new();

        for message in input.items {
            let kind = match message.classify() {
                Ok(kind) => kind,
                Err(err) => {
                    replies.push(Response::error(message.id, err));
                    continue;
                }
            };

            match kind {
                MessageKind::Method => replies.push(self.handle_method(message).await),
                MessageKind::Notification => self.handle_notification(message).await,
                MessageKind::Response => self.handle_response(message).await,
            }
        }

        if replies.is_empty() {
            return None;
        }
        Some(Batch {
            is_batch,
            items: replies,
        })
    }

    async fn handle_method(&self, message: UnionRequest) -> Response<Value> {
        // classify() guarantees method and id are present for this kind.
        let method = message.method.unwrap_or_default();
        let id = message.id;

        let Some(handler) = self.methods.get(&method) else {
            return Response::error(id, ErrorObject::method_not_found(&method));
        };

        let ctx = CallContext::new(method, MessageKind::Method, id.clone());
        match handler.call(&ctx, message.params).await {
            Ok(result) => Response {
                jsonrpc: crate::protocol::JSONRPC_VERSION.to_string(),
                id,
                result: Some(result),
                error: None,
            },
            Err(err) => Response::error(id, err),
        }
    }

    async fn handle_notification(&self, message: UnionRequest) {
        let method = message.method.unwrap_or_default();

        // A missing notification handler is silently dropped; there is no
        // channel to report it on.
        let Some(handler) = self.notifications.get(&method) else {
            tracing::debug!(method = %method, "no notification handler registered");
            return;
        };

        let ctx = CallContext::new(method.clone(), MessageKind::Notification, None);
        if let Err(err) = handler.notify(&ctx, message.params).await {
            tracing::warn!(method = %method, error = %err, "notification handler failed");
        }
    }

    async fn handle_response(&self, message: UnionRequest) {
        let Some(mapper) = &self.response_mapper else {
            tracing::debug!("inbound response dropped: no response mapper installed");
            return;
        };

        let response = Response {
            jsonrpc: message.jsonrpc,
            id: message.id,
            result: message.result,
            error: message.error,
        };

        let method = match mapper(&response) {
            Ok(method) => method,
            Err(err) => {
                tracing::warn!(error = %err, "response mapper failed");
                return;
            }
        };

        let Some(handler) = self.responses.get(&method) else {
            tracing::warn!(method = %method, "no response handler registered");
            return;
        };

        let ctx = CallContext::new(method.clone(), MessageKind::Response, response.id.clone());
        if let Err(err) = handler.on_response(&ctx, response).await {
            tracing::warn!(method = %method, error = %err, "response handler failed");
        }
    }
}
