//! HTTP handler to stream adapter.
//!
//! Some deployments already expose the dispatcher behind an HTTP handler
//! (body in, body out). [`HttpMessageHandler`] lets the framed stream
//! transport reuse that handler unchanged: every inbound frame becomes an
//! in-memory HTTP request, and the handler's response body becomes the
//! reply frame. Status code and headers are discarded: on the stream
//! transport JSON-RPC errors travel in the body, exactly as they do over
//! HTTP where the status is forced to 200.

use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use http_body_util::{BodyExt, Full};
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response};

use crate::server::MessageHandler;

/// In-memory HTTP request handed to the wrapped handler.
pub type HttpRequest = Request<Full<Bytes>>;
/// In-memory HTTP response produced by the wrapped handler.
pub type HttpResponse = Response<Full<Bytes>>;

/// Default request line and headers applied to every synthesized request.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            method: Method::POST,
            url: "/".to_string(),
            headers: HeaderMap::new(),
        }
    }
}

type HttpHandlerFn = Box<dyn Fn(HttpRequest) -> BoxFuture<'static, HttpResponse> + Send + Sync>;

/// Adapts an HTTP-style handler to the stream [`MessageHandler`] interface.
pub struct HttpMessageHandler {
    handler: HttpHandlerFn,
    params: RequestParams,
}

impl HttpMessageHandler {
    pub fn new<S, Fut>(handler: S, params: RequestParams) -> Self
    where
        S: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HttpResponse> + Send + 'static,
    {
        Self {
            handler: Box::new(move |req| handler(req).boxed()),
            params,
        }
    }
}

#[async_trait]
impl MessageHandler for HttpMessageHandler {
    async fn handle_message(&self, msg: &[u8]) -> Vec<u8> {
        let mut builder = Request::builder()
            .method(self.params.method.clone())
            .uri(self.params.url.as_str());

        if let Some(headers) = builder.headers_mut() {
            for (name, value) in &self.params.headers {
                headers.append(name, value.clone());
            }
        }

        let request = match builder.body(Full::new(Bytes::copy_from_slice(msg))) {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(error = %e, "failed to build in-memory request");
                return Vec::new();
            }
        };

        let response = (self.handler)(request).await;

        // Status and headers are dropped; only the body goes back on the
        // stream.
        match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes().to_vec(),
            Err(never) => match never {},
        }
    }
}
