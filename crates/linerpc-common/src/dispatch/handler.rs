//! Typed handlers behind type-erased dispatch.
//!
//! User endpoints are plain async functions over concrete parameter and
//! result types. The `*Fn` adapters wrap them behind object-safe traits the
//! dispatcher can store in its maps: decode the raw params into the declared
//! input type, run the endpoint, encode the output back to a raw value.
//! Decode failures become InvalidParams; endpoint errors either pass through
//! verbatim (when the endpoint produced a wire [`ErrorObject`]) or are
//! wrapped as InternalError.

use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::context::CallContext;
use crate::protocol::{ErrorObject, Response};

/// Error type returned by user endpoints.
///
/// `Rpc` carries a wire error object that reaches the peer unchanged,
/// including application-defined codes. Anything else is reported to the
/// peer as InternalError with the error's message.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    Rpc(ErrorObject),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    /// Wrap any error (or message) as a non-wire handler failure.
    pub fn other(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        HandlerError::Other(err.into())
    }
}

impl From<ErrorObject> for HandlerError {
    fn from(err: ErrorObject) -> Self {
        HandlerError::Rpc(err)
    }
}

/// Type-erased handler for method calls.
#[async_trait]
pub trait MethodHandler: Send + Sync {
    /// Decode the raw params, run the endpoint, and produce either the raw
    /// result value or the wire error to send back.
    async fn call(&self, ctx: &CallContext, params: Option<Value>) -> Result<Value, ErrorObject>;

    /// Name of the declared input type, for registry introspection.
    fn input_type(&self) -> &'static str;

    /// Name of the declared output type, for registry introspection.
    fn output_type(&self) -> &'static str;
}

/// Type-erased handler for notifications. Errors are for logging only; the
/// peer never sees them.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn notify(&self, ctx: &CallContext, params: Option<Value>) -> Result<(), HandlerError>;

    fn input_type(&self) -> &'static str;
}

/// Type-erased handler for responses arriving on this side of the
/// connection. Errors are for logging only.
#[async_trait]
pub trait ResponseHandler: Send + Sync {
    async fn on_response(
        &self,
        ctx: &CallContext,
        response: Response<Value>,
    ) -> Result<(), HandlerError>;

    fn result_type(&self) -> &'static str;
}

/// Decode raw params into the handler's declared input type.
///
/// Absent params (and an explicit `"params": null`, which some peers send)
/// decode from JSON `null` first, which satisfies nullable inputs such as
/// `Option<T>`; when the input type rejects null, an empty object is tried
/// so that structs of all-optional fields still work.
fn decode_params<I: DeserializeOwned>(params: Option<Value>) -> Result<I, ErrorObject> {
    match params {
        Some(value) if !value.is_null() => serde_json::from_value(value)
            .map_err(|e| ErrorObject::invalid_params(&e.to_string())),
        _ => serde_json::from_value(Value::Null)
            .or_else(|_| serde_json::from_value(Value::Object(serde_json::Map::new())))
            .map_err(|e| ErrorObject::invalid_params(&e.to_string())),
    }
}

type MethodEndpoint<I, O> =
    Box<dyn Fn(CallContext, I) -> BoxFuture<'static, Result<O, HandlerError>> + Send + Sync>;

/// A method handler built from an async function over typed params and
/// result.
///
/// Usage:
///
/// ```
/// use linerpc_common::dispatch::{CallContext, HandlerError, MethodFn};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Deserialize)]
/// struct AddParams { a: i64, b: i64 }
///
/// #[derive(Serialize)]
/// struct AddResult { sum: i64 }
///
/// async fn add(_ctx: CallContext, params: AddParams) -> Result<AddResult, HandlerError> {
///     Ok(AddResult { sum: params.a + params.b })
/// }
///
/// let handler = MethodFn::new(add);
/// ```
pub struct MethodFn<I, O> {
    endpoint: MethodEndpoint<I, O>,
}

impl<I, O> MethodFn<I, O> {
    pub fn new<F, Fut>(endpoint: F) -> Self
    where
        F: Fn(CallContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, HandlerError>> + Send + 'static,
    {
        Self {
            endpoint: Box::new(move |ctx, input| endpoint(ctx, input).boxed()),
        }
    }
}

#[async_trait]
impl<I, O> MethodHandler for MethodFn<I, O>
where
    I: DeserializeOwned + Send + Sync,
    O: Serialize + Send + Sync,
{
    async fn call(&self, ctx: &CallContext, params: Option<Value>) -> Result<Value, ErrorObject> {
        let input: I = decode_params(params)?;
        match (self.endpoint)(ctx.clone(), input).await {
            Ok(output) => serde_json::to_value(output)
                .map_err(|e| ErrorObject::internal_error(&e.to_string())),
            Err(HandlerError::Rpc(err)) => Err(err),
            Err(HandlerError::Other(err)) => Err(ErrorObject::internal_error(&err.to_string())),
        }
    }

    fn input_type(&self) -> &'static str {
        std::any::type_name::<I>()
    }

    fn output_type(&self) -> &'static str {
        std::any::type_name::<O>()
    }
}

type NotificationEndpoint<I> =
    Box<dyn Fn(CallContext, I) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

/// A notification handler built from an async function over typed params.
pub struct NotificationFn<I> {
    endpoint: NotificationEndpoint<I>,
}

impl<I> NotificationFn<I> {
    pub fn new<F, Fut>(endpoint: F) -> Self
    where
        F: Fn(CallContext, I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self {
            endpoint: Box::new(move |ctx, input| endpoint(ctx, input).boxed()),
        }
    }
}

#[async_trait]
impl<I> NotificationHandler for NotificationFn<I>
where
    I: DeserializeOwned + Send + Sync,
{
    async fn notify(&self, ctx: &CallContext, params: Option<Value>) -> Result<(), HandlerError> {
        let input: I = decode_params(params).map_err(HandlerError::Rpc)?;
        (self.endpoint)(ctx.clone(), input).await
    }

    fn input_type(&self) -> &'static str {
        std::any::type_name::<I>()
    }
}

type ResponseEndpoint<T> = Box<
    dyn Fn(CallContext, Result<T, ErrorObject>) -> BoxFuture<'static, Result<(), HandlerError>>
        + Send
        + Sync,
>;

/// A response handler built from an async function over the typed result.
///
/// The endpoint receives `Ok(result)` when the response carried a result
/// (an absent result decodes from JSON `null`, so use `Option<_>` for
/// void-returning calls) and `Err(error)` when the peer reported a failure.
pub struct ResponseFn<T> {
    endpoint: ResponseEndpoint<T>,
}

impl<T> ResponseFn<T> {
    pub fn new<F, Fut>(endpoint: F) -> Self
    where
        F: Fn(CallContext, Result<T, ErrorObject>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        Self {
            endpoint: Box::new(move |ctx, outcome| endpoint(ctx, outcome).boxed()),
        }
    }
}

#[async_trait]
impl<T> ResponseHandler for ResponseFn<T>
where
    T: DeserializeOwned + Send + Sync,
{
    async fn on_response(
        &self,
        ctx: &CallContext,
        response: Response<Value>,
    ) -> Result<(), HandlerError> {
        let outcome = match response.error {
            Some(err) => Err(err),
            None => {
                let value = response.result.unwrap_or(Value::Null);
                let decoded: T =
                    serde_json::from_value(value).map_err(HandlerError::other)?;
                Ok(decoded)
            }
        };
        (self.endpoint)(ctx.clone(), outcome).await
    }

    fn result_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MessageKind, RequestId, INVALID_PARAMS};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct AddParams {
        a: i64,
        b: i64,
    }

    #[derive(Debug, Serialize)]
    struct AddResult {
        sum: i64,
    }

    fn method_ctx() -> CallContext {
        CallContext::new("add", MessageKind::Method, Some(RequestId::Number(1)))
    }

    #[tokio::test]
    async fn test_method_fn_decodes_and_encodes() {
        let handler = MethodFn::new(|_ctx: CallContext, params: AddParams| async move {
            Ok(AddResult {
                sum: params.a + params.b,
            })
        });

        let result = handler
            .call(&method_ctx(), Some(json!({"a": 2, "b": 3})))
            .await
            .unwrap();
        assert_eq!(result, json!({"sum": 5}));
    }

    #[tokio::test]
    async fn test_method_fn_reports_invalid_params() {
        let handler = MethodFn::new(|_ctx: CallContext, params: AddParams| async move {
            Ok(AddResult {
                sum: params.a + params.b,
            })
        });

        let err = handler
            .call(&method_ctx(), Some(json!({"a": "one", "b": 2})))
            .await
            .unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
        assert!(err.message.starts_with("Invalid method parameter(s): "));
    }

    #[tokio::test]
    async fn test_method_fn_passes_wire_errors_through() {
        let handler = MethodFn::new(|_ctx: CallContext, _params: AddParams| async move {
            Err::<AddResult, _>(HandlerError::Rpc(ErrorObject::new(1234, "Custom error")))
        });

        let err = handler
            .call(&method_ctx(), Some(json!({"a": 1, "b": 2})))
            .await
            .unwrap_err();
        assert_eq!(err.code, 1234);
        assert_eq!(err.message, "Custom error");
    }

    #[tokio::test]
    async fn test_method_fn_wraps_plain_errors_as_internal() {
        let handler = MethodFn::new(|_ctx: CallContext, _params: AddParams| async move {
            Err::<AddResult, _>(HandlerError::other("intentional error"))
        });

        let err = handler
            .call(&method_ctx(), Some(json!({"a": 1, "b": 2})))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::protocol::INTERNAL_ERROR);
        assert_eq!(err.message, "Internal JSON-RPC error: intentional error");
    }

    #[tokio::test]
    async fn test_absent_params_yield_null_for_nullable_input() {
        let handler =
            MethodFn::new(|_ctx: CallContext, params: Option<AddParams>| async move {
                assert!(params.is_none());
                Ok(json!("ok"))
            });

        let result = handler.call(&method_ctx(), None).await.unwrap();
        assert_eq!(result, json!("ok"));
    }

    #[derive(Debug, Deserialize)]
    struct Empty {}

    #[tokio::test]
    async fn test_absent_params_yield_empty_object_for_structs() {
        let handler = MethodFn::new(|_ctx: CallContext, _params: Empty| async move {
            Ok(json!("ok"))
        });

        let result = handler.call(&method_ctx(), None).await.unwrap();
        assert_eq!(result, json!("ok"));
    }

    #[tokio::test]
    async fn test_absent_params_fail_for_required_fields() {
        let handler = MethodFn::new(|_ctx: CallContext, params: AddParams| async move {
            Ok(AddResult {
                sum: params.a + params.b,
            })
        });

        let err = handler.call(&method_ctx(), None).await.unwrap_err();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_notification_fn_reports_decode_failure_to_caller_only() {
        let handler = NotificationFn::new(|_ctx: CallContext, _params: AddParams| async move {
            panic!("endpoint must not run on bad params");
        });

        let ctx = CallContext::new("notify", MessageKind::Notification, None);
        let err = handler
            .notify(&ctx, Some(json!({"a": "one"})))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_response_fn_hands_result_to_endpoint() {
        let handler = ResponseFn::new(
            |_ctx: CallContext, outcome: Result<AddParams, ErrorObject>| async move {
                let params = outcome.map_err(HandlerError::Rpc)?;
                assert_eq!(params.a, 2);
                Ok(())
            },
        );

        let ctx = CallContext::new("add", MessageKind::Response, Some(RequestId::Number(1)));
        let response = Response::success(RequestId::Number(1), json!({"a": 2, "b": 3}));
        handler.on_response(&ctx, response).await.unwrap();
    }

    #[tokio::test]
    async fn test_response_fn_hands_error_to_endpoint() {
        let handler = ResponseFn::new(
            |_ctx: CallContext, outcome: Result<AddParams, ErrorObject>| async move {
                let err = outcome.expect_err("expected the peer's error");
                assert_eq!(err.code, 1234);
                Ok(())
            },
        );

        let ctx = CallContext::new("add", MessageKind::Response, Some(RequestId::Number(1)));
        let response = Response::error(
            Some(RequestId::Number(1)),
            ErrorObject::new(1234, "Custom error"),
        );
        handler.on_response(&ctx, response).await.unwrap();
    }

    #[test]
    fn test_type_introspection_names_payload_types() {
        let handler = MethodFn::new(|_ctx: CallContext, params: AddParams| async move {
            Ok(AddResult {
                sum: params.a + params.b,
            })
        });
        assert!(handler.input_type().ends_with("AddParams"));
        assert!(handler.output_type().ends_with("AddResult"));
    }
}
