//! Typed calls over the stream client.
//!
//! [`RpcClient`] wraps a [`Client`] with the JSON-RPC request/response
//! shapes: it stamps fresh ids, encodes typed params, and decodes the
//! reply into the caller's result type. Errors split into transport
//! failures and errors the peer reported in the response body.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use linerpc_common::protocol::{
    ErrorObject, LinerpcError, Notification, Request, Response,
};

use crate::client::Client;
use crate::correlate::IdSequence;

/// Why a typed call failed.
#[derive(Error, Debug)]
pub enum CallError {
    /// The call never completed: connection trouble, timeout, close.
    #[error(transparent)]
    Transport(#[from] LinerpcError),

    /// The peer answered with a JSON-RPC error object.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(ErrorObject),
}

/// A JSON-RPC view over a [`Client`].
///
/// Owns an [`IdSequence`], so every call gets a fresh id for the
/// correlator to track. Works in both client modes; notifications are
/// only possible in concurrent mode, because a synchronous client always
/// reads a reply that a notification never gets.
pub struct RpcClient {
    client: Client,
    ids: IdSequence,
}

impl RpcClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            ids: IdSequence::new(),
        }
    }

    /// The underlying stream client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Call `method` and decode the result.
    ///
    /// A response carrying an error object becomes [`CallError::Rpc`]; an
    /// absent result decodes from JSON `null`, so use `Option<_>` (or
    /// [`Value`]) for methods that may return nothing.
    pub async fn call<P, R>(&self, method: &str, params: Option<P>) -> Result<R, CallError>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = Request::new(self.ids.next_id(), method, params);
        let bytes = serde_json::to_vec(&request).map_err(LinerpcError::from)?;

        let reply = self.client.send(&bytes).await?;
        let Some(reply) = reply else {
            return Err(CallError::Transport(LinerpcError::InvalidMessage(
                "call was sent untracked, no reply to wait for".to_string(),
            )));
        };

        let response: Response<R> =
            serde_json::from_slice(&reply).map_err(LinerpcError::from)?;
        match (response.result, response.error) {
            (_, Some(err)) => Err(CallError::Rpc(err)),
            (Some(result), None) => Ok(result),
            (None, None) => {
                serde_json::from_value(Value::Null).map_err(|e| LinerpcError::from(e).into())
            }
        }
    }

    /// Send a notification: no id, no reply.
    ///
    /// Fails on a synchronous client, which has no way to send without
    /// waiting for a reply frame.
    pub async fn notify<P: Serialize>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<(), CallError> {
        if !self.client.is_correlated() {
            return Err(CallError::Transport(LinerpcError::InvalidMessage(
                "notifications require a correlated client".to_string(),
            )));
        }

        let notification = Notification::new(method, params);
        let bytes = serde_json::to_vec(&notification).map_err(LinerpcError::from)?;
        self.client.send(&bytes).await?;
        Ok(())
    }

    /// Shut the underlying client down.
    pub async fn close(&self) -> Result<(), LinerpcError> {
        self.client.close().await
    }
}
