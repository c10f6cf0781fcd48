//! Correlator functions: how outgoing messages get tagged with an id and
//! how that id is recovered from incoming frames.
//!
//! The client treats ids as opaque strings; only the correlator pair
//! interprets the bytes. [`json_rpc_correlator`] is the stock pair for
//! JSON-RPC traffic: requests are keyed by the JSON text of their `id`
//! member (so the integer `7` and the string `"7"` never collide),
//! notifications pass through untracked, and inbound frames without an id
//! are dropped.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use linerpc_common::protocol::{LinerpcError, RequestId, Result};

/// Tags an outgoing message. Returns the correlation id (or `None` for
/// fire-and-forget messages) plus the bytes to actually write.
pub type AssignId = Arc<dyn Fn(&[u8]) -> Result<(Option<String>, Vec<u8>)> + Send + Sync>;

/// Recovers the correlation id from an incoming frame. Returns the id (or
/// `None` when the frame is uncorrelatable and should be dropped) plus the
/// payload to deliver to the waiter.
pub type ExtractId = Arc<dyn Fn(&[u8]) -> Result<(Option<String>, Vec<u8>)> + Send + Sync>;

/// Correlation key for a JSON id value: its JSON text. Keeps integer and
/// string ids distinct (`7` vs `"7"`).
fn id_key(id: &Value) -> Result<String> {
    Ok(serde_json::to_string(id)?)
}

/// Build the stock JSON-RPC correlator pair.
///
/// Outgoing messages must be JSON objects. A message carrying a non-null
/// `id` is tracked under that id; anything else (notifications, forwarded
/// responses) is sent fire-and-forget. Bytes pass through unchanged in
/// both directions; use [`IdSequence`] to stamp fresh ids onto requests
/// before sending.
pub fn json_rpc_correlator() -> (AssignId, ExtractId) {
    let assign: AssignId = Arc::new(|msg: &[u8]| {
        let value: Value = serde_json::from_slice(msg)?;
        if !value.is_object() {
            return Err(LinerpcError::InvalidMessage(
                "outgoing message is not a JSON object".to_string(),
            ));
        }
        match value.get("id") {
            None | Some(Value::Null) => Ok((None, msg.to_vec())),
            Some(id) => Ok((Some(id_key(id)?), msg.to_vec())),
        }
    });

    let extract: ExtractId = Arc::new(|msg: &[u8]| {
        let value: Value = serde_json::from_slice(msg)
            .map_err(|e| LinerpcError::InvalidMessage(format!("unparseable frame: {}", e)))?;
        match value.get("id") {
            None | Some(Value::Null) => Ok((None, msg.to_vec())),
            Some(id) => Ok((Some(id_key(id)?), msg.to_vec())),
        }
    });

    (assign, extract)
}

/// Monotonic request id source for building outgoing requests.
///
/// Each client connection typically owns one sequence; ids only need to be
/// unique among that connection's in-flight requests.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicI64,
}

impl IdSequence {
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    pub fn next_id(&self) -> RequestId {
        RequestId::Number(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_with_id_is_tracked_under_its_json_text() {
        let (assign, _) = json_rpc_correlator();
        let msg = serde_json::to_vec(&json!({"jsonrpc":"2.0","method":"add","id":9})).unwrap();
        let (id, bytes) = (*assign)(&msg).unwrap();
        assert_eq!(id.as_deref(), Some("9"));
        assert_eq!(bytes, msg);

        let msg =
            serde_json::to_vec(&json!({"jsonrpc":"2.0","method":"add","id":"req-1"})).unwrap();
        let (id, _) = (*assign)(&msg).unwrap();
        assert_eq!(id.as_deref(), Some(r#""req-1""#));
    }

    #[test]
    fn test_notification_is_fire_and_forget() {
        let (assign, _) = json_rpc_correlator();
        let msg =
            serde_json::to_vec(&json!({"jsonrpc":"2.0","method":"notify","params":{}})).unwrap();
        let (id, bytes) = (*assign)(&msg).unwrap();
        assert!(id.is_none());
        assert_eq!(bytes, msg);
    }

    #[test]
    fn test_int_and_string_ids_never_collide() {
        let (_, extract) = json_rpc_correlator();
        let int_frame = serde_json::to_vec(&json!({"jsonrpc":"2.0","result":1,"id":7})).unwrap();
        let str_frame =
            serde_json::to_vec(&json!({"jsonrpc":"2.0","result":1,"id":"7"})).unwrap();
        let (int_id, _) = (*extract)(&int_frame).unwrap();
        let (str_id, _) = (*extract)(&str_frame).unwrap();
        assert_ne!(int_id, str_id);
    }

    #[test]
    fn test_extract_drops_idless_frames() {
        let (_, extract) = json_rpc_correlator();
        let frame =
            serde_json::to_vec(&json!({"jsonrpc":"2.0","method":"notify","params":{}})).unwrap();
        let (id, _) = (*extract)(&frame).unwrap();
        assert!(id.is_none());

        let null_id = serde_json::to_vec(&json!({"jsonrpc":"2.0","result":1,"id":null})).unwrap();
        let (id, _) = (*extract)(&null_id).unwrap();
        assert!(id.is_none());
    }

    #[test]
    fn test_extract_errors_on_unparseable_frames() {
        let (_, extract) = json_rpc_correlator();
        assert!((*extract)(b"not json").is_err());
    }

    #[test]
    fn test_non_object_outgoing_message_is_rejected() {
        let (assign, _) = json_rpc_correlator();
        assert!((*assign)(b"[1,2,3]").is_err());
    }

    #[test]
    fn test_id_sequence_is_monotonic() {
        let seq = IdSequence::new();
        assert_eq!(seq.next_id(), RequestId::Number(1));
        assert_eq!(seq.next_id(), RequestId::Number(2));
    }
}
