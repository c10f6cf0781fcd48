//! One-or-many JSON container used on both sides of the dispatcher.
//!
//! JSON-RPC allows a single message or an array of messages on the wire.
//! [`Batch`] decodes either form while remembering which one arrived, so the
//! reply can be shaped the same way: a single request gets a single response
//! object, an array gets an array, even an array of one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::error::Result;
use super::jsonrpc::ErrorObject;

/// A decoded batch: `is_batch` records whether the wire form was an array.
///
/// Encoding rules:
/// - `is_batch == true` encodes the items as a JSON array (possibly empty)
/// - `is_batch == false` with items encodes the first item alone
/// - `is_batch == false` with no items encodes the JSON literal `null`
#[derive(Debug, Clone, PartialEq)]
pub struct Batch<T> {
    pub is_batch: bool,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    /// A non-array batch holding exactly one item.
    pub fn single(item: T) -> Self {
        Self {
            is_batch: false,
            items: vec![item],
        }
    }

    /// An array-shaped batch, kept as an array even with one element.
    pub fn array(items: Vec<T>) -> Self {
        Self {
            is_batch: true,
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Rejects input that is empty (after trimming) or the literal `null`.
fn check_empty_or_null(data: &[u8]) -> std::result::Result<(), ErrorObject> {
    let data = data.trim_ascii();
    if data.is_empty() {
        return Err(ErrorObject::parse_error("Received empty data"));
    }
    if data == b"null" {
        return Err(ErrorObject::parse_error("Received null data"));
    }
    Ok(())
}

impl<T: DeserializeOwned> Batch<T> {
    /// Decode a byte slice that holds either a single JSON object or an
    /// array of them.
    ///
    /// An empty array is valid and decodes to `(is_batch: true, [])`; empty
    /// input, the literal `null`, and `null` array elements are parse
    /// errors. Failures are reported as wire [`ErrorObject`]s because the
    /// peer is the one who sent the malformed bytes.
    pub fn from_slice(data: &[u8]) -> std::result::Result<Self, ErrorObject> {
        check_empty_or_null(data)?;
        let data = data.trim_ascii();

        if let Ok(raw_items) = serde_json::from_slice::<Vec<Value>>(data) {
            let mut items = Vec::with_capacity(raw_items.len());
            for raw in raw_items {
                if raw.is_null() {
                    return Err(ErrorObject::parse_error("Received null data"));
                }
                let item = serde_json::from_value(raw).map_err(|e| {
                    ErrorObject::parse_error(&format!("Failed to unmarshal batch item: {}", e))
                })?;
                items.push(item);
            }
            return Ok(Self {
                is_batch: true,
                items,
            });
        }

        let item = serde_json::from_slice(data).map_err(|e| {
            ErrorObject::parse_error(&format!("Failed to unmarshal single item: {}", e))
        })?;
        Ok(Self {
            is_batch: false,
            items: vec![item],
        })
    }
}

impl<T: Serialize> Batch<T> {
    /// Encode back to wire bytes, preserving the batch-vs-single shape.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        if self.is_batch {
            return Ok(serde_json::to_vec(&self.items)?);
        }
        match self.items.first() {
            Some(item) => Ok(serde_json::to_vec(item)?),
            None => Ok(b"null".to_vec()),
        }
    }
}
