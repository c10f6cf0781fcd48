use thiserror::Error;

/// Process-level errors surfaced to transport loops and client callers.
///
/// These never appear on the wire. JSON-RPC errors that travel inside a
/// response body are [`ErrorObject`](super::jsonrpc::ErrorObject) values;
/// the dispatcher converts between the two at its boundary and nothing else
/// does.
#[derive(Error, Debug)]
pub enum LinerpcError {
    #[error("Framing error: {0}")]
    Framing(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    // The three below are part of the client's contract; callers match on
    // their text in logs and tests.
    #[error("request timed out")]
    RequestTimedOut,

    #[error("client closed")]
    Closed,

    #[error("no pending request for response")]
    NoPendingRequest,
}

pub type Result<T> = std::result::Result<T, LinerpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_strings() {
        assert_eq!(LinerpcError::RequestTimedOut.to_string(), "request timed out");
        assert_eq!(LinerpcError::Closed.to_string(), "client closed");
        assert_eq!(
            LinerpcError::NoPendingRequest.to_string(),
            "no pending request for response"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        let err: LinerpcError = io_err.into();
        assert!(matches!(err, LinerpcError::Io(_)));
    }
}
