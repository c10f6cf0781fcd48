//! Message framing over duplex byte streams.
//!
//! A framer turns a byte stream into discrete messages and back. The only
//! provided implementation is [`LineFramer`]: each message is its payload
//! followed by a single `\n`, and payloads must not contain interior
//! newlines. Both the framed server and the correlating client read and
//! write through this trait.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::error::{LinerpcError, Result};

/// How messages are delimited on a byte stream.
///
/// `read_message` returns `Ok(None)` on clean end-of-stream; an EOF in the
/// middle of a message is an error. Writers are buffered by the caller, who
/// is also responsible for flushing after a write.
#[async_trait]
pub trait MessageFramer: Send + Sync {
    async fn write_message(
        &self,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        msg: &[u8],
    ) -> Result<()>;

    async fn read_message(
        &self,
        reader: &mut (dyn AsyncBufRead + Unpin + Send),
    ) -> Result<Option<Vec<u8>>>;
}

/// Frames messages delimited by newline characters.
pub struct LineFramer;

#[async_trait]
impl MessageFramer for LineFramer {
    /// Write a message with a newline delimiter. A single trailing newline
    /// in `msg` is tolerated; any interior newline is rejected because it
    /// would split the message in two on the wire.
    async fn write_message(
        &self,
        writer: &mut (dyn AsyncWrite + Unpin + Send),
        msg: &[u8],
    ) -> Result<()> {
        let content = msg.strip_suffix(b"\n").unwrap_or(msg);
        if content.contains(&b'\n') {
            return Err(LinerpcError::Framing(
                "invalid character newline in the middle".to_string(),
            ));
        }
        writer.write_all(content).await?;
        writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Read a message up to the next newline, stripping the terminator.
    async fn read_message(
        &self,
        reader: &mut (dyn AsyncBufRead + Unpin + Send),
    ) -> Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        let n = reader.read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        if buf.last() != Some(&b'\n') {
            return Err(LinerpcError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stream ended in the middle of a message",
            )));
        }
        buf.pop();
        Ok(Some(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn write_to_vec(msg: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        LineFramer.write_message(&mut out, msg).await?;
        Ok(out)
    }

    #[tokio::test]
    async fn test_write_appends_newline() {
        assert_eq!(write_to_vec(b"hello").await.unwrap(), b"hello\n");
    }

    #[tokio::test]
    async fn test_write_keeps_single_trailing_newline() {
        assert_eq!(write_to_vec(b"hello\n").await.unwrap(), b"hello\n");
    }

    #[tokio::test]
    async fn test_write_rejects_embedded_newline() {
        let err = write_to_vec(b"hel\nlo").await.unwrap_err();
        assert!(matches!(err, LinerpcError::Framing(_)));
    }

    #[tokio::test]
    async fn test_read_strips_terminator() {
        let mut reader = BufReader::new(&b"hello\nworld\n"[..]);
        let first = LineFramer.read_message(&mut reader).await.unwrap();
        assert_eq!(first.as_deref(), Some(&b"hello"[..]));
        let second = LineFramer.read_message(&mut reader).await.unwrap();
        assert_eq!(second.as_deref(), Some(&b"world"[..]));
    }

    #[tokio::test]
    async fn test_read_returns_none_on_clean_eof() {
        let mut reader = BufReader::new(&b""[..]);
        assert!(LineFramer.read_message(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_errors_on_eof_mid_message() {
        let mut reader = BufReader::new(&b"partial"[..]);
        let err = LineFramer.read_message(&mut reader).await.unwrap_err();
        match err {
            LinerpcError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected IO error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_message_round_trips() {
        let wire = write_to_vec(b"").await.unwrap();
        assert_eq!(wire, b"\n");
        let mut reader = BufReader::new(&wire[..]);
        let msg = LineFramer.read_message(&mut reader).await.unwrap();
        assert_eq!(msg.as_deref(), Some(&b""[..]));
    }
}
