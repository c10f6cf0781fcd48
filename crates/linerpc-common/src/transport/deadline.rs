//! Read/write deadlines for streams that have none of their own.
//!
//! Tokio streams do not carry per-operation timeouts, so transports that
//! want the "transient timeout, retry" behavior wrap their stream in
//! [`DeadlineStream`]. A stalled read or write fails with
//! `ErrorKind::TimedOut` once its deadline elapses; deadlines are per
//! operation, re-armed on each new read or write, and unset by default.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{sleep, Sleep};

/// Wraps a stream with optional per-operation read and write deadlines.
pub struct DeadlineStream<S> {
    inner: S,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    read_deadline: Option<Pin<Box<Sleep>>>,
    write_deadline: Option<Pin<Box<Sleep>>>,
}

impl<S> DeadlineStream<S> {
    /// Wrap `inner` with no deadlines set; reads and writes block
    /// indefinitely like the bare stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            read_timeout: None,
            write_timeout: None,
            read_deadline: None,
            write_deadline: None,
        }
    }

    /// Fail reads that make no progress for `timeout`.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Fail writes that make no progress for `timeout`.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn timed_out(op: &str, timeout: Duration) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("{} timeout after {:?}", op, timeout),
    )
}

impl<S: AsyncRead + Unpin> AsyncRead for DeadlineStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.read_deadline = None;
                Poll::Ready(result)
            }
            Poll::Pending => {
                let Some(timeout) = this.read_timeout else {
                    return Poll::Pending;
                };
                let deadline = this
                    .read_deadline
                    .get_or_insert_with(|| Box::pin(sleep(timeout)));
                match deadline.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        this.read_deadline = None;
                        Poll::Ready(Err(timed_out("read", timeout)))
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for DeadlineStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(result) => {
                this.write_deadline = None;
                Poll::Ready(result)
            }
            Poll::Pending => {
                let Some(timeout) = this.write_timeout else {
                    return Poll::Pending;
                };
                let deadline = this
                    .write_deadline
                    .get_or_insert_with(|| Box::pin(sleep(timeout)));
                match deadline.as_mut().poll(cx) {
                    Poll::Ready(()) => {
                        this.write_deadline = None;
                        Poll::Ready(Err(timed_out("write", timeout)))
                    }
                    Poll::Pending => Poll::Pending,
                }
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_read_times_out_when_no_data_arrives() {
        let (local, _remote) = tokio::io::duplex(64);
        let mut stream = DeadlineStream::new(local).with_read_timeout(Duration::from_millis(50));

        let mut buf = [0u8; 8];
        let err = stream.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn test_read_succeeds_before_the_deadline() {
        let (local, mut remote) = tokio::io::duplex(64);
        let mut stream = DeadlineStream::new(local).with_read_timeout(Duration::from_secs(5));

        remote.write_all(b"data").await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"data");
    }

    #[tokio::test]
    async fn test_deadline_rearms_per_read() {
        let (local, mut remote) = tokio::io::duplex(64);
        let mut stream = DeadlineStream::new(local).with_read_timeout(Duration::from_millis(100));

        // Two consecutive reads, each comfortably inside its own window but
        // together exceeding a single one.
        for _ in 0..2 {
            tokio::time::sleep(Duration::from_millis(60)).await;
            remote.write_all(b"x").await.unwrap();
            let mut buf = [0u8; 1];
            stream.read_exact(&mut buf).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_unset_deadlines_block_like_the_bare_stream() {
        let (local, mut remote) = tokio::io::duplex(64);
        let mut stream = DeadlineStream::new(local);

        let reader = tokio::spawn(async move {
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).await.unwrap();
            buf
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        remote.write_all(b"later").await.unwrap();
        assert_eq!(&reader.await.unwrap(), b"later");
    }

    #[tokio::test]
    async fn test_write_times_out_when_peer_stops_reading() {
        // Tiny buffer that the peer never drains.
        let (local, _remote) = tokio::io::duplex(4);
        let mut stream = DeadlineStream::new(local).with_write_timeout(Duration::from_millis(50));

        let err = stream.write_all(&[0u8; 64]).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }
}
