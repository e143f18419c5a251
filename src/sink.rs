//! Metrics sink.
//!
//! One formatted line is written per flush. collectd's exec plugin reads
//! the process's stdout, so production output goes there while logs go to
//! stderr. Writes are async so a stalled reader never parks a runtime
//! worker.

use crate::error::BridgeError;
use async_trait::async_trait;
use tokio::io::{self, AsyncWrite, AsyncWriteExt};

/// Destination for formatted metrics lines.
#[async_trait]
pub trait MetricsSink: Send {
    /// Write one line. The sink appends the line terminator.
    async fn emit(&mut self, line: &str) -> Result<(), BridgeError>;
}

/// Writes newline-terminated lines to any async writer and flushes after each.
pub struct LineSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl LineSink<io::Stdout> {
    /// Sink writing to the process's stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MetricsSink for LineSink<W> {
    async fn emit(&mut self, line: &str) -> Result<(), BridgeError> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');

        self.writer.write_all(&buf).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct ClosedPipe;

    impl AsyncWrite for ClosedPipe {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "reader went away",
            )))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_line_sink_terminates_lines() {
        let mut sink = LineSink::new(Vec::new());
        sink.emit("PUTVAL a/fedmsg/fedmsg_wallboard interval=2 1:0")
            .await
            .unwrap();
        sink.emit("PUTVAL a/fedmsg/fedmsg_wallboard interval=2 3:1")
            .await
            .unwrap();

        let written = String::from_utf8(sink.writer).unwrap();
        assert_eq!(
            written,
            "PUTVAL a/fedmsg/fedmsg_wallboard interval=2 1:0\n\
             PUTVAL a/fedmsg/fedmsg_wallboard interval=2 3:1\n"
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_reported() {
        let mut sink = LineSink::new(ClosedPipe);
        let err = sink.emit("PUTVAL x").await.unwrap_err();
        assert!(matches!(err, BridgeError::SinkEmit(_)));
    }

    #[tokio::test]
    async fn test_full_pipe_does_not_block_the_runtime() {
        // A pipe nobody reads: the write pends instead of blocking.
        let (writer, _reader) = tokio::io::duplex(8);
        let mut sink = LineSink::new(writer);

        let pending = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            sink.emit("PUTVAL host/fedmsg/fedmsg_wallboard interval=2 1:0"),
        )
        .await;
        assert!(pending.is_err());
    }
}
