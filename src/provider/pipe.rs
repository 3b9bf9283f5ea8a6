// Bounded in-process pipe: a writable end kept by the transfer task, a readable end for the caller.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;

/// Create a connected pipe that buffers at most `capacity` chunks.
pub fn create_pipe(capacity: usize) -> (PipeWriter, ReadableHandle) {
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(capacity.max(1));
    let writer = PipeWriter { tx };
    let reader = ReadableHandle {
        inner: StreamReader::new(ReceiverStream::new(rx)),
    };
    (writer, reader)
}

/// Writable end. Dropping it closes the pipe; the reader then sees end-of-stream.
#[derive(Debug)]
pub struct PipeWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl PipeWriter {
    /// Write one chunk, waiting while the pipe is full.
    pub async fn write_chunk(&self, chunk: Bytes) -> io::Result<()> {
        self.reserve().await?.write(chunk);
        Ok(())
    }

    /// Wait for room for one item. The slot is released if dropped unused.
    pub async fn reserve(&self) -> io::Result<PipeSlot<'_>> {
        let permit = self
            .tx
            .reserve()
            .await
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(PipeSlot { permit })
    }

    /// Close the pipe with `err` as its last item.
    ///
    /// Waits for room like a chunk write does; a reader that is already gone
    /// makes this a no-op.
    pub async fn abort(self, err: io::Error) {
        let _ = self.tx.send(Err(err)).await;
    }

    pub fn is_reader_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Room for exactly one item in the pipe.
pub struct PipeSlot<'a> {
    permit: mpsc::Permit<'a, io::Result<Bytes>>,
}

impl PipeSlot<'_> {
    pub fn write(self, chunk: Bytes) {
        self.permit.send(Ok(chunk));
    }
}

/// Readable end handed back to the caller of `open_file`.
pub struct ReadableHandle {
    inner: StreamReader<ReceiverStream<io::Result<Bytes>>, Bytes>,
}

impl ReadableHandle {
    /// Consume the handle as a stream of chunks, e.g. for an HTTP response body.
    pub fn into_stream(self) -> ReceiverStream<io::Result<Bytes>> {
        self.inner.into_inner()
    }
}

impl std::fmt::Debug for ReadableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadableHandle").finish_non_exhaustive()
    }
}

impl AsyncRead for ReadableHandle {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncBufRead for ReadableHandle {
    fn poll_fill_buf(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<&[u8]>> {
        Pin::new(&mut self.get_mut().inner).poll_fill_buf(cx)
    }

    fn consume(mut self: Pin<&mut Self>, amt: usize) {
        Pin::new(&mut self.inner).consume(amt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_pipe_delivers_chunks_in_order() {
        let (writer, mut reader) = create_pipe(2);
        tokio::spawn(async move {
            writer.write_chunk(Bytes::from_static(b"hello ")).await.unwrap();
            writer.write_chunk(Bytes::from_static(b"world")).await.unwrap();
        });

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn test_abort_surfaces_error() {
        let (writer, mut reader) = create_pipe(2);
        writer.write_chunk(Bytes::from_static(b"abc")).await.unwrap();
        writer
            .abort(io::Error::new(io::ErrorKind::ConnectionAborted, "stop"))
            .await;

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
        assert_eq!(out, b"abc");
    }

    #[tokio::test]
    async fn test_dropped_reader_breaks_pipe() {
        let (writer, reader) = create_pipe(1);
        drop(reader);
        assert!(writer.is_reader_closed());
        let err = writer.write_chunk(Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_abort_on_full_pipe_waits_for_room() {
        let (writer, mut reader) = create_pipe(1);
        writer.write_chunk(Bytes::from_static(b"full")).await.unwrap();

        let aborted = tokio::spawn(async move {
            writer
                .abort(io::Error::new(io::ErrorKind::ConnectionAborted, "stop"))
                .await;
        });

        let mut out = Vec::new();
        let err = reader.read_to_end(&mut out).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionAborted);
        assert_eq!(out, b"full");
        aborted.await.unwrap();
    }
}
