// Resource-to-pipe transfer task with cooperative, per-chunk cancellation.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::pipe::PipeWriter;
use crate::config::STREAM_CHUNK_BYTES;
use crate::engine::stats::{TransferOutcome, TransferStats};
use crate::error::TransferError;

/// One in-flight copy of a raw resource into a pipe. Owned by its task.
pub struct StreamRequest {
    resource_id: String,
    writer: PipeWriter,
    /// Cancelled when the owning provider shuts down.
    scope: CancellationToken,
    /// Cancellation signal supplied by the caller of `open_file`.
    signal: Option<CancellationToken>,
    total: u64,
    started: Instant,
}

impl StreamRequest {
    pub fn new(
        resource_id: impl Into<String>,
        writer: PipeWriter,
        scope: CancellationToken,
        signal: Option<CancellationToken>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            writer,
            scope,
            signal,
            total: 0,
            started: Instant::now(),
        }
    }

    fn ensure_active(&self) -> Result<(), TransferError> {
        if self.scope.is_cancelled() {
            return Err(TransferError::Cancelled);
        }
        if self.signal.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(TransferError::Cancelled);
        }
        Ok(())
    }

    /// Cancellation is checked once per chunk, after a pipe slot is held, so
    /// a cancel seen here always leaves room for the error item.
    async fn copy_from<R>(&mut self, source: &mut R) -> Result<(), TransferError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut buffer = vec![0u8; STREAM_CHUNK_BYTES];

        loop {
            let read = source.read(&mut buffer).await?;
            if read == 0 {
                return Ok(());
            }

            let slot = self
                .writer
                .reserve()
                .await
                .map_err(|_| TransferError::ReaderClosed)?;
            self.ensure_active()?;

            slot.write(Bytes::copy_from_slice(&buffer[..read]));
            self.total += read as u64;
        }
    }

    /// Copy `source` to the pipe until end-of-stream, cancellation or failure.
    ///
    /// The writer is closed on every exit path; on failure the reader gets an
    /// error item before end-of-stream unless it has already gone away.
    pub async fn run<R>(mut self, source: &mut R, stats: &TransferStats) -> Result<u64, TransferError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let result = self.copy_from(source).await;
        let elapsed = self.started.elapsed();
        let StreamRequest {
            resource_id,
            writer,
            total,
            ..
        } = self;

        // Stats are recorded before the writer closes, so a reader that saw
        // end-of-stream also sees the finished transfer in the stats.
        match result {
            Ok(()) => {
                info!(
                    "transfer {} done: {} bytes, start to stop {} us",
                    resource_id,
                    total,
                    elapsed.as_micros()
                );
                stats.record_transfer(TransferOutcome::Completed, total, elapsed);
                drop(writer);
                Ok(total)
            }
            Err(e) => {
                let outcome = match e {
                    TransferError::Cancelled => {
                        debug!("transfer {} cancelled after {} bytes", resource_id, total);
                        TransferOutcome::Cancelled
                    }
                    TransferError::ReaderClosed | TransferError::Io(_) => {
                        warn!("transfer {} failed after {} bytes: {}", resource_id, total, e);
                        TransferOutcome::Failed
                    }
                };
                stats.record_transfer(outcome, total, elapsed);
                writer.abort(e.to_reader_error()).await;
                Err(e)
            }
        }
    }
}

/// Spawn `request` as an independent task copying from `source`.
pub fn spawn_transfer(
    request: StreamRequest,
    mut source: Box<dyn AsyncRead + Send + Unpin>,
    stats: Arc<TransferStats>,
) -> tokio::task::JoinHandle<Result<u64, TransferError>> {
    stats.record_started();
    tokio::spawn(async move { request.run(source.as_mut(), &stats).await })
}
