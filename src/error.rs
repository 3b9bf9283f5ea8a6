// Error types for the content provider surface and its transfer tasks.

use std::io;

use thiserror::Error;

/// Errors returned synchronously by the content provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Invalid mode {0}")]
    InvalidMode(String),

    #[error("File not found {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Why a transfer task stopped before reaching end-of-stream.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer cancelled")]
    Cancelled,

    #[error("reader closed the pipe")]
    ReaderClosed,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TransferError {
    /// Error item delivered to the reader when the transfer aborts.
    pub(crate) fn to_reader_error(&self) -> io::Error {
        match self {
            TransferError::Cancelled => {
                io::Error::new(io::ErrorKind::ConnectionAborted, "transfer cancelled")
            }
            TransferError::ReaderClosed => io::Error::from(io::ErrorKind::BrokenPipe),
            TransferError::Io(e) => io::Error::new(e.kind(), e.to_string()),
        }
    }
}
