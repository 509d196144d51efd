use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} returned for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Response for {0} has no body")]
    MissingBody(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` if the error originated on the network side of a bridge.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            BridgeError::Transport(_)
                | BridgeError::HttpStatus { .. }
                | BridgeError::MissingBody(_)
                | BridgeError::StreamInterrupted(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
