use thiserror::Error;

/// Errors raised around the lens core: protocol plumbing, argument decoding
/// and handing work to shell sessions or debuggers.
#[derive(Debug, Error)]
pub enum LensError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed message: {0}")]
    Protocol(String),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("cannot quote {0:?} for the shell")]
    Quote(String),

    #[error("terminal session failed: {0}")]
    Session(String),
}

impl LensError {
    /// JSON-RPC error code used when this error is reported to an LSP client.
    pub fn rpc_code(&self) -> i64 {
        match self {
            LensError::InvalidParams(_) => -32602,
            LensError::UnknownCommand(_) => -32601,
            LensError::Protocol(_) | LensError::Json(_) => -32700,
            _ => -32603,
        }
    }
}
