use common::DecodeError;

/// Failure of one navigation request.
///
/// The variants map onto distinct response classes: a malformed address is
/// the client's fault, a store failure is ours, and cancellation means the
/// caller stopped waiting.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("store query failed: {0:#}")]
    Execution(#[source] anyhow::Error),
    #[error("request cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Decode(_) => "decode",
            EngineError::Execution(_) => "execution",
            EngineError::Cancelled => "cancelled",
        }
    }
}
