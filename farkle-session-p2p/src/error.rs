/// P2P infrastructure errors
///
/// Nothing here is fatal to the process: every failure degrades to "stay in
/// the current state and let the user retry or leave".
#[derive(Debug, thiserror::Error)]
pub enum P2PError {
    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Not connected to a host")]
    NotConnectedToHost,

    #[error("Peer not found: {0}")]
    PeerNotFound(String),

    #[error("Invalid session code: {0}")]
    InvalidSessionCode(String),

    #[error("Local turn unavailable: {0}")]
    LocalTurnUnavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, P2PError>;
