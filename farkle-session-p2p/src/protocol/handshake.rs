use crate::domain::SessionCode;
use crate::protocol::PROTOCOL_VERSION;

/// Where a peer stands in the join handshake
///
/// `connecting → awaiting greeting → established`; only established peers
/// take part in gameplay. Everything else they send is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    /// Raw connection requested, not yet up
    Connecting,
    /// Connection up, Greeting (client side: Welcome) not yet processed
    AwaitingGreeting,
    /// Handshake complete, peer is part of the session
    Established,
}

/// Why a Greeting was not accepted
///
/// The host never answers a bad greeting; the stalled connection is the
/// rejection signal. These errors only reach the host's own log.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HandshakeError {
    #[error("Protocol version {theirs} is incompatible with ours ({ours})")]
    VersionMismatch { theirs: u16, ours: u16 },

    #[error("Session code {0} does not match the active session")]
    WrongSessionCode(SessionCode),
}

/// Host-side validation of an incoming Greeting
pub fn validate_greeting(
    active_code: &SessionCode,
    desired_code: &SessionCode,
    their_version: u16,
) -> Result<(), HandshakeError> {
    if their_version != PROTOCOL_VERSION {
        return Err(HandshakeError::VersionMismatch {
            theirs: their_version,
            ours: PROTOCOL_VERSION,
        });
    }
    if desired_code != active_code {
        return Err(HandshakeError::WrongSessionCode(desired_code.clone()));
    }
    Ok(())
}
