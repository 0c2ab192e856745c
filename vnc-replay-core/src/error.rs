//! The error taxonomy for a replay run.
//!
//! One `thiserror` enum, one variant per stable token a replay can fail or
//! recover with. Classification lives on the type (`is_fatal`/
//! `is_recoverable`) so call sites never have to re-derive which tokens are
//! which.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("unsupported security type {0} (only VNC auth, type 2, is supported)")]
    UnsupportedAuth(u8),

    #[error("authentication failed, security result {0}")]
    AuthFailed(u32),

    #[error("client rejected the connection during handshake")]
    ClientRejected,

    #[error("server rejected the connection during handshake")]
    ServerRejected,

    #[error("out-of-order TCP segment unsupported")]
    OutOfOrderUnsupported,

    #[error("unknown message type {r#type} from {dir} at offset {offset:#x}")]
    UnknownMessageType {
        dir: Direction,
        r#type: u8,
        offset: usize,
    },

    #[error("unknown rectangle encoding {0}")]
    UnknownEncoding(i32),

    #[error("zlib stream {0} truncated")]
    ZlibTruncated(usize),

    #[error("invalid pixel format (a channel max of 0)")]
    InvalidPixelFormat,

    #[error("required asset {0:?} missing")]
    AssetMissing(&'static str),
}

/// Which side of the connection a message or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Client,
    Server,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Client => write!(f, "client"),
            Direction::Server => write!(f, "server"),
        }
    }
}

impl ReplayError {
    /// True for handshake failures and any protocol violation that leaves
    /// the two directions in a state the decoder cannot continue from.
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// True for conditions the dispatcher logs and walks past, producing a
    /// partial or error-marked fragment instead of aborting the replay.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReplayError::UnknownMessageType { .. }
                | ReplayError::UnknownEncoding(_)
                | ReplayError::ZlibTruncated(_)
                | ReplayError::InvalidPixelFormat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_errors_are_fatal() {
        assert!(ReplayError::UnsupportedAuth(1).is_fatal());
        assert!(ReplayError::AuthFailed(1).is_fatal());
        assert!(ReplayError::ClientRejected.is_fatal());
        assert!(ReplayError::ServerRejected.is_fatal());
        assert!(ReplayError::OutOfOrderUnsupported.is_fatal());
        assert!(ReplayError::AssetMissing("player.js").is_fatal());
    }

    #[test]
    fn dispatch_errors_are_recoverable() {
        assert!(ReplayError::UnknownMessageType {
            dir: Direction::Client,
            r#type: 200,
            offset: 0x10,
        }
        .is_recoverable());
        assert!(ReplayError::UnknownEncoding(42).is_recoverable());
        assert!(ReplayError::ZlibTruncated(0).is_recoverable());
        assert!(ReplayError::InvalidPixelFormat.is_recoverable());
    }

    #[test]
    fn fatal_and_recoverable_are_exclusive() {
        let all = [
            ReplayError::UnsupportedAuth(1),
            ReplayError::AuthFailed(1),
            ReplayError::ClientRejected,
            ReplayError::ServerRejected,
            ReplayError::OutOfOrderUnsupported,
            ReplayError::UnknownMessageType {
                dir: Direction::Server,
                r#type: 99,
                offset: 0,
            },
            ReplayError::UnknownEncoding(5),
            ReplayError::ZlibTruncated(2),
            ReplayError::InvalidPixelFormat,
            ReplayError::AssetMissing("player.js"),
        ];
        for e in &all {
            assert_ne!(e.is_fatal(), e.is_recoverable());
        }
    }
}
