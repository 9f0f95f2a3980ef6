//! Errors the peer driver can report to its caller.

use chainidx_chain::serialization::SerializationError;

/// Failure to establish a usable connection to the remote peer.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    #[error("TCP dial to {0} failed: {1}")]
    Dial(std::net::SocketAddr, #[source] std::io::Error),

    #[error("handshake failed: {0}")]
    Handshake(#[source] PeerError),

    #[error("peer's protocol version {0:?} is below the minimum supported version")]
    ProtocolVersionTooLow(crate::types::ProtocolVersion),
}

/// A failure while the connection was already established.
#[derive(thiserror::Error, Debug)]
pub enum PeerError {
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed message: {0}")]
    Malformed(#[from] SerializationError),

    #[error("peer sent an unexpected message during the handshake: {0}")]
    UnexpectedDuringHandshake(&'static str),
}
