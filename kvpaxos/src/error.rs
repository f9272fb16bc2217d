//! # Summary
//!
//! Failures that can occur while talking to other processes. None of these
//! are fatal: the consensus path logs them and treats the peer as absent.

use crate::message::Address;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Could not open a connection to the given address
    #[error("{addr} is unreachable: {source}")]
    Unreachable {
        addr: Address,
        #[source]
        source: std::io::Error,
    },

    /// The remote side did not answer within the per-call timeout
    #[error("call to {addr} timed out")]
    Timeout { addr: Address },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode or decode message: {0}")]
    Codec(#[from] bincode::Error),

    /// The remote side hung up before answering
    #[error("connection closed by peer")]
    Closed,

    /// The remote side answered with the wrong kind of response
    #[error("expected {expected} response, received {received}")]
    Unexpected {
        expected: &'static str,
        received: String,
    },

    /// The remote side does not host the requested service
    #[error("{addr} does not serve this request")]
    Unsupported { addr: Address },

    #[error("invalid configuration: {0}")]
    Config(String),
}
