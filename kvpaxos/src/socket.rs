//! # Summary
//!
//! This module abstracts over TCP connections between processes.
//!
//! Wraps `tokio`'s TCP stream in a length-delimited codec and encodes each
//! frame with `bincode`. This allows us to send and receive Rust structs
//! through a TCP connection with minimal boilerplate on both ends.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::{Error, Result};

/// Bidirectional channel of length-delimited, bincode-encoded frames.
pub struct Socket(Framed<TcpStream, LengthDelimitedCodec>);

impl Socket {
    pub fn new(stream: TcpStream) -> Self {
        Socket(Framed::new(stream, LengthDelimitedCodec::new()))
    }

    pub async fn send<T: serde::Serialize>(&mut self, message: &T) -> Result<()> {
        let frame = bincode::serialize(message)?;
        self.0.send(bytes::Bytes::from(frame)).await?;
        Ok(())
    }

    /// Returns `None` once the other end has closed the connection.
    pub async fn recv<T: serde::de::DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.0.next().await {
        | None => Ok(None),
        | Some(frame) => Ok(Some(bincode::deserialize(&frame?)?)),
        }
    }

    /// Sends a single message and waits for its reply.
    pub async fn call<T, R>(&mut self, message: &T) -> Result<R>
        where T: serde::Serialize,
              R: serde::de::DeserializeOwned,
    {
        self.send(message).await?;
        self.recv().await?.ok_or(Error::Closed)
    }
}
