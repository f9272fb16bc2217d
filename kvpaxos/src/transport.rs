//! # Summary
//!
//! This module abstracts over how requests reach other processes.
//!
//! A `Network` opens a `Connection` to an address. Connections are opened
//! lazily for each logical call and never cached, since the set of live
//! processes can change between any two calls. Timeouts are applied by the
//! typed stubs in `client`, not here.

use crate::error::Result;
use crate::message::{Address, Request, Response};

/// In-process address table.
pub mod local;

/// TCP with length-delimited bincode frames.
pub mod tcp;

pub use self::local::LocalNetwork;
pub use self::tcp::TcpNetwork;

#[async_trait::async_trait]
pub trait Network: Send + Sync + 'static {
    /// Resolves `addr` to a callable handle, failing if nothing is listening there.
    async fn connect(&self, addr: &Address) -> Result<Box<dyn Connection>>;
}

#[async_trait::async_trait]
pub trait Connection: Send {
    async fn call(&mut self, request: Request) -> Result<Response>;
}
