//! # Summary
//!
//! This module defines the receiving side of every remote call.
//!
//! A `Handler` answers requests for one service (a node or the directory).
//! `serve` accepts TCP connections and spawns one task per connection,
//! answering frames in the order they arrive.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::message::{Request, Response};
use crate::socket::Socket;

#[async_trait::async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, request: Request) -> Response;
}

/// Source of incoming connections for `serve`.
#[async_trait::async_trait]
pub(crate) trait Incoming: Send + 'static {
    async fn next(&mut self) -> io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait::async_trait]
impl Incoming for TcpListener {
    async fn next(&mut self) -> io::Result<(TcpStream, SocketAddr)> {
        self.accept().await
    }
}

/// Pause after a failed accept, so that exhausted descriptors do not spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accepts connections forever. Failures on a single connection only
/// terminate that connection, and failed accepts are logged and retried.
pub async fn serve(listener: TcpListener, handler: Arc<dyn Handler>) -> crate::Result<()> {
    serve_incoming(listener, handler).await
}

pub(crate) async fn serve_incoming<I: Incoming>(mut incoming: I, handler: Arc<dyn Handler>) -> crate::Result<()> {
    loop {
        let (stream, remote) = match incoming.next().await {
        | Ok(accepted) => accepted,
        | Err(error) => {
            warn!("failed to accept connection: {}", error);
            tokio::time::sleep(ACCEPT_BACKOFF).await;
            continue
        }
        };
        trace!("accepted connection from {}", remote);
        let handler = handler.clone();
        tokio::spawn(async move {
            let mut socket = Socket::new(stream);
            loop {
                let request = match socket.recv::<Request>().await {
                | Ok(Some(request)) => request,
                | Ok(None) => break,
                | Err(error) => {
                    warn!("dropping connection from {}: {}", remote, error);
                    break
                }
                };
                trace!("received {:?} from {}", request, remote);
                let response = handler.handle(request).await;
                if let Err(error) = socket.send(&response).await {
                    warn!("failed to respond to {}: {}", remote, error);
                    break
                }
            }
            trace!("closed connection from {}", remote);
        });
    }
}
