use tokio::net::TcpStream;

use crate::error::{Error, Result};
use crate::message::{Address, Request, Response};
use crate::socket::Socket;
use crate::transport::{Connection, Network};

#[derive(Copy, Clone, Debug, Default)]
pub struct TcpNetwork;

#[async_trait::async_trait]
impl Network for TcpNetwork {
    async fn connect(&self, addr: &Address) -> Result<Box<dyn Connection>> {
        let stream = TcpStream::connect((addr.host.as_str(), addr.port))
            .await
            .map_err(|source| Error::Unreachable { addr: addr.clone(), source })?;
        stream.set_nodelay(true)?;
        Ok(Box::new(TcpConnection(Socket::new(stream))))
    }
}

struct TcpConnection(Socket);

#[async_trait::async_trait]
impl Connection for TcpConnection {
    async fn call(&mut self, request: Request) -> Result<Response> {
        self.0.call(&request).await
    }
}
