use std::collections::HashMap as Map;
use std::io;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::message::{Address, Request, Response};
use crate::server::Handler;
use crate::transport::{Connection, Network};

/// Routes calls to handlers living in the same process. Unregistering an
/// address models a crashed process: later connects fail as unreachable,
/// while the directory keeps listing it.
#[derive(Clone, Default)]
pub struct LocalNetwork(Arc<RwLock<Map<Address, Arc<dyn Handler>>>>);

impl LocalNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `handler` reachable at `addr`, replacing any previous handler.
    pub fn register(&self, addr: Address, handler: Arc<dyn Handler>) {
        self.0.write().insert(addr, handler);
    }

    /// Makes `addr` unreachable.
    pub fn crash(&self, addr: &Address) {
        self.0.write().remove(addr);
    }

    pub fn is_reachable(&self, addr: &Address) -> bool {
        self.0.read().contains_key(addr)
    }
}

#[async_trait::async_trait]
impl Network for LocalNetwork {
    async fn connect(&self, addr: &Address) -> Result<Box<dyn Connection>> {
        match self.0.read().get(addr) {
        | Some(handler) => Ok(Box::new(LocalConnection(handler.clone()))),
        | None => Err(Error::Unreachable {
            addr: addr.clone(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "no handler registered"),
        }),
        }
    }
}

struct LocalConnection(Arc<dyn Handler>);

#[async_trait::async_trait]
impl Connection for LocalConnection {
    async fn call(&mut self, request: Request) -> Result<Response> {
        Ok(self.0.handle(request).await)
    }
}
