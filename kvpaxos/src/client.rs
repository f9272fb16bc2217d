//! # Summary
//!
//! Typed stubs over a `Network`. Every call is bounded by a per-call
//! timeout, and every response is checked against the expected variant.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::message::{Address, DeleteStatus, Operation, ProposalId, Request, Response, Snapshot, Vote};
use crate::transport::{Connection, Network};

async fn call(
    connection: &mut dyn Connection,
    addr: &Address,
    timeout: Duration,
    request: Request,
) -> Result<Response> {
    match tokio::time::timeout(timeout, connection.call(request)).await {
    | Ok(Ok(Response::Unsupported)) => Err(Error::Unsupported { addr: addr.clone() }),
    | Ok(result) => result,
    | Err(_) => Err(Error::Timeout { addr: addr.clone() }),
    }
}

async fn connect(network: &dyn Network, addr: &Address, timeout: Duration) -> Result<Box<dyn Connection>> {
    match tokio::time::timeout(timeout, network.connect(addr)).await {
    | Ok(result) => result,
    | Err(_) => Err(Error::Timeout { addr: addr.clone() }),
    }
}

fn unexpected<T>(expected: &'static str, received: Response) -> Result<T> {
    Err(Error::Unexpected { expected, received: received.kind().to_string() })
}

/// Resolved handle to another node's consensus surface. Meant to live
/// for a single round or broadcast, then be dropped.
pub struct PeerClient {
    addr: Address,
    timeout: Duration,
    connection: Box<dyn Connection>,
}

impl PeerClient {
    pub async fn resolve(network: &dyn Network, addr: &Address, timeout: Duration) -> Result<Self> {
        let connection = connect(network, addr, timeout).await?;
        Ok(PeerClient { addr: addr.clone(), timeout, connection })
    }

    pub fn addr(&self) -> &Address {
        &self.addr
    }

    async fn call(&mut self, request: Request) -> Result<Response> {
        call(&mut *self.connection, &self.addr, self.timeout, request).await
    }

    pub async fn promise(&mut self, id: ProposalId) -> Result<Vote> {
        match self.call(Request::Promise(id)).await? {
        | Response::Vote(vote) => Ok(vote),
        | other => unexpected("vote", other),
        }
    }

    pub async fn accept(&mut self, id: ProposalId) -> Result<Vote> {
        match self.call(Request::Accept(id)).await? {
        | Response::Vote(vote) => Ok(vote),
        | other => unexpected("vote", other),
        }
    }

    pub async fn learn(&mut self, operation: Operation) -> Result<bool> {
        match self.call(Request::Learn(operation)).await? {
        | Response::Learned(learned) => Ok(learned),
        | other => unexpected("learned", other),
        }
    }

    pub async fn copy_data_store(&mut self) -> Result<Snapshot> {
        match self.call(Request::CopyDataStore).await? {
        | Response::DataStore(snapshot) => Ok(snapshot),
        | other => unexpected("data store", other),
        }
    }

    pub async fn port_num(&mut self) -> Result<u16> {
        match self.call(Request::GetPortNum).await? {
        | Response::PortNum(port) => Ok(port),
        | other => unexpected("port number", other),
        }
    }

    pub async fn coordinator(&mut self) -> Result<Address> {
        match self.call(Request::GetCoordinator).await? {
        | Response::Coordinator(addr) => Ok(addr),
        | other => unexpected("coordinator", other),
        }
    }
}

/// Remote handle to the membership directory. Connects on every call.
#[derive(Derivative)]
#[derivative(Clone, Debug)]
pub struct DirectoryClient {
    addr: Address,
    #[derivative(Debug = "ignore")]
    network: Arc<dyn Network>,
    timeout: Duration,
}

impl DirectoryClient {
    pub fn new(addr: Address, network: Arc<dyn Network>, timeout: Duration) -> Self {
        DirectoryClient { addr, network, timeout }
    }

    pub fn addr(&self) -> &Address {
        &self.addr
    }

    async fn call(&self, request: Request) -> Result<Response> {
        let mut connection = connect(&*self.network, &self.addr, self.timeout).await?;
        call(&mut *connection, &self.addr, self.timeout, request).await
    }

    pub async fn add_server(&self, server: Address) -> Result<()> {
        match self.call(Request::AddServer(server)).await? {
        | Response::Added => Ok(()),
        | other => unexpected("added", other),
        }
    }

    pub async fn get_server(&self) -> Result<Vec<Address>> {
        match self.call(Request::GetServer).await? {
        | Response::Servers(servers) => Ok(servers),
        | other => unexpected("servers", other),
        }
    }
}

/// Client-facing handle to a single node. Connects on every call.
#[derive(Derivative)]
#[derivative(Clone, Debug)]
pub struct StoreClient {
    addr: Address,
    #[derivative(Debug = "ignore")]
    network: Arc<dyn Network>,
    timeout: Duration,
}

impl StoreClient {
    pub fn new(addr: Address, network: Arc<dyn Network>, timeout: Duration) -> Self {
        StoreClient { addr, network, timeout }
    }

    async fn call(&self, request: Request) -> Result<Response> {
        let mut connection = connect(&*self.network, &self.addr, self.timeout).await?;
        call(&mut *connection, &self.addr, self.timeout, request).await
    }

    pub async fn put(&self, key: String, value: String) -> Result<bool> {
        match self.call(Request::Put { key, value }).await? {
        | Response::Put(put) => Ok(put),
        | other => unexpected("put", other),
        }
    }

    pub async fn get(&self, key: String) -> Result<Option<String>> {
        match self.call(Request::Get { key }).await? {
        | Response::Get(value) => Ok(value),
        | other => unexpected("get", other),
        }
    }

    pub async fn delete(&self, key: String) -> Result<DeleteStatus> {
        match self.call(Request::Delete { key }).await? {
        | Response::Delete(status) => Ok(status),
        | other => unexpected("delete", other),
        }
    }
}
