//! # Summary
//!
//! This module defines the `Node`, a single replica of the key-value store.
//!
//! A node owns its dictionary and its highest promised proposal id, and
//! plays all three Paxos roles over them. Writes go through a consensus
//! round followed by a best-effort broadcast to every registered node;
//! reads never leave the node.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{DirectoryClient, PeerClient};
use crate::message::{Address, DeleteStatus, Operation, ProposalId, Request, Response, Snapshot, Vote};
use crate::role::acceptor::{Acceptor, FaultPolicy};
use crate::role::learner::Learner;
use crate::role::proposer::Proposer;
use crate::server::Handler;
use crate::transport::Network;

/// Tunables for a single node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NodeOptions {
    /// Bound on every outgoing remote call
    pub timeout: Duration,

    /// Bound on every acceptor decision
    pub deadline: Duration,

    /// Failure simulation for the acceptor
    pub faults: FaultPolicy,
}

impl Default for NodeOptions {
    fn default() -> Self {
        NodeOptions {
            timeout: Duration::from_secs(2),
            deadline: Duration::from_secs(2),
            faults: FaultPolicy::default(),
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct Node {
    addr: Address,
    directory: DirectoryClient,
    #[derivative(Debug = "ignore")]
    network: Arc<dyn Network>,
    timeout: Duration,
    #[derivative(Debug = "ignore")]
    proposer: Proposer,
    #[derivative(Debug = "ignore")]
    acceptor: Acceptor,
    learner: Learner,
}

impl Node {
    pub fn new(addr: Address, coordinator: Address, network: Arc<dyn Network>, options: NodeOptions) -> Self {
        Node {
            directory: DirectoryClient::new(coordinator, network.clone(), options.timeout),
            proposer: Proposer::new(addr.clone(), network.clone(), options.timeout),
            acceptor: Acceptor::new(options.faults, options.deadline),
            learner: Learner::default(),
            timeout: options.timeout,
            network,
            addr,
        }
    }

    pub fn addr(&self) -> &Address {
        &self.addr
    }

    pub fn port_num(&self) -> u16 {
        self.addr.port
    }

    /// Address of the directory service this node registers with.
    pub fn coordinator(&self) -> &Address {
        self.directory.addr()
    }

    pub fn max_promised(&self) -> Option<ProposalId> {
        self.acceptor.max_promised()
    }

    /// Adds this node to the directory.
    pub async fn register(&self) -> crate::Result<()> {
        self.directory.add_server(self.addr.clone()).await?;
        info!("{} registered with coordinator {}", self.addr, self.directory.addr());
        Ok(())
    }

    pub async fn put(&self, key: String, value: String) -> bool {
        info!("PUT {} => {}", key, value);
        self.commit(Operation::Put { key, value })
            .await
            .unwrap_or(false)
    }

    /// Local read; never consults other nodes.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = self.learner.get(key);
        match &value {
        | Some(value) => info!("GET {} => {}", key, value),
        | None => warn!("GET {}: key not found", key),
        }
        value
    }

    pub async fn delete(&self, key: String) -> DeleteStatus {
        info!("DELETE {}", key);
        match self.commit(Operation::Delete { key }).await {
        | Some(true) => DeleteStatus::FoundDeleted,
        | Some(false) => DeleteStatus::NotFound,
        | None => DeleteStatus::ConsensusFailed,
        }
    }

    pub async fn promise(&self, id: ProposalId) -> Vote {
        self.acceptor.promise(id).await
    }

    pub async fn accept(&self, id: ProposalId) -> Vote {
        self.acceptor.accept(id).await
    }

    pub fn learn(&self, operation: Operation) -> bool {
        self.learner.learn(operation)
    }

    pub fn copy_data_store(&self) -> Snapshot {
        self.learner.snapshot()
    }

    /// Replaces the local dictionary; used by recovery.
    pub(crate) fn install(&self, data: Snapshot) {
        self.learner.install(data)
    }

    pub(crate) fn network(&self) -> &dyn Network {
        &*self.network
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs a consensus round for `operation` and, if it succeeds, broadcasts it.
    /// Returns `None` if consensus failed, otherwise the broadcast result.
    async fn commit(&self, operation: Operation) -> Option<bool> {
        let peers = match self.directory.get_server().await {
        | Ok(peers) => peers,
        | Err(error) => {
            error!("could not read directory {}: {}", self.directory.addr(), error);
            return None
        }
        };
        let (id, chosen) = self.proposer.propose(&peers).await;
        if !chosen {
            warn!("consensus failed for {:?} under {}", operation, id);
            return None
        }
        Some(self.replicate(operation).await)
    }

    /// Sends `operation` to every node currently in the directory, one at a
    /// time, skipping any that cannot be reached. Returns the result reported
    /// by the last node that answered, not an aggregate over all of them.
    async fn replicate(&self, operation: Operation) -> bool {
        let peers = match self.directory.get_server().await {
        | Ok(peers) => peers,
        | Err(error) => {
            error!("could not read directory {}: {}", self.directory.addr(), error);
            return false
        }
        };

        let mut learned = false;
        for peer in &peers {
            let result = match PeerClient::resolve(self.network(), peer, self.timeout).await {
            | Ok(mut learner) => learner.learn(operation.clone()).await,
            | Err(error) => Err(error),
            };
            match result {
            | Ok(result) => {
                debug!("{} learned {:?}: {}", peer, operation, result);
                learned = result;
            }
            | Err(error) => warn!("skipping learner {}: {}", peer, error),
            }
        }
        learned
    }
}

#[async_trait::async_trait]
impl Handler for Node {
    async fn handle(&self, request: Request) -> Response {
        match request {
        | Request::Promise(id) => Response::Vote(self.promise(id).await),
        | Request::Accept(id) => Response::Vote(self.accept(id).await),
        | Request::Learn(operation) => Response::Learned(self.learn(operation)),
        | Request::CopyDataStore => Response::DataStore(self.copy_data_store()),
        | Request::GetPortNum => Response::PortNum(self.port_num()),
        | Request::GetCoordinator => Response::Coordinator(self.coordinator().clone()),
        | Request::Put { key, value } => Response::Put(self.put(key, value).await),
        | Request::Get { key } => Response::Get(self.get(&key)),
        | Request::Delete { key } => Response::Delete(self.delete(key).await),
        | other @ Request::AddServer(_)
        | other @ Request::GetServer => {
            warn!("{} received directory request {:?}", self.addr, other);
            Response::Unsupported
        }
        }
    }
}
