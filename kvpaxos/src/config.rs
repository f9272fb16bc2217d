use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::directory::Directory;
use crate::error::Result;
use crate::message::Address;
use crate::node::{Node, NodeOptions};
use crate::role::acceptor::FaultPolicy;
use crate::server;
use crate::transport::TcpNetwork;

#[derive(Clone, Debug)]
pub struct Config {
    /// Address this node listens on and registers under
    addr: Address,

    /// Address of the directory service
    coordinator: Address,

    /// Live peer to copy the dictionary from on startup
    recover_from: Option<Address>,

    options: NodeOptions,
}

impl Config {
    pub fn new(addr: Address, coordinator: Address) -> Self {
        Config {
            addr,
            coordinator,
            recover_from: None,
            options: NodeOptions::default(),
        }
    }

    /// Timeout for detecting unresponsive peers
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Deadline for each acceptor decision
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.options.deadline = deadline;
        self
    }

    pub fn with_fault_probability(mut self, probability: f64) -> Result<Self> {
        self.options.faults = FaultPolicy::new(probability)?;
        Ok(self)
    }

    pub fn with_recovery(mut self, peer: Address) -> Self {
        self.recover_from = Some(peer);
        self
    }

    /// Binds the listener, recovers from a peer if configured,
    /// registers with the directory, and serves until the process exits.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind((self.addr.host.as_str(), self.addr.port)).await?;
        let node = Arc::new(Node::new(
            self.addr.clone(),
            self.coordinator.clone(),
            Arc::new(TcpNetwork),
            self.options,
        ));

        if let Some(peer) = &self.recover_from {
            node.restart(peer).await;
        }

        node.register().await?;
        info!("server starts on {}", self.addr);
        server::serve(listener, node).await
    }
}

/// Serves a fresh directory at `addr` until the process exits.
pub async fn run_coordinator(addr: Address) -> Result<()> {
    let listener = TcpListener::bind((addr.host.as_str(), addr.port)).await?;
    info!("coordinator starts on {}", addr);
    server::serve(listener, Arc::new(Directory::new())).await
}
