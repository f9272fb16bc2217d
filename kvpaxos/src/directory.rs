//! # Summary
//!
//! This module implements the membership directory: the append-only set of
//! nodes that supplies acceptors and learners to every consensus round.
//! Entries are never evicted, so a crashed node stays discoverable and is
//! simply skipped by callers that cannot reach it.

use std::collections::BTreeSet as Set;

use parking_lot::RwLock;

use crate::message::{Address, Request, Response};
use crate::server::Handler;

#[derive(Debug, Default)]
pub struct Directory {
    servers: RwLock<Set<Address>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert.
    pub fn add_server(&self, server: Address) {
        if self.servers.write().insert(server.clone()) {
            info!("registered {}", server);
        } else {
            debug!("{} already registered", server);
        }
    }

    /// Current membership in ascending address order.
    pub fn get_server(&self) -> Vec<Address> {
        self.servers.read().iter().cloned().collect()
    }
}

#[async_trait::async_trait]
impl Handler for Directory {
    async fn handle(&self, request: Request) -> Response {
        match request {
        | Request::AddServer(server) => {
            self.add_server(server);
            Response::Added
        }
        | Request::GetServer => Response::Servers(self.get_server()),
        | other => {
            warn!("directory received unsupported request {:?}", other);
            Response::Unsupported
        }
        }
    }
}
