//! # Summary
//!
//! A replicated key-value store. Every write is ordered by a single-decree
//! Paxos round run against the set of nodes currently registered with a
//! membership directory, then broadcast to every registered node.
//! Reads are served from the local dictionary only.

#[macro_use] extern crate derivative;
#[macro_use] extern crate log;

mod client;
mod config;
mod directory;
mod error;
mod message;
mod node;
mod recovery;
mod role;
mod server;
mod socket;

pub mod transport;

pub use crate::client::{DirectoryClient, PeerClient, StoreClient};
pub use crate::config::{run_coordinator, Config};
pub use crate::directory::Directory;
pub use crate::error::{Error, Result};
pub use crate::message::{Address, DeleteStatus, Operation, ProposalId, Request, Response, Snapshot, Vote};
pub use crate::node::{Node, NodeOptions};
pub use crate::role::acceptor::FaultPolicy;
pub use crate::server::{serve, Handler};
