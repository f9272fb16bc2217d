//! # Summary
//!
//! This module contains the three Paxos roles played by every node.
//!
//! The roles are logic partitions of a single `Node`, not separately
//! addressable services: the node owns the state and routes each remote
//! call to the role responsible for it.

/// Vote keeper.
pub(crate) mod acceptor;

/// Dictionary writer.
pub(crate) mod learner;

/// Round driver.
pub(crate) mod proposer;
