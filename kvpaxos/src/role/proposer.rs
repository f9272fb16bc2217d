//! # Summary
//!
//! This module defines the `Proposer`, which runs a two-phase round against
//! a snapshot of the directory to gain permission to commit an operation.
//!
//! Rounds on one node are serialized by a mutex, but nothing orders rounds
//! across nodes: competing proposers race at the acceptors, and the proposal
//! id comparison there decides the winner. Failed rounds are not retried.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::future::join_all;

use crate::client::PeerClient;
use crate::message::{Address, ProposalId, Vote};
use crate::transport::Network;

pub(crate) struct Proposer {
    addr: Address,
    network: Arc<dyn Network>,
    timeout: Duration,

    /// Held for the duration of a round
    turn: tokio::sync::Mutex<()>,

    /// Last round number handed out by this node
    last_round: parking_lot::Mutex<u64>,
}

/// Smallest number of granted votes out of `count` that wins a phase.
pub(crate) fn majority(count: usize) -> usize {
    count / 2 + 1
}

impl Proposer {
    pub fn new(addr: Address, network: Arc<dyn Network>, timeout: Duration) -> Self {
        Proposer {
            addr,
            network,
            timeout,
            turn: tokio::sync::Mutex::new(()),
            last_round: parking_lot::Mutex::new(0),
        }
    }

    /// Wall-clock microseconds, bumped past the previous round if the clock
    /// has not advanced. Strictly increasing per node; ties across nodes are
    /// broken by address.
    pub fn next_id(&self) -> ProposalId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_micros() as u64)
            .unwrap_or_default();
        let mut last = self.last_round.lock();
        *last = std::cmp::max(now, *last + 1);
        ProposalId::new(*last, self.addr.clone())
    }

    /// Returns the round's id and whether both phases gathered a majority of
    /// the reachable `peers`. Peers that cannot be resolved are left out of the
    /// count; an empty set of acceptors never reaches a majority.
    pub async fn propose(&self, peers: &[Address]) -> (ProposalId, bool) {
        let _turn = self.turn.lock().await;
        let id = self.next_id();
        let mut acceptors = self.resolve(peers).await;
        let majority = majority(acceptors.len());
        info!(
            "proposing {} to {} of {} peers, majority {}",
            id, acceptors.len(), peers.len(), majority,
        );

        // Phase 1: prepare
        let votes = join_all(acceptors.iter_mut().map(|acceptor| {
            let id = id.clone();
            async move {
                let vote = acceptor.promise(id).await;
                (acceptor.addr().clone(), vote)
            }
        }))
        .await;

        let promised = Self::tally("prepare", &id, votes);
        if promised < majority {
            info!("prepare: {} failed with {}/{} promises", id, promised, majority);
            return (id, false)
        }

        // Phase 2: accept
        let votes = join_all(acceptors.iter_mut().map(|acceptor| {
            let id = id.clone();
            async move {
                let vote = acceptor.accept(id).await;
                (acceptor.addr().clone(), vote)
            }
        }))
        .await;

        let accepted = Self::tally("accept", &id, votes);
        if accepted < majority {
            info!("accept: {} failed with {}/{} acceptances", id, accepted, majority);
            return (id, false)
        }

        info!("{} chosen with {} promises and {} acceptances", id, promised, accepted);
        (id, true)
    }

    /// Best-effort: peers that cannot be reached are logged and left out.
    async fn resolve(&self, peers: &[Address]) -> Vec<PeerClient> {
        let network = &*self.network;
        let timeout = self.timeout;
        join_all(peers.iter().map(|peer| async move {
            PeerClient::resolve(network, peer, timeout)
                .await
                .map_err(|error| warn!("skipping acceptor {}: {}", peer, error))
                .ok()
        }))
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    fn tally<I, E>(phase: &'static str, id: &ProposalId, votes: I) -> usize
        where I: IntoIterator<Item = (Address, Result<Vote, E>)>,
              E: std::fmt::Display,
    {
        let mut granted = 0;
        for (acceptor, vote) in votes {
            match vote {
            | Ok(Vote::Granted) => {
                granted += 1;
                debug!("{}: {} granted {}", phase, acceptor, id);
            }
            | Ok(Vote::Rejected) => debug!("{}: {} rejected {}", phase, acceptor, id),
            | Ok(Vote::Abstained) => warn!("{}: {} did not respond to {}", phase, acceptor, id),
            | Err(error) => warn!("{}: {} did not respond to {}: {}", phase, acceptor, id, error),
            }
        }
        granted
    }
}
