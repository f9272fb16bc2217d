//! # Summary
//!
//! This module defines the `Acceptor`, which keeps the highest proposal id
//! this node has promised and votes on promise and accept requests.
//!
//! Each decision runs as a separate task under a hard deadline. A decision
//! that misses the deadline, panics, or is dropped by the fault policy is
//! reported as an abstention instead of an error.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;

use crate::error::{Error, Result};
use crate::message::{ProposalId, Vote};

/// Failure simulation applied before every acceptor decision.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaultPolicy {
    /// Chance of abstaining immediately, as if the acceptor were down
    drop_probability: f64,

    /// Artificial delay before each decision
    stall: Duration,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        FaultPolicy {
            drop_probability: 0.1,
            stall: Duration::from_secs(0),
        }
    }
}

impl FaultPolicy {
    pub fn new(drop_probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&drop_probability) {
            return Err(Error::Config(format!(
                "fault probability must be within [0, 1], got {}",
                drop_probability,
            )))
        }
        Ok(FaultPolicy { drop_probability, ..Self::default() })
    }

    /// Never drops and never stalls.
    pub fn none() -> Self {
        FaultPolicy { drop_probability: 0.0, stall: Duration::from_secs(0) }
    }

    pub fn with_stall(mut self, stall: Duration) -> Self {
        self.stall = stall;
        self
    }

    pub fn drop_probability(&self) -> f64 {
        self.drop_probability
    }

    fn drops(&self) -> bool {
        self.drop_probability > 0.0 && rand::thread_rng().gen::<f64>() < self.drop_probability
    }
}

pub(crate) struct Acceptor {
    /// Highest proposal promised so far; only ever replaced by a higher one
    max_promised: Arc<Mutex<Option<ProposalId>>>,
    faults: FaultPolicy,
    deadline: Duration,
}

impl Acceptor {
    pub fn new(faults: FaultPolicy, deadline: Duration) -> Self {
        Acceptor {
            max_promised: Arc::new(Mutex::new(None)),
            faults,
            deadline,
        }
    }

    pub fn max_promised(&self) -> Option<ProposalId> {
        self.max_promised.lock().clone()
    }

    /// Grants iff `id` is newer than every proposal promised so far.
    pub async fn promise(&self, id: ProposalId) -> Vote {
        self.vote("promise", id, |max, id| {
            if Some(id) > max.as_ref() {
                *max = Some(id.clone());
                true
            } else {
                false
            }
        })
        .await
    }

    /// Grants iff no newer proposal has been promised since `id` was.
    pub async fn accept(&self, id: ProposalId) -> Vote {
        self.vote("accept", id, |max, id| max.as_ref() == Some(id)).await
    }

    async fn vote(
        &self,
        phase: &'static str,
        id: ProposalId,
        decide: fn(&mut Option<ProposalId>, &ProposalId) -> bool,
    ) -> Vote {
        if self.faults.drops() {
            warn!("{}: injected failure, abstaining on {}", phase, id);
            return Vote::Abstained
        }

        let max_promised = self.max_promised.clone();
        let stall = self.faults.stall;
        let proposal = id.clone();
        let mut task = tokio::spawn(async move {
            if stall > Duration::from_secs(0) {
                tokio::time::sleep(stall).await;
            }
            let mut max = max_promised.lock();
            decide(&mut max, &proposal)
        });

        match tokio::time::timeout(self.deadline, &mut task).await {
        | Ok(Ok(true)) => {
            debug!("{}: granted {}", phase, id);
            Vote::Granted
        }
        | Ok(Ok(false)) => {
            debug!("{}: rejected {}", phase, id);
            Vote::Rejected
        }
        | Ok(Err(error)) => {
            warn!("{}: decision on {} failed: {}", phase, id, error);
            Vote::Abstained
        }
        | Err(_) => {
            task.abort();
            warn!("{}: decision on {} missed its {:?} deadline", phase, id, self.deadline);
            Vote::Abstained
        }
        }
    }
}
