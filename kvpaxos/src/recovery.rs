//! # Summary
//!
//! Restarting a node from a live peer. The peer's whole dictionary is copied
//! and installed as this node's state; there is no log replay, so anything
//! committed while this node was down and missing from the copy is lost to it.

use crate::client::PeerClient;
use crate::message::Address;
use crate::node::Node;

impl Node {
    /// Installs a copy of `peer`'s dictionary. On failure the node keeps its
    /// current (normally empty) dictionary and returns false.
    pub async fn restart(&self, peer: &Address) -> bool {
        match self.recover_from(peer).await {
        | Ok(count) => {
            info!("restarted from {} with {} keys", peer, count);
            true
        }
        | Err(error) => {
            error!("restart from {} failed, starting empty: {}", peer, error);
            false
        }
        }
    }

    async fn recover_from(&self, peer: &Address) -> crate::Result<usize> {
        let mut source = PeerClient::resolve(self.network(), peer, self.timeout()).await?;
        let snapshot = source.copy_data_store().await?;
        let count = snapshot.len();
        self.install(snapshot);
        Ok(count)
    }
}
