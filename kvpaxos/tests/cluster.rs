use std::sync::Arc;
use std::time::Duration;

use kvpaxos::transport::LocalNetwork;
use kvpaxos::{
    Address, DeleteStatus, Directory, DirectoryClient, FaultPolicy, Node, NodeOptions, Operation,
    PeerClient, ProposalId, Vote,
};

struct Cluster {
    network: LocalNetwork,
    coordinator: Address,
    nodes: Vec<Arc<Node>>,
}

fn reliable() -> NodeOptions {
    NodeOptions {
        faults: FaultPolicy::none(),
        ..NodeOptions::default()
    }
}

fn put(key: &str, value: &str) -> Operation {
    Operation::Put { key: key.to_string(), value: value.to_string() }
}

impl Cluster {
    fn new() -> Self {
        let network = LocalNetwork::new();
        let coordinator = Address::new("localhost", 1111);
        network.register(coordinator.clone(), Arc::new(Directory::new()));
        Cluster { network, coordinator, nodes: Vec::new() }
    }

    async fn with_nodes(size: u16, options: NodeOptions) -> Self {
        let mut cluster = Self::new();
        for port in 5000..5000 + size {
            cluster.spawn(port, options).await;
        }
        cluster
    }

    fn node(&self, port: u16, options: NodeOptions) -> Arc<Node> {
        Arc::new(Node::new(
            Address::new("localhost", port),
            self.coordinator.clone(),
            Arc::new(self.network.clone()),
            options,
        ))
    }

    async fn spawn(&mut self, port: u16, options: NodeOptions) -> Arc<Node> {
        let node = self.node(port, options);
        self.network.register(node.addr().clone(), node.clone());
        node.register().await.unwrap();
        self.nodes.push(node.clone());
        node
    }

    fn crash(&self, index: usize) {
        self.network.crash(self.nodes[index].addr());
    }
}

#[tokio::test]
async fn put_reaches_every_node() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    assert!(cluster.nodes[0].put("a".into(), "1".into()).await);
    for node in &cluster.nodes {
        assert_eq!(node.get("a"), Some("1".to_string()));
    }
}

#[tokio::test]
async fn writes_from_different_nodes_converge() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    assert!(cluster.nodes[0].put("a".into(), "1".into()).await);
    assert!(cluster.nodes[2].put("a".into(), "2".into()).await);
    assert!(cluster.nodes[1].put("b".into(), "3".into()).await);
    for node in &cluster.nodes {
        assert_eq!(node.get("a"), Some("2".to_string()));
        assert_eq!(node.get("b"), Some("3".to_string()));
    }
}

#[tokio::test]
async fn single_node_put_then_delete() {
    let cluster = Cluster::with_nodes(1, reliable()).await;
    let node = &cluster.nodes[0];
    assert!(node.put("k".into(), "v".into()).await);
    assert_eq!(node.get("k"), Some("v".to_string()));
    assert_eq!(node.delete("k".into()).await, DeleteStatus::FoundDeleted);
    assert_eq!(node.get("k"), None);
    assert_eq!(node.delete("k".into()).await, DeleteStatus::NotFound);
}

#[tokio::test]
async fn failed_prepare_learns_nothing() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    let blocker = ProposalId::new(u64::MAX, Address::new("localhost", 9999));
    assert_eq!(cluster.nodes[1].promise(blocker.clone()).await, Vote::Granted);
    assert_eq!(cluster.nodes[2].promise(blocker).await, Vote::Granted);

    assert!(!cluster.nodes[0].put("a".into(), "1".into()).await);
    assert_eq!(cluster.nodes[0].delete("a".into()).await, DeleteStatus::ConsensusFailed);
    for node in &cluster.nodes {
        assert_eq!(node.get("a"), None);
        assert!(node.copy_data_store().is_empty());
    }
}

#[tokio::test]
async fn older_proposal_is_rejected_after_newer_promise() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    let newer = ProposalId::new(100, cluster.nodes[0].addr().clone());
    let older = ProposalId::new(50, cluster.nodes[1].addr().clone());

    for node in &cluster.nodes {
        assert_eq!(node.promise(newer.clone()).await, Vote::Granted);
    }
    for node in &cluster.nodes {
        assert_eq!(node.promise(older.clone()).await, Vote::Rejected);
        assert_eq!(node.accept(older.clone()).await, Vote::Rejected);
        assert_eq!(node.max_promised(), Some(newer.clone()));
    }
}

#[tokio::test]
async fn accept_for_superseded_round_is_rejected() {
    let cluster = Cluster::with_nodes(1, reliable()).await;
    let node = &cluster.nodes[0];
    let first = ProposalId::new(10, node.addr().clone());
    let second = ProposalId::new(20, Address::new("localhost", 6000));
    assert_eq!(node.promise(first.clone()).await, Vote::Granted);
    assert_eq!(node.promise(second.clone()).await, Vote::Granted);
    assert_eq!(node.accept(first).await, Vote::Rejected);
    assert_eq!(node.accept(second).await, Vote::Granted);
}

#[tokio::test]
async fn abstaining_acceptors_fail_consensus() {
    let options = NodeOptions {
        faults: FaultPolicy::new(1.0).unwrap(),
        ..NodeOptions::default()
    };
    let cluster = Cluster::with_nodes(3, options).await;
    assert!(!cluster.nodes[0].put("a".into(), "1".into()).await);
    assert_eq!(cluster.nodes[0].delete("a".into()).await, DeleteStatus::ConsensusFailed);
    for node in &cluster.nodes {
        assert_eq!(node.max_promised(), None);
    }
}

#[tokio::test(start_paused = true)]
async fn slow_acceptors_fail_consensus() {
    let options = NodeOptions {
        timeout: Duration::from_secs(2),
        deadline: Duration::from_secs(1),
        faults: FaultPolicy::none().with_stall(Duration::from_secs(5)),
    };
    let cluster = Cluster::with_nodes(3, options).await;
    assert!(!cluster.nodes[0].put("a".into(), "1".into()).await);
    assert_eq!(cluster.nodes[1].get("a"), None);
}

#[tokio::test]
async fn crashed_minority_is_skipped() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    cluster.crash(2);
    assert!(cluster.nodes[0].put("a".into(), "1".into()).await);
    assert_eq!(cluster.nodes[0].get("a"), Some("1".to_string()));
    assert_eq!(cluster.nodes[1].get("a"), Some("1".to_string()));
    assert_eq!(cluster.nodes[2].get("a"), None);

    // Crashed nodes stay in the directory
    let directory = DirectoryClient::new(
        cluster.coordinator.clone(),
        Arc::new(cluster.network.clone()),
        Duration::from_secs(1),
    );
    assert_eq!(directory.get_server().await.unwrap().len(), 3);
}

#[tokio::test]
async fn crashed_majority_is_left_out_of_quorum() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    cluster.crash(1);
    cluster.crash(2);
    assert!(cluster.nodes[0].put("a".into(), "1".into()).await);
    assert_eq!(cluster.nodes[0].get("a"), Some("1".to_string()));
    assert_eq!(cluster.nodes[0].delete("a".into()).await, DeleteStatus::FoundDeleted);
    assert_eq!(cluster.nodes[1].get("a"), None);
}

#[tokio::test]
async fn abstaining_minority_still_commits() {
    let mut cluster = Cluster::with_nodes(2, reliable()).await;
    let flaky = NodeOptions {
        faults: FaultPolicy::new(1.0).unwrap(),
        ..NodeOptions::default()
    };
    let flaky = cluster.spawn(5002, flaky).await;

    assert!(flaky.put("a".into(), "1".into()).await);
    for node in &cluster.nodes {
        assert_eq!(node.get("a"), Some("1".to_string()));
    }
    assert_eq!(flaky.max_promised(), None);
    assert!(cluster.nodes[0].max_promised().is_some());
}

#[tokio::test]
async fn abstaining_majority_counts_against_quorum() {
    let mut cluster = Cluster::with_nodes(1, reliable()).await;
    let flaky = NodeOptions {
        faults: FaultPolicy::new(1.0).unwrap(),
        ..NodeOptions::default()
    };
    cluster.spawn(5001, flaky).await;
    cluster.spawn(5002, flaky).await;

    // Reachable acceptors that abstain are not left out like crashed ones
    assert!(!cluster.nodes[0].put("a".into(), "1".into()).await);
    for node in &cluster.nodes {
        assert_eq!(node.get("a"), None);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_on_one_node_all_commit() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    let node = cluster.nodes[0].clone();
    let writes = (0..16).map(|i| {
        let node = node.clone();
        tokio::spawn(async move { node.put(format!("k{}", i), i.to_string()).await })
    });
    for committed in futures::future::join_all(writes).await {
        assert!(committed.unwrap());
    }
    for node in &cluster.nodes {
        for i in 0..16 {
            assert_eq!(node.get(&format!("k{}", i)), Some(i.to_string()));
        }
    }
}

#[tokio::test]
async fn unreachable_directory_fails_writes() {
    let cluster = Cluster::with_nodes(1, reliable()).await;
    cluster.network.crash(&cluster.coordinator);
    assert!(!cluster.nodes[0].put("a".into(), "1".into()).await);
    assert_eq!(cluster.nodes[0].delete("a".into()).await, DeleteStatus::ConsensusFailed);
}

#[tokio::test]
async fn delete_reports_last_learner_only() {
    let cluster = Cluster::with_nodes(3, reliable()).await;

    // Only the last node in directory order holds the key
    assert!(cluster.nodes[2].learn(put("only-last", "x")));
    assert_eq!(cluster.nodes[0].delete("only-last".into()).await, DeleteStatus::FoundDeleted);

    // Every node except the last holds the key
    assert!(cluster.nodes[0].learn(put("not-last", "y")));
    assert!(cluster.nodes[1].learn(put("not-last", "y")));
    assert_eq!(cluster.nodes[0].delete("not-last".into()).await, DeleteStatus::NotFound);
    for node in &cluster.nodes {
        assert_eq!(node.get("not-last"), None);
    }
}

#[tokio::test]
async fn put_result_ignores_unreachable_last_learner() {
    let cluster = Cluster::with_nodes(3, reliable()).await;
    cluster.crash(2);
    assert!(cluster.nodes[1].learn(put("k", "old")));
    assert_eq!(cluster.nodes[0].delete("k".into()).await, DeleteStatus::FoundDeleted);
}

#[tokio::test]
async fn restart_copies_a_live_peer() {
    let mut cluster = Cluster::with_nodes(2, reliable()).await;
    assert!(cluster.nodes[0].put("a".into(), "1".into()).await);
    assert!(cluster.nodes[0].put("b".into(), "2".into()).await);

    let source = cluster.nodes[1].addr().clone();
    let restarted = cluster.node(5002, reliable());
    assert!(restarted.restart(&source).await);
    cluster.network.register(restarted.addr().clone(), restarted.clone());
    restarted.register().await.unwrap();
    cluster.nodes.push(restarted.clone());

    assert_eq!(restarted.get("a"), Some("1".to_string()));
    assert_eq!(restarted.get("b"), Some("2".to_string()));

    // The copy is independent of its source
    assert!(cluster.nodes[1].learn(put("a", "changed")));
    assert_eq!(restarted.get("a"), Some("1".to_string()));

    // The restarted node takes part in later rounds
    assert!(restarted.put("c".into(), "3".into()).await);
    for node in &cluster.nodes {
        assert_eq!(node.get("c"), Some("3".to_string()));
    }
}

#[tokio::test]
async fn restart_from_unreachable_peer_starts_empty() {
    let cluster = Cluster::with_nodes(1, reliable()).await;
    let node = cluster.node(5001, reliable());
    assert!(!node.restart(&Address::new("localhost", 4242)).await);
    assert!(node.copy_data_store().is_empty());
}

#[tokio::test]
async fn restart_keeps_promised_id() {
    let cluster = Cluster::with_nodes(2, reliable()).await;
    let node = &cluster.nodes[1];
    let id = ProposalId::new(7, Address::new("localhost", 7000));
    assert!(node.promise(id.clone()).await.is_granted());
    assert!(node.restart(cluster.nodes[0].addr()).await);
    assert_eq!(node.max_promised(), Some(id));
}

#[tokio::test]
async fn peer_surface_over_network() {
    let cluster = Cluster::with_nodes(1, reliable()).await;
    let network = cluster.network.clone();
    let addr = cluster.nodes[0].addr().clone();

    let mut peer = PeerClient::resolve(&network, &addr, Duration::from_secs(1)).await.unwrap();
    assert_eq!(peer.port_num().await.unwrap(), 5000);
    assert_eq!(peer.coordinator().await.unwrap(), cluster.coordinator);
    assert!(peer.learn(put("x", "1")).await.unwrap());
    assert_eq!(peer.copy_data_store().await.unwrap().get("x"), Some(&"1".to_string()));

    // Nodes do not serve the directory surface
    let directory = DirectoryClient::new(addr, Arc::new(network), Duration::from_secs(1));
    assert!(directory.get_server().await.is_err());
}
