use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use kvpaxos::transport::TcpNetwork;
use kvpaxos::{serve, Address, DeleteStatus, Directory, FaultPolicy, Node, NodeOptions, StoreClient};

async fn bind() -> (TcpListener, Address) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, Address::new("127.0.0.1", port))
}

async fn start_coordinator() -> Address {
    let (listener, addr) = bind().await;
    tokio::spawn(serve(listener, Arc::new(Directory::new())));
    addr
}

async fn start_node(coordinator: &Address, recover_from: Option<&Address>) -> Address {
    let (listener, addr) = bind().await;
    let options = NodeOptions {
        faults: FaultPolicy::none(),
        ..NodeOptions::default()
    };
    let node = Arc::new(Node::new(addr.clone(), coordinator.clone(), Arc::new(TcpNetwork), options));
    if let Some(peer) = recover_from {
        assert!(node.restart(peer).await);
    }
    node.register().await.unwrap();
    tokio::spawn(serve(listener, node));
    addr
}

fn client(addr: &Address) -> StoreClient {
    StoreClient::new(addr.clone(), Arc::new(TcpNetwork), Duration::from_secs(10))
}

#[tokio::test]
async fn three_nodes_over_tcp() {
    let coordinator = start_coordinator().await;
    let mut nodes = Vec::new();
    for _ in 0..3 {
        nodes.push(start_node(&coordinator, None).await);
    }

    assert!(client(&nodes[0]).put("a".into(), "1".into()).await.unwrap());
    for node in &nodes {
        assert_eq!(client(node).get("a".into()).await.unwrap(), Some("1".to_string()));
    }

    assert_eq!(client(&nodes[1]).delete("a".into()).await.unwrap(), DeleteStatus::FoundDeleted);
    assert_eq!(client(&nodes[2]).get("a".into()).await.unwrap(), None);
    assert_eq!(client(&nodes[2]).delete("a".into()).await.unwrap(), DeleteStatus::NotFound);

    // A node recovering from a live peer starts with its dictionary
    assert!(client(&nodes[0]).put("b".into(), "2".into()).await.unwrap());
    let recovered = start_node(&coordinator, Some(&nodes[1])).await;
    assert_eq!(client(&recovered).get("b".into()).await.unwrap(), Some("2".to_string()));
}

#[tokio::test]
async fn unreachable_node_is_an_error() {
    let (listener, addr) = bind().await;
    drop(listener);
    assert!(client(&addr).get("a".into()).await.is_err());
}
