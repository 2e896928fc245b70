use chainmesh::discovery::{encode_heartbeat, Registration};
use chainmesh::{
    query_top_nodes, DiscoveryConfig, KeyPair, KeyType, Message, MessageType, Node,
    SignedSubmission, Tracker,
};
use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration, Instant};

const DIFFICULTY: usize = 2;
const TIMEOUT: Duration = Duration::from_secs(20);

fn localhost(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

async fn start_tracker() -> Tracker {
    Tracker::bind(localhost(0)).await.unwrap()
}

async fn wait_for<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + TIMEOUT;
    loop {
        if check().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(20)).await;
    }
}

fn discovery_config(tracker: &Tracker) -> DiscoveryConfig {
    DiscoveryConfig {
        listen_addr: localhost(0),
        heartbeat_interval_ms: 50,
        ..DiscoveryConfig::new(tracker.local_addr())
    }
}

async fn start_node(name: &str, tracker: &Tracker) -> Node {
    let mut node = Node::builder()
        .name(name)
        .difficulty(DIFFICULTY)
        .app_addr(localhost(0))
        .discovery(discovery_config(tracker))
        .build()
        .unwrap();
    node.start().await.unwrap();
    node
}

/// Register a bare connection announcing `node_port`, then report `chain_length`
async fn register_raw(tracker: &Tracker, listen_port: u16, node_port: u16, chain_length: u32) -> TcpStream {
    let mut stream = TcpStream::connect(tracker.local_addr()).await.unwrap();
    let registration = Registration::new(
        listen_port,
        SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, node_port),
    );
    Message::new(MessageType::Register, registration.encode())
        .write_to(&mut stream)
        .await
        .unwrap();
    let reply = Message::read_from(&mut stream).await.unwrap();
    assert_eq!(reply.kind(), Some(MessageType::PeerList));
    Message::new(MessageType::Heartbeat, encode_heartbeat(chain_length))
        .write_to(&mut stream)
        .await
        .unwrap();
    stream
}

#[tokio::test]
async fn test_tracker_ranks_by_chain_length() {
    let mut tracker = start_tracker().await;
    let t = &tracker;

    let mut streams = Vec::new();
    for (i, len) in [1u32, 5, 3].into_iter().enumerate() {
        let i = i as u16;
        streams.push(register_raw(&tracker, 7001 + i, 8001 + i, len).await);
    }
    assert!(
        wait_for(move || async move {
            let lengths: Vec<u32> = t.snapshot().await.iter().map(|p| p.chain_length).collect();
            lengths == vec![1, 5, 3]
        })
        .await
    );

    let top = query_top_nodes(tracker.local_addr(), Some(2)).await.unwrap();
    assert_eq!(
        top,
        vec![
            SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8002),
            SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8003),
        ]
    );
    let all = query_top_nodes(tracker.local_addr(), None).await.unwrap();
    assert_eq!(all.len(), 3);

    drop(streams);
    tracker.stop().await;
}

#[tokio::test]
async fn test_tracker_forgets_closed_connections() {
    let mut tracker = start_tracker().await;
    let t = &tracker;

    let stream = register_raw(&tracker, 7001, 8001, 2).await;
    assert!(wait_for(move || async move { t.registered_count().await == 1 }).await);

    drop(stream);
    assert!(wait_for(move || async move { t.registered_count().await == 0 }).await);
    assert!(query_top_nodes(tracker.local_addr(), None).await.unwrap().is_empty());

    tracker.stop().await;
}

#[tokio::test]
async fn test_tracker_ignores_heartbeat_before_registration() {
    let mut tracker = start_tracker().await;
    let t = &tracker;

    let mut stream = TcpStream::connect(tracker.local_addr()).await.unwrap();
    Message::new(MessageType::Heartbeat, encode_heartbeat(9))
        .write_to(&mut stream)
        .await
        .unwrap();
    assert!(wait_for(move || async move { t.pending_count().await == 1 }).await);
    assert_eq!(tracker.registered_count().await, 0);

    // The connection survives and can still register
    let registration = Registration::new(7001, SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8001));
    Message::new(MessageType::Register, registration.encode())
        .write_to(&mut stream)
        .await
        .unwrap();
    let reply = Message::read_from(&mut stream).await.unwrap();
    assert_eq!(reply.kind(), Some(MessageType::PeerList));
    assert!(reply.payload().is_empty());

    tracker.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_nodes_form_full_mesh() {
    let mut tracker = start_tracker().await;
    let t = &tracker;

    let mut nodes = Vec::new();
    for i in 0..4 {
        nodes.push(start_node(&format!("node{i}"), &tracker).await);
        let expected = i + 1;
        assert!(wait_for(move || async move { t.registered_count().await == expected }).await);
    }

    for node in &nodes {
        assert!(node.wait_for_peers(3, TIMEOUT).await, "{} is missing peers", node.name());
    }

    for node in &mut nodes {
        node.stop().await.unwrap();
    }
    tracker.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_heartbeats_report_chain_length() {
    let mut tracker = start_tracker().await;
    let t = &tracker;

    let mut node1 = start_node("node1", &tracker).await;
    assert!(wait_for(move || async move { t.registered_count().await == 1 }).await);
    let mut node2 = start_node("node2", &tracker).await;
    assert!(node1.wait_for_peers(1, TIMEOUT).await);
    assert!(node2.wait_for_peers(1, TIMEOUT).await);

    let pair = KeyPair::generate(KeyType::Ed25519);
    for data in ["a", "b"] {
        let submission = SignedSubmission::sign(&pair, data.as_bytes().to_vec()).unwrap();
        node1.submit(submission).await.unwrap();
    }
    let (n1, n2) = (&node1, &node2);
    assert!(wait_for(move || async move { n1.chain_len().await == 2 && n2.chain_len().await == 2 }).await);
    assert!(
        wait_for(move || async move { t.snapshot().await.iter().all(|p| p.chain_length == 2) }).await
    );

    // Nodes announce their app listener to top-k clients
    let top = query_top_nodes(tracker.local_addr(), None).await.unwrap();
    let mut announced: Vec<SocketAddr> = top.into_iter().map(SocketAddr::V4).collect();
    announced.sort();
    let mut expected = vec![node1.app_addr().unwrap(), node2.app_addr().unwrap()];
    expected.sort();
    assert_eq!(announced, expected);

    node1.stop().await.unwrap();
    node2.stop().await.unwrap();
    tracker.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mesh_survives_tracker_loss() {
    let mut tracker = start_tracker().await;
    let t = &tracker;

    let mut node1 = start_node("node1", &tracker).await;
    assert!(wait_for(move || async move { t.registered_count().await == 1 }).await);
    let mut node2 = start_node("node2", &tracker).await;
    assert!(node1.wait_for_peers(1, TIMEOUT).await);
    assert!(node2.wait_for_peers(1, TIMEOUT).await);

    tracker.stop().await;
    sleep(Duration::from_millis(200)).await;

    let pair = KeyPair::generate(KeyType::Ed25519);
    let submission = SignedSubmission::sign(&pair, b"after tracker".to_vec()).unwrap();
    node1.submit(submission).await.unwrap();

    let n2 = &node2;
    assert!(wait_for(move || async move { n2.chain_len().await == 1 }).await);
    assert_eq!(node1.peer_count().await, 1);
    assert_eq!(node1.chain().await, node2.chain().await);

    node1.stop().await.unwrap();
    node2.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reregistration_keeps_mesh_without_duplicate_links() {
    let mut tracker = start_tracker().await;
    let tracker_addr = tracker.local_addr();
    let rejoining = |tracker: &Tracker| DiscoveryConfig {
        reconnect_interval_ms: Some(100),
        ..discovery_config(tracker)
    };

    let mut node1 = Node::builder()
        .name("node1")
        .difficulty(DIFFICULTY)
        .discovery(rejoining(&tracker))
        .build()
        .unwrap();
    node1.start().await.unwrap();
    let t = &tracker;
    assert!(wait_for(move || async move { t.registered_count().await == 1 }).await);
    let mut node2 = Node::builder()
        .name("node2")
        .difficulty(DIFFICULTY)
        .discovery(rejoining(&tracker))
        .build()
        .unwrap();
    node2.start().await.unwrap();
    assert!(node1.wait_for_peers(1, TIMEOUT).await);
    assert!(node2.wait_for_peers(1, TIMEOUT).await);

    tracker.stop().await;
    let mut tracker = Tracker::bind(tracker_addr).await.unwrap();
    let t = &tracker;
    assert!(wait_for(move || async move { t.registered_count().await == 2 }).await);
    sleep(Duration::from_millis(300)).await;
    assert_eq!(node1.peer_count().await, 1);
    assert_eq!(node2.peer_count().await, 1);

    // A newcomer still reaches both through the new tracker
    let mut node3 = start_node("node3", &tracker).await;
    for node in [&node1, &node2, &node3] {
        assert!(node.wait_for_peers(2, TIMEOUT).await, "{} is missing peers", node.name());
    }
    sleep(Duration::from_millis(200)).await;
    for node in [&node1, &node2, &node3] {
        assert_eq!(node.peer_count().await, 2, "{} has duplicate links", node.name());
    }

    node1.stop().await.unwrap();
    node2.stop().await.unwrap();
    node3.stop().await.unwrap();
    tracker.stop().await;
}
