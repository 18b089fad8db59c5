mod common;

use lavabridge::{
    ClientError, NodeState,
    common::types::{GuildId, UserId},
    configs::NodeConfig,
    node::{Node, NodeMessage, NodeSession},
    protocol::{IncomingMessage, OutgoingMessage},
};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;

use common::{MockNode, WAIT};

fn session() -> NodeSession {
    NodeSession {
        user_id: UserId(159985870458322944),
        shard_count: 4,
        client_name: "lavabridge-tests".into(),
    }
}

async fn next_message(rx: &mut mpsc::UnboundedReceiver<NodeMessage>) -> NodeMessage {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for node message")
        .expect("inbound channel closed")
}

#[tokio::test]
async fn test_handshake_headers() {
    let mut mock = MockNode::spawn().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let node = Node::new(
        NodeConfig::new("main", "127.0.0.1", mock.addr.port(), "youshallnotpass"),
        session(),
        tx,
    );

    node.connect().await.unwrap();
    assert_eq!(node.state(), NodeState::Connected);
    assert!(matches!(
        next_message(&mut rx).await,
        NodeMessage::Connected { node } if node == "main"
    ));

    let headers = (&mut mock.headers).await.unwrap();
    assert_eq!(headers["Authorization"], "youshallnotpass");
    assert_eq!(headers["User-Id"], "159985870458322944");
    assert_eq!(headers["Num-Shards"], "4");
    assert_eq!(headers["Client-Name"], "lavabridge-tests");
}

#[tokio::test]
async fn test_commands_are_forwarded_as_json() {
    let mut mock = MockNode::spawn().await;
    let (tx, _rx) = mpsc::unbounded_channel();
    let node = Node::new(
        NodeConfig::new("main", "127.0.0.1", mock.addr.port(), "pw"),
        session(),
        tx,
    );
    node.connect().await.unwrap();

    node.send(&OutgoingMessage::Pause {
        guild_id: GuildId::from("10"),
        pause: true,
    })
    .unwrap();
    node.send(&OutgoingMessage::Destroy {
        guild_id: GuildId::from("10"),
    })
    .unwrap();

    assert_eq!(
        mock.next_json().await,
        json!({"op": "pause", "guildId": "10", "pause": true})
    );
    assert_eq!(
        mock.next_json().await,
        json!({"op": "destroy", "guildId": "10"})
    );
}

#[tokio::test]
async fn test_incoming_stats_are_cached_and_forwarded() {
    let mock = MockNode::spawn().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let node = Node::new(
        NodeConfig::new("main", "127.0.0.1", mock.addr.port(), "pw"),
        session(),
        tx,
    );
    node.connect().await.unwrap();
    next_message(&mut rx).await;

    mock.outgoing
        .send(Message::Text("{not json".to_string().into()))
        .unwrap();
    mock.push(json!({
        "op": "stats",
        "players": 2,
        "playingPlayers": 1,
        "uptime": 1000,
        "memory": {"free": 1, "used": 2, "allocated": 3, "reservable": 4},
        "cpu": {"cores": 2, "systemLoad": 0.25, "lavalinkLoad": 0.05}
    }));

    match next_message(&mut rx).await {
        NodeMessage::Payload {
            node: name,
            message: IncomingMessage::Stats(stats),
        } => {
            assert_eq!(name, "main");
            assert_eq!(stats.players, 2);
        }
        other => panic!("unexpected message: {:?}", other),
    }
    assert_eq!(node.stats().map(|s| s.playing_players), Some(1));
}

#[tokio::test]
async fn test_remote_close_disconnects_without_retry() {
    let mock = MockNode::spawn().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let node = Node::new(
        NodeConfig::new("main", "127.0.0.1", mock.addr.port(), "pw"),
        session(),
        tx,
    );
    node.connect().await.unwrap();
    next_message(&mut rx).await;

    mock.outgoing.send(Message::Close(None)).unwrap();

    match next_message(&mut rx).await {
        NodeMessage::Closed { node: name, code, .. } => {
            assert_eq!(name, "main");
            assert_eq!(code, 1000);
        }
        other => panic!("unexpected message: {:?}", other),
    }
    assert_eq!(node.state(), NodeState::Disconnected);
    assert!(matches!(
        node.send(&OutgoingMessage::Stop {
            guild_id: GuildId::from("10")
        }),
        Err(ClientError::NodeNotConnected(_))
    ));
}

#[tokio::test]
async fn test_client_close_reports_closed() {
    let mock = MockNode::spawn().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let node = Node::new(
        NodeConfig::new("main", "127.0.0.1", mock.addr.port(), "pw"),
        session(),
        tx,
    );
    node.connect().await.unwrap();
    next_message(&mut rx).await;

    node.close();
    assert_eq!(node.state(), NodeState::Disconnected);
    assert!(matches!(
        next_message(&mut rx).await,
        NodeMessage::Closed { node, .. } if node == "main"
    ));
}

#[tokio::test]
async fn test_connect_failure_leaves_node_disconnected() {
    // Bind and drop to get a port nothing listens on.
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let (tx, _rx) = mpsc::unbounded_channel();
    let node = Node::new(
        NodeConfig::new("main", "127.0.0.1", port, "pw"),
        session(),
        tx,
    );

    assert!(matches!(
        node.connect().await,
        Err(ClientError::WebSocket(_))
    ));
    assert_eq!(node.state(), NodeState::Disconnected);
}
