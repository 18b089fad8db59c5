use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    common::{ClientError, ClientResult, types::UserId},
    configs::NodeConfig,
    protocol::{IncomingMessage, OutgoingMessage, Stats},
};

pub mod connection;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a node connection. There is no automatic reconnect: a
/// `Disconnected` node stays that way until `connect` is called again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

/// Identity presented in the websocket handshake.
#[derive(Debug, Clone)]
pub struct NodeSession {
    pub user_id: UserId,
    pub shard_count: u64,
    pub client_name: String,
}

/// Traffic from a node to its owner, in arrival order.
#[derive(Debug, Clone)]
pub enum NodeMessage {
    Connected {
        node: String,
    },
    Payload {
        node: String,
        message: IncomingMessage,
    },
    Closed {
        node: String,
        /// [`Node::id`] of the closed node; names can be reused.
        node_id: u64,
        code: u16,
        reason: String,
    },
}

/// Live half of a connection: the writer queue and the reader's stop signal.
struct Connection {
    id: u64,
    writer: mpsc::UnboundedSender<Message>,
    cancel: CancellationToken,
}

/// One websocket connection to an audio node.
pub struct Node {
    id: u64,
    config: NodeConfig,
    session: NodeSession,
    state: RwLock<NodeState>,
    stats: RwLock<Option<Stats>>,
    connection: Mutex<Option<Connection>>,
    generation: AtomicU64,
    inbound: mpsc::UnboundedSender<NodeMessage>,
}

impl Node {
    pub fn new(
        config: NodeConfig,
        session: NodeSession,
        inbound: mpsc::UnboundedSender<NodeMessage>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            session,
            state: RwLock::new(NodeState::Idle),
            stats: RwLock::new(None),
            connection: Mutex::new(None),
            generation: AtomicU64::new(0),
            inbound,
        })
    }

    /// Process-unique id of this handle, unlike the configured name.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> NodeState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == NodeState::Connected
    }

    /// Last stats report pushed by the node.
    pub fn stats(&self) -> Option<Stats> {
        self.stats.read().clone()
    }

    /// Serializes and queues a command for the writer task.
    pub fn send(&self, message: &OutgoingMessage) -> ClientResult<()> {
        let connection = self.connection.lock();
        let Some(connection) = connection.as_ref() else {
            return Err(ClientError::NodeNotConnected(self.config.name.clone()));
        };

        let json = serde_json::to_string(message)?;
        debug!("[{}] -> {}", self.config.name, json);

        connection
            .writer
            .send(Message::Text(json.into()))
            .map_err(|_| ClientError::NodeNotConnected(self.config.name.clone()))
    }

    /// Sends a normal close frame and stops the connection tasks.
    pub fn close(&self) {
        if let Some(connection) = self.connection.lock().take() {
            debug!("[{}] Closing connection", self.config.name);
            let _ = connection.writer.send(Message::Close(None));
            connection.cancel.cancel();
            self.set_state(NodeState::Disconnected);
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn set_state(&self, state: NodeState) {
        *self.state.write() = state;
    }

    fn forward(&self, message: NodeMessage) {
        // The owner dropping its receiver only happens on shutdown.
        let _ = self.inbound.send(message);
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            connection.cancel.cancel();
        }
    }
}
