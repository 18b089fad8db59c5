use serde::{Deserialize, Serialize};

use crate::common::types::UserId;

/// Identity the client presents to every node.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    /// The bot user's id, sent as the `User-Id` handshake header.
    pub user_id: UserId,
    /// Total shard count of the chat client, sent as `Num-Shards`.
    #[serde(default = "default_shard_count")]
    pub shard_count: u64,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    /// Capacity of the event queue. Events beyond it are dropped until the
    /// host reads [`PlayerManager::events`](crate::PlayerManager::events).
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl ClientConfig {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            shard_count: default_shard_count(),
            client_name: default_client_name(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_shard_count() -> u64 {
    1
}

fn default_client_name() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_event_buffer() -> usize {
    1024
}
