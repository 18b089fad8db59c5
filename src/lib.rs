//! Client bridge between a chat bot runtime and a Lavalink-compatible audio node.
//!
//! The host bot implements [`ShardGateway`] for its chat library, builds a
//! [`PlayerManager`], feeds it the voice packets its shards receive and
//! drives playback through per-guild [`Player`]s.

pub mod common;
pub mod configs;
pub mod gateway;
pub mod manager;
pub mod node;
pub mod player;
pub mod protocol;
pub mod rest;

pub use common::{ClientError, ClientResult};
pub use configs::Config;
pub use gateway::{GatewayPacket, Permissions, ShardGateway};
pub use manager::{ClientEvent, JoinOptions, PlayerManager};
pub use node::{Node, NodeState};
pub use player::{PlayOptions, Player};
pub use rest::RestClient;
