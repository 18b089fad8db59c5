use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite;

use crate::{
    common::types::{AnyError, ChannelId, GuildId},
    gateway::Permissions,
};

/// Exception severity levels reported by the audio node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[serde(alias = "common")]
    Common,
    #[serde(alias = "suspicious")]
    Suspicious,
    #[serde(alias = "fault")]
    Fault,
}

/// Everything that can go wrong inside the client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("missing or empty option `{0}`")]
    MissingOption(&'static str),

    #[error("volume must be between 0 and 1000, got {0}")]
    InvalidVolume(i64),

    #[error("equalizer band {band} with gain {gain} is out of range (band 0..=14, gain -0.25..=1.0)")]
    InvalidEqualizerBand { band: u8, gain: f32 },

    #[error("no node named `{0}`")]
    UnknownNode(String),

    #[error("no connected node is available")]
    NoAvailableNode,

    #[error("node `{0}` is not connected")]
    NodeNotConnected(String),

    #[error("player of guild {guild_id} is bound to node `{node}`")]
    PlayerOnOtherNode { guild_id: GuildId, node: String },

    #[error("no player exists for guild {0}")]
    UnknownPlayer(GuildId),

    #[error("missing permissions {missing:?} in channel {channel_id}")]
    MissingPermissions {
        channel_id: ChannelId,
        missing: Permissions,
    },

    #[error("nothing is playing in guild {0}")]
    NothingPlaying(GuildId),

    #[error("chat gateway error: {0}")]
    Gateway(AnyError),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] tungstenite::http::header::InvalidHeaderValue),
}

/// Result alias used across the client.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
