use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::common::types::{ChannelId, GuildId, UserId};

/// Gateway opcode for a voice state update sent by the client.
pub const OP_VOICE_STATE_UPDATE: u8 = 4;

/// Raw dispatch envelope as read off a shard: `{"t": ..., "d": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPacket {
    #[serde(default)]
    pub t: Option<String>,
    #[serde(default)]
    pub d: Value,
}

/// `VOICE_SERVER_UPDATE` dispatch. Forwarded to the node untouched as the
/// `event` of a `voiceUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceServerUpdate {
    pub token: String,
    pub guild_id: GuildId,
    /// Null while the voice server is being reallocated.
    pub endpoint: Option<String>,
}

/// `VOICE_STATE_UPDATE` dispatch, reduced to the fields the client reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceStateUpdate {
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    #[serde(deserialize_with = "deserialize_user_id")]
    pub user_id: UserId,
    pub session_id: String,
}

/// Snowflakes arrive as strings; accept plain numbers as well.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<UserId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    match value {
        Value::String(s) => s
            .parse::<u64>()
            .map(UserId)
            .map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .map(UserId)
            .ok_or_else(|| serde::de::Error::custom("user id out of range")),
        _ => Err(serde::de::Error::custom("expected string or number")),
    }
}

/// Opcode-4 payload asking the chat platform to move the bot's voice state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateVoiceState {
    pub guild_id: GuildId,
    /// `None` disconnects from voice.
    pub channel_id: Option<ChannelId>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

impl UpdateVoiceState {
    pub fn join(guild_id: GuildId, channel_id: ChannelId, self_mute: bool, self_deaf: bool) -> Self {
        Self {
            guild_id,
            channel_id: Some(channel_id),
            self_mute,
            self_deaf,
        }
    }

    pub fn leave(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            channel_id: None,
            self_mute: false,
            self_deaf: false,
        }
    }

    pub fn to_payload(&self) -> Value {
        json!({
            "op": OP_VOICE_STATE_UPDATE,
            "d": self,
        })
    }
}
