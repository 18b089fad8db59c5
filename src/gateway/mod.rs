//! Seam between the client and the chat platform SDK that hosts the bot.
//!
//! The host implements [`ShardGateway`] once for whichever chat library it
//! runs on; the client only needs to push opcode-4 packets onto a shard and,
//! optionally, to read channel permissions before joining.

use async_trait::async_trait;

use crate::common::types::{AnyResult, ChannelId, GuildId};

pub mod packets;
pub mod permissions;

pub use packets::*;
pub use permissions::Permissions;

#[async_trait]
pub trait ShardGateway: Send + Sync {
    /// Sends a raw gateway payload on the given shard.
    async fn send(&self, shard_id: u64, payload: serde_json::Value) -> AnyResult<()>;

    /// Permissions the bot user holds in a voice channel.
    ///
    /// `None` means the host cannot tell, and the join goes ahead unchecked.
    async fn channel_permissions(
        &self,
        _guild_id: &GuildId,
        _channel_id: &ChannelId,
    ) -> Option<Permissions> {
        None
    }
}
