use crate::{
    common::types::GuildId,
    protocol::{PlayerEvent, PlayerUpdateState, Stats},
};

/// Everything the manager surfaces to the host bot.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    NodeConnected {
        node: String,
    },
    /// The node's websocket closed. Its players are marked disconnected but
    /// kept; nothing reconnects on its own.
    NodeDisconnected {
        node: String,
        code: u16,
        reason: String,
    },
    Stats {
        node: String,
        stats: Stats,
    },
    PlayerUpdate {
        guild_id: GuildId,
        state: PlayerUpdateState,
    },
    Player(PlayerEvent),
}
