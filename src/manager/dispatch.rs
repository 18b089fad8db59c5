use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::events::ClientEvent;
use crate::{
    common::types::GuildId,
    node::NodeMessage,
    player::Player,
    protocol::{IncomingMessage, PlayerEvent},
};

pub(crate) type PlayerMap = Arc<DashMap<GuildId, Arc<Player>>>;

/// Drains node traffic until every node handle is gone.
///
/// `events` is bounded. Player state is always updated, but events that do
/// not fit are dropped until the host reads the queue again.
pub(crate) async fn run(
    mut inbound: mpsc::UnboundedReceiver<NodeMessage>,
    players: PlayerMap,
    events: flume::Sender<ClientEvent>,
) {
    let mut dropped: u64 = 0;
    while let Some(message) = inbound.recv().await {
        let Some(event) = route(message, &players) else {
            continue;
        };
        match events.try_send(event) {
            Ok(()) => {
                if dropped > 0 {
                    warn!("Event queue has room again; {} events were dropped", dropped);
                    dropped = 0;
                }
            }
            Err(flume::TrySendError::Full(_)) => {
                if dropped == 0 {
                    warn!("Event queue is full; dropping events until it is read");
                }
                dropped += 1;
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                debug!("Event receiver dropped; stopping dispatch");
                break;
            }
        }
    }
}

/// Applies one node message to the players it concerns and maps it to the
/// event the host sees.
pub(crate) fn route(
    message: NodeMessage,
    players: &DashMap<GuildId, Arc<Player>>,
) -> Option<ClientEvent> {
    match message {
        NodeMessage::Connected { node } => Some(ClientEvent::NodeConnected { node }),
        NodeMessage::Closed {
            node,
            node_id,
            code,
            reason,
        } => {
            for player in players.iter().filter(|p| p.node().id() == node_id) {
                player.mark_disconnected();
            }
            Some(ClientEvent::NodeDisconnected { node, code, reason })
        }
        NodeMessage::Payload { node, message } => match message {
            IncomingMessage::PlayerUpdate { guild_id, state } => {
                match players.get(&guild_id) {
                    Some(player) => player.apply_update(&state),
                    None => debug!("[{}] playerUpdate for unknown guild {}", node, guild_id),
                }
                Some(ClientEvent::PlayerUpdate { guild_id, state })
            }
            IncomingMessage::Stats(stats) => Some(ClientEvent::Stats { node, stats }),
            IncomingMessage::Event(PlayerEvent::Unknown) => {
                debug!("[{}] Ignoring unknown event type", node);
                None
            }
            IncomingMessage::Event(event) => {
                if let Some(player) = event.guild_id().and_then(|g| players.get(g)) {
                    player.apply_event(&event);
                }
                if let PlayerEvent::TrackException { guild_id, exception, error, .. } = &event {
                    let message = exception
                        .as_ref()
                        .and_then(|e| e.message.clone())
                        .or_else(|| error.clone())
                        .unwrap_or_default();
                    warn!("[{}] Track exception in guild {}: {}", node, guild_id, message);
                }
                Some(ClientEvent::Player(event))
            }
            IncomingMessage::Unknown => {
                debug!("[{}] Ignoring unknown op", node);
                None
            }
        },
    }
}
