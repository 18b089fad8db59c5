use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    common::{
        ClientError, ClientResult,
        types::{ChannelId, GuildId},
    },
    configs::{ClientConfig, Config, NodeConfig, PlayerConfig},
    gateway::{
        GatewayPacket, Permissions, ShardGateway, UpdateVoiceState, VoiceServerUpdate,
        VoiceStateUpdate,
    },
    node::{Node, NodeMessage, NodeSession},
    player::Player,
    protocol::OutgoingMessage,
    rest::RestClient,
};

pub mod dispatch;
pub mod events;
mod voice;

pub use events::ClientEvent;

use self::{dispatch::PlayerMap, voice::PendingVoice};

/// Arguments of [`PlayerManager::join`].
#[derive(Debug, Clone)]
pub struct JoinOptions {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    /// Node to bind the player to. Defaults to the first connected node.
    pub node: Option<String>,
    pub self_mute: Option<bool>,
    pub self_deaf: Option<bool>,
}

impl JoinOptions {
    pub fn new(guild_id: impl Into<GuildId>, channel_id: impl Into<ChannelId>) -> Self {
        Self {
            guild_id: guild_id.into(),
            channel_id: channel_id.into(),
            node: None,
            self_mute: None,
            self_deaf: None,
        }
    }

    pub fn node(mut self, name: impl Into<String>) -> Self {
        self.node = Some(name.into());
        self
    }

    pub fn self_mute(mut self, mute: bool) -> Self {
        self.self_mute = Some(mute);
        self
    }

    pub fn self_deaf(mut self, deaf: bool) -> Self {
        self.self_deaf = Some(deaf);
        self
    }
}

/// Owns the node connections and the per-guild players.
///
/// Players are created on [`join`](Self::join) and removed on
/// [`leave`](Self::leave). Voice handshake packets read off the chat gateway
/// go through [`handle_packet`](Self::handle_packet).
pub struct PlayerManager {
    client: ClientConfig,
    player_config: PlayerConfig,
    gateway: Arc<dyn ShardGateway>,
    nodes: RwLock<Vec<Arc<Node>>>,
    players: PlayerMap,
    voice: DashMap<GuildId, PendingVoice>,
    inbound: mpsc::UnboundedSender<NodeMessage>,
    events: flume::Receiver<ClientEvent>,
}

impl PlayerManager {
    /// Builds the manager and its configured (not yet connected) nodes.
    ///
    /// Must be called from within a tokio runtime: the event dispatch task is
    /// spawned here.
    pub fn new(config: Config, gateway: Arc<dyn ShardGateway>) -> ClientResult<Arc<Self>> {
        config.validate()?;

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = flume::bounded(config.client.event_buffer);
        let players: PlayerMap = Arc::new(DashMap::new());

        tokio::spawn(dispatch::run(inbound_rx, players.clone(), events_tx));

        let session = NodeSession {
            user_id: config.client.user_id,
            shard_count: config.client.shard_count,
            client_name: config.client.client_name.clone(),
        };
        let nodes = config
            .nodes
            .into_iter()
            .map(|node| Node::new(node, session.clone(), inbound_tx.clone()))
            .collect();

        Ok(Arc::new(Self {
            client: config.client,
            player_config: config.player,
            gateway,
            nodes: RwLock::new(nodes),
            players,
            voice: DashMap::new(),
            inbound: inbound_tx,
            events: events_rx,
        }))
    }

    /// Stream of node and player events.
    ///
    /// Up to `client.event_buffer` events are kept until read; later ones are
    /// dropped with a warning while the queue is full. Cloned receivers share
    /// the stream: each event goes to exactly one of them.
    pub fn events(&self) -> flume::Receiver<ClientEvent> {
        self.events.clone()
    }

    /// Connects every configured node that is not connected yet.
    ///
    /// Fails only when no node ends up connected.
    pub async fn connect(&self) -> ClientResult<()> {
        let nodes = self.nodes();
        let mut last_error = None;
        for node in &nodes {
            if let Err(e) = node.connect().await {
                warn!("[{}] Could not connect: {}", node.name(), e);
                last_error = Some(e);
            }
        }

        if nodes.iter().any(|n| n.is_connected()) {
            Ok(())
        } else {
            Err(last_error.unwrap_or(ClientError::NoAvailableNode))
        }
    }

    /// Adds and connects a node at runtime.
    pub async fn add_node(&self, config: NodeConfig) -> ClientResult<Arc<Node>> {
        if self.node(&config.name).is_some() {
            return Err(ClientError::Config(format!(
                "duplicate node name `{}`",
                config.name
            )));
        }

        let node = Node::new(config, self.node_session(), self.inbound.clone());
        node.connect().await?;
        self.nodes.write().push(node.clone());
        Ok(node)
    }

    /// Closes a node and drops the players bound to it.
    pub fn remove_node(&self, name: &str) -> ClientResult<()> {
        let node = {
            let mut nodes = self.nodes.write();
            let index = nodes
                .iter()
                .position(|n| n.name() == name)
                .ok_or_else(|| ClientError::UnknownNode(name.to_string()))?;
            nodes.remove(index)
        };

        node.close();
        self.players.retain(|guild_id, player| {
            let keep = !Arc::ptr_eq(player.node(), &node);
            if !keep {
                debug!("[{}] Dropping player of guild {}", name, guild_id);
            }
            keep
        });
        info!("[{}] Node removed", name);
        Ok(())
    }

    pub fn node(&self, name: &str) -> Option<Arc<Node>> {
        self.nodes.read().iter().find(|n| n.name() == name).cloned()
    }

    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.nodes.read().clone()
    }

    /// REST client for a node; the first configured node when `node` is `None`.
    pub fn rest(&self, node: Option<&str>) -> ClientResult<RestClient> {
        let node = match node {
            Some(name) => self
                .node(name)
                .ok_or_else(|| ClientError::UnknownNode(name.to_string()))?,
            None => self
                .nodes
                .read()
                .first()
                .cloned()
                .ok_or(ClientError::NoAvailableNode)?,
        };
        RestClient::new(node.config().clone())
    }

    pub fn get(&self, guild_id: &GuildId) -> Option<Arc<Player>> {
        self.players.get(guild_id).map(|p| p.clone())
    }

    pub fn players(&self) -> Vec<Arc<Player>> {
        self.players.iter().map(|p| p.clone()).collect()
    }

    /// Asks the chat platform to move the bot into a voice channel and
    /// returns the guild's player, creating it on first join.
    ///
    /// The player exists before the voice state is sent, so handshake packets
    /// that race the join still find it. An existing player keeps its node;
    /// naming a different one is an error.
    pub async fn join(&self, options: JoinOptions) -> ClientResult<Arc<Player>> {
        let JoinOptions {
            guild_id,
            channel_id,
            node,
            self_mute,
            self_deaf,
        } = options;

        if guild_id.is_empty() {
            return Err(ClientError::MissingOption("guild_id"));
        }
        if channel_id.is_empty() {
            return Err(ClientError::MissingOption("channel_id"));
        }

        let node = match (self.get(&guild_id), node.as_deref()) {
            (Some(player), Some(name)) if player.node().name() != name => {
                return Err(ClientError::PlayerOnOtherNode {
                    guild_id,
                    node: player.node().name().to_string(),
                });
            }
            (Some(player), _) => player.node().clone(),
            (None, name) => self.pick_node(name)?,
        };

        if let Some(permissions) = self
            .gateway
            .channel_permissions(&guild_id, &channel_id)
            .await
        {
            let missing = permissions.missing(Permissions::VOICE);
            if !missing.is_empty() {
                return Err(ClientError::MissingPermissions {
                    channel_id,
                    missing,
                });
            }
        }

        let (player, created) = match self.players.entry(guild_id.clone()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let player = Arc::new(Player::new(
                    guild_id.clone(),
                    channel_id.clone(),
                    node,
                    self.player_config.default_volume,
                ));
                entry.insert(player.clone());
                (player, true)
            }
        };
        let previous_channel = player.channel_id();
        player.set_channel(channel_id.clone());

        let update = UpdateVoiceState::join(
            guild_id.clone(),
            channel_id,
            self_mute.unwrap_or(self.player_config.self_mute),
            self_deaf.unwrap_or(self.player_config.self_deaf),
        );
        if let Err(e) = self.send_to_shard(&guild_id, update.to_payload()).await {
            if created {
                self.players
                    .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, &player));
            } else {
                player.set_channel(previous_channel);
            }
            return Err(e);
        }

        if created {
            // Voice packets that arrived before this join were held back.
            let ready = self.voice.get(&guild_id).and_then(|pending| pending.ready());
            if let Err(e) = self.forward_voice(&guild_id, ready) {
                warn!("[{}] Could not forward buffered voice session: {}", guild_id, e);
            }
        }

        info!(
            "[{}] Joined voice channel {} in guild {}",
            player.node().name(),
            player.channel_id(),
            guild_id
        );
        Ok(player)
    }

    /// Leaves voice in a guild and destroys its player.
    ///
    /// Returns whether a player existed.
    pub async fn leave(&self, guild_id: &GuildId) -> ClientResult<bool> {
        self.send_to_shard(guild_id, UpdateVoiceState::leave(guild_id.clone()).to_payload())
            .await?;
        self.voice.remove(guild_id);

        match self.players.remove(guild_id) {
            Some((_, player)) => {
                if let Err(e) = player.destroy() {
                    warn!("[{}] Could not destroy player: {}", guild_id, e);
                }
                info!("[{}] Left voice", guild_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Routes a raw dispatch read off a shard. Returns whether it was a voice
    /// packet the manager consumed.
    pub fn handle_packet(&self, packet: GatewayPacket) -> ClientResult<bool> {
        match packet.t.as_deref() {
            Some("VOICE_STATE_UPDATE") => {
                let update: VoiceStateUpdate = serde_json::from_value(packet.d)?;
                self.voice_state_update(update)?;
                Ok(true)
            }
            Some("VOICE_SERVER_UPDATE") => {
                let update: VoiceServerUpdate = serde_json::from_value(packet.d)?;
                self.voice_server_update(update)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Records the bot's voice session. A null channel means the bot was
    /// disconnected from voice, so the local player goes away.
    pub fn voice_state_update(&self, update: VoiceStateUpdate) -> ClientResult<()> {
        if update.user_id != self.client.user_id {
            return Ok(());
        }
        let Some(guild_id) = update.guild_id else {
            return Ok(());
        };

        let Some(channel_id) = update.channel_id else {
            debug!("[{}] Bot left voice; dropping player", guild_id);
            self.voice.remove(&guild_id);
            if let Some((_, player)) = self.players.remove(&guild_id) {
                if let Err(e) = player.destroy() {
                    warn!("[{}] Could not destroy player: {}", guild_id, e);
                }
            }
            return Ok(());
        };

        if let Some(player) = self.players.get(&guild_id) {
            player.set_channel(channel_id);
        }

        let ready = {
            let mut pending = self.voice.entry(guild_id.clone()).or_default();
            if pending.set_session(update.session_id) {
                pending.ready()
            } else {
                None
            }
        };
        self.forward_voice(&guild_id, ready)
    }

    /// Records the voice server and forwards the handshake once complete.
    pub fn voice_server_update(&self, update: VoiceServerUpdate) -> ClientResult<()> {
        if update.endpoint.is_none() {
            debug!("[{}] Voice server reallocating; waiting", update.guild_id);
            return Ok(());
        }

        let guild_id = update.guild_id.clone();
        let ready = {
            let mut pending = self.voice.entry(guild_id.clone()).or_default();
            pending.set_server(update);
            pending.ready()
        };
        self.forward_voice(&guild_id, ready)
    }

    fn forward_voice(
        &self,
        guild_id: &GuildId,
        ready: Option<(String, VoiceServerUpdate)>,
    ) -> ClientResult<()> {
        let Some((session_id, event)) = ready else {
            return Ok(());
        };
        let Some(player) = self.get(guild_id) else {
            debug!("[{}] Voice handshake ready but no player yet", guild_id);
            return Ok(());
        };

        debug!(
            "[{}] Forwarding voice session to node {}",
            guild_id,
            player.node().name()
        );
        player.node().send(&OutgoingMessage::VoiceUpdate {
            guild_id: guild_id.clone(),
            session_id,
            event,
        })
    }

    fn pick_node(&self, name: Option<&str>) -> ClientResult<Arc<Node>> {
        match name {
            Some(name) => self
                .node(name)
                .ok_or_else(|| ClientError::UnknownNode(name.to_string())),
            None => self
                .nodes
                .read()
                .iter()
                .find(|n| n.is_connected())
                .cloned()
                .ok_or(ClientError::NoAvailableNode),
        }
    }

    async fn send_to_shard(
        &self,
        guild_id: &GuildId,
        payload: serde_json::Value,
    ) -> ClientResult<()> {
        let shard_id = guild_id.shard_id(self.client.shard_count);
        debug!("[{}] Voice state -> shard {}", guild_id, shard_id);
        self.gateway
            .send(shard_id, payload)
            .await
            .map_err(ClientError::Gateway)
    }

    fn node_session(&self) -> NodeSession {
        NodeSession {
            user_id: self.client.user_id,
            shard_count: self.client.shard_count,
            client_name: self.client.client_name.clone(),
        }
    }
}

impl Drop for PlayerManager {
    fn drop(&mut self) {
        for node in self.nodes.get_mut().iter() {
            node.close();
        }
    }
}
