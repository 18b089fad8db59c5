use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::{
    common::{
        ClientError, ClientResult,
        types::{ChannelId, GuildId, now_ms},
    },
    node::Node,
    protocol::{EqBand, Filters, OutgoingMessage, PlayerEvent, PlayerUpdateState},
};

pub mod options;
pub mod state;

pub use options::PlayOptions;
pub use state::PlayerState;

/// Highest volume the node accepts. 100 is unity gain.
pub const MAX_VOLUME: u16 = 1000;

pub fn validate_volume(volume: u16) -> ClientResult<u16> {
    if volume > MAX_VOLUME {
        return Err(ClientError::InvalidVolume(volume as i64));
    }
    Ok(volume)
}

/// Per-guild playback handle bound to one node.
///
/// Every command validates its input, sends one opcode to the node and then
/// updates the local state. The node stays authoritative: `playerUpdate` and
/// track events overwrite what the commands assumed.
pub struct Player {
    guild_id: GuildId,
    node: Arc<Node>,
    channel_id: RwLock<ChannelId>,
    state: RwLock<PlayerState>,
}

impl Player {
    pub fn new(guild_id: GuildId, channel_id: ChannelId, node: Arc<Node>, volume: u16) -> Self {
        Self {
            guild_id,
            node,
            channel_id: RwLock::new(channel_id),
            state: RwLock::new(PlayerState::new(volume)),
        }
    }

    pub fn guild_id(&self) -> &GuildId {
        &self.guild_id
    }

    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn channel_id(&self) -> ChannelId {
        self.channel_id.read().clone()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PlayerState {
        self.state.read().clone()
    }

    pub fn is_playing(&self) -> bool {
        let state = self.state.read();
        state.playing && !state.paused
    }

    /// Estimated playback position, extrapolated from the last report.
    pub fn position(&self) -> u64 {
        self.state.read().estimated_position(now_ms())
    }

    pub fn play(&self, track: impl Into<String>, options: PlayOptions) -> ClientResult<()> {
        let track = track.into();
        if track.is_empty() {
            return Err(ClientError::MissingOption("track"));
        }
        if let Some(volume) = options.volume {
            validate_volume(volume)?;
        }

        self.node.send(&OutgoingMessage::Play {
            guild_id: self.guild_id.clone(),
            track: track.clone(),
            start_time: options.start_time,
            end_time: options.end_time,
            volume: options.volume,
            no_replace: options.no_replace,
            pause: options.pause,
        })?;

        let mut state = self.state.write();
        if options.no_replace == Some(true) && state.track.is_some() && state.playing {
            debug!("[{}] Kept current track (noReplace)", self.guild_id);
            return Ok(());
        }
        state.track = Some(track);
        state.playing = true;
        state.paused = options.pause.unwrap_or(false);
        state.position = options.start_time.unwrap_or(0);
        state.time = now_ms();
        if let Some(volume) = options.volume {
            state.volume = volume;
        }
        Ok(())
    }

    pub fn stop(&self) -> ClientResult<()> {
        self.node.send(&OutgoingMessage::Stop {
            guild_id: self.guild_id.clone(),
        })?;

        self.state.write().clear_track();
        Ok(())
    }

    pub fn pause(&self, pause: bool) -> ClientResult<()> {
        self.node.send(&OutgoingMessage::Pause {
            guild_id: self.guild_id.clone(),
            pause,
        })?;

        let mut state = self.state.write();
        let now = now_ms();
        // Freeze the extrapolated position at the moment of the toggle.
        state.position = state.estimated_position(now);
        state.time = now;
        state.paused = pause;
        Ok(())
    }

    pub fn resume(&self) -> ClientResult<()> {
        self.pause(false)
    }

    pub fn seek(&self, position: u64) -> ClientResult<()> {
        if self.state.read().track.is_none() {
            return Err(ClientError::NothingPlaying(self.guild_id.clone()));
        }

        self.node.send(&OutgoingMessage::Seek {
            guild_id: self.guild_id.clone(),
            position,
        })?;

        let mut state = self.state.write();
        state.position = position;
        state.time = now_ms();
        Ok(())
    }

    pub fn set_volume(&self, volume: u16) -> ClientResult<()> {
        validate_volume(volume)?;

        self.node.send(&OutgoingMessage::Volume {
            guild_id: self.guild_id.clone(),
            volume,
        })?;

        self.state.write().volume = volume;
        Ok(())
    }

    pub fn set_equalizer(&self, bands: Vec<EqBand>) -> ClientResult<()> {
        for band in &bands {
            band.validate()?;
        }

        self.node.send(&OutgoingMessage::Equalizer {
            guild_id: self.guild_id.clone(),
            bands: bands.clone(),
        })?;

        self.state.write().filters.equalizer = Some(bands);
        Ok(())
    }

    /// Sends a partial filter update; filters left unset keep their value.
    pub fn set_filters(&self, filters: Filters) -> ClientResult<()> {
        filters.validate()?;

        let merged = {
            let mut merged = self.state.read().filters.clone();
            merged.merge_from(filters);
            merged
        };

        self.node.send(&OutgoingMessage::Filters {
            guild_id: self.guild_id.clone(),
            filters: merged.clone(),
        })?;

        self.state.write().filters = merged;
        Ok(())
    }

    /// Tells the node to drop this guild's player.
    pub fn destroy(&self) -> ClientResult<()> {
        self.node.send(&OutgoingMessage::Destroy {
            guild_id: self.guild_id.clone(),
        })?;

        let mut state = self.state.write();
        state.clear_track();
        state.connected = false;
        Ok(())
    }

    pub(crate) fn set_channel(&self, channel_id: ChannelId) {
        *self.channel_id.write() = channel_id;
    }

    pub(crate) fn apply_update(&self, update: &PlayerUpdateState) {
        let mut state = self.state.write();
        state.time = update.time;
        state.position = update.position.unwrap_or(0);
        state.connected = update.connected;
        state.ping = update.ping;
    }

    pub(crate) fn apply_event(&self, event: &PlayerEvent) {
        let mut state = self.state.write();
        match event {
            PlayerEvent::TrackStart { track, .. } => {
                state.track = Some(track.clone());
                state.playing = true;
            }
            PlayerEvent::TrackEnd { track, reason, .. } => {
                // A replaced track is followed by the start of the new one;
                // only clear when the ending track is still the current one.
                if !matches!(reason, crate::protocol::TrackEndReason::Replaced)
                    && state.track.as_deref().is_none_or(|current| current == track)
                {
                    state.clear_track();
                }
            }
            PlayerEvent::WebSocketClosed { .. } => {
                state.connected = false;
            }
            PlayerEvent::TrackException { .. }
            | PlayerEvent::TrackStuck { .. }
            | PlayerEvent::Unknown => {}
        }
    }

    pub(crate) fn mark_disconnected(&self) {
        let mut state = self.state.write();
        state.connected = false;
        state.ping = -1;
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("guild_id", &self.guild_id)
            .field("node", &self.node.name())
            .field("channel_id", &*self.channel_id.read())
            .field("state", &*self.state.read())
            .finish()
    }
}
