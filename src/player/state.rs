use serde::Serialize;

use crate::protocol::Filters;

/// Local mirror of a guild player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Encoded track currently loaded, if any.
    pub track: Option<String>,
    pub volume: u16,
    pub paused: bool,
    pub playing: bool,
    /// Playback position in milliseconds at `time`.
    pub position: u64,
    /// Unix timestamp in milliseconds of the last position report.
    pub time: u64,
    /// Whether the node holds a voice connection for the guild.
    pub connected: bool,
    /// Voice gateway ping in milliseconds. -1 if not connected.
    pub ping: i64,
    pub filters: Filters,
}

impl PlayerState {
    pub fn new(volume: u16) -> Self {
        Self {
            track: None,
            volume,
            paused: false,
            playing: false,
            position: 0,
            time: 0,
            connected: false,
            ping: -1,
            filters: Filters::default(),
        }
    }

    pub(crate) fn clear_track(&mut self) {
        self.track = None;
        self.playing = false;
        self.paused = false;
        self.position = 0;
    }

    /// Position at `now`, assuming playback advanced in real time since `time`.
    pub fn estimated_position(&self, now: u64) -> u64 {
        if !self.playing || self.paused || self.time == 0 {
            return self.position;
        }
        self.position + now.saturating_sub(self.time)
    }
}
