use serde::{Deserialize, Serialize};

use crate::{
    common::{Severity, types::GuildId},
    protocol::stats::Stats,
};

/// Messages pushed from the node to the client over the websocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum IncomingMessage {
    PlayerUpdate {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        state: PlayerUpdateState,
    },
    Stats(Stats),
    Event(PlayerEvent),
    #[serde(other)]
    Unknown,
}

/// Position report attached to a `playerUpdate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdateState {
    /// Unix timestamp in milliseconds on the node.
    pub time: u64,
    /// Absent when no track is loaded.
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub connected: bool,
    /// Voice gateway ping in milliseconds. -1 if not connected.
    #[serde(default = "default_ping")]
    pub ping: i64,
}

fn default_ping() -> i64 {
    -1
}

/// Playback events emitted by a node for a single guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    #[serde(rename = "TrackStartEvent")]
    TrackStart {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: String,
    },

    #[serde(rename = "TrackEndEvent")]
    TrackEnd {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: String,
        reason: TrackEndReason,
    },

    #[serde(rename = "TrackExceptionEvent")]
    TrackException {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: String,
        #[serde(default)]
        exception: Option<TrackException>,
        /// Plain message sent by older nodes instead of `exception`.
        #[serde(default)]
        error: Option<String>,
    },

    #[serde(rename = "TrackStuckEvent")]
    TrackStuck {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: String,
        #[serde(rename = "thresholdMs")]
        threshold_ms: u64,
    },

    #[serde(rename = "WebSocketClosedEvent")]
    WebSocketClosed {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        code: u16,
        reason: String,
        #[serde(rename = "byRemote")]
        by_remote: bool,
    },

    #[serde(other)]
    Unknown,
}

impl PlayerEvent {
    pub fn guild_id(&self) -> Option<&GuildId> {
        match self {
            Self::TrackStart { guild_id, .. }
            | Self::TrackEnd { guild_id, .. }
            | Self::TrackException { guild_id, .. }
            | Self::TrackStuck { guild_id, .. }
            | Self::WebSocketClosed { guild_id, .. } => Some(guild_id),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
    Replaced,
    Cleanup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackException {
    pub message: Option<String>,
    pub severity: Severity,
    pub cause: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> IncomingMessage {
        serde_json::from_value(value).expect("message should parse")
    }

    #[test]
    fn test_player_update() {
        let msg = parse(json!({
            "op": "playerUpdate",
            "guildId": "1",
            "state": {"time": 1500, "position": 6000, "connected": true, "ping": 42}
        }));
        match msg {
            IncomingMessage::PlayerUpdate { guild_id, state } => {
                assert_eq!(guild_id, GuildId::from("1"));
                assert_eq!(state.position, Some(6000));
                assert!(state.connected);
                assert_eq!(state.ping, 42);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_player_update_without_track() {
        let msg = parse(json!({"op": "playerUpdate", "guildId": "1", "state": {"time": 1}}));
        let IncomingMessage::PlayerUpdate { state, .. } = msg else {
            panic!("expected playerUpdate");
        };
        assert_eq!(state.position, None);
        assert!(!state.connected);
        assert_eq!(state.ping, -1);
    }

    #[test]
    fn test_stats() {
        let msg = parse(json!({
            "op": "stats",
            "players": 3,
            "playingPlayers": 1,
            "uptime": 123456,
            "memory": {"free": 1, "used": 2, "allocated": 3, "reservable": 4},
            "cpu": {"cores": 4, "systemLoad": 0.5, "lavalinkLoad": 0.1},
            "frameStats": {"sent": 3000, "nulled": 0, "deficit": 0}
        }));
        let IncomingMessage::Stats(stats) = msg else {
            panic!("expected stats");
        };
        assert_eq!(stats.players, 3);
        assert_eq!(stats.playing_players, 1);
        assert_eq!(stats.cpu.cores, 4);
        assert_eq!(stats.frame_stats.map(|f| f.sent), Some(3000));
    }

    #[test]
    fn test_track_events() {
        let end = parse(json!({
            "op": "event",
            "type": "TrackEndEvent",
            "guildId": "1",
            "track": "QAAA",
            "reason": "REPLACED"
        }));
        let IncomingMessage::Event(PlayerEvent::TrackEnd { reason, .. }) = end else {
            panic!("expected TrackEndEvent");
        };
        assert_eq!(reason, TrackEndReason::Replaced);

        let exception = parse(json!({
            "op": "event",
            "type": "TrackExceptionEvent",
            "guildId": "1",
            "track": "QAAA",
            "exception": {"message": "boom", "severity": "FAULT", "cause": "java.io.IOException"}
        }));
        let IncomingMessage::Event(PlayerEvent::TrackException { exception, error, .. }) =
            exception
        else {
            panic!("expected TrackExceptionEvent");
        };
        assert_eq!(exception.map(|e| e.severity), Some(Severity::Fault));
        assert_eq!(error, None);

        let closed = parse(json!({
            "op": "event",
            "type": "WebSocketClosedEvent",
            "guildId": "1",
            "code": 4014,
            "reason": "Disconnected",
            "byRemote": true
        }));
        let IncomingMessage::Event(event) = closed else {
            panic!("expected event");
        };
        assert_eq!(event.guild_id(), Some(&GuildId::from("1")));
    }

    #[test]
    fn test_unknown_op_and_event_type() {
        assert!(matches!(
            parse(json!({"op": "somethingNew", "value": 1})),
            IncomingMessage::Unknown
        ));
        let msg = parse(json!({"op": "event", "type": "SegmentSkipped", "guildId": "1"}));
        assert!(matches!(msg, IncomingMessage::Event(PlayerEvent::Unknown)));
    }
}
