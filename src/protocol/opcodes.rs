use serde::Serialize;

use crate::{
    common::types::GuildId,
    gateway::VoiceServerUpdate,
    protocol::filters::{EqBand, Filters},
};

/// Commands sent from the client to the audio node over the websocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum OutgoingMessage {
    /// Hands the voice session of a guild over to the node.
    VoiceUpdate {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        #[serde(rename = "sessionId")]
        session_id: String,
        event: VoiceServerUpdate,
    },
    Play {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        track: String,
        #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
        start_time: Option<u64>,
        #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
        end_time: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        volume: Option<u16>,
        #[serde(rename = "noReplace", skip_serializing_if = "Option::is_none")]
        no_replace: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pause: Option<bool>,
    },
    Stop {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
    },
    Pause {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        pause: bool,
    },
    Seek {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        position: u64,
    },
    Volume {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        volume: u16,
    },
    Equalizer {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        bands: Vec<EqBand>,
    },
    Filters {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        #[serde(flatten)]
        filters: Filters,
    },
    Destroy {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
    },
}

impl OutgoingMessage {
    pub fn guild_id(&self) -> &GuildId {
        match self {
            Self::VoiceUpdate { guild_id, .. }
            | Self::Play { guild_id, .. }
            | Self::Stop { guild_id }
            | Self::Pause { guild_id, .. }
            | Self::Seek { guild_id, .. }
            | Self::Volume { guild_id, .. }
            | Self::Equalizer { guild_id, .. }
            | Self::Filters { guild_id, .. }
            | Self::Destroy { guild_id } => guild_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::protocol::filters::TimescaleFilter;

    fn guild() -> GuildId {
        GuildId::from("41771983423143937")
    }

    #[test]
    fn test_voice_update_shape() {
        let msg = OutgoingMessage::VoiceUpdate {
            guild_id: guild(),
            session_id: "abc".into(),
            event: VoiceServerUpdate {
                token: "tok".into(),
                guild_id: guild(),
                endpoint: Some("us-east1.discord.media:443".into()),
            },
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "op": "voiceUpdate",
                "guildId": "41771983423143937",
                "sessionId": "abc",
                "event": {
                    "token": "tok",
                    "guild_id": "41771983423143937",
                    "endpoint": "us-east1.discord.media:443"
                }
            })
        );
    }

    #[test]
    fn test_play_omits_unset_options() {
        let msg = OutgoingMessage::Play {
            guild_id: guild(),
            track: "QAAA".into(),
            start_time: None,
            end_time: None,
            volume: None,
            no_replace: None,
            pause: None,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"op": "play", "guildId": "41771983423143937", "track": "QAAA"})
        );

        let msg = OutgoingMessage::Play {
            guild_id: guild(),
            track: "QAAA".into(),
            start_time: Some(1000),
            end_time: Some(5000),
            volume: Some(50),
            no_replace: Some(true),
            pause: Some(false),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "op": "play",
                "guildId": "41771983423143937",
                "track": "QAAA",
                "startTime": 1000,
                "endTime": 5000,
                "volume": 50,
                "noReplace": true,
                "pause": false
            })
        );
    }

    #[test]
    fn test_simple_ops() {
        let cases = [
            (
                OutgoingMessage::Stop { guild_id: guild() },
                json!({"op": "stop", "guildId": "41771983423143937"}),
            ),
            (
                OutgoingMessage::Pause {
                    guild_id: guild(),
                    pause: true,
                },
                json!({"op": "pause", "guildId": "41771983423143937", "pause": true}),
            ),
            (
                OutgoingMessage::Seek {
                    guild_id: guild(),
                    position: 60000,
                },
                json!({"op": "seek", "guildId": "41771983423143937", "position": 60000}),
            ),
            (
                OutgoingMessage::Volume {
                    guild_id: guild(),
                    volume: 150,
                },
                json!({"op": "volume", "guildId": "41771983423143937", "volume": 150}),
            ),
            (
                OutgoingMessage::Destroy { guild_id: guild() },
                json!({"op": "destroy", "guildId": "41771983423143937"}),
            ),
        ];

        for (msg, expected) in cases {
            assert_eq!(serde_json::to_value(&msg).unwrap(), expected);
        }
    }

    #[test]
    fn test_equalizer_and_filters_shape() {
        let msg = OutgoingMessage::Equalizer {
            guild_id: guild(),
            bands: vec![EqBand { band: 0, gain: 0.25 }],
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "op": "equalizer",
                "guildId": "41771983423143937",
                "bands": [{"band": 0, "gain": 0.25}]
            })
        );

        let msg = OutgoingMessage::Filters {
            guild_id: guild(),
            filters: Filters {
                volume: Some(0.5),
                timescale: Some(TimescaleFilter {
                    speed: Some(1.25),
                    pitch: None,
                    rate: None,
                }),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "op": "filters",
                "guildId": "41771983423143937",
                "volume": 0.5,
                "timescale": {"speed": 1.25}
            })
        );
        assert_eq!(msg.guild_id(), &guild());
    }
}
