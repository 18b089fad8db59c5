use serde::{Deserialize, Serialize};

/// Defaults applied to newly created players and voice joins.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerConfig {
    #[serde(default = "default_volume")]
    pub default_volume: u16,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            self_deaf: false,
            self_mute: false,
        }
    }
}

fn default_volume() -> u16 {
    100
}
