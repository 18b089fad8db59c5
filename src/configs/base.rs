use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    common::{ClientError, ClientResult},
    configs::*,
    player::MAX_VOLUME,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
    #[serde(default)]
    pub player: PlayerConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    pub fn new(client: ClientConfig, nodes: Vec<NodeConfig>) -> Self {
        Self {
            client,
            nodes,
            player: PlayerConfig::default(),
            logging: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)?;
        if config_str.trim().is_empty() {
            return Err(ClientError::Config(format!("{} is empty", path.display())));
        }
        Self::from_toml(&config_str)
    }

    pub fn from_toml(input: &str) -> ClientResult<Self> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.nodes.is_empty() {
            return Err(ClientError::Config("at least one node is required".into()));
        }
        if self.client.shard_count == 0 {
            return Err(ClientError::Config("shard_count must be at least 1".into()));
        }
        if self.client.event_buffer == 0 {
            return Err(ClientError::Config("event_buffer must be at least 1".into()));
        }
        if self.player.default_volume > MAX_VOLUME {
            return Err(ClientError::InvalidVolume(self.player.default_volume as i64));
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            if node.name.is_empty() || node.host.is_empty() {
                return Err(ClientError::Config("node name and host must be set".into()));
            }
            if !names.insert(node.name.as_str()) {
                return Err(ClientError::Config(format!(
                    "duplicate node name `{}`",
                    node.name
                )));
            }
        }
        Ok(())
    }
}
