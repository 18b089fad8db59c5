use serde::{Deserialize, Serialize};

/// Connection details for one audio node.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NodeConfig {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub password: String,
    /// Use `wss://` and `https://` instead of the plain schemes.
    #[serde(default)]
    pub secure: bool,
}

impl NodeConfig {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            password: password.into(),
            secure: false,
        }
    }

    pub fn ws_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{}://{}:{}/", scheme, self.host, self.port)
    }

    /// REST endpoint on this node. `path` must start with `/`.
    pub fn http_url(&self, path: &str) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, self.host, self.port, path)
    }
}

fn default_port() -> u16 {
    2333
}
