use serde::{Deserialize, Serialize};

/// `[logging]` table. Ignored when `RUST_LOG` is set.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Base level for every target, `info` when unset.
    pub level: Option<String>,
    /// Extra `EnvFilter` directives, e.g. `lavabridge::node=debug`.
    pub filters: Option<String>,
    /// Coloured output. Defaults to on.
    #[serde(default)]
    pub ansi: Option<bool>,
}
