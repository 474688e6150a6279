use std::{fmt, path::PathBuf};

use inlay_core::ResolverConfig;
use serde::{Deserialize, Serialize};

/// Everything a host needs to stand up a resolver.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InlayConfig {
    pub resolver: ResolverConfig,
    /// `tracing` filter used when `RUST_LOG` is not set, e.g.
    /// `"inlay_core=debug"`.
    pub log_filter: Option<String>,
}

/// Where the loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Default => f.write_str("defaults"),
            ConfigSource::EnvPath(path) => {
                write!(f, "$INLAY_CONFIG_PATH ({})", path.display())
            }
            ConfigSource::EnvInline => f.write_str("$INLAY_CONFIG_JSON"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}
