use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load inlay configuration: {0}")]
    Parse(#[source] anyhow::Error),
    #[error("invalid {var}={value:?}: expected {expected}")]
    InvalidOverride {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Invalid(#[from] inlay_core::InlayError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}
