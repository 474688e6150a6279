use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A string that should have been a cache key was not one.
    InvalidCacheKey(String),
    /// A layout value that must be non-zero was zero.
    InvalidLayout(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidCacheKey(raw) => {
                write!(f, "invalid cache key: {raw:?}")
            }
            ModelError::InvalidLayout(msg) => {
                write!(f, "invalid layout policy: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
