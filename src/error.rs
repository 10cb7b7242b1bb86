//! Error types for the conversion pipeline.

pub use crate::config::ConfigError;

/// The sprite sheet could not be obtained or decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The image decoder rejected the bytes.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The source bytes could not be read (file, URL, data URI, blob handle).
    #[error("read failed: {0}")]
    Read(String),
}

/// The encoder backend failed while assembling or finalising the animation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("encode failed: {0}")]
pub struct EncodeError(pub String);

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<gif::EncodingError> for EncodeError {
    fn from(err: gif::EncodingError) -> Self {
        Self(err.to_string())
    }
}

/// Any failure of a single conversion. Every variant is terminal for the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ConvertError>;
