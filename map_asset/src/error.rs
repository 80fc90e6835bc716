use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type AssetResult<T> = Result<T, AssetError>;

/// Everything that can go wrong while turning one source asset into its compiled form.
#[derive(Debug, Error)]
pub enum AssetError {
    /// A required node or attribute is missing, or has the wrong shape.
    #[error("malformed descriptor {}: {message}", path.display())]
    MalformedDescriptor { path: PathBuf, message: String },
    /// A path escapes the asset root, or a referenced file does not exist.
    #[error("cannot resolve {}: {reason}", path.display())]
    PathResolution { path: PathBuf, reason: String },
    /// The descriptor is well formed but breaks a gameplay rule.
    #[error("schema violation: {0}")]
    SchemaViolation(String),
    /// A string or counted sequence does not fit its 16-bit length prefix.
    #[error("{what} has length {len}, which exceeds the 16-bit limit of {}", u16::MAX)]
    EncodingOverflow { what: &'static str, len: usize },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AssetError {
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unresolved(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PathResolution {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaViolation(message.into())
    }
}
