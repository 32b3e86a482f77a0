use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DepthError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("No usable depth channel in {}, available channels: {available:?}", path.display())]
    ChannelNotFound { path: PathBuf, available: Vec<String> },

    #[error("Unsupported buffer shape in {}: {reason}", path.display())]
    UnsupportedShape { path: PathBuf, reason: String },

    #[error("Invalid depth dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Cannot read {}: {capability} support is not compiled into this build", path.display())]
    CapabilityUnavailable {
        path: PathBuf,
        capability: &'static str,
    },

    #[error("Failed to encode depth raster: {0}")]
    Encode(String),

    #[error("Output {} for {} is already produced by {}", output.display(), path.display(), claimed_by.display())]
    OutputCollision {
        path: PathBuf,
        output: PathBuf,
        claimed_by: PathBuf,
    },

    #[error("Invalid scale {0}: must be finite and greater than zero")]
    InvalidScale(f64),
}

impl DepthError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DepthError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DepthError>;
