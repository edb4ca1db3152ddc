use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no channels configured")]
    NoChannels,

    #[error("post count and date range are mutually exclusive")]
    ConflictingStrategy,

    #[error("either a post count or both start and end dates are required")]
    MissingStrategy,

    #[error("post count must be a positive integer")]
    ZeroPostCount,

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: String, end: String },

    #[error("invalid date '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("channel '{identity}' not found (looked in {})", .path.display())]
    ChannelNotFound { identity: String, path: PathBuf },

    #[error("malformed export {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("message {id} has an unreadable date '{date}'")]
    BadDate { id: i64, date: String },

    #[error("media '{0}' is not known to this source")]
    UnknownMedia(String),
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot identify image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl CodecError {
    /// Failures that only cost the one image: bad bytes, or the file is gone.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Decode { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::Encode { .. } => false,
        }
    }
}
