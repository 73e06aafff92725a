// Error types shared across the library
// Everything here is recoverable - nothing in the player is fatal to the process

use std::path::PathBuf;
use thiserror::Error;

use crate::audio::TrackId;

/// Failure while turning a track into a playable source.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("track {0} was removed while its source was loading")]
    TrackRemoved(TrackId),
}

/// Failure reported by a media element.
#[derive(Debug, Error)]
pub enum MediaError {
    /// Playback refused without a user gesture (or by the output device).
    #[error("playback not allowed: {0}")]
    NotAllowed(String),
    #[error("could not decode audio: {0}")]
    Decode(String),
    #[error("no source bound")]
    NoSource,
    #[error("audio output failed: {0}")]
    Output(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}
