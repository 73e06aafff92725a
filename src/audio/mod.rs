pub mod library;
pub mod playlist;
pub mod scanner;
pub mod track;

pub use library::{AddOutcome, LibraryStore, PlaylistFilter, RemovedTrack, ViewFilter};
pub use playlist::{Playlist, PlaylistId};
pub use scanner::MusicScanner;
pub use track::{InMemoryAudio, Track, TrackId, TrackSource};

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Ogg,
    Mp4,
    Flac,
    Unknown,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "mp3" => AudioFormat::Mp3,
            "wav" => AudioFormat::Wav,
            "ogg" => AudioFormat::Ogg,
            "m4a" => AudioFormat::Mp4,
            "flac" => AudioFormat::Flac,
            _ => AudioFormat::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(AudioFormat::from_extension)
            .unwrap_or(AudioFormat::Unknown)
    }

    /// Content type handed to the media element. Unknown extensions are
    /// treated as mp3, which is what most decoders sniff best anyway.
    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 | AudioFormat::Unknown => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Mp4 => "audio/mp4",
            AudioFormat::Flac => "audio/flac",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, AudioFormat::Unknown)
    }
}

/// Extensions offered by the file dialog and picked up by directory scans.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "flac"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension_case_insensitive() {
        assert_eq!(AudioFormat::from_path(Path::new("/m/a.mp3")).content_type(), "audio/mpeg");
        assert_eq!(AudioFormat::from_path(Path::new("/m/a.WAV")).content_type(), "audio/wav");
        assert_eq!(AudioFormat::from_path(Path::new("/m/a.ogg")).content_type(), "audio/ogg");
        assert_eq!(AudioFormat::from_path(Path::new("/m/a.m4a")).content_type(), "audio/mp4");
        assert_eq!(AudioFormat::from_path(Path::new("/m/a.Flac")).content_type(), "audio/flac");
    }

    #[test]
    fn unknown_extension_defaults_to_mpeg() {
        assert_eq!(AudioFormat::from_path(Path::new("/m/a.xyz")).content_type(), "audio/mpeg");
        assert_eq!(AudioFormat::from_path(Path::new("/m/noext")).content_type(), "audio/mpeg");
        assert!(!AudioFormat::from_path(Path::new("/m/noext")).is_supported());
    }
}
