use super::AudioFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Opaque track identity. Fresh ids are random, restored ids are whatever
/// the snapshot carried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes of an imported file that has no durable path.
#[derive(Clone)]
pub struct InMemoryAudio {
    pub bytes: Arc<[u8]>,
    pub format: AudioFormat,
}

impl InMemoryAudio {
    pub fn new(name: &str, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
            format: AudioFormat::from_path(Path::new(name)),
        }
    }
}

impl fmt::Debug for InMemoryAudio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryAudio")
            .field("len", &self.bytes.len())
            .field("format", &self.format)
            .finish()
    }
}

/// Where a track's bytes come from. A path makes the track persistent,
/// in-memory bytes make it session-only.
#[derive(Debug, Clone)]
pub enum TrackSource {
    Path(PathBuf),
    Memory(InMemoryAudio),
}

#[derive(Debug, Clone)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub source: TrackSource,
}

impl Track {
    pub fn from_path(path: PathBuf) -> Self {
        Self {
            id: TrackId::fresh(),
            title: title_from_path(&path),
            source: TrackSource::Path(path),
        }
    }

    pub fn from_memory(name: &str, audio: InMemoryAudio) -> Self {
        Self {
            id: TrackId::fresh(),
            title: title_from_path(Path::new(name)),
            source: TrackSource::Memory(audio),
        }
    }

    /// Rebuild a persistent track from a saved snapshot entry.
    pub fn restored(id: TrackId, title: String, path: PathBuf) -> Self {
        Self {
            id,
            title,
            source: TrackSource::Path(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            TrackSource::Path(path) => Some(path),
            TrackSource::Memory(_) => None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.path().is_some()
    }

    pub fn format(&self) -> AudioFormat {
        match &self.source {
            TrackSource::Path(path) => AudioFormat::from_path(path),
            TrackSource::Memory(audio) => audio.format,
        }
    }
}

/// Final path segment, either separator style.
pub fn title_from_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    raw.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_final_segment() {
        assert_eq!(title_from_path(Path::new("/music/album/Song One.mp3")), "Song One.mp3");
        assert_eq!(title_from_path(Path::new(r"C:\Music\two.flac")), "two.flac");
        assert_eq!(title_from_path(Path::new("")), "Unknown");
    }

    #[test]
    fn same_name_imports_get_distinct_ids() {
        let a = Track::from_memory("a.mp3", InMemoryAudio::new("a.mp3", vec![1u8, 2, 3]));
        let b = Track::from_memory("a.mp3", InMemoryAudio::new("a.mp3", vec![1u8, 2, 3]));
        assert_ne!(a.id, b.id);
        assert!(!a.is_persistent());
        assert_eq!(a.title, "a.mp3");
    }

    #[test]
    fn path_tracks_are_persistent() {
        let track = Track::from_path(PathBuf::from("/m/x.ogg"));
        assert!(track.is_persistent());
        assert_eq!(track.format(), AudioFormat::Ogg);
    }
}
