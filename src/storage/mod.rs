// Library snapshot - the durable half of the library
// Persistent tracks and playlists go to one JSON document; session-only
// tracks never leave memory

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::audio::{LibraryStore, Playlist, PlaylistId, Track, TrackId};
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub tracks: Vec<SnapshotTrack>,
    #[serde(default)]
    pub playlists: Vec<SnapshotPlaylist>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTrack {
    pub id: TrackId,
    pub path: PathBuf,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPlaylist {
    pub id: PlaylistId,
    pub name: String,
    #[serde(default)]
    pub track_ids: Vec<TrackId>,
}

impl LibrarySnapshot {
    /// Durable projection of `library`. Tracks without a path are left out.
    pub fn capture(library: &LibraryStore) -> Self {
        Self {
            tracks: library
                .tracks()
                .iter()
                .filter_map(|track| {
                    track.path().map(|path| SnapshotTrack {
                        id: track.id.clone(),
                        path: path.to_path_buf(),
                        title: track.title.clone(),
                    })
                })
                .collect(),
            playlists: library
                .playlists()
                .iter()
                .map(|playlist| SnapshotPlaylist {
                    id: playlist.id.clone(),
                    name: playlist.name.clone(),
                    track_ids: playlist.track_ids.clone(),
                })
                .collect(),
        }
    }

    pub fn into_library(self) -> LibraryStore {
        let tracks = self
            .tracks
            .into_iter()
            .map(|t| Track::restored(t.id, t.title, t.path))
            .collect();
        let playlists = self
            .playlists
            .into_iter()
            .map(|p| Playlist {
                id: p.id,
                name: p.name,
                track_ids: p.track_ids,
            })
            .collect();
        LibraryStore::from_parts(tracks, playlists)
    }
}

/// Reads and writes the snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved snapshot, or an empty one when there is nothing usable on disk.
    pub fn load(&self) -> LibrarySnapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                info!(
                    "Loaded {} track(s) and {} playlist(s) from {}",
                    snapshot.tracks.len(),
                    snapshot.playlists.len(),
                    self.path.display()
                );
                snapshot
            }
            Ok(None) => {
                debug!("No saved library at {}", self.path.display());
                LibrarySnapshot::default()
            }
            Err(e) => {
                warn!("Ignoring unreadable library {}: {}", self.path.display(), e);
                LibrarySnapshot::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<LibrarySnapshot>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, snapshot: &LibrarySnapshot) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json)?;
        debug!(
            "Saved {} track(s) and {} playlist(s)",
            snapshot.tracks.len(),
            snapshot.playlists.len()
        );
        Ok(())
    }
}
