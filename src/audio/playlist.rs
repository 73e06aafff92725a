use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::track::TrackId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    /// Id derived from creation time, `pl-<unix millis>`.
    pub fn from_millis(millis: i64) -> Self {
        Self(format!("pl-{millis}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlaylistId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlaylistId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-named, ordered list of track ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub track_ids: Vec<TrackId>,
}

impl Playlist {
    pub fn new(id: PlaylistId, name: String) -> Self {
        Self {
            id,
            name,
            track_ids: Vec::new(),
        }
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.track_ids.contains(track_id)
    }

    /// Append unless already a member. Returns whether anything changed.
    pub fn add_track(&mut self, track_id: TrackId) -> bool {
        if self.contains(&track_id) {
            return false;
        }
        info!("Added track {} to playlist '{}'", track_id, self.name);
        self.track_ids.push(track_id);
        true
    }

    pub fn remove_track(&mut self, track_id: &TrackId) -> bool {
        if let Some(pos) = self.track_ids.iter().position(|id| id == track_id) {
            self.track_ids.remove(pos);
            info!("Removed track {} from playlist '{}'", track_id, self.name);
            true
        } else {
            false
        }
    }

    /// Drop every member `keep` rejects. Returns how many were dropped.
    pub fn retain_tracks(&mut self, mut keep: impl FnMut(&TrackId) -> bool) -> usize {
        let before = self.track_ids.len();
        self.track_ids.retain(|id| keep(id));
        before - self.track_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.track_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_track_suppresses_duplicates() {
        let mut playlist = Playlist::new(PlaylistId::from_millis(1), "Chill".into());
        assert!(playlist.add_track(TrackId::from("a")));
        assert!(!playlist.add_track(TrackId::from("a")));
        assert!(playlist.add_track(TrackId::from("b")));
        assert_eq!(playlist.track_ids, vec![TrackId::from("a"), TrackId::from("b")]);
    }

    #[test]
    fn remove_track_reports_membership() {
        let mut playlist = Playlist::new(PlaylistId::from_millis(1), "Chill".into());
        playlist.add_track(TrackId::from("a"));
        assert!(!playlist.remove_track(&TrackId::from("zzz")));
        assert!(playlist.remove_track(&TrackId::from("a")));
        assert!(playlist.is_empty());
    }
}
