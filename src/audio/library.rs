// Library store - the ordered track list plus playlists
// Owns identity assignment and keeps playlist membership pointing at real tracks

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info};

use super::playlist::{Playlist, PlaylistId};
use super::track::{InMemoryAudio, Track, TrackId};

/// Which playlist the track view is narrowed to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaylistFilter {
    #[default]
    All,
    Playlist(PlaylistId),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewFilter {
    pub playlist: PlaylistFilter,
    pub search: String,
}

impl ViewFilter {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            playlist: PlaylistFilter::All,
            search: query.into(),
        }
    }

    pub fn playlist(id: PlaylistId) -> Self {
        Self {
            playlist: PlaylistFilter::Playlist(id),
            search: String::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AddOutcome {
    pub added: Vec<TrackId>,
    /// The library was empty before this add and now has a first track.
    pub first_track: Option<TrackId>,
}

#[derive(Debug)]
pub struct RemovedTrack {
    pub track: Track,
    pub index: usize,
    pub playlists_touched: usize,
}

#[derive(Debug, Default)]
pub struct LibraryStore {
    tracks: Vec<Track>,
    playlists: Vec<Playlist>,
    view: ViewFilter,
    last_playlist_millis: i64,
}

impl LibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from restored data. Membership entries that point at
    /// tracks not in `tracks` are dropped.
    pub fn from_parts(tracks: Vec<Track>, mut playlists: Vec<Playlist>) -> Self {
        let mut seen = HashSet::new();
        let tracks: Vec<Track> = tracks
            .into_iter()
            .filter(|track| seen.insert(track.id.clone()))
            .collect();

        let mut dropped = 0;
        for playlist in &mut playlists {
            dropped += playlist.retain_tracks(|id| seen.contains(id));
            let mut members = HashSet::new();
            playlist.retain_tracks(|id| members.insert(id.clone()));
        }
        if dropped > 0 {
            debug!("Dropped {} dangling playlist entries while restoring", dropped);
        }

        Self {
            tracks,
            playlists,
            view: ViewFilter::default(),
            last_playlist_millis: 0,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|track| &track.id == id)
    }

    pub fn track_at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn index_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|track| &track.id == id)
    }

    pub fn playlist(&self, id: &PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|playlist| &playlist.id == id)
    }

    fn playlist_mut(&mut self, id: &PlaylistId) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|playlist| &playlist.id == id)
    }

    pub fn view(&self) -> &ViewFilter {
        &self.view
    }

    /// Narrow the view to a playlist. Unknown playlists are ignored.
    pub fn set_view_playlist(&mut self, filter: PlaylistFilter) -> bool {
        if let PlaylistFilter::Playlist(id) = &filter {
            if self.playlist(id).is_none() {
                return false;
            }
        }
        self.view.playlist = filter;
        true
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.view.search = query.into();
    }

    pub fn add_tracks_by_path<I>(&mut self, paths: I) -> AddOutcome
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.append(paths.into_iter().map(Track::from_path))
    }

    pub fn add_tracks_by_handle<I>(&mut self, handles: I) -> AddOutcome
    where
        I: IntoIterator<Item = (String, InMemoryAudio)>,
    {
        self.append(
            handles
                .into_iter()
                .map(|(name, audio)| Track::from_memory(&name, audio)),
        )
    }

    fn append(&mut self, new_tracks: impl Iterator<Item = Track>) -> AddOutcome {
        let was_empty = self.tracks.is_empty();
        let mut outcome = AddOutcome::default();

        for track in new_tracks {
            info!("Added track '{}' ({})", track.title, track.id);
            outcome.added.push(track.id.clone());
            self.tracks.push(track);
        }

        if was_empty {
            outcome.first_track = outcome.added.first().cloned();
        }
        outcome
    }

    /// Remove a track and purge it from every playlist. Unknown ids are a no-op.
    pub fn delete_track(&mut self, id: &TrackId) -> Option<RemovedTrack> {
        let index = self.index_of(id)?;
        let track = self.tracks.remove(index);

        let playlists_touched = self
            .playlists
            .iter_mut()
            .map(|playlist| playlist.retain_tracks(|member| member != id))
            .filter(|&dropped| dropped > 0)
            .count();

        info!(
            "Deleted track '{}' ({}), purged from {} playlist(s)",
            track.title, track.id, playlists_touched
        );
        Some(RemovedTrack {
            track,
            index,
            playlists_touched,
        })
    }

    /// Create an empty playlist and make it the active view.
    /// Blank names are rejected.
    pub fn create_playlist(&mut self, name: &str) -> Option<PlaylistId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let id = self.next_playlist_id(chrono::Utc::now().timestamp_millis());
        self.playlists.push(Playlist::new(id.clone(), name.to_string()));
        self.view.playlist = PlaylistFilter::Playlist(id.clone());
        info!("Created playlist '{}' ({})", name, id);
        Some(id)
    }

    fn next_playlist_id(&mut self, now_millis: i64) -> PlaylistId {
        let mut millis = now_millis.max(self.last_playlist_millis + 1);
        while self.playlist(&PlaylistId::from_millis(millis)).is_some() {
            millis += 1;
        }
        self.last_playlist_millis = millis;
        PlaylistId::from_millis(millis)
    }

    pub fn rename_playlist(&mut self, id: &PlaylistId, new_name: &str) -> bool {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return false;
        }
        let Some(playlist) = self.playlist_mut(id) else {
            return false;
        };
        if playlist.name == new_name {
            return false;
        }

        info!("Renamed playlist '{}' to '{}'", playlist.name, new_name);
        playlist.name = new_name.to_string();
        true
    }

    /// Remove a playlist. Its tracks stay in the library.
    pub fn delete_playlist(&mut self, id: &PlaylistId) -> bool {
        let Some(pos) = self.playlists.iter().position(|playlist| &playlist.id == id) else {
            return false;
        };
        let playlist = self.playlists.remove(pos);
        if self.view.playlist == PlaylistFilter::Playlist(id.clone()) {
            self.view.playlist = PlaylistFilter::All;
        }
        info!("Deleted playlist '{}' ({})", playlist.name, playlist.id);
        true
    }

    pub fn add_track_to_playlist(&mut self, playlist_id: &PlaylistId, track_id: &TrackId) -> bool {
        if self.track(track_id).is_none() {
            return false;
        }
        match self.playlist_mut(playlist_id) {
            Some(playlist) => playlist.add_track(track_id.clone()),
            None => false,
        }
    }

    pub fn remove_track_from_playlist(
        &mut self,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> bool {
        match self.playlist_mut(playlist_id) {
            Some(playlist) => playlist.remove_track(track_id),
            None => false,
        }
    }

    /// Tracks matching `filter`, in library order. An unknown playlist
    /// matches nothing.
    pub fn visible_tracks(&self, filter: &ViewFilter) -> Vec<&Track> {
        let members: Option<HashSet<&TrackId>> = match &filter.playlist {
            PlaylistFilter::All => None,
            PlaylistFilter::Playlist(id) => Some(
                self.playlist(id)
                    .map(|playlist| playlist.track_ids.iter().collect())
                    .unwrap_or_default(),
            ),
        };
        let needle = filter.search.to_lowercase();

        self.tracks
            .iter()
            .filter(|track| members.as_ref().map_or(true, |set| set.contains(&track.id)))
            .filter(|track| needle.is_empty() || track.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// `visible_tracks` for the store's own active view.
    pub fn visible(&self) -> Vec<&Track> {
        self.visible_tracks(&self.view)
    }
}
