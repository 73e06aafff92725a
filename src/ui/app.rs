use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::{AppEvent, Command, EventHandler, ViewTarget, HELP};
use crate::audio::{AddOutcome, InMemoryAudio, LibraryStore, MusicScanner, PlaylistFilter, PlaylistId, TrackId};
use crate::bridge::NativeBridge;
use crate::config::PlaybackConfig;
use crate::media::{MediaElement, MediaEvent, SourceResolver};
use crate::playback::{LoadTicket, PlayAttempt, PlaybackSession, SelectOutcome, SessionCue, Toggle, TransportStatus};
use crate::storage::{LibrarySnapshot, SnapshotStore};

/// Owns the library, the playback session and the snapshot store, and
/// applies one [`AppEvent`] at a time.
pub struct App<E, B> {
    library: LibraryStore,
    session: PlaybackSession<E>,
    resolver: Arc<SourceResolver<B>>,
    storage: SnapshotStore,
    playback: PlaybackConfig,
    scanner: MusicScanner,
    event_handler: EventHandler,
    media_events: mpsc::UnboundedReceiver<MediaEvent>,
    pub should_quit: bool,
}

impl<E: MediaElement, B: NativeBridge> App<E, B> {
    /// Restore the saved library and wire up the session.
    pub fn new(
        playback: PlaybackConfig,
        element: E,
        media_events: mpsc::UnboundedReceiver<MediaEvent>,
        bridge: B,
        storage: SnapshotStore,
    ) -> Self {
        let library = storage.load().into_library();
        let session = PlaybackSession::new(element, playback.volume());

        Self {
            library,
            session,
            resolver: Arc::new(SourceResolver::new(bridge)),
            storage,
            playback,
            scanner: MusicScanner::new(),
            event_handler: EventHandler::new(),
            media_events,
            should_quit: false,
        }
    }

    pub fn library(&self) -> &LibraryStore {
        &self.library
    }

    pub fn session(&self) -> &PlaybackSession<E> {
        &self.session
    }

    pub fn resolver(&self) -> &SourceResolver<B> {
        &self.resolver
    }

    pub fn event_handler(&self) -> &EventHandler {
        &self.event_handler
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.event_handler.sender()
    }

    /// Add every supported file under `directories` that is not already in
    /// the library.
    pub fn scan_directories(&mut self, directories: &[PathBuf]) {
        if directories.is_empty() {
            return;
        }
        let known: HashSet<PathBuf> = self
            .library
            .tracks()
            .iter()
            .filter_map(|track| track.path().map(|p| p.to_path_buf()))
            .collect();
        let fresh: Vec<PathBuf> = self
            .scanner
            .scan_directories(directories)
            .into_iter()
            .filter(|path| !known.contains(path))
            .collect();
        info!("Scan found {} new file(s)", fresh.len());
        self.add_paths(fresh);
    }

    pub async fn run(&mut self) {
        let mut ticker = tokio::time::interval(self.playback.tick_interval());

        while !self.should_quit {
            let event = tokio::select! {
                Some(event) = self.event_handler.next_event() => event,
                Some(event) = self.media_events.recv() => AppEvent::Media(event),
                _ = ticker.tick() => AppEvent::Tick,
            };
            self.handle_event(event).await;
        }

        self.shutdown();
    }

    /// Wait for the next command or element event and apply it. Returns
    /// `false` once the app has been asked to quit.
    pub async fn step(&mut self) -> bool {
        let event = tokio::select! {
            Some(event) = self.event_handler.next_event() => event,
            Some(event) = self.media_events.recv() => AppEvent::Media(event),
        };
        self.handle_event(event).await;
        !self.should_quit
    }

    pub fn shutdown(&mut self) {
        self.session.clear();
        let released = self.resolver.release_all();
        self.persist();
        info!("Shut down, released {} source(s)", released);
    }

    pub async fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Command(command) => self.handle_command(command).await,
            AppEvent::Media(event) => {
                if let Some(SessionCue::AdvanceNext) = self.session.on_media_event(event) {
                    debug!("Track ended, advancing");
                    let ticket = self.session.next(&self.library);
                    self.start_load(ticket);
                }
            }
            AppEvent::SourceResolved { ticket, result } => {
                let title = ticket.track.title.clone();
                match self.session.finish_select(ticket, result) {
                    SelectOutcome::Bound { play: Some(attempt) } => self.after_play(attempt),
                    SelectOutcome::Bound { play: None } | SelectOutcome::Stale => {}
                    SelectOutcome::Failed => {
                        println!(
                            "Could not load '{}': {}",
                            title,
                            self.session.last_error().unwrap_or("unknown error")
                        );
                    }
                }
            }
            AppEvent::ReadyTimeout { wait } => {
                if self.session.on_ready_timeout(wait) {
                    println!("Still not ready to play, press toggle to retry");
                }
            }
            AppEvent::Tick => self.session.poll(),
            AppEvent::InputClosed => self.should_quit = true,
        }
    }

    pub async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Add(paths) => self.add_paths(paths),
            Command::Import(paths) => self.import_files(paths).await,
            Command::Scan(dir) => self.scan_directories(&[dir]),
            Command::Open => {
                let paths = self.resolver.bridge().open_files().await;
                self.add_paths(paths);
            }
            Command::Remove(n) => match self.visible_id(n) {
                Some(id) => self.delete_track(&id),
                None => println!("No track #{}", n + 1),
            },

            Command::Play(n) => {
                let index = self.visible_id(n).and_then(|id| self.library.index_of(&id));
                match index {
                    Some(index) => {
                        let ticket = self.session.begin_select(&self.library, index, true);
                        self.start_load(ticket);
                    }
                    None => println!("No track #{}", n + 1),
                }
            }
            Command::Toggle => match self.session.play_pause(&self.library) {
                Toggle::NoTrack => println!("Nothing selected"),
                Toggle::Paused => {}
                Toggle::Queued { play_on_load } => {
                    debug!("Toggle while loading, play on load: {}", play_on_load);
                }
                Toggle::Play(attempt) => self.after_play(attempt),
                Toggle::Reload(ticket) => self.start_load(Some(ticket)),
            },
            Command::Next => {
                let ticket = self.session.next(&self.library);
                self.start_load(ticket);
            }
            Command::Previous => {
                let ticket = self.session.previous(&self.library);
                self.start_load(ticket);
            }
            Command::Seek(position) => self.session.seek(position),
            Command::Volume(volume) => self.session.set_volume(volume),

            Command::NewPlaylist(name) => match self.library.create_playlist(&name) {
                Some(_) => self.persist(),
                None => println!("Playlist name cannot be blank"),
            },
            Command::RenamePlaylist(n, name) => {
                let renamed = self
                    .playlist_id(n)
                    .is_some_and(|id| self.library.rename_playlist(&id, &name));
                if renamed {
                    self.persist();
                }
            }
            Command::DeletePlaylist(n) => {
                if let Some(id) = self.playlist_id(n) {
                    if self.library.delete_playlist(&id) {
                        self.persist();
                    }
                }
            }
            Command::AddToPlaylist { playlist, track } => {
                if let (Some(pl), Some(id)) = (self.playlist_id(playlist), self.visible_id(track)) {
                    if self.library.add_track_to_playlist(&pl, &id) {
                        self.persist();
                    }
                }
            }
            Command::RemoveFromPlaylist { playlist, track } => {
                if let (Some(pl), Some(id)) = (self.playlist_id(playlist), self.visible_id(track)) {
                    if self.library.remove_track_from_playlist(&pl, &id) {
                        self.persist();
                    }
                }
            }

            Command::View(ViewTarget::All) => {
                self.library.set_view_playlist(PlaylistFilter::All);
            }
            Command::View(ViewTarget::Playlist(n)) => match self.playlist_id(n) {
                Some(id) => {
                    self.library.set_view_playlist(PlaylistFilter::Playlist(id));
                }
                None => println!("No playlist #{}", n + 1),
            },
            Command::Search(query) => self.library.set_search(query),
            Command::List => {
                for line in self.render_library() {
                    println!("{line}");
                }
            }
            Command::Status => println!("{}", self.render_status()),
            Command::Help => println!("{HELP}"),
            Command::Quit => self.should_quit = true,
        }
    }

    pub fn add_paths(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        let outcome = self.library.add_tracks_by_path(paths);
        self.after_add(outcome);
    }

    /// Read each file through the bridge and add it as a session-only track.
    pub async fn import_files(&mut self, paths: Vec<PathBuf>) {
        let mut handles = Vec::with_capacity(paths.len());
        for path in paths {
            match self.resolver.bridge().read_file(&path).await {
                Ok(bytes) => {
                    let name = crate::audio::track::title_from_path(&path);
                    let audio = InMemoryAudio::new(&name, bytes);
                    handles.push((name, audio));
                }
                Err(e) => {
                    warn!("Could not import {}: {}", path.display(), e);
                    println!("Could not import {}: {}", path.display(), e);
                }
            }
        }
        if !handles.is_empty() {
            let outcome = self.library.add_tracks_by_handle(handles);
            self.after_add(outcome);
        }
    }

    pub fn delete_track(&mut self, id: &TrackId) {
        let Some(removed) = self.library.delete_track(id) else {
            return;
        };
        if self.session.on_track_removed(id) {
            debug!("Deleted the current track, session cleared");
        }
        self.resolver.evict(id);
        self.persist();
        println!("Removed '{}'", removed.track.title);
    }

    fn after_add(&mut self, outcome: AddOutcome) {
        if outcome.added.is_empty() {
            return;
        }
        self.persist();
        println!("Added {} track(s)", outcome.added.len());

        if let Some(first) = outcome.first_track {
            if self.session.current_track().is_none() {
                if let Some(index) = self.library.index_of(&first) {
                    let ticket = self.session.begin_select(&self.library, index, false);
                    self.start_load(ticket);
                }
            }
        }
    }

    fn after_play(&mut self, attempt: PlayAttempt) {
        match attempt {
            PlayAttempt::Started => {}
            PlayAttempt::Waiting { wait } => self.schedule_ready_timeout(wait),
            PlayAttempt::Blocked => println!("Playback was blocked, press toggle to start"),
            PlayAttempt::Failed => println!(
                "Playback failed: {}",
                self.session.last_error().unwrap_or("unknown error")
            ),
        }
    }

    fn start_load(&self, ticket: Option<LoadTicket>) {
        let Some(ticket) = ticket else {
            return;
        };
        let resolver = Arc::clone(&self.resolver);
        let sender = self.event_handler.sender();
        tokio::spawn(async move {
            let result = resolver.resolve(&ticket.track).await;
            let _ = sender.send(AppEvent::SourceResolved { ticket, result });
        });
    }

    fn schedule_ready_timeout(&self, wait: u64) {
        let timeout = self.playback.ready_timeout();
        let sender = self.event_handler.sender();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = sender.send(AppEvent::ReadyTimeout { wait });
        });
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save(&LibrarySnapshot::capture(&self.library)) {
            warn!("Could not save library to {}: {}", self.storage.path().display(), e);
        }
    }

    fn visible_id(&self, n: usize) -> Option<TrackId> {
        self.library.visible().get(n).map(|track| track.id.clone())
    }

    fn playlist_id(&self, n: usize) -> Option<PlaylistId> {
        self.library.playlists().get(n).map(|playlist| playlist.id.clone())
    }

    pub fn render_status(&self) -> String {
        let symbol = match self.session.status() {
            TransportStatus::Idle => "■",
            TransportStatus::Loading => "…",
            TransportStatus::Playing => "▶",
            TransportStatus::Paused => "⏸",
            TransportStatus::Error => "✗",
        };
        let title = self
            .session
            .current_track()
            .and_then(|id| self.library.track(id))
            .map(|track| track.title.as_str())
            .unwrap_or("No track selected");
        let total = self
            .session
            .duration()
            .map(format_time)
            .unwrap_or_else(|| "--:--".to_string());

        let mut line = format!(
            "{} {} / {}  {}  [vol {:.0}%]",
            symbol,
            format_time(self.session.elapsed()),
            total,
            title,
            self.session.volume() * 100.0
        );
        if let Some(error) = self.session.last_error() {
            line.push_str(&format!("  ({error})"));
        }
        line
    }

    pub fn render_library(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let view = self.library.view();

        let heading = match &view.playlist {
            PlaylistFilter::All => "All tracks".to_string(),
            PlaylistFilter::Playlist(id) => self
                .library
                .playlist(id)
                .map(|p| format!("Playlist: {}", p.name))
                .unwrap_or_else(|| "All tracks".to_string()),
        };
        if view.search.is_empty() {
            lines.push(heading);
        } else {
            lines.push(format!("{} matching \"{}\"", heading, view.search));
        }

        let current = self.session.current_track();
        for (i, track) in self.library.visible().iter().enumerate() {
            let marker = if Some(&track.id) == current { '>' } else { ' ' };
            let saved = if track.is_persistent() { "" } else { "  (session only)" };
            lines.push(format!("{} {:>3}. {}{}", marker, i + 1, track.title, saved));
        }

        if !self.library.playlists().is_empty() {
            lines.push("Playlists:".to_string());
            for (i, playlist) in self.library.playlists().iter().enumerate() {
                lines.push(format!(
                    "  {:>3}. {} ({} track(s))",
                    i + 1,
                    playlist.name,
                    playlist.track_ids.len()
                ));
            }
        }
        lines
    }
}

fn format_time(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
