// Playback session - owns the media element and the transport state machine
//
// Transitions come from two directions: commands (select, toggle, next...)
// and element events (can-play, playing, paused, ended, error). Loading is
// split in two halves around the asynchronous resolve: `begin_select` hands
// out a ticket stamped with a generation, `finish_select` only binds if that
// generation is still current.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::audio::{LibraryStore, Track, TrackId};
use crate::error::{LoadError, MediaError};
use crate::media::{MediaElement, MediaEvent, MediaEventKind, MediaSource, ObjectUrl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

/// A pending load. Only the ticket from the latest selection can bind.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub generation: u64,
    pub track: Track,
    pub autoplay: bool,
}

/// What happened when the session asked the element to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayAttempt {
    /// The element accepted; status follows once it reports `Playing`.
    Started,
    /// Not ready yet. The caller should deliver `on_ready_timeout(wait)`
    /// once the readiness timeout elapses.
    Waiting { wait: u64 },
    /// Refused by policy. The session stays paused.
    Blocked,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A newer selection superseded this load; nothing was bound.
    Stale,
    Failed,
    Bound { play: Option<PlayAttempt> },
}

#[derive(Debug)]
pub enum Toggle {
    NoTrack,
    Paused,
    /// Still loading; records whether playback should start once bound.
    Queued { play_on_load: bool },
    Play(PlayAttempt),
    /// Nothing bound for the current track (its load failed); load it again.
    Reload(LoadTicket),
}

/// Follow-up the owner of the session has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCue {
    AdvanceNext,
}

pub struct PlaybackSession<E> {
    element: E,
    current: Option<TrackId>,
    status: TransportStatus,
    elapsed: Duration,
    duration: Option<Duration>,
    volume: f32,
    last_error: Option<String>,
    generation: u64,
    bound: Option<ObjectUrl>,
    play_on_load: bool,
    awaiting_ready: Option<u64>,
    wait_seq: u64,
}

impl<E: MediaElement> PlaybackSession<E> {
    pub fn new(mut element: E, volume: f32) -> Self {
        let volume = clamp_volume(volume).unwrap_or(1.0);
        element.set_volume(volume);
        Self {
            element,
            current: None,
            status: TransportStatus::Idle,
            elapsed: Duration::ZERO,
            duration: None,
            volume,
            last_error: None,
            generation: 0,
            bound: None,
            play_on_load: false,
            awaiting_ready: None,
            wait_seq: 0,
        }
    }

    pub fn status(&self) -> TransportStatus {
        self.status
    }

    pub fn current_track(&self) -> Option<&TrackId> {
        self.current.as_ref()
    }

    /// Position of the current track in library order.
    pub fn current_index(&self, library: &LibraryStore) -> Option<usize> {
        self.current.as_ref().and_then(|id| library.index_of(id))
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn bound_source(&self) -> Option<&ObjectUrl> {
        self.bound.as_ref()
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    /// Forward a loop tick to the element.
    pub fn poll(&mut self) {
        self.element.poll();
    }

    /// Make the track at `index` current and hand out a ticket for loading
    /// its source. Out of range indices are ignored.
    pub fn begin_select(
        &mut self,
        library: &LibraryStore,
        index: usize,
        autoplay: bool,
    ) -> Option<LoadTicket> {
        let track = library.track_at(index)?.clone();

        self.unbind();
        self.generation += 1;
        self.current = Some(track.id.clone());
        self.status = TransportStatus::Loading;
        self.last_error = None;
        self.play_on_load = autoplay;

        debug!(
            "Selecting #{} '{}' (generation {}, autoplay {})",
            index, track.title, self.generation, autoplay
        );
        Some(LoadTicket {
            generation: self.generation,
            track,
            autoplay,
        })
    }

    /// Bind the result of a load, unless a newer selection came in meanwhile.
    pub fn finish_select(
        &mut self,
        ticket: LoadTicket,
        result: Result<MediaSource, LoadError>,
    ) -> SelectOutcome {
        if ticket.generation != self.generation {
            debug!(
                "Dropping stale load for '{}' (generation {} < {})",
                ticket.track.title, ticket.generation, self.generation
            );
            return SelectOutcome::Stale;
        }

        let source = match result {
            Ok(source) => source,
            Err(e) => {
                warn!("Could not load '{}': {}", ticket.track.title, e);
                self.fail(e.to_string());
                return SelectOutcome::Failed;
            }
        };

        if let Err(e) = self.element.set_source(Some(&source)) {
            warn!("Element rejected '{}': {}", ticket.track.title, e);
            self.fail(e.to_string());
            return SelectOutcome::Failed;
        }

        self.bound = Some(source.url().clone());
        self.elapsed = Duration::ZERO;
        self.status = TransportStatus::Paused;
        info!("Loaded '{}'", ticket.track.title);

        let play = if self.play_on_load {
            self.play_on_load = false;
            Some(self.request_play())
        } else {
            None
        };
        SelectOutcome::Bound { play }
    }

    pub fn play_pause(&mut self, library: &LibraryStore) -> Toggle {
        let Some(current) = self.current.clone() else {
            return Toggle::NoTrack;
        };

        if self.status == TransportStatus::Playing {
            self.awaiting_ready = None;
            self.element.pause();
            return Toggle::Paused;
        }

        if self.bound.is_some() {
            return Toggle::Play(self.request_play());
        }

        if self.status == TransportStatus::Loading {
            self.play_on_load = !self.play_on_load;
            return Toggle::Queued {
                play_on_load: self.play_on_load,
            };
        }

        match library.index_of(&current) {
            Some(index) => match self.begin_select(library, index, true) {
                Some(ticket) => Toggle::Reload(ticket),
                None => Toggle::NoTrack,
            },
            None => Toggle::NoTrack,
        }
    }

    /// Select the following track, wrapping after the last.
    pub fn next(&mut self, library: &LibraryStore) -> Option<LoadTicket> {
        let count = library.len();
        if count == 0 {
            return None;
        }
        let index = match self.current_index(library) {
            Some(current) => (current + 1) % count,
            None => 0,
        };
        self.begin_select(library, index, true)
    }

    /// Select the preceding track, wrapping before the first.
    pub fn previous(&mut self, library: &LibraryStore) -> Option<LoadTicket> {
        let count = library.len();
        if count == 0 {
            return None;
        }
        let index = match self.current_index(library) {
            Some(current) => (current + count - 1) % count,
            None => count - 1,
        };
        self.begin_select(library, index, true)
    }

    pub fn seek(&mut self, position: Duration) {
        if self.bound.is_some() {
            self.element.seek(position);
        }
    }

    /// Clamped to [0, 1]. NaN leaves the volume unchanged.
    pub fn set_volume(&mut self, volume: f32) {
        let Some(volume) = clamp_volume(volume) else {
            warn!("Ignoring volume {}", volume);
            return;
        };
        self.volume = volume;
        self.element.set_volume(self.volume);
    }

    /// React to a track leaving the library. Returns whether it was current.
    pub fn on_track_removed(&mut self, id: &TrackId) -> bool {
        if self.current.as_ref() != Some(id) {
            return false;
        }
        self.clear();
        true
    }

    /// Stop, unbind and forget the current track. Any load in flight is
    /// invalidated.
    pub fn clear(&mut self) {
        self.unbind();
        self.generation += 1;
        self.current = None;
        self.status = TransportStatus::Idle;
        self.last_error = None;
        self.play_on_load = false;
        debug!("Session cleared (generation {})", self.generation);
    }

    /// The readiness wait `wait` ran out. Returns whether it was still armed.
    pub fn on_ready_timeout(&mut self, wait: u64) -> bool {
        if self.awaiting_ready != Some(wait) {
            return false;
        }
        self.awaiting_ready = None;
        debug!("Gave up waiting for the element to become ready");
        true
    }

    pub fn on_media_event(&mut self, event: MediaEvent) -> Option<SessionCue> {
        if self.bound.as_ref() != Some(&event.source) {
            debug!("Ignoring {:?} from unbound source {}", event.kind, event.source);
            return None;
        }

        match event.kind {
            MediaEventKind::CanPlay => {
                if self.awaiting_ready.take().is_some() {
                    self.start_element();
                }
            }
            MediaEventKind::Playing => {
                self.status = TransportStatus::Playing;
                self.last_error = None;
            }
            MediaEventKind::Paused => {
                if self.status == TransportStatus::Playing {
                    self.status = TransportStatus::Paused;
                }
            }
            MediaEventKind::TimeUpdate(position) => self.elapsed = position,
            MediaEventKind::DurationChange(duration) => self.duration = Some(duration),
            MediaEventKind::Ended => {
                self.status = TransportStatus::Paused;
                return Some(SessionCue::AdvanceNext);
            }
            MediaEventKind::Error(message) => {
                warn!("Playback error: {}", message);
                self.awaiting_ready = None;
                self.fail(message);
            }
        }
        None
    }

    fn request_play(&mut self) -> PlayAttempt {
        if self.element.ready_state().can_play() {
            self.awaiting_ready = None;
            return self.start_element();
        }
        self.wait_seq += 1;
        self.awaiting_ready = Some(self.wait_seq);
        debug!("Waiting for readiness (wait {})", self.wait_seq);
        PlayAttempt::Waiting {
            wait: self.wait_seq,
        }
    }

    fn start_element(&mut self) -> PlayAttempt {
        match self.element.play() {
            Ok(()) => PlayAttempt::Started,
            Err(MediaError::NotAllowed(reason)) => {
                debug!("Play refused, staying paused: {}", reason);
                if self.status != TransportStatus::Error {
                    self.status = TransportStatus::Paused;
                }
                PlayAttempt::Blocked
            }
            Err(e) => {
                self.fail(e.to_string());
                PlayAttempt::Failed
            }
        }
    }

    fn unbind(&mut self) {
        if self.status == TransportStatus::Playing {
            self.element.pause();
        }
        if self.bound.take().is_some() {
            // the handle stays cached in the resolver for instant replay
            if let Err(e) = self.element.set_source(None) {
                warn!("Element failed to detach: {}", e);
            }
        }
        self.awaiting_ready = None;
        self.elapsed = Duration::ZERO;
        self.duration = None;
    }

    fn fail(&mut self, message: String) {
        self.status = TransportStatus::Error;
        self.last_error = Some(message);
    }
}

fn clamp_volume(volume: f32) -> Option<f32> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{HeadlessElement, HeadlessHandle, ReadyState};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Rig {
        library: LibraryStore,
        session: PlaybackSession<HeadlessElement>,
        element: HeadlessHandle,
        events: mpsc::UnboundedReceiver<MediaEvent>,
    }

    impl Rig {
        fn with_tracks(count: usize) -> Self {
            let (tx, events) = mpsc::unbounded_channel();
            let element = HeadlessElement::new(tx);
            let handle = element.handle();
            let mut library = LibraryStore::new();
            library.add_tracks_by_path((0..count).map(|i| PathBuf::from(format!("/m/{i}.mp3"))));
            Self {
                library,
                session: PlaybackSession::new(element, 1.0),
                element: handle,
                events,
            }
        }

        fn source() -> MediaSource {
            MediaSource::new("audio/mpeg", Arc::from(vec![0u8; 16]))
        }

        /// Deliver queued element events, collecting cues.
        fn pump(&mut self) -> Vec<SessionCue> {
            let mut cues = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                cues.extend(self.session.on_media_event(event));
            }
            cues
        }

        fn load(&mut self, index: usize, autoplay: bool) -> SelectOutcome {
            let ticket = self
                .session
                .begin_select(&self.library, index, autoplay)
                .expect("in range");
            let outcome = self.session.finish_select(ticket, Ok(Self::source()));
            self.pump();
            outcome
        }

        fn finish(&mut self, ticket: Option<LoadTicket>) -> SelectOutcome {
            let outcome = self
                .session
                .finish_select(ticket.expect("ticket"), Ok(Self::source()));
            self.pump();
            outcome
        }
    }

    #[test]
    fn out_of_range_select_is_noop() {
        let mut rig = Rig::with_tracks(2);
        assert!(rig.session.begin_select(&rig.library, 2, true).is_none());
        assert_eq!(rig.session.status(), TransportStatus::Idle);
        assert_eq!(rig.session.generation(), 0);
    }

    #[test]
    fn cold_load_binds_without_playing() {
        let mut rig = Rig::with_tracks(2);
        assert_eq!(rig.load(0, false), SelectOutcome::Bound { play: None });
        assert_eq!(rig.session.status(), TransportStatus::Paused);
        assert!(rig.element.bound_source().is_some());
        assert!(!rig.element.is_playing());
    }

    #[test]
    fn autoplay_starts_when_ready_and_status_follows_element() {
        let mut rig = Rig::with_tracks(2);
        let ticket = rig.session.begin_select(&rig.library, 1, true).unwrap();
        let outcome = rig.session.finish_select(ticket, Ok(Rig::source()));
        assert_eq!(outcome, SelectOutcome::Bound { play: Some(PlayAttempt::Started) });
        // not assumed before the element says so
        assert_eq!(rig.session.status(), TransportStatus::Paused);
        rig.pump();
        assert_eq!(rig.session.status(), TransportStatus::Playing);
        assert_eq!(rig.session.current_index(&rig.library), Some(1));
    }

    #[test]
    fn stale_resolution_never_binds() {
        let mut rig = Rig::with_tracks(3);
        let pending = rig.session.begin_select(&rig.library, 1, true).unwrap();
        let latest = rig.session.begin_select(&rig.library, 2, true).unwrap();

        let stale_source = Rig::source();
        assert_eq!(
            rig.session.finish_select(pending, Ok(stale_source.clone())),
            SelectOutcome::Stale
        );
        assert!(rig.element.bound_source().is_none());
        assert_eq!(rig.session.status(), TransportStatus::Loading);

        rig.finish(Some(latest));
        assert_ne!(rig.element.bound_source().as_ref(), Some(stale_source.url()));
        assert_eq!(rig.session.current_index(&rig.library), Some(2));
        assert_eq!(rig.session.status(), TransportStatus::Playing);
    }

    #[test]
    fn deleting_current_track_goes_idle() {
        let mut rig = Rig::with_tracks(3);
        rig.load(1, true);
        assert_eq!(rig.session.status(), TransportStatus::Playing);

        let b = rig.library.tracks()[1].id.clone();
        rig.library.delete_track(&b);
        assert!(rig.session.on_track_removed(&b));

        assert_eq!(rig.library.len(), 2);
        assert_eq!(rig.session.current_index(&rig.library), None);
        assert_eq!(rig.session.status(), TransportStatus::Idle);
        assert!(rig.element.bound_source().is_none());
        assert!(!rig.element.is_playing());
    }

    #[test]
    fn deleting_other_track_keeps_current_by_identity() {
        let mut rig = Rig::with_tracks(3);
        rig.load(2, false);
        let a = rig.library.tracks()[0].id.clone();
        rig.library.delete_track(&a);
        assert!(!rig.session.on_track_removed(&a));
        assert_eq!(rig.session.current_index(&rig.library), Some(1));
    }

    #[test]
    fn clearing_invalidates_load_in_flight() {
        let mut rig = Rig::with_tracks(2);
        let ticket = rig.session.begin_select(&rig.library, 0, true).unwrap();
        let id = ticket.track.id.clone();
        rig.session.on_track_removed(&id);
        assert_eq!(rig.session.finish_select(ticket, Ok(Rig::source())), SelectOutcome::Stale);
        assert!(rig.element.bound_source().is_none());
    }

    #[test]
    fn next_cycles_back_to_start() {
        for count in 1..6 {
            for start in 0..count {
                let mut rig = Rig::with_tracks(count);
                rig.load(start, false);
                for _ in 0..count {
                    let ticket = rig.session.next(&rig.library);
                    rig.finish(ticket);
                }
                assert_eq!(rig.session.current_index(&rig.library), Some(start));
            }
        }
    }

    #[test]
    fn previous_wraps_and_starts_from_last() {
        let mut rig = Rig::with_tracks(3);
        let ticket = rig.session.previous(&rig.library);
        rig.finish(ticket);
        assert_eq!(rig.session.current_index(&rig.library), Some(2));

        rig.load(0, false);
        let ticket = rig.session.previous(&rig.library);
        rig.finish(ticket);
        assert_eq!(rig.session.current_index(&rig.library), Some(2));
    }

    #[test]
    fn navigation_on_empty_library_is_noop() {
        let mut rig = Rig::with_tracks(0);
        assert!(rig.session.next(&rig.library).is_none());
        assert!(rig.session.previous(&rig.library).is_none());
        assert!(matches!(rig.session.play_pause(&rig.library), Toggle::NoTrack));
    }

    #[test]
    fn end_of_track_cues_advance() {
        let mut rig = Rig::with_tracks(2);
        rig.load(1, true);
        rig.element.finish();
        assert_eq!(rig.pump(), vec![SessionCue::AdvanceNext]);

        let ticket = rig.session.next(&rig.library);
        rig.finish(ticket);
        assert_eq!(rig.session.current_index(&rig.library), Some(0));
        assert_eq!(rig.session.status(), TransportStatus::Playing);
    }

    #[test]
    fn late_events_from_previous_source_are_ignored() {
        let mut rig = Rig::with_tracks(2);
        rig.load(0, true);
        let old = rig.session.bound_source().cloned().unwrap();
        rig.load(1, false);

        let cue = rig.session.on_media_event(MediaEvent {
            source: old,
            kind: MediaEventKind::Ended,
        });
        assert_eq!(cue, None);
        assert_eq!(rig.session.current_index(&rig.library), Some(1));
    }

    #[test]
    fn readiness_wait_plays_on_can_play() {
        let mut rig = Rig::with_tracks(1);
        rig.element.set_ready_on_bind(false);
        let ticket = rig.session.begin_select(&rig.library, 0, true).unwrap();
        let outcome = rig.session.finish_select(ticket, Ok(Rig::source()));
        assert!(matches!(
            outcome,
            SelectOutcome::Bound { play: Some(PlayAttempt::Waiting { .. }) }
        ));
        assert!(!rig.element.is_playing());

        rig.element.make_ready();
        rig.pump();
        assert!(rig.element.is_playing());
        assert_eq!(rig.session.status(), TransportStatus::Playing);
    }

    #[test]
    fn readiness_timeout_abandons_quietly() {
        let mut rig = Rig::with_tracks(1);
        rig.element.set_ready_on_bind(false);
        rig.load(0, false);

        let Toggle::Play(PlayAttempt::Waiting { wait }) = rig.session.play_pause(&rig.library) else {
            panic!("expected a readiness wait");
        };
        assert!(rig.session.on_ready_timeout(wait));
        assert!(!rig.session.on_ready_timeout(wait));

        rig.element.make_ready();
        rig.pump();
        assert!(!rig.element.is_playing());
        assert_eq!(rig.session.status(), TransportStatus::Paused);
        assert_eq!(rig.session.last_error(), None);
    }

    #[test]
    fn blocked_autoplay_degrades_to_paused() {
        let mut rig = Rig::with_tracks(2);
        rig.element.set_block_play(true);
        let outcome = rig.load(0, true);
        assert_eq!(outcome, SelectOutcome::Bound { play: Some(PlayAttempt::Blocked) });
        assert_eq!(rig.session.status(), TransportStatus::Paused);
        assert_eq!(rig.session.last_error(), None);
    }

    #[test]
    fn play_pause_toggles_through_element_signals() {
        let mut rig = Rig::with_tracks(1);
        rig.load(0, false);

        assert!(matches!(rig.session.play_pause(&rig.library), Toggle::Play(PlayAttempt::Started)));
        rig.pump();
        assert_eq!(rig.session.status(), TransportStatus::Playing);

        assert!(matches!(rig.session.play_pause(&rig.library), Toggle::Paused));
        assert_eq!(rig.session.status(), TransportStatus::Playing);
        rig.pump();
        assert_eq!(rig.session.status(), TransportStatus::Paused);
    }

    #[test]
    fn toggle_while_loading_queues_play() {
        let mut rig = Rig::with_tracks(1);
        let ticket = rig.session.begin_select(&rig.library, 0, false).unwrap();
        assert!(matches!(
            rig.session.play_pause(&rig.library),
            Toggle::Queued { play_on_load: true }
        ));
        rig.finish(Some(ticket));
        assert_eq!(rig.session.status(), TransportStatus::Playing);
    }

    #[test]
    fn element_error_surfaces_and_play_pause_retries() {
        let mut rig = Rig::with_tracks(1);
        rig.load(0, true);
        rig.element.fail("decoder exploded");
        rig.pump();
        assert_eq!(rig.session.status(), TransportStatus::Error);
        assert_eq!(rig.session.last_error(), Some("decoder exploded"));

        assert!(matches!(rig.session.play_pause(&rig.library), Toggle::Play(PlayAttempt::Started)));
        rig.pump();
        assert_eq!(rig.session.status(), TransportStatus::Playing);
        assert_eq!(rig.session.last_error(), None);
    }

    #[test]
    fn load_failure_keeps_track_selected_and_reloads_on_toggle() {
        let mut rig = Rig::with_tracks(2);
        let ticket = rig.session.begin_select(&rig.library, 1, true).unwrap();
        let err = LoadError::Io {
            path: PathBuf::from("/m/1.mp3"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(rig.session.finish_select(ticket, Err(err)), SelectOutcome::Failed);
        assert_eq!(rig.session.status(), TransportStatus::Error);
        assert!(rig.session.last_error().unwrap().contains("/m/1.mp3"));
        assert_eq!(rig.session.current_index(&rig.library), Some(1));

        let Toggle::Reload(ticket) = rig.session.play_pause(&rig.library) else {
            panic!("expected a reload");
        };
        assert!(ticket.autoplay);
        rig.finish(Some(ticket));
        assert_eq!(rig.session.status(), TransportStatus::Playing);
    }

    #[test]
    fn volume_is_clamped_and_seek_goes_to_element() {
        let mut rig = Rig::with_tracks(1);
        rig.session.set_volume(1.7);
        assert_eq!(rig.element.volume(), 1.0);
        rig.session.set_volume(-0.2);
        assert_eq!(rig.session.volume(), 0.0);

        rig.load(0, false);
        rig.session.seek(Duration::from_secs(42));
        rig.pump();
        assert_eq!(rig.element.position(), Duration::from_secs(42));
        assert_eq!(rig.session.elapsed(), Duration::from_secs(42));
    }

    #[test]
    fn nan_volume_is_ignored() {
        let mut rig = Rig::with_tracks(1);
        rig.session.set_volume(0.4);
        rig.session.set_volume(f32::NAN);
        assert_eq!(rig.session.volume(), 0.4);
        assert_eq!(rig.element.volume(), 0.4);

        let (tx, _events) = mpsc::unbounded_channel();
        let session = PlaybackSession::new(HeadlessElement::new(tx), f32::NAN);
        assert_eq!(session.volume(), 1.0);
    }

    /// Element that binds fine but refuses to let go of its source.
    struct StickyElement {
        ready: ReadyState,
    }

    impl MediaElement for StickyElement {
        fn set_source(&mut self, source: Option<&MediaSource>) -> Result<(), MediaError> {
            match source {
                Some(_) => {
                    self.ready = ReadyState::HaveEnoughData;
                    Ok(())
                }
                None => Err(MediaError::Output("device busy".into())),
            }
        }

        fn play(&mut self) -> Result<(), MediaError> {
            Ok(())
        }

        fn pause(&mut self) {}

        fn seek(&mut self, _position: Duration) {}

        fn set_volume(&mut self, _volume: f32) {}

        fn ready_state(&self) -> ReadyState {
            self.ready
        }
    }

    #[test]
    fn failed_detach_still_unbinds_session() {
        let mut library = LibraryStore::new();
        library.add_tracks_by_path(vec![PathBuf::from("/m/a.mp3"), PathBuf::from("/m/b.mp3")]);
        let mut session = PlaybackSession::new(
            StickyElement {
                ready: ReadyState::HaveNothing,
            },
            1.0,
        );

        let ticket = session.begin_select(&library, 0, false).unwrap();
        let outcome = session.finish_select(ticket, Ok(Rig::source()));
        assert_eq!(outcome, SelectOutcome::Bound { play: None });

        session.clear();
        assert!(session.bound_source().is_none());
        assert_eq!(session.status(), TransportStatus::Idle);

        let ticket = session.begin_select(&library, 1, false).unwrap();
        let outcome = session.finish_select(ticket, Ok(Rig::source()));
        assert_eq!(outcome, SelectOutcome::Bound { play: None });
        assert_eq!(session.current_index(&library), Some(1));
    }

    #[test]
    fn duration_change_is_recorded() {
        let mut rig = Rig::with_tracks(1);
        rig.load(0, false);
        rig.element.report_duration(Duration::from_secs(180));
        rig.pump();
        assert_eq!(rig.session.duration(), Some(Duration::from_secs(180)));
    }

    mod cycling {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn next_is_cyclic(count in 1usize..10, start in 0usize..10, steps in 0usize..30) {
                let start = start % count;
                let mut rig = Rig::with_tracks(count);
                rig.load(start, false);

                for _ in 0..steps {
                    let ticket = rig.session.next(&rig.library);
                    rig.finish(ticket);
                }
                prop_assert_eq!(rig.session.current_index(&rig.library), Some((start + steps) % count));

                for _ in 0..steps {
                    let ticket = rig.session.previous(&rig.library);
                    rig.finish(ticket);
                }
                prop_assert_eq!(rig.session.current_index(&rig.library), Some(start));
            }
        }
    }
}
