use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

use super::{MediaEvent, MediaEventKind, MediaSource, ObjectUrl, ReadyState};
use crate::error::MediaError;

pub type MediaEventSender = mpsc::UnboundedSender<MediaEvent>;

/// The single playback surface the session drives.
///
/// State changes are reported back through [`MediaEvent`]s rather than
/// return values, so callers never assume a play or pause took effect.
pub trait MediaElement {
    /// Bind a new source, or detach with `None`.
    fn set_source(&mut self, source: Option<&MediaSource>) -> Result<(), MediaError>;

    fn play(&mut self) -> Result<(), MediaError>;

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    fn set_volume(&mut self, volume: f32);

    fn ready_state(&self) -> ReadyState;

    /// Called on every loop tick; elements report progress and natural end here.
    fn poll(&mut self) {}
}

impl<T: MediaElement + ?Sized> MediaElement for Box<T> {
    fn set_source(&mut self, source: Option<&MediaSource>) -> Result<(), MediaError> {
        (**self).set_source(source)
    }

    fn play(&mut self) -> Result<(), MediaError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn seek(&mut self, position: Duration) {
        (**self).seek(position)
    }

    fn set_volume(&mut self, volume: f32) {
        (**self).set_volume(volume)
    }

    fn ready_state(&self) -> ReadyState {
        (**self).ready_state()
    }

    fn poll(&mut self) {
        (**self).poll()
    }
}

#[derive(Debug)]
struct HeadlessInner {
    events: MediaEventSender,
    source: Option<ObjectUrl>,
    ready: ReadyState,
    playing: bool,
    volume: f32,
    position: Duration,
    binds: usize,
    ready_on_bind: bool,
    block_play: bool,
}

impl HeadlessInner {
    fn emit(&self, kind: MediaEventKind) {
        if let Some(source) = &self.source {
            let _ = self.events.send(MediaEvent {
                source: source.clone(),
                kind,
            });
        }
    }
}

/// Element without an output device. Becomes ready as soon as a source is
/// bound and reports play/pause/seek like a real element would.
pub struct HeadlessElement {
    inner: Arc<Mutex<HeadlessInner>>,
}

impl HeadlessElement {
    pub fn new(events: MediaEventSender) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HeadlessInner {
                events,
                source: None,
                ready: ReadyState::HaveNothing,
                playing: false,
                volume: 1.0,
                position: Duration::ZERO,
                binds: 0,
                ready_on_bind: true,
                block_play: false,
            })),
        }
    }

    /// A second handle onto the same element, for driving it from outside.
    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaElement for HeadlessElement {
    fn set_source(&mut self, source: Option<&MediaSource>) -> Result<(), MediaError> {
        let mut inner = self.lock();
        inner.playing = false;
        inner.position = Duration::ZERO;
        inner.source = source.map(|s| s.url().clone());
        match source {
            Some(_) => {
                inner.binds += 1;
                if inner.ready_on_bind {
                    inner.ready = ReadyState::HaveEnoughData;
                    inner.emit(MediaEventKind::CanPlay);
                } else {
                    inner.ready = ReadyState::HaveMetadata;
                }
            }
            None => inner.ready = ReadyState::HaveNothing,
        }
        Ok(())
    }

    fn play(&mut self) -> Result<(), MediaError> {
        let mut inner = self.lock();
        if inner.source.is_none() {
            return Err(MediaError::NoSource);
        }
        if inner.block_play {
            return Err(MediaError::NotAllowed("blocked by policy".into()));
        }
        if !inner.playing {
            inner.playing = true;
            inner.emit(MediaEventKind::Playing);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut inner = self.lock();
        if inner.playing {
            inner.playing = false;
            inner.emit(MediaEventKind::Paused);
        }
    }

    fn seek(&mut self, position: Duration) {
        let mut inner = self.lock();
        if inner.source.is_some() {
            inner.position = position;
            inner.emit(MediaEventKind::TimeUpdate(position));
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.lock().volume = volume;
    }

    fn ready_state(&self) -> ReadyState {
        self.lock().ready
    }
}

/// Remote control for a [`HeadlessElement`] that has been moved elsewhere.
#[derive(Clone)]
pub struct HeadlessHandle {
    inner: Arc<Mutex<HeadlessInner>>,
}

impl HeadlessHandle {
    fn lock(&self) -> MutexGuard<'_, HeadlessInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bound_source(&self) -> Option<ObjectUrl> {
        self.lock().source.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    pub fn volume(&self) -> f32 {
        self.lock().volume
    }

    pub fn position(&self) -> Duration {
        self.lock().position
    }

    /// How many times a source has been bound.
    pub fn bind_count(&self) -> usize {
        self.lock().binds
    }

    /// When false, newly bound sources stay below `HaveFutureData` until
    /// [`make_ready`](Self::make_ready).
    pub fn set_ready_on_bind(&self, ready: bool) {
        self.lock().ready_on_bind = ready;
    }

    /// Refuse `play()` the way an auto-play policy would.
    pub fn set_block_play(&self, block: bool) {
        self.lock().block_play = block;
    }

    pub fn make_ready(&self) {
        let mut inner = self.lock();
        if inner.source.is_some() {
            inner.ready = ReadyState::HaveEnoughData;
            inner.emit(MediaEventKind::CanPlay);
        }
    }

    pub fn report_duration(&self, duration: Duration) {
        self.lock().emit(MediaEventKind::DurationChange(duration));
    }

    /// Play through to the end of the bound source.
    pub fn finish(&self) {
        let mut inner = self.lock();
        inner.playing = false;
        inner.emit(MediaEventKind::Ended);
    }

    pub fn fail(&self, message: &str) {
        let mut inner = self.lock();
        inner.playing = false;
        inner.emit(MediaEventKind::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> MediaSource {
        MediaSource::new("audio/mpeg", Arc::from(vec![0u8; 4]))
    }

    #[test]
    fn binding_reports_can_play_and_play_reports_playing() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut element = HeadlessElement::new(tx);
        let src = source();

        element.set_source(Some(&src)).unwrap();
        assert!(element.ready_state().can_play());
        element.play().unwrap();
        element.pause();

        let kinds: Vec<MediaEventKind> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|event| {
                assert_eq!(&event.source, src.url());
                event.kind
            })
            .collect();
        assert_eq!(
            kinds,
            vec![MediaEventKind::CanPlay, MediaEventKind::Playing, MediaEventKind::Paused]
        );
    }

    #[test]
    fn play_without_source_fails() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut element = HeadlessElement::new(tx);
        assert!(matches!(element.play(), Err(MediaError::NoSource)));
    }

    #[test]
    fn blocked_play_is_not_allowed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut element = HeadlessElement::new(tx);
        element.handle().set_block_play(true);
        element.set_source(Some(&source())).unwrap();
        assert!(matches!(element.play(), Err(MediaError::NotAllowed(_))));
        assert!(!element.handle().is_playing());
    }
}
