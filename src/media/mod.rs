// Media layer - playable sources, the element that plays them, and the
// resolver that turns library tracks into sources

pub mod element;
pub mod resolver;
#[cfg(feature = "audio")]
pub mod rodio_element;

pub use element::{HeadlessElement, HeadlessHandle, MediaElement, MediaEventSender};
pub use resolver::SourceResolver;
#[cfg(feature = "audio")]
pub use rodio_element::RodioElement;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Handle a media element binds to, in the spirit of a `blob:` object URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    fn fresh() -> Self {
        Self(format!("blob:tunedeck/{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded-ready bytes plus their content type. Cloning is cheap.
#[derive(Clone)]
pub struct MediaSource {
    url: ObjectUrl,
    content_type: &'static str,
    bytes: Arc<[u8]>,
}

impl MediaSource {
    pub(crate) fn new(content_type: &'static str, bytes: Arc<[u8]>) -> Self {
        Self {
            url: ObjectUrl::fresh(),
            content_type,
            bytes,
        }
    }

    pub fn url(&self) -> &ObjectUrl {
        &self.url
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    pub fn bytes(&self) -> &Arc<[u8]> {
        &self.bytes
    }
}

impl fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaSource")
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// How much of the bound source the element can play, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ReadyState {
    #[default]
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Enough buffered to start playing without stalling right away.
    pub fn can_play(self) -> bool {
        self >= ReadyState::HaveFutureData
    }
}

/// Signals an element raises about the source it has bound.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    CanPlay,
    Playing,
    Paused,
    TimeUpdate(Duration),
    DurationChange(Duration),
    Ended,
    Error(String),
}

/// Every event names the source it is about, so late events from a
/// previous binding can be told apart.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub source: ObjectUrl,
    pub kind: MediaEventKind,
}
