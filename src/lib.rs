// tunedeck - core of a small desktop audio player
// Library, source resolution and playback are separate layers so the
// console front end and the tests drive the same code

pub mod audio; // tracks, playlists, library store, directory scanning
pub mod bridge; // file dialog and file reads from the host
pub mod config; // settings and preferences
pub mod error;
pub mod media; // playable sources and the element that plays them
pub mod playback; // transport state machine
pub mod storage; // library snapshot on disk
pub mod ui; // console event loop

pub use audio::{LibraryStore, Playlist, PlaylistId, Track, TrackId};
pub use bridge::{FsBridge, NativeBridge};
pub use config::Config;
pub use error::{LoadError, MediaError, StorageError};
pub use media::{MediaElement, MediaSource, SourceResolver};
pub use playback::{PlaybackSession, TransportStatus};
pub use storage::{LibrarySnapshot, SnapshotStore};
