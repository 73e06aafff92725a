// Media source resolver - turns a track into a live, cached source
//
// The resolver is the only owner of live handles: it creates them, caches
// them by track id, and is the only thing allowed to release them.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

use super::{MediaSource, ObjectUrl};
use crate::audio::{Track, TrackId, TrackSource};
use crate::bridge::NativeBridge;
use crate::error::LoadError;

#[derive(Default)]
struct SourceCache {
    by_track: HashMap<TrackId, ObjectUrl>,
    live: HashMap<ObjectUrl, MediaSource>,
    /// Ids of tracks that left the library; identities never come back.
    retired: HashSet<TrackId>,
    fetches: u64,
}

impl SourceCache {
    /// Live cached source for `id`. A cached url that is no longer live is
    /// evicted on the spot and never handed out.
    fn live_for(&mut self, id: &TrackId) -> Option<MediaSource> {
        let url = self.by_track.get(id)?;
        if let Some(source) = self.live.get(url) {
            return Some(source.clone());
        }
        debug!("Evicting released source {} for track {}", url, id);
        self.by_track.remove(id);
        None
    }

    fn release(&mut self, url: &ObjectUrl) -> bool {
        self.live.remove(url).is_some()
    }
}

pub struct SourceResolver<B> {
    bridge: B,
    cache: Mutex<SourceCache>,
}

impl<B: NativeBridge> SourceResolver<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            cache: Mutex::new(SourceCache::default()),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    fn cache(&self) -> MutexGuard<'_, SourceCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live source for `track`, fetching its bytes only on a cache miss.
    ///
    /// Two overlapping resolutions of the same track end up sharing one
    /// cache entry: whichever finishes second adopts the first one's source.
    pub async fn resolve(&self, track: &Track) -> Result<MediaSource, LoadError> {
        if let Some(source) = self.cache().live_for(&track.id) {
            debug!("Source cache hit for {}", track.id);
            return Ok(source);
        }

        let content_type = track.format().content_type();
        let bytes: Arc<[u8]> = match &track.source {
            TrackSource::Memory(audio) => Arc::clone(&audio.bytes),
            TrackSource::Path(path) => {
                let fetched = self.bridge.read_file(path).await.map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                })?;
                self.cache().fetches += 1;
                Arc::from(fetched)
            }
        };

        let mut cache = self.cache();
        if cache.retired.contains(&track.id) {
            return Err(LoadError::TrackRemoved(track.id.clone()));
        }
        if let Some(existing) = cache.live_for(&track.id) {
            debug!("Adopting concurrently resolved source for {}", track.id);
            return Ok(existing);
        }

        let source = MediaSource::new(content_type, bytes);
        debug!(
            "Created source {} for '{}' ({}, {} bytes)",
            source.url(),
            track.title,
            content_type,
            source.bytes().len()
        );
        cache.live.insert(source.url().clone(), source.clone());
        cache.by_track.insert(track.id.clone(), source.url().clone());
        Ok(source)
    }

    /// Cached source for `id` if it is still live.
    pub fn cached(&self, id: &TrackId) -> Option<MediaSource> {
        self.cache().live_for(id)
    }

    pub fn is_live(&self, url: &ObjectUrl) -> bool {
        self.cache().live.contains_key(url)
    }

    /// Release a handle without forgetting which track it belonged to.
    /// The next `resolve` for that track notices and rebuilds it.
    pub fn release(&self, url: &ObjectUrl) -> bool {
        self.cache().release(url)
    }

    /// Release and evict whatever is cached for a track that left the
    /// library. Later resolutions of that id fail.
    pub fn evict(&self, id: &TrackId) -> bool {
        let mut cache = self.cache();
        cache.retired.insert(id.clone());
        let Some(url) = cache.by_track.remove(id) else {
            return false;
        };
        let released = cache.release(&url);
        debug!("Evicted source {} for removed track {}", url, id);
        released
    }

    /// Release every live handle and forget removed tracks, e.g. on shutdown.
    pub fn release_all(&self) -> usize {
        let mut cache = self.cache();
        let count = cache.live.len();
        cache.live.clear();
        cache.by_track.clear();
        cache.retired.clear();
        if count > 0 {
            info!("Released {} live source(s)", count);
        }
        count
    }

    pub fn live_count(&self) -> usize {
        self.cache().live.len()
    }

    /// Number of byte retrievals made through the bridge so far.
    pub fn fetch_count(&self) -> u64 {
        self.cache().fetches
    }
}
