use super::cache::{TileCache, TileKey};
use crate::{constants::USER_AGENT, prelude::HashMap, MapError, Result};
use lru::LruCache;
use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

/// Shared blocking client; tile servers such as OpenStreetMap reject
/// requests without a User-Agent.
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default tile client: {e}");
            Client::new()
        })
});

/// Failed tiles remembered before the oldest may be requested again
const FAILED_MEMORY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Download limits for the tile loader
#[derive(Debug, Clone)]
pub struct TileLoaderConfig {
    /// Maximum concurrent tile downloads
    pub max_concurrent: usize,
    /// Attempts per tile before it is marked failed
    pub max_attempts: usize,
    /// Delay between attempts
    pub retry_delay: Duration,
}

impl Default for TileLoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            max_attempts: 2,
            retry_delay: Duration::from_millis(100),
        }
    }
}

/// Where a requested tile stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Waiting for a download slot
    Queued,
    Loading,
    Ready,
    Failed,
}

type Completion = (TileKey, std::result::Result<Vec<u8>, String>);

/// Downloads tiles on background threads, at most `max_concurrent` at a
/// time, and reports completions over an `mpsc` channel drained by
/// [`TileLoader::poll`] on the owning thread. Requests past the limit wait
/// in a FIFO queue.
pub struct TileLoader {
    config: TileLoaderConfig,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    cache: TileCache,
    queue: VecDeque<(TileKey, String)>,
    states: HashMap<TileKey, TileState>,
    failed: LruCache<TileKey, ()>,
    in_flight: usize,
}

impl TileLoader {
    pub fn new(cache: TileCache) -> Self {
        Self::with_config(cache, TileLoaderConfig::default())
    }

    /// A zero `max_concurrent` still allows one download at a time
    pub fn with_config(cache: TileCache, mut config: TileLoaderConfig) -> Self {
        config.max_concurrent = config.max_concurrent.max(1);
        config.max_attempts = config.max_attempts.max(1);
        let (tx, rx) = mpsc::channel();
        Self {
            config,
            tx,
            rx,
            cache,
            queue: VecDeque::new(),
            states: HashMap::default(),
            failed: LruCache::new(FAILED_MEMORY),
            in_flight: 0,
        }
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn config(&self) -> &TileLoaderConfig {
        &self.config
    }

    pub fn state(&self, key: &TileKey) -> Option<TileState> {
        if self.cache.contains(key) {
            return Some(TileState::Ready);
        }
        if self.failed.contains(key) {
            return Some(TileState::Failed);
        }
        self.states.get(key).copied()
    }

    /// Queues a download unless the tile is cached, already requested or
    /// has recently failed. Returns whether the tile was queued.
    pub fn request(&mut self, key: TileKey, url: String) -> bool {
        if self.cache.contains(&key) || self.states.contains_key(&key) || self.failed.contains(&key)
        {
            return false;
        }
        self.states.insert(key.clone(), TileState::Queued);
        self.queue.push_back((key, url));
        self.dispatch();
        true
    }

    /// Drops queued requests that `keep` rejects, e.g. tiles that scrolled
    /// out of view before a download slot freed up
    pub fn retain_queued(&mut self, mut keep: impl FnMut(&TileKey) -> bool) {
        let states = &mut self.states;
        self.queue.retain(|(key, _)| {
            let kept = keep(key);
            if !kept {
                states.remove(key);
            }
            kept
        });
    }

    fn dispatch(&mut self) {
        while self.in_flight < self.config.max_concurrent {
            let Some((key, url)) = self.queue.pop_front() else {
                break;
            };
            self.states.insert(key.clone(), TileState::Loading);
            self.in_flight += 1;
            self.spawn_download(key, url);
        }
    }

    fn spawn_download(&self, key: TileKey, url: String) {
        let tx = self.tx.clone();
        let attempts = self.config.max_attempts;
        let retry_delay = self.config.retry_delay;
        thread::spawn(move || {
            let mut last_error = String::new();
            for attempt in 1..=attempts {
                log::debug!("fetch tile {:?} attempt {}", key.coord, attempt);
                match fetch_tile(&url) {
                    Ok(data) => {
                        let _ = tx.send((key, Ok(data)));
                        return;
                    }
                    Err(e) => {
                        log::warn!("tile {url} failed on attempt {attempt}: {e}");
                        last_error = e.to_string();
                        if attempt < attempts {
                            thread::sleep(retry_delay);
                        }
                    }
                }
            }
            let _ = tx.send((key, Err(last_error)));
        });
    }

    /// Moves finished downloads into the cache and starts queued ones in
    /// the freed slots; returns the keys that became ready since the last
    /// call
    pub fn poll(&mut self) -> Vec<TileKey> {
        let mut ready = Vec::new();
        while let Ok((key, outcome)) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.states.remove(&key);
            match outcome {
                Ok(data) => {
                    log::debug!("tile {:?} ready ({} bytes)", key.coord, data.len());
                    self.cache.insert(key.clone(), data);
                    ready.push(key);
                }
                Err(reason) => {
                    log::error!("giving up on tile {:?}: {reason}", key.coord);
                    self.failed.put(key, ());
                }
            }
        }
        self.dispatch();
        ready
    }

    /// Downloads queued or in flight
    pub fn pending(&self) -> usize {
        self.queue.len() + self.in_flight
    }

    /// Downloads currently running
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Forgets failures so the tiles are requested again
    pub fn reset_failures(&mut self) {
        self.failed.clear();
    }
}

impl Default for TileLoader {
    fn default() -> Self {
        Self::new(TileCache::default())
    }
}

fn fetch_tile(url: &str) -> Result<Vec<u8>> {
    let resp = HTTP_CLIENT.get(url).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(MapError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp.bytes()?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::TileCoord;
    use std::time::Instant;

    fn key(x: u32) -> TileKey {
        TileKey::new("street", TileCoord::new(x, 0, 2))
    }

    fn single_slot() -> TileLoader {
        TileLoader::with_config(
            TileCache::new(4),
            TileLoaderConfig {
                max_concurrent: 1,
                max_attempts: 1,
                retry_delay: Duration::ZERO,
            },
        )
    }

    fn wait_until(loader: &mut TileLoader, done: impl Fn(&TileLoader) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !done(loader) && Instant::now() < deadline {
            assert!(loader.poll().is_empty());
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_cached_tile_is_not_requested() {
        let cache = TileCache::new(4);
        let key = TileKey::new("street", TileCoord::new(0, 0, 0));
        cache.insert(key.clone(), vec![0x89, 0x50]);

        let mut loader = TileLoader::new(cache);
        assert_eq!(loader.state(&key), Some(TileState::Ready));
        assert!(!loader.request(key, "https://invalid.test/0/0/0.png".into()));
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn test_failed_download_is_recorded_once() {
        let mut loader = TileLoader::default();
        let key = TileKey::new("street", TileCoord::new(0, 0, 0));

        // Not a URL reqwest can send, so every attempt fails without network
        assert!(loader.request(key.clone(), "not a url".into()));
        assert!(!loader.request(key.clone(), "not a url".into()));
        assert_eq!(loader.state(&key), Some(TileState::Loading));

        wait_until(&mut loader, |l| l.state(&key) != Some(TileState::Loading));
        assert_eq!(loader.state(&key), Some(TileState::Failed));
        assert!(!loader.request(key.clone(), "not a url".into()));

        loader.reset_failures();
        assert_eq!(loader.state(&key), None);
    }

    #[test]
    fn test_requests_past_limit_are_queued() {
        let mut loader = single_slot();
        for x in 0..3 {
            assert!(loader.request(key(x), "not a url".into()));
        }

        assert_eq!(loader.in_flight(), 1);
        assert_eq!(loader.pending(), 3);
        assert_eq!(loader.state(&key(0)), Some(TileState::Loading));
        assert_eq!(loader.state(&key(1)), Some(TileState::Queued));
        assert_eq!(loader.state(&key(2)), Some(TileState::Queued));

        // Each failure frees the slot for the next queued tile
        wait_until(&mut loader, |l| l.pending() == 0);
        assert_eq!(loader.in_flight(), 0);
        for x in 0..3 {
            assert_eq!(loader.state(&key(x)), Some(TileState::Failed));
        }
    }

    #[test]
    fn test_retain_queued_drops_stale_requests() {
        let mut loader = single_slot();
        for x in 0..3 {
            loader.request(key(x), "not a url".into());
        }

        loader.retain_queued(|k| *k != key(1));
        assert_eq!(loader.pending(), 2);
        assert_eq!(loader.state(&key(1)), None);
        assert_eq!(loader.state(&key(2)), Some(TileState::Queued));
    }
}
