/// Result Cache - content-addressed, TTL-bound
///
/// **Responsibility:**
/// Avoid sending identical (source, stdin) pairs to the judge backend twice
/// within the TTL window.
///
/// **Concurrency:**
/// - Plain map operations behind an async RwLock, no get-then-put transaction
/// - Two requests racing on one key may both compute and overwrite each other;
///   results are deterministic in the key so last write wins
/// - Expired entries are dropped lazily on lookup and by a sweep task owned by
///   the cache service (see `spawn_sweeper`)

use assessor_common::types::{ExecutionRequest, ExecutionResult};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Digest of a request's source and stdin.
/// Lengths are folded in so ("ab", "c") and ("a", "bc") hash apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(request: &ExecutionRequest) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((request.source_code.len() as u64).to_le_bytes());
        hasher.update(request.source_code.as_bytes());
        hasher.update((request.stdin.len() as u64).to_le_bytes());
        hasher.update(request.stdin.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    result: ExecutionResult,
    stored_at: Instant,
}

pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.duration_since(entry.stored_at) > self.ttl
    }

    /// Look up a live entry; an expired one is removed on the way out
    pub async fn get(&self, key: &CacheKey) -> Option<ExecutionResult> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !self.is_expired(entry, now) => return Some(entry.result.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // Re-check under the write lock; a fresh put may have landed meanwhile
        if entries
            .get(key)
            .map_or(false, |entry| self.is_expired(entry, now))
        {
            entries.remove(key);
            debug!(key = key.as_str(), "Evicted expired cache entry on lookup");
        }
        None
    }

    pub async fn put(&self, key: CacheKey, result: ExecutionResult) {
        let entry = CacheEntry {
            result,
            stored_at: Instant::now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.stored_at) <= self.ttl);
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Start the periodic sweep. The task lives until `SweepTask::stop` is
    /// called or the handle is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> SweepTask {
        let cache = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.sweep().await;
                        if removed > 0 {
                            debug!(removed, "Swept expired cache entries");
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
            debug!("Cache sweeper stopped");
        });

        info!(
            period_secs = period.as_secs(),
            ttl_secs = self.ttl.as_secs(),
            "Cache sweeper started"
        );

        SweepTask {
            handle,
            shutdown: Some(shutdown_tx),
        }
    }
}

/// Handle on the background sweep task
pub struct SweepTask {
    handle: JoinHandle<()>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl SweepTask {
    /// Signal the task and wait for it to exit
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
