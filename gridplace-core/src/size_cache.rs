use std::{
    any::type_name_of_val,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use gridplace_contracts::KeyValueStore;
use gridplace_model::{ImageDimensions, SourceUrl};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::PlacementError;

/// Stored form of a cached size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CachedSize {
    width: u32,
    height: u32,
}

enum CacheJob {
    Write { key: String, value: String },
    Flush(oneshot::Sender<()>),
}

/// Best-effort memory of previously observed image sizes, keyed by URL.
///
/// Reads go straight to the store and degrade to a miss on any failure.
/// Writes are queued to a single background task so callers never wait on
/// storage; when the queue is full the write is dropped. Entries never
/// expire.
#[derive(Clone)]
pub struct SizeCache {
    store: Arc<dyn KeyValueStore>,
    key_prefix: String,
    writes: mpsc::Sender<CacheJob>,
    enqueued: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl fmt::Debug for SizeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeCache")
            .field("store", &type_name_of_val(self.store.as_ref()))
            .field("key_prefix", &self.key_prefix)
            .field("enqueued", &self.enqueued.load(Ordering::Relaxed))
            .field("dropped", &self.dropped.load(Ordering::Relaxed))
            .finish()
    }
}

impl SizeCache {
    /// Create the cache and spawn its writer task on the current runtime.
    pub fn spawn(
        store: Arc<dyn KeyValueStore>,
        key_prefix: impl Into<String>,
        queue_capacity: usize,
    ) -> Self {
        let (writes, rx) = mpsc::channel(queue_capacity.max(1));
        tokio::spawn(run_writer(Arc::clone(&store), rx));

        Self {
            store,
            key_prefix: key_prefix.into(),
            writes,
            enqueued: Arc::new(AtomicU64::new(0)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn key_for(&self, url: &SourceUrl) -> String {
        let mut key =
            String::with_capacity(self.key_prefix.len() + url.as_str().len());
        key.push_str(&self.key_prefix);
        key.push_str(url.as_str());
        key
    }

    /// Look up the last size recorded for `url`.
    pub async fn get(&self, url: &SourceUrl) -> Option<ImageDimensions> {
        match self.try_get(url).await {
            Ok(found) => found,
            Err(err) => {
                warn!("[size_cache] Lookup failed for {}: {}", url, err);
                None
            }
        }
    }

    async fn try_get(
        &self,
        url: &SourceUrl,
    ) -> Result<Option<ImageDimensions>, PlacementError> {
        let Some(raw) = self
            .store
            .get(&self.key_for(url))
            .await
            .map_err(|err| PlacementError::Cache(err.to_string()))?
        else {
            return Ok(None);
        };

        let cached: CachedSize = serde_json::from_str(&raw)
            .map_err(|err| PlacementError::Cache(err.to_string()))?;
        ImageDimensions::try_from((cached.width, cached.height))
            .map(Some)
            .map_err(|err| PlacementError::Cache(err.to_string()))
    }

    /// Queue `size` to be stored for `url`. Never waits and never fails.
    pub fn remember(&self, url: &SourceUrl, size: ImageDimensions) {
        let (width, height) = size.as_u32_tuple();
        let value = match serde_json::to_string(&CachedSize { width, height })
        {
            Ok(value) => value,
            Err(err) => {
                warn!("[size_cache] Failed to encode size for {}: {}", url, err);
                return;
            }
        };

        let job = CacheJob::Write {
            key: self.key_for(url),
            value,
        };
        match self.writes.try_send(job) {
            Ok(()) => {
                self.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("[size_cache] Dropping size write for {}: {}", url, err);
            }
        }
    }

    /// Wait until every write queued so far has been attempted.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.writes.send(CacheJob::Flush(tx)).await.is_err() {
            return;
        }
        let _ = rx.await;
    }

    /// Number of writes that were discarded because the queue was full.
    pub fn dropped_writes(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

async fn run_writer(
    store: Arc<dyn KeyValueStore>,
    mut rx: mpsc::Receiver<CacheJob>,
) {
    while let Some(job) = rx.recv().await {
        match job {
            CacheJob::Write { key, value } => {
                if let Err(err) = store.set(&key, value).await {
                    warn!("[size_cache] Write failed for {}: {}", key, err);
                } else {
                    debug!("[size_cache] Stored {}", key);
                }
            }
            CacheJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}
