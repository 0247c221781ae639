use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::db::errors::Result;
use crate::models::records::TypeHintRecord;

pub const DEFAULT_HINT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Cache-aside snapshot of the hint taxonomy, keyed by hint key.
///
/// The taxonomy is tiny and read on every storefront request, so one
/// shared snapshot with a short TTL covers it. Registry mutations call
/// [`HintCache::invalidate`]; a dropped snapshot only costs a reload.
pub struct HintCache {
    ttl: Duration,
    inner: RwLock<Option<Snapshot>>,
}

struct Snapshot {
    loaded_at: Instant,
    hints: Arc<HashMap<String, TypeHintRecord>>,
}

impl HintCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: RwLock::new(None),
        }
    }

    /// Serve the snapshot when fresh, otherwise run the loader and
    /// replace it
    pub async fn get_or_load<F, Fut>(&self, loader: F) -> Result<Arc<HashMap<String, TypeHintRecord>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<TypeHintRecord>>>,
    {
        {
            let guard = self.inner.read().await;
            if let Some(snapshot) = guard.as_ref() {
                if snapshot.loaded_at.elapsed() < self.ttl {
                    return Ok(snapshot.hints.clone());
                }
            }
        }

        let records = loader().await?;
        let hints: Arc<HashMap<String, TypeHintRecord>> = Arc::new(
            records
                .into_iter()
                .map(|record| (record.key.clone(), record))
                .collect(),
        );

        let mut guard = self.inner.write().await;
        *guard = Some(Snapshot {
            loaded_at: Instant::now(),
            hints: hints.clone(),
        });
        debug!("Hint cache refreshed with {} entries", hints.len());

        Ok(hints)
    }

    /// Drop the snapshot so the next read reloads
    pub async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        *guard = None;
        debug!("Hint cache invalidated");
    }
}

impl Default for HintCache {
    fn default() -> Self {
        Self::new(DEFAULT_HINT_CACHE_TTL)
    }
}
