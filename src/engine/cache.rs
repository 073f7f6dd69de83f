//! Read-through cache of resolved schema trees.
//!
//! Entries are keyed by root schema id and remember the version of every
//! schema they were built from, so a change anywhere in the reference graph
//! makes the entry stale. Concurrent misses on the same key share a single
//! resolution; if it fails, waiters resolve on their own.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use super::resolver::ResolvedTree;
use crate::domain::{MockError, MockStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
    /// Cache disabled, or a shared resolution failed and this caller resolved alone.
    Bypass,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
            CacheOutcome::Bypass => "bypass",
        }
    }
}

type Slot = Arc<OnceCell<Arc<ResolvedTree>>>;

pub struct ResolutionCache {
    enabled: bool,
    slots: Mutex<HashMap<String, Slot>>,
}

impl ResolutionCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the cached tree for `schema_id` if it is still current,
    /// otherwise run `resolve` (at most once per key at a time).
    pub async fn get_or_resolve<F>(
        &self,
        schema_id: &str,
        store: &dyn MockStore,
        resolve: F,
    ) -> Result<(Arc<ResolvedTree>, CacheOutcome), MockError>
    where
        F: Fn() -> Result<ResolvedTree, MockError>,
    {
        if !self.enabled {
            return resolve().map(|tree| (Arc::new(tree), CacheOutcome::Bypass));
        }

        let slot = {
            let mut slots = self.slots.lock().await;
            if let Some(tree) = slots.get(schema_id).and_then(|slot| slot.get()) {
                if tree.is_current(store) {
                    return Ok((tree.clone(), CacheOutcome::Hit));
                }
                tracing::debug!(schema = schema_id, "Evicting stale resolution");
                slots.remove(schema_id);
            }
            slots
                .entry(schema_id.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let mut computed = false;
        let shared = slot
            .get_or_try_init(|| {
                computed = true;
                async { resolve().map(Arc::new) }
            })
            .await;

        match shared {
            Ok(tree) if computed => Ok((tree.clone(), CacheOutcome::Miss)),
            Ok(tree) if tree.is_current(store) => Ok((tree.clone(), CacheOutcome::Hit)),
            Ok(_) => resolve().map(|tree| (Arc::new(tree), CacheOutcome::Bypass)),
            Err(err) => {
                // A failed resolution never leaves a value behind.
                let mut slots = self.slots.lock().await;
                if slots
                    .get(schema_id)
                    .map(|s| Arc::ptr_eq(s, &slot) && !s.initialized())
                    .unwrap_or(false)
                {
                    slots.remove(schema_id);
                }
                Err(err)
            }
        }
    }

    /// Drop every entry built from `schema_id`.
    pub async fn invalidate(&self, schema_id: &str) {
        let mut slots = self.slots.lock().await;
        slots.retain(|key, slot| {
            key != schema_id
                && slot
                    .get()
                    .map(|tree| !tree.depends_on(schema_id))
                    .unwrap_or(true)
        });
    }

    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.slots
            .lock()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}
