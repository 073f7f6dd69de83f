//! In-memory implementation of the [`MockStore`] port, fed from configuration.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::{Endpoint, HttpMethod, MockStore, ResponseWrapper, Schema};

/// Definitions loaded from configuration, ready to be swapped into a store.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub schemas: Vec<Schema>,
    pub endpoints: Vec<Endpoint>,
    pub response_wrappers: Vec<ResponseWrapper>,
}

#[derive(Default)]
struct Snapshot {
    schemas: HashMap<String, Arc<Schema>>,
    wrappers: HashMap<String, Arc<ResponseWrapper>>,
    /// Endpoints grouped by (project, method), in declaration order.
    endpoints: HashMap<(String, HttpMethod), Vec<Arc<Endpoint>>>,
    endpoint_count: usize,
    /// Last version of every schema that has been removed, so a schema
    /// re-added under the same id never reuses a version.
    retired: HashMap<String, u64>,
}

impl Snapshot {
    fn build(defs: Definitions, previous: Option<&Snapshot>) -> Self {
        let mut snapshot = Snapshot {
            retired: previous.map(|p| p.retired.clone()).unwrap_or_default(),
            ..Default::default()
        };
        for mut schema in defs.schemas {
            // Carry versions forward so cached trees of changed schemas go stale.
            if let Some(prev) = previous.and_then(|p| p.schemas.get(&schema.id)) {
                schema.version = if prev.fields == schema.fields {
                    prev.version
                } else {
                    prev.version.max(schema.version) + 1
                };
            } else if let Some(retired) = snapshot.retired.remove(&schema.id) {
                schema.version = retired.max(schema.version) + 1;
            }
            snapshot.schemas.insert(schema.id.clone(), Arc::new(schema));
        }
        if let Some(prev) = previous {
            for (id, schema) in &prev.schemas {
                if !snapshot.schemas.contains_key(id) {
                    snapshot.retired.insert(id.clone(), schema.version);
                }
            }
        }
        for wrapper in defs.response_wrappers {
            snapshot.wrappers.insert(wrapper.id.clone(), Arc::new(wrapper));
        }
        for mut endpoint in defs.endpoints {
            endpoint.path = normalize_path(&endpoint.path);
            snapshot
                .endpoints
                .entry((endpoint.project_id.clone(), endpoint.method))
                .or_default()
                .push(Arc::new(endpoint));
            snapshot.endpoint_count += 1;
        }
        snapshot
    }
}

pub struct InMemoryMockStore {
    snapshot: RwLock<Snapshot>,
}

impl InMemoryMockStore {
    pub fn new(defs: Definitions) -> Self {
        Self {
            snapshot: RwLock::new(Snapshot::build(defs, None)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically replace every definition (configuration reload).
    pub fn replace_all(&self, defs: Definitions) {
        let mut guard = self.write();
        let next = Snapshot::build(defs, Some(&*guard));
        *guard = next;
        tracing::info!(
            schemas = guard.schemas.len(),
            endpoints = guard.endpoint_count,
            wrappers = guard.wrappers.len(),
            "Mock definitions loaded"
        );
    }

    /// Insert or replace one schema, bumping its version past the stored one.
    pub fn upsert_schema(&self, mut schema: Schema) -> u64 {
        let mut guard = self.write();
        let current = guard.schemas.get(&schema.id).map(|s| s.version);
        let previous = current.or_else(|| guard.retired.remove(&schema.id));
        if let Some(previous) = previous {
            schema.version = previous.max(schema.version) + 1;
        }
        let version = schema.version;
        guard.schemas.insert(schema.id.clone(), Arc::new(schema));
        version
    }

    pub fn remove_schema(&self, schema_id: &str) -> bool {
        let mut guard = self.write();
        match guard.schemas.remove(schema_id) {
            Some(schema) => {
                guard.retired.insert(schema.id.clone(), schema.version);
                true
            }
            None => false,
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.read().endpoint_count
    }

    pub fn schema_count(&self) -> usize {
        self.read().schemas.len()
    }
}

impl MockStore for InMemoryMockStore {
    fn get_endpoint(
        &self,
        project_id: &str,
        method: HttpMethod,
        path: &str,
    ) -> Option<Arc<Endpoint>> {
        let path = normalize_path(path);
        let snapshot = self.read();
        let candidates = snapshot.endpoints.get(&(project_id.to_string(), method))?;
        candidates
            .iter()
            .find(|e| e.path == path)
            .or_else(|| candidates.iter().find(|e| path_matches(&e.path, &path)))
            .cloned()
    }

    fn get_schema(&self, schema_id: &str) -> Option<Arc<Schema>> {
        self.read().schemas.get(schema_id).cloned()
    }

    fn get_response_wrapper(&self, wrapper_id: &str) -> Option<Arc<ResponseWrapper>> {
        self.read().wrappers.get(wrapper_id).cloned()
    }
}

/// Leading slash, no trailing slash (except the root itself).
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// `{name}` and `:name` segments in `pattern` match any single non-empty segment.
fn path_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return true,
            (Some(p), Some(s)) => {
                let is_param = (p.starts_with('{') && p.ends_with('}') && p.len() > 2)
                    || (p.starts_with(':') && p.len() > 1);
                if is_param {
                    if s.is_empty() {
                        return false;
                    }
                } else if p != s {
                    return false;
                }
            }
            _ => return false,
        }
    }
}
