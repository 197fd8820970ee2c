//! In-memory permission registry.
//!
//! # Purpose
//! Owns every declared permission and the parent→child grant graph as an
//! arena of immutable nodes addressed by [`PermissionId`].
//!
//! # Concurrency
//! Readers load the current snapshot through `ArcSwap` without taking a
//! lock. Writers serialize on a mutex, copy the node table, apply their
//! change and publish the new snapshot in one store, so a reader sees either
//! the whole update or none of it. Child edges are only ever inserted, which
//! makes concurrent parent upserts a set union.
//!
//! # Key invariants
//! - One node per normalized key; upserting an existing key updates it in
//!   place and keeps its id and children.
//! - [`PermissionRegistry::resolve_children`] visits every node at most once
//!   and terminates on cyclic graphs.
use crate::{
    HttpMethod, IamResult, Permission, PermissionId, PermissionMeta, ResourcePattern,
    normalize_key,
};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct Snapshot {
    entries: Vec<Arc<Permission>>,
    by_key: HashMap<String, PermissionId>,
}

impl Snapshot {
    fn ensure(&mut self, key: &str) -> PermissionId {
        if let Some(id) = self.by_key.get(key) {
            return *id;
        }
        let id = PermissionId(self.entries.len() as u32);
        self.entries
            .push(Arc::new(Permission::placeholder(id, key.to_string())));
        self.by_key.insert(key.to_string(), id);
        id
    }

    fn entry_mut(&mut self, id: PermissionId) -> &mut Permission {
        Arc::make_mut(&mut self.entries[id.index()])
    }

    fn get(&self, id: PermissionId) -> Option<&Arc<Permission>> {
        self.entries.get(id.index())
    }
}

#[derive(Debug, Default)]
pub struct PermissionRegistry {
    snapshot: ArcSwap<Snapshot>,
    writer: Mutex<()>,
}

impl PermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update the permission identified by `key`.
    ///
    /// `resource` and `method` replace the stored values when given and are
    /// left untouched otherwise. Every key in `meta.parents` is upserted as
    /// well (as a bare placeholder when new) and gains this permission as a
    /// child.
    ///
    /// # Errors
    /// - [`crate::IamError::InvalidKey`] when `key` is blank.
    pub fn upsert(
        &self,
        key: &str,
        resource: Option<ResourcePattern>,
        method: Option<HttpMethod>,
        meta: &PermissionMeta,
    ) -> IamResult<Arc<Permission>> {
        let key = normalize_key(key)?;
        let parents: Vec<String> = meta
            .parents
            .iter()
            .filter_map(|parent| normalize_key(parent).ok())
            .collect();

        let _guard = self.writer.lock();
        let mut next = Snapshot::clone(&self.snapshot.load());

        let id = next.ensure(&key);
        let entry = next.entry_mut(id);
        if let Some(resource) = resource {
            entry.resource = Some(resource);
        }
        if let Some(method) = method {
            entry.method = Some(method);
        }
        entry.apply(meta);

        for parent in parents {
            let parent_id = next.ensure(&parent);
            if next.entries[parent_id.index()].children.contains(&id) {
                continue;
            }
            next.entry_mut(parent_id).children.insert(id);
        }

        let stored = Arc::clone(&next.entries[id.index()]);
        self.snapshot.store(Arc::new(next));
        tracing::debug!(key = %stored.key, id = %stored.id, "permission upserted");
        Ok(stored)
    }

    pub fn get(&self, id: PermissionId) -> Option<Arc<Permission>> {
        self.snapshot.load().get(id).cloned()
    }

    pub fn find_by_key(&self, key: &str) -> Option<Arc<Permission>> {
        let key = normalize_key(key).ok()?;
        let snapshot = self.snapshot.load();
        let id = snapshot.by_key.get(&key)?;
        snapshot.get(*id).cloned()
    }

    /// Look up permissions by key. Unknown keys are dropped and each match is
    /// returned once, in first-requested order.
    pub fn find_by_keys<S: AsRef<str>>(&self, keys: &[S]) -> Vec<Arc<Permission>> {
        let snapshot = self.snapshot.load();
        let mut seen = HashSet::new();
        keys.iter()
            .filter_map(|key| normalize_key(key.as_ref()).ok())
            .filter_map(|key| snapshot.by_key.get(&key).copied())
            .filter(|id| seen.insert(*id))
            .filter_map(|id| snapshot.get(id).cloned())
            .collect()
    }

    pub fn find_by_ids(&self, ids: &[PermissionId]) -> Vec<Arc<Permission>> {
        let snapshot = self.snapshot.load();
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| snapshot.get(*id).cloned())
            .collect()
    }

    pub fn find_all(&self) -> Vec<Arc<Permission>> {
        self.snapshot.load().entries.clone()
    }

    /// Breadth-first closure of `roots` under `children` edges.
    ///
    /// The result contains each reachable permission exactly once, roots
    /// included. Ids that are not in the registry are ignored.
    pub fn resolve_children(&self, roots: &[PermissionId]) -> Vec<Arc<Permission>> {
        let snapshot = self.snapshot.load();
        let mut visited = HashSet::new();
        let mut queue: VecDeque<PermissionId> = VecDeque::new();
        let mut resolved = Vec::new();

        for root in roots {
            if snapshot.get(*root).is_some() && visited.insert(*root) {
                queue.push_back(*root);
            }
        }

        while let Some(id) = queue.pop_front() {
            let Some(entry) = snapshot.get(id) else {
                continue;
            };
            for child in &entry.children {
                if snapshot.get(*child).is_some() && visited.insert(*child) {
                    queue.push_back(*child);
                }
            }
            resolved.push(Arc::clone(entry));
        }
        resolved
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
