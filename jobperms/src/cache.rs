//! Per job snapshots of the role grants.
//!
//! Readers take an `Arc` to the snapshot of a job and work on it without
//! holding the lock.  Writers never modify a snapshot; any mutation of
//! the roles of a job drops its snapshot so the next reader loads a
//! fresh one.

use jobcore::{
    identity::CallerIdentity,
    perms::genpolicy::GrantPolicy,
    role::RolePermission,
};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Every grant of every role of a single job.
#[derive(Debug, Default)]
pub struct JobSnapshot {
    grants: Vec<RolePermission>,
}

#[derive(Debug, Default)]
pub struct PermsCache {
    jobs: RwLock<HashMap<String, Arc<JobSnapshot>>>,
    // bumped on every invalidation
    generation: AtomicU64,
}

impl JobSnapshot {
    pub fn new(grants: Vec<RolePermission>) -> Self {
        Self { grants }
    }

    pub fn grants(&self) -> &[RolePermission] {
        &self.grants
    }

    /// The policy consisting of the grants of the roles held by the
    /// identity.
    pub fn policy_for(&self, identity: &CallerIdentity) -> GrantPolicy {
        GrantPolicy::new(
            identity.clone(),
            self.grants.iter()
                .filter(|grant| identity.holds_role(grant.role_id))
                .cloned()
                .collect(),
        )
    }
}

impl PermsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job: &str) -> Option<Arc<JobSnapshot>> {
        self.jobs.read().get(job).cloned()
    }

    /// The generation to pass to `insert` for a snapshot about to be
    /// loaded.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores the snapshot unless the cache was invalidated since the
    /// generation was taken; the snapshot is returned either way.
    pub fn insert(
        &self,
        job: &str,
        generation: u64,
        snapshot: JobSnapshot,
    ) -> Arc<JobSnapshot> {
        let snapshot = Arc::new(snapshot);
        let mut jobs = self.jobs.write();
        if self.generation.load(Ordering::Acquire) == generation {
            jobs.insert(job.to_string(), snapshot.clone());
        } else {
            log::debug!("not caching stale snapshot for job {job:?}");
        }
        snapshot
    }

    pub fn invalidate(&self, job: &str) {
        let mut jobs = self.jobs.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        if jobs.remove(job).is_some() {
            log::debug!("invalidated cached grants for job {job:?}");
        }
    }

    pub fn clear(&self) {
        let mut jobs = self.jobs.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        jobs.clear();
        log::debug!("cleared all cached grants");
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn grant(role_id: i64, name: &str) -> RolePermission {
        RolePermission {
            role_id,
            permission_id: role_id * 10,
            category: "Conduct".to_string(),
            name: name.to_string(),
            attributes: Default::default(),
        }
    }

    #[test]
    fn policy_for() {
        let snapshot = JobSnapshot::new(vec![
            grant(1, "ListEntries"),
            grant(2, "CreateEntry"),
            grant(2, "ListEntries"),
        ]);
        let identity = CallerIdentity::new(7, "ambulance", 1).roles([1]);
        let policy = snapshot.policy_for(&identity);
        assert_eq!(policy.identity, identity);
        assert_eq!(policy.permissions, vec![grant(1, "ListEntries")]);

        let policy = snapshot.policy_for(&CallerIdentity::new(7, "ambulance", 1));
        assert!(policy.permissions.is_empty());
    }

    #[test]
    fn invalidate() {
        let cache = PermsCache::new();
        let generation = cache.generation();
        cache.insert("ambulance", generation, JobSnapshot::default());
        cache.insert("police", generation, JobSnapshot::new(vec![grant(1, "ListEntries")]));
        assert_eq!(cache.len(), 2);

        // a reader keeps its snapshot after invalidation
        let held = cache.get("police").expect("snapshot is cached");
        cache.invalidate("police");
        assert!(cache.get("police").is_none());
        assert!(cache.get("ambulance").is_some());
        assert_eq!(held.grants().len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn stale_insert() {
        let cache = PermsCache::new();
        let generation = cache.generation();
        cache.invalidate("ambulance");
        let snapshot = cache.insert("ambulance", generation, JobSnapshot::default());
        assert!(snapshot.grants().is_empty());
        assert!(cache.get("ambulance").is_none());

        let generation = cache.generation();
        cache.insert("ambulance", generation, JobSnapshot::default());
        assert!(cache.get("ambulance").is_some());
    }
}
