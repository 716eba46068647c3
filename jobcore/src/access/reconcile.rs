//! Reconciliation of access entries.
//!
//! Given the entries currently stored for a resource and the entries a
//! caller wishes the resource to have, work out the minimal set of
//! creations, updates and deletions.  Entries are matched on their
//! natural key as defined by `AccessEntry::same_key`.

use super::{
    AccessChanges,
    AccessEntry,
};

pub fn reconcile<T: AccessEntry>(
    current: &[T],
    desired: &[T],
) -> AccessChanges<T> {
    let mut changes = AccessChanges::default();
    if current.is_empty() {
        changes.to_create = desired.to_vec();
        return changes;
    }

    let mut consumed = vec![false; desired.len()];
    for entry in current {
        let found = desired.iter()
            .enumerate()
            .find(|(i, d)| !consumed[*i] && entry.same_key(d));
        match found {
            Some((i, d)) => {
                consumed[i] = true;
                if entry.differs(d) {
                    let mut entry = entry.clone();
                    entry.update_from(d);
                    changes.to_update.push(entry);
                }
            }
            None => changes.to_delete.push(entry.clone()),
        }
    }

    changes.to_create = desired.iter()
        .zip(consumed)
        .filter_map(|(d, consumed)| (!consumed).then(|| d.clone()))
        .collect();
    changes
}

/// Returns the index of the first entry whose natural key was already
/// used by an earlier entry.
pub fn find_duplicate<T: AccessEntry>(entries: &[T]) -> Option<usize> {
    entries.iter()
        .enumerate()
        .skip(1)
        .find(|(i, entry)| entries[..*i].iter().any(|e| e.same_key(entry)))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod test {
    use crate::access::{
        AccessLevel,
        JobAccess,
        ResourceAccess,
        UserAccess,
    };
    use super::*;

    fn job(id: i64, job: &str, grade: i32, access: AccessLevel) -> JobAccess {
        JobAccess {
            id,
            resource: "/qualification/1".into(),
            .. JobAccess::new(job, grade, access)
        }
    }

    // applies the changes the same way the backend does: delete, update
    // then insert.
    fn apply<T: AccessEntry + PartialEq>(current: &[T], changes: AccessChanges<T>) -> Vec<T> {
        let mut result = current.iter()
            .filter(|c| !changes.to_delete.iter().any(|d| d.id() == c.id()))
            .cloned()
            .collect::<Vec<_>>();
        for update in changes.to_update.iter() {
            if let Some(entry) = result.iter_mut().find(|e| e.id() == update.id()) {
                *entry = update.clone();
            }
        }
        result.extend(changes.to_create);
        result
    }

    fn same_set<T: AccessEntry>(a: &[T], b: &[T]) -> bool {
        a.len() == b.len()
            && a.iter().all(|x| b.iter().any(|y| x.same_key(y) && !x.differs(y)))
    }

    #[test]
    fn identical() {
        let current = vec![
            job(1, "ambulance", 1, AccessLevel::View),
            job(2, "police", 3, AccessLevel::Edit),
        ];
        let changes = reconcile(&current, &current);
        assert!(changes.is_empty());
    }

    #[test]
    fn empty_current() {
        let desired = vec![
            JobAccess::new("ambulance", 1, AccessLevel::View),
            JobAccess::new("police", 3, AccessLevel::Edit),
        ];
        let changes = reconcile(&[], &desired);
        assert_eq!(changes.to_create, desired);
        assert!(changes.to_update.is_empty());
        assert!(changes.to_delete.is_empty());
    }

    #[test]
    fn empty_desired() {
        let current = vec![
            job(1, "ambulance", 1, AccessLevel::View),
            job(2, "police", 3, AccessLevel::Edit),
        ];
        let changes = reconcile(&current, &[]);
        assert_eq!(changes.to_delete, current);
        assert!(changes.to_create.is_empty());
        assert!(changes.to_update.is_empty());
    }

    #[test]
    fn mixed() {
        let current = vec![
            job(1, "ambulance", 1, AccessLevel::View),
            job(2, "police", 3, AccessLevel::Edit),
            job(3, "doj", 0, AccessLevel::View),
        ];
        let desired = vec![
            JobAccess::new("ambulance", 1, AccessLevel::Grant),
            JobAccess::new("doj", 0, AccessLevel::View),
            JobAccess::new("police", 1, AccessLevel::View),
        ];
        let changes = reconcile(&current, &desired);
        assert_eq!(changes.to_update, vec![job(1, "ambulance", 1, AccessLevel::Grant)]);
        assert_eq!(changes.to_delete, vec![job(2, "police", 3, AccessLevel::Edit)]);
        assert_eq!(changes.to_create, vec![JobAccess::new("police", 1, AccessLevel::View)]);

        let result = apply(&current, changes);
        assert!(same_set(&result, &desired));
    }

    #[test]
    fn round_trip_variants() {
        let current = vec![
            UserAccess { id: 1, .. UserAccess::new(100, AccessLevel::View) },
            UserAccess { id: 2, .. UserAccess::new(101, AccessLevel::Edit) },
        ];
        let desired = vec![
            UserAccess::new(101, AccessLevel::Grant),
            UserAccess::new(102, AccessLevel::View),
        ];
        let changes = reconcile(&current, &desired);
        assert_eq!(changes.to_update.len(), 1);
        assert_eq!(changes.to_update[0].id, 2);
        assert!(same_set(&apply(&current, changes), &desired));

        let current = vec![
            ResourceAccess { id: 1, .. ResourceAccess::new("/document/1", AccessLevel::View) },
        ];
        let desired = vec![
            ResourceAccess::new("/document/1", AccessLevel::View),
            ResourceAccess::new("/document/2", AccessLevel::Edit),
        ];
        let changes = reconcile(&current, &desired);
        assert!(changes.to_update.is_empty());
        assert!(changes.to_delete.is_empty());
        assert_eq!(changes.to_create, vec![ResourceAccess::new("/document/2", AccessLevel::Edit)]);
        assert!(same_set(&apply(&current, changes), &desired));
    }

    #[test]
    fn duplicates() {
        let entries = vec![
            JobAccess::new("ambulance", 1, AccessLevel::View),
            JobAccess::new("ambulance", 2, AccessLevel::View),
            JobAccess::new("ambulance", 1, AccessLevel::Edit),
        ];
        assert_eq!(find_duplicate(&entries), Some(2));
        assert_eq!(find_duplicate(&entries[..2]), None);
        assert_eq!(find_duplicate::<UserAccess>(&[]), None);
    }
}
