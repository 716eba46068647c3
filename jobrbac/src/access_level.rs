//! Rank relative access checks.
//!
//! These decide whether a caller may act upon a specific target actor
//! based on their relative grade within the same job.  The levels are
//! usually obtained from a `StringList` attribute of a permission.

use enumset::{EnumSet, EnumSetType};
use jobcore::{
    access::{
        AccessLevel,
        JobAccess,
        UserAccess,
    },
    identity::{
        CallerIdentity,
        TargetActor,
    },
};
use std::str::FromStr;

mod impls;

#[derive(Debug, EnumSetType, Hash)]
pub enum RankAccess {
    Own,
    SameRank,
    LowerRank,
    Any,
    /// Accepted as a value but grants nothing beyond the other levels.
    All,
}

/// Checks whether the caller may access the target actor under the
/// provided levels.
///
/// The rules are applied in order and the first that matches decides:
/// superusers always pass; a target job other than the caller's own is
/// not governed by these rules; an absent target passes; an empty list
/// of levels only permits the caller's own records; otherwise `Any`,
/// `Lower_Rank`, `Same_Rank` and `Own` are consulted in that order.
pub fn check_access<S: AsRef<str>>(
    levels: &[S],
    identity: &CallerIdentity,
    target_job: &str,
    target: Option<&TargetActor>,
) -> bool {
    if identity.superuser {
        return true;
    }
    if target_job != identity.job {
        return true;
    }
    let target = match target {
        Some(target) => target,
        None => return true,
    };
    let is_own = target.user_id == identity.user_id;
    if levels.is_empty() {
        return is_own;
    }

    let levels = levels.iter()
        .filter_map(|level| {
            RankAccess::from_str(level.as_ref())
                .map_err(|_| log::warn!("ignoring unknown access level {:?}", level.as_ref()))
                .ok()
        })
        .collect::<EnumSet<_>>();
    log::trace!("check_access {identity} on user {} with {levels:?}", target.user_id);

    (levels.contains(RankAccess::Any))
        || (levels.contains(RankAccess::LowerRank) && target.job_grade < identity.job_grade)
        || (levels.contains(RankAccess::SameRank) && target.job_grade <= identity.job_grade)
        || (levels.contains(RankAccess::Own) && is_own)
}

/// Checks whether the access entries of a resource grant the caller at
/// least the requested level.
pub fn check_resource_access(
    identity: &CallerIdentity,
    job_access: &[JobAccess],
    user_access: &[UserAccess],
    level: AccessLevel,
) -> bool {
    if identity.superuser {
        return true;
    }
    job_access.iter().any(|entry| {
        entry.job == identity.job
            && entry.minimum_grade <= identity.job_grade
            && entry.access >= level
    }) || user_access.iter().any(|entry| {
        entry.user_id == identity.user_id
            && entry.access >= level
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const NONE: &[&str] = &[];

    fn caller() -> CallerIdentity {
        CallerIdentity::new(10, "ambulance", 2)
    }

    #[test]
    fn superuser() {
        let identity = caller().superuser(true);
        let target = TargetActor::new(11, "ambulance", 5);
        assert!(check_access(NONE, &identity, "ambulance", Some(&target)));
        assert!(check_access(&["Own"], &identity, "ambulance", Some(&target)));
    }

    #[test]
    fn other_job_or_no_target() {
        let identity = caller();
        let target = TargetActor::new(11, "police", 5);
        assert!(check_access(NONE, &identity, "police", Some(&target)));
        assert!(check_access(&["Own"], &identity, "ambulance", None));
    }

    #[test]
    fn empty_levels_is_own() {
        let identity = caller();
        let own = TargetActor::from(&identity);
        let other = TargetActor::new(11, "ambulance", 0);
        assert!(check_access(NONE, &identity, "ambulance", Some(&own)));
        assert!(!check_access(NONE, &identity, "ambulance", Some(&other)));
    }

    #[test]
    fn any() {
        let identity = caller();
        for grade in [0, 2, 9] {
            let target = TargetActor::new(11, "ambulance", grade);
            assert!(check_access(&["Any"], &identity, "ambulance", Some(&target)));
        }
    }

    #[test]
    fn ranks() {
        let identity = caller();
        let lower = TargetActor::new(11, "ambulance", 1);
        let same = TargetActor::new(12, "ambulance", 2);
        let higher = TargetActor::new(13, "ambulance", 3);

        assert!(check_access(&["Lower_Rank"], &identity, "ambulance", Some(&lower)));
        assert!(!check_access(&["Lower_Rank"], &identity, "ambulance", Some(&same)));
        assert!(!check_access(&["Lower_Rank"], &identity, "ambulance", Some(&higher)));

        assert!(check_access(&["Same_Rank"], &identity, "ambulance", Some(&lower)));
        assert!(check_access(&["Same_Rank"], &identity, "ambulance", Some(&same)));
        assert!(!check_access(&["Same_Rank"], &identity, "ambulance", Some(&higher)));

        // own record always passes with Own, regardless of grade
        let own = TargetActor::from(&identity);
        assert!(check_access(&["Own"], &identity, "ambulance", Some(&own)));
        assert!(!check_access(&["Own"], &identity, "ambulance", Some(&lower)));
        assert!(check_access(&["Own", "Lower_Rank"], &identity, "ambulance", Some(&lower)));
    }

    #[test]
    fn own_entry_created_by_higher_rank() {
        // rank 1 actor may list entries but only their own ones
        let identity = CallerIdentity::new(1, "ambulance", 1);
        let target = TargetActor::new(2, "ambulance", 2);
        assert!(!check_access(&["Own"], &identity, "ambulance", Some(&target)));
    }

    #[test]
    fn unknown_and_all() {
        let identity = caller();
        let other = TargetActor::new(11, "ambulance", 0);
        // unknown values do not count as an empty list
        assert!(!check_access(&["Bogus"], &identity, "ambulance", Some(&other)));
        assert!(!check_access(&["Bogus"], &identity, "ambulance", Some(&TargetActor::from(&identity))));
        assert!(!check_access(&["All"], &identity, "ambulance", Some(&other)));
    }

    #[test]
    fn resource_access() {
        let identity = caller();
        let job_access = [
            JobAccess::new("ambulance", 3, AccessLevel::Grant),
            JobAccess::new("ambulance", 1, AccessLevel::View),
            JobAccess::new("police", 0, AccessLevel::Edit),
        ];
        assert!(check_resource_access(&identity, &job_access, &[], AccessLevel::View));
        assert!(!check_resource_access(&identity, &job_access, &[], AccessLevel::Edit));

        let user_access = [
            UserAccess::new(10, AccessLevel::Edit),
            UserAccess::new(11, AccessLevel::Grant),
        ];
        assert!(check_resource_access(&identity, &job_access, &user_access, AccessLevel::Edit));
        assert!(!check_resource_access(&identity, &job_access, &user_access, AccessLevel::Grant));
        assert!(check_resource_access(
            &identity.clone().superuser(true), &[], &[], AccessLevel::Grant,
        ));
        assert!(!check_resource_access(&identity, &[], &[], AccessLevel::View));
    }
}
