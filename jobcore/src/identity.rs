use serde::{Deserialize, Serialize};

mod impls;

/// The resolved caller as produced by the authentication layer.
///
/// `roles` lists the ids of the roles assigned to the caller; only those
/// belonging to `job` are considered when evaluating grants.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub job: String,
    pub job_grade: i32,
    pub superuser: bool,
    pub roles: Vec<i64>,
}

/// The actor a caller wishes to act upon.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct TargetActor {
    pub user_id: i64,
    pub job: String,
    pub job_grade: i32,
}
