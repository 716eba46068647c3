use std::fmt;
use super::*;

impl CallerIdentity {
    pub fn new(user_id: i64, job: impl Into<String>, job_grade: i32) -> Self {
        Self {
            user_id,
            job: job.into(),
            job_grade,
            superuser: false,
            roles: Vec::new(),
        }
    }

    pub fn superuser(mut self, val: bool) -> Self {
        self.superuser = val;
        self
    }

    pub fn roles(mut self, val: impl IntoIterator<Item = i64>) -> Self {
        self.roles = val.into_iter().collect();
        self
    }

    pub fn holds_role(&self, role_id: i64) -> bool {
        self.roles.contains(&role_id)
    }
}

impl TargetActor {
    pub fn new(user_id: i64, job: impl Into<String>, job_grade: i32) -> Self {
        Self {
            user_id,
            job: job.into(),
            job_grade,
        }
    }
}

impl From<&CallerIdentity> for TargetActor {
    fn from(identity: &CallerIdentity) -> Self {
        Self::new(identity.user_id, identity.job.clone(), identity.job_grade)
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "user {} ({}:{})", self.user_id, self.job, self.job_grade)?;
        if self.superuser {
            f.write_str(" [superuser]")?;
        }
        Ok(())
    }
}
