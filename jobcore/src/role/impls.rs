use std::{
    fmt,
    str::FromStr,
};
use crate::error::ValueError;
use super::*;

impl GuardName {
    pub fn new(job: impl Into<String>, grade: i32) -> Self {
        Self {
            job: job.into(),
            grade,
        }
    }

    /// The prefix shared by the guard names of every role of the job.
    pub fn job_prefix(job: &str) -> String {
        format!("{GUARD_PREFIX}-{job}-")
    }
}

impl fmt::Display for GuardName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{GUARD_PREFIX}-{}-{}", self.job, self.grade)
    }
}

impl FromStr for GuardName {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // the job itself may contain dashes, the grade is always last
        s.strip_prefix(GUARD_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.rsplit_once('-'))
            .filter(|(job, _)| {
                !job.is_empty() && !job.starts_with('-') && !job.ends_with('-')
            })
            .and_then(|(job, grade)| {
                grade.parse::<i32>()
                    .ok()
                    .filter(|grade| *grade >= 0)
                    .map(|grade| GuardName::new(job, grade))
            })
            .ok_or_else(|| ValueError::Unsupported(s.to_string()))
    }
}

impl Role {
    pub fn guard(&self) -> GuardName {
        GuardName::new(self.job.clone(), self.grade)
    }
}

impl RoleGrant {
    pub fn new(permission_id: i64) -> Self {
        Self {
            permission_id,
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValues) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

impl RolePermission {
    pub fn matches(&self, category: &str, name: &str) -> bool {
        self.category == category && self.name == name
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use super::*;

    #[test]
    fn guard_name() -> anyhow::Result<()> {
        let guard = GuardName::from_str("job-ambulance-2")?;
        assert_eq!(guard, GuardName::new("ambulance", 2));
        assert_eq!(guard.to_string(), "job-ambulance-2");

        let guard = GuardName::from_str("job-fire-dept-0")?;
        assert_eq!(guard, GuardName::new("fire-dept", 0));

        assert_eq!(GuardName::job_prefix("ambulance"), "job-ambulance-");
        Ok(())
    }

    #[test]
    fn guard_name_malformed() {
        for s in [
            "",
            "job",
            "job-",
            "job-ambulance",
            "job--1",
            "job-ambulance-",
            "job-ambulance-x",
            "job-ambulance--1",
            "role-ambulance-1",
            "jobambulance-1",
        ] {
            assert!(
                matches!(
                    GuardName::from_str(s),
                    Err(ValueError::Unsupported(v)) if v == s,
                ),
                "{s:?} should not parse",
            );
        }
    }
}
