use std::{
    fmt,
    str::FromStr,
};
use crate::error::ValueError;
use super::*;

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Blocked
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", <&'static str>::from(*self))
    }
}

impl From<AccessLevel> for &'static str {
    fn from(level: AccessLevel) -> &'static str {
        match level {
            AccessLevel::Blocked => "blocked",
            AccessLevel::View => "view",
            AccessLevel::Edit => "edit",
            AccessLevel::Grant => "grant",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_ref() {
            "blocked" => Ok(AccessLevel::Blocked),
            "view" => Ok(AccessLevel::View),
            "edit" => Ok(AccessLevel::Edit),
            "grant" => Ok(AccessLevel::Grant),
            s => Err(ValueError::Unsupported(s.to_string())),
        }
    }
}

#[cfg(feature = "clap")]
mod clap {
    use ::clap::{
        ValueEnum,
        builder::PossibleValue,
    };
    use super::*;

    impl ValueEnum for AccessLevel {
        fn value_variants<'a>() -> &'a [Self] {
            &[
                AccessLevel::Blocked,
                AccessLevel::View,
                AccessLevel::Edit,
                AccessLevel::Grant,
            ]
        }

        fn to_possible_value(&self) -> Option<PossibleValue> {
            Some(PossibleValue::new(<&'static str>::from(*self)))
        }
    }
}

impl JobAccess {
    pub fn new(job: impl Into<String>, minimum_grade: i32, access: AccessLevel) -> Self {
        Self {
            job: job.into(),
            minimum_grade,
            access,
            ..Default::default()
        }
    }
}

impl UserAccess {
    pub fn new(user_id: i64, access: AccessLevel) -> Self {
        Self {
            user_id,
            access,
            ..Default::default()
        }
    }
}

impl ResourceAccess {
    pub fn new(target_resource: impl Into<String>, access: AccessLevel) -> Self {
        Self {
            target_resource: target_resource.into(),
            access,
            ..Default::default()
        }
    }
}

impl AccessEntry for JobAccess {
    fn id(&self) -> i64 {
        self.id
    }

    fn access(&self) -> AccessLevel {
        self.access
    }

    fn set_resource(&mut self, resource: &str) {
        self.resource = resource.to_string();
    }

    fn same_key(&self, other: &Self) -> bool {
        self.job == other.job && self.minimum_grade == other.minimum_grade
    }

    fn differs(&self, other: &Self) -> bool {
        self.minimum_grade != other.minimum_grade || self.access != other.access
    }

    fn update_from(&mut self, other: &Self) {
        self.minimum_grade = other.minimum_grade;
        self.access = other.access;
    }
}

impl AccessEntry for UserAccess {
    fn id(&self) -> i64 {
        self.id
    }

    fn access(&self) -> AccessLevel {
        self.access
    }

    fn set_resource(&mut self, resource: &str) {
        self.resource = resource.to_string();
    }

    fn same_key(&self, other: &Self) -> bool {
        self.user_id == other.user_id
    }

    fn differs(&self, other: &Self) -> bool {
        self.access != other.access
    }

    fn update_from(&mut self, other: &Self) {
        self.access = other.access;
    }
}

impl AccessEntry for ResourceAccess {
    fn id(&self) -> i64 {
        self.id
    }

    fn access(&self) -> AccessLevel {
        self.access
    }

    fn set_resource(&mut self, resource: &str) {
        self.resource = resource.to_string();
    }

    fn same_key(&self, other: &Self) -> bool {
        self.target_resource == other.target_resource
    }

    fn differs(&self, other: &Self) -> bool {
        self.access != other.access
    }

    fn update_from(&mut self, other: &Self) {
        self.access = other.access;
    }
}

impl<T> Default for AccessChanges<T> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }
}

impl<T> AccessChanges<T> {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty()
            && self.to_update.is_empty()
            && self.to_delete.is_empty()
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use super::*;

    #[test]
    fn access_level() -> anyhow::Result<()> {
        assert!(AccessLevel::Blocked < AccessLevel::View);
        assert!(AccessLevel::View < AccessLevel::Edit);
        assert!(AccessLevel::Edit < AccessLevel::Grant);

        assert_eq!(AccessLevel::Edit.to_string(), "edit");
        assert_eq!(AccessLevel::from_str("Grant")?, AccessLevel::Grant);
        assert!(AccessLevel::from_str("admin").is_err());

        assert_eq!(i32::from(AccessLevel::View), 1);
        assert_eq!(AccessLevel::try_from(2)?, AccessLevel::Edit);
        assert!(AccessLevel::try_from(4).is_err());
        Ok(())
    }

    #[test]
    fn job_access_key() {
        let a = JobAccess::new("ambulance", 1, AccessLevel::View);
        let b = JobAccess::new("ambulance", 1, AccessLevel::Edit);
        let c = JobAccess::new("ambulance", 2, AccessLevel::View);
        assert!(a.same_key(&b));
        assert!(a.differs(&b));
        assert!(!a.same_key(&c));

        let mut a = a;
        a.update_from(&b);
        assert_eq!(a.access, AccessLevel::Edit);
        assert!(!a.differs(&b));
    }
}
