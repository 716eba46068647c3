use std::{
    fmt,
    str::FromStr,
};
use crate::error::ValueError;
use super::*;

impl PermKey {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    /// The dotted form used for stored permission guard names, e.g.
    /// `Conduct.ListEntries`.
    pub fn guard_name(&self) -> String {
        guard_name(&self.category, &self.name)
    }
}

pub fn guard_name(category: &str, name: &str) -> String {
    format!("{category}.{name}")
}

impl fmt::Display for PermKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

impl FromStr for PermKey {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((category, name))
                if !category.is_empty()
                    && !name.is_empty()
                    && !name.contains('/') => Ok(PermKey::new(category, name)),
            _ => Err(ValueError::Unsupported(s.to_string())),
        }
    }
}

impl Attr {
    pub fn new(key: impl Into<String>, value_type: AttrValueType) -> Self {
        Self {
            key: key.into(),
            value_type,
            valid_values: None,
            default_values: None,
        }
    }

    pub fn string_list<S: Into<String>>(
        key: impl Into<String>,
        valid: impl IntoIterator<Item = S>,
        default: impl IntoIterator<Item = S>,
    ) -> Self {
        let valid = StringList::from_iter(valid);
        let default = StringList::from_iter(default);
        Self {
            key: key.into(),
            value_type: AttrValueType::StringList,
            valid_values: (!valid.is_empty()).then_some(AttributeValues::StringList(valid)),
            default_values: (!default.is_empty()).then_some(AttributeValues::StringList(default)),
        }
    }

    pub fn job_list(key: impl Into<String>) -> Self {
        Self::new(key, AttrValueType::JobList)
    }

    pub fn job_grade_list(key: impl Into<String>) -> Self {
        Self::new(key, AttrValueType::JobGradeList)
    }

    pub fn valid_values(mut self, val: AttributeValues) -> Self {
        self.valid_values = Some(val);
        self
    }

    pub fn default_values(mut self, val: AttributeValues) -> Self {
        self.default_values = Some(val);
        self
    }

    /// The value that applies when a grant does not set this attribute,
    /// always of the declared type.
    pub fn default_or_empty(&self) -> AttributeValues {
        self.default_values
            .clone()
            .unwrap_or_else(|| AttributeValues::empty(self.value_type))
    }
}

impl PermissionDef {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn key(&self) -> PermKey {
        PermKey::new(&self.category, &self.name)
    }

    pub fn get_attr(&self, key: &str) -> Option<&Attr> {
        self.attrs.iter().find(|attr| attr.key == key)
    }
}

impl Permission {
    pub fn key(&self) -> PermKey {
        PermKey::new(&self.category, &self.name)
    }

    pub fn is_ignored(&self) -> bool {
        IGNORED_GUARD_PERMISSIONS.contains(&self.guard_name.as_str())
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use super::*;

    #[test]
    fn perm_key() -> anyhow::Result<()> {
        let key = PermKey::from_str("Conduct/ListEntries")?;
        assert_eq!(key, PermKey::new("Conduct", "ListEntries"));
        assert_eq!(key.to_string(), "Conduct/ListEntries");
        assert_eq!(key.guard_name(), "Conduct.ListEntries");

        assert!(PermKey::from_str("Conduct").is_err());
        assert!(PermKey::from_str("/ListEntries").is_err());
        assert!(PermKey::from_str("Conduct/").is_err());
        assert!(PermKey::from_str("Conduct/List/Entries").is_err());
        Ok(())
    }

    #[test]
    fn ignored_permission() {
        let perm = Permission {
            id: 1,
            category: "Superuser".into(),
            name: "CanBeSuperuser".into(),
            guard_name: "Superuser.CanBeSuperuser".into(),
        };
        assert!(perm.is_ignored());
        let perm = Permission {
            id: 2,
            category: "Conduct".into(),
            name: "ListEntries".into(),
            guard_name: "Conduct.ListEntries".into(),
        };
        assert!(!perm.is_ignored());
    }

    #[test]
    fn attr_defaults() {
        let attr = Attr::string_list("Access", ["Own", "Any"], ["Own"]);
        assert_eq!(
            attr.default_or_empty(),
            AttributeValues::StringList(StringList::from_iter(["Own"])),
        );
        let attr = Attr::job_grade_list("Jobs");
        assert_eq!(
            attr.default_or_empty(),
            AttributeValues::JobGradeList(JobGradeList::default()),
        );
    }
}
