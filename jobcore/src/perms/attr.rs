//! Typed attribute values.
//!
//! Each variant of `AttributeValues` corresponds to one `AttrValueType`;
//! callers match on the variant (or use the `into_*` accessors) rather
//! than inspecting untyped values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::error::ValueError;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum AttrValueType {
    StringList,
    JobList,
    JobGradeList,
}

/// An ordered list of distinct strings.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct StringList {
    pub strings: Vec<String>,
}

/// The highest permitted grade for each job.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct JobGradeList {
    pub jobs: BTreeMap<String, i32>,
}

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum AttributeValues {
    StringList(StringList),
    JobList(StringList),
    JobGradeList(JobGradeList),
}

impl StringList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.strings.iter().any(|s| s == value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.strings.iter()
    }

    /// Appends the value unless already present.
    pub fn insert(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.contains(&value) {
            self.strings.push(value);
        }
    }

    pub fn is_subset_of(&self, other: &StringList) -> bool {
        self.iter().all(|s| other.contains(s))
    }
}

impl<S: Into<String>> FromIterator<S> for StringList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        iter.into_iter()
            .fold(StringList::new(), |mut list, value| {
                list.insert(value);
                list
            })
    }
}

impl<'a> IntoIterator for &'a StringList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.strings.iter()
    }
}

impl JobGradeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn grade(&self, job: &str) -> Option<i32> {
        self.jobs.get(job).copied()
    }

    /// Whether the given grade of the job is within the permitted grade.
    pub fn contains(&self, job: &str, grade: i32) -> bool {
        self.grade(job)
            .map(|max| grade <= max)
            .unwrap_or(false)
    }

    /// Records the grade for the job, keeping the higher grade if the
    /// job is already present.
    pub fn insert(&mut self, job: impl Into<String>, grade: i32) {
        self.jobs
            .entry(job.into())
            .and_modify(|current| *current = (*current).max(grade))
            .or_insert(grade);
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for JobGradeList {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(JobGradeList::new(), |mut list, (job, grade)| {
                list.insert(job, grade);
                list
            })
    }
}

impl AttrValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttrValueType::StringList => "StringList",
            AttrValueType::JobList => "JobList",
            AttrValueType::JobGradeList => "JobGradeList",
        }
    }
}

impl AttributeValues {
    pub fn empty(value_type: AttrValueType) -> Self {
        match value_type {
            AttrValueType::StringList => AttributeValues::StringList(StringList::new()),
            AttrValueType::JobList => AttributeValues::JobList(StringList::new()),
            AttrValueType::JobGradeList => AttributeValues::JobGradeList(JobGradeList::new()),
        }
    }

    pub fn value_type(&self) -> AttrValueType {
        match self {
            AttributeValues::StringList(_) => AttrValueType::StringList,
            AttributeValues::JobList(_) => AttrValueType::JobList,
            AttributeValues::JobGradeList(_) => AttrValueType::JobGradeList,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AttributeValues::StringList(v) | AttributeValues::JobList(v) => v.len(),
            AttributeValues::JobGradeList(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mismatch(&self, expected: AttrValueType) -> ValueError {
        ValueError::TypeMismatch {
            expected: expected.as_str(),
            found: self.value_type().as_str(),
        }
    }

    /// Checks that this value is of the expected type and, when a
    /// non-empty whitelist is provided, within that whitelist.
    pub fn validate(
        &self,
        value_type: AttrValueType,
        valid: Option<&AttributeValues>,
    ) -> Result<(), ValueError> {
        if self.value_type() != value_type {
            return Err(self.mismatch(value_type));
        }
        let valid = match valid {
            Some(valid) if !valid.is_empty() => valid,
            _ => return Ok(()),
        };
        match (self, valid) {
            (AttributeValues::StringList(v), AttributeValues::StringList(allowed))
            | (AttributeValues::JobList(v), AttributeValues::JobList(allowed)) => {
                match v.iter().find(|s| !allowed.contains(s)) {
                    Some(s) => Err(ValueError::Unsupported(s.clone())),
                    None => Ok(()),
                }
            }
            (AttributeValues::JobGradeList(v), AttributeValues::JobGradeList(allowed)) => {
                match v.jobs.iter().find(|(job, grade)| !allowed.contains(job, **grade)) {
                    Some((job, grade)) => Err(ValueError::Unsupported(format!("{job}:{grade}"))),
                    None => Ok(()),
                }
            }
            (_, valid) => Err(valid.mismatch(value_type)),
        }
    }

    /// Combines the values granted by two roles into the loosest of the
    /// two: the union for lists, the highest grade per job for grade
    /// lists.  Values of differing types are not combined and `self` is
    /// returned unchanged.
    pub fn merge(self, other: AttributeValues) -> AttributeValues {
        match (self, other) {
            (AttributeValues::StringList(mut a), AttributeValues::StringList(b)) => {
                b.strings.into_iter().for_each(|s| a.insert(s));
                AttributeValues::StringList(a)
            }
            (AttributeValues::JobList(mut a), AttributeValues::JobList(b)) => {
                b.strings.into_iter().for_each(|s| a.insert(s));
                AttributeValues::JobList(a)
            }
            (AttributeValues::JobGradeList(mut a), AttributeValues::JobGradeList(b)) => {
                b.jobs.into_iter().for_each(|(job, grade)| a.insert(job, grade));
                AttributeValues::JobGradeList(a)
            }
            (a, b) => {
                log::warn!(
                    "refusing to merge attribute of type {} into {}",
                    b.value_type().as_str(),
                    a.value_type().as_str(),
                );
                a
            }
        }
    }

    pub fn into_string_list(self) -> Result<StringList, ValueError> {
        match self {
            AttributeValues::StringList(v) => Ok(v),
            other => Err(other.mismatch(AttrValueType::StringList)),
        }
    }

    pub fn into_job_list(self) -> Result<StringList, ValueError> {
        match self {
            AttributeValues::JobList(v) => Ok(v),
            other => Err(other.mismatch(AttrValueType::JobList)),
        }
    }

    pub fn into_job_grade_list(self) -> Result<JobGradeList, ValueError> {
        match self {
            AttributeValues::JobGradeList(v) => Ok(v),
            other => Err(other.mismatch(AttrValueType::JobGradeList)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn string_list() {
        let list = StringList::from_iter(["Own", "Any", "Own"]);
        assert_eq!(list.len(), 2);
        assert!(list.contains("Own"));
        assert!(!list.contains("Lower_Rank"));
        assert!(StringList::new().is_empty());
    }

    #[test]
    fn job_grade_list() {
        let list = JobGradeList::from_iter([("ambulance", 2), ("police", 5), ("ambulance", 1)]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.grade("ambulance"), Some(2));
        assert!(list.contains("police", 5));
        assert!(list.contains("police", 0));
        assert!(!list.contains("police", 6));
        assert!(!list.contains("mechanic", 0));
    }

    #[test]
    fn merge_lists() {
        let a = AttributeValues::StringList(StringList::from_iter(["Own"]));
        let b = AttributeValues::StringList(StringList::from_iter(["Same_Rank", "Own"]));
        assert_eq!(
            a.merge(b),
            AttributeValues::StringList(StringList::from_iter(["Own", "Same_Rank"])),
        );

        let a = AttributeValues::JobGradeList(JobGradeList::from_iter([("ambulance", 1), ("police", 4)]));
        let b = AttributeValues::JobGradeList(JobGradeList::from_iter([("ambulance", 3), ("mechanic", 0)]));
        assert_eq!(
            a.merge(b),
            AttributeValues::JobGradeList(JobGradeList::from_iter([
                ("ambulance", 3),
                ("mechanic", 0),
                ("police", 4),
            ])),
        );
    }

    #[test]
    fn merge_mismatched() {
        let a = AttributeValues::StringList(StringList::from_iter(["Own"]));
        let b = AttributeValues::JobList(StringList::from_iter(["police"]));
        assert_eq!(a.clone().merge(b), a);
    }

    #[test]
    fn validate() {
        let valid = AttributeValues::StringList(StringList::from_iter(["Own", "Same_Rank", "Any"]));
        let value = AttributeValues::StringList(StringList::from_iter(["Own", "Any"]));
        assert!(value.validate(AttrValueType::StringList, Some(&valid)).is_ok());
        assert!(value.validate(AttrValueType::StringList, None).is_ok());

        let value = AttributeValues::StringList(StringList::from_iter(["Own", "Everyone"]));
        assert!(matches!(
            value.validate(AttrValueType::StringList, Some(&valid)),
            Err(ValueError::Unsupported(s)) if s == "Everyone",
        ));

        // an empty whitelist leaves the attribute unconstrained
        let empty = AttributeValues::StringList(StringList::new());
        assert!(value.validate(AttrValueType::StringList, Some(&empty)).is_ok());

        assert!(matches!(
            value.validate(AttrValueType::JobList, None),
            Err(ValueError::TypeMismatch { expected: "JobList", found: "StringList" }),
        ));

        let valid = AttributeValues::JobGradeList(JobGradeList::from_iter([("ambulance", 3)]));
        let value = AttributeValues::JobGradeList(JobGradeList::from_iter([("ambulance", 2)]));
        assert!(value.validate(AttrValueType::JobGradeList, Some(&valid)).is_ok());
        let value = AttributeValues::JobGradeList(JobGradeList::from_iter([("ambulance", 4)]));
        assert!(value.validate(AttrValueType::JobGradeList, Some(&valid)).is_err());
    }

    #[test]
    fn typed_accessors() -> anyhow::Result<()> {
        let value = AttributeValues::StringList(StringList::from_iter(["Own"]));
        assert_eq!(value.clone().into_string_list()?.len(), 1);
        assert!(value.into_job_grade_list().is_err());
        Ok(())
    }

    #[test]
    fn serde() -> anyhow::Result<()> {
        let value: AttributeValues = serde_json::from_str(r#"{"JobGradeList": {"ambulance": 2}}"#)?;
        assert_eq!(
            value,
            AttributeValues::JobGradeList(JobGradeList::from_iter([("ambulance", 2)])),
        );
        assert_eq!(
            serde_json::to_string(&AttributeValues::StringList(StringList::from_iter(["Own"])))?,
            r#"{"StringList":["Own"]}"#,
        );
        Ok(())
    }
}
