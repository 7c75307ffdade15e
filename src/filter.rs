use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::{AttendanceRecord, DomainOptions, MarkRecord};

/// Selection on one categorical dimension.
///
/// `All` leaves the dimension unrestricted. `Only` keeps rows whose value is
/// in the set; an empty set keeps nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }

    /// `All` when no values are given, otherwise `Only(values)`. Used by the CLI
    /// where an absent flag means no restriction.
    pub fn from_values(values: Vec<String>) -> Self {
        if values.is_empty() {
            Selection::All
        } else {
            Selection::only(values)
        }
    }

    pub fn allows(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(values) => values.contains(value),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Selection::All => "all".to_string(),
            Selection::Only(values) if values.is_empty() => "none".to_string(),
            Selection::Only(values) => values.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSelection {
    pub students: Selection,
    pub subjects: Selection,
}

/// Attendance and marks are filtered independently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selections {
    pub attendance: FilterSelection,
    pub marks: FilterSelection,
}

pub trait StudentSubject {
    fn student(&self) -> &str;
    fn subject(&self) -> &str;
}

impl StudentSubject for AttendanceRecord {
    fn student(&self) -> &str {
        &self.student
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}

impl StudentSubject for MarkRecord {
    fn student(&self) -> &str {
        &self.student
    }

    fn subject(&self) -> &str {
        &self.subject
    }
}

pub fn filter_records<T>(records: &[T], selection: &FilterSelection) -> Vec<T>
where
    T: StudentSubject + Clone,
{
    records
        .iter()
        .filter(|record| {
            selection.students.allows(record.student())
                && selection.subjects.allows(record.subject())
        })
        .cloned()
        .collect()
}

pub fn filter_attendance(
    records: &[AttendanceRecord],
    selection: &FilterSelection,
) -> Vec<AttendanceRecord> {
    filter_records(records, selection)
}

pub fn filter_marks(records: &[MarkRecord], selection: &FilterSelection) -> Vec<MarkRecord> {
    filter_records(records, selection)
}

/// Distinct students in order of first appearance.
pub fn distinct_students<T: StudentSubject>(records: &[T]) -> Vec<String> {
    distinct(records.iter().map(StudentSubject::student))
}

/// Distinct subjects in order of first appearance.
pub fn distinct_subjects<T: StudentSubject>(records: &[T]) -> Vec<String> {
    distinct(records.iter().map(StudentSubject::subject))
}

pub fn domain_options<T: StudentSubject>(records: &[T]) -> DomainOptions {
    DomainOptions {
        students: distinct_students(records),
        subjects: distinct_subjects(records),
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}
