use std::collections::BTreeMap;

use statrs::statistics::{Data, Max, Min, OrderStatistics};

use crate::models::{
    AttendanceRecord, AttendanceStatus, AttendanceSummary, Dataset, MarkRecord, StatusRatio,
    StudentAverage, SubjectDistribution,
};

/// Percentage of `Present` rows per (student, subject), ordered by student then subject.
pub fn attendance_percentages(records: &[AttendanceRecord]) -> Vec<AttendanceSummary> {
    let mut groups: BTreeMap<(&str, &str), (usize, usize)> = BTreeMap::new();

    for record in records {
        let entry = groups
            .entry((record.student.as_str(), record.subject.as_str()))
            .or_insert((0, 0));
        if record.status == AttendanceStatus::Present {
            entry.0 += 1;
        }
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((student, subject), (present, total))| AttendanceSummary {
            student: student.to_string(),
            subject: subject.to_string(),
            attendance_percent: 100.0 * present as f64 / total as f64,
        })
        .collect()
}

/// Summary over the attendance rows currently selected in the attendance tab.
pub fn filtered_attendance_summary(filtered: &[AttendanceRecord]) -> Vec<AttendanceSummary> {
    attendance_percentages(filtered)
}

/// Summary over the whole attendance table, ignoring any attendance filter.
/// Special-attention flags are computed from this so they do not move with
/// the attendance tab's selection.
pub fn full_attendance_summary(dataset: &Dataset) -> Vec<AttendanceSummary> {
    attendance_percentages(&dataset.attendance)
}

/// Present/absent split across all given rows. `None` when there are no rows.
pub fn status_ratio(records: &[AttendanceRecord]) -> Option<StatusRatio> {
    if records.is_empty() {
        return None;
    }

    let present = records
        .iter()
        .filter(|record| record.status == AttendanceStatus::Present)
        .count();
    let present_percent = 100.0 * present as f64 / records.len() as f64;

    Some(StatusRatio {
        present_percent,
        absent_percent: 100.0 - present_percent,
    })
}

pub fn average_marks_by_student(marks: &[MarkRecord]) -> Vec<StudentAverage> {
    let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();

    for record in marks {
        let entry = groups.entry(record.student.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.marks;
    }

    groups
        .into_iter()
        .map(|(student, (count, total))| StudentAverage {
            student: student.to_string(),
            average_marks: total / count as f64,
        })
        .collect()
}

/// Five-number summary of marks per subject, ordered by subject.
pub fn marks_distribution(marks: &[MarkRecord]) -> Vec<SubjectDistribution> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for record in marks {
        groups
            .entry(record.subject.as_str())
            .or_default()
            .push(record.marks);
    }

    groups
        .into_iter()
        .map(|(subject, values)| {
            let count = values.len();
            let mut sorted = values.clone();
            sorted.sort_by(f64::total_cmp);
            let mut data = Data::new(values);
            SubjectDistribution {
                subject: subject.to_string(),
                count,
                min: data.min(),
                lower_quartile: linear_quantile(&sorted, 0.25),
                median: data.quantile(0.5),
                upper_quartile: linear_quantile(&sorted, 0.75),
                max: data.max(),
            }
        })
        .collect()
}

/// Quantile by linear interpolation between the closest ranks of a sorted,
/// non-empty slice.
fn linear_quantile(sorted: &[f64], tau: f64) -> f64 {
    let position = tau * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}
