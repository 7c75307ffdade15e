use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::models::{
    AttendanceSummary, EventRecord, MarkRecord, MergedMark, ScatterPoint, SpecialAttention,
};

pub const LOW_ATTENDANCE_THRESHOLD: f64 = 75.0;
pub const FAILING_MARK_THRESHOLD: f64 = 40.0;
pub const DEADLINE_WINDOW_DAYS: i64 = 7;

pub fn low_attendance(summaries: &[AttendanceSummary]) -> Vec<AttendanceSummary> {
    summaries
        .iter()
        .filter(|summary| summary.attendance_percent < LOW_ATTENDANCE_THRESHOLD)
        .cloned()
        .collect()
}

pub fn failing_marks(marks: &[MarkRecord]) -> Vec<MarkRecord> {
    marks
        .iter()
        .filter(|record| record.marks < FAILING_MARK_THRESHOLD)
        .cloned()
        .collect()
}

/// Left join of marks with attendance summaries on (student, subject).
pub fn merge_marks_with_attendance(
    marks: &[MarkRecord],
    summaries: &[AttendanceSummary],
) -> Vec<MergedMark> {
    let lookup: HashMap<(&str, &str), f64> = summaries
        .iter()
        .map(|s| ((s.student.as_str(), s.subject.as_str()), s.attendance_percent))
        .collect();

    marks
        .iter()
        .map(|record| MergedMark {
            student: record.student.clone(),
            subject: record.subject.clone(),
            marks: record.marks,
            attendance_percent: lookup
                .get(&(record.student.as_str(), record.subject.as_str()))
                .copied(),
        })
        .collect()
}

/// Flags pairs that are failing and poorly attended at the same time.
///
/// `summaries` must come from the full attendance table. A mark without an
/// attendance summary is never flagged.
pub fn special_attention(marks: &[MarkRecord], summaries: &[AttendanceSummary]) -> SpecialAttention {
    let merged = merge_marks_with_attendance(marks, summaries);

    let rows: Vec<MergedMark> = merged
        .iter()
        .filter(|row| {
            row.marks < FAILING_MARK_THRESHOLD
                && row
                    .attendance_percent
                    .is_some_and(|percent| percent < LOW_ATTENDANCE_THRESHOLD)
        })
        .cloned()
        .collect();

    if rows.is_empty() {
        return SpecialAttention::AllClear;
    }

    let scatter = merged
        .iter()
        .filter_map(|row| {
            row.attendance_percent.map(|attendance_percent| ScatterPoint {
                student: row.student.clone(),
                subject: row.subject.clone(),
                attendance_percent,
                marks: row.marks,
            })
        })
        .collect();

    SpecialAttention::Flagged { rows, scatter }
}

/// Events on or after `today`, earliest first.
pub fn upcoming_events(events: &[EventRecord], today: NaiveDate) -> Vec<EventRecord> {
    let mut upcoming: Vec<EventRecord> = events
        .iter()
        .filter(|event| event.date >= today)
        .cloned()
        .collect();
    upcoming.sort_by_key(|event| event.date);
    upcoming
}

/// Upcoming events no later than `today + DEADLINE_WINDOW_DAYS`. An empty
/// result is simply nothing to flag.
pub fn near_deadline(upcoming: &[EventRecord], today: NaiveDate) -> Vec<EventRecord> {
    let horizon = today + Duration::days(DEADLINE_WINDOW_DAYS);
    upcoming
        .iter()
        .filter(|event| event.date >= today && event.date <= horizon)
        .cloned()
        .collect()
}
