//! Derived views as pure functions of the loaded dataset and the current
//! selections. Nothing here mutates the dataset or keeps state between calls.

use chrono::NaiveDate;

use crate::aggregate;
use crate::alerts;
use crate::filter::{self, FilterSelection, Selections};
use crate::models::{
    AttendanceView, DashboardView, Dataset, EventsView, FilterOptions, MarksView,
};

pub fn attendance_view(dataset: &Dataset, selection: &FilterSelection) -> AttendanceView {
    let records = filter::filter_attendance(&dataset.attendance, selection);
    let summary = aggregate::filtered_attendance_summary(&records);
    let status_ratio = aggregate::status_ratio(&records);
    let low_attendance = alerts::low_attendance(&summary);

    AttendanceView {
        records,
        summary,
        status_ratio,
        low_attendance,
    }
}

pub fn marks_view(dataset: &Dataset, selection: &FilterSelection) -> MarksView {
    let records = filter::filter_marks(&dataset.marks, selection);
    let failing = alerts::failing_marks(&records);
    let averages = aggregate::average_marks_by_student(&records);
    let distribution = aggregate::marks_distribution(&records);
    let cohort_attendance = aggregate::full_attendance_summary(dataset);
    let special_attention = alerts::special_attention(&records, &cohort_attendance);

    MarksView {
        records,
        failing,
        averages,
        distribution,
        special_attention,
    }
}

pub fn events_view(dataset: &Dataset, today: NaiveDate) -> EventsView {
    let upcoming = alerts::upcoming_events(&dataset.events, today);
    let near_deadline = alerts::near_deadline(&upcoming, today);

    EventsView {
        today,
        upcoming,
        near_deadline,
    }
}

pub fn build_dashboard(dataset: &Dataset, selections: &Selections, today: NaiveDate) -> DashboardView {
    DashboardView {
        attendance: attendance_view(dataset, &selections.attendance),
        marks: marks_view(dataset, &selections.marks),
        events: events_view(dataset, today),
    }
}

/// Values offered by each tab's student and subject selectors.
pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    FilterOptions {
        attendance: filter::domain_options(&dataset.attendance),
        marks: filter::domain_options(&dataset.marks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Selection;
    use crate::models::{AttendanceRecord, AttendanceStatus, EventRecord, MarkRecord, SpecialAttention};
    use chrono::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn attendance(student: &str, subject: &str, d: u32, present: bool) -> AttendanceRecord {
        AttendanceRecord {
            student: student.to_string(),
            subject: subject.to_string(),
            date: day(d),
            status: if present {
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            },
        }
    }

    fn mark(student: &str, subject: &str, marks: f64) -> MarkRecord {
        MarkRecord {
            student: student.to_string(),
            subject: subject.to_string(),
            marks,
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            attendance: vec![
                attendance("A", "Math", 1, true),
                attendance("A", "Math", 2, false),
                attendance("B", "Math", 1, true),
                attendance("B", "Math", 2, true),
                attendance("B", "Science", 1, false),
            ],
            marks: vec![
                mark("A", "Math", 30.0),
                mark("B", "Math", 90.0),
                mark("B", "Science", 35.0),
                mark("C", "Math", 10.0),
            ],
            events: vec![
                EventRecord {
                    event: "Final".to_string(),
                    date: day(20),
                    subject: "Math".to_string(),
                },
                EventRecord {
                    event: "Quiz".to_string(),
                    date: day(13),
                    subject: "Math".to_string(),
                },
            ],
        }
    }

    #[test]
    fn attendance_view_reflects_selection() {
        let selection = FilterSelection {
            students: Selection::only(["A"]),
            subjects: Selection::All,
        };
        let view = attendance_view(&dataset(), &selection);
        assert_eq!(view.records.len(), 2);
        assert_eq!(view.summary.len(), 1);
        assert_eq!(view.low_attendance.len(), 1);
        assert!((view.status_ratio.unwrap().present_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_selection_produces_empty_views() {
        let selection = FilterSelection {
            students: Selection::only(Vec::<String>::new()),
            subjects: Selection::All,
        };
        let attendance = attendance_view(&dataset(), &selection);
        assert!(attendance.records.is_empty());
        assert!(attendance.summary.is_empty());
        assert!(attendance.status_ratio.is_none());
        assert!(attendance.low_attendance.is_empty());

        let marks = marks_view(&dataset(), &selection);
        assert!(marks.records.is_empty());
        assert!(marks.averages.is_empty());
        assert!(marks.distribution.is_empty());
        assert!(marks.special_attention.is_all_clear());
    }

    #[test]
    fn special_attention_ignores_attendance_selection() {
        let data = dataset();
        let selections = Selections {
            attendance: FilterSelection {
                students: Selection::only(["B"]),
                subjects: Selection::All,
            },
            marks: FilterSelection::default(),
        };
        let view = build_dashboard(&data, &selections, day(10));

        let SpecialAttention::Flagged { rows, .. } = &view.marks.special_attention else {
            panic!("expected flagged rows");
        };
        let flagged: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.student.as_str(), r.subject.as_str()))
            .collect();
        // A/Math is 50% and B/Science is 0%; C has no attendance rows at all.
        assert_eq!(flagged, vec![("A", "Math"), ("B", "Science")]);
    }

    #[test]
    fn events_view_uses_given_day() {
        let view = events_view(&dataset(), day(10));
        assert_eq!(view.upcoming.len(), 2);
        assert_eq!(view.upcoming[0].event, "Quiz");
        assert_eq!(view.near_deadline.len(), 1);

        let later = events_view(&dataset(), day(10) + Duration::days(11));
        assert!(later.upcoming.is_empty());
        assert!(later.near_deadline.is_empty());
    }

    #[test]
    fn options_are_per_domain() {
        let options = filter_options(&dataset());
        assert_eq!(options.attendance.students, vec!["A", "B"]);
        assert_eq!(options.marks.students, vec!["A", "B", "C"]);
        assert_eq!(options.attendance.subjects, vec!["Math", "Science"]);
    }
}
