use std::fmt::Write;

use chrono::NaiveDate;

use crate::alerts::{DEADLINE_WINDOW_DAYS, FAILING_MARK_THRESHOLD, LOW_ATTENDANCE_THRESHOLD};
use crate::models::{AttendanceView, DashboardView, EventsView, MarksView, SpecialAttention};

pub fn render_attendance(view: &AttendanceView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Attendance");
    let _ = writeln!(output, "{} attendance rows in view.", view.records.len());
    let _ = writeln!(output);
    let _ = writeln!(output, "### Attendance % by Student and Subject");

    if view.summary.is_empty() {
        let _ = writeln!(output, "No attendance recorded for this selection.");
    } else {
        for row in view.summary.iter() {
            let _ = writeln!(
                output,
                "- {} / {}: {:.1}%",
                row.student, row.subject, row.attendance_percent
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Present vs Absent");
    match &view.status_ratio {
        Some(ratio) => {
            let _ = writeln!(
                output,
                "Present {:.1}% / Absent {:.1}%",
                ratio.present_percent, ratio.absent_percent
            );
        }
        None => {
            let _ = writeln!(output, "No attendance recorded for this selection.");
        }
    }

    if !view.low_attendance.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "### Warning: attendance below {}%",
            LOW_ATTENDANCE_THRESHOLD
        );
        for row in view.low_attendance.iter() {
            let _ = writeln!(
                output,
                "- {} / {}: {:.1}%",
                row.student, row.subject, row.attendance_percent
            );
        }
    }

    output
}

pub fn render_marks(view: &MarksView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Marks");
    let _ = writeln!(output, "{} mark rows in view.", view.records.len());

    if !view.failing.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### Warning: marks below {}", FAILING_MARK_THRESHOLD);
        for record in view.failing.iter() {
            let _ = writeln!(
                output,
                "- {} / {}: {}",
                record.student, record.subject, record.marks
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Average Marks per Student");
    if view.averages.is_empty() {
        let _ = writeln!(output, "No marks recorded for this selection.");
    } else {
        for average in view.averages.iter() {
            let _ = writeln!(output, "- {}: {:.2}", average.student, average.average_marks);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Subject-wise Marks Distribution");
    if view.distribution.is_empty() {
        let _ = writeln!(output, "No marks recorded for this selection.");
    } else {
        for subject in view.distribution.iter() {
            let _ = writeln!(
                output,
                "- {} ({} marks): min {} / q1 {:.1} / median {:.1} / q3 {:.1} / max {}",
                subject.subject,
                subject.count,
                subject.min,
                subject.lower_quartile,
                subject.median,
                subject.upper_quartile,
                subject.max
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "### Students Needing Special Attention");
    match &view.special_attention {
        SpecialAttention::AllClear => {
            let _ = writeln!(output, "No students currently flagged for special attention.");
        }
        SpecialAttention::Flagged { rows, .. } => {
            let _ = writeln!(output, "Low marks and low attendance:");
            for row in rows.iter() {
                let _ = writeln!(
                    output,
                    "- {} / {}: marks {}, attendance {:.1}%",
                    row.student,
                    row.subject,
                    row.marks,
                    row.attendance_percent.unwrap_or_default()
                );
            }
        }
    }

    output
}

pub fn render_events(view: &EventsView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Upcoming Exams & Assignments");
    if view.upcoming.is_empty() {
        let _ = writeln!(output, "No upcoming events on or after {}.", view.today);
    } else {
        for event in view.upcoming.iter() {
            let _ = writeln!(output, "- {} {} ({})", event.date, event.event, event.subject);
        }
    }

    if !view.near_deadline.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "### Warning: deadlines within {} days",
            DEADLINE_WINDOW_DAYS
        );
        for event in view.near_deadline.iter() {
            let _ = writeln!(output, "- {} {} ({})", event.date, event.event, event.subject);
        }
    }

    output
}

pub fn build_report(view: &DashboardView, today: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Student Dashboard Report");
    let _ = writeln!(output, "Generated on {}", today);
    let _ = writeln!(output);
    output.push_str(&render_attendance(&view.attendance));
    let _ = writeln!(output);
    output.push_str(&render_marks(&view.marks));
    let _ = writeln!(output);
    output.push_str(&render_events(&view.events));

    output
}
