use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub student: String,
    pub subject: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkRecord {
    pub student: String,
    pub subject: String,
    pub marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub event: String,
    pub date: NaiveDate,
    pub subject: String,
}

/// The three source tables, loaded once and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub attendance: Vec<AttendanceRecord>,
    pub marks: Vec<MarkRecord>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceSummary {
    pub student: String,
    pub subject: String,
    pub attendance_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRatio {
    pub present_percent: f64,
    pub absent_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentAverage {
    pub student: String,
    pub average_marks: f64,
}

/// Box-plot summary of one subject's marks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectDistribution {
    pub subject: String,
    pub count: usize,
    pub min: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub max: f64,
}

/// A mark row left-joined with the attendance summary of the same pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedMark {
    pub student: String,
    pub subject: String,
    pub marks: f64,
    pub attendance_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub student: String,
    pub subject: String,
    pub attendance_percent: f64,
    pub marks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SpecialAttention {
    AllClear,
    Flagged {
        rows: Vec<MergedMark>,
        scatter: Vec<ScatterPoint>,
    },
}

impl SpecialAttention {
    pub fn is_all_clear(&self) -> bool {
        matches!(self, SpecialAttention::AllClear)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceView {
    pub records: Vec<AttendanceRecord>,
    pub summary: Vec<AttendanceSummary>,
    pub status_ratio: Option<StatusRatio>,
    pub low_attendance: Vec<AttendanceSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarksView {
    pub records: Vec<MarkRecord>,
    pub failing: Vec<MarkRecord>,
    pub averages: Vec<StudentAverage>,
    pub distribution: Vec<SubjectDistribution>,
    pub special_attention: SpecialAttention,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventsView {
    pub today: NaiveDate,
    pub upcoming: Vec<EventRecord>,
    pub near_deadline: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub attendance: AttendanceView,
    pub marks: MarksView,
    pub events: EventsView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainOptions {
    pub students: Vec<String>,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub attendance: DomainOptions,
    pub marks: DomainOptions,
}
