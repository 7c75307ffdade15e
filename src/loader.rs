use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use clap::Args;
use serde::Deserialize;

use crate::models::{AttendanceRecord, AttendanceStatus, Dataset, EventRecord, MarkRecord};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Locations of the three source tables.
#[derive(Debug, Clone, Args)]
pub struct DataSources {
    /// Attendance table (Student, Subject, Date, Status)
    #[arg(long, global = true, default_value = "attendance_dataset.csv")]
    pub attendance: PathBuf,
    /// Marks table (Student, Subject, Marks)
    #[arg(long, global = true, default_value = "marks_dataset.csv")]
    pub marks: PathBuf,
    /// Calendar events table (Event, Date, Subject)
    #[arg(long, global = true, default_value = "events.csv")]
    pub events: PathBuf,
}

#[derive(Deserialize)]
struct AttendanceRow {
    #[serde(rename = "Student")]
    student: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Deserialize)]
struct MarkRow {
    #[serde(rename = "Student")]
    student: String,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "Marks")]
    marks: f64,
}

#[derive(Deserialize)]
struct EventRow {
    #[serde(rename = "Event")]
    event: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Subject")]
    subject: String,
}

/// Loads all three tables. Any failure aborts the whole load.
pub fn load_dataset(sources: &DataSources) -> anyhow::Result<Dataset> {
    let attendance = read_attendance(open(&sources.attendance)?)
        .with_context(|| format!("failed to load {}", sources.attendance.display()))?;
    let marks = read_marks(open(&sources.marks)?)
        .with_context(|| format!("failed to load {}", sources.marks.display()))?;
    let events = read_events(open(&sources.events)?)
        .with_context(|| format!("failed to load {}", sources.events.display()))?;

    tracing::info!(
        attendance = attendance.len(),
        marks = marks.len(),
        events = events.len(),
        "dataset loaded"
    );

    Ok(Dataset {
        attendance,
        marks,
        events,
    })
}

fn open(path: &Path) -> anyhow::Result<std::fs::File> {
    std::fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub fn read_attendance<R: Read>(reader: R) -> anyhow::Result<Vec<AttendanceRecord>> {
    let mut reader = csv_reader(reader);
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<AttendanceRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("row {line}: bad attendance row"))?;
        let date = parse_date(&row.date).with_context(|| format!("row {line}: bad Date"))?;
        let status = parse_status(&row.status).with_context(|| format!("row {line}: bad Status"))?;
        records.push(AttendanceRecord {
            student: row.student,
            subject: row.subject,
            date,
            status,
        });
    }

    Ok(records)
}

pub fn read_marks<R: Read>(reader: R) -> anyhow::Result<Vec<MarkRecord>> {
    let mut reader = csv_reader(reader);
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<MarkRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("row {line}: bad mark row"))?;
        if !row.marks.is_finite() {
            anyhow::bail!("row {line}: bad Marks: expected a finite number, got `{}`", row.marks);
        }
        records.push(MarkRecord {
            student: row.student,
            subject: row.subject,
            marks: row.marks,
        });
    }

    Ok(records)
}

pub fn read_events<R: Read>(reader: R) -> anyhow::Result<Vec<EventRecord>> {
    let mut reader = csv_reader(reader);
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<EventRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("row {line}: bad event row"))?;
        let date = parse_date(&row.date).with_context(|| format!("row {line}: bad Date"))?;
        records.push(EventRecord {
            event: row.event,
            date,
            subject: row.subject,
        });
    }

    Ok(records)
}

/// Parses a date or date-time string, keeping only the calendar date.
pub fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    let value = value.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Ok(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.date_naive());
    }

    anyhow::bail!("unrecognized date `{value}`")
}

pub fn parse_status(value: &str) -> anyhow::Result<AttendanceStatus> {
    match value.trim() {
        "Present" => Ok(AttendanceStatus::Present),
        "Absent" => Ok(AttendanceStatus::Absent),
        _ => anyhow::bail!("expected Present or Absent, got `{value}`"),
    }
}
