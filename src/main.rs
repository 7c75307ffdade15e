use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod alerts;
mod dashboard;
mod filter;
mod loader;
mod models;
mod report;
mod server;

use filter::{FilterSelection, Selection, Selections};
use loader::DataSources;

#[derive(Parser)]
#[command(name = "student-dashboard")]
#[command(about = "Attendance, marks and deadline dashboard for a class", long_about = None)]
struct Cli {
    #[command(flatten)]
    sources: DataSources,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show attendance percentages and low-attendance alerts
    Attendance {
        #[command(flatten)]
        filter: TabFilter,
        #[arg(long)]
        json: bool,
    },
    /// Show marks, averages, distribution and special-attention flags
    Marks {
        #[command(flatten)]
        filter: TabFilter,
        #[arg(long)]
        json: bool,
    },
    /// Show upcoming events and near deadlines
    Events {
        /// Date to treat as today (defaults to the local date)
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report covering every tab
    Report {
        /// Attendance tab: restrict to these students
        #[arg(long = "attendance-student")]
        attendance_students: Vec<String>,
        /// Attendance tab: restrict to these subjects
        #[arg(long = "attendance-subject")]
        attendance_subjects: Vec<String>,
        /// Marks tab: restrict to these students
        #[arg(long = "marks-student")]
        marks_students: Vec<String>,
        /// Marks tab: restrict to these subjects
        #[arg(long = "marks-subject")]
        marks_subjects: Vec<String>,
        #[arg(long)]
        today: Option<NaiveDate>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Serve the dashboard views as a JSON API
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, env = "PORT", default_value_t = 8501)]
        port: u16,
    },
}

/// Student and subject restriction for a single tab. No values means all.
#[derive(Args)]
struct TabFilter {
    /// Restrict to these students (repeatable)
    #[arg(long = "student")]
    students: Vec<String>,
    /// Restrict to these subjects (repeatable)
    #[arg(long = "subject")]
    subjects: Vec<String>,
}

impl TabFilter {
    fn selection(self) -> FilterSelection {
        selection(self.students, self.subjects)
    }
}

fn selection(students: Vec<String>, subjects: Vec<String>) -> FilterSelection {
    FilterSelection {
        students: Selection::from_values(students),
        subjects: Selection::from_values(subjects),
    }
}

fn today_or_local(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let dataset = loader::load_dataset(&cli.sources).context("dashboard data could not be loaded")?;

    match cli.command {
        Commands::Attendance { filter, json } => {
            let view = dashboard::attendance_view(&dataset, &filter.selection());
            if json {
                print_json(&view)?;
            } else {
                print!("{}", report::render_attendance(&view));
            }
        }
        Commands::Marks { filter, json } => {
            let view = dashboard::marks_view(&dataset, &filter.selection());
            if json {
                print_json(&view)?;
            } else {
                print!("{}", report::render_marks(&view));
            }
        }
        Commands::Events { today, json } => {
            let view = dashboard::events_view(&dataset, today_or_local(today));
            if json {
                print_json(&view)?;
            } else {
                print!("{}", report::render_events(&view));
            }
        }
        Commands::Report {
            attendance_students,
            attendance_subjects,
            marks_students,
            marks_subjects,
            today,
            out,
        } => {
            let today = today_or_local(today);
            let selections = Selections {
                attendance: selection(attendance_students, attendance_subjects),
                marks: selection(marks_students, marks_subjects),
            };
            tracing::info!(
                attendance_students = %selections.attendance.students.label(),
                attendance_subjects = %selections.attendance.subjects.label(),
                marks_students = %selections.marks.students.label(),
                marks_subjects = %selections.marks.subjects.label(),
                "building report"
            );
            let view = dashboard::build_dashboard(&dataset, &selections, today);
            let report = report::build_report(&view, today);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Serve { host, port } => {
            let config = server::ServerConfig::new(host, port);
            let (addr, shutdown_tx) = server::run(config, Arc::new(dataset)).await?;
            println!("Serving dashboard API on http://{addr} (Ctrl-C to stop).");
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for shutdown signal")?;
            let _ = shutdown_tx.send(());
        }
    }

    Ok(())
}
