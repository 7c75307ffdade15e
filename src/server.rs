//! JSON API consumed by the dashboard front end.
//!
//! The dataset is loaded once and shared read-only. Every request carries its
//! own selections, so one operator's filters never affect another's views.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::dashboard;
use crate::filter::{FilterSelection, Selections};
use crate::models::{AttendanceView, DashboardView, Dataset, EventsView, FilterOptions, MarksView};

const REQUEST_ID_HEADER: &str = "x-request-id";

type Tagged<T> = ([(&'static str, String); 1], Json<T>);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self { host, port }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DashboardRequest {
    pub selections: Selections,
    /// Overrides the server's local date for the events tab.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub today: Option<NaiveDate>,
}

fn tagged<T>(request_id: Uuid, body: T) -> Tagged<T> {
    ([(REQUEST_ID_HEADER, request_id.to_string())], Json(body))
}

fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /options
async fn options(State(dataset): State<Arc<Dataset>>) -> Json<FilterOptions> {
    Json(dashboard::filter_options(&dataset))
}

/// POST /dashboard
async fn full_dashboard(
    State(dataset): State<Arc<Dataset>>,
    Json(request): Json<DashboardRequest>,
) -> Tagged<DashboardView> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("dashboard", %request_id);
    let _guard = span.enter();

    let view = dashboard::build_dashboard(
        &dataset,
        &request.selections,
        resolve_today(request.today),
    );
    tracing::debug!(
        attendance_rows = view.attendance.records.len(),
        mark_rows = view.marks.records.len(),
        "dashboard computed"
    );
    tagged(request_id, view)
}

/// POST /attendance
async fn attendance(
    State(dataset): State<Arc<Dataset>>,
    Json(selection): Json<FilterSelection>,
) -> Tagged<AttendanceView> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("attendance", %request_id);
    let _guard = span.enter();

    let view = dashboard::attendance_view(&dataset, &selection);
    tracing::debug!(rows = view.records.len(), low = view.low_attendance.len(), "attendance computed");
    tagged(request_id, view)
}

/// POST /marks
async fn marks(
    State(dataset): State<Arc<Dataset>>,
    Json(selection): Json<FilterSelection>,
) -> Tagged<MarksView> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("marks", %request_id);
    let _guard = span.enter();

    let view = dashboard::marks_view(&dataset, &selection);
    tracing::debug!(
        rows = view.records.len(),
        failing = view.failing.len(),
        flagged = !view.special_attention.is_all_clear(),
        "marks computed"
    );
    tagged(request_id, view)
}

/// GET /events
async fn events(
    State(dataset): State<Arc<Dataset>>,
    Query(query): Query<EventsQuery>,
) -> Tagged<EventsView> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("events", %request_id);
    let _guard = span.enter();

    let view = dashboard::events_view(&dataset, resolve_today(query.today));
    tracing::debug!(upcoming = view.upcoming.len(), "events computed");
    tagged(request_id, view)
}

pub fn router(dataset: Arc<Dataset>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/options", get(options))
        .route("/dashboard", post(full_dashboard))
        .route("/attendance", post(attendance))
        .route("/marks", post(marks))
        .route("/events", get(events))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(dataset)
}

/// Binds the API and serves it in the background until the returned sender fires.
pub async fn run(
    config: ServerConfig,
    dataset: Arc<Dataset>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(dataset);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Dashboard API listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceRecord, AttendanceStatus, EventRecord, MarkRecord};
    use serde_json::json;
    use std::net::Ipv4Addr;

    fn local() -> ServerConfig {
        ServerConfig::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn dataset() -> Arc<Dataset> {
        let attendance = |student: &str, d: u32, status| AttendanceRecord {
            student: student.to_string(),
            subject: "Math".to_string(),
            date: day(d),
            status,
        };
        Arc::new(Dataset {
            attendance: vec![
                attendance("A", 1, AttendanceStatus::Present),
                attendance("A", 2, AttendanceStatus::Absent),
                attendance("B", 1, AttendanceStatus::Present),
            ],
            marks: vec![
                MarkRecord {
                    student: "A".to_string(),
                    subject: "Math".to_string(),
                    marks: 30.0,
                },
                MarkRecord {
                    student: "B".to_string(),
                    subject: "Math".to_string(),
                    marks: 90.0,
                },
            ],
            events: vec![
                EventRecord {
                    event: "Quiz".to_string(),
                    date: day(13),
                    subject: "Math".to_string(),
                },
                EventRecord {
                    event: "Final".to_string(),
                    date: day(20),
                    subject: "Math".to_string(),
                },
            ],
        })
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (addr, shutdown_tx) = run(local(), dataset())
            .await
            .expect("Failed to start server");

        let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn dashboard_applies_request_selections() {
        let (addr, shutdown_tx) = run(local(), dataset())
            .await
            .expect("Failed to start server");
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{}/dashboard", addr))
            .json(&json!({
                "selections": {
                    "attendance": { "students": { "only": ["B"] } }
                },
                "today": "2024-01-10"
            }))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["attendance"]["records"].as_array().unwrap().len(), 1);
        assert_eq!(body["marks"]["special_attention"]["status"], "flagged");
        assert_eq!(body["events"]["near_deadline"][0]["event"], "Quiz");

        // A second request without selections sees the unfiltered view.
        let body: serde_json::Value = client
            .post(format!("http://{}/dashboard", addr))
            .json(&json!({}))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["attendance"]["records"].as_array().unwrap().len(), 3);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn options_and_events_endpoints() {
        let (addr, shutdown_tx) = run(local(), dataset())
            .await
            .expect("Failed to start server");

        let options: serde_json::Value = reqwest::get(format!("http://{}/options", addr))
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(options["marks"]["students"], json!(["A", "B"]));

        let events: serde_json::Value =
            reqwest::get(format!("http://{}/events?today=2024-01-15", addr))
                .await
                .expect("Failed to send request")
                .json()
                .await
                .expect("Failed to parse JSON");
        assert_eq!(events["upcoming"].as_array().unwrap().len(), 1);
        assert_eq!(events["near_deadline"][0]["event"], "Final");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn marks_endpoint_reports_all_clear() {
        let (addr, shutdown_tx) = run(local(), dataset())
            .await
            .expect("Failed to start server");

        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("http://{}/marks", addr))
            .json(&json!({ "students": { "only": ["B"] } }))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["special_attention"]["status"], "all_clear");
        assert!(body["failing"].as_array().unwrap().is_empty());

        let _ = shutdown_tx.send(());
    }
}
