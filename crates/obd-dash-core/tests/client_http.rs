use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use obd_dash_core::client::{
    ClientError, FetchOptions, Session, SessionState, TearDownReason, TelemetryClient,
};
use obd_dash_core::config::Config;
use obd_dash_core::dashboard::{DashboardViewModel, Screen};
use obd_dash_core::reading::SensorField;
use obd_dash_core::upload::UploadFile;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// What the fake backend saw for one request
#[derive(Debug, Clone, Default)]
struct Seen {
    authorization: Option<String>,
    content_type: Option<String>,
    query: Option<String>,
    body: Vec<u8>,
}

#[derive(Clone, Default)]
struct Backend {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Backend {
    fn record(&self, headers: &HeaderMap, query: Option<String>, body: &[u8]) {
        let header = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(Seen {
            authorization: header(header::AUTHORIZATION),
            content_type: header(header::CONTENT_TYPE),
            query,
            body: body.to_vec(),
        });
    }

    fn last(&self) -> Seen {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

async fn data(
    State(backend): State<Backend>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    backend.record(&headers, query, &[]);
    Json(json!({
        "data": [
            {"timestamp": "2025-10-21T10:00:04", "speed": 42.5, "rpm": "1800", "cool_temp": null},
            {"timestamp": "2025-10-21T10:00:02", "speed": 40, "rpm": "n/a", "obd_extra": 1},
        ]
    }))
}

async fn delete_data(
    State(backend): State<Backend>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    backend.record(&headers, query, &[]);
    Json(json!({ "deleted": 17 }))
}

async fn upload(State(backend): State<Backend>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    backend.record(&headers, None, &body);
    (
        StatusCode::MULTI_STATUS,
        Json(json!({
            "message": "File upload completed",
            "summary": {
                "total_files_processed": 2,
                "total_rows_processed": 2,
                "successful_files": 1,
                "failed_files": 1,
            },
            "success": [{"file": "21-10-2025.csv", "rows_processed": 2, "date": "21-10-2025", "unsupported_fields": []}],
            "errors": [{"file": "broken.zip", "errors": ["Unsupported archive"]}],
        })),
    )
}

async fn upload_all_rejected() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "message": "File upload completed",
            "summary": {
                "total_files_processed": 1,
                "total_rows_processed": 0,
                "successful_files": 0,
                "failed_files": 1,
            },
            "success": [],
            "errors": [{"file": "bad.csv", "errors": ["Invalid timestamp"]}],
        })),
    )
}

async fn upload_without_files() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No files provided" })),
    )
}

/// Holds a request until the test releases it, then answers 401
#[derive(Clone, Default)]
struct Gate {
    arrived: Arc<Notify>,
    release: Arc<Notify>,
}

async fn gated_expired(State(gate): State<Gate>) -> impl IntoResponse {
    gate.arrived.notify_one();
    gate.release.notified().await;
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Session expired" })))
}

async fn login(State(backend): State<Backend>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    backend.record(&headers, None, &body);
    Json(json!({ "session_token": "fresh-token" }))
}

async fn logout(State(backend): State<Backend>, headers: HeaderMap) -> impl IntoResponse {
    backend.record(&headers, None, &[]);
    StatusCode::NO_CONTENT
}

async fn device_token(State(backend): State<Backend>, headers: HeaderMap) -> impl IntoResponse {
    backend.record(&headers, None, &[]);
    Json(json!({ "device_token": "dev-123" }))
}

async fn supported() -> impl IntoResponse {
    Json(json!({ "supported_data_types": ["speed", "rpm", "cool_temp"] }))
}

async fn expired() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Session expired" })))
}

async fn broken() -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid date format" })),
    )
}

async fn spawn_backend(router: Router) -> Config {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Config::default()
        .with_api_url(&format!("http://{}", addr))
        .unwrap()
}

async fn healthy_backend() -> (Backend, Config) {
    let backend = Backend::default();
    let router = Router::new()
        .route("/data", get(data).delete(delete_data))
        .route("/data/upload", post(upload))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/device/token", post(device_token))
        .route("/supported-data", get(supported))
        .with_state(backend.clone());
    let config = spawn_backend(router).await;
    (backend, config)
}

#[tokio::test]
async fn test_fetch_sends_token_and_filters() {
    let (backend, config) = healthy_backend().await;
    let client = TelemetryClient::new(&config, Session::authenticated("abc123")).unwrap();

    let options = FetchOptions {
        date: NaiveDate::from_ymd_opt(2025, 10, 21),
        limit: Some(50),
        fields: vec![SensorField::Speed, SensorField::Rpm],
    };
    let window = client.fetch_readings(&options).await.unwrap();

    let seen = backend.last();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer abc123"));
    assert_eq!(
        seen.query.as_deref(),
        Some("date=21-10-2025&limit=50&data_types=speed&data_types=rpm")
    );

    assert_eq!(window.len(), 2);
    let latest = window.latest().unwrap();
    assert_eq!(latest.get(SensorField::Speed), Some(42.5));
    assert_eq!(latest.get(SensorField::Rpm), Some(1800.0));
    assert!(!latest.has(SensorField::CoolantTemp));
    assert!(!window.readings()[1].has(SensorField::Rpm));
}

#[tokio::test]
async fn test_anonymous_request_has_no_auth_header() {
    let (backend, config) = healthy_backend().await;
    let client = TelemetryClient::new(&config, Session::anonymous()).unwrap();

    client.fetch_readings(&FetchOptions::default()).await.unwrap();
    assert_eq!(backend.last().authorization, None);
}

#[tokio::test]
async fn test_unauthorized_tears_down_session() {
    let router = Router::new().route("/data", get(expired));
    let config = spawn_backend(router).await;

    let session = Session::authenticated("stale");
    let client = TelemetryClient::new(&config, session.clone()).unwrap();
    let vm = DashboardViewModel::new(
        Arc::new(client),
        session.clone(),
        FetchOptions::default(),
        Duration::from_secs(5),
    );

    vm.refresh().await;

    assert_eq!(
        session.state(),
        SessionState::TornDown {
            reason: TearDownReason::Unauthorized
        }
    );
    assert_eq!(session.token(), None);
    assert_eq!(vm.render(), Screen::Login);
}

#[tokio::test]
async fn test_api_error_message() {
    let router = Router::new().route("/data", delete(broken));
    let config = spawn_backend(router).await;
    let session = Session::authenticated("abc");
    let client = TelemetryClient::new(&config, session.clone()).unwrap();

    let date = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
    let err = client.delete_readings_for_date(date).await.unwrap_err();

    match &err {
        ClientError::Api { status, message } => {
            assert_eq!(*status, 400);
            assert_eq!(message, "Invalid date format");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(err.to_string(), "Backend error (400): Invalid date format");
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_delete_by_date() {
    let (backend, config) = healthy_backend().await;
    let client = TelemetryClient::new(&config, Session::authenticated("abc")).unwrap();

    let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(client.delete_readings_for_date(date).await.unwrap(), 17);
    assert_eq!(backend.last().query.as_deref(), Some("date=07-03-2025"));
}

#[tokio::test]
async fn test_upload_is_multipart() {
    let (backend, config) = healthy_backend().await;
    let client = TelemetryClient::new(&config, Session::authenticated("abc")).unwrap();

    let files = vec![
        UploadFile::new("21-10-2025.csv", b"Vehicle Speed,RPM\n50,2000\n".to_vec()),
        UploadFile::new("broken.zip", vec![0x50, 0x4b, 0x03, 0x04]),
    ];
    let report = client.upload_readings(files).await.unwrap();

    assert_eq!(report.message, "File upload completed");
    assert_eq!(report.summary.total_files_processed, 2);
    assert_eq!(report.summary.total_rows_processed, 2);
    assert_eq!(report.summary.failed_files, 1);
    assert_eq!(report.success[0].rows_processed, 2);
    assert_eq!(report.errors[0].errors, vec!["Unsupported archive"]);
    assert!(!report.is_complete());

    let seen = backend.last();
    assert!(seen
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&seen.body);
    assert_eq!(body.matches("name=\"files\"").count(), 2);
    assert!(body.contains("filename=\"21-10-2025.csv\""));
    assert!(body.contains("Content-Type: text/csv"));
    assert!(body.contains("Content-Type: application/zip"));
}

#[tokio::test]
async fn test_upload_with_every_file_rejected() {
    let router = Router::new().route("/data/upload", post(upload_all_rejected));
    let config = spawn_backend(router).await;
    let session = Session::authenticated("abc");
    let client = TelemetryClient::new(&config, session.clone()).unwrap();

    let files = vec![UploadFile::new("bad.csv", b"timestamp,RPM\nyesterday,900\n".to_vec())];
    let report = client.upload_readings(files).await.unwrap();

    assert!(report.is_rejected());
    assert_eq!(report.summary.failed_files, 1);
    assert_eq!(report.errors[0].file, "bad.csv");
    assert_eq!(report.errors[0].errors, vec!["Invalid timestamp"]);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn test_upload_bad_request_without_report() {
    let router = Router::new().route("/data/upload", post(upload_without_files));
    let config = spawn_backend(router).await;
    let client = TelemetryClient::new(&config, Session::authenticated("abc")).unwrap();

    let err = client.upload_readings(Vec::new()).await.unwrap_err();
    assert_eq!(err.to_string(), "Backend error (400): No files provided");
}

#[tokio::test]
async fn test_late_rejection_keeps_new_login() {
    let gate = Gate::default();
    let router = Router::new()
        .route("/data", get(gated_expired))
        .with_state(gate.clone());
    let config = spawn_backend(router).await;

    let session = Session::authenticated("old");
    let client = TelemetryClient::new(&config, session.clone()).unwrap();
    let pending = tokio::spawn(async move { client.fetch_readings(&FetchOptions::default()).await });

    gate.arrived.notified().await;
    session.authenticate("new");
    gate.release.notify_one();

    let err = pending.await.unwrap().unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(session.token().as_deref(), Some("new"));
}

#[tokio::test]
async fn test_login_then_logout() {
    let (backend, config) = healthy_backend().await;
    let session = Session::anonymous();
    let client = TelemetryClient::new(&config, session.clone()).unwrap();

    let token = client.login("driver@example.com", "hunter22").await.unwrap();
    assert_eq!(token, "fresh-token");
    assert_eq!(session.token().as_deref(), Some("fresh-token"));

    let body: serde_json::Value = serde_json::from_slice(&backend.last().body).unwrap();
    assert_eq!(body["email"], "driver@example.com");

    client.logout().await.unwrap();
    assert_eq!(
        backend.last().authorization.as_deref(),
        Some("Bearer fresh-token")
    );
    assert_eq!(
        session.state(),
        SessionState::TornDown {
            reason: TearDownReason::Logout
        }
    );
}

#[tokio::test]
async fn test_device_token_and_supported_fields() {
    let (_backend, config) = healthy_backend().await;
    let client = TelemetryClient::new(&config, Session::authenticated("abc")).unwrap();

    assert_eq!(client.issue_device_token().await.unwrap(), "dev-123");
    assert_eq!(
        client.supported_data_types().await.unwrap(),
        vec!["speed", "rpm", "cool_temp"]
    );
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::default()
        .with_api_url(&format!("http://{}", addr))
        .unwrap();
    let session = Session::authenticated("abc");
    let client = TelemetryClient::new(&config, session.clone()).unwrap();

    let err = client
        .fetch_readings(&FetchOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(session.is_authenticated());
}
