//! HTTP implementation of the telemetry client

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    format_date, ClientError, FetchOptions, Session, TearDownReason, TelemetrySource, UploadReport,
};
use crate::config::Config;
use crate::reading::ReadingWindow;
use crate::upload::UploadFile;

/// Multipart field shared by every uploaded file
const UPLOAD_FIELD: &str = "files";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "token")]
    session_token: String,
}

#[derive(Deserialize)]
struct DataResponse {
    #[serde(default)]
    data: ReadingWindow,
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    deleted: u64,
}

#[derive(Deserialize)]
struct DeviceTokenResponse {
    device_token: String,
}

#[derive(Deserialize)]
struct SupportedDataResponse {
    supported_data_types: Vec<String>,
}

/// Telemetry backend client
///
/// Every request carries the session's bearer token when there is one. A 401
/// from any endpoint tears the session down, provided the session still
/// holds the token that request carried.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl TelemetryClient {
    /// Create a client for the configured backend
    pub fn new(config: &Config, session: Session) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("obd-dash/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            session,
        })
    }

    /// The session this client authenticates with
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Base URL of the backend
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))?;
        Ok(self.http.request(method, url))
    }

    /// Send a request with the session token attached
    ///
    /// A 401 tears the session down, but only if it still holds the token
    /// this request carried. Other statuses are returned to the caller.
    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let token = self.session.token();
        let request = match &token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!("Backend unreachable: {}", e);
            ClientError::Transport(e)
        })?;

        let status = response.status();
        debug!(url = %response.url(), %status, "Backend response");

        if status == StatusCode::UNAUTHORIZED {
            self.session
                .tear_down_if_current(token.as_deref(), TearDownReason::Unauthorized);
            return Err(ClientError::Unauthorized);
        }
        Ok(response)
    }

    /// Send a request, mapping every non-success status to an error
    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self.dispatch(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = read_body(response).await;
            return Err(api_error(status, &body));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Create an account
    pub async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let request = self
            .request(Method::POST, "register")?
            .json(&Credentials { email, password });
        self.send(request).await?;
        Ok(())
    }

    /// Log in and store the session token
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let request = self
            .request(Method::POST, "login")?
            .json(&Credentials { email, password });
        let response: LoginResponse = self.send_json(request).await?;

        self.session.authenticate(response.session_token.clone());
        Ok(response.session_token)
    }

    /// Invalidate the session on the backend
    ///
    /// The local session is torn down even if the backend call fails.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = match self.request(Method::POST, "logout") {
            Ok(request) => self.send(request).await.map(|_| ()),
            Err(e) => Err(e),
        };
        self.session.tear_down(TearDownReason::Logout);
        result
    }

    /// Fetch a window of readings
    pub async fn fetch_readings(&self, options: &FetchOptions) -> Result<ReadingWindow, ClientError> {
        let request = self
            .request(Method::GET, "data")?
            .query(&options.query_pairs());
        let response: DataResponse = self.send_json(request).await?;

        debug!(rows = response.data.len(), "Fetched readings");
        Ok(response.data)
    }

    /// Upload one or more log files in a single multipart request
    ///
    /// When every file is rejected the backend still sends a report; it is
    /// returned as `Ok` with [`UploadReport::is_rejected`] set.
    pub async fn upload_readings(&self, files: Vec<UploadFile>) -> Result<UploadReport, ClientError> {
        let mut form = Form::new();
        for file in files {
            let mime = if file.is_csv() {
                "text/csv"
            } else {
                "application/zip"
            };
            let part = Part::bytes(file.contents)
                .file_name(file.name)
                .mime_str(mime)?;
            form = form.part(UPLOAD_FIELD, part);
        }

        let request = self.request(Method::POST, "data/upload")?.multipart(form);
        let response = self.dispatch(request).await?;
        let status = response.status();
        if status.is_success() {
            return response
                .json::<UploadReport>()
                .await
                .map_err(|e| ClientError::InvalidResponse(e.to_string()));
        }

        // Every file rejected: the backend answers 400 with the full report
        let body = read_body(response).await;
        if status == StatusCode::BAD_REQUEST {
            if let Some(report) = rejected_report(&body) {
                warn!(
                    files = report.errors.len(),
                    "Backend rejected every uploaded file"
                );
                return Ok(report);
            }
        }
        Err(api_error(status, &body))
    }

    /// Delete every reading recorded on `date`
    ///
    /// Returns the number of rows the backend removed.
    pub async fn delete_readings_for_date(&self, date: NaiveDate) -> Result<u64, ClientError> {
        let request = self
            .request(Method::DELETE, "data")?
            .query(&[("date", format_date(date))]);
        let response: DeleteResponse = self.send_json(request).await?;
        Ok(response.deleted)
    }

    /// Issue a token for a physical device to report readings with
    pub async fn issue_device_token(&self) -> Result<String, ClientError> {
        let request = self.request(Method::POST, "device/token")?;
        let response: DeviceTokenResponse = self.send_json(request).await?;
        Ok(response.device_token)
    }

    /// Sensor columns the backend can filter on
    pub async fn supported_data_types(&self) -> Result<Vec<String>, ClientError> {
        let request = self.request(Method::GET, "supported-data")?;
        let response: SupportedDataResponse = self.send_json(request).await?;
        Ok(response.supported_data_types)
    }
}

#[async_trait]
impl TelemetrySource for TelemetryClient {
    async fn fetch_readings(&self, options: &FetchOptions) -> Result<ReadingWindow, ClientError> {
        TelemetryClient::fetch_readings(self, options).await
    }
}

struct ErrorBody {
    is_json: bool,
    text: String,
}

async fn read_body(response: Response) -> ErrorBody {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("json"));
    let text = response.text().await.unwrap_or_default();
    ErrorBody { is_json, text }
}

impl ErrorBody {
    fn json(&self) -> Option<serde_json::Value> {
        if self.is_json || self.text.trim_start().starts_with('{') {
            serde_json::from_str(&self.text).ok()
        } else {
            None
        }
    }
}

/// Decode an upload report whose files were all rejected
fn rejected_report(body: &ErrorBody) -> Option<UploadReport> {
    let value = body.json()?;
    if !value.get("errors").is_some_and(serde_json::Value::is_array) {
        return None;
    }
    serde_json::from_value(value).ok()
}

/// Build an API error, pulling a human readable message out of the body
fn api_error(status: StatusCode, body: &ErrorBody) -> ClientError {
    let message = error_message(status, body);
    warn!(%status, "Backend error: {}", message);
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

fn error_message(status: StatusCode, body: &ErrorBody) -> String {
    let from_json = body.json().and_then(|value| {
        ["error", "message"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
    });
    if let Some(message) = from_json {
        return message;
    }

    let text = body.text.trim();
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_body(text: &str) -> ErrorBody {
        ErrorBody {
            is_json: true,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_rejected_report_needs_errors_array() {
        let body = json_body(
            r#"{"message": "File upload completed",
                "summary": {"total_files_processed": 1, "failed_files": 1},
                "success": [],
                "errors": [{"file": "bad.csv", "errors": ["Invalid timestamp"]}]}"#,
        );
        let report = rejected_report(&body).unwrap();
        assert!(report.is_rejected());
        assert_eq!(report.errors[0].file, "bad.csv");

        assert!(rejected_report(&json_body(r#"{"error": "No files provided"}"#)).is_none());
    }

    #[test]
    fn test_error_message_fallbacks() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(
            error_message(status, &json_body(r#"{"message": "Nope"}"#)),
            "Nope"
        );
        let plain = ErrorBody {
            is_json: false,
            text: " gateway down \n".to_string(),
        };
        assert_eq!(error_message(status, &plain), "gateway down");
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, &json_body("")),
            "Bad Gateway"
        );
    }
}
