//! API route handlers for the gateway.

use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use jetstream_engine::job::JobSpec;
use jetstream_engine::JobStatus;
use serde::Deserialize;

use crate::auth;
use crate::ingest;
use crate::server::AppState;

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "jetstream",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Admin login — issues a session token on a correct credential pair.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let admin = &state.config.admin;
    if req.username == admin.username
        && auth::verify_password(&req.password, &admin.password_sha256)
    {
        let token = state.sessions.issue();
        (StatusCode::OK, Json(serde_json::json!({"ok": true, "token": token})))
    } else {
        tracing::warn!("Rejected login for username={}", req.username);
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"ok": false, "error": "invalid_credentials"})),
        )
    }
}

/// Drop the caller's session token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    if let Some(token) = auth::token_from_headers(&headers) {
        state.sessions.revoke(token);
    }
    Json(serde_json::json!({"ok": true}))
}

/// Upload a CSV batch and start its paced job.
///
/// Multipart fields: `bundle`, `devKey`, `days`, `file`.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut bundle = None;
    let mut dev_key = None;
    let mut days_raw = None;
    let mut file_name = None;
    let mut file_bytes = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Malformed upload: {e}"),
                );
            }
        };
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("bundle") => bundle = field.text().await.ok(),
            Some("devKey") => dev_key = field.text().await.ok(),
            Some("days") => days_raw = field.text().await.ok(),
            Some("file") => {
                file_name = field.file_name().map(|s| s.to_string());
                file_bytes = field.bytes().await.ok();
            }
            _ => {}
        }
    }

    let (Some(bundle), Some(dev_key), Some(days_raw), Some(file_bytes)) =
        (bundle, dev_key, days_raw, file_bytes)
    else {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    };
    if bundle.is_empty() || dev_key.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    }

    let days: f64 = match days_raw.trim().parse() {
        Ok(days) if days > 0.0 && f64::is_finite(days) => days,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid \"days\" value"),
    };

    let records = match ingest::parse_records(&file_bytes) {
        Ok(records) => records,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    if records.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "CSV file is empty");
    }

    let started = state.pacer.start(JobSpec {
        bundle,
        dev_key,
        days,
        records,
        file_name: file_name.unwrap_or_else(|| "file.csv".into()),
    });

    (StatusCode::OK, Json(serde_json::to_value(started).unwrap_or_default()))
}

/// List jobs, oldest first.
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let jobs = state.registry.summaries_by_creation();
    Json(serde_json::to_value(jobs).unwrap_or_default())
}

/// Stop a running job's timer.
pub async fn stop_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.registry.stop(&id) {
        Some(_) => (StatusCode::OK, Json(serde_json::json!({"ok": true}))),
        None => error_response(StatusCode::NOT_FOUND, "not_found"),
    }
}

/// Delete a job. Running jobs must be stopped first.
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(job) = state.registry.snapshot(&id) else {
        return error_response(StatusCode::NOT_FOUND, "not_found");
    };
    if job.status == JobStatus::Running {
        return error_response(StatusCode::BAD_REQUEST, "running");
    }
    match state.registry.delete(&id) {
        Some(_) => (StatusCode::OK, Json(serde_json::json!({"ok": true}))),
        None => error_response(StatusCode::NOT_FOUND, "not_found"),
    }
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub bundle: Option<String>,
    pub limit: Option<usize>,
}

/// Query the operational log ring.
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Json<serde_json::Value> {
    let limit = query.limit.unwrap_or(200);
    let entries = state.logs.query(query.bundle.as_deref(), Some(limit));
    Json(serde_json::to_value(entries).unwrap_or_default())
}

/// Read the encrypted notes blob.
pub async fn get_notes(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({"text": state.notes.load()}))
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub text: String,
}

/// Replace the encrypted notes blob.
pub async fn save_notes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NotesRequest>,
) -> impl IntoResponse {
    match state.notes.save(&req.text) {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({"ok": true}))),
        Err(e) => {
            tracing::error!("Failed to save notes: {e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "save_failed")
        }
    }
}

fn error_response(status: StatusCode, error: &str) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({"error": error})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::AppState;
    use async_trait::async_trait;
    use axum::response::IntoResponse;
    use jetstream_core::config::JetStreamConfig;
    use jetstream_core::traits::{DeliveryTransport, NullNotifier};
    use jetstream_core::types::{DeliveryFailure, EventPayload, EventRecord};
    use jetstream_engine::{Dispatcher, JobRegistry, LogStore, Pacer};
    use std::sync::Arc;

    struct OkTransport;

    #[async_trait]
    impl DeliveryTransport for OkTransport {
        async fn deliver(
            &self,
            _bundle: &str,
            _credential: &str,
            _payload: &EventPayload,
        ) -> std::result::Result<(), DeliveryFailure> {
            Ok(())
        }
    }

    fn test_state(dir: &std::path::Path) -> Arc<AppState> {
        let mut config = JetStreamConfig::default();
        config.notes.path = Some(dir.join("notes.enc"));
        // sha256("admin123")
        config.admin.password_sha256 =
            "240be518fabd2724ddb6f04eeb1da5967448d7e831c08c8fa822809f74c720a9".into();

        let registry = Arc::new(JobRegistry::new());
        let logs = Arc::new(LogStore::new());
        let notifier: Arc<dyn jetstream_core::traits::Notifier> = Arc::new(NullNotifier);
        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            logs.clone(),
            Arc::new(OkTransport),
            notifier.clone(),
        ));
        let pacer = Pacer::new(registry.clone(), logs.clone(), dispatcher, notifier);

        Arc::new(AppState::new(config, registry, logs, pacer))
    }

    fn records(n: usize) -> Vec<EventRecord> {
        (0..n)
            .map(|i| EventRecord {
                advertising_id: format!("ad-{i}"),
                appsflyer_id: format!("af-{i}"),
                android_id: None,
                country: "US".into(),
                user_ip: "10.0.0.1".into(),
                eventname: None,
                eventtime: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn stop_unknown_job_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let response = stop_job(State(state), Path("missing".into()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_running_job_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let started = state.pacer.start(JobSpec {
            bundle: "com.example.app".into(),
            dev_key: "secret".into(),
            days: 1.0,
            records: records(3),
            file_name: "batch.csv".into(),
        });

        let response = delete_job(State(state.clone()), Path(started.job_id.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.registry.snapshot(&started.job_id).is_some());

        // Stopped jobs delete fine and vanish from listings.
        state.registry.stop(&started.job_id);
        let response = delete_job(State(state.clone()), Path(started.job_id.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.registry.summaries_by_creation().is_empty());
    }

    #[tokio::test]
    async fn login_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let denied = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "admin".into(),
                password: "wrong".into(),
            }),
        )
        .await
        .into_response();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let allowed = login(
            State(state.clone()),
            Json(LoginRequest {
                username: "admin".into(),
                password: "admin123".into(),
            }),
        )
        .await
        .into_response();
        assert_eq!(allowed.status(), StatusCode::OK);
    }
}
