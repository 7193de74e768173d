//! JSON-over-HTTP binding for the chat core
//!
//! Thin axum handlers over [`ChatService`] and the file store. Every error
//! is reported as `{"error": <kind>, "detail": <message>}` with a status
//! derived from its [`ErrorKind`].

use crate::error::{classify, ChatError, ErrorKind, Result};
use crate::session::{ChatService, SendMessageRequest};
use crate::storage::FileStore;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: ChatService,
    pub files: Arc<dyn FileStore>,
}

/// An error on its way to becoming an HTTP response
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(error: E) -> Self {
        Self(error.into())
    }
}

/// HTTP status for an error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::UnknownProvider => StatusCode::BAD_REQUEST,
        ErrorKind::SessionNotFound | ErrorKind::FileNotFound => StatusCode::NOT_FOUND,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        // Partial context is reported as warnings on a 200 reply, never as an error
        ErrorKind::ContextPartialFailure
        | ErrorKind::Storage
        | ErrorKind::Config
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = classify(&self.0);
        let status = status_for(kind);
        if status.is_server_error() {
            tracing::error!(kind = %kind, "Request failed: {:#}", self.0);
        } else {
            tracing::debug!(kind = %kind, "Request rejected: {:#}", self.0);
        }

        let body = Json(json!({ "error": kind, "detail": format!("{:#}", self.0) }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Unwrap a JSON body, reporting decode failures as validation errors
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(ChatError::Validation(rejection.body_text()).into()),
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat/sessions", post(create_session).get(list_sessions))
        .route("/chat/sessions/:session_id", get(get_session))
        .route("/chat/messages", post(send_message))
        .route("/providers", get(list_providers))
        .route("/files/upload", post(upload_file))
        .route("/files", get(list_files))
        .route("/files/:id/content", get(file_content))
        .route("/files/:id", delete(delete_file))
        .fallback(not_found)
        .with_state(state)
}

/// Serve the router until Ctrl-C
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(state: AppState, bind: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionBody {
    user_id: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct UploadBody {
    file_name: String,
    content: String,
}

/// POST /chat/sessions
async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSessionBody>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = body.unwrap_or_default();
    let session = state
        .service
        .create_session(body.user_id.as_deref(), body.title.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(serde_json::to_value(session)?)))
}

/// GET /chat/sessions
async fn list_sessions(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let sessions = state.service.list_sessions().await?;
    Ok(Json(serde_json::to_value(sessions)?))
}

/// GET /chat/sessions/:session_id
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let session = state.service.get_history(&session_id).await?;
    Ok(Json(serde_json::to_value(session)?))
}

/// POST /chat/messages
async fn send_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendMessageRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let request = json_body(payload)?;
    let outcome = state.service.send_message(request).await?;

    let mut body = json!({ "response": outcome.assistant_text });
    if outcome.is_degraded() {
        body["warnings"] = serde_json::to_value(&outcome.warnings)?;
    }
    Ok(Json(body))
}

/// GET /providers
async fn list_providers(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "providers": state.service.providers() }))
}

/// POST /files/upload
async fn upload_file(
    State(state): State<AppState>,
    payload: std::result::Result<Json<UploadBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let body = json_body(payload)?;
    if body.file_name.trim().is_empty() {
        return Err(ChatError::Validation("fileName is required".to_string()).into());
    }

    let stored = state.files.put_file(&body.file_name, &body.content).await?;
    tracing::info!(file_id = %stored.id, size = stored.size, "Stored uploaded file");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "fileId": stored.id,
            "fileName": stored.name,
            "message": format!("{} uploaded successfully", stored.name),
        })),
    ))
}

/// GET /files
async fn list_files(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let files = state.files.list_files().await?;
    Ok(Json(serde_json::to_value(files)?))
}

/// GET /files/:id/content
async fn file_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let content = state.files.get_content(&id).await?;
    Ok(Json(json!({ "content": content })))
}

/// DELETE /files/:id
async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.files.delete_file(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ChatError::FileNotFound(id).into())
    }
}

async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" })))
}
