//! Attachment routes.
//!
//! File names travel as a single path segment; nested names are sent
//! percent-encoded (`q3%2Fsummary.txt`).

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use unidata_core::attachment::{AttachmentSource, upload_attachment};
use unidata_core::storage::DEFAULT_CONTENT_TYPE;
use unidata_shared::AppError;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Creates the attachment routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/attachments", post(upload))
        .route("/attachments/{file_name}", get(download).delete(remove))
        .route("/attachments/{file_name}/rename", post(rename))
        .route("/attachments/{file_name}/url", get(public_url))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for renaming an attachment.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New file name.
    pub new_file_name: String,
}

/// Response for a rename.
#[derive(Debug, Serialize)]
pub struct RenameResponse {
    /// Previous file name.
    pub old_file_name: String,
    /// Current file name.
    pub new_file_name: String,
}

/// Query for a public URL.
#[derive(Debug, Deserialize)]
pub struct PublicUrlQuery {
    /// Lifetime in seconds. Defaults to the configured TTL.
    pub expires_in: Option<u64>,
}

/// Response for a public URL.
#[derive(Debug, Serialize)]
pub struct PublicUrlResponse {
    /// Presigned URL.
    pub url: String,
    /// HTTP method to use (GET).
    pub method: String,
    /// When the URL expires (ISO 8601).
    pub expires_at: String,
    /// Headers the request must carry.
    pub headers: HashMap<String, String>,
}

fn multipart_error(err: &MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError(AppError::PayloadTooLarge(err.body_text()))
    } else {
        ApiError::validation(err.body_text())
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/attachments`
/// Multipart upload. Field `file` carries the content; an optional text
/// field `file_name` overrides the client-supplied name.
async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Response> {
    let mut file = None;
    let mut name_override = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;
                file = Some((name, content_type, bytes));
            }
            Some("file_name") => {
                name_override = Some(field.text().await.map_err(|e| multipart_error(&e))?);
            }
            _ => {}
        }
    }

    let Some((name, content_type, bytes)) = file else {
        return Err(ApiError::validation("missing multipart field `file`"));
    };
    let name = name_override.filter(|n| !n.trim().is_empty()).unwrap_or(name);

    let uploaded = upload_attachment(
        &state.storage,
        AttachmentSource::file(name, content_type, bytes),
    )
    .await?;

    info!(
        file_path = %uploaded.file_path,
        file_size = uploaded.file_size,
        "Attachment uploaded"
    );

    Ok((StatusCode::CREATED, Json(uploaded)).into_response())
}

/// GET `/attachments/{file_name}`
/// Streams the object back.
async fn download(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> ApiResult<Response> {
    let download = state.storage.download_file(&file_name).await?;

    let content_type = download
        .content_type
        .as_deref()
        .and_then(|t| HeaderValue::from_str(t).ok())
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut response = Response::new(Body::from_stream(download.stream));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(length) = download.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(response)
}

/// DELETE `/attachments/{file_name}`
async fn remove(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> ApiResult<StatusCode> {
    state.storage.delete_file(&file_name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/attachments/{file_name}/rename`
async fn rename(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> ApiResult<Json<RenameResponse>> {
    state
        .storage
        .rename_file(&file_name, &payload.new_file_name)
        .await?;

    Ok(Json(RenameResponse {
        old_file_name: file_name,
        new_file_name: payload.new_file_name,
    }))
}

/// GET `/attachments/{file_name}/url?expires_in=N`
async fn public_url(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    Query(query): Query<PublicUrlQuery>,
) -> ApiResult<Json<PublicUrlResponse>> {
    let presigned = state
        .storage
        .generate_public_url(&file_name, query.expires_in.map(Duration::from_secs))
        .await?;

    Ok(Json(PublicUrlResponse {
        url: presigned.url,
        method: presigned.method,
        expires_at: presigned.expires_at.to_rfc3339(),
        headers: presigned.headers,
    }))
}
