//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};
use unidata_core::attachment::AttachmentError;
use unidata_core::storage::StorageError;
use unidata_shared::AppError;

/// Handler error, rendered as `{"error": CODE, "message": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// A 400 with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err.into())
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay in the log.
        let message = if let AppError::Internal(detail) = &self.0 {
            error!(error = %detail, "request failed");
            "An error occurred"
        } else {
            if status.is_server_error() {
                warn!(status = status.as_u16(), error = %self.0, "request failed");
            }
            self.0.message()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use unidata_core::storage::ProviderKind;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_storage_error_keeps_message() {
        let (status, body) = render(
            StorageError::PublicUrlNotSupported {
                provider: ProviderKind::Sftp,
            }
            .into(),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "UNSUPPORTED_OPERATION");
        assert_eq!(body["message"], "Public URLs not supported for provider: sftp");
    }

    #[tokio::test]
    async fn test_internal_error_is_hidden() {
        let (status, body) =
            render(StorageError::configuration("secret_key missing").into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An error occurred");
    }
}
