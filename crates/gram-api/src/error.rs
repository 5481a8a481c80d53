use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gram_db::StoreError;
use gram_types::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("username already taken")]
    DuplicateUser,

    #[error("photo {0} not found")]
    PhotoNotFound(i64),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("upload exceeds the size limit")]
    PayloadTooLarge,

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::DuplicateUser => StatusCode::BAD_REQUEST,
            Self::PhotoNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            error!("internal error: {source:#}");
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::DuplicateUser(_) => Self::DuplicateUser,
            StoreError::InvalidInput(msg) => Self::InvalidInput(msg),
            e => Self::Internal(e.into()),
        }
    }
}

/// Run a store call on the blocking pool. The closure returns `ApiError` so
/// handlers can mix store results with their own checks via `?`.
pub(crate) async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {e}")))?
}
