use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::error;
use uuid::Uuid;

use gram_types::api::UploadResponse;

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};

/// 10 MiB upload limit for photos
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    /// Original client-side filename; kept as a suffix of the stored handle
    /// so served files get a sensible extension.
    pub name: Option<String>,
}

/// POST /api/uploads — accepts raw photo bytes, saves them under the upload
/// directory and returns the opaque `filename` handle that
/// `POST /api/photos` accepts. The server never inspects the bytes.
pub async fn upload(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    bytes: Bytes,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    if bytes.is_empty() {
        return Err(ApiError::InvalidInput("upload body must not be empty"));
    }

    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(ApiError::PayloadTooLarge);
    }

    let filename = match query.name.as_deref() {
        Some(name) => format!("{}-{}", Uuid::new_v4(), sanitize_name(name)?),
        None => Uuid::new_v4().to_string(),
    };

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| {
            error!("Failed to create upload directory: {}", e);
            ApiError::Internal(e.into())
        })?;

    let path = state.upload_dir.join(&filename);
    let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
        error!("Failed to create file {}: {}", path.display(), e);
        ApiError::Internal(e.into())
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", path.display(), e);
        ApiError::Internal(e.into())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            filename,
            size: bytes.len() as u64,
        }),
    ))
}

/// The stored handle embeds the client's filename, so path traversal has to
/// be rejected here.
fn sanitize_name(name: &str) -> ApiResult<&str> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0')
    {
        return Err(ApiError::InvalidInput("invalid upload name"));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::sanitize_name;

    #[test]
    fn rejects_path_traversal_names() {
        assert!(sanitize_name("../etc/passwd").is_err());
        assert!(sanitize_name("a/b.jpg").is_err());
        assert!(sanitize_name("a\\b.jpg").is_err());
        assert!(sanitize_name("..").is_err());
        assert!(sanitize_name("").is_err());
        assert!(sanitize_name("sunset.jpg").is_ok());
    }
}
