use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::warn;

use gram_db::models::PhotoRow;
use gram_types::api::{Claims, CreatePhotoRequest, PhotoResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, blocking};
use crate::interactions::require_username;

/// POST /api/photos — records an uploaded photo for the authenticated user.
/// The `filename` must be a handle previously returned by POST /api/uploads;
/// the owner is taken from the token, never the request body.
pub async fn create_photo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePhotoRequest>,
) -> ApiResult<(StatusCode, Json<PhotoResponse>)> {
    let owner = require_username(&claims)?;
    if req.filename.trim().is_empty() {
        return Err(ApiError::InvalidInput("filename must not be empty"));
    }

    let db = state.clone();
    let row = blocking(move || {
        Ok(db
            .db
            .create_photo(&owner, &req.filename, req.description.as_deref())?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(photo_response(row))))
}

/// GET /api/photos — the feed. The store hands photos back in insertion
/// order; newest-first is applied here at the presentation boundary.
pub async fn list_feed(State(state): State<AppState>) -> ApiResult<Json<Vec<PhotoResponse>>> {
    let db = state.clone();
    let rows = blocking(move || Ok(db.db.list_photos()?)).await?;

    let photos = rows.into_iter().rev().map(photo_response).collect();
    Ok(Json(photos))
}

/// GET /api/users/{username}/photos — a user's profile grid, oldest first.
pub async fn list_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<PhotoResponse>>> {
    let db = state.clone();
    let rows = blocking(move || Ok(db.db.list_photos_by_owner(&username)?)).await?;

    let photos = rows.into_iter().map(photo_response).collect();
    Ok(Json(photos))
}

fn photo_response(row: PhotoRow) -> PhotoResponse {
    let created_at = parse_sqlite_timestamp(&row.created_at, "photo", row.id);
    PhotoResponse {
        id: row.id,
        owner: row.owner,
        filename: row.filename,
        description: row.description,
        created_at,
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert, falling back to the epoch on corrupt rows
/// rather than failing the whole listing.
pub(crate) fn parse_sqlite_timestamp(
    raw: &str,
    resource: &str,
    id: i64,
) -> chrono::DateTime<chrono::Utc> {
    raw.parse::<chrono::DateTime<chrono::Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, resource, id, e);
            chrono::DateTime::default()
        })
}
