use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use gram_db::models::CommentRow;
use gram_types::api::{
    Claims, CommentRequest, CommentResponse, LikeResponse, LikersResponse, ShareResponse,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult, blocking};
use crate::photos::parse_sqlite_timestamp;

/// POST /api/photos/{photo_id}/like — idempotent. Liking a photo twice
/// leaves the count where it was; the response always carries the freshly
/// recomputed total.
pub async fn like(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<LikeResponse>> {
    let username = require_username(&claims)?;

    let db = state.clone();
    let like_count = blocking(move || {
        // Photos are never deleted, so this check cannot go stale between
        // the read and the insert.
        if !db.db.photo_exists(photo_id)? {
            return Err(ApiError::PhotoNotFound(photo_id));
        }
        db.db.add_like(photo_id, &username)?;
        Ok(db.db.count_likes(photo_id)?)
    })
    .await?;

    Ok(Json(LikeResponse { like_count }))
}

/// POST /api/photos/{photo_id}/share — same idempotent semantics as `like`.
pub async fn share(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<ShareResponse>> {
    let username = require_username(&claims)?;

    let db = state.clone();
    let share_count = blocking(move || {
        if !db.db.photo_exists(photo_id)? {
            return Err(ApiError::PhotoNotFound(photo_id));
        }
        db.db.add_share(photo_id, &username)?;
        Ok(db.db.count_shares(photo_id)?)
    })
    .await?;

    Ok(Json(ShareResponse { share_count }))
}

/// POST /api/photos/{photo_id}/comments
pub async fn comment(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let username = require_username(&claims)?;

    let db = state.clone();
    let row = blocking(move || {
        if !db.db.photo_exists(photo_id)? {
            return Err(ApiError::PhotoNotFound(photo_id));
        }
        Ok(db.db.add_comment(photo_id, &username, &req.body)?)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(comment_response(row))))
}

/// GET /api/photos/{photo_id}/likes — usernames in insertion order.
pub async fn get_likers(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
) -> ApiResult<Json<LikersResponse>> {
    let db = state.clone();
    let usernames = blocking(move || Ok(db.db.list_likers(photo_id)?)).await?;

    Ok(Json(LikersResponse { usernames }))
}

/// GET /api/photos/{photo_id}/shares
pub async fn get_share_count(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
) -> ApiResult<Json<ShareResponse>> {
    let db = state.clone();
    let share_count = blocking(move || Ok(db.db.count_shares(photo_id)?)).await?;

    Ok(Json(ShareResponse { share_count }))
}

/// GET /api/photos/{photo_id}/comments — newest first.
pub async fn get_comments(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let db = state.clone();
    let rows = blocking(move || Ok(db.db.list_comments(photo_id)?)).await?;

    let comments = rows.into_iter().map(comment_response).collect();
    Ok(Json(comments))
}

pub(crate) fn require_username(claims: &Claims) -> ApiResult<String> {
    if claims.username.trim().is_empty() {
        return Err(ApiError::InvalidInput("username must not be empty"));
    }
    Ok(claims.username.clone())
}

fn comment_response(row: CommentRow) -> CommentResponse {
    let created_at = parse_sqlite_timestamp(&row.created_at, "comment", row.id);
    CommentResponse {
        id: row.id,
        photo_id: row.photo_id,
        username: row.username,
        body: row.body,
        created_at,
    }
}
