use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims shared between the register/login handlers and the auth
/// middleware. Canonical definition lives here in gram-types to eliminate
/// duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: i64,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: i64,
    pub username: String,
    pub token: String,
}

// -- Photos --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePhotoRequest {
    /// Handle returned by POST /api/uploads. The photo record stores it
    /// opaquely; the stored bytes are served from /uploads/{filename}.
    pub filename: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhotoResponse {
    pub id: i64,
    pub owner: String,
    pub filename: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Uploads --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub size: u64,
}

// -- Interactions --

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeResponse {
    pub like_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareResponse {
    pub share_count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LikersResponse {
    pub usernames: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub photo_id: i64,
    pub username: String,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// -- Errors --

/// Uniform error body for every non-2xx API response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
