/// Database row types — these map directly to SQLite rows.
/// Distinct from the gram-types API payloads to keep the DB layer independent.

#[derive(Debug)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct PhotoRow {
    pub id: i64,
    pub owner: String,
    pub filename: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct CommentRow {
    pub id: i64,
    pub photo_id: i64,
    pub username: String,
    pub body: String,
    pub created_at: String,
}
