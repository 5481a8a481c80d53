use crate::Database;
use crate::error::{StoreError, StoreResult, is_constraint_violation};
use crate::models::{CommentRow, PhotoRow, UserRow};
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<UserRow> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
                (username, password_hash),
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_constraint_violation(&e) => {
                    return Err(StoreError::DuplicateUser(username.to_string()));
                }
                Err(e) => return Err(e.into()),
            }

            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?
                .ok_or(StoreError::Storage(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    pub fn find_user(&self, username: &str) -> StoreResult<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
            )?;

            let row = stmt
                .query_row([username], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    // -- Photos --

    pub fn create_photo(
        &self,
        owner: &str,
        filename: &str,
        description: Option<&str>,
    ) -> StoreResult<PhotoRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO photos (owner, filename, description) VALUES (?1, ?2, ?3)",
                rusqlite::params![owner, filename, description],
            )?;

            let id = conn.last_insert_rowid();
            query_photo_by_id(conn, id)?
                .ok_or(StoreError::Storage(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    pub fn list_photos(&self) -> StoreResult<Vec<PhotoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner, filename, description, created_at FROM photos ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], photo_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_photos_by_owner(&self, owner: &str) -> StoreResult<Vec<PhotoRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner, filename, description, created_at FROM photos
                 WHERE owner = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([owner], photo_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn photo_exists(&self, photo_id: i64) -> StoreResult<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row("SELECT id FROM photos WHERE id = ?1", [photo_id], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Likes --

    /// Record a like. Idempotent: a duplicate (photo, user) pair is silently
    /// absorbed by the UNIQUE constraint, not reported as an error.
    pub fn add_like(&self, photo_id: i64, username: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO likes (photo_id, username) VALUES (?1, ?2)",
                rusqlite::params![photo_id, username],
            )?;
            Ok(())
        })
    }

    /// Like counts are always derived from the rows, never stored.
    pub fn count_likes(&self, photo_id: i64) -> StoreResult<i64> {
        self.with_conn(|conn| count_rows(conn, "likes", photo_id))
    }

    pub fn list_likers(&self, photo_id: i64) -> StoreResult<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT username FROM likes WHERE photo_id = ?1 ORDER BY id")?;
            let rows = stmt
                .query_map([photo_id], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Shares --

    /// Identical idempotent semantics to `add_like`.
    pub fn add_share(&self, photo_id: i64, username: &str) -> StoreResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO shares (photo_id, username) VALUES (?1, ?2)",
                rusqlite::params![photo_id, username],
            )?;
            Ok(())
        })
    }

    pub fn count_shares(&self, photo_id: i64) -> StoreResult<i64> {
        self.with_conn(|conn| count_rows(conn, "shares", photo_id))
    }

    // -- Comments --

    pub fn add_comment(&self, photo_id: i64, username: &str, body: &str) -> StoreResult<CommentRow> {
        if username.trim().is_empty() {
            return Err(StoreError::InvalidInput("username must not be empty"));
        }
        if body.trim().is_empty() {
            return Err(StoreError::InvalidInput("comment body must not be empty"));
        }

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (photo_id, username, body) VALUES (?1, ?2, ?3)",
                rusqlite::params![photo_id, username, body],
            )?;

            let id = conn.last_insert_rowid();
            query_comment_by_id(conn, id)?
                .ok_or(StoreError::Storage(rusqlite::Error::QueryReturnedNoRows))
        })
    }

    /// Newest first. Equal timestamps (second resolution in SQLite) break
    /// toward the higher id, so insertion order stays deterministic.
    pub fn list_comments(&self, photo_id: i64) -> StoreResult<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, photo_id, username, body, created_at FROM comments
                 WHERE photo_id = ?1 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([photo_id], comment_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> StoreResult<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password_hash, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_photo_by_id(conn: &Connection, id: i64) -> StoreResult<Option<PhotoRow>> {
    let mut stmt = conn
        .prepare("SELECT id, owner, filename, description, created_at FROM photos WHERE id = ?1")?;

    let row = stmt.query_row([id], photo_from_row).optional()?;

    Ok(row)
}

fn query_comment_by_id(conn: &Connection, id: i64) -> StoreResult<Option<CommentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, photo_id, username, body, created_at FROM comments WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], comment_from_row).optional()?;

    Ok(row)
}

fn photo_from_row(row: &rusqlite::Row<'_>) -> Result<PhotoRow, rusqlite::Error> {
    Ok(PhotoRow {
        id: row.get(0)?,
        owner: row.get(1)?,
        filename: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> Result<CommentRow, rusqlite::Error> {
    Ok(CommentRow {
        id: row.get(0)?,
        photo_id: row.get(1)?,
        username: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn count_rows(conn: &Connection, table: &str, photo_id: i64) -> StoreResult<i64> {
    // `table` is always a literal from this module, never caller input.
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE photo_id = ?1");
    let count = conn.query_row(&sql, [photo_id], |row| row.get(0))?;
    Ok(count)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> StoreResult<Option<T>>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> StoreResult<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
