use crate::StoreResult;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            username        TEXT NOT NULL UNIQUE,
            password_hash   TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS photos (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            owner       TEXT NOT NULL,
            filename    TEXT NOT NULL,
            description TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_photos_owner
            ON photos(owner);

        -- One like per (photo, user); the constraint itself is the
        -- uniqueness check, writers never read-then-insert.
        CREATE TABLE IF NOT EXISTS likes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_id    INTEGER NOT NULL,
            username    TEXT NOT NULL,
            UNIQUE(photo_id, username)
        );

        CREATE INDEX IF NOT EXISTS idx_likes_photo
            ON likes(photo_id);

        CREATE TABLE IF NOT EXISTS shares (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_id    INTEGER NOT NULL,
            username    TEXT NOT NULL,
            UNIQUE(photo_id, username)
        );

        CREATE INDEX IF NOT EXISTS idx_shares_photo
            ON shares(photo_id);

        CREATE TABLE IF NOT EXISTS comments (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            photo_id    INTEGER NOT NULL,
            username    TEXT NOT NULL,
            body        TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_photo
            ON comments(photo_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
