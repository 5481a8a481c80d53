use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors the store can hand back to callers. Duplicate like/share inserts
/// are not an error anywhere; they are absorbed by `INSERT OR IGNORE`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username `{0}` already exists")]
    DuplicateUser(String),

    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// True when a rusqlite error is a UNIQUE/constraint violation, which the
/// store maps to a domain error instead of surfacing as a storage failure.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
