use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Username or email collides with an existing user. Surfaced from the
    /// UNIQUE indexes, so concurrent identical registrations cannot race past
    /// a pre-check.
    #[error("user already exists")]
    DuplicateIdentity,

    /// No note matches both the note id and the owner id. An ownership
    /// mismatch is reported identically to absence.
    #[error("note not found")]
    NoteNotFound,

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Crypto(#[from] anyhow::Error),
}
