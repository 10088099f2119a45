#[derive(Debug, thiserror::Error)]
pub enum TcgSyncError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown game kind: {0:?}")]
    UnknownGameKind(String),

    #[error("Invalid field '{field}' for {game} card: {reason}")]
    InvalidField {
        game: &'static str,
        field: String,
        reason: String,
    },

    /// A card with the same (game, set, number) is already stored under a different id.
    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, TcgSyncError>;
