/// Errors surfaced by the game cores and their storage collaborators.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The option list cannot be laid out on a wheel (empty list, negative or
    /// non-finite weights, or a mix of zero and positive weights).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
