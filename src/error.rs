use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cursor {cursor:?} repeated on page {page}")]
    RepeatedCursor { cursor: String, page: usize },

    #[error("page limit of {limit} reached with cursor {cursor:?} still pending")]
    PageLimit { limit: usize, cursor: String },

    #[error("item {index} (liveId {live_id}) has unparsable openDate {value:?}: {source}")]
    Conversion {
        index: usize,
        live_id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("duplicate liveId in rows {start}..{end}: {source}")]
    UniqueViolation {
        start: usize,
        end: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("insert of rows {start}..{end} failed: {source}")]
    Persistence {
        start: usize,
        end: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Pipeline stage the error was raised in, for the fatal log line.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::Http(_) | AppError::Status { .. } | AppError::Decode(_) => "fetch",
            AppError::RepeatedCursor { .. } | AppError::PageLimit { .. } => "paginate",
            AppError::Conversion { .. } => "convert",
            AppError::UniqueViolation { .. } | AppError::Persistence { .. } => "persist",
            AppError::Database(_)
            | AppError::Migration(_)
            | AppError::Config(_)
            | AppError::Io(_) => "startup",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
