//! Errors raised while persisting stats.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("stats file i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stats file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
