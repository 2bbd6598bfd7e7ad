//! Error types for daemon queries.

/// Errors produced while querying a daemon's control API.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("unable to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to connect to {addr}: timed out")]
    Timeout { addr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("daemon reported an error: {0}")]
    Api(String),

    #[error("invalid device id {id} ({count} devices)")]
    NoSuchDevice { id: u32, count: usize },
}

impl QueryError {
    /// Returns true for failures to reach the daemon at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, QueryError::Connect { .. } | QueryError::Timeout { .. })
    }
}
