use thiserror::Error;

/// Failure of a single call to the knowledge service
#[derive(Error, Debug)]
pub enum QueryError {
    /// No base URL was configured, nothing was sent
    #[error("API base URL is not configured (set KNOWLEDGE_BOT_API_URL or pass --base-url)")]
    MissingBaseUrl,

    /// The service answered with a non-success status
    #[error("knowledge service returned {status}: {body}")]
    Remote {
        status: u16,
        body: serde_json::Value,
    },

    /// The service answered with a non-success status and a body that is not JSON
    #[error("knowledge service returned {status} with an unreadable error body: {source}")]
    MalformedErrorBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// A success body that does not parse as `{answer, sources}`
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Connection, TLS or body transfer failure
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl QueryError {
    /// HTTP status attached to the error, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            QueryError::Remote { status, .. } | QueryError::MalformedErrorBody { status, .. } => {
                Some(*status)
            }
            QueryError::Transport(e) => e.status().map(|s| s.as_u16()),
            QueryError::MissingBaseUrl | QueryError::Decode(_) => None,
        }
    }
}
