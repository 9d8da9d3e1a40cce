use thiserror::Error;

pub const NETWORK_ERROR_NOTICE: &str = "Network error occurred";

/// Outcome of a backend call that did not succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a usable answer: connect failure, broken
    /// transfer, or a body that is not the JSON we expect.
    #[error("network error: {0}")]
    Network(String),
    /// The server answered and said no.
    #[error("request rejected: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String> },
}

impl BackendError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: Some(message.into()),
        }
    }

    /// Text shown to the user: the server's message verbatim, `fallback` when
    /// the server gave none, and the generic network notice for transport
    /// failures.
    pub fn notice_text(&self, fallback: &str) -> String {
        match self {
            BackendError::Network(_) => NETWORK_ERROR_NOTICE.to_string(),
            BackendError::Rejected { message: Some(message) } if !message.is_empty() => {
                message.clone()
            }
            BackendError::Rejected { .. } => fallback.to_string(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, BackendError::Network(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(value: reqwest::Error) -> Self {
        BackendError::Network(value.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("session store io failure at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("session store contents are not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error("no active session")]
    NotLoggedIn,
    #[error("invalid server url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
}
