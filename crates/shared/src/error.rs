use serde::{Deserialize, Serialize};

/// Failure body returned by `/login` and `/register` on non-2xx responses.
///
/// Both fields are optional: the client falls back to a per-action message
/// when `message` is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            message: Some(message.into()),
        }
    }
}
