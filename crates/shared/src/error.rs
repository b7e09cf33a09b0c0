use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Body of a rejected mutation. `detail` is whatever the server chose to send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ErrorDetail {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    /// Only a non-empty string detail is meant for display.
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_ref()
            .and_then(Value::as_str)
            .filter(|detail| !detail.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("server url cannot carry a path: {0}")]
    CannotBeABase(String),
}
