use shared::error::RouteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("roster request did not complete: {0}")]
    Transport(String),
    #[error("roster request returned status {0}")]
    Status(u16),
    #[error("roster body is malformed: {0}")]
    Decode(String),
    #[error(transparent)]
    Route(#[from] RouteError),
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("request did not complete: {0}")]
    Transport(String),
    #[error("request rejected with status {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("response body is malformed: {0}")]
    Decode(String),
    #[error(transparent)]
    Route(#[from] RouteError),
}

impl MutationError {
    /// Server-provided detail for a completed-but-rejected request.
    pub fn detail(&self) -> Option<&str> {
        match self {
            MutationError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Rejections are expected user-facing conditions; everything else means
    /// the exchange itself broke down.
    pub fn is_rejection(&self) -> bool {
        matches!(self, MutationError::Rejected { .. })
    }
}
