pub mod practicum;

pub use practicum::PracticumClient;

use async_trait::async_trait;

use crate::store::SubmissionStatus;

/// One submission as reported by the remote review service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Stable id assigned by the remote service.
    pub id: String,
    /// Human-readable homework title, used in notifications.
    pub name: String,
    pub status: SubmissionStatus,
    /// Reviewer's comment, when the service includes one.
    pub reviewer_comment: Option<String>,
}

/// Failure modes of a status fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("review API request failed: {0}")]
    Network(String),
    #[error("review API rejected credentials: {0}")]
    Auth(String),
    #[error("review API response malformed: {0}")]
    Parse(String),
}

/// Read-side interface to the remote review service.
///
/// `fetch_statuses` must be an idempotent read: calling it twice in a row
/// without remote-side changes returns the same snapshots. Implementations
/// do not retry — the poll schedule is the retry policy.
#[async_trait]
pub trait ReviewClient: Send + Sync {
    async fn fetch_statuses(&self) -> Result<Vec<Snapshot>, FetchError>;
}
