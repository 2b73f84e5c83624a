use thiserror::Error;

/// Failure modes of the external classifier collaborator. All of these are
/// converted into low-confidence data by the caller; none abort a run.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The classifier process or endpoint could not be reached at all.
    /// Transient; retrying is the caller's responsibility.
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    /// The classifier did not answer within the allotted time.
    #[error("classifier timed out after {0} ms")]
    Timeout(u64),

    /// The classifier answered with something we could not parse.
    #[error("malformed classifier response: {0}")]
    InvalidResponse(String),
}
