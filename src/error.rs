use thiserror::Error;

/// Error taxonomy for the retrieval-and-ranking pipeline.
///
/// Only `InvalidQuery` and `NoCandidatesFound` ever surface from
/// [`aggregate`](crate::pipeline::NewsAggregator::aggregate). `SourceUnavailable`
/// is produced by backend adapters and tolerated by the coordinator;
/// `ScoringDegraded` is caught inside the scoring stages, which fall back to
/// heuristics and record the component in the result's `degraded` list.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed slider/limit/topic; rejected before any network call.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// One backend is down or rate-limited out; logged and skipped.
    /// The field is `backend`, not `source`, so thiserror does not treat
    /// it as an `Error::source()` chain.
    #[error("source {backend} unavailable: {reason}")]
    SourceUnavailable { backend: String, reason: String },

    /// Every backend (fallback included) was exhausted without a single candidate.
    #[error("no candidate documents found after exhausting all backends")]
    NoCandidatesFound,

    /// An external scoring service failed; the stage continues on heuristics.
    #[error("scoring degraded ({component}): {reason}")]
    ScoringDegraded { component: String, reason: String },
}

impl PipelineError {
    pub fn source_unavailable(backend: &str, err: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            backend: backend.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn scoring_degraded(component: &str, err: impl std::fmt::Display) -> Self {
        Self::ScoringDegraded {
            component: component.to_string(),
            reason: err.to_string(),
        }
    }
}
