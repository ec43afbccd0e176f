//! Multi-source retrieval: term generation, backend adapters, and the
//! coordinator that fans search terms out across backends while enforcing
//! dedup, per-source diversity caps, and per-backend request budgets.

pub mod backends;
pub mod terms;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::PipelineError;
use crate::models::CandidateDocument;
use crate::state::RetrievalState;
pub use backends::{SampleBackend, SearchBackend};

/// Maximum accepted documents per source domain for a given result size.
pub fn diversity_cap(limit: usize) -> usize {
    (limit / 5).max(3)
}

/// Everything the collection phase produced, including the counters the
/// final result reports.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub documents: Vec<CandidateDocument>,
    pub backend_requests: usize,
    pub raw_hits: usize,
    pub duplicates_dropped: usize,
    pub diversity_dropped: usize,
    /// Backends that errored or timed out at least once during collection.
    pub failed_backends: Vec<String>,
}

/// Fetch candidate documents for the given terms, in term priority order.
///
/// Each term is fanned out to every eligible backend concurrently; results
/// are merged as they arrive. Once `limit * fetch_multiplier` documents are
/// accepted no further calls are issued, but in-flight calls still drain.
/// Backend failures are logged and tolerated. If the whole roster produces
/// nothing the fallback backend runs over the same terms; an empty set after
/// that is `NoCandidatesFound`.
pub async fn fetch_candidates(
    state: &RetrievalState,
    backends: &[Box<dyn SearchBackend>],
    fallback: Option<&dyn SearchBackend>,
    terms: &[String],
    limit: usize,
    fetch_multiplier: usize,
    timeout: Duration,
) -> Result<FetchOutcome, PipelineError> {
    let fetch_target = limit * fetch_multiplier.max(1);
    let mut collector = Collector::new(fetch_target, diversity_cap(limit));

    let roster: Vec<&dyn SearchBackend> = backends.iter().map(|b| b.as_ref()).collect();
    run_roster(state, &roster, terms, timeout, &mut collector, true).await;

    if let Some(fallback) = fallback {
        if collector.accepted.is_empty() {
            tracing::warn!(
                "No candidates from {} configured backend(s), falling back to {}",
                roster.len(),
                fallback.name()
            );
            run_roster(state, &[fallback], terms, timeout, &mut collector, false).await;
        }
    }

    if collector.accepted.is_empty() {
        return Err(PipelineError::NoCandidatesFound);
    }

    Ok(collector.into_outcome())
}

async fn run_roster(
    state: &RetrievalState,
    roster: &[&dyn SearchBackend],
    terms: &[String],
    timeout: Duration,
    collector: &mut Collector,
    enforce_budget: bool,
) {
    for term in terms {
        // Stop issuing new calls once the fetch target is reached
        if collector.full() {
            break;
        }
        let want = collector.remaining().max(1);

        let mut in_flight = FuturesUnordered::new();
        for backend in roster {
            let name = backend.name();
            if enforce_budget {
                if state.is_rate_limited(name) {
                    tracing::debug!("Skipping rate-limited backend {name}");
                    continue;
                }
                state.record_request(name);
            }
            collector.backend_requests += 1;
            in_flight.push(async move {
                let outcome = tokio::time::timeout(timeout, backend.search(term, want)).await;
                (name, outcome)
            });
        }

        // Drain in-flight calls, merging results as they arrive
        while let Some((name, outcome)) = in_flight.next().await {
            match outcome {
                Ok(Ok(documents)) => collector.merge(documents),
                Ok(Err(err)) => {
                    let err = PipelineError::source_unavailable(name, format!("{err:#}"));
                    tracing::warn!("Search for '{term}' failed: {err}");
                    collector.record_failure(name);
                }
                Err(_) => {
                    tracing::warn!(
                        "Backend {name} timed out after {}s for '{term}'",
                        timeout.as_secs()
                    );
                    collector.record_failure(name);
                }
            }
        }
    }
}

/// Accumulates accepted documents plus the dedup set and per-source counters.
/// Owned by the single coordinating task; workers never touch it.
struct Collector {
    fetch_target: usize,
    cap: usize,
    seen_urls: HashSet<String>,
    per_source: HashMap<String, usize>,
    accepted: Vec<CandidateDocument>,
    backend_requests: usize,
    raw_hits: usize,
    duplicates_dropped: usize,
    diversity_dropped: usize,
    failed_backends: Vec<String>,
}

impl Collector {
    fn new(fetch_target: usize, cap: usize) -> Self {
        Self {
            fetch_target,
            cap,
            seen_urls: HashSet::new(),
            per_source: HashMap::new(),
            accepted: Vec::new(),
            backend_requests: 0,
            raw_hits: 0,
            duplicates_dropped: 0,
            diversity_dropped: 0,
            failed_backends: Vec::new(),
        }
    }

    fn full(&self) -> bool {
        self.accepted.len() >= self.fetch_target
    }

    fn remaining(&self) -> usize {
        self.fetch_target.saturating_sub(self.accepted.len())
    }

    fn merge(&mut self, documents: Vec<CandidateDocument>) {
        self.raw_hits += documents.len();
        for document in documents {
            if document.url.is_empty() {
                continue;
            }
            if !self.seen_urls.insert(document.url.clone()) {
                self.duplicates_dropped += 1;
                continue;
            }
            let count = self
                .per_source
                .entry(document.source_domain.clone())
                .or_insert(0);
            if *count >= self.cap {
                self.diversity_dropped += 1;
                continue;
            }
            *count += 1;
            self.accepted.push(document);
        }
    }

    fn record_failure(&mut self, name: &str) {
        if !self.failed_backends.iter().any(|n| n == name) {
            self.failed_backends.push(name.to_string());
        }
    }

    fn into_outcome(self) -> FetchOutcome {
        FetchOutcome {
            documents: self.accepted,
            backend_requests: self.backend_requests,
            raw_hits: self.raw_hits,
            duplicates_dropped: self.duplicates_dropped,
            diversity_dropped: self.diversity_dropped,
            failed_backends: self.failed_backends,
        }
    }
}
