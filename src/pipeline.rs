//! The aggregation pipeline: interpret the query, fetch candidates from the
//! backend roster, score every document concurrently, then rank and select.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use uuid::Uuid;

use crate::bias;
use crate::config::Config;
use crate::embedding::{self, EmbeddingClient};
use crate::error::PipelineError;
use crate::interpret;
use crate::models::{
    AggregateStats, CandidateDocument, DocumentScore, Query, RankedResult, ScoredDocument,
    SentimentProfile, StanceDistribution,
};
use crate::rank;
use crate::relevance;
use crate::retrieval::{self, SampleBackend, SearchBackend};
use crate::stance::{ModelClient, StanceClassifier};
use crate::state::RetrievalState;

/// The retrieval-and-ranking engine. One instance serves many queries and
/// owns the shared state, the backend roster, and the scoring clients.
pub struct NewsAggregator {
    config: Config,
    state: RetrievalState,
    backends: Vec<Box<dyn SearchBackend>>,
    fallback: Option<Box<dyn SearchBackend>>,
    embedder: Arc<EmbeddingClient>,
    classifier: Arc<StanceClassifier>,
}

/// Degradations observed while scoring one document.
struct ScoreFlags {
    embedding_degraded: bool,
    model_degraded: bool,
}

impl NewsAggregator {
    /// Production roster: every backend with a configured key, with the
    /// sample backend as the terminal fallback.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let state = RetrievalState::new(&config)?;
        let backends = retrieval::backends::from_config(&state.http_client, &config.sources);
        Ok(Self::assemble(
            config,
            state,
            backends,
            Some(Box::new(SampleBackend)),
        ))
    }

    /// Build with an explicit roster and fallback. Used by tests and by
    /// callers that bring their own adapters.
    pub fn with_backends(
        config: Config,
        backends: Vec<Box<dyn SearchBackend>>,
        fallback: Option<Box<dyn SearchBackend>>,
    ) -> anyhow::Result<Self> {
        let state = RetrievalState::new(&config)?;
        Ok(Self::assemble(config, state, backends, fallback))
    }

    fn assemble(
        config: Config,
        state: RetrievalState,
        backends: Vec<Box<dyn SearchBackend>>,
        fallback: Option<Box<dyn SearchBackend>>,
    ) -> Self {
        let embedder = Arc::new(EmbeddingClient::new(
            state.http_client.clone(),
            config.embedding.clone(),
            state.embedding_cache.clone(),
        ));
        let model = ModelClient::from_config(state.http_client.clone(), &config.stance);
        let classifier = Arc::new(StanceClassifier::new(model));

        Self {
            config,
            state,
            backends,
            fallback,
            embedder,
            classifier,
        }
    }

    pub fn state(&self) -> &RetrievalState {
        &self.state
    }

    /// Run the full pipeline for one query.
    ///
    /// Backend and scoring-service failures degrade the run (recorded in the
    /// result's `degraded` list) rather than failing it; only an invalid
    /// query or a fully empty candidate set returns an error.
    pub async fn aggregate(&self, query: &Query) -> Result<RankedResult, PipelineError> {
        let started = Instant::now();
        query.validate()?;

        // ── Step 1: Interpret the query ───────────────────────
        let topic = query.topic.trim().to_lowercase();
        let user_view = query.user_view.trim().to_string();
        let sentiment = interpret::sentiment(&user_view);
        let terms =
            retrieval::terms::generate(&topic, &user_view, query.bias_slider, sentiment.leaning());
        tracing::info!(
            "Aggregating '{topic}' with {} search terms (slider {:.2}, limit {})",
            terms.len(),
            query.bias_slider,
            query.limit
        );

        // ── Step 2: Fetch candidates ──────────────────────────
        let fetched = retrieval::fetch_candidates(
            &self.state,
            &self.backends,
            self.fallback.as_deref(),
            &terms,
            query.limit,
            self.config.fetch_multiplier,
            Duration::from_secs(self.config.sources.search_timeout_secs),
        )
        .await?;
        tracing::info!(
            "Collected {} candidates from {} backend requests",
            fetched.documents.len(),
            fetched.backend_requests
        );

        // ── Step 3: Score documents concurrently ──────────────
        // Stance runs against the user's stated view; the bare topic stands
        // in when no view was given.
        let belief = if user_view.is_empty() {
            topic.clone()
        } else {
            user_view.clone()
        };
        let query_embedding = self.embedder.embed(&format!("{topic} {user_view}")).await;
        let mut embedding_degraded = query_embedding.degraded;
        let mut model_degraded = false;

        // Dropping the set aborts every task still running or queued behind
        // the semaphore, so cancelling this future cancels the scoring work.
        let mut tasks = JoinSet::new();
        for (index, document) in fetched.documents.into_iter().enumerate() {
            let embedder = self.embedder.clone();
            let classifier = self.classifier.clone();
            let semaphore = self.state.scoring_semaphore.clone();
            let belief = belief.clone();
            let topic = topic.clone();
            let user_view = user_view.clone();
            let query_vector = query_embedding.vector.clone();
            let slider = query.bias_slider;

            tasks.spawn(async move {
                let _permit = semaphore.acquire().await;
                let (scored, flags) = score_document(
                    &embedder,
                    &classifier,
                    document,
                    &belief,
                    &topic,
                    &user_view,
                    &query_vector,
                    slider,
                    sentiment,
                )
                .await;
                (index, scored, flags)
            });
        }

        let mut rows: Vec<(usize, ScoredDocument)> = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            if let Ok((index, scored, flags)) = joined {
                embedding_degraded |= flags.embedding_degraded;
                model_degraded |= flags.model_degraded;
                rows.push((index, scored));
            }
        }
        // Restore discovery order so ranking ties break deterministically
        rows.sort_by_key(|(index, _)| *index);
        let scored: Vec<ScoredDocument> = rows.into_iter().map(|(_, row)| row).collect();
        let documents_scored = scored.len();

        // ── Step 4: Rank and select ───────────────────────────
        let results = rank::select_top(scored, query.limit);

        let mut stance_distribution = StanceDistribution::default();
        for row in &results {
            stance_distribution.record(row.stance.stance);
        }

        let mut degraded = fetched.failed_backends;
        if embedding_degraded {
            degraded.push("embedding".to_string());
        }
        if model_degraded {
            degraded.push("stance_model".to_string());
        }

        let stats = AggregateStats {
            terms_generated: terms.len(),
            backend_requests: fetched.backend_requests,
            raw_hits: fetched.raw_hits,
            duplicates_dropped: fetched.duplicates_dropped,
            diversity_dropped: fetched.diversity_dropped,
            documents_scored,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        tracing::info!(
            "Ranked {} of {} scored candidates in {}ms",
            results.len(),
            documents_scored,
            stats.elapsed_ms
        );

        Ok(RankedResult {
            request_id: Uuid::new_v4(),
            query: query.clone(),
            results,
            stats,
            stance_distribution,
            degraded,
        })
    }
}

/// Score one document: embedding similarity, stance, content bias, source
/// ideology, relevance, and the final blend. Never fails; degraded services
/// fall back to heuristics and are flagged.
#[allow(clippy::too_many_arguments)]
async fn score_document(
    embedder: &EmbeddingClient,
    classifier: &StanceClassifier,
    document: CandidateDocument,
    belief: &str,
    topic: &str,
    user_view: &str,
    query_vector: &[f32],
    slider: f32,
    sentiment: SentimentProfile,
) -> (ScoredDocument, ScoreFlags) {
    let text = format!("{}\n{}", document.title, document.body);

    let doc_embedding = embedder.embed(&text).await;
    let semantic = embedding::cosine_similarity(query_vector, &doc_embedding.vector);

    let stance_outcome = classifier.classify(belief, &text).await;

    let content_bias = bias::analyze_content_bias(&text);
    let source = bias::source_bias_profile(&document.source_domain);

    let heuristic = relevance::heuristic_relevance(&document, topic, user_view);
    let relevance_score = relevance::blended_relevance(heuristic, semantic);

    let bias_match = bias::bias_match(&stance_outcome.result, slider, &sentiment);
    let stance_alignment = bias::stance_alignment(&stance_outcome.result, &sentiment);
    let ideology = bias::ideological_score(&source, slider);
    let final_score = rank::combined_score(relevance_score, bias_match, ideology);

    let score = DocumentScore {
        bias_match,
        relevance: relevance_score,
        stance_alignment,
        ideology,
        final_score,
    };
    let flags = ScoreFlags {
        embedding_degraded: doc_embedding.degraded,
        model_degraded: stance_outcome.model_degraded,
    };

    (
        ScoredDocument {
            document,
            stance: stance_outcome.result,
            content_bias,
            score,
        },
        flags,
    )
}
