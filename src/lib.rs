//! # news-lens
//!
//! A bias-aware news retrieval and ranking pipeline: fetch candidate articles
//! about a topic from multiple search backends, classify each article's stance
//! toward the user's stated belief, estimate content and source bias, and rank
//! by a blend of relevance and the user's challenge/support preference.
//!
//! ## Architecture
//!
//! The aggregation pipeline is a directed acyclic graph (DAG):
//!
//! ```text
//!                      ┌───────────────┐
//!                      │  User Query   │
//!                      │ topic + view  │
//!                      │ + bias slider │
//!                      └───────┬───────┘
//!                              │
//!                              ▼
//!                   ┌───────────────────┐
//!                   │  Query Interpret  │
//!                   │ sentiment + terms │
//!                   │   (≤12 variants)  │
//!                   └─────────┬─────────┘
//!                             │
//!           ┌─────────────────┼─────────────────┐
//!           ▼                 ▼                 ▼
//!    ┌────────────┐    ┌────────────┐    ┌────────────┐
//!    │  NewsAPI   │    │   GNews    │    │  Guardian  │
//!    └──────┬─────┘    └──────┬─────┘    └──────┬─────┘
//!           │                 │                 │
//!           └─────────────────┼─────────────────┘
//!                             │ URL dedup + per-source caps
//!                             ▼
//!                ┌────────────────────────┐
//!                │  Candidate Documents   │
//!                │   (limit × 3 target)   │
//!                └────────────┬───────────┘
//!                             │ concurrent per-document scoring
//!         ┌─────────────┬────┴────────┬─────────────┐
//!         ▼             ▼             ▼             ▼
//!   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────┐
//!   │ Semantic │  │  Stance  │  │ Content  │  │  Source  │
//!   │Similarity│  │(3 layers)│  │   Bias   │  │ Ideology │
//!   └─────┬────┘  └─────┬────┘  └─────┬────┘  └─────┬────┘
//!         │             │             │             │
//!         └─────────────┴──────┬──────┴─────────────┘
//!                              ▼
//!                ┌─────────────────────────┐
//!                │   0.4 × relevance       │
//!                │ + 0.4 × bias match      │
//!                │ + 0.2 × ideology        │
//!                └────────────┬────────────┘
//!                             │ sort + diversity + truncate
//!                             ▼
//!                ┌─────────────────────────┐
//!                │      Ranked Results     │
//!                └─────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for backends, embedding, and stance services
//! - [`models`] - Shared data types: `Query`, `CandidateDocument`, `ScoredDocument`, result types
//! - [`error`] - The `PipelineError` taxonomy separating fatal from degraded failures
//! - [`interpret`] - Raw-query splitting and user-view sentiment
//! - [`retrieval`] - Search-term generation, backend adapters, and the fetch coordinator
//! - [`embedding`] - Embedding client with TTL cache, deterministic fallback vectors, cosine similarity
//! - [`stance`] - Layered stance classification (model, rules, keywords, fallback)
//! - [`bias`] - Content bias indicators, source lean profiles, and slider-aware match scores
//! - [`relevance`] - Heuristic relevance blended with semantic similarity
//! - [`rank`] - Final-score combination and diversity-capped selection
//! - [`pipeline`] - The `NewsAggregator` engine tying the stages together
//! - [`state`] - Shared state: HTTP client, embedding cache, rate-limit counters, snapshots

pub mod bias;
pub mod config;
pub mod embedding;
pub mod error;
pub mod interpret;
pub mod models;
pub mod pipeline;
pub mod rank;
pub mod relevance;
pub mod retrieval;
pub mod stance;
pub mod state;
