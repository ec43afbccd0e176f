use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PipelineError;

/// A ranking request: topic, the user's stated view, and bias preference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub topic: String,
    /// The user's stated view of the topic (may be empty).
    #[serde(default)]
    pub user_view: String,
    /// 0.0 = challenge the user's belief, 1.0 = support it.
    #[serde(default = "default_slider")]
    pub bias_slider: f32,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    20
}

fn default_slider() -> f32 {
    0.5
}

impl Query {
    /// Build a query from raw free text by splitting off the leading topic word.
    pub fn from_raw(raw: &str, bias_slider: f32, limit: usize) -> Self {
        let (topic, user_view) = crate::interpret::split_raw(raw);
        Self {
            topic,
            user_view,
            bias_slider,
            limit,
        }
    }

    /// Reject malformed input before any network call is issued.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.topic.trim().is_empty() {
            return Err(PipelineError::InvalidQuery("topic is empty".to_string()));
        }
        if !self.bias_slider.is_finite() || !(0.0..=1.0).contains(&self.bias_slider) {
            return Err(PipelineError::InvalidQuery(format!(
                "bias_slider must be in [0, 1], got {}",
                self.bias_slider
            )));
        }
        if self.limit == 0 {
            return Err(PipelineError::InvalidQuery("limit must be > 0".to_string()));
        }
        Ok(())
    }
}

/// A fetched news article. Never mutated after creation; scoring attaches a
/// separate `DocumentScore` instead of editing the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDocument {
    /// Unique key within one query's result set.
    pub url: String,
    pub title: String,
    pub body: String,
    pub source_name: String,
    pub source_domain: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A document's position toward the user's belief.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Support,
    Oppose,
    Neutral,
}

/// Which classifier layer produced a stance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StanceMethod {
    Model,
    Rule,
    Keyword,
    Fallback,
}

/// Output of the stance classifier for one (belief, document) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StanceResult {
    pub stance: Stance,
    pub confidence: f32,
    pub method: StanceMethod,
    /// Matched snippets or classifier notes backing the decision.
    pub evidence: Vec<String>,
}

/// Partisan direction derived purely from document text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BiasDirection {
    FarLeft,
    Left,
    Neutral,
    Right,
    FarRight,
}

/// Text-derived bias estimate for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBiasProfile {
    pub direction: BiasDirection,
    /// min(total indicator hits / 10, 1.0)
    pub extremity_score: f32,
    /// Overall sentiment polarity in [-1, 1].
    pub sentiment: f32,
}

/// Political-lean label of a news source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceLean {
    FarLeft,
    Left,
    Center,
    Right,
    FarRight,
}

impl SourceLean {
    /// Position on the 0 (far left) to 1 (far right) axis.
    pub fn axis_position(&self) -> f32 {
        match self {
            SourceLean::FarLeft => 0.0,
            SourceLean::Left => 0.25,
            SourceLean::Center => 0.5,
            SourceLean::Right => 0.75,
            SourceLean::FarRight => 1.0,
        }
    }
}

/// Static bias/reliability profile of a source domain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SourceBiasProfile {
    pub lean: SourceLean,
    pub reliability: f32,
    pub extremity: f32,
}

/// Three-way sentiment distribution over the user's view text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentProfile {
    pub positive: f32,
    pub negative: f32,
    pub neutral: f32,
}

impl SentimentProfile {
    pub fn neutral() -> Self {
        Self {
            positive: 0.0,
            negative: 0.0,
            neutral: 1.0,
        }
    }

    /// Dominant polarity of the user's view, used to decide which stance
    /// direction counts as supporting the user.
    pub fn leaning(&self) -> SentimentLeaning {
        if self.negative > self.positive {
            SentimentLeaning::Negative
        } else if self.positive > self.negative {
            SentimentLeaning::Positive
        } else {
            SentimentLeaning::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLeaning {
    Positive,
    Negative,
    Neutral,
}

/// All per-document scores for one query. Built in one shot once every
/// component score is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentScore {
    /// Slider-aware stance alignment: 1.0 = perfect match for the requested
    /// challenge/support preference.
    pub bias_match: f32,
    pub relevance: f32,
    /// Slider-independent degree to which the document supports the user's own view.
    pub stance_alignment: f32,
    /// Source-lean alignment with the slider-derived target position.
    pub ideology: f32,
    #[serde(rename = "final")]
    pub final_score: f32,
}

/// One row of the ranked output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: CandidateDocument,
    pub stance: StanceResult,
    pub content_bias: ContentBiasProfile,
    pub score: DocumentScore,
}

/// Per-stage counters for one aggregate run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateStats {
    pub terms_generated: usize,
    pub backend_requests: usize,
    pub raw_hits: usize,
    pub duplicates_dropped: usize,
    pub diversity_dropped: usize,
    pub documents_scored: usize,
    pub elapsed_ms: u64,
}

/// Support/oppose/neutral counts across the returned results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StanceDistribution {
    pub support: usize,
    pub oppose: usize,
    pub neutral: usize,
}

impl StanceDistribution {
    pub fn record(&mut self, stance: Stance) {
        match stance {
            Stance::Support => self.support += 1,
            Stance::Oppose => self.oppose += 1,
            Stance::Neutral => self.neutral += 1,
        }
    }
}

/// Final ranked, deduplicated, diversity-capped result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    pub request_id: Uuid,
    pub query: Query,
    pub results: Vec<ScoredDocument>,
    pub stats: AggregateStats,
    pub stance_distribution: StanceDistribution,
    /// Subsystems that fell back to a heuristic during this run
    /// ("embedding", "stance_model", or a backend name).
    pub degraded: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stance_serializes_to_snake_case() {
        let json = serde_json::to_value(Stance::Support).unwrap();
        assert_eq!(json, "support");
        let json = serde_json::to_value(StanceMethod::Fallback).unwrap();
        assert_eq!(json, "fallback");
    }

    #[test]
    fn test_bias_direction_round_trips() {
        let json = serde_json::to_string(&BiasDirection::FarRight).unwrap();
        assert_eq!(json, "\"far_right\"");
        let back: BiasDirection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BiasDirection::FarRight);
    }

    #[test]
    fn test_query_defaults_applied_on_deserialize() {
        let q: Query = serde_json::from_str(r#"{"topic": "climate"}"#).unwrap();
        assert_eq!(q.limit, 20);
        assert!((q.bias_slider - 0.5).abs() < f32::EPSILON);
        assert!(q.user_view.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_slider() {
        let mut q = Query {
            topic: "climate".to_string(),
            user_view: String::new(),
            bias_slider: 1.5,
            limit: 10,
        };
        assert!(q.validate().is_err());
        q.bias_slider = f32::NAN;
        assert!(q.validate().is_err());
        q.bias_slider = 0.5;
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limit_and_blank_topic() {
        let q = Query {
            topic: "climate".to_string(),
            user_view: String::new(),
            bias_slider: 0.5,
            limit: 0,
        };
        assert!(q.validate().is_err());

        let q = Query {
            topic: "  ".to_string(),
            user_view: String::new(),
            bias_slider: 0.5,
            limit: 5,
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_document_score_serializes_final_field() {
        let score = DocumentScore {
            bias_match: 0.8,
            relevance: 0.6,
            stance_alignment: 0.8,
            ideology: 0.5,
            final_score: 0.66,
        };
        let json = serde_json::to_value(&score).unwrap();
        assert!(json.get("final").is_some());
        assert!(json.get("final_score").is_none());
    }

    #[test]
    fn test_source_lean_axis_positions_ordered() {
        assert!(SourceLean::FarLeft.axis_position() < SourceLean::Left.axis_position());
        assert!(SourceLean::Left.axis_position() < SourceLean::Center.axis_position());
        assert!(SourceLean::Center.axis_position() < SourceLean::Right.axis_position());
        assert!(SourceLean::Right.axis_position() < SourceLean::FarRight.axis_position());
    }
}
