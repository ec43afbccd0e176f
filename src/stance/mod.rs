//! Layered stance classification: does a document support, oppose, or stay
//! neutral toward the user's belief statement?
//!
//! Layers run in a fixed order (model, rules, keywords). Each layer's result
//! is accepted only above that layer's confidence threshold; otherwise the
//! next layer runs. When every layer declines, a low-confidence neutral
//! fallback is returned.

pub mod keywords;
pub mod model;
pub mod rules;

pub use model::ModelClient;

use crate::models::{Stance, StanceMethod, StanceResult};

/// Stop words excluded from belief key terms.
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did", "will",
    "would", "could", "should", "may", "might", "must", "can",
];

/// Maximum number of belief key terms used for contextual checks.
const MAX_KEY_TERMS: usize = 5;

// ─── Layer state machine ─────────────────────────────────

/// Classification layers in attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Model,
    Rule,
    Keyword,
}

impl Layer {
    /// Layer to try after this one declines.
    pub fn next(self) -> Option<Layer> {
        match self {
            Layer::Model => Some(Layer::Rule),
            Layer::Rule => Some(Layer::Keyword),
            Layer::Keyword => None,
        }
    }

    /// Minimum confidence for this layer's result to be accepted.
    pub fn acceptance_threshold(self) -> f32 {
        match self {
            Layer::Model => 0.6,
            Layer::Rule => 0.5,
            Layer::Keyword => 0.4,
        }
    }
}

/// Outcome of attempting one layer.
#[derive(Debug)]
pub enum Attempt {
    Accepted(StanceResult),
    NextLayer,
}

/// Apply a layer's acceptance threshold to its candidate result.
pub fn evaluate(layer: Layer, candidate: Option<StanceResult>) -> Attempt {
    match candidate {
        Some(result) if result.confidence > layer.acceptance_threshold() => {
            Attempt::Accepted(result)
        }
        _ => Attempt::NextLayer,
    }
}

// ─── Classifier ──────────────────────────────────────────

/// Result of a full classification, with subsystem degradation noted.
pub struct ClassifyOutcome {
    pub result: StanceResult,
    /// True when the model service was configured but failed on this call.
    pub model_degraded: bool,
}

/// Walks the layer chain for each belief/document pair.
pub struct StanceClassifier {
    model: Option<ModelClient>,
}

impl StanceClassifier {
    pub fn new(model: Option<ModelClient>) -> Self {
        Self { model }
    }

    pub async fn classify(&self, belief: &str, text: &str) -> ClassifyOutcome {
        let terms = key_terms(belief);
        let mut model_degraded = false;

        let mut layer = Some(Layer::Model);
        while let Some(current) = layer {
            let candidate = match current {
                Layer::Model => match &self.model {
                    Some(client) => match client.classify(belief, text).await {
                        Ok(result) => Some(result),
                        Err(e) => {
                            tracing::warn!("Stance model failed, trying rule layer: {e:#}");
                            model_degraded = true;
                            None
                        }
                    },
                    None => None,
                },
                Layer::Rule => Some(rules::classify(&terms, text)),
                Layer::Keyword => Some(keywords::classify(&terms, text)),
            };

            match evaluate(current, candidate) {
                Attempt::Accepted(result) => {
                    return ClassifyOutcome {
                        result,
                        model_degraded,
                    };
                }
                Attempt::NextLayer => layer = current.next(),
            }
        }

        ClassifyOutcome {
            result: fallback_result(),
            model_degraded,
        }
    }
}

/// Neutral result returned when every layer declines.
fn fallback_result() -> StanceResult {
    StanceResult {
        stance: Stance::Neutral,
        confidence: 0.3,
        method: StanceMethod::Fallback,
        evidence: vec!["no clear stance detected".to_string()],
    }
}

/// Content words of a belief statement, used for contextual relevance checks:
/// lowercase words longer than 3 chars with stop words removed, first 5 unique
/// in order of appearance.
pub fn key_terms(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut terms: Vec<String> = Vec::new();

    for word in lower.split(|c: char| !c.is_alphanumeric()) {
        if word.len() <= 3 || STOP_WORDS.contains(&word) {
            continue;
        }
        if !terms.iter().any(|t| t == word) {
            terms.push(word.to_string());
        }
        if terms.len() == MAX_KEY_TERMS {
            break;
        }
    }

    terms
}
