//! Keyword layer: coarse lexicon co-occurrence between belief key terms and
//! positive/negative framing words.

use crate::models::{Stance, StanceMethod, StanceResult};

const POSITIVE_KEYWORDS: &[&str] = &[
    "good",
    "beneficial",
    "effective",
    "successful",
    "positive",
    "improve",
    "help",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "bad",
    "harmful",
    "ineffective",
    "unsuccessful",
    "negative",
    "worse",
    "hurt",
];

/// Each keyword co-occurring with a present belief term adds this much.
const HIT_WEIGHT: f32 = 0.3;

/// The winning side must exceed this to decide a stance.
const MIN_SIDE_SCORE: f32 = 0.3;

const MAX_EVIDENCE: usize = 3;

/// Classify by counting positive/negative keywords in documents that mention
/// a belief term. Deliberately coarse; it only runs when the model and rule
/// layers have declined.
pub fn classify(terms: &[String], text: &str) -> StanceResult {
    let lower = text.to_lowercase();

    let mut support_score = 0.0;
    let mut oppose_score = 0.0;
    let mut evidence = Vec::new();

    for term in terms {
        if !lower.contains(term.as_str()) {
            continue;
        }
        for keyword in POSITIVE_KEYWORDS {
            if lower.contains(keyword) {
                support_score += HIT_WEIGHT;
                evidence.push(format!("positive keyword '{keyword}' near '{term}'"));
            }
        }
        for keyword in NEGATIVE_KEYWORDS {
            if lower.contains(keyword) {
                oppose_score += HIT_WEIGHT;
                evidence.push(format!("negative keyword '{keyword}' near '{term}'"));
            }
        }
    }

    let (stance, confidence) = if support_score > oppose_score && support_score > MIN_SIDE_SCORE {
        (Stance::Support, support_score.min(0.7))
    } else if oppose_score > support_score && oppose_score > MIN_SIDE_SCORE {
        (Stance::Oppose, oppose_score.min(0.7))
    } else {
        (Stance::Neutral, 0.4)
    };
    evidence.truncate(MAX_EVIDENCE);

    StanceResult {
        stance,
        confidence,
        method: StanceMethod::Keyword,
        evidence,
    }
}
