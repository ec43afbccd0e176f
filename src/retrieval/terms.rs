//! Search-term generation: deterministic variants of the topic, the user's
//! view, and a slider-picked stance vocabulary.

use std::collections::HashSet;

use crate::models::SentimentLeaning;

/// Terms appended in challenge mode (slider < 0.4).
const CHALLENGE_VOCABULARY: &[&str] = &[
    "debate",
    "refutation",
    "criticism",
    "rebuttal",
    "counterargument",
    "evidence against",
    "debunking",
];

/// Terms appended in affirm mode (slider > 0.6).
const SUPPORT_VOCABULARY: &[&str] = &[
    "best arguments for",
    "proof",
    "supporting evidence",
    "defense of",
    "making the case for",
    "strongest support",
];

/// Terms appended in the middle band.
const BALANCED_VOCABULARY: &[&str] = &["debate", "analysis", "perspective", "facts"];

const MAX_TERMS: usize = 12;

/// Pick the stance vocabulary for a slider value. A user with negative
/// sentiment holds a belief *against* the topic, so challenging them means
/// finding material in the topic's favor and the two vocabularies swap.
fn stance_vocabulary(slider: f32, leaning: SentimentLeaning) -> &'static [&'static str] {
    let (challenge, support) = match leaning {
        SentimentLeaning::Negative => (SUPPORT_VOCABULARY, CHALLENGE_VOCABULARY),
        _ => (CHALLENGE_VOCABULARY, SUPPORT_VOCABULARY),
    };

    if slider < 0.4 {
        challenge
    } else if slider > 0.6 {
        support
    } else {
        BALANCED_VOCABULARY
    }
}

/// Generate search-term variants in priority order: direct topic forms first,
/// then user-view combinations, then stance vocabulary. Order-preserving
/// dedup, capped at 12 terms.
pub fn generate(topic: &str, user_view: &str, slider: f32, leaning: SentimentLeaning) -> Vec<String> {
    let mut terms = vec![
        topic.to_string(),
        format!("\"{topic}\""),
        format!("{topic} news"),
        format!("{topic} latest"),
    ];

    if !user_view.is_empty() {
        terms.push(format!("{topic} {user_view}"));
        terms.push(format!("\"{topic}\" \"{user_view}\""));
    }

    for word in stance_vocabulary(slider, leaning) {
        terms.push(format!("{topic} {word}"));
    }

    let mut seen = HashSet::new();
    terms.retain(|term| seen.insert(term.clone()));
    terms.truncate(MAX_TERMS);
    terms
}
