//! Heuristic relevance scoring: five weighted sub-scores over title and body
//! text, blended with semantic similarity from the embedding client.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::CandidateDocument;

// ─── Indicator vocabularies ──────────────────────────────

const DEPTH_INDICATORS: &[&str] = &[
    "analysis",
    "investigation",
    "study",
    "research",
    "report",
    "examination",
    "review",
    "assessment",
    "evaluation",
];

const CONTEXT_INDICATORS: &[&str] = &[
    "background",
    "history",
    "context",
    "overview",
    "summary",
    "explanation",
    "description",
];

const EVIDENCE_INDICATORS: &[&str] = &[
    "evidence",
    "proof",
    "data",
    "statistics",
    "facts",
    "findings",
    "conclusions",
    "results",
];

const EXPERTISE_INDICATORS: &[&str] = &[
    "expert",
    "authority",
    "specialist",
    "professional",
    "academic",
    "scholar",
    "researcher",
];

const TIMELINESS_INDICATORS: &[&str] = &[
    "recent",
    "latest",
    "current",
    "new",
    "updated",
    "breaking",
    "developing",
];

/// Sub-score weights. Topic presence dominates: topical precision matters
/// more than secondary quality signals.
const WEIGHT_TOPIC: f32 = 0.50;
const WEIGHT_CONTEXT: f32 = 0.15;
const WEIGHT_DEPTH: f32 = 0.15;
const WEIGHT_CREDIBILITY: f32 = 0.10;
const WEIGHT_QUALITY: f32 = 0.10;

/// Heuristic vs semantic split in the blended score.
const WEIGHT_HEURISTIC: f32 = 0.7;
const WEIGHT_SEMANTIC: f32 = 0.3;

static NUMBER_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\d+").ok());

// ─── Scoring ─────────────────────────────────────────────

/// Five-part heuristic relevance of a document to the query topic and the
/// user's stated view, in [0, 1].
pub fn heuristic_relevance(document: &CandidateDocument, topic: &str, user_view: &str) -> f32 {
    let text = format!("{}\n{}", document.title, document.body).to_lowercase();
    let title = document.title.to_lowercase();
    let topic = topic.to_lowercase();

    let score = topic_presence(&text, &title, &topic) * WEIGHT_TOPIC
        + contextual_overlap(&text, user_view) * WEIGHT_CONTEXT
        + depth_score(&text) * WEIGHT_DEPTH
        + credibility_score(&text) * WEIGHT_CREDIBILITY
        + quality_score(&text) * WEIGHT_QUALITY;

    score.min(1.0)
}

/// Blend the heuristic score with cosine similarity between the query and
/// document embeddings. Negative similarity contributes nothing.
pub fn blended_relevance(heuristic: f32, semantic: f32) -> f32 {
    (heuristic * WEIGHT_HEURISTIC + semantic.max(0.0) * WEIGHT_SEMANTIC).clamp(0.0, 1.0)
}

/// How prominently the topic appears: exact mentions plus word variants,
/// with title mentions double-weighted, normalized per 100 words and capped
/// at 5 mentions per 100.
fn topic_presence(text: &str, title: &str, topic: &str) -> f32 {
    if topic.is_empty() {
        return 0.0;
    }

    let word_count = text.split_whitespace().count();
    if word_count == 0 {
        return 0.0;
    }

    let exact = text.matches(topic).count();
    let related: usize = related_terms(topic)
        .iter()
        .map(|term| text.matches(term.as_str()).count())
        .sum();
    let title_bonus = title.matches(topic).count() * 2;

    let total = exact + related + title_bonus;
    let mentions_per_100 = total as f32 / word_count as f32 * 100.0;
    (mentions_per_100 / 5.0).min(1.0)
}

/// Topic word variants: plural plus common prefixed and suffixed forms.
fn related_terms(topic: &str) -> Vec<String> {
    let mut related = Vec::new();

    if !topic.ends_with('s') {
        related.push(format!("{topic}s"));
    }

    for prefix in ["anti-", "pro-", "non-", "pre-", "post-", "re-", "un-", "dis-"] {
        related.push(format!("{prefix}{topic}"));
    }
    for suffix in ["-ism", "-ist", "-ic", "-al", "-ive", "-able", "-ible"] {
        related.push(format!("{topic}{suffix}"));
    }

    related
}

/// Fraction of the user view's key words (longer than 3 chars) that appear
/// in the text. Neutral 0.5 when there is no usable view.
fn contextual_overlap(text: &str, user_view: &str) -> f32 {
    if user_view.is_empty() {
        return 0.5;
    }

    let view = user_view.to_lowercase();
    let words: Vec<&str> = view.split_whitespace().filter(|w| w.len() > 3).collect();
    if words.is_empty() {
        return 0.5;
    }

    let matches = words.iter().filter(|w| text.contains(*w)).count();
    matches as f32 / words.len() as f32
}

fn presence_ratio(text: &str, vocabularies: &[&[&str]]) -> f32 {
    let mut hits = 0;
    let mut possible = 0;
    for vocabulary in vocabularies {
        possible += vocabulary.len();
        hits += vocabulary.iter().filter(|term| text.contains(*term)).count();
    }
    if possible == 0 {
        return 0.0;
    }
    hits as f32 / possible as f32
}

fn depth_score(text: &str) -> f32 {
    presence_ratio(
        text,
        &[DEPTH_INDICATORS, CONTEXT_INDICATORS, EVIDENCE_INDICATORS],
    )
}

fn credibility_score(text: &str) -> f32 {
    presence_ratio(text, &[EXPERTISE_INDICATORS, TIMELINESS_INDICATORS])
}

/// Structural quality: length, paragraph structure, quotes, numeric data.
fn quality_score(text: &str) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }

    let word_count = text.split_whitespace().count();
    let length_score = (word_count as f32 / 500.0).min(1.0);

    let paragraphs = text.matches("\n\n").count() + 1;
    let structure_score = (paragraphs as f32 / 5.0).min(1.0);

    let quote_pairs = text.matches('"').count() / 2;
    let quote_score = (quote_pairs as f32 / 3.0).min(1.0);

    let numbers = NUMBER_RE
        .as_ref()
        .map(|re| re.find_iter(text).count())
        .unwrap_or(0);
    let data_score = (numbers as f32 / 10.0).min(1.0);

    length_score * 0.3 + structure_score * 0.3 + quote_score * 0.2 + data_score * 0.2
}
