//! Rule layer: weighted regex pattern tables for support- and
//! oppose-indicating language, with a proximity check so a match only counts
//! when a belief key term appears near it.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{Stance, StanceMethod, StanceResult};

/// A compiled stance pattern with its accumulation weight.
pub struct StancePattern {
    pub regex: &'static LazyLock<Option<Regex>>,
    pub weight: f32,
}

macro_rules! stance_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// ── Support: direct statements ────────────────────────────────────────────
stance_pattern!(
    RE_SUPPORT_DIRECT,
    r"(?i)\b(supports?|backs?|endorses?|agrees? with|confirms?|validates?)\b"
);
stance_pattern!(
    RE_SUPPORT_EVIDENCE,
    r"(?i)\b(evidence|proves?|demonstrates?|shows?)\s+(that|how)\b"
);
stance_pattern!(
    RE_SUPPORT_EMPHATIC,
    r"(?i)\b(clearly|obviously|undoubtedly|certainly)\s+(supports?|shows?)\b"
);
stance_pattern!(
    RE_SUPPORT_STUDY,
    r"(?i)\b(study|research|analysis)\s+(confirms?|shows?|demonstrates?)\b"
);
stance_pattern!(RE_SUPPORT_FINDING, r"(?i)\b(found|discovered|revealed)\s+(that|how)\b");

// ── Support: positive framing ─────────────────────────────────────────────
stance_pattern!(
    RE_SUPPORT_POSITIVE,
    r"(?i)\b(beneficial|positive|good|effective|successful)\b"
);
stance_pattern!(RE_SUPPORT_IMPROVES, r"(?i)\b(improves?|enhances?|strengthens?|boosts?)\b");
stance_pattern!(RE_SUPPORT_NECESSITY, r"(?i)\b(necessary|essential|important|crucial)\b");

// ── Support: agreement ────────────────────────────────────────────────────
stance_pattern!(RE_SUPPORT_AGREEMENT, r"(?i)\b(agree|concur|accept|acknowledge)\b");
stance_pattern!(
    RE_SUPPORT_ALIGNMENT,
    r"(?i)\b(consistent with|in line with|aligned with)\b"
);

// ── Oppose: direct statements ─────────────────────────────────────────────
stance_pattern!(
    RE_OPPOSE_DIRECT,
    r"(?i)\b(opposes?|rejects?|denies?|disagrees? with|contradicts?|refutes?)\b"
);
stance_pattern!(RE_OPPOSE_DEBUNK, r"(?i)\b(debunks?|disproves?|invalidates?|challenges?)\b");
stance_pattern!(
    RE_OPPOSE_NO_EVIDENCE,
    r"(?i)\b(no evidence|lack of evidence|insufficient evidence)\b"
);
stance_pattern!(RE_OPPOSE_DOUBT, r"(?i)\b(disputes?|questions?|doubts?|skeptical)\b");

// ── Oppose: negative framing ──────────────────────────────────────────────
stance_pattern!(
    RE_OPPOSE_NEGATIVE,
    r"(?i)\b(harmful|negative|bad|ineffective|unsuccessful)\b"
);
stance_pattern!(RE_OPPOSE_WORSENS, r"(?i)\b(worsens?|weakens?|undermines?|damages?)\b");
stance_pattern!(RE_OPPOSE_DISMISSIVE, r"(?i)\b(unnecessary|unimportant|irrelevant)\b");

// ── Oppose: disagreement and counter-arguments ────────────────────────────
stance_pattern!(RE_OPPOSE_DISAGREEMENT, r"(?i)\b(disagree|dissent|reject|deny)\b");
stance_pattern!(RE_OPPOSE_CONTRARY, r"(?i)\b(inconsistent with|contrary to|against)\b");
stance_pattern!(RE_OPPOSE_COUNTER, r"(?i)\b(however|but|nevertheless|on the other hand)\b");
stance_pattern!(
    RE_OPPOSE_ALTERNATIVE,
    r"(?i)\b(alternative|different|opposing|contrary)\s+(view|perspective|argument)\b"
);

pub fn support_patterns() -> Vec<StancePattern> {
    vec![
        StancePattern { regex: &RE_SUPPORT_DIRECT, weight: 0.8 },
        StancePattern { regex: &RE_SUPPORT_EVIDENCE, weight: 0.7 },
        StancePattern { regex: &RE_SUPPORT_EMPHATIC, weight: 0.9 },
        StancePattern { regex: &RE_SUPPORT_STUDY, weight: 0.6 },
        StancePattern { regex: &RE_SUPPORT_FINDING, weight: 0.5 },
        StancePattern { regex: &RE_SUPPORT_POSITIVE, weight: 0.4 },
        StancePattern { regex: &RE_SUPPORT_IMPROVES, weight: 0.5 },
        StancePattern { regex: &RE_SUPPORT_NECESSITY, weight: 0.4 },
        StancePattern { regex: &RE_SUPPORT_AGREEMENT, weight: 0.6 },
        StancePattern { regex: &RE_SUPPORT_ALIGNMENT, weight: 0.7 },
    ]
}

pub fn oppose_patterns() -> Vec<StancePattern> {
    vec![
        StancePattern { regex: &RE_OPPOSE_DIRECT, weight: 0.8 },
        StancePattern { regex: &RE_OPPOSE_DEBUNK, weight: 0.9 },
        StancePattern { regex: &RE_OPPOSE_NO_EVIDENCE, weight: 0.7 },
        StancePattern { regex: &RE_OPPOSE_DOUBT, weight: 0.6 },
        StancePattern { regex: &RE_OPPOSE_NEGATIVE, weight: 0.4 },
        StancePattern { regex: &RE_OPPOSE_WORSENS, weight: 0.5 },
        StancePattern { regex: &RE_OPPOSE_DISMISSIVE, weight: 0.4 },
        StancePattern { regex: &RE_OPPOSE_DISAGREEMENT, weight: 0.6 },
        StancePattern { regex: &RE_OPPOSE_CONTRARY, weight: 0.7 },
        StancePattern { regex: &RE_OPPOSE_COUNTER, weight: 0.3 },
        StancePattern { regex: &RE_OPPOSE_ALTERNATIVE, weight: 0.6 },
    ]
}

/// Characters of context on each side of a match checked for belief terms.
const CONTEXT_WINDOW: usize = 100;

/// A side must accumulate more than this before it can decide the stance.
const MIN_SIDE_SCORE: f32 = 0.5;

/// Evidence snippets kept on the result.
const MAX_EVIDENCE: usize = 3;

/// Score one pattern table against the text, keeping matched snippets as
/// evidence. Matches with no belief term nearby are ignored.
fn score_patterns(
    patterns: &[StancePattern],
    terms: &[String],
    text: &str,
    side: &str,
) -> (f32, Vec<String>) {
    let mut score = 0.0;
    let mut evidence = Vec::new();

    for pattern in patterns {
        let Some(re) = pattern.regex.as_ref() else {
            continue;
        };
        for m in re.find_iter(text) {
            if is_contextually_relevant(terms, text, m.start(), m.end()) {
                score += pattern.weight;
                evidence.push(format!("{side} pattern: '{}'", m.as_str()));
            }
        }
    }

    (score, evidence)
}

/// True when any belief key term appears within `CONTEXT_WINDOW` chars of the
/// match span.
fn is_contextually_relevant(terms: &[String], text: &str, start: usize, end: usize) -> bool {
    let mut lo = start.saturating_sub(CONTEXT_WINDOW);
    while !text.is_char_boundary(lo) {
        lo -= 1;
    }
    let mut hi = (end + CONTEXT_WINDOW).min(text.len());
    while !text.is_char_boundary(hi) {
        hi += 1;
    }

    let context = text[lo..hi].to_lowercase();
    terms.iter().any(|term| context.contains(term.as_str()))
}

/// Classify by weighted pattern accumulation. The winning side must exceed
/// `MIN_SIDE_SCORE`; confidence is `min(score/2, 0.9)`.
pub fn classify(terms: &[String], text: &str) -> StanceResult {
    let (support_score, support_evidence) = score_patterns(&support_patterns(), terms, text, "support");
    let (oppose_score, oppose_evidence) = score_patterns(&oppose_patterns(), terms, text, "oppose");

    let (stance, confidence, mut evidence) =
        if support_score > oppose_score && support_score > MIN_SIDE_SCORE {
            (Stance::Support, (support_score / 2.0).min(0.9), support_evidence)
        } else if oppose_score > support_score && oppose_score > MIN_SIDE_SCORE {
            (Stance::Oppose, (oppose_score / 2.0).min(0.9), oppose_evidence)
        } else {
            (
                Stance::Neutral,
                0.5,
                vec!["no strong support or opposition patterns".to_string()],
            )
        };
    evidence.truncate(MAX_EVIDENCE);

    StanceResult {
        stance,
        confidence,
        method: StanceMethod::Rule,
        evidence,
    }
}
