//! Bias and ideology scoring: text-derived content-bias profiles, the static
//! source-lean table, and the slider-driven match functions.

use crate::interpret;
use crate::models::{
    BiasDirection, ContentBiasProfile, SentimentLeaning, SentimentProfile, SourceBiasProfile,
    SourceLean, Stance, StanceResult,
};

// ─── Indicator vocabularies ──────────────────────────────

const LEFT_INDICATORS: &[&str] = &[
    "progressive",
    "liberal",
    "democratic",
    "socialist",
    "equality",
    "climate change",
    "renewable energy",
    "universal healthcare",
    "minimum wage",
    "workers rights",
    "social justice",
];

const RIGHT_INDICATORS: &[&str] = &[
    "conservative",
    "republican",
    "free market",
    "deregulation",
    "tax cuts",
    "border security",
    "traditional values",
    "second amendment",
    "pro-life",
    "small government",
];

const EMOTIONAL_INDICATORS: &[&str] = &[
    "outrageous",
    "shocking",
    "devastating",
    "amazing",
    "incredible",
    "terrible",
    "wonderful",
    "horrible",
    "fantastic",
    "disgusting",
];

const CERTAINTY_INDICATORS: &[&str] = &[
    "definitely",
    "certainly",
    "absolutely",
    "clearly",
    "obviously",
    "undoubtedly",
    "without doubt",
    "proven",
    "fact",
    "truth",
];

/// A direction label needs at least this many hits to beat `Neutral`.
const MIN_DIRECTION_HITS: usize = 2;

/// At or above this extremity, a direction label upgrades to its far pole.
const FAR_POLE_EXTREMITY: f32 = 0.6;

fn count_hits(lower: &str, vocabulary: &[&str]) -> usize {
    vocabulary.iter().filter(|term| lower.contains(*term)).count()
}

// ─── Content bias ────────────────────────────────────────

/// Scan document text against the indicator tables and derive a
/// [`ContentBiasProfile`]: partisan direction, extremity, and sentiment.
pub fn analyze_content_bias(text: &str) -> ContentBiasProfile {
    let lower = text.to_lowercase();

    let left = count_hits(&lower, LEFT_INDICATORS);
    let right = count_hits(&lower, RIGHT_INDICATORS);
    let emotional = count_hits(&lower, EMOTIONAL_INDICATORS);
    let certainty = count_hits(&lower, CERTAINTY_INDICATORS);

    let total_hits = left + right + emotional + certainty;
    let extremity_score = (total_hits as f32 / 10.0).min(1.0);

    let direction = if left > right && left >= MIN_DIRECTION_HITS {
        if extremity_score >= FAR_POLE_EXTREMITY {
            BiasDirection::FarLeft
        } else {
            BiasDirection::Left
        }
    } else if right > left && right >= MIN_DIRECTION_HITS {
        if extremity_score >= FAR_POLE_EXTREMITY {
            BiasDirection::FarRight
        } else {
            BiasDirection::Right
        }
    } else {
        BiasDirection::Neutral
    };

    let profile = interpret::sentiment(text);
    let sentiment = (profile.positive - profile.negative).clamp(-1.0, 1.0);

    ContentBiasProfile {
        direction,
        extremity_score,
        sentiment,
    }
}

// ─── Source table ────────────────────────────────────────

/// Static lean/reliability lookup for known news domains. Unknown domains
/// default to a centrist, middling-reliability profile.
pub fn source_bias_profile(domain: &str) -> SourceBiasProfile {
    let (lean, reliability) = match domain {
        "reuters.com" => (SourceLean::Center, 0.9),
        "ap.org" => (SourceLean::Center, 0.9),
        "bbc.com" => (SourceLean::Center, 0.8),
        "cnn.com" => (SourceLean::Left, 0.7),
        "foxnews.com" => (SourceLean::Right, 0.7),
        "msnbc.com" => (SourceLean::Left, 0.7),
        "nytimes.com" => (SourceLean::Left, 0.8),
        "wsj.com" => (SourceLean::Right, 0.8),
        "washingtonpost.com" => (SourceLean::Left, 0.8),
        "usatoday.com" => (SourceLean::Center, 0.7),
        "nbcnews.com" => (SourceLean::Left, 0.7),
        "abcnews.go.com" => (SourceLean::Center, 0.7),
        "cbsnews.com" => (SourceLean::Center, 0.7),
        "npr.org" => (SourceLean::Left, 0.8),
        "pbs.org" => (SourceLean::Center, 0.8),
        "bloomberg.com" => (SourceLean::Center, 0.8),
        "forbes.com" => (SourceLean::Right, 0.7),
        "techcrunch.com" => (SourceLean::Center, 0.7),
        "theverge.com" => (SourceLean::Center, 0.7),
        "arstechnica.com" => (SourceLean::Center, 0.8),
        "dailykos.com" => (SourceLean::FarLeft, 0.4),
        "breitbart.com" => (SourceLean::FarRight, 0.4),
        _ => {
            return SourceBiasProfile {
                lean: SourceLean::Center,
                reliability: 0.5,
                extremity: 0.3,
            }
        }
    };

    let extremity = match lean {
        SourceLean::Center => 0.2,
        SourceLean::Left | SourceLean::Right => 0.5,
        SourceLean::FarLeft | SourceLean::FarRight => 0.9,
    };

    SourceBiasProfile {
        lean,
        reliability,
        extremity,
    }
}

// ─── Ideological score ───────────────────────────────────

/// Target position on the Left↔Right axis for a given slider value.
///
/// Mid sliders prefer centrist sources. Extreme sliders prefer sources away
/// from center, scaled by how far the slider sits from the dead zone:
/// challenge mode (≤ 0.3) crosses to the far side of the axis, affirm mode
/// (≥ 0.7) pushes toward the slider's own pole.
fn ideological_target(slider: f32) -> f32 {
    if slider <= 0.3 {
        0.5 + 0.5 * (0.3 - slider) / 0.3
    } else if slider >= 0.7 {
        0.5 + 0.5 * (slider - 0.7) / 0.3
    } else {
        0.5
    }
}

/// Alignment between a source's lean and the slider-derived target position.
/// Extreme sliders get an extremity boost so loud outlets surface when the
/// user asked to be pushed.
pub fn ideological_score(source: &SourceBiasProfile, slider: f32) -> f32 {
    let target = ideological_target(slider);
    let mut score = 1.0 - (source.lean.axis_position() - target).abs();

    if slider <= 0.2 || slider >= 0.8 {
        score += source.extremity * 0.3;
    }

    score.clamp(0.0, 1.0)
}

// ─── Bias match ──────────────────────────────────────────

fn flip(stance: Stance) -> Stance {
    match stance {
        Stance::Support => Stance::Oppose,
        Stance::Oppose => Stance::Support,
        Stance::Neutral => Stance::Neutral,
    }
}

/// How well a document's stance matches the slider, given the user's own
/// sentiment toward the topic.
///
/// A user with negative sentiment is supported by documents that oppose the
/// topic, so the stance direction flips before interpolation. At slider 1.0 a
/// matching stance scores `confidence` and the opposite stance scores 0; at
/// slider 0.0 the mapping inverts; neutral stances score `0.5 × confidence`
/// at any slider value.
pub fn bias_match(stance: &StanceResult, slider: f32, sentiment: &SentimentProfile) -> f32 {
    let effective = match sentiment.leaning() {
        SentimentLeaning::Negative => flip(stance.stance),
        _ => stance.stance,
    };

    match effective {
        Stance::Support => slider * stance.confidence,
        Stance::Oppose => (1.0 - slider) * stance.confidence,
        Stance::Neutral => 0.5 * stance.confidence,
    }
}

/// Slider-independent degree to which a document backs the user's own view.
/// Equivalent to [`bias_match`] with the slider pinned to full support.
pub fn stance_alignment(stance: &StanceResult, sentiment: &SentimentProfile) -> f32 {
    bias_match(stance, 1.0, sentiment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StanceMethod;

    fn stance(s: Stance, confidence: f32) -> StanceResult {
        StanceResult {
            stance: s,
            confidence,
            method: StanceMethod::Rule,
            evidence: vec![],
        }
    }

    fn neutral_sentiment() -> SentimentProfile {
        SentimentProfile::neutral()
    }

    fn negative_sentiment() -> SentimentProfile {
        SentimentProfile {
            positive: 0.0,
            negative: 0.8,
            neutral: 0.2,
        }
    }

    #[test]
    fn test_bias_match_slider_zero_rewards_oppose() {
        let sentiment = neutral_sentiment();
        let oppose = stance(Stance::Oppose, 0.8);
        let support = stance(Stance::Support, 0.8);
        assert_eq!(bias_match(&oppose, 0.0, &sentiment), 0.8);
        assert_eq!(bias_match(&support, 0.0, &sentiment), 0.0);
    }

    #[test]
    fn test_bias_match_slider_one_inverts() {
        let sentiment = neutral_sentiment();
        let oppose = stance(Stance::Oppose, 0.8);
        let support = stance(Stance::Support, 0.8);
        assert_eq!(bias_match(&support, 1.0, &sentiment), 0.8);
        assert_eq!(bias_match(&oppose, 1.0, &sentiment), 0.0);
    }

    #[test]
    fn test_bias_match_neutral_stance_is_half_confidence() {
        let sentiment = neutral_sentiment();
        let neutral = stance(Stance::Neutral, 0.6);
        for slider in [0.0, 0.25, 0.5, 1.0] {
            assert!((bias_match(&neutral, slider, &sentiment) - 0.3).abs() < 1e-6);
        }
    }

    #[test]
    fn test_bias_match_interpolates_linearly() {
        let sentiment = neutral_sentiment();
        let support = stance(Stance::Support, 1.0);
        assert!((bias_match(&support, 0.25, &sentiment) - 0.25).abs() < 1e-6);
        assert!((bias_match(&support, 0.75, &sentiment) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_bias_match_flips_for_negative_user_sentiment() {
        // A user who hates the topic is supported by articles opposing it
        let sentiment = negative_sentiment();
        let oppose = stance(Stance::Oppose, 0.9);
        let support = stance(Stance::Support, 0.9);
        assert_eq!(bias_match(&oppose, 1.0, &sentiment), 0.9);
        assert_eq!(bias_match(&support, 1.0, &sentiment), 0.0);
    }

    #[test]
    fn test_stance_alignment_matches_full_support_slider() {
        let sentiment = neutral_sentiment();
        let support = stance(Stance::Support, 0.7);
        assert_eq!(
            stance_alignment(&support, &sentiment),
            bias_match(&support, 1.0, &sentiment)
        );
    }

    #[test]
    fn test_ideological_target_dead_zone() {
        assert_eq!(ideological_target(0.4), 0.5);
        assert_eq!(ideological_target(0.5), 0.5);
        assert_eq!(ideological_target(0.69), 0.5);
    }

    #[test]
    fn test_ideological_target_scales_with_slider_extremity() {
        assert!((ideological_target(0.0) - 1.0).abs() < 1e-6);
        assert!((ideological_target(1.0) - 1.0).abs() < 1e-6);
        assert!((ideological_target(0.3) - 0.5).abs() < 1e-6);
        assert!((ideological_target(0.7) - 0.5).abs() < 1e-6);
        assert!((ideological_target(0.85) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_ideological_score_prefers_center_at_mid_slider() {
        let center = source_bias_profile("reuters.com");
        let right = source_bias_profile("foxnews.com");
        assert!(ideological_score(&center, 0.5) > ideological_score(&right, 0.5));
    }

    #[test]
    fn test_ideological_score_extremity_boost_at_poles() {
        // Left source, axis 0.25, extremity 0.5: slider 0.0 targets 1.0,
        // base 0.25, plus the 0.5 × 0.3 boost
        let cnn = source_bias_profile("cnn.com");
        assert!((ideological_score(&cnn, 0.0) - 0.40).abs() < 1e-5);

        // Boost can push past 1.0 internally but the result is clamped
        let far_right = source_bias_profile("breitbart.com");
        assert_eq!(ideological_score(&far_right, 1.0), 1.0);
    }

    #[test]
    fn test_ideological_score_stays_in_unit_range() {
        for domain in ["reuters.com", "cnn.com", "breitbart.com", "unknown.example"] {
            let profile = source_bias_profile(domain);
            for slider in [0.0, 0.1, 0.3, 0.5, 0.7, 0.9, 1.0] {
                let score = ideological_score(&profile, slider);
                assert!((0.0..=1.0).contains(&score), "{domain} at {slider}: {score}");
            }
        }
    }

    #[test]
    fn test_source_table_known_domains() {
        let reuters = source_bias_profile("reuters.com");
        assert_eq!(reuters.lean, SourceLean::Center);
        assert!((reuters.reliability - 0.9).abs() < 1e-6);
        assert!((reuters.extremity - 0.2).abs() < 1e-6);

        let fox = source_bias_profile("foxnews.com");
        assert_eq!(fox.lean, SourceLean::Right);
        assert!((fox.extremity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_source_table_unknown_domain_defaults() {
        let unknown = source_bias_profile("example.org");
        assert_eq!(unknown.lean, SourceLean::Center);
        assert!((unknown.reliability - 0.5).abs() < 1e-6);
        assert!((unknown.extremity - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_content_bias_detects_left_direction() {
        let profile =
            analyze_content_bias("A progressive push for renewable energy and social justice.");
        assert_eq!(profile.direction, BiasDirection::Left);
    }

    #[test]
    fn test_content_bias_detects_right_direction() {
        let profile =
            analyze_content_bias("Conservative lawmakers demand tax cuts and border security.");
        assert_eq!(profile.direction, BiasDirection::Right);
    }

    #[test]
    fn test_content_bias_single_hit_stays_neutral() {
        let profile = analyze_content_bias("A conservative estimate of the costs.");
        assert_eq!(profile.direction, BiasDirection::Neutral);
    }

    #[test]
    fn test_content_bias_far_pole_upgrade() {
        let text = "Progressive socialist platform: equality, universal healthcare, \
                    minimum wage, workers rights, and social justice for all.";
        let profile = analyze_content_bias(text);
        assert_eq!(profile.direction, BiasDirection::FarLeft);
        assert!(profile.extremity_score >= 0.6);
    }

    #[test]
    fn test_content_bias_extremity_caps_at_one() {
        let text = LEFT_INDICATORS.join(" ") + " " + &EMOTIONAL_INDICATORS.join(" ");
        let profile = analyze_content_bias(&text);
        assert!((profile.extremity_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_content_bias_sentiment_sign() {
        let negative = analyze_content_bias("A terrible, horrible failure that many hate.");
        assert!(negative.sentiment < 0.0);

        let positive = analyze_content_bias("An amazing, wonderful success that people love.");
        assert!(positive.sentiment > 0.0);
    }

    #[test]
    fn test_content_bias_plain_text_is_neutral() {
        let profile = analyze_content_bias("The committee will meet on Tuesday to review.");
        assert_eq!(profile.direction, BiasDirection::Neutral);
        assert_eq!(profile.extremity_score, 0.0);
    }
}
