//! Query interpretation: split raw text into topic + user view, derive sentiment.

use crate::models::SentimentProfile;

/// Common words skipped when extracting the topic token.
pub const STOPWORDS: &[&str] = &[
    "i", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
    "does", "did", "will", "would", "could", "should", "may", "might", "must", "can", "shall",
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "about", "against", "between", "into", "through", "during", "before", "after", "from", "up",
    "down", "out", "off", "over", "under", "again", "further", "then", "once", "here", "there",
    "when", "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
    "this", "that", "these", "those", "what", "which", "who", "whom", "you", "your", "we", "our",
    "they", "them", "their", "it", "its",
];

const POSITIVE_WORDS: &[&str] = &[
    "love", "like", "good", "great", "amazing", "wonderful", "fantastic", "excellent", "support",
    "agree", "right", "correct", "true", "necessary", "important", "essential", "beneficial",
    "helpful", "useful", "valuable",
];

const NEGATIVE_WORDS: &[&str] = &[
    "hate", "dislike", "bad", "terrible", "awful", "horrible", "wrong", "incorrect", "false",
    "oppose", "disagree", "against", "harmful", "dangerous", "risky", "problematic", "concerning",
    "worried", "scared", "angry",
];

fn clean_token(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase()
}

fn is_topic_word(cleaned: &str) -> bool {
    cleaned.len() > 2 && !STOPWORDS.contains(&cleaned)
}

/// Split raw query text into (topic, user_view).
///
/// The topic is the first non-stopword token; the user view is everything
/// after it. Empty input falls back to a generic news topic.
pub fn split_raw(raw: &str) -> (String, String) {
    let words: Vec<&str> = raw.split_whitespace().collect();
    if words.is_empty() {
        return ("news".to_string(), String::new());
    }

    for (i, word) in words.iter().enumerate() {
        let cleaned = clean_token(word);
        if is_topic_word(&cleaned) {
            let user_view = words[i + 1..].join(" ");
            return (cleaned, user_view);
        }
    }

    // Every token was a stopword; fall back to the first one
    let topic = clean_token(words[0]);
    let topic = if topic.is_empty() { "news".to_string() } else { topic };
    (topic, words[1..].join(" "))
}

/// Weighted keyword sentiment over the user's view, normalized by token count.
pub fn sentiment(text: &str) -> SentimentProfile {
    let lower = text.to_lowercase();
    let total_words = lower.split_whitespace().count();
    if total_words == 0 {
        return SentimentProfile::neutral();
    }

    let positive_count = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative_count = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    let positive = (positive_count as f32 / total_words as f32).min(1.0);
    let negative = (negative_count as f32 / total_words as f32).min(1.0);
    let neutral = (1.0 - positive - negative).max(0.0);

    SentimentProfile {
        positive,
        negative,
        neutral,
    }
}
