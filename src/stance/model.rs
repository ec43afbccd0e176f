//! Model layer: HTTP zero-shot classification against an external entailment
//! service. One request per belief/document pair; the caller decides whether
//! the returned confidence is good enough.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::StanceConfig;
use crate::models::{Stance, StanceMethod, StanceResult};

/// Maximum characters of belief + article sent per request.
const MAX_CLASSIFY_CHARS: usize = 2_000;

const LABEL_SUPPORT: &str = "supports the belief";
const LABEL_OPPOSE: &str = "opposes the belief";
const LABEL_NEUTRAL: &str = "is neutral toward the belief";

fn candidate_labels() -> Vec<String> {
    vec![
        LABEL_SUPPORT.to_string(),
        LABEL_OPPOSE.to_string(),
        LABEL_NEUTRAL.to_string(),
    ]
}

fn stance_for_label(label: &str) -> Stance {
    if label.contains("support") {
        Stance::Support
    } else if label.contains("oppose") {
        Stance::Oppose
    } else {
        Stance::Neutral
    }
}

fn truncate_input(text: &str) -> &str {
    if text.len() <= MAX_CLASSIFY_CHARS {
        return text;
    }
    let mut end = MAX_CLASSIFY_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Client for the zero-shot stance endpoint. Only constructed when a base URL
/// is configured.
pub struct ModelClient {
    client: reqwest::Client,
    endpoint: String,
    model: Option<String>,
    timeout: std::time::Duration,
}

impl ModelClient {
    pub fn from_config(client: reqwest::Client, config: &StanceConfig) -> Option<Self> {
        let base_url = config.base_url.as_deref()?;
        Some(Self {
            client,
            endpoint: format!("{}/classify", base_url.trim_end_matches('/')),
            model: config.model.clone(),
            timeout: std::time::Duration::from_secs(config.timeout_secs.min(30)),
        })
    }

    /// Classify the document against the belief. Returns Err if the endpoint
    /// is unreachable, times out, or responds with a malformed payload.
    pub async fn classify(&self, belief: &str, text: &str) -> Result<StanceResult> {
        let input = format!("Belief: {belief}\n\nArticle: {text}");

        let req_body = ZeroShotRequest {
            inputs: truncate_input(&input).to_string(),
            parameters: ZeroShotParameters {
                candidate_labels: candidate_labels(),
            },
            model: self.model.clone(),
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&req_body)
            .send()
            .await
            .context("Failed to reach stance model endpoint")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Stance model returned {status}: {body}");
        }

        let body: ZeroShotResponse = resp
            .json()
            .await
            .context("Failed to parse stance model response")?;

        let label = body
            .labels
            .first()
            .context("Stance model returned no labels")?;
        let confidence = *body
            .scores
            .first()
            .context("Stance model returned no scores")?;

        Ok(StanceResult {
            stance: stance_for_label(label),
            confidence,
            method: StanceMethod::Model,
            evidence: vec![format!("model confidence {confidence:.3}")],
        })
    }
}

// ─── Request/Response types ────────────────────────────

#[derive(Serialize)]
struct ZeroShotRequest {
    inputs: String,
    parameters: ZeroShotParameters,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
}

#[derive(Serialize)]
struct ZeroShotParameters {
    candidate_labels: Vec<String>,
}

#[derive(Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f32>,
}
