//! Backend search adapters: NewsAPI, GNews, and the Guardian, plus the
//! deterministic sample backend used when nothing else is available.
//!
//! Adapters parse payloads defensively. Missing fields are tolerated and
//! documents without a usable URL are dropped; only transport-level and
//! API-level failures surface as errors.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;

use crate::config::SourcesConfig;
use crate::models::CandidateDocument;

/// NewsAPI truncates article bodies and appends a marker like `[+1234 chars]`.
static TRUNCATION_MARKER_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[\+\d+ chars\]").ok());

/// Strip truncation markers and surrounding whitespace from a body.
pub fn clean_body(text: &str) -> String {
    match TRUNCATION_MARKER_RE.as_ref() {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Registrable domain of a URL, without any `www.` prefix. None when the URL
/// does not parse or has no host.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches("www.").to_string())
}

fn parse_published(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// ─── Adapter trait ───────────────────────────────────────

/// A news-search backend. Implementations must tolerate arbitrary upstream
/// failures by returning an error, never panicking.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Stable name used for rate-limit counters and logs.
    fn name(&self) -> &'static str;

    /// Search for documents matching a term.
    async fn search(&self, term: &str, max_results: usize) -> Result<Vec<CandidateDocument>>;
}

/// Production adapters in priority order, each present only when its API key
/// is configured.
pub fn from_config(client: &reqwest::Client, config: &SourcesConfig) -> Vec<Box<dyn SearchBackend>> {
    let mut backends: Vec<Box<dyn SearchBackend>> = Vec::new();

    if let Some(key) = &config.news_api_key {
        backends.push(Box::new(NewsApiBackend::new(client.clone(), key.clone())));
    }
    if let Some(key) = &config.gnews_api_key {
        backends.push(Box::new(GnewsBackend::new(client.clone(), key.clone())));
    }
    if let Some(key) = &config.guardian_api_key {
        backends.push(Box::new(GuardianBackend::new(client.clone(), key.clone())));
    }

    backends
}

// ─── NewsAPI ─────────────────────────────────────────────

pub struct NewsApiBackend {
    client: reqwest::Client,
    api_key: String,
}

impl NewsApiBackend {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    source: NewsApiSource,
}

#[derive(Deserialize, Default)]
struct NewsApiSource {
    #[serde(default)]
    name: Option<String>,
}

fn newsapi_documents(payload: NewsApiResponse) -> Vec<CandidateDocument> {
    payload
        .articles
        .into_iter()
        .filter_map(|item| {
            let url = item.url?;
            let domain = domain_of(&url)?;
            let body = item.content.or(item.description).unwrap_or_default();
            Some(CandidateDocument {
                source_name: item.source.name.unwrap_or_else(|| domain.clone()),
                source_domain: domain,
                title: item.title.unwrap_or_default(),
                body: clean_body(&body),
                published_at: parse_published(item.published_at.as_deref()),
                url,
            })
        })
        .collect()
}

#[async_trait]
impl SearchBackend for NewsApiBackend {
    fn name(&self) -> &'static str {
        "newsapi"
    }

    async fn search(&self, term: &str, max_results: usize) -> Result<Vec<CandidateDocument>> {
        let page_size = max_results.min(100).to_string();
        let resp = self
            .client
            .get("https://newsapi.org/v2/everything")
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", term),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach NewsAPI")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("NewsAPI returned {status}: {body}");
        }

        let payload: NewsApiResponse = resp
            .json()
            .await
            .context("Failed to parse NewsAPI response")?;

        if payload.status != "ok" {
            anyhow::bail!(
                "NewsAPI error: {}",
                payload.message.as_deref().unwrap_or("unknown")
            );
        }

        Ok(newsapi_documents(payload))
    }
}

// ─── GNews ───────────────────────────────────────────────

pub struct GnewsBackend {
    client: reqwest::Client,
    api_key: String,
}

impl GnewsBackend {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Deserialize)]
struct GnewsResponse {
    #[serde(default)]
    errors: Option<serde_json::Value>,
    #[serde(default)]
    articles: Vec<GnewsArticle>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GnewsArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    source: GnewsSource,
}

#[derive(Deserialize, Default)]
struct GnewsSource {
    #[serde(default)]
    name: Option<String>,
}

fn gnews_documents(payload: GnewsResponse) -> Vec<CandidateDocument> {
    payload
        .articles
        .into_iter()
        .filter_map(|item| {
            let url = item.url?;
            let domain = domain_of(&url)?;
            let body = item.content.or(item.description).unwrap_or_default();
            Some(CandidateDocument {
                source_name: item.source.name.unwrap_or_else(|| domain.clone()),
                source_domain: domain,
                title: item.title.unwrap_or_default(),
                body: clean_body(&body),
                published_at: parse_published(item.published_at.as_deref()),
                url,
            })
        })
        .collect()
}

#[async_trait]
impl SearchBackend for GnewsBackend {
    fn name(&self) -> &'static str {
        "gnews"
    }

    async fn search(&self, term: &str, max_results: usize) -> Result<Vec<CandidateDocument>> {
        let max = max_results.to_string();
        let resp = self
            .client
            .get("https://gnews.io/api/v4/search")
            .query(&[
                ("q", term),
                ("lang", "en"),
                ("max", max.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach GNews")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GNews returned {status}: {body}");
        }

        let payload: GnewsResponse = resp
            .json()
            .await
            .context("Failed to parse GNews response")?;

        if let Some(errors) = &payload.errors {
            anyhow::bail!("GNews error: {errors}");
        }

        Ok(gnews_documents(payload))
    }
}

// ─── Guardian ────────────────────────────────────────────

pub struct GuardianBackend {
    client: reqwest::Client,
    api_key: String,
}

impl GuardianBackend {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[derive(Deserialize)]
struct GuardianEnvelope {
    #[serde(default)]
    response: GuardianResponse,
}

#[derive(Deserialize, Default)]
struct GuardianResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    results: Vec<GuardianResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuardianResult {
    #[serde(default)]
    web_title: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    web_publication_date: Option<String>,
    #[serde(default)]
    fields: Option<GuardianFields>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuardianFields {
    #[serde(default)]
    body_text: Option<String>,
}

fn guardian_documents(payload: GuardianResponse) -> Vec<CandidateDocument> {
    payload
        .results
        .into_iter()
        .filter_map(|item| {
            let url = item.web_url?;
            let domain = domain_of(&url)?;
            let title = item.web_title.unwrap_or_default();
            let body = item
                .fields
                .and_then(|f| f.body_text)
                .unwrap_or_else(|| title.clone());
            Some(CandidateDocument {
                source_name: "The Guardian".to_string(),
                source_domain: domain,
                title,
                body: clean_body(&body),
                published_at: parse_published(item.web_publication_date.as_deref()),
                url,
            })
        })
        .collect()
}

#[async_trait]
impl SearchBackend for GuardianBackend {
    fn name(&self) -> &'static str {
        "guardian"
    }

    async fn search(&self, term: &str, max_results: usize) -> Result<Vec<CandidateDocument>> {
        let page_size = max_results.min(50).to_string();
        let resp = self
            .client
            .get("https://content.guardianapis.com/search")
            .query(&[
                ("q", term),
                ("page-size", page_size.as_str()),
                ("show-fields", "headline,bodyText"),
                ("order-by", "relevance"),
                ("api-key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach Guardian API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Guardian API returned {status}: {body}");
        }

        let payload: GuardianEnvelope = resp
            .json()
            .await
            .context("Failed to parse Guardian response")?;

        if payload.response.status != "ok" {
            anyhow::bail!(
                "Guardian API error: {}",
                payload.response.message.as_deref().unwrap_or("unknown")
            );
        }

        Ok(guardian_documents(payload.response))
    }
}

// ─── Sample fallback ─────────────────────────────────────

/// Fixture outlets spanning the lean axis, so fallback runs still exercise
/// source-diversity and ideology scoring.
const SAMPLE_OUTLETS: &[(&str, &str)] = &[
    ("reuters.com", "Reuters"),
    ("cnn.com", "CNN"),
    ("foxnews.com", "Fox News"),
    ("nytimes.com", "New York Times"),
    ("wsj.com", "Wall Street Journal"),
    ("ap.org", "Associated Press"),
];

fn slugify(term: &str) -> String {
    let mut slug = String::new();
    let mut prev_dash = true;
    for c in term.chars() {
        if c.is_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn sample_title(term: &str, index: usize) -> String {
    match index % 3 {
        0 => format!("{term} efforts show measurable progress"),
        1 => format!("{term} plans face mounting criticism"),
        _ => format!("{term} policy review underway"),
    }
}

fn sample_body(term: &str, index: usize) -> String {
    match index % 3 {
        0 => format!(
            "A new study confirms that {term} programs are effective. Experts back the \
             approach and say the evidence shows that progress is real."
        ),
        1 => format!(
            "Critics say there is no evidence that {term} policies work. A new report \
             debunks the central claims and rejects the plan as ineffective."
        ),
        _ => format!(
            "Officials met this week to review {term} policy. The briefing provided \
             background, an overview of current programs, and a summary of open questions."
        ),
    }
}

/// Deterministic fixture backend. Always succeeds, always returns the same
/// documents for the same term, and keeps the pipeline drivable with no API
/// keys configured.
pub struct SampleBackend;

#[async_trait]
impl SearchBackend for SampleBackend {
    fn name(&self) -> &'static str {
        "sample"
    }

    async fn search(&self, term: &str, max_results: usize) -> Result<Vec<CandidateDocument>> {
        let slug = slugify(term);
        let count = max_results.min(SAMPLE_OUTLETS.len());

        let documents = (0..count)
            .map(|i| {
                let (domain, name) = SAMPLE_OUTLETS[i];
                CandidateDocument {
                    url: format!("https://{domain}/{slug}-{i}"),
                    title: sample_title(term, i),
                    body: sample_body(term, i),
                    source_name: name.to_string(),
                    source_domain: domain.to_string(),
                    published_at: None,
                }
            })
            .collect();

        Ok(documents)
    }
}
