//! End-to-end pipeline tests driven through mock search backends.
//!
//! The embedding endpoint points at an unroutable port, or at a loopback
//! listener when a test needs to observe embedding traffic; no test leaves
//! the machine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use news_lens::config::Config;
use news_lens::error::PipelineError;
use news_lens::models::{CandidateDocument, Query, Stance};
use news_lens::pipeline::NewsAggregator;
use news_lens::retrieval::SearchBackend;

struct StaticBackend {
    name: &'static str,
    docs: Vec<CandidateDocument>,
}

#[async_trait]
impl SearchBackend for StaticBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, _term: &str, max_results: usize) -> Result<Vec<CandidateDocument>> {
        Ok(self.docs.iter().take(max_results).cloned().collect())
    }
}

struct FailingBackend(&'static str);

#[async_trait]
impl SearchBackend for FailingBackend {
    fn name(&self) -> &'static str {
        self.0
    }

    async fn search(&self, _term: &str, _max_results: usize) -> Result<Vec<CandidateDocument>> {
        anyhow::bail!("HTTP 503 from upstream")
    }
}

fn doc(url: &str, domain: &str, title: &str, body: &str) -> CandidateDocument {
    CandidateDocument {
        url: url.to_string(),
        title: title.to_string(),
        body: body.to_string(),
        source_name: domain.to_string(),
        source_domain: domain.to_string(),
        published_at: None,
    }
}

/// Ten climate articles: six supporting renewable energy, four opposing it.
fn climate_fixture() -> Vec<CandidateDocument> {
    vec![
        doc(
            "https://reuters.com/renewables-grid",
            "reuters.com",
            "Renewable energy reaches record share of the climate grid",
            "A major study confirms that renewable energy is cutting climate emissions faster \
             than projected. Experts say the transition supports grid stability across the region.",
        ),
        doc(
            "https://apnews.com/renewables-costs",
            "apnews.com",
            "States expand renewable programs as climate deadlines near",
            "New analysis demonstrates that renewable power is effective at lowering climate \
             costs, and utility officials back the energy plan.",
        ),
        doc(
            "https://npr.org/renewables-resilience",
            "npr.org",
            "Renewable build-out accelerates across climate-focused states",
            "Researchers found that renewable energy adoption strengthens local climate \
             resilience, a result consistent with earlier field reports.",
        ),
        doc(
            "https://nytimes.com/renewables-jobs",
            "nytimes.com",
            "Renewable energy jobs grow in climate regions",
            "The renewable energy sector now supports thousands of climate-focused jobs, a \
             successful record that validates the state's approach.",
        ),
        doc(
            "https://bbc.com/renewables-air",
            "bbc.com",
            "Air quality tracks renewable adoption, climate data indicate",
            "Evidence shows that renewable generation improves air quality. Climate scientists \
             agree the energy shift has been beneficial for public health.",
        ),
        doc(
            "https://wsj.com/renewables-report",
            "wsj.com",
            "Renewable expansion tied to climate gains in new report",
            "A research study shows climate gains in regions where renewable energy expanded. \
             Local leaders endorse the program as essential infrastructure.",
        ),
        doc(
            "https://cnn.com/renewables-mandate",
            "cnn.com",
            "Renewable mandate draws fire in climate cost debate",
            "Critics reject the renewable energy mandate, arguing it worsens climate costs for \
             households. A think tank report debunks the projected savings.",
        ),
        doc(
            "https://foxnews.com/renewables-subsidies",
            "foxnews.com",
            "Economists split over renewable subsidies and climate math",
            "Economists dispute whether renewable subsidies deliver, calling the energy program \
             ineffective and harmful to broader climate progress.",
        ),
        doc(
            "https://usatoday.com/renewables-budget",
            "usatoday.com",
            "State climate plan faces pushback on renewable costs",
            "The proposal is contrary to the state's climate goals, opponents argue, and a \
             budget review questions the renewable energy cost figures.",
        ),
        doc(
            "https://bloomberg.com/renewables-grid-fight",
            "bloomberg.com",
            "Grid concerns cloud renewable push amid climate fights",
            "Lawmakers reject the renewable targets as unworkable and warn the energy plan \
             undermines grid reliability amid climate policy fights.",
        ),
    ]
}

fn test_config(dir: &std::path::Path) -> Config {
    let mut config = Config {
        data_dir: dir.to_path_buf(),
        ..Config::default()
    };
    config.embedding.base_url = "http://127.0.0.1:9".to_string();
    config
}

fn support_query() -> Query {
    Query {
        topic: "climate".to_string(),
        user_view: "I support renewable energy".to_string(),
        bias_slider: 1.0,
        limit: 5,
    }
}

/// Minimal embedding endpoint that counts every connection it accepts and
/// answers each request with a fixed vector after a short delay.
async fn serve_counting_embedder(listener: TcpListener, hits: Arc<AtomicUsize>) {
    loop {
        let Ok((mut socket, _)) = listener.accept().await else {
            break;
        };
        hits.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(Duration::from_millis(200)).await;
            let body = r#"{"embeddings":[[0.1,0.2,0.3]]}"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        });
    }
}

#[tokio::test]
async fn test_supportive_slider_returns_supporting_articles() {
    let dir = tempfile::tempdir().unwrap();
    let backends: Vec<Box<dyn SearchBackend>> = vec![Box::new(StaticBackend {
        name: "fixture",
        docs: climate_fixture(),
    })];
    let aggregator =
        NewsAggregator::with_backends(test_config(dir.path()), backends, None).unwrap();

    let result = aggregator.aggregate(&support_query()).await.unwrap();

    assert_eq!(result.results.len(), 5);
    for row in &result.results {
        assert_eq!(
            row.stance.stance,
            Stance::Support,
            "expected only supporting articles at slider 1.0, got {} for {}",
            row.stance.confidence,
            row.document.url
        );
        // At slider 1.0 with a positive view, bias match equals stance confidence
        assert!((row.score.bias_match - row.stance.confidence).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&row.score.final_score));
    }

    // No duplicate URLs in the selection
    let mut urls: Vec<&str> = result.results.iter().map(|r| r.document.url.as_str()).collect();
    urls.sort_unstable();
    urls.dedup();
    assert_eq!(urls.len(), 5);

    // Ranked descending by final score
    for pair in result.results.windows(2) {
        assert!(pair[0].score.final_score >= pair[1].score.final_score);
    }

    // The embedding endpoint is unreachable, so the run reports degradation
    assert!(result.degraded.iter().any(|d| d == "embedding"));
    assert_eq!(result.stance_distribution.support, 5);
    assert_eq!(result.stance_distribution.oppose, 0);
}

#[tokio::test]
async fn test_challenge_slider_prefers_opposing_articles() {
    let dir = tempfile::tempdir().unwrap();
    let backends: Vec<Box<dyn SearchBackend>> = vec![Box::new(StaticBackend {
        name: "fixture",
        docs: climate_fixture(),
    })];
    let aggregator =
        NewsAggregator::with_backends(test_config(dir.path()), backends, None).unwrap();

    let query = Query {
        bias_slider: 0.0,
        limit: 4,
        ..support_query()
    };
    let result = aggregator.aggregate(&query).await.unwrap();

    assert_eq!(result.results.len(), 4);
    for row in &result.results {
        assert_eq!(row.stance.stance, Stance::Oppose);
        // At slider 0.0, opposing articles score their full confidence
        assert!((row.score.bias_match - row.stance.confidence).abs() < 1e-6);
    }
    assert_eq!(result.stance_distribution.oppose, 4);
}

#[tokio::test]
async fn test_duplicate_urls_across_backends_collapse() {
    let dir = tempfile::tempdir().unwrap();
    let shared = doc(
        "https://reuters.com/shared",
        "reuters.com",
        "Renewable energy brief on climate",
        "A study confirms that renewable energy supports climate goals.",
    );
    let backends: Vec<Box<dyn SearchBackend>> = vec![
        Box::new(StaticBackend {
            name: "one",
            docs: vec![shared.clone()],
        }),
        Box::new(StaticBackend {
            name: "two",
            docs: vec![shared],
        }),
    ];
    let aggregator =
        NewsAggregator::with_backends(test_config(dir.path()), backends, None).unwrap();

    let result = aggregator.aggregate(&support_query()).await.unwrap();

    assert_eq!(result.results.len(), 1);
    assert!(result.stats.duplicates_dropped > 0);
}

#[tokio::test]
async fn test_no_source_dominates_beyond_diversity_cap() {
    let dir = tempfile::tempdir().unwrap();
    let docs: Vec<CandidateDocument> = (0..8)
        .map(|i| {
            doc(
                &format!("https://cnn.com/renewables-{i}"),
                "cnn.com",
                "Renewable energy and the climate economy",
                "A study confirms that renewable energy supports climate goals in the region.",
            )
        })
        .collect();
    let backends: Vec<Box<dyn SearchBackend>> =
        vec![Box::new(StaticBackend { name: "one", docs })];
    let aggregator =
        NewsAggregator::with_backends(test_config(dir.path()), backends, None).unwrap();

    let query = Query {
        limit: 20,
        ..support_query()
    };
    let result = aggregator.aggregate(&query).await.unwrap();

    // limit 20 allows max(3, 20/5) = 4 documents per source domain
    let cnn_count = result
        .results
        .iter()
        .filter(|r| r.document.source_domain == "cnn.com")
        .count();
    assert!(cnn_count <= 4, "cnn.com contributed {cnn_count} documents");
    assert!(result.stats.diversity_dropped > 0);
}

#[tokio::test]
async fn test_all_backends_failing_returns_no_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let backends: Vec<Box<dyn SearchBackend>> = vec![
        Box::new(FailingBackend("one")),
        Box::new(FailingBackend("two")),
    ];
    let aggregator =
        NewsAggregator::with_backends(test_config(dir.path()), backends, None).unwrap();

    let result = aggregator.aggregate(&support_query()).await;
    assert!(matches!(result, Err(PipelineError::NoCandidatesFound)));
}

#[tokio::test]
async fn test_failed_backend_degrades_but_does_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let backends: Vec<Box<dyn SearchBackend>> = vec![
        Box::new(FailingBackend("down")),
        Box::new(StaticBackend {
            name: "fixture",
            docs: climate_fixture(),
        }),
    ];
    let aggregator =
        NewsAggregator::with_backends(test_config(dir.path()), backends, None).unwrap();

    let result = aggregator.aggregate(&support_query()).await.unwrap();

    assert!(!result.results.is_empty());
    assert!(result.degraded.iter().any(|d| d == "down"));
}

#[tokio::test]
async fn test_identical_queries_rank_identically() {
    let dir = tempfile::tempdir().unwrap();
    let backends: Vec<Box<dyn SearchBackend>> = vec![Box::new(StaticBackend {
        name: "fixture",
        docs: climate_fixture(),
    })];
    let aggregator =
        NewsAggregator::with_backends(test_config(dir.path()), backends, None).unwrap();

    let first = aggregator.aggregate(&support_query()).await.unwrap();
    let second = aggregator.aggregate(&support_query()).await.unwrap();

    let first_urls: Vec<&str> = first.results.iter().map(|r| r.document.url.as_str()).collect();
    let second_urls: Vec<&str> = second.results.iter().map(|r| r.document.url.as_str()).collect();
    assert_eq!(first_urls, second_urls);
}

#[tokio::test]
async fn test_request_counters_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let snapshot_path = config.snapshot_path();

    let backends: Vec<Box<dyn SearchBackend>> = vec![Box::new(StaticBackend {
        name: "fixture",
        docs: climate_fixture(),
    })];
    let aggregator = NewsAggregator::with_backends(config.clone(), backends, None).unwrap();

    let result = aggregator.aggregate(&support_query()).await.unwrap();
    assert_eq!(
        aggregator.state().request_count("fixture") as usize,
        result.stats.backend_requests
    );
    aggregator.state().persist(&snapshot_path);

    let restarted = NewsAggregator::with_backends(config, Vec::new(), None).unwrap();
    assert_eq!(
        restarted.state().request_count("fixture") as usize,
        result.stats.backend_requests
    );
}

#[tokio::test]
async fn test_dropping_query_future_stops_embedding_calls() {
    let dir = tempfile::tempdir().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_counting_embedder(listener, hits.clone()));

    let mut config = test_config(dir.path());
    config.embedding.base_url = format!("http://{addr}");
    // One permit keeps the remaining documents queued behind the first
    // embed call while the run is cancelled.
    config.scoring_concurrency = 1;

    let backends: Vec<Box<dyn SearchBackend>> = vec![Box::new(StaticBackend {
        name: "fixture",
        docs: climate_fixture(),
    })];
    let aggregator = NewsAggregator::with_backends(config, backends, None).unwrap();
    let query = support_query();

    // Run until the query embedding and the first document embedding have
    // reached the service, then drop the whole aggregation future.
    let reached_scoring = {
        let hits = hits.clone();
        async move {
            while hits.load(Ordering::SeqCst) < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    };
    tokio::select! {
        _ = aggregator.aggregate(&query) => panic!("aggregation finished before it was cancelled"),
        _ = reached_scoring => {}
    }

    let at_drop = hits.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(
        hits.load(Ordering::SeqCst),
        at_drop,
        "embedding calls kept arriving after the query future was dropped"
    );
}
