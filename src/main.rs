use tracing_subscriber::EnvFilter;

use news_lens::config::Config;
use news_lens::models::Query;
use news_lens::pipeline::NewsAggregator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(raw_query) = args.first() else {
        print_usage();
        std::process::exit(2);
    };
    let bias_slider = match parse_arg(args.get(1), 0.5_f32) {
        Ok(value) => value,
        Err(raw) => exit_invalid("bias_slider", &raw),
    };
    let limit = match parse_arg(args.get(2), 20_usize) {
        Ok(value) => value,
        Err(raw) => exit_invalid("limit", &raw),
    };

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Embedding provider: {} ({})",
        config.embedding.provider,
        config.embedding.base_url
    );

    let snapshot_path = config.snapshot_path();
    let aggregator = NewsAggregator::new(config)?;

    let query = Query::from_raw(raw_query, bias_slider, limit);
    let result = aggregator.aggregate(&query).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    // Keep rate-limit counters and the embedding cache across runs
    aggregator.state().persist(&snapshot_path);
    Ok(())
}

/// Parse an optional positional argument, falling back to `default` only
/// when the argument is absent. A present but malformed value is an error,
/// never a silent default.
fn parse_arg<T: std::str::FromStr>(arg: Option<&String>, default: T) -> Result<T, String> {
    let Some(raw) = arg else { return Ok(default) };
    raw.parse().map_err(|_| raw.clone())
}

fn exit_invalid(name: &str, raw: &str) -> ! {
    eprintln!("Invalid {name}: '{raw}'");
    print_usage();
    std::process::exit(2);
}

fn print_usage() {
    eprintln!("Usage: news-lens \"<topic and view>\" [bias_slider] [limit]");
    eprintln!("  bias_slider: 0.0 challenges your view, 1.0 supports it (default 0.5)");
    eprintln!("  limit: maximum results (default 20)");
}
