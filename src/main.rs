use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use mention_collector::{MentionCollector, SourceCollector};
use mention_core::{CollectorConfig, Topic};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "mention_tracker=info,mention_collector=info,reddit_client=info";

#[derive(Parser, Debug)]
#[command(author, version, about = "Collect recent Reddit mentions of a topic as JSON lines")]
struct Args {
    /// TOML file with Reddit credentials and collection settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Topic type: stock, topic, keyword or anything else
    #[arg(long, default_value = "topic")]
    topic_type: String,

    /// JSON-encoded array of keywords, e.g. '["GME","AMC"]'
    #[arg(long, default_value = "[]")]
    keywords: String,

    /// Only keep mentions posted at or after this RFC 3339 instant
    #[arg(long, value_parser = parse_since)]
    since: Option<DateTime<Utc>>,

    #[arg(long, default_value_t = 1)]
    source_id: i64,

    #[arg(long, default_value = "reddit")]
    source_name: String,
}

fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {e}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CollectorConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => CollectorConfig::default(),
    }
    .with_env_overrides();

    if config.client_id.is_empty() || config.client_secret.is_empty() {
        tracing::warn!("Reddit credentials are empty, token acquisition will likely fail");
    }

    let collector = MentionCollector::new(args.source_id, args.source_name.clone(), config)?;
    let topic = Topic::new(args.topic_type.as_str(), args.keywords.clone());

    tracing::info!(
        "Collecting {} mentions for {} topic",
        collector.source_name(),
        topic.topic_type
    );

    let report = collector.collect_with_report(&topic, args.since).await?;

    for failure in &report.failures {
        tracing::warn!(
            "r/{} skipped for {:?} [{}]: {}",
            failure.community,
            failure.keyword,
            failure.error_code,
            failure.message
        );
        if let Some(wait) = failure.retry_after {
            tracing::info!("r/{} may succeed if rerun after {:?}", failure.community, wait);
        }
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for mention in &report.mentions {
        serde_json::to_writer(&mut out, mention)?;
        writeln!(out)?;
    }
    out.flush()?;

    tracing::info!(
        "Emitted {} mentions, {} communities failed",
        report.mentions.len(),
        report.failures.len()
    );
    Ok(())
}
