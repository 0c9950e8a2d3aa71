//! Interaction graph crawler CLI
//!
//! Crawls two reference communities, follows their users across the
//! platform and writes the resulting graph as a GEXF file.

mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use forum_client::{FixtureClient, PlatformClient, RedditClient, DEBUG_COMMUNITIES};
use interaction_graph::{output_filename, run_crawl, write_gexf, CrawlConfig, ReferencePair};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "interaction-crawl")]
#[command(about = "Build an in-group/out-group interaction graph for two communities")]
struct Cli {
    /// First reference community
    #[arg(required_unless_present = "debug")]
    community1: Option<String>,

    /// Second reference community
    #[arg(required_unless_present = "debug")]
    community2: Option<String>,

    /// Run against built-in fixture communities instead of the live platform
    #[arg(short, long)]
    debug: bool,

    /// Log crawl progress and print a graph summary
    #[arg(short, long)]
    verbose: bool,

    /// Items fetched per listing, or `None` for as many as available
    #[arg(short, long, default_value = "1", value_parser = parse_limit)]
    limit: Limit,

    /// Directory the GEXF file is written to (overrides GRAPH_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

/// Listing limit; `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Limit(Option<usize>);

fn parse_limit(raw: &str) -> std::result::Result<Limit, String> {
    if raw.eq_ignore_ascii_case("none") {
        return Ok(Limit(None));
    }
    raw.parse::<usize>()
        .map(|n| Limit(Some(n)))
        .map_err(|_| format!("expected a number or `None`, got `{}`", raw))
}

fn reference_pair(first: String, second: String) -> Result<ReferencePair> {
    let pair = ReferencePair::new(first, second);
    if pair.is_single_community() {
        anyhow::bail!(
            "reference communities must differ; got {} and {}",
            pair.first(),
            pair.second()
        );
    }
    Ok(pair)
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "error,interaction_crawl=debug,interaction_graph=debug,forum_client=debug"
    } else {
        "error"
    }
}

fn init_tracing(verbose: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = Settings::from_env()?;
    let output_dir = cli.output_dir.clone().unwrap_or(settings.output_dir.clone());

    let mut config = CrawlConfig::new()
        .verbose(cli.verbose)
        .with_fetch_limit(cli.limit.0);

    let (pair, client): (ReferencePair, Box<dyn PlatformClient>) = if cli.debug {
        config = config.debug();
        (
            ReferencePair::new(DEBUG_COMMUNITIES.0, DEBUG_COMMUNITIES.1),
            Box::new(FixtureClient::debug_pair()),
        )
    } else {
        let (first, second) = cli
            .community1
            .zip(cli.community2)
            .context("two communities are required outside debug mode")?;
        let pair = reference_pair(first, second)?;
        let client = RedditClient::new(settings.reddit).context("Failed to build platform client")?;
        (pair, Box::new(client))
    };

    tracing::info!(first = %pair.first(), second = %pair.second(), "Crawling");
    let outcome = run_crawl(client.as_ref(), &pair, &config)
        .await
        .context("Crawl aborted")?;

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(output_filename(
        pair.first(),
        pair.second(),
        config.fetch_limit,
        chrono::Utc::now(),
    ));

    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_gexf(&outcome.graph, &mut writer).context("Failed to write graph")?;
    writer.flush().context("Failed to write graph")?;

    tracing::info!(
        nodes = outcome.graph.node_count(),
        edges = outcome.graph.edge_count(),
        path = %path.display(),
        "Wrote graph"
    );
    Ok(())
}
