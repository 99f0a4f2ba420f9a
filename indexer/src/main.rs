use anyhow::Result;
use clap::{Parser, Subcommand};
use newsroom_content::load_articles;
use newsroom_core::{build_index, passes_min_length, query_top, FieldBoosts, RankedResult, Snapshot};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use std::path::Path;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an article search snapshot from export files and query it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank articles against a query
    Search {
        /// Input path (.json/.jsonl file or directory)
        #[arg(long)]
        input: String,
        /// Free-text query; fewer than two characters returns nothing
        #[arg(long)]
        query: String,
        /// Number of results to print
        #[arg(short, long, default_value_t = 10)]
        k: usize,
        #[arg(long, default_value_t = 2.0)]
        title_boost: f64,
        #[arg(long, default_value_t = 1.0)]
        excerpt_boost: f64,
        /// Emit one JSON object per result
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print document and term counts
    Stats {
        #[arg(long)]
        input: String,
    },
}

#[derive(Serialize)]
struct Stats {
    documents: usize,
    terms: usize,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Search { input, query, k, title_boost, excerpt_boost, json } => {
            let snapshot = load_snapshot(&input)?;
            let boosts = FieldBoosts { title: title_boost, excerpt: excerpt_boost, ..FieldBoosts::default() };
            let results = run_search(&snapshot, &query, &boosts, k);
            tracing::info!(query = %query, hits = results.len(), "search complete");
            for r in &results {
                if json {
                    println!("{}", serde_json::to_string(r)?);
                } else {
                    println!("{:>8.3}  {:<40}  {}", r.score, r.key, r.article.title);
                }
            }
            Ok(())
        }
        Commands::Stats { input } => {
            let snapshot = load_snapshot(&input)?;
            let stats = Stats { documents: snapshot.len(), terms: snapshot.term_count() };
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

fn load_snapshot(input: &str) -> Result<Snapshot> {
    let articles = load_articles(Path::new(input))?;
    let snapshot = build_index(articles);
    tracing::info!(input, documents = snapshot.len(), terms = snapshot.term_count(), "snapshot built");
    Ok(snapshot)
}

fn run_search(snapshot: &Snapshot, text: &str, boosts: &FieldBoosts, k: usize) -> Vec<RankedResult> {
    if !passes_min_length(text) {
        return Vec::new();
    }
    query_top(snapshot, text, boosts, k)
}
