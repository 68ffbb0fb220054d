//! CLI entry point for the retrieval engine.
//!
//! Walks a directory, builds the index and prints the files most relevant to
//! a query. Main components: Cli parser, Commands enum, and the search runner.

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use coderank::display::spawn_build_progress;
use coderank::indexing::FileWalker;
use coderank::{DependencyGraph, IndexError, RetrievalEngine, SearchOptions, Settings};
use std::path::PathBuf;
use tracing::Level;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Hybrid code retrieval
#[derive(Parser)]
#[command(
    name = "coderank",
    version = env!("CARGO_PKG_VERSION"),
    about = "Hybrid code retrieval",
    long_about = "Rank the files of a codebase against a query using embeddings and dependency-graph locality.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Index a directory and run one query against it
    #[command(about = "Find the files most relevant to a query")]
    Search {
        /// Directory to index
        root: PathBuf,

        /// Natural-language or code query
        query: String,

        /// Dependency graph JSON used for relevance fusion
        #[arg(long)]
        graph: Option<PathBuf>,

        /// Number of vector matches (overrides config)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity of vector matches (overrides config)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display active settings
    #[command(about = "Display active settings from .coderank/settings.toml")]
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        if let Some(index_error) = e.downcast_ref::<IndexError>() {
            for suggestion in index_error.recovery_suggestions() {
                eprintln!("  - {suggestion}");
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // Load configuration
    let config = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Configuration error loading from {}", path.display()))?,
        None => Settings::load().unwrap_or_else(|e| {
            eprintln!("Configuration error: {e}");
            Settings::default()
        }),
    };

    let level = if cli.verbose || config.debug {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Search {
            root,
            query,
            graph,
            top_k,
            threshold,
            json,
        } => {
            let graph = graph
                .map(DependencyGraph::from_json_file)
                .transpose()?;
            search(config, &root, &query, graph, top_k, threshold, json)
        }
    }
}

fn search(
    mut config: Settings,
    root: &std::path::Path,
    query: &str,
    graph: Option<DependencyGraph>,
    top_k: Option<usize>,
    threshold: Option<f32>,
    json: bool,
) -> anyhow::Result<()> {
    // Override config with CLI args
    if let Some(k) = top_k {
        config.search.top_k = k;
    }
    if let Some(t) = threshold {
        config.search.similarity_threshold = t;
    }

    config.indexing.root = Some(root.to_path_buf());
    let paths = FileWalker::new().collect_paths(root);
    let mut engine = RetrievalEngine::new(config)?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let bar = (!json).then(|| spawn_build_progress(rx));
    let stats = engine.initialize(&paths, graph, Some(tx.into()));
    if let Some(handle) = bar {
        let _ = handle.join();
    }
    let stats = stats?;

    let results = engine.search_files(query, SearchOptions::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    stats.display();
    if results.is_empty() {
        println!("No files matched '{query}'");
        return Ok(());
    }

    println!("\nResults for '{query}':");
    for (rank, result) in results.iter().enumerate() {
        let marker = if result.truncated { " (truncated)" } else { "" };
        println!(
            "{:>3}. {:.3}  {}{marker}",
            rank + 1,
            result.relevance_score,
            result.path
        );
    }
    Ok(())
}
