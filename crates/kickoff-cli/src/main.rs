//! Kickoff CLI - Command-line interface
//!
//! Usage:
//!   kickoff query [QUESTION] [-k N]
//!   kickoff concat
//!   kickoff build-docs
//!   kickoff build-index [--metric cosine]

mod logging;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use kickoff_core::{AppConfig, DistanceMetric};
use kickoff_ingest::{build_documents, concat_seasons, load_match_documents, IndexBuilder};
use kickoff_rag::RagPipeline;
use kickoff_vector::create_embedding_provider;

#[derive(Parser)]
#[command(name = "kickoff")]
#[command(about = "Semantic search over Premier League match reports")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the matches closest to a question and summarize them
    Query {
        /// Question to ask; read from stdin when omitted
        question: Option<String>,
        /// Number of matches to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Merge per-season CSV files into one
    Concat {
        #[arg(long)]
        raw_dir: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render the combined CSV as a text file of match documents
    BuildDocs {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Embed every match and write the vector index and metadata
    BuildIndex {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        index: Option<PathBuf>,
        #[arg(long)]
        metadata: Option<PathBuf>,
        /// l2, cosine or inner_product
        #[arg(long)]
        metric: Option<DistanceMetric>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config)?;
    let _guard = logging::init(&config.logging)?;

    match cli.command {
        Commands::Query { question, top_k } => {
            let question = match question {
                Some(question) => question,
                None => prompt_query()?,
            };
            let question = question.trim();
            if question.is_empty() {
                bail!("query is empty");
            }

            let pipeline = RagPipeline::from_config(&config)?;
            let summary = match top_k {
                Some(k) => pipeline.query(question, k).await?,
                None => pipeline.query_default(question).await?,
            };
            println!("{summary}");
        }
        Commands::Concat { raw_dir, out } => {
            let raw_dir = raw_dir.unwrap_or(config.ingest.raw_dir);
            let out = out.unwrap_or(config.ingest.combined_csv);
            let rows = concat_seasons(&raw_dir, &out)?;
            println!("Wrote {rows} matches to {}", out.display());
        }
        Commands::BuildDocs { input, out } => {
            let input = input.unwrap_or(config.ingest.combined_csv);
            let out = out.unwrap_or(config.ingest.documents_path);
            let count = build_documents(&input, &out)?;
            println!("Wrote {count} match documents to {}", out.display());
        }
        Commands::BuildIndex {
            input,
            index,
            metadata,
            metric,
        } => {
            let input = input.unwrap_or(config.ingest.combined_csv);
            let index = index.unwrap_or(config.retrieval.index_path);
            let metadata = metadata.unwrap_or(config.retrieval.metadata_path);

            let documents = load_match_documents(&input)?;
            let embedder = create_embedding_provider(&config.embedding)?;
            let count = IndexBuilder::new(embedder)
                .with_batch_size(config.embedding.batch_size)
                .with_metric(metric.unwrap_or(config.retrieval.metric))
                .build_and_save(&documents, &index, &metadata)
                .await?;
            println!(
                "Indexed {count} matches into {} and {}",
                index.display(),
                metadata.display()
            );
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path.clone())
            .and_then(AppConfig::with_env_override)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::from_env().context("failed to read config from environment")?,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn prompt_query() -> anyhow::Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Enter your query: ")?;
    stderr.flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
