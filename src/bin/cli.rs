//! notice-ingest CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use notice_ingest::{
    error::{AppError, Result},
    models::Config,
    pipeline::{IngestOptions, IngestSummary, Ingestor},
    rag::{VectorStore, format_context},
    services::{HttpLauncher, SourceRegistry},
    storage::{LocalStorage, SnapshotIndex, StateStorage},
};

/// Incremental SKKU notice ingest
#[derive(Parser, Debug)]
#[command(
    name = "notice-ingest",
    version,
    about = "Crawl SKKU notice boards incrementally and index new notices"
)]
struct Cli {
    /// Path to storage directory containing config and state files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl new notices and add them to the local index
    Ingest {
        /// Also ingest PDFs from the inbox
        #[arg(long)]
        pdf: bool,

        /// Skip crawling (PDF only)
        #[arg(long)]
        no_crawl: bool,

        /// Ignore stored watermarks and crawl every board from the top
        #[arg(long)]
        create: bool,

        /// Crawl without writing state or index files
        #[arg(long)]
        dry_run: bool,
    },

    /// Preview new notices without writing state or indexing
    Crawl {
        /// Only crawl the board with this name
        #[arg(long)]
        source: Option<String>,
    },

    /// Search the local index
    Search {
        query: String,

        /// Number of chunks to return (default: ingest.retrieval_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Print the latest notices from the last run
    Latest,

    /// Show watermark sizes per board
    State,

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn log_summary(summary: &IngestSummary) {
    for report in &summary.sources {
        match &report.error {
            Some(error) => log::warn!("  {}: failed ({error})", report.board_name),
            None => log::info!(
                "  {}: {} new, {} pages, stopped by {:?}",
                report.board_name,
                report.new_notices,
                report.pages,
                report.stop_reason
            ),
        }
    }
    log::info!(
        "{} new notices, {} PDF documents ({} files archived), {} chunks in {}s",
        summary.new_notices,
        summary.pdf_documents,
        summary.pdfs_archived,
        summary.chunks,
        (summary.finished_at - summary.started_at).num_seconds()
    );
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);
    let storage = LocalStorage::new(&cli.storage_dir, config.paths.clone());

    match cli.command {
        Command::Ingest {
            pdf,
            no_crawl,
            create,
            dry_run,
        } => {
            config.validate()?;
            let registry = SourceRegistry::from_config(&config)?;
            let launcher = HttpLauncher::new(&config.crawler)?;
            let index = SnapshotIndex::open(storage.clone()).await;

            let ingestor = Ingestor {
                config: &config,
                storage: &storage,
                registry: &registry,
                launcher: &launcher,
                vector_store: Some(&index),
                pdf_dirs: storage.pdf_dirs(),
            };
            let options = IngestOptions {
                include_crawl: !no_crawl,
                include_pdf: pdf,
                create,
                dry_run,
            };
            let summary = ingestor.run(&options).await?;
            log_summary(&summary);
        }

        Command::Crawl { source } => {
            config.validate()?;
            let mut registry = SourceRegistry::from_config(&config)?;
            if let Some(name) = source {
                registry.retain(&name)?;
            }
            let launcher = HttpLauncher::new(&config.crawler)?;

            let ingestor = Ingestor {
                config: &config,
                storage: &storage,
                registry: &registry,
                launcher: &launcher,
                vector_store: None,
                pdf_dirs: storage.pdf_dirs(),
            };
            let options = IngestOptions {
                dry_run: true,
                ..IngestOptions::default()
            };
            let summary = ingestor.run(&options).await?;
            log_summary(&summary);
        }

        Command::Search { query, k } => {
            let index = SnapshotIndex::open(storage.clone()).await;
            if index.is_empty() {
                return Err(AppError::config("Local index is empty. Run 'ingest' first."));
            }
            let hits = index
                .query(&query, k.unwrap_or(config.ingest.retrieval_k))
                .await?;
            let chunks: Vec<_> = hits.into_iter().map(|hit| hit.chunk).collect();
            println!("{}", format_context(&chunks));
        }

        Command::Latest => {
            let latest = storage.load_latest().await;
            if latest.is_empty() {
                log::info!("No latest notices yet.");
            }
            for notice in latest {
                println!(
                    "[{}] {} ({}) {}",
                    notice.board_name, notice.title, notice.date, notice.link
                );
            }
        }

        Command::State => {
            let store = storage.load_watermarks().await;
            log::info!("Storage directory: {}", cli.storage_dir.display());
            for (board, count) in store.summary() {
                println!("{board}: {count}");
            }
            println!("total: {}", store.total());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            let registry = SourceRegistry::from_config(&config)?;
            log::info!("✓ Config OK ({} sources)", registry.len());
            for source in registry.iter() {
                log::info!("  {} -> {}", source.board_name(), source.list_url(0)?);
            }
        }
    }

    Ok(())
}
