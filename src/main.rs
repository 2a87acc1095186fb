use relation_engine::config::RelateConfig;
use relation_engine::dataset::{joined_columns, Dataset};
use relation_engine::profiler::ColumnProfiler;
use relation_engine::{
    all_relationships, detect_relationships, detect_relationships_parallel, load_dataset,
    JoinEngine, RelationshipSummary,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "relation-engine")]
#[command(about = "Detect relationships across tabular datasets and join them")]
#[command(version)]
struct Args {
    /// JSON config file (defaults apply to every missing field)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect relationships between every pair of files
    Detect {
        /// CSV or Parquet files, in dataset order
        files: Vec<PathBuf>,

        /// Shard comparisons across worker threads
        #[arg(long)]
        parallel: bool,

        /// Print a per-type summary instead of the relationship list
        #[arg(long)]
        summary: bool,
    },
    /// Detect relationships, then join every file onto the first one
    Join {
        /// CSV or Parquet files; the first is the base of the join
        files: Vec<PathBuf>,

        /// Write joined rows here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Profile the columns of one file
    Profile {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Commands::Detect {
            files,
            parallel,
            summary,
        } => run_detect(&config, &files, parallel, summary).await,
        Commands::Join { files, output } => run_join(&config, &files, output.as_deref()),
        Commands::Profile { file } => run_profile(&config, &file),
    }
}

fn load_config(path: Option<&Path>) -> Result<RelateConfig> {
    let config = match path {
        Some(path) => RelateConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RelateConfig::default(),
    };
    Ok(config.apply_env()?)
}

fn load_all(files: &[PathBuf]) -> Result<Vec<Dataset>> {
    files
        .iter()
        .map(|path| {
            let dataset = load_dataset(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            info!(
                "Loaded {} ({} rows, {} columns)",
                dataset.name,
                dataset.row_count(),
                dataset.columns.len()
            );
            Ok(dataset)
        })
        .collect()
}

async fn run_detect(
    config: &RelateConfig,
    files: &[PathBuf],
    parallel: bool,
    summary: bool,
) -> Result<()> {
    let datasets = load_all(files)?;

    let detected = if parallel {
        detect_relationships_parallel(&datasets, config).await?
    } else {
        detect_relationships(&datasets, config)
    };
    let relationships = all_relationships(&detected);
    info!("Found {} relationships", relationships.len());

    if summary {
        let summary = RelationshipSummary::from_relationships(&relationships);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&relationships)?);
    }
    Ok(())
}

fn run_join(config: &RelateConfig, files: &[PathBuf], output: Option<&Path>) -> Result<()> {
    let datasets = detect_relationships(&load_all(files)?, config);
    let relationships = all_relationships(&datasets);

    let report = JoinEngine::new(config.chain_mode).join_with_report(&datasets, &relationships);
    info!(
        "Joined {} rows over {} columns ({} relationships applied, {} skipped)",
        report.rows.len(),
        joined_columns(&report.rows).len(),
        report.applied.len(),
        report.skipped.len()
    );

    let json = serde_json::to_string_pretty(&report.rows)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote joined rows to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_profile(config: &RelateConfig, file: &Path) -> Result<()> {
    let dataset = load_dataset(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let profiles = ColumnProfiler::new(config.profiler_config()).profile_dataset(&dataset);
    println!("{}", serde_json::to_string_pretty(&profiles)?);
    Ok(())
}
