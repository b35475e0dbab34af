//! CLI entry point for the transit downloader.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use transit_downloader::{
    AttributeTable, Catalog, Fetcher, HttpCatalog, Pipeline, PipelineConfig, default_worker_count,
    progress_enabled,
};
use tracing::{debug, info};

mod cli;
mod summary;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let output_root = &args.output_directory;
    tokio::fs::create_dir_all(output_root)
        .await
        .with_context(|| format!("cannot create output directory {}", output_root.display()))?;

    let catalog = Arc::new(
        HttpCatalog::new(&args.catalog_url)
            .with_context(|| format!("invalid catalog URL {}", args.catalog_url))?,
    );
    let datasets = catalog
        .list_datasets()
        .await
        .context("failed to list catalog datasets")?;
    summary::say(
        args.quiet,
        &format!("Number of datasets returned: {}", datasets.len()),
    );

    let attributes = Arc::new(AttributeTable::from_datasets(&datasets));
    let workers = args.max_threads.map_or_else(default_worker_count, usize::from);
    if args.extract_zip {
        summary::say(
            args.quiet,
            "The extraction of the zip files will happen after the download phase.",
        );
    }
    summary::say(args.quiet, &format!("Using {workers} parallel workers"));
    info!(datasets = attributes.len(), workers, "starting pipeline");

    let config = PipelineConfig::new(output_root)
        .with_workers(workers)
        .with_extraction(args.extract_zip)
        .with_progress(progress_enabled(args.quiet));
    let fetcher = Fetcher::new().context("failed to build download client")?;
    let pipeline = Pipeline::new(catalog, fetcher, config)?;

    let result = pipeline.run(attributes).await?;

    for line in summary::render(&result) {
        summary::say(args.quiet, &line);
    }

    Ok(())
}
