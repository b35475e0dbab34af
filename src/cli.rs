//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use transit_downloader::DEFAULT_OUTPUT_DIR;
use transit_downloader::catalog::DEFAULT_CATALOG_URL;

/// Mirror every public-transit resource of an open-data catalog locally.
///
/// Datasets are discovered through the catalog API, resources are downloaded
/// into `<output>/<dataset>/<format>/<resource>_<date>` folders, and ZIP
/// archives can optionally be expanded in place.
#[derive(Parser, Debug)]
#[command(name = "transit-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Extract ZIP archives after the download phase
    #[arg(short = 'z', long)]
    pub extract_zip: bool,

    /// Worker pool size per stage (1-100). Defaults to min(32, 5 x CPU cores)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub max_threads: Option<u8>,

    /// Directory where downloaded files are saved
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_directory: PathBuf,

    /// Base URL of the dataset catalog
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
