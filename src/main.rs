//! Deploykit CLI - catalog validation and media fetching.
//!
//! Exit-code contract: `validate` returns 0 for a well-formed catalog and
//! 1 otherwise; `fetch-media` returns 0 when every entry was fetched and
//! verified, and 1 (listing the failed identifiers) otherwise.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use deploykit::batch;
use deploykit::catalog::MediaCatalog;
use deploykit::config::Config;

#[derive(Parser)]
#[command(name = "deploykit")]
#[command(about = "Offline OS deployment media toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that a media catalog is well-formed
    Validate {
        /// Path to the catalog JSON file
        catalog: PathBuf,
    },

    /// Fetch every catalog entry to the media root
    FetchMedia {
        /// Path to the catalog JSON file
        catalog: PathBuf,

        /// Destination root (default: MEDIA_ROOT from config)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Skip checksum verification for entries that declare one
        #[arg(long)]
        skip_checksums: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Validate { catalog } => {
            let payload = read_catalog(&catalog)?;
            match MediaCatalog::parse(&payload) {
                Ok(parsed) => {
                    println!("Catalog OK: {} entries", parsed.len());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Invalid catalog: {e}");
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::FetchMedia {
            catalog,
            dest,
            skip_checksums,
        } => {
            let payload = read_catalog(&catalog)?;
            let parsed = match MediaCatalog::parse(&payload) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("Invalid catalog: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            };

            let base_dir = std::env::current_dir().context("Failed to get current directory")?;
            let config = Config::load(&base_dir);
            let dest_root = dest.unwrap_or(config.media_root);

            println!("Fetching {} entries to {}", parsed.len(), dest_root.display());
            let report = batch::fetch_all(&parsed, &dest_root, !skip_checksums)?;
            report.print_summary();

            Ok(if report.is_failure() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}

fn read_catalog(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))
}
