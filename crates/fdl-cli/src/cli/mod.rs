//! CLI for the FDL batch downloader.

mod batch_file;
mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use fdl_core::config::{self, FdlConfig};
use std::path::PathBuf;

use commands::{run_batch, run_get};

/// Top-level CLI for the FDL batch downloader.
#[derive(Debug, Parser)]
#[command(name = "fdl")]
#[command(about = "FDL: concurrent batch file downloader", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Flags that take precedence over `config.toml`.
#[derive(Debug, Default, Args)]
pub struct ConfigOverrides {
    /// Run at most N transfers at once.
    #[arg(long, global = true, value_name = "N")]
    pub jobs: Option<usize>,

    /// Abort the whole batch after M minutes.
    #[arg(long, global = true, value_name = "M")]
    pub timeout_minutes: Option<u64>,

    /// Print progress and throughput once per second.
    #[arg(long, global = true)]
    pub progress: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, cfg: &mut FdlConfig) {
        if let Some(jobs) = self.jobs {
            cfg.max_concurrent_transfers = jobs;
        }
        if let Some(minutes) = self.timeout_minutes {
            cfg.timeout_minutes = minutes;
        }
        if self.progress {
            cfg.detailed_progress = true;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a single URL.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,

        /// Destination file (default: name from the URL, in the current directory).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Download every URL listed in a file, one `URL [PATH]` per line.
    Batch {
        /// Path to the list file.
        file: PathBuf,

        /// Directory for downloads and relative paths (default: current directory).
        #[arg(short = 'd', long = "dir", value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        cli.overrides.apply(&mut cfg);
        tracing::debug!("effective config: {:?}", cfg);

        match cli.command {
            CliCommand::Get { url, output } => run_get(cfg, &url, output).await?,
            CliCommand::Batch { file, download_dir } => {
                let download_dir = match download_dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_batch(cfg, &file, &download_dir).await?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
