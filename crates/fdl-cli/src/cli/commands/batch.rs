//! `fdl batch <file>` – download every URL in a list file.

use anyhow::{bail, Result};
use fdl_core::FdlConfig;
use std::path::Path;

use super::execute::execute_requests;
use crate::cli::batch_file::read_batch_file;

pub async fn run_batch(cfg: FdlConfig, file: &Path, download_dir: &Path) -> Result<()> {
    let requests = read_batch_file(file, download_dir)?;
    if requests.is_empty() {
        bail!("no URLs in {}", file.display());
    }
    println!(
        "{} file(s) into {} ({} at a time)",
        requests.len(),
        download_dir.display(),
        cfg.max_concurrent_transfers
    );
    execute_requests(cfg, requests).await
}
