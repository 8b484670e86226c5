//! `fdl get <url>` – download one file.

use anyhow::Result;
use fdl_core::{DownloadRequest, FdlConfig};
use std::path::PathBuf;

use super::execute::execute_requests;

pub async fn run_get(cfg: FdlConfig, url: &str, output: Option<PathBuf>) -> Result<()> {
    let request = match output {
        Some(path) => DownloadRequest::new(url, path),
        None => DownloadRequest::into_dir(url, &std::env::current_dir()?),
    };
    println!("{} -> {}", request.url, request.local_path.display());
    execute_requests(cfg, vec![request]).await
}
