//! Parser for `fdl batch` list files.
//!
//! One request per line: `URL [PATH]`. Blank lines and lines starting with `#`
//! are skipped. A missing path means "name from the URL"; relative paths are
//! resolved against the download directory.

use anyhow::{bail, Context, Result};
use fdl_core::DownloadRequest;
use std::path::Path;

pub fn read_batch_file(path: &Path, download_dir: &Path) -> Result<Vec<DownloadRequest>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read batch file: {}", path.display()))?;
    parse_batch(&text, download_dir).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_batch(text: &str, download_dir: &Path) -> Result<Vec<DownloadRequest>> {
    let mut requests = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (url, dest) = match line.split_once(char::is_whitespace) {
            Some((url, rest)) => (url, Some(rest.trim())),
            None => (line, None),
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!("line {}: not an http(s) URL: {}", lineno + 1, url);
        }
        let request = match dest.filter(|d| !d.is_empty()) {
            Some(dest) => DownloadRequest::new(url, download_dir.join(dest)),
            None => DownloadRequest::into_dir(url, download_dir),
        };
        requests.push(request);
    }
    Ok(requests)
}
