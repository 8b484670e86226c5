//! Download requests, per-resource resume info, and destination naming.

use std::path::{Path, PathBuf};

/// One resource to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub local_path: PathBuf,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            local_path: local_path.into(),
        }
    }

    /// Request saving into `dir` under a name derived from the URL path.
    pub fn into_dir(url: impl Into<String>, dir: &Path) -> Self {
        let url = url.into();
        let name = filename_from_url_path(&url)
            .map(|n| sanitize_filename(&n))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "download.bin".to_string());
        Self {
            local_path: dir.join(name),
            url,
        }
    }
}

/// Size and resumability of one resource, as reported by the prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResumeInfo {
    pub resumable: bool,
    pub content_length: u64,
}

/// Last non-empty path segment of a URL, if any.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Replaces path separators, NUL and control characters with `_` and trims dots and spaces.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    replaced.trim_matches(|c| c == ' ' || c == '.').to_string()
}
