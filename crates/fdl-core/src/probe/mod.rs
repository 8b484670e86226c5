//! Size and resumability probing.
//!
//! The orchestrator only depends on [`SizeProber`]. [`HttpProber`] is the
//! default implementation: an HTTP HEAD request through libcurl that reads
//! `Content-Length` and `Accept-Ranges: bytes`.

mod parse;

use std::str;
use std::time::Duration;

use crate::error::ProbeError;
use crate::request::ResumeInfo;

/// Resolves the total size of a resource and whether it can be resumed.
///
/// Blocking; the orchestrator runs it on the blocking pool. Must be safe to
/// call from several threads for different resources.
pub trait SizeProber: Send + Sync {
    fn probe(&self, url: &str) -> Result<ResumeInfo, ProbeError>;
}

/// HEAD-request prober backed by libcurl.
#[derive(Debug, Clone)]
pub struct HttpProber {
    connect_timeout: Duration,
    timeout: Duration,
}

impl Default for HttpProber {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(30),
        }
    }
}

impl HttpProber {
    pub fn new() -> Self {
        Self::default()
    }

    fn head(&self, url: &str) -> Result<(u32, Vec<String>), curl::Error> {
        let mut headers: Vec<String> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.nobody(true)?; // HEAD request
        easy.follow_location(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    let line = s.trim_end();
                    // A redirect starts a new header block; keep only the final response's headers.
                    if line.starts_with("HTTP/") {
                        headers.clear();
                    }
                    headers.push(line.to_string());
                }
                true
            })?;
            transfer.perform()?;
        }

        Ok((easy.response_code()?, headers))
    }
}

impl SizeProber for HttpProber {
    fn probe(&self, url: &str) -> Result<ResumeInfo, ProbeError> {
        let (code, headers) = self
            .head(url)
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        if !(200..300).contains(&code) {
            return Err(ProbeError::Http(code));
        }
        let head = parse::parse_headers(&headers);
        tracing::debug!(
            url,
            content_length = ?head.content_length,
            accept_ranges = head.accept_ranges,
            "probed resource"
        );
        let content_length = head.content_length.ok_or(ProbeError::UnknownSize)?;
        Ok(ResumeInfo {
            resumable: head.accept_ranges,
            content_length,
        })
    }
}
