//! Single-stream HTTP GET transfer with optional resume of a partial file.

use anyhow::{Context, Result};
use std::cell::Cell;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str;
use std::time::Duration;

use super::{ByteSink, TransferWorker};
use crate::request::{DownloadRequest, ResumeInfo};
use crate::scope::ExecutionScope;

/// libcurl GET writer. Resumes with a Range request when the server allows it
/// and a shorter partial file is already on disk.
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    connect_timeout: Duration,
    /// Abort if throughput stays under `low_speed_limit` bytes/s for `low_speed_time`.
    low_speed_limit: u32,
    low_speed_time: Duration,
}

impl Default for HttpTransfer {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
        }
    }
}

impl HttpTransfer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Offset to resume from, or 0 to start over.
fn resume_offset(resume: ResumeInfo, existing: u64) -> u64 {
    if resume.resumable && existing > 0 && existing < resume.content_length {
        existing
    } else {
        0
    }
}

/// Opens the destination once the response is known to carry the body:
/// appending after a partial-content answer, otherwise starting over.
fn open_destination(path: &Path, resumed: bool) -> std::io::Result<fs::File> {
    if resumed {
        fs::OpenOptions::new().append(true).open(path)
    } else {
        fs::File::create(path)
    }
}

fn parse_status_line(line: &str) -> Option<u32> {
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

impl TransferWorker for HttpTransfer {
    fn transfer(
        &self,
        scope: &ExecutionScope,
        request: &DownloadRequest,
        resume: ResumeInfo,
        sink: &ByteSink,
    ) -> Result<()> {
        let path = &request.local_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create destination dir: {}", parent.display()))?;
        }

        let existing = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let offset = resume_offset(resume, existing);
        if offset > 0 {
            tracing::debug!(url = %request.url, offset, "requesting resume of partial file");
        }

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(self.low_speed_limit)?;
        easy.low_speed_time(self.low_speed_time)?;
        easy.progress(true)?;
        if offset > 0 {
            easy.resume_from(offset)?;
        }

        // Status of the last header block seen (redirects start new blocks).
        let status = Cell::new(0u32);
        let mut file: Option<fs::File> = None;
        let mut write_error: Option<std::io::Error> = None;
        let perform_result = {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Some(code) = str::from_utf8(data).ok().and_then(parse_status_line) {
                    status.set(code);
                }
                true
            })?;
            transfer.write_function(|data| {
                let code = status.get();
                if !(200..300).contains(&code) {
                    // Error page: leave the destination alone and report nothing.
                    return Ok(0);
                }
                if file.is_none() {
                    let resumed = offset > 0 && code == 206;
                    match open_destination(path, resumed) {
                        Ok(f) => file = Some(f),
                        Err(e) => {
                            write_error = Some(e);
                            return Ok(0);
                        }
                    }
                    if resumed {
                        sink.add(offset);
                    }
                }
                let Some(f) = file.as_mut() else {
                    return Ok(0);
                };
                match f.write_all(data) {
                    Ok(()) => {
                        sink.add(data.len() as u64);
                        Ok(data.len())
                    }
                    Err(e) => {
                        write_error = Some(e);
                        Ok(0) // abort transfer
                    }
                }
            })?;
            transfer.progress_function(|_, _, _, _| !scope.is_cancelled())?;
            transfer.perform()
        };

        if let Err(e) = perform_result {
            if let Some(reason) = scope.err().filter(|_| e.is_aborted_by_callback()) {
                return Err(anyhow::Error::new(reason))
                    .with_context(|| format!("transfer of {} stopped", request.url));
            }
            if let Some(io_err) = write_error {
                return Err(anyhow::Error::new(io_err))
                    .with_context(|| format!("write {}", path.display()));
            }
            let code = status.get();
            if code != 0 && !(200..300).contains(&code) {
                anyhow::bail!("GET {} returned HTTP {}", request.url, code);
            }
            return Err(anyhow::Error::new(e)).with_context(|| format!("GET {} failed", request.url));
        }

        let code = easy.response_code().context("no response code")?;
        if !(200..300).contains(&code) {
            anyhow::bail!("GET {} returned HTTP {}", request.url, code);
        }

        let on_disk = match file {
            Some(mut f) => {
                f.flush()?;
                f.metadata()?.len()
            }
            // Empty 2xx body: nothing was written, create the (empty) file.
            None if offset == 0 => {
                fs::File::create(path)
                    .with_context(|| format!("create file: {}", path.display()))?;
                0
            }
            None => existing,
        };
        if resume.content_length > 0 && on_disk != resume.content_length {
            anyhow::bail!(
                "partial transfer: wrote {} of {} bytes",
                on_disk,
                resume.content_length
            );
        }
        Ok(())
    }
}
