use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, error, warn};
use void_common::error::{Result, VoidError};
use void_common::fetch::Downloader;

use crate::validation::validate_url;

const CONNECT_TIMEOUT_SECS: u64 = 30;
// Some distribution endpoints reject non-browser user agents.
const USER_AGENT_STRING: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Blocking downloader for `http(s)://` and `file://` URLs.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
    show_progress: bool,
}

impl HttpDownloader {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            show_progress: true,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn fetch_http(&self, url: &str, final_path: &Path) -> Result<()> {
        let response = self.client.get(url).send().map_err(|e| {
            debug!("HTTP request failed for {url}: {e}");
            download_error(final_path, url, format!("HTTP request failed: {e}"))
        })?;
        let status = response.status();
        debug!("Received HTTP status: {} for {}", status, url);

        if !status.is_success() {
            error!("HTTP error {} for URL {}", status, url);
            let reason = match status {
                StatusCode::NOT_FOUND => "Resource not found (404)".to_string(),
                StatusCode::FORBIDDEN => "Access forbidden (403)".to_string(),
                other => format!("HTTP error {other}"),
            };
            return Err(download_error(final_path, url, reason));
        }

        let progress = self.progress_bar(response.content_length(), final_path);
        let mut reader = progress.wrap_read(response);
        write_via_temp(final_path, |out| io::copy(&mut reader, out).map(|_| ()))
            .map_err(|e| download_error(final_path, url, format!("Failed to write download: {e}")))?;
        progress.finish_and_clear();
        Ok(())
    }

    fn progress_bar(&self, len: Option<u64>, path: &Path) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = match len {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        let template = if len.is_some() {
            "{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})"
        } else {
            "{msg} {spinner} {bytes}"
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        );
        bar
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let parsed = validate_url(url)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!("Downloading {} to {}", url, dest.display());

        if parsed.scheme() == "file" {
            let source: PathBuf = parsed.to_file_path().map_err(|_| {
                download_error(dest, url, "Invalid file:// URL".to_string())
            })?;
            return write_via_temp(dest, |out| {
                let mut input = File::open(&source)?;
                io::copy(&mut input, out).map(|_| ())
            })
            .map_err(|e| download_error(dest, url, format!("Failed to copy local file: {e}")));
        }

        self.fetch_http(url, dest)
    }
}

fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    // No overall timeout: large archives on slow links must be allowed to finish.
    Client::builder()
        .timeout(None::<Duration>)
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| VoidError::Generic(format!("Failed to build HTTP client: {e}")))
}

/// Writes through a hidden sibling temp file and renames it into place on success.
fn write_via_temp<F>(final_path: &Path, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let temp_filename = format!(
        ".{}.part",
        final_path.file_name().unwrap_or_default().to_string_lossy()
    );
    let temp_path = final_path.with_file_name(temp_filename);
    if temp_path.exists() {
        if let Err(e) = fs::remove_file(&temp_path) {
            warn!(
                "Could not remove existing temporary file {}: {}",
                temp_path.display(),
                e
            );
        }
    }

    let result = File::create(&temp_path).and_then(|file| {
        let mut out = BufWriter::new(file);
        write(&mut out)?;
        out.flush()
    });
    match result {
        Ok(()) => fs::rename(&temp_path, final_path),
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

fn download_error(path: &Path, url: &str, reason: String) -> VoidError {
    VoidError::DownloadError(
        path.file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default(),
        url.to_string(),
        reason,
    )
}
