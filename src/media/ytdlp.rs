use anyhow::{Context, Result};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::cookies::CookieFile;

const EXTRACT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Browser-like headers sent on hardened extractions to dodge bot checks.
const BROWSER_HEADERS: &[&str] = &[
    "User-Agent:Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Accept:text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    "Accept-Language:en-us,en;q=0.5",
    "Sec-Fetch-Mode:navigate",
];

const PLAYER_CLIENTS: &str = "youtube:player_client=android,web";

/// Options for one extraction call.
#[derive(Debug, Default, Clone)]
pub struct ExtractOptions<'a> {
    /// yt-dlp format selector; none means the extractor's default.
    pub format: Option<&'a str>,
    /// Send the browser header set and the android/web player clients.
    pub harden: bool,
}

/// Extraction adapter: shells out to yt-dlp and returns its JSON document
/// untouched. Interpretation of the document is the resolver's job.
pub struct YtDlp {
    cookie_blob: Option<String>,
}

impl YtDlp {
    pub fn new(cookie_blob: Option<String>) -> Self {
        Self { cookie_blob }
    }

    pub async fn extract(&self, url: &str, opts: &ExtractOptions<'_>) -> Result<Value> {
        debug!(url, format = opts.format, "extracting with yt-dlp");

        // Keep the cookie file alive until the subprocess has exited.
        let cookies = self.cookie_file();

        let mut command = Command::new("yt-dlp");
        command
            .arg("--dump-single-json")
            .arg("--no-download")
            .arg("--no-warnings");
        if let Some(selector) = opts.format {
            command.arg("--format").arg(selector);
        }
        if opts.harden {
            command.arg("--extractor-args").arg(PLAYER_CLIENTS);
            for header in BROWSER_HEADERS {
                command.arg("--add-headers").arg(header);
            }
        }
        if let Some(cookies) = &cookies {
            command.arg("--cookies").arg(cookies.path());
        }
        command.arg(url);

        let output = tokio::time::timeout(EXTRACT_TIMEOUT, command.output())
            .await
            .context("media extraction timed out")?
            .context("failed to run yt-dlp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("yt-dlp failed: {}", stderr.trim()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim()).context("parsing yt-dlp output")
    }

    /// Materialize the configured cookie blob for this call. A bad blob is
    /// logged and treated as no cookies at all.
    fn cookie_file(&self) -> Option<CookieFile> {
        let blob = self.cookie_blob.as_deref()?;
        match CookieFile::materialize(blob) {
            Ok(file) => Some(file),
            Err(err) => {
                warn!("ignoring cookie blob: {err:#}");
                None
            }
        }
    }
}

/// Check that the yt-dlp binary is reachable on PATH.
pub async fn probe() -> bool {
    match Command::new("yt-dlp").arg("--version").output().await {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            info!("yt-dlp is available, version: {}", version.trim());
            true
        }
        Ok(_) => {
            warn!("yt-dlp --version exited with an error");
            false
        }
        Err(err) => {
            warn!("yt-dlp not found: {err}");
            false
        }
    }
}
