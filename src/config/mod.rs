use anyhow::{Context, Result};
use serde::Deserialize;

/// Base64-encoded cookie jar for the extractor. Absence is a normal,
/// supported state.
pub const COOKIE_ENV: &str = "EXTRACTION_COOKIES";

const HOST_ENV: &str = "VIDGRAB_HOST";
const PORT_ENV: &str = "VIDGRAB_PORT";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// "json" or "pretty"
    pub log_format: String,
    /// Usually supplied through EXTRACTION_COOKIES instead of the file.
    pub cookies_base64: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_format: "json".to_string(),
            cookies_base64: None,
        }
    }
}

impl Settings {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {path}"))?;
        toml::from_str(&raw).with_context(|| format!("parsing config from {path}"))
    }

    /// Environment variables win over the config file.
    pub fn apply_env(mut self) -> Self {
        if let Ok(host) = std::env::var(HOST_ENV) {
            if !host.is_empty() {
                self.host = host;
            }
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
        if let Ok(blob) = std::env::var(COOKIE_ENV) {
            if !blob.is_empty() {
                self.cookies_base64 = Some(blob);
            }
        }
        self
    }
}
