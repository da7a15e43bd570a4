use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::NamedTempFile;

/// Request-scoped cookie jar for the extractor. The decoded blob lives in
/// a named temporary file that is removed when this value drops, whichever
/// way the enclosing request ends.
pub struct CookieFile {
    file: NamedTempFile,
}

impl CookieFile {
    pub fn materialize(blob: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(blob.trim())
            .context("decoding cookie blob")?;
        let mut file = NamedTempFile::new().context("creating cookie file")?;
        file.write_all(&bytes).context("writing cookie file")?;
        file.flush().context("flushing cookie file")?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
