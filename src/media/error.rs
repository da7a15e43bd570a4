use thiserror::Error;

/// Failures the resolver can report. Anything outside this closed set is
/// an extractor fault carried through `Extraction`.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("URL is required")]
    InvalidInput,
    #[error("no video formats available")]
    NoFormatsAvailable,
    #[error("no format selector produced a usable result")]
    NoUsableFormat,
    #[error("no downloadable video formats")]
    NoVideoFormats,
    #[error("extractor did not report a download URL")]
    NoDownloadUrl,
    #[error(transparent)]
    Extraction(#[from] anyhow::Error),
}

impl MediaError {
    /// Extractor faults get a generic 500 regardless of platform; the
    /// resolver taxonomy maps per platform.
    pub fn is_extraction_fault(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }
}
