use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::MediaError;
use super::resolver;
use super::types::{
    Container, DownloadResolution, EncodingOption, Extraction, MediaDescriptor, MediaType,
};
use super::ytdlp::{ExtractOptions, YtDlp};

/// The two operations every platform path supports.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Human-readable name of the extraction path
    fn name(&self) -> &'static str;

    /// Describe the media behind a URL: metadata plus quality variants
    async fn describe(&self, url: &str) -> Result<MediaDescriptor, MediaError>;

    /// Resolve a direct download URL for the requested quality
    async fn resolve(&self, url: &str, quality: &str) -> Result<DownloadResolution, MediaError>;
}

pub struct YoutubeExtractor {
    adapter: Arc<YtDlp>,
}

impl YoutubeExtractor {
    pub fn new(adapter: Arc<YtDlp>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl Extractor for YoutubeExtractor {
    fn name(&self) -> &'static str {
        "youtube-class"
    }

    async fn describe(&self, url: &str) -> Result<MediaDescriptor, MediaError> {
        let opts = ExtractOptions {
            format: Some("best[ext=mp4]/best"),
            harden: true,
        };
        let value = self.adapter.extract(url, &opts).await?;
        resolver::build_descriptor(&Extraction::from_value(&value))
    }

    async fn resolve(&self, url: &str, quality: &str) -> Result<DownloadResolution, MediaError> {
        let target = resolver::target_height(quality);

        // Bounded fallback: walk the selector chain until one attempt
        // yields a direct URL or a non-empty format list.
        let mut extraction = None;
        for selector in resolver::selector_chain(target) {
            let opts = ExtractOptions {
                format: Some(selector.as_str()),
                harden: true,
            };
            match self.adapter.extract(url, &opts).await {
                Ok(value) => {
                    let candidate = Extraction::from_value(&value);
                    if resolver::is_usable(&candidate) {
                        extraction = Some(candidate);
                        break;
                    }
                    debug!(selector = %selector, "selector produced no usable result");
                }
                Err(err) => {
                    warn!(selector = %selector, "selector failed: {err:#}");
                }
            }
        }
        let extraction = extraction.ok_or(MediaError::NoUsableFormat)?;

        resolver::build_resolution(&extraction, target)
    }
}

pub struct InstagramExtractor {
    adapter: Arc<YtDlp>,
}

impl InstagramExtractor {
    pub fn new(adapter: Arc<YtDlp>) -> Self {
        Self { adapter }
    }

    async fn extract_best(&self, url: &str) -> Result<Extraction, MediaError> {
        let opts = ExtractOptions {
            format: Some("best"),
            harden: false,
        };
        let value = self.adapter.extract(url, &opts).await?;
        Ok(Extraction::from_first_entry(&value))
    }
}

#[async_trait]
impl Extractor for InstagramExtractor {
    fn name(&self) -> &'static str {
        "instagram-class"
    }

    async fn describe(&self, url: &str) -> Result<MediaDescriptor, MediaError> {
        let extraction = self.extract_best(url).await?;

        // Single "Download" entry carrying the direct URL; no ranking.
        let option = EncodingOption {
            quality: "Download".to_string(),
            media_type: MediaType::Video,
            filesize: extraction.filesize.map(resolver::size_mb).unwrap_or(0.0),
            format_id: extraction.format_id.clone().unwrap_or_default(),
            extension: Container::coerce(extraction.ext.as_deref()),
            height: extraction.height,
            url: extraction.url.clone(),
        };

        Ok(MediaDescriptor {
            title: extraction
                .title
                .clone()
                .unwrap_or_else(|| "Instagram Video".to_string()),
            thumbnail: extraction.thumbnail.clone(),
            duration: extraction.duration,
            author: extraction
                .uploader
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            formats: vec![option],
        })
    }

    async fn resolve(&self, url: &str, _quality: &str) -> Result<DownloadResolution, MediaError> {
        let extraction = self.extract_best(url).await?;
        resolver::build_instagram_resolution(&extraction)
    }
}
