mod cookies;
mod error;
mod extractor;
mod platform;
mod resolver;
mod types;
mod ytdlp;

pub use error::MediaError;
pub use platform::Platform;
pub use resolver::DEFAULT_QUALITY;
pub use types::{DownloadResolution, MediaDescriptor};
pub use ytdlp::probe;

use std::sync::Arc;

use extractor::{Extractor, InstagramExtractor, YoutubeExtractor};
use tracing::info;
use ytdlp::YtDlp;

/// Front door for the two media operations. Holds one extractor per
/// platform path; the caller classifies the URL once and passes the
/// platform in so it can also map failures to the right status class.
pub struct MediaService {
    youtube: YoutubeExtractor,
    instagram: InstagramExtractor,
}

impl MediaService {
    pub fn new(cookie_blob: Option<String>) -> Self {
        let adapter = Arc::new(YtDlp::new(cookie_blob));
        Self {
            youtube: YoutubeExtractor::new(adapter.clone()),
            instagram: InstagramExtractor::new(adapter),
        }
    }

    pub async fn describe(
        &self,
        platform: Platform,
        url: &str,
    ) -> Result<MediaDescriptor, MediaError> {
        let extractor = self.extractor_for(platform);
        info!(url, extractor = extractor.name(), "describe request");
        extractor.describe(url).await
    }

    pub async fn resolve(
        &self,
        platform: Platform,
        url: &str,
        quality: &str,
    ) -> Result<DownloadResolution, MediaError> {
        let extractor = self.extractor_for(platform);
        info!(
            url,
            quality,
            extractor = extractor.name(),
            "download resolution request"
        );
        extractor.resolve(url, quality).await
    }

    fn extractor_for(&self, platform: Platform) -> &dyn Extractor {
        match platform {
            Platform::YoutubeClass => &self.youtube,
            Platform::InstagramClass => &self.instagram,
        }
    }
}
