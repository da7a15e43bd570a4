use url::Url;

/// The closed set of extraction paths. Classification happens once at the
/// entry point; everything downstream branches on this value instead of
/// re-checking the URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    YoutubeClass,
    InstagramClass,
}

impl Platform {
    /// Instagram URLs get their own extraction path; every other URL goes
    /// through the YouTube-class path. Classification prefers the parsed
    /// host and falls back to a substring check for input the url crate
    /// rejects.
    pub fn classify(raw: &str) -> Self {
        let is_instagram = match Url::parse(raw) {
            Ok(url) => url
                .host_str()
                .is_some_and(|host| host == "instagram.com" || host.ends_with(".instagram.com")),
            Err(_) => raw.contains("instagram.com"),
        };

        if is_instagram {
            Self::InstagramClass
        } else {
            Self::YoutubeClass
        }
    }

    /// Resolver failures are client errors on the Instagram path and
    /// server errors on the YouTube-class path.
    pub fn failure_is_client_error(&self) -> bool {
        matches!(self, Self::InstagramClass)
    }
}
