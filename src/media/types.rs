use serde::Serialize;
use serde_json::Value;

/// Container extensions the API reports. Anything else the extractor
/// declares coerces to mp4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
    Mkv,
}

impl Container {
    pub fn coerce(raw: Option<&str>) -> Self {
        match raw {
            Some("mp4") => Self::Mp4,
            Some("webm") => Self::Webm,
            Some("mkv") => Self::Mkv,
            _ => Self::Mp4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
}

/// One entry of the extractor's `formats` array. Every field is optional
/// in the wild; heights are coerced to 0 when absent or non-numeric so
/// ordering over them is total, and empty URL strings are treated as
/// absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFormat {
    pub format_id: String,
    pub ext: Option<String>,
    pub height: u32,
    pub filesize: Option<f64>,
    pub vcodec: Option<String>,
    pub format_note: Option<String>,
    pub quality: Option<String>,
    pub url: Option<String>,
}

impl RawFormat {
    pub fn from_value(value: &Value) -> Self {
        Self {
            format_id: value["format_id"].as_str().unwrap_or("").to_string(),
            ext: non_empty_str(&value["ext"]),
            height: height_or_zero(&value["height"]),
            filesize: value["filesize"].as_f64(),
            vcodec: non_empty_str(&value["vcodec"]),
            format_note: non_empty_str(&value["format_note"]),
            quality: non_empty_str(&value["quality"]),
            url: non_empty_str(&value["url"]),
        }
    }

    /// Audio-only entries declare `vcodec: "none"`. A missing codec field
    /// counts as video.
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }
}

/// Top-level fields of one extraction, defensively defaulted.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub title: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub ext: Option<String>,
    pub height: u32,
    pub filesize: Option<f64>,
    pub url: Option<String>,
    pub format_id: Option<String>,
    pub formats: Vec<RawFormat>,
}

impl Extraction {
    pub fn from_value(value: &Value) -> Self {
        Self {
            title: non_empty_str(&value["title"]).or_else(|| non_empty_str(&value["fulltitle"])),
            thumbnail: non_empty_str(&value["thumbnail"]),
            duration: value["duration"].as_f64(),
            uploader: non_empty_str(&value["uploader"]),
            ext: non_empty_str(&value["ext"]),
            height: height_or_zero(&value["height"]),
            filesize: value["filesize"].as_f64(),
            url: non_empty_str(&value["url"]),
            format_id: non_empty_str(&value["format_id"]),
            formats: value["formats"]
                .as_array()
                .map(|formats| formats.iter().map(RawFormat::from_value).collect())
                .unwrap_or_default(),
        }
    }

    /// Carousel posts arrive as a collection; the first entry wins.
    pub fn from_first_entry(value: &Value) -> Self {
        Self::from_value(value["entries"].get(0).unwrap_or(value))
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn height_or_zero(value: &Value) -> u32 {
    value.as_f64().map(|h| h as u32).unwrap_or(0)
}

/// Metadata plus the deduplicated quality variants for one URL. Built once
/// per extraction call and discarded after the response is sent.
#[derive(Debug, Clone, Serialize)]
pub struct MediaDescriptor {
    pub title: String,
    pub thumbnail: Option<String>,
    pub duration: Option<f64>,
    pub author: String,
    pub formats: Vec<EncodingOption>,
}

/// One downloadable rendition offered to the client.
#[derive(Debug, Clone, Serialize)]
pub struct EncodingOption {
    pub quality: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Size in megabytes, rounded to two decimals; 0 when unknown.
    pub filesize: f64,
    pub format_id: String,
    pub extension: Container,
    pub height: u32,
    /// Only the Instagram "Download" entry carries a direct URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A single chosen encoding bound to a resolved direct-access URL.
/// Computed independently of any descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResolution {
    pub download_url: String,
    pub title: String,
    pub quality: String,
    /// Size in megabytes; `None` when the extractor did not report one.
    pub filesize: Option<f64>,
    pub format: Container,
    pub extension: Container,
}
