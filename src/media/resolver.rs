//! Format-resolution decision logic.
//!
//! Pure and synchronous: normalizes the extractor's raw format list into
//! the deduplicated, ranked variants of a describe response, and picks a
//! single format for a download resolution. Nothing here panics; unknown
//! heights compare as 0 so every ordering is total.

use std::collections::HashSet;

use super::error::MediaError;
use super::types::{
    Container, DownloadResolution, EncodingOption, Extraction, MediaDescriptor, MediaType,
    RawFormat,
};

pub const DEFAULT_QUALITY: &str = "720p";
const DEFAULT_TARGET_HEIGHT: u32 = 720;
const BYTES_PER_MB: f64 = 1_048_576.0;

/// Bytes to megabytes, rounded to two decimals.
pub fn size_mb(bytes: f64) -> f64 {
    (bytes / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Build a describe response from one extraction: drop audio-only entries,
/// deduplicate quality labels (first seen wins), and sort by height
/// descending with unknown heights last. When the list comes out empty but
/// the extractor reported a default format at the top level, a single
/// "best" entry is synthesized from the descriptor-level fields.
pub fn build_descriptor(extraction: &Extraction) -> Result<MediaDescriptor, MediaError> {
    let mut formats = normalize_formats(&extraction.formats);

    if formats.is_empty() {
        let format_id = extraction
            .format_id
            .clone()
            .ok_or(MediaError::NoFormatsAvailable)?;
        formats.push(EncodingOption {
            quality: "best".to_string(),
            media_type: MediaType::Video,
            filesize: 0.0,
            format_id,
            extension: Container::coerce(extraction.ext.as_deref()),
            height: extraction.height,
            url: None,
        });
    }

    // Stable sort: equal heights keep their declaration order.
    formats.sort_by(|a, b| b.height.cmp(&a.height));

    Ok(MediaDescriptor {
        title: extraction
            .title
            .clone()
            .unwrap_or_else(|| "Untitled".to_string()),
        thumbnail: extraction.thumbnail.clone(),
        duration: extraction.duration,
        author: extraction
            .uploader
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
        formats,
    })
}

fn normalize_formats(raw: &[RawFormat]) -> Vec<EncodingOption> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for format in raw {
        if !format.has_video() {
            continue;
        }

        let quality = quality_label(format);
        if !seen.insert(quality.clone()) {
            continue;
        }

        out.push(EncodingOption {
            quality,
            media_type: MediaType::Video,
            filesize: format.filesize.map(size_mb).unwrap_or(0.0),
            format_id: format.format_id.clone(),
            extension: Container::coerce(format.ext.as_deref()),
            height: format.height,
            url: None,
        });
    }

    out
}

fn quality_label(format: &RawFormat) -> String {
    if format.height > 0 {
        return format!("{}p", format.height);
    }
    format
        .format_note
        .clone()
        .or_else(|| format.quality.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Parse a target height out of a quality string like "720p"; anything
/// unparseable falls back to 720.
pub fn target_height(quality: &str) -> u32 {
    quality
        .strip_suffix('p')
        .and_then(|height| height.parse().ok())
        .unwrap_or(DEFAULT_TARGET_HEIGHT)
}

/// The yt-dlp selectors tried in order for a download resolution, most
/// specific first: a merged stream capped at the target height, then
/// single streams capped at the target, then unconstrained best.
pub fn selector_chain(target: u32) -> Vec<String> {
    vec![
        format!(
            "bestvideo[height<={target}][ext=mp4]+bestaudio[ext=m4a]/best[height<={target}][ext=mp4]"
        ),
        format!("best[height<={target}][ext=mp4]"),
        format!("best[height<={target}]"),
        "best[ext=mp4]".to_string(),
        "best".to_string(),
    ]
}

/// A selector attempt is usable when the extractor reported either a
/// direct URL or at least one declared format.
pub fn is_usable(extraction: &Extraction) -> bool {
    extraction.url.is_some() || !extraction.formats.is_empty()
}

/// Pick one format for a download: keep entries with a video codec and a
/// URL, rank by (container preference, height) descending, then take the
/// first entry whose height fits under the target. When nothing fits, the
/// top-ranked entry overall wins.
///
/// The ceiling scan runs over the container-first ranking, so a lower mp4
/// can beat a taller webm that also fits; this mirrors the upstream
/// behavior on purpose.
pub fn select_download_format<'a>(
    formats: &'a [RawFormat],
    target: u32,
) -> Result<&'a RawFormat, MediaError> {
    let mut candidates: Vec<&RawFormat> = formats
        .iter()
        .filter(|format| format.has_video() && format.url.is_some())
        .collect();

    if candidates.is_empty() {
        return Err(MediaError::NoVideoFormats);
    }

    candidates.sort_by(|a, b| rank_key(b).cmp(&rank_key(a)));

    Ok(candidates
        .iter()
        .find(|format| format.height <= target)
        .copied()
        .unwrap_or(candidates[0]))
}

/// Build a download resolution from a usable extraction. A top-level
/// direct URL short-circuits the ranking; otherwise one format is picked
/// under the target height. Size stays `None` when the extractor did not
/// report one, unlike the describe path's 0 default.
pub fn build_resolution(
    extraction: &Extraction,
    target: u32,
) -> Result<DownloadResolution, MediaError> {
    let title = extraction
        .title
        .clone()
        .unwrap_or_else(|| "Video".to_string());

    if let Some(direct) = &extraction.url {
        let extension = Container::coerce(extraction.ext.as_deref());
        return Ok(DownloadResolution {
            download_url: direct.clone(),
            title,
            quality: height_label(extraction.height),
            filesize: extraction.filesize.map(size_mb),
            format: extension,
            extension,
        });
    }

    let chosen = select_download_format(&extraction.formats, target)?;
    let download_url = chosen.url.clone().ok_or(MediaError::NoDownloadUrl)?;
    let extension = Container::coerce(chosen.ext.as_deref());
    Ok(DownloadResolution {
        download_url,
        title,
        quality: height_label(chosen.height),
        filesize: chosen.filesize.map(size_mb),
        format: extension,
        extension,
    })
}

/// Instagram path: a direct URL is required and the quality is always
/// reported as "original".
pub fn build_instagram_resolution(
    extraction: &Extraction,
) -> Result<DownloadResolution, MediaError> {
    let download_url = extraction.url.clone().ok_or(MediaError::NoDownloadUrl)?;
    let extension = Container::coerce(extraction.ext.as_deref());

    Ok(DownloadResolution {
        download_url,
        title: extraction
            .title
            .clone()
            .unwrap_or_else(|| "Instagram Video".to_string()),
        quality: "original".to_string(),
        filesize: extraction.filesize.map(size_mb),
        format: extension,
        extension,
    })
}

fn height_label(height: u32) -> String {
    if height > 0 {
        format!("{height}p")
    } else {
        "unknown".to_string()
    }
}

fn rank_key(format: &RawFormat) -> (u8, u32) {
    (container_score(format.ext.as_deref()), format.height)
}

/// Tie-break toward broadly compatible containers: mp4 over webm/mkv over
/// anything else.
fn container_score(ext: Option<&str>) -> u8 {
    match ext {
        Some("mp4") => 10,
        Some("webm") | Some("mkv") => 5,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_format(format_id: &str, height: u32, ext: &str) -> RawFormat {
        RawFormat {
            format_id: format_id.to_string(),
            ext: Some(ext.to_string()),
            height,
            vcodec: Some("avc1".to_string()),
            url: Some(format!("https://cdn.example/{format_id}")),
            ..RawFormat::default()
        }
    }

    fn extraction_with(formats: Vec<RawFormat>) -> Extraction {
        Extraction {
            title: Some("clip".to_string()),
            formats,
            ..Extraction::default()
        }
    }

    #[test]
    fn test_size_mb_exact_megabyte() {
        assert_eq!(size_mb(1_048_576.0), 1.0);
    }

    #[test]
    fn test_size_mb_rounds_to_two_decimals() {
        assert_eq!(size_mb(104_857_600.0), 100.0);
        assert_eq!(size_mb(1_500_000.0), 1.43);
    }

    #[test]
    fn test_describe_drops_audio_only() {
        let mut audio = RawFormat::default();
        audio.vcodec = Some("none".to_string());
        let descriptor =
            build_descriptor(&extraction_with(vec![audio, video_format("22", 720, "mp4")]))
                .unwrap();
        assert_eq!(descriptor.formats.len(), 1);
        assert_eq!(descriptor.formats[0].quality, "720p");
    }

    #[test]
    fn test_describe_labels_are_unique_first_seen_wins() {
        let mut second = video_format("18", 720, "webm");
        second.filesize = Some(5_242_880.0);
        let descriptor = build_descriptor(&extraction_with(vec![
            video_format("22", 720, "mp4"),
            second,
            video_format("137", 1080, "mp4"),
        ]))
        .unwrap();
        let labels: Vec<&str> = descriptor
            .formats
            .iter()
            .map(|f| f.quality.as_str())
            .collect();
        assert_eq!(labels, vec!["1080p", "720p"]);
        // The kept 720p entry is the first-seen mp4 one.
        assert_eq!(descriptor.formats[1].format_id, "22");
        assert_eq!(descriptor.formats[1].extension, Container::Mp4);
    }

    #[test]
    fn test_describe_sorted_by_height_desc_unknown_last() {
        let mut unknown = video_format("0", 0, "mp4");
        unknown.format_note = Some("tiny".to_string());
        let descriptor = build_descriptor(&extraction_with(vec![
            video_format("18", 360, "mp4"),
            unknown,
            video_format("137", 1080, "mp4"),
            video_format("22", 720, "mp4"),
        ]))
        .unwrap();
        let heights: Vec<u32> = descriptor.formats.iter().map(|f| f.height).collect();
        assert_eq!(heights, vec![1080, 720, 360, 0]);
    }

    #[test]
    fn test_describe_label_fallback_chain() {
        let mut noted = video_format("a", 0, "mp4");
        noted.format_note = Some("medium".to_string());
        let mut quality_only = video_format("b", 0, "mp4");
        quality_only.quality = Some("hd".to_string());
        let bare = video_format("c", 0, "mp4");

        let descriptor =
            build_descriptor(&extraction_with(vec![noted, quality_only, bare])).unwrap();
        let labels: Vec<&str> = descriptor
            .formats
            .iter()
            .map(|f| f.quality.as_str())
            .collect();
        assert_eq!(labels, vec!["medium", "hd", "unknown"]);
    }

    #[test]
    fn test_describe_size_missing_is_zero() {
        let descriptor =
            build_descriptor(&extraction_with(vec![video_format("22", 720, "mp4")])).unwrap();
        assert_eq!(descriptor.formats[0].filesize, 0.0);
    }

    #[test]
    fn test_describe_coerces_unknown_extension() {
        let descriptor =
            build_descriptor(&extraction_with(vec![video_format("5", 240, "flv")])).unwrap();
        assert_eq!(descriptor.formats[0].extension, Container::Mp4);
    }

    #[test]
    fn test_describe_synthesizes_best_entry() {
        let extraction = Extraction {
            format_id: Some("22".to_string()),
            ext: Some("webm".to_string()),
            height: 480,
            ..Extraction::default()
        };
        let descriptor = build_descriptor(&extraction).unwrap();
        assert_eq!(descriptor.formats.len(), 1);
        assert_eq!(descriptor.formats[0].quality, "best");
        assert_eq!(descriptor.formats[0].filesize, 0.0);
        assert_eq!(descriptor.formats[0].extension, Container::Webm);
        assert_eq!(descriptor.formats[0].height, 480);
        assert_eq!(descriptor.title, "Untitled");
        assert_eq!(descriptor.author, "Unknown");
    }

    #[test]
    fn test_describe_fails_without_any_format() {
        let err = build_descriptor(&Extraction::default()).unwrap_err();
        assert!(matches!(err, MediaError::NoFormatsAvailable));
    }

    #[test]
    fn test_target_height_parsing() {
        assert_eq!(target_height("720p"), 720);
        assert_eq!(target_height("1080p"), 1080);
        assert_eq!(target_height("abcp"), 720);
        assert_eq!(target_height("720"), 720);
        assert_eq!(target_height(""), 720);
    }

    #[test]
    fn test_selector_chain_shape() {
        let chain = selector_chain(480);
        assert_eq!(chain.len(), 5);
        assert!(chain[0].starts_with("bestvideo[height<=480][ext=mp4]"));
        assert_eq!(chain[2], "best[height<=480]");
        assert_eq!(chain[4], "best");
    }

    #[test]
    fn test_is_usable() {
        assert!(!is_usable(&Extraction::default()));
        let direct = Extraction {
            url: Some("https://cdn.example/v.mp4".to_string()),
            ..Extraction::default()
        };
        assert!(is_usable(&direct));
        assert!(is_usable(&extraction_with(vec![RawFormat::default()])));
    }

    #[test]
    fn test_select_respects_height_ceiling() {
        let formats = vec![
            video_format("137", 1080, "mp4"),
            video_format("22", 720, "mp4"),
            video_format("18", 360, "mp4"),
        ];
        let chosen = select_download_format(&formats, 720).unwrap();
        assert_eq!(chosen.height, 720);
    }

    #[test]
    fn test_select_falls_back_to_best_overall() {
        let formats = vec![
            video_format("137", 1080, "mp4"),
            video_format("248", 1440, "webm"),
        ];
        // Nothing fits under 480; the top-ranked entry (mp4 first) wins.
        let chosen = select_download_format(&formats, 480).unwrap();
        assert_eq!(chosen.format_id, "137");
    }

    #[test]
    fn test_select_prefers_mp4_at_equal_height() {
        let mut mp4 = video_format("137", 1080, "mp4");
        mp4.filesize = Some(104_857_600.0);
        let mut webm = video_format("248", 1080, "webm");
        webm.filesize = Some(94_371_840.0);
        let formats = vec![webm, mp4];
        let chosen = select_download_format(&formats, 1080).unwrap();
        assert_eq!(chosen.format_id, "137");
        assert_eq!(chosen.ext.as_deref(), Some("mp4"));
    }

    #[test]
    fn test_select_container_score_dominates_height() {
        // Upstream ranks container before height, so a lower mp4 beats a
        // taller webm even when both fit the ceiling.
        let formats = vec![
            video_format("248", 1080, "webm"),
            video_format("22", 720, "mp4"),
        ];
        let chosen = select_download_format(&formats, 1080).unwrap();
        assert_eq!(chosen.format_id, "22");
    }

    #[test]
    fn test_resolution_filesize_missing_is_none() {
        let extraction = extraction_with(vec![video_format("22", 720, "mp4")]);
        let resolution = build_resolution(&extraction, 720).unwrap();
        assert_eq!(resolution.filesize, None);

        // None must serialize as null, not 0.
        let body = serde_json::to_value(&resolution).unwrap();
        assert!(body["filesize"].is_null());
    }

    #[test]
    fn test_resolution_filesize_reported_in_mb() {
        let mut format = video_format("22", 720, "mp4");
        format.filesize = Some(104_857_600.0);
        let extraction = extraction_with(vec![format]);
        let resolution = build_resolution(&extraction, 720).unwrap();
        assert_eq!(resolution.filesize, Some(100.0));
    }

    #[test]
    fn test_resolution_from_direct_url() {
        let extraction = Extraction {
            url: Some("https://cdn.example/direct.mp4".to_string()),
            ext: Some("mp4".to_string()),
            height: 480,
            // Declared formats are ignored once a direct URL is present.
            formats: vec![video_format("137", 1080, "mp4")],
            ..Extraction::default()
        };
        let resolution = build_resolution(&extraction, 720).unwrap();
        assert_eq!(resolution.download_url, "https://cdn.example/direct.mp4");
        assert_eq!(resolution.quality, "480p");
        assert_eq!(resolution.filesize, None);
        assert_eq!(resolution.title, "Video");
    }

    #[test]
    fn test_resolution_unknown_height_label() {
        let extraction = Extraction {
            url: Some("https://cdn.example/direct.mp4".to_string()),
            ..Extraction::default()
        };
        let resolution = build_resolution(&extraction, 720).unwrap();
        assert_eq!(resolution.quality, "unknown");
    }

    #[test]
    fn test_instagram_resolution_requires_direct_url() {
        let err = build_instagram_resolution(&Extraction::default()).unwrap_err();
        assert!(matches!(err, MediaError::NoDownloadUrl));
    }

    #[test]
    fn test_instagram_resolution_filesize_missing_is_none() {
        let extraction = Extraction {
            url: Some("https://cdn.example/reel.mp4".to_string()),
            ..Extraction::default()
        };
        let resolution = build_instagram_resolution(&extraction).unwrap();
        assert_eq!(resolution.quality, "original");
        assert_eq!(resolution.filesize, None);
        assert!(serde_json::to_value(&resolution).unwrap()["filesize"].is_null());
    }

    #[test]
    fn test_select_requires_video_and_url() {
        let mut audio = RawFormat {
            url: Some("https://cdn.example/a".to_string()),
            ..RawFormat::default()
        };
        audio.vcodec = Some("none".to_string());
        let no_url = RawFormat {
            vcodec: Some("avc1".to_string()),
            height: 720,
            ..RawFormat::default()
        };
        let err = select_download_format(&[audio, no_url], 720).unwrap_err();
        assert!(matches!(err, MediaError::NoVideoFormats));
    }
}
