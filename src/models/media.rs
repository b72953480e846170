//! Evidence file classification
//!
//! Evidence is stored as a list of public URLs returned by the upload
//! service. Only the extension is inspected, to tell videos from images.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

static VIDEO_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mp4|webm|mov)$").expect("valid video extension regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn classify(url: &str) -> Self {
        if VIDEO_EXTENSION.is_match(url) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// An evidence URL with its display kind
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Evidence {
    pub url: String,
    pub kind: MediaKind,
}

pub fn classify_all(urls: &[String]) -> Vec<Evidence> {
    urls.iter()
        .map(|url| Evidence {
            url: url.clone(),
            kind: MediaKind::classify(url),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(MediaKind::classify("https://cdn/x/a1_17.MP4"), MediaKind::Video);
        assert_eq!(MediaKind::classify("https://cdn/x/clip.mov"), MediaKind::Video);
        assert_eq!(MediaKind::classify("https://cdn/x/photo.jpg"), MediaKind::Image);
        // extension must be at the end
        assert_eq!(MediaKind::classify("https://cdn/x/a.mp4.png"), MediaKind::Image);
    }
}
