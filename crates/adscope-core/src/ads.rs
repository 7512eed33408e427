use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Delivery format of a creative as shown in the ad library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdFormat {
    Image,
    Video,
    Carousel,
    #[default]
    Unknown,
}

impl AdFormat {
    /// Maps a free-form format label (`"Video"`, `"Static Image"`, ...) to a
    /// variant. Anything unrecognised is [`AdFormat::Unknown`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        if lower.contains("carousel") {
            AdFormat::Carousel
        } else if lower.contains("video") {
            AdFormat::Video
        } else if lower.contains("image") || lower.contains("photo") || lower == "static" {
            AdFormat::Image
        } else {
            AdFormat::Unknown
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdFormat::Image => "image",
            AdFormat::Video => "video",
            AdFormat::Carousel => "carousel",
            AdFormat::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for AdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scraped creative observation.
///
/// The same creative may be observed several times under different
/// `source_id`s; deduplication happens downstream on the text content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAdRecord {
    /// Ad library identifier. Opaque; not unique per creative.
    pub source_id: String,
    #[serde(default)]
    pub primary_text: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub call_to_action: String,
    #[serde(default)]
    pub format: AdFormat,
    #[serde(default)]
    pub advertiser: String,
    #[serde(default)]
    pub first_seen: Option<NaiveDate>,
    #[serde(default)]
    pub platforms: BTreeSet<String>,
}

impl RawAdRecord {
    /// Creates a record with only its identifying text set.
    #[must_use]
    pub fn new(
        source_id: impl Into<String>,
        primary_text: impl Into<String>,
        headline: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            primary_text: primary_text.into(),
            headline: headline.into(),
            call_to_action: String::new(),
            format: AdFormat::Unknown,
            advertiser: String::new(),
            first_seen: None,
            platforms: BTreeSet::new(),
        }
    }
}
