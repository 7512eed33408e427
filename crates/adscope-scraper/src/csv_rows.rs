//! Spreadsheet input: ads exported as CSV, one ad per row.
//!
//! Columns are matched by header name and every column is optional. Both the
//! report export's `First Seen` and the ad-library download's `Start Date`
//! are understood; `Platforms` is a comma-separated list.

use adscope_core::RawAdRecord;
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use crate::parse::normalize_ad;
use crate::types::AgentAd;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvAd {
    #[serde(rename = "Library ID")]
    library_id: String,
    #[serde(rename = "Advertiser")]
    advertiser: String,
    #[serde(rename = "Primary Text", alias = "text")]
    primary_text: String,
    #[serde(rename = "Headline")]
    headline: String,
    #[serde(rename = "CTA")]
    cta: String,
    #[serde(rename = "Format")]
    format: String,
    #[serde(rename = "First Seen")]
    first_seen: String,
    #[serde(rename = "Start Date")]
    start_date: String,
    #[serde(rename = "Platforms")]
    platforms: String,
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

impl From<CsvAd> for AgentAd {
    fn from(row: CsvAd) -> Self {
        let platforms = row
            .platforms
            .split(',')
            .map(str::to_string)
            .collect::<Vec<_>>();
        AgentAd {
            library_id: non_empty(row.library_id).map(serde_json::Value::String),
            id: None,
            advertiser: non_empty(row.advertiser),
            primary_text: non_empty(row.primary_text),
            headline: non_empty(row.headline),
            cta: non_empty(row.cta),
            format: non_empty(row.format),
            first_seen: non_empty(row.first_seen),
            start_date: non_empty(row.start_date),
            platforms: Some(platforms),
        }
    }
}

/// Reads ads from CSV text, keeping at most `max_items`.
///
/// Rows go through the same normalization as agent output: rows without
/// primary text and headline are dropped and a missing `Library ID` falls
/// back to the 1-based row number.
///
/// # Errors
///
/// Returns [`csv::Error`] if the header or a row cannot be decoded, or a row
/// has a different number of fields than the header.
pub fn csv_ads(contents: &str, max_items: usize) -> Result<Vec<RawAdRecord>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(contents.as_bytes());

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<CsvAd>().enumerate() {
        if records.len() >= max_items {
            break;
        }
        if let Some(record) = normalize_ad(AgentAd::from(row?), idx + 1) {
            records.push(record);
        }
    }
    Ok(records)
}
