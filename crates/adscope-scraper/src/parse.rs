//! Turns browser-agent output into [`RawAdRecord`]s.
//!
//! The agent answers in free text that usually, but not always, contains a
//! JSON document of the shape `{"brand": …, "ads": [ … ]}`. The final result
//! is tried first, then each intermediate extraction block in order; the
//! first text that yields an `ads` array wins.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use adscope_core::text::locate_json_object;
use adscope_core::{AdFormat, RawAdRecord};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;

use crate::types::{AgentAd, AgentRun};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid regex"));

/// Candidate JSON texts inside `text`: the fenced block first, then the
/// widest brace-delimited span.
fn json_candidates(text: &str) -> impl Iterator<Item = &str> {
    let fenced = FENCED_JSON
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str());
    fenced.into_iter().chain(locate_json_object(text))
}

/// Finds the `ads` array of the first decodable document in `text`.
#[must_use]
pub fn ads_document(text: &str) -> Option<Vec<Value>> {
    json_candidates(text).find_map(|candidate| {
        let doc: Value = serde_json::from_str(candidate).ok()?;
        match doc.get("ads") {
            Some(Value::Array(ads)) => Some(ads.clone()),
            _ => None,
        }
    })
}

/// Extracts records from a completed agent run.
///
/// Returns an empty `Vec` when no block contains an `ads` array.
#[must_use]
pub fn parse_agent_output(run: &AgentRun, max_items: usize) -> Vec<RawAdRecord> {
    run.final_result
        .as_deref()
        .into_iter()
        .chain(run.extracted_content.iter().map(String::as_str))
        .find_map(ads_document)
        .map(|ads| normalize_ads(&ads, max_items))
        .unwrap_or_default()
}

/// Normalizes raw ad entries, keeping at most `max_items`.
///
/// Entries that are not objects or lack both primary text and headline are
/// dropped. `sourceId` falls back to the 1-based position in `ads`.
#[must_use]
pub fn normalize_ads(ads: &[Value], max_items: usize) -> Vec<RawAdRecord> {
    ads.iter()
        .enumerate()
        .filter_map(|(idx, value)| {
            let ad: AgentAd = serde_json::from_value(value.clone()).ok()?;
            normalize_ad(ad, idx + 1)
        })
        .take(max_items)
        .collect()
}

pub(crate) fn normalize_ad(ad: AgentAd, position: usize) -> Option<RawAdRecord> {
    let primary_text = clean(ad.primary_text);
    let headline = clean(ad.headline);
    if primary_text.is_empty() && headline.is_empty() {
        return None;
    }

    let source_id = id_string(ad.library_id.as_ref())
        .or_else(|| id_string(ad.id.as_ref()))
        .unwrap_or_else(|| position.to_string());

    let first_seen = ad
        .first_seen
        .as_deref()
        .and_then(parse_date)
        .or_else(|| ad.start_date.as_deref().and_then(parse_date));

    let platforms: BTreeSet<String> = ad
        .platforms
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    Some(RawAdRecord {
        source_id,
        primary_text,
        headline,
        call_to_action: clean(ad.cta),
        format: ad.format.as_deref().map_or(AdFormat::Unknown, AdFormat::from_label),
        advertiser: clean(ad.advertiser),
        first_seen,
        platforms,
    })
}

fn clean(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn id_string(value: Option<&Value>) -> Option<String> {
    let id = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
