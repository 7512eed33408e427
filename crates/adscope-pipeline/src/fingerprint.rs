//! Content-level identity for creatives and the dedup pass built on it.
//!
//! Two records are the same creative iff their case-folded,
//! whitespace-collapsed `primary_text` and `headline` are identical. The
//! image, CTA, and format do not participate.

use std::collections::HashMap;

use adscope_core::RawAdRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separates the two normalised parts so `("ab", "")` and `("a", "b")`
/// stay distinct. Control characters are stripped during normalisation, so
/// this byte can never come from the text itself.
const PART_SEPARATOR: char = '\u{1f}';

/// Dedup key for a creative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreativeFingerprint(String);

impl CreativeFingerprint {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short stable identifier: the first 12 hex chars of the SHA-256 of the key.
    #[must_use]
    pub fn short_id(&self) -> String {
        let digest = format!("{:x}", Sha256::digest(self.0.as_bytes()));
        digest[..12].to_string()
    }
}

fn normalize_part(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !c.is_control())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Computes the dedup key for a record. Total: empty fields contribute an
/// empty part.
#[must_use]
pub fn fingerprint(record: &RawAdRecord) -> CreativeFingerprint {
    let mut key = normalize_part(&record.primary_text);
    key.push(PART_SEPARATOR);
    key.push_str(&normalize_part(&record.headline));
    CreativeFingerprint(key)
}

/// A representative record plus everything that collapsed into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueCreative {
    pub creative_id: String,
    pub fingerprint: CreativeFingerprint,
    /// First record seen for this fingerprint.
    pub record: RawAdRecord,
    pub occurrence_count: usize,
    /// `source_id` of every collapsed record, in arrival order.
    pub source_ids: Vec<String>,
    /// Earliest `first_seen` across the collapsed records.
    pub earliest_seen: Option<NaiveDate>,
}

/// Groups records by fingerprint, keeping arrival order of first appearance.
///
/// The first record seen for a fingerprint is the representative; later ones
/// only bump `occurrence_count` and contribute their `source_id` and
/// `first_seen`.
#[must_use]
pub fn deduplicate(records: &[RawAdRecord]) -> Vec<UniqueCreative> {
    let mut index: HashMap<CreativeFingerprint, usize> = HashMap::new();
    let mut unique: Vec<UniqueCreative> = Vec::new();

    for record in records {
        let key = fingerprint(record);
        if let Some(&pos) = index.get(&key) {
            let existing = &mut unique[pos];
            existing.occurrence_count += 1;
            existing.source_ids.push(record.source_id.clone());
            existing.earliest_seen = match (existing.earliest_seen, record.first_seen) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            };
            continue;
        }

        index.insert(key.clone(), unique.len());
        unique.push(UniqueCreative {
            creative_id: key.short_id(),
            fingerprint: key,
            record: record.clone(),
            occurrence_count: 1,
            source_ids: vec![record.source_id.clone()],
            earliest_seen: record.first_seen,
        });
    }

    if unique.len() < records.len() {
        tracing::debug!(
            input = records.len(),
            unique = unique.len(),
            "collapsed duplicate creatives"
        );
    }

    unique
}
