//! Parser-with-fallback for the judgment oracle's free-text answer.
//!
//! Step one locates the embedded object (first `{` to last `}`); step two
//! decodes it strictly into the verdict shape. Any failure yields a tagged
//! `parse_failed` verdict carrying the raw text instead of an error.

use std::collections::BTreeMap;

use adscope_core::text::locate_json_object;
use adscope_core::{AnalysisVerdict, AwarenessLevel, FunnelStage, HookType, TargetAudience};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct VerdictWire {
    #[serde(default)]
    hook_type: Option<String>,
    #[serde(default)]
    hook_description: Option<String>,
    #[serde(default)]
    target_audience: Option<AudienceWire>,
    #[serde(default)]
    funnel_stage: Option<String>,
    #[serde(default)]
    funnel_reasoning: Option<String>,
    score: Value,
    #[serde(default)]
    score_breakdown: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    key_insight: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    market_strategy: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AudienceWire {
    #[serde(default)]
    demographics: Option<String>,
    #[serde(default)]
    psychographics: Option<String>,
    #[serde(default)]
    awareness_level: Option<String>,
}

/// Reads an integer-like JSON value: integers, floats (rounded), or numeric strings.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            n.as_f64().map(|f| f.round() as i64)
        }),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| {
            #[allow(clippy::cast_possible_truncation)]
            let rounded = f.round() as i64;
            rounded
        }),
        _ => None,
    }
}

fn score_in_range(value: &Value) -> Option<u8> {
    as_integer(value)
        .filter(|s| (1..=10).contains(s))
        .and_then(|s| u8::try_from(s).ok())
}

fn breakdown(map: serde_json::Map<String, Value>) -> Option<BTreeMap<String, u8>> {
    let parsed: BTreeMap<String, u8> = map
        .into_iter()
        .filter_map(|(name, value)| {
            let score = as_integer(&value)?.clamp(0, 10);
            Some((name, u8::try_from(score).ok()?))
        })
        .collect();
    if parsed.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Interprets one oracle response.
#[must_use]
pub fn parse_verdict(raw: &str) -> AnalysisVerdict {
    let Some(block) = locate_json_object(raw) else {
        return AnalysisVerdict::failed("response contains no JSON object", Some(raw.to_string()));
    };

    let wire: VerdictWire = match serde_json::from_str(block) {
        Ok(wire) => wire,
        Err(e) => {
            return AnalysisVerdict::failed(
                format!("malformed verdict JSON: {e}"),
                Some(raw.to_string()),
            );
        }
    };

    let Some(score) = score_in_range(&wire.score) else {
        return AnalysisVerdict::failed(
            format!("score missing or outside 1..=10: {}", wire.score),
            Some(raw.to_string()),
        );
    };

    let audience = wire.target_audience.unwrap_or_default();

    AnalysisVerdict {
        hook_type: wire
            .hook_type
            .as_deref()
            .map_or(HookType::Unknown, HookType::from_label),
        hook_description: non_empty(wire.hook_description),
        target_audience: TargetAudience {
            demographics: audience.demographics.unwrap_or_default(),
            psychographics: audience.psychographics.unwrap_or_default(),
            awareness_level: audience
                .awareness_level
                .as_deref()
                .map_or(AwarenessLevel::Unknown, AwarenessLevel::from_label),
        },
        funnel_stage: wire
            .funnel_stage
            .as_deref()
            .map_or(FunnelStage::Unknown, FunnelStage::from_label),
        funnel_reasoning: non_empty(wire.funnel_reasoning),
        score: Some(score),
        score_breakdown: wire.score_breakdown.and_then(breakdown),
        key_insight: wire.key_insight.unwrap_or_default(),
        language: non_empty(wire.language),
        market_strategy: non_empty(wire.market_strategy),
        parse_failed: false,
        failure_reason: None,
        raw_response: None,
    }
}
