//! Brand-level statistics over analysed creatives.
//!
//! Pure and infallible: empty or fully failed input degrades to zero averages,
//! empty distributions and `"N/A"` dominants.

use std::collections::BTreeMap;

use adscope_core::text::preview;
use adscope_core::{FunnelStage, HookType};
use serde::{Deserialize, Serialize};

use crate::analyze::AnalyzedCreative;

/// Placeholder for a dominant value over an empty distribution.
pub const NOT_AVAILABLE: &str = "N/A";

const TOP_CREATIVES: usize = 3;
const PREVIEW_CHARS: usize = 100;

/// Presentation entry for a high-scoring creative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCreative {
    pub creative_id: String,
    pub source_id: String,
    pub text_preview: String,
    pub headline: String,
    pub score: u8,
    pub hook_type: HookType,
    pub key_insight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSummary {
    pub brand: String,
    pub total_analyzed: usize,
    pub parse_failures: usize,
    /// Mean score over successfully parsed verdicts; `0.0` when there are none.
    pub average_score: f64,
    /// Counts over every item; failed items count as `unknown`.
    pub hook_distribution: BTreeMap<String, usize>,
    pub funnel_distribution: BTreeMap<String, usize>,
    pub market_strategy_distribution: BTreeMap<String, usize>,
    pub language_distribution: BTreeMap<String, usize>,
    pub dominant_hook: String,
    pub dominant_funnel_stage: String,
    pub dominant_market_strategy: String,
    pub top_creatives: Vec<TopCreative>,
    pub strategic_insights: Vec<String>,
}

/// Argmax over `candidates` in the given order; the earliest wins ties.
fn dominant<'a, I>(candidates: I) -> String
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in candidates {
        if count == 0 {
            continue;
        }
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map_or_else(|| NOT_AVAILABLE.to_string(), |(label, _)| label.to_string())
}

fn enum_distribution<T: Copy + PartialEq>(
    all: &[T],
    values: impl Iterator<Item = T>,
) -> Vec<usize> {
    let mut counts = vec![0usize; all.len()];
    for value in values {
        if let Some(pos) = all.iter().position(|v| *v == value) {
            counts[pos] += 1;
        }
    }
    counts
}

/// Counts free-text labels, remembering first-encounter order for tie-breaks.
fn label_distribution<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(label, _)| *label == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    counts
}

fn to_map<'a>(counts: impl IntoIterator<Item = (&'a str, usize)>) -> BTreeMap<String, usize> {
    counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(label, count)| (label.to_string(), count))
        .collect()
}

fn average(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let sum: f64 = scores.iter().map(|s| f64::from(*s)).sum();
    #[allow(clippy::cast_precision_loss)]
    let denom = scores.len() as f64;
    sum / denom
}

fn top_creatives(analyzed: &[AnalyzedCreative]) -> Vec<TopCreative> {
    let mut scored: Vec<(&AnalyzedCreative, u8)> = analyzed
        .iter()
        .filter_map(|item| item.verdict.usable_score().map(|score| (item, score)))
        .collect();
    // `sort_by` is stable, so equal scores keep input order.
    scored.sort_by(|(_, a), (_, b)| b.cmp(a));

    scored
        .into_iter()
        .take(TOP_CREATIVES)
        .map(|(item, score)| TopCreative {
            creative_id: item.creative.creative_id.clone(),
            source_id: item.creative.record.source_id.clone(),
            text_preview: preview(&item.creative.record.primary_text, PREVIEW_CHARS),
            headline: item.creative.record.headline.clone(),
            score,
            hook_type: item.verdict.hook_type,
            key_insight: item.verdict.key_insight.clone(),
        })
        .collect()
}

fn strategic_insights(
    brand: &str,
    dominant_hook: &str,
    dominant_funnel: &str,
    dominant_strategy: &str,
    average_score: f64,
) -> Vec<String> {
    vec![
        format!("{brand} mainly relies on {dominant_hook} hooks"),
        format!("Dominant market strategy: {dominant_strategy}"),
        format!("Most creatives target the {dominant_funnel} stage of the funnel"),
        format!("Average creative score: {average_score:.1}/10"),
    ]
}

/// Aggregates analysed creatives for one brand.
#[must_use]
pub fn summarize(brand: &str, analyzed: &[AnalyzedCreative]) -> InsightSummary {
    let hook_counts = enum_distribution(&HookType::ALL, analyzed.iter().map(|a| a.verdict.hook_type));
    let funnel_counts =
        enum_distribution(&FunnelStage::ALL, analyzed.iter().map(|a| a.verdict.funnel_stage));

    let hooks: Vec<(&str, usize)> = HookType::ALL
        .iter()
        .map(|h| h.as_str())
        .zip(hook_counts)
        .collect();
    let funnels: Vec<(&str, usize)> = FunnelStage::ALL
        .iter()
        .map(|f| f.as_str())
        .zip(funnel_counts)
        .collect();

    let parsed = || analyzed.iter().filter(|a| !a.verdict.parse_failed);
    let strategies = label_distribution(parsed().filter_map(|a| a.verdict.market_strategy.as_deref()));
    let languages = label_distribution(parsed().filter_map(|a| a.verdict.language.as_deref()));

    let scores: Vec<u8> = analyzed
        .iter()
        .filter_map(|a| a.verdict.usable_score())
        .collect();
    let average_score = average(&scores);

    let dominant_hook = dominant(hooks.iter().copied());
    let dominant_funnel_stage = dominant(funnels.iter().copied());
    let dominant_market_strategy = dominant(strategies.iter().copied());

    let strategic_insights = strategic_insights(
        brand,
        &dominant_hook,
        &dominant_funnel_stage,
        &dominant_market_strategy,
        average_score,
    );

    InsightSummary {
        brand: brand.to_string(),
        total_analyzed: analyzed.len(),
        parse_failures: analyzed.iter().filter(|a| a.verdict.parse_failed).count(),
        average_score,
        hook_distribution: to_map(hooks),
        funnel_distribution: to_map(funnels),
        market_strategy_distribution: to_map(strategies),
        language_distribution: to_map(languages),
        dominant_hook,
        dominant_funnel_stage,
        dominant_market_strategy,
        top_creatives: top_creatives(analyzed),
        strategic_insights,
    }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
