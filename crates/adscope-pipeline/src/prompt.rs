//! Judgment prompt rendering.

use adscope_core::text::sanitize_for_prompt;

use crate::fingerprint::UniqueCreative;

const PRIMARY_TEXT_LIMIT: usize = 2000;
const HEADLINE_LIMIT: usize = 500;
const SHORT_FIELD_LIMIT: usize = 100;

/// Renders the fixed-schema prompt for one creative.
#[must_use]
pub fn build_judgment_prompt(brand: &str, market: &str, creative: &UniqueCreative) -> String {
    let record = &creative.record;
    let brand = sanitize_for_prompt(brand, SHORT_FIELD_LIMIT);
    let market = sanitize_for_prompt(market, SHORT_FIELD_LIMIT);
    let primary_text = sanitize_for_prompt(&record.primary_text, PRIMARY_TEXT_LIMIT);
    let headline = sanitize_for_prompt(&record.headline, HEADLINE_LIMIT);
    let cta = sanitize_for_prompt(&record.call_to_action, SHORT_FIELD_LIMIT);
    let format = record.format.as_str();
    let first_seen = creative
        .earliest_seen
        .map_or_else(|| "N/A".to_string(), |d| d.format("%Y-%m-%d").to_string());

    format!(
        r#"You are an advertising strategist. Analyse this ad creative.

Brand: {brand}
Market: {market}
Primary text: {primary_text}
Headline: {headline}
Call to action: {cta}
Format: {format}
First seen: {first_seen}

Return ONLY this JSON object, with no commentary:
{{
  "hook_type": "EMOTIONAL|RATIONAL|SOCIAL_PROOF|URGENCY|CURIOSITY",
  "hook_description": "...",
  "target_audience": {{
    "demographics": "...",
    "psychographics": "...",
    "awareness_level": "unaware|problem_aware|solution_aware|product_aware|most_aware"
  }},
  "funnel_stage": "AWARENESS|CONSIDERATION|CONVERSION",
  "funnel_reasoning": "...",
  "language": "English|French|Spanish|Other",
  "market_strategy": "Brand Awareness|Product Launch|Retail Traffic|E-commerce|Lead Gen|Expansion|Influencer|Retargeting",
  "score": 7,
  "score_breakdown": {{"clarity": 8, "cta_relevance": 7, "creative_coherence": 6}},
  "key_insight": "..."
}}

"score" is an integer from 1 to 10."#
    )
}
