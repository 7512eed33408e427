//! Structured output of the judgment oracle for one creative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Normalises an oracle label for matching: lowercase, with spaces and
/// hyphens folded to underscores.
fn fold_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// The persuasion mechanism the creative opens with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    Emotional,
    Rational,
    SocialProof,
    Urgency,
    Curiosity,
    #[default]
    Unknown,
}

impl HookType {
    /// Declaration order; used as the tie-break order for dominant values.
    pub const ALL: [HookType; 6] = [
        HookType::Emotional,
        HookType::Rational,
        HookType::SocialProof,
        HookType::Urgency,
        HookType::Curiosity,
        HookType::Unknown,
    ];

    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match fold_label(label).as_str() {
            "emotional" => HookType::Emotional,
            "rational" => HookType::Rational,
            "social_proof" | "socialproof" => HookType::SocialProof,
            "urgency" => HookType::Urgency,
            "curiosity" => HookType::Curiosity,
            _ => HookType::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HookType::Emotional => "emotional",
            HookType::Rational => "rational",
            HookType::SocialProof => "social_proof",
            HookType::Urgency => "urgency",
            HookType::Curiosity => "curiosity",
            HookType::Unknown => "unknown",
        }
    }
}

/// Marketing funnel stage the creative targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Awareness,
    Consideration,
    Conversion,
    #[default]
    Unknown,
}

impl FunnelStage {
    pub const ALL: [FunnelStage; 4] = [
        FunnelStage::Awareness,
        FunnelStage::Consideration,
        FunnelStage::Conversion,
        FunnelStage::Unknown,
    ];

    /// Accepts the stage names and the `TOFU`/`MOFU`/`BOFU` shorthands.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match fold_label(label).as_str() {
            "awareness" | "tofu" => FunnelStage::Awareness,
            "consideration" | "mofu" => FunnelStage::Consideration,
            "conversion" | "bofu" => FunnelStage::Conversion,
            _ => FunnelStage::Unknown,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FunnelStage::Awareness => "awareness",
            FunnelStage::Consideration => "consideration",
            FunnelStage::Conversion => "conversion",
            FunnelStage::Unknown => "unknown",
        }
    }
}

/// How aware the targeted audience already is of its problem and of the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwarenessLevel {
    Unaware,
    ProblemAware,
    SolutionAware,
    ProductAware,
    MostAware,
    #[default]
    Unknown,
}

impl AwarenessLevel {
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match fold_label(label).as_str() {
            "unaware" => AwarenessLevel::Unaware,
            "problem_aware" => AwarenessLevel::ProblemAware,
            "solution_aware" => AwarenessLevel::SolutionAware,
            "product_aware" => AwarenessLevel::ProductAware,
            "most_aware" => AwarenessLevel::MostAware,
            _ => AwarenessLevel::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    pub demographics: String,
    pub psychographics: String,
    pub awareness_level: AwarenessLevel,
}

/// Verdict for one creative.
///
/// When `parse_failed` is set every judgment field holds its default and
/// `raw_response` keeps whatever the oracle returned (or the transport error)
/// for diagnostics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisVerdict {
    pub hook_type: HookType,
    pub hook_description: Option<String>,
    pub target_audience: TargetAudience,
    pub funnel_stage: FunnelStage,
    pub funnel_reasoning: Option<String>,
    /// Overall score in `1..=10`.
    pub score: Option<u8>,
    pub score_breakdown: Option<BTreeMap<String, u8>>,
    pub key_insight: String,
    pub language: Option<String>,
    pub market_strategy: Option<String>,
    pub parse_failed: bool,
    pub failure_reason: Option<String>,
    pub raw_response: Option<String>,
}

impl AnalysisVerdict {
    /// A verdict marking an item whose oracle output could not be used.
    #[must_use]
    pub fn failed(reason: impl Into<String>, raw_response: Option<String>) -> Self {
        Self {
            parse_failed: true,
            failure_reason: Some(reason.into()),
            raw_response,
            ..Self::default()
        }
    }

    /// The score, if this verdict is usable for ranking and averaging.
    #[must_use]
    pub fn usable_score(&self) -> Option<u8> {
        if self.parse_failed {
            None
        } else {
            self.score
        }
    }
}
