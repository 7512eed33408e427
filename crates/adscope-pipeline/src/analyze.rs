//! Per-creative judgment orchestration.
//!
//! Each creative gets exactly one oracle call. Calls are independent and run
//! with bounded concurrency; a failing call (transport error or unusable
//! text) only marks its own item as `parse_failed`.

use adscope_core::{AnalysisVerdict, JudgmentOracle};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::fingerprint::UniqueCreative;
use crate::prompt::build_judgment_prompt;
use crate::verdict::parse_verdict;

/// A unique creative together with its verdict. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedCreative {
    #[serde(flatten)]
    pub creative: UniqueCreative,
    #[serde(flatten)]
    pub verdict: AnalysisVerdict,
}

async fn analyze_one<J: JudgmentOracle + ?Sized>(
    judge: &J,
    brand: &str,
    market: &str,
    creative: &UniqueCreative,
) -> AnalysisVerdict {
    let prompt = build_judgment_prompt(brand, market, creative);

    match judge.judge(&prompt).await {
        Ok(raw) => {
            let verdict = parse_verdict(&raw);
            if verdict.parse_failed {
                tracing::warn!(
                    creative = %creative.creative_id,
                    reason = verdict.failure_reason.as_deref().unwrap_or_default(),
                    "judgment output could not be parsed"
                );
            }
            verdict
        }
        Err(err) => {
            tracing::warn!(
                creative = %creative.creative_id,
                error = %err,
                "judgment oracle call failed"
            );
            AnalysisVerdict::failed(format!("judgment oracle error: {}", err.detail), None)
        }
    }
}

/// Analyses every creative, returning results index-aligned with the input
/// regardless of completion order.
pub async fn analyze_all<J: JudgmentOracle + ?Sized>(
    judge: &J,
    brand: &str,
    market: &str,
    creatives: &[UniqueCreative],
    concurrency: usize,
) -> Vec<AnalyzedCreative> {
    tracing::info!(
        brand,
        count = creatives.len(),
        concurrency,
        "analysing creatives"
    );

    let pending: Vec<_> = creatives
        .iter()
        .enumerate()
        .map(|(idx, creative)| async move {
            (idx, analyze_one(judge, brand, market, creative).await)
        })
        .collect();
    let mut verdicts: Vec<(usize, AnalysisVerdict)> = stream::iter(pending)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    verdicts.sort_by_key(|(idx, _)| *idx);

    let failed = verdicts.iter().filter(|(_, v)| v.parse_failed).count();
    if failed > 0 {
        tracing::warn!(brand, failed, total = creatives.len(), "some analyses failed");
    }

    creatives
        .iter()
        .cloned()
        .zip(verdicts.into_iter().map(|(_, verdict)| verdict))
        .map(|(creative, verdict)| AnalyzedCreative { creative, verdict })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use adscope_core::{HookType, OracleError, RawAdRecord};
    use async_trait::async_trait;

    use super::*;
    use crate::fingerprint::deduplicate;

    /// Answers with a verdict whose score is the item number embedded in the
    /// prompt. Items listed in `fail_on` get a transport error; items listed
    /// in `garbage_on` get unparseable text. Later items answer faster.
    struct NumberedJudge {
        fail_on: Vec<u8>,
        garbage_on: Vec<u8>,
        calls: Arc<AtomicU32>,
    }

    fn item_number(prompt: &str) -> u8 {
        prompt
            .lines()
            .find_map(|l| l.strip_prefix("Primary text: item "))
            .and_then(|n| n.trim().parse().ok())
            .unwrap_or(0)
    }

    #[async_trait]
    impl JudgmentOracle for NumberedJudge {
        async fn judge(&self, prompt: &str) -> Result<String, OracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let n = item_number(prompt);
            tokio::time::sleep(Duration::from_millis(u64::from(10 - n) * 100)).await;
            if self.fail_on.contains(&n) {
                return Err(OracleError::transient("rate limited"));
            }
            if self.garbage_on.contains(&n) {
                return Ok("no idea, sorry".to_string());
            }
            Ok(format!(
                r#"{{"hook_type": "URGENCY", "funnel_stage": "CONVERSION", "score": {n}, "key_insight": "item {n}"}}"#
            ))
        }
    }

    fn creatives(n: u8) -> Vec<UniqueCreative> {
        let records: Vec<RawAdRecord> = (1..=n)
            .map(|i| RawAdRecord::new(i.to_string(), format!("item {i}"), "headline"))
            .collect();
        deduplicate(&records)
    }

    fn judge(fail_on: Vec<u8>, garbage_on: Vec<u8>) -> NumberedJudge {
        NumberedJudge {
            fail_on,
            garbage_on,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failure_on_one_item_does_not_affect_others() {
        let judge = judge(vec![3], vec![]);
        let input = creatives(5);
        let analyzed = analyze_all(&judge, "Acme", "ALL", &input, 3).await;

        assert_eq!(analyzed.len(), 5);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 5);
        for (i, item) in analyzed.iter().enumerate() {
            if i == 2 {
                assert!(item.verdict.parse_failed);
                assert_eq!(item.verdict.score, None);
                assert!(item
                    .verdict
                    .failure_reason
                    .as_deref()
                    .is_some_and(|r| r.contains("rate limited")));
            } else {
                assert!(!item.verdict.parse_failed, "item {i} should be unaffected");
                assert_eq!(item.verdict.score, Some(u8::try_from(i + 1).unwrap()));
                assert_eq!(item.verdict.hook_type, HookType::Urgency);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unparseable_output_is_isolated_and_raw_text_kept() {
        let judge = judge(vec![], vec![2]);
        let analyzed = analyze_all(&judge, "Acme", "ALL", &creatives(3), 2).await;
        assert!(analyzed[1].verdict.parse_failed);
        assert_eq!(
            analyzed[1].verdict.raw_response.as_deref(),
            Some("no idea, sorry")
        );
        assert!(!analyzed[0].verdict.parse_failed);
        assert!(!analyzed[2].verdict.parse_failed);
    }

    #[tokio::test(start_paused = true)]
    async fn output_order_matches_input_despite_latency() {
        let judge = judge(vec![], vec![]);
        let input = creatives(8);
        let analyzed = analyze_all(&judge, "Acme", "ALL", &input, 4).await;
        let ids: Vec<&str> = analyzed
            .iter()
            .map(|a| a.creative.record.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7", "8"]);
        for item in &analyzed {
            assert_eq!(
                item.verdict.key_insight,
                format!("item {}", item.creative.record.source_id)
            );
        }
    }

    #[tokio::test]
    async fn empty_input_makes_no_calls() {
        let judge = judge(vec![], vec![]);
        let analyzed = analyze_all(&judge, "Acme", "ALL", &[], 3).await;
        assert!(analyzed.is_empty());
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn analyzed_creative_serializes_flat() {
        let creative = creatives(1).remove(0);
        let item = AnalyzedCreative {
            creative,
            verdict: AnalysisVerdict {
                score: Some(6),
                key_insight: "strong CTA".to_string(),
                ..AnalysisVerdict::default()
            },
        };
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["score"], 6);
        assert_eq!(json["hookType"], "unknown");
        assert_eq!(json["funnelStage"], "unknown");
        assert_eq!(json["keyInsight"], "strong CTA");
        assert_eq!(json["occurrenceCount"], 1);
        assert_eq!(json["record"]["primaryText"], "item 1");
    }
}
