//! Plain-text rendering of a pipeline report.

use std::collections::BTreeMap;
use std::fmt;

use adscope_core::text::preview;
use adscope_pipeline::{AnalyzedCreative, PipelineReport};

const TEXT_PREVIEW_CHARS: usize = 60;

/// Human-readable view of a [`PipelineReport`].
pub(crate) struct ReportText<'a>(pub &'a PipelineReport);

fn write_distribution(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    counts: &BTreeMap<String, usize>,
) -> fmt::Result {
    writeln!(f, "{title}:")?;
    if counts.is_empty() {
        return writeln!(f, "  (none)");
    }
    let mut rows: Vec<(&String, &usize)> = counts.iter().collect();
    // Highest count first; the map's key order breaks ties.
    rows.sort_by(|a, b| b.1.cmp(a.1));
    for (label, count) in rows {
        writeln!(f, "  {label:<16}{count:>4}")?;
    }
    Ok(())
}

/// One line per creative. Unparsed items carry their failure reason instead
/// of a score.
fn write_creative(f: &mut fmt::Formatter<'_>, item: &AnalyzedCreative) -> fmt::Result {
    let record = &item.creative.record;
    let seen = match item.creative.occurrence_count {
        1 => String::new(),
        n => format!(" x{n}"),
    };
    match item.verdict.usable_score() {
        Some(score) => writeln!(
            f,
            "  [{score:>2}/10] {}{seen} {}/{} \"{}\"",
            record.source_id,
            item.verdict.hook_type.as_str(),
            item.verdict.funnel_stage.as_str(),
            preview(&record.primary_text, TEXT_PREVIEW_CHARS)
        ),
        None => writeln!(
            f,
            "  [ --/10] {}{seen} unparsed: {}",
            record.source_id,
            item.verdict
                .failure_reason
                .as_deref()
                .unwrap_or("no usable score")
        ),
    }
}

impl fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let summary = &report.summary;

        writeln!(f, "Brand:     {} (region {})", report.brand, report.region)?;
        writeln!(
            f,
            "Generated: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(
            f,
            "Ads:       {} extracted, {} unique, {} unparsed",
            report.raw_record_count, summary.total_analyzed, summary.parse_failures
        )?;
        writeln!(f, "Average:   {:.1}/10", summary.average_score)?;
        writeln!(f)?;

        write_distribution(f, "Hook types", &summary.hook_distribution)?;
        write_distribution(f, "Funnel stages", &summary.funnel_distribution)?;
        write_distribution(f, "Market strategies", &summary.market_strategy_distribution)?;
        writeln!(f)?;

        writeln!(f, "Top creatives:")?;
        if summary.top_creatives.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (rank, top) in summary.top_creatives.iter().enumerate() {
            writeln!(
                f,
                "  {}. [{}/10] {} ({}) \"{}\"",
                rank + 1,
                top.score,
                top.source_id,
                top.hook_type.as_str(),
                preview(&top.text_preview, TEXT_PREVIEW_CHARS)
            )?;
            if !top.key_insight.is_empty() {
                writeln!(f, "     {}", top.key_insight)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Creatives:")?;
        if report.analyzed.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for item in &report.analyzed {
            write_creative(f, item)?;
        }
        writeln!(f)?;

        writeln!(f, "Insights:")?;
        for insight in &summary.strategic_insights {
            writeln!(f, "  - {insight}")?;
        }
        Ok(())
    }
}

/// Renders the report as a human-readable summary.
#[must_use]
pub(crate) fn render_report(report: &PipelineReport) -> String {
    ReportText(report).to_string()
}
