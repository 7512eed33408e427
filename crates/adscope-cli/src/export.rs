//! Spreadsheet export of analysed creatives.

use std::io;
use std::path::Path;

use adscope_pipeline::{AnalyzedCreative, PipelineReport};
use serde::Serialize;

/// One CSV row per unique creative. Unparsed creatives keep their ad fields
/// and leave the judgment columns blank, with the reason under
/// `Analysis Error`.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Brand")]
    brand: &'a str,
    #[serde(rename = "Market")]
    market: &'a str,
    #[serde(rename = "Library ID")]
    library_id: &'a str,
    #[serde(rename = "Platforms")]
    platforms: String,
    #[serde(rename = "Format")]
    format: &'static str,
    #[serde(rename = "Headline")]
    headline: &'a str,
    #[serde(rename = "Primary Text")]
    primary_text: &'a str,
    #[serde(rename = "CTA")]
    cta: &'a str,
    #[serde(rename = "First Seen")]
    first_seen: Option<String>,
    #[serde(rename = "Occurrences")]
    occurrences: usize,
    #[serde(rename = "Language")]
    language: Option<&'a str>,
    #[serde(rename = "Hook Type")]
    hook_type: Option<&'static str>,
    #[serde(rename = "Market Strategy")]
    market_strategy: Option<&'a str>,
    #[serde(rename = "Funnel Stage")]
    funnel_stage: Option<&'static str>,
    #[serde(rename = "Score")]
    score: Option<u8>,
    #[serde(rename = "Key Insight")]
    key_insight: &'a str,
    #[serde(rename = "Analysis Error")]
    analysis_error: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(report: &'a PipelineReport, item: &'a AnalyzedCreative) -> Self {
        let record = &item.creative.record;
        let verdict = &item.verdict;
        let parsed = !verdict.parse_failed;
        Self {
            brand: &report.brand,
            market: &report.region,
            library_id: &record.source_id,
            platforms: record
                .platforms
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            format: record.format.as_str(),
            headline: &record.headline,
            primary_text: &record.primary_text,
            cta: &record.call_to_action,
            first_seen: item
                .creative
                .earliest_seen
                .map(|d| d.format("%Y-%m-%d").to_string()),
            occurrences: item.creative.occurrence_count,
            language: verdict.language.as_deref(),
            hook_type: parsed.then(|| verdict.hook_type.as_str()),
            market_strategy: verdict.market_strategy.as_deref(),
            funnel_stage: parsed.then(|| verdict.funnel_stage.as_str()),
            score: verdict.usable_score(),
            key_insight: &verdict.key_insight,
            analysis_error: verdict.failure_reason.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes the report's creatives as CSV, header first. A report with no
/// creatives produces an empty document.
///
/// # Errors
///
/// Returns [`csv::Error`] if a row cannot be written to `out`.
pub(crate) fn write_csv<W: io::Write>(report: &PipelineReport, out: W) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    for item in &report.analyzed {
        writer.serialize(CsvRow::new(report, item))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the CSV export to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub(crate) fn export_csv(report: &PipelineReport, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(report, io::BufWriter::new(file))?;
    tracing::info!(
        path = %path.display(),
        rows = report.analyzed.len(),
        "exported creatives to CSV"
    );
    Ok(())
}
