//! JSON output formatting

use crate::distributed::FinalReport;
use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// One word and its global count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWordCount {
    pub word: String,
    pub count: u64,
}

/// Final report as written to disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonReport {
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub documents: usize,
    pub distinct_words: usize,
    pub total_words: u64,
    /// Count-descending
    pub words: Vec<JsonWordCount>,
}

/// Build the JSON form of `report`
///
/// `top` limits `words`; the summary fields always cover every word.
pub fn build_json_report(report: &FinalReport, top: Option<usize>) -> JsonReport {
    let limit = top.unwrap_or(report.results.len());

    JsonReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        documents: report.units,
        distinct_words: report.results.len(),
        total_words: report.total_words(),
        words: report
            .results
            .iter()
            .take(limit)
            .map(|(word, count)| JsonWordCount {
                word: word.clone(),
                count: *count,
            })
            .collect(),
    }
}

/// Write a JSON report to `output_path`
pub fn write_json_output(output_path: &Path, json_report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;

    if pretty {
        serde_json::to_writer_pretty(file, json_report)?;
    } else {
        serde_json::to_writer(file, json_report)?;
    }

    Ok(())
}
