//! Human-readable text output

use crate::distributed::FinalReport;
use std::io::{self, Write};

/// Print the final word counts to the console
///
/// Shows a short summary followed by `word: count` lines, most frequent
/// first. `top` limits the number of words printed.
pub fn print_results(report: &FinalReport, top: Option<usize>) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // Nothing sensible to do if stdout is closed
    let _ = write_results(&mut out, report, top);
}

/// Write the final report to `out`
pub fn write_results<W: Write>(out: &mut W, report: &FinalReport, top: Option<usize>) -> io::Result<()> {
    writeln!(out, "═══════════════════════════════════════════════════════════")?;
    writeln!(out, "                    WORD COUNTS")?;
    writeln!(out, "═══════════════════════════════════════════════════════════")?;
    writeln!(out)?;
    writeln!(out, "Documents analyzed: {}", format_number(report.units as u64))?;
    writeln!(out, "Distinct words:     {}", format_number(report.results.len() as u64))?;
    writeln!(out, "Total words:        {}", format_number(report.total_words()))?;
    writeln!(out)?;

    let shown = match top {
        Some(n) => n.min(report.results.len()),
        None => report.results.len(),
    };
    for (word, count) in &report.results[..shown] {
        writeln!(out, "{}: {}", word, count)?;
    }
    if shown < report.results.len() {
        writeln!(out, "... {} more", report.results.len() - shown)?;
    }

    Ok(())
}

/// Format number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
