//! CLI output formatting and display helpers.

use vortexflow_core::classifier::TARGET_SERVICE_LABEL;
use vortexflow_core::store::Session;
use vortexflow_core::{AnalysisReport, RunOutcome, RunSummary};

/// Returns terminal width from COLUMNS, or 80 if unset/invalid.
pub(crate) fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending an ellipsis if truncated.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    match width {
        0 => String::new(),
        1 => "…".to_string(),
        _ => {
            let mut output: String = text.chars().take(width - 1).collect();
            output.push('…');
            output
        }
    }
}

pub(crate) fn analysis_summary_lines(report: &AnalysisReport) -> Vec<String> {
    let mut lines = vec![
        format!("Links found:       {}", report.raw_count),
        format!("Banned (skipped):  {}", report.banned_count),
        format!("Duplicates:        {}", report.duplicate_count),
        format!("Unique links:      {}", report.unique_links.len()),
        format!("{TARGET_SERVICE_LABEL} links:     {}", report.target_count),
        format!(
            "Jobs:              {} ({} single, {} multi)",
            report.jobs.len(),
            report.single_jobs(),
            report.multi_jobs()
        ),
    ];

    if !report.other_domains.is_empty() {
        lines.push("Other links:".to_string());
        let mut domains: Vec<_> = report.other_domains.iter().collect();
        domains.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        lines.extend(
            domains
                .into_iter()
                .map(|(domain, count)| format!("  {domain}: {count}")),
        );
    }

    for skipped in &report.skipped_documents {
        lines.push(format!(
            "Skipped {}: {}",
            skipped.path.display(),
            skipped.reason
        ));
    }
    lines
}

pub(crate) fn print_analysis_summary(report: &AnalysisReport) {
    let width = terminal_width();
    for line in analysis_summary_lines(report) {
        println!("{}", truncate_to_width(&line, width));
    }
}

pub(crate) fn run_summary_lines(summary: &RunSummary) -> Vec<String> {
    let headline = match summary.outcome {
        RunOutcome::Completed => "Run complete.",
        RunOutcome::Stopped => "Run stopped.",
    };
    let mut lines = vec![
        headline.to_string(),
        format!(
            "Downloaded {} of {} links ({} manual, {} recovered on retry)",
            summary.succeeded + summary.manual + summary.recovered,
            summary.total_links,
            summary.manual,
            summary.recovered
        ),
    ];
    if !summary.failed.is_empty() {
        lines.push(format!("Failed links: {}", summary.failed.len()));
        lines.extend(
            summary
                .failed
                .iter()
                .map(|record| format!("  {} -> {}", record.link(), record.job().folder_name())),
        );
        lines.push(
            "  Suggestion: download them by hand, then run `vortexflow sort-manual`".to_string(),
        );
    }
    if summary.remaining_links > 0 {
        lines.push(format!(
            "{} links saved for later; run `vortexflow resume` to continue",
            summary.remaining_links
        ));
    }
    lines
}

pub(crate) fn print_run_summary(summary: &RunSummary) {
    let width = terminal_width();
    for line in run_summary_lines(summary) {
        println!("{}", truncate_to_width(&line, width));
    }
}

pub(crate) fn session_line(session: &Session) -> String {
    format!(
        "Interrupted session: {} links in {} jobs, output folder {}",
        session.remaining_links(),
        session.remaining_jobs.len(),
        session.output_folder
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use vortexflow_core::DownloadJob;

    use super::*;

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abcdef", 1), "…");
        assert_eq!(truncate_to_width("abcdef", 0), "");
    }

    #[test]
    fn test_analysis_summary_lists_other_domains_by_count() {
        let report = AnalysisReport {
            raw_count: 7,
            banned_count: 1,
            duplicate_count: 2,
            unique_links: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            target_count: 1,
            jobs: vec![DownloadJob::single("c.html", "https://terabox.com/s/1", "Movie").unwrap()],
            other_domains: BTreeMap::from([
                ("Telegram".to_string(), 1),
                ("youtube.com".to_string(), 2),
            ]),
            skipped_documents: Vec::new(),
        };
        let lines = analysis_summary_lines(&report);
        assert!(lines.contains(&"Links found:       7".to_string()));
        assert!(lines.contains(&"Jobs:              1 (1 single, 0 multi)".to_string()));
        let youtube = lines.iter().position(|l| l == "  youtube.com: 2").unwrap();
        let telegram = lines.iter().position(|l| l == "  Telegram: 1").unwrap();
        assert!(youtube < telegram);
    }

    #[test]
    fn test_run_summary_mentions_resume_and_failures() {
        let job = DownloadJob::single("c.html", "https://terabox.com/s/1", "Movie").unwrap();
        let summary = RunSummary {
            outcome: RunOutcome::Stopped,
            total_links: 5,
            processed: 2,
            succeeded: 1,
            manual: 0,
            recovered: 0,
            failed: vec![job.failed_record("https://terabox.com/s/1")],
            remaining_links: 3,
        };
        let lines = run_summary_lines(&summary);
        assert_eq!(lines[0], "Run stopped.");
        assert!(lines.iter().any(|l| l.contains("https://terabox.com/s/1 -> Movie")));
        assert!(lines.iter().any(|l| l.contains("vortexflow resume")));
    }
}
