//! Human-readable run summary printed to stdout.

use std::time::Duration;

use transit_downloader::PipelineSummary;

/// Prints `line` unless quiet mode is on.
pub(crate) fn say(quiet: bool, line: &str) {
    if !quiet {
        println!("{line}");
    }
}

/// Formats a duration as whole minutes and seconds, e.g. `3m 7s`.
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{}m {}s", total / 60, total % 60)
}

/// Summary lines for a finished run.
pub(crate) fn render(summary: &PipelineSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Total files to download: {}", summary.jobs),
        format!(
            "Downloaded {} files, {} failed ({} archives)",
            summary.downloaded, summary.failed_downloads, summary.archives
        ),
    ];

    if let Some(log) = &summary.extraction_log {
        lines.push(format!(
            "Extraction errors logged to: {}. {} found.",
            log.path.display(),
            log.error_count
        ));
    } else if summary.extracted > 0 {
        lines.push(format!("Extracted {} archives", summary.extracted));
    }

    if summary.panicked_tasks > 0 {
        lines.push(format!("{} tasks aborted unexpectedly", summary.panicked_tasks));
    }

    lines.push(format!("Everything saved in {}", summary.output_root.display()));
    lines.push(format!(
        "Download errors logged to: {}. {} found.",
        summary.errors_log.path.display(),
        summary.errors_log.error_count
    ));
    lines.push(format!(
        "Download complete. Total time: {}",
        format_elapsed(summary.elapsed)
    ));
    lines
}
