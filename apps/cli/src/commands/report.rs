//! Human-readable batch summaries.

use colored::Colorize;
use runbucket_core::DownloadReport;
use std::path::Path;

/// Prints the summary to stdout and each failed `(name, error)` pair to stderr.
pub fn print_report(report: &DownloadReport, destination: &Path) {
    let succeeded = report.succeeded().count();
    let summary = format!(
        "Downloaded {succeeded}/{} objects into {} in {:.2}s",
        report.total_items(),
        destination.display(),
        report.total_duration.as_secs_f64()
    );
    if report.is_complete_success() {
        println!("{}", summary.green().bold());
        return;
    }

    println!("{}", summary.yellow().bold());
    for outcome in report.failed() {
        let error = outcome.error().map_or_else(|| "not attempted".to_string(), ToString::to_string);
        eprintln!("  {} {}: {}", "✗".red(), outcome.name(), error);
    }
}
