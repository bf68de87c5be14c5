//! Markdown summary generation
//!
//! This module renders the final report of a crawl run as a human-readable
//! markdown document.

use crate::crawler::CrawlReport;
use crate::state::PageState;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Writes a markdown summary of a finished run
///
/// # Arguments
///
/// * `report` - The report returned by the crawl
/// * `config_hash` - Hash of the configuration the run used, if known
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    report: &CrawlReport,
    config_hash: Option<&str>,
    output_path: &Path,
) -> std::io::Result<()> {
    fs::write(output_path, format_markdown_summary(report, config_hash))
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport, config_hash: Option<&str>) -> String {
    let stats = &report.stats;
    let mut md = String::new();

    md.push_str("# Crawl Summary\n\n");

    // Writing into a String cannot fail
    md.push_str("## Run Information\n\n");
    let _ = writeln!(md, "- **Started**: {}", stats.started_at.to_rfc3339());
    if let Some(finished) = stats.finished_at {
        let _ = writeln!(md, "- **Finished**: {}", finished.to_rfc3339());
    }
    let duration = stats.elapsed();
    let _ = writeln!(
        md,
        "- **Duration**: {:.2} seconds",
        duration.num_milliseconds() as f64 / 1000.0
    );
    let _ = writeln!(md, "- **State**: {}", report.state);
    let _ = writeln!(md, "- **Stop Reason**: {}", report.stop_reason);
    if let Some(hash) = config_hash {
        let _ = writeln!(md, "- **Config Hash**: {}", hash);
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    let _ = writeln!(md, "- **Links Discovered**: {}", stats.links_discovered);
    let _ = writeln!(md, "- **Pages Dispatched**: {}", stats.pages_dispatched);
    let _ = writeln!(md, "- **Bytes Downloaded**: {}", stats.bytes_downloaded);
    let _ = writeln!(md, "- **Retries**: {}", stats.retries);
    let _ = writeln!(md, "- **robots.txt Failures**: {}", stats.robots_failures);
    let _ = writeln!(md, "- **Success Rate**: {:.2}%\n", stats.success_rate());

    md.push_str("## Page State Breakdown\n\n");
    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    for state in PageState::all_states() {
        let _ = writeln!(md, "| {} | {} |", state, stats.count_for(state));
    }
    md.push('\n');

    md
}
