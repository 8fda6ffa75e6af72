//! Rendering of scan results

use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::scanner::{FileLoadResult, LoadStatus, ScanResults};
use crate::webspace::Webspace;

/// Formats [`ScanResults`] for stdout
pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn render(&self, results: &ScanResults) -> serde_json::Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_results(results)),
            OutputFormat::Json => serde_json::to_string_pretty(results),
            OutputFormat::Summary => Ok(self.format_summary_line(results)),
        }
    }

    pub fn format_results(&self, results: &ScanResults) -> String {
        let mut output = String::new();

        if self.verbosity == VerbosityLevel::Quiet {
            for result in results.failures() {
                output.push_str(&self.format_file_result(result));
                output.push('\n');
            }
            return output;
        }

        for result in &results.file_results {
            if self.verbosity == VerbosityLevel::Verbose || !result.status.is_loaded() {
                output.push_str(&self.format_file_result(result));
                output.push('\n');
            }
        }

        if self.verbosity == VerbosityLevel::Verbose && !results.webspaces.is_empty() {
            output.push_str("\nWebspaces:\n");
            for webspace in &results.webspaces {
                output.push_str(&format_webspace(webspace));
            }
        }

        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&self.format_summary(results));
        output
    }

    pub fn format_file_result(&self, result: &FileLoadResult) -> String {
        let path_display = result.path.display();
        let duration_str = format_duration(result.duration);

        match &result.status {
            LoadStatus::Loaded { webspace } => format!(
                "{}  {} ({}) - {}",
                self.colorize("✓ LOADED", "32"),
                path_display,
                duration_str,
                webspace
            ),
            LoadStatus::Invalid { reason } => {
                let mut output = format!(
                    "{}  {} ({})\n    {}",
                    self.colorize("✗ INVALID", "31"),
                    path_display,
                    duration_str,
                    reason
                );
                if self.verbosity == VerbosityLevel::Verbose {
                    for detail in result.error_details.iter().skip(1) {
                        output.push_str(&format!("\n    {}", detail));
                    }
                }
                output
            }
            LoadStatus::Error { message } => {
                let mut output = format!(
                    "{}  {} ({})\n    {}",
                    self.colorize("⚠ ERROR", "33"),
                    path_display,
                    duration_str,
                    message
                );
                if self.verbosity == VerbosityLevel::Verbose {
                    for detail in result.error_details.iter().skip(1) {
                        output.push_str(&format!("\n    {}", detail));
                    }
                }
                output
            }
            LoadStatus::Skipped { reason } => format!(
                "{}  {} - {}",
                self.colorize("- SKIPPED", "36"),
                path_display,
                reason
            ),
        }
    }

    fn format_summary(&self, results: &ScanResults) -> String {
        let mut output = String::new();
        output.push_str("Webspace Summary:\n");
        output.push_str(&format!("  Total files: {}\n", results.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Loaded:", "32"),
            results.loaded_files
        ));

        if results.invalid_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                results.invalid_files
            ));
        }
        if results.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                results.error_files
            ));
        }
        if results.skipped_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Skipped:", "36"),
                results.skipped_files
            ));
        }

        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!("  Duration: {}\n", format_duration(results.elapsed)));

        if self.verbosity == VerbosityLevel::Verbose {
            output.push_str(&format!(
                "  Average load time: {}\n",
                format_duration(results.average_duration)
            ));
        }

        output
    }

    /// `loaded=2 invalid=1 error=0 skipped=0 total=3 (12ms)`
    pub fn format_summary_line(&self, results: &ScanResults) -> String {
        format!(
            "loaded={} invalid={} error={} skipped={} total={} ({})\n",
            results.loaded_files,
            results.invalid_files,
            results.error_files,
            results.skipped_files,
            results.total_files,
            format_duration(results.elapsed)
        )
    }
}

fn format_webspace(webspace: &Webspace) -> String {
    let mut output = format!(
        "  {} ({}) theme={} localizations=[{}]\n",
        webspace.key(),
        webspace.name(),
        webspace.theme().key(),
        webspace.localizations().codes("_").join(", ")
    );

    if webspace.has_segments() {
        let segments: Vec<&str> = webspace.segments().iter().map(|s| s.key()).collect();
        output.push_str(&format!("    segments: {}\n", segments.join(", ")));
    }

    for portal in webspace.portals() {
        output.push_str(&format!("    portal {} ({})\n", portal.key(), portal.name()));
        for environment in portal.environments() {
            let urls: Vec<&str> = environment.urls().iter().map(|u| u.url()).collect();
            output.push_str(&format!(
                "      {}: {}\n",
                environment.kind(),
                urls.join(" ")
            ));
        }
    }

    output
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
