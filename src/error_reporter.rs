use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::WebspaceError;
use crate::scanner::{ScanPhase, ScanProgress};

/// Formats errors and progress for stderr
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
    show_timestamps: bool,
    /// Rewrite the progress line in place instead of printing one per update
    interactive: bool,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            show_timestamps: false,
            interactive: atty::is(atty::Stream::Stderr),
        }
    }

    pub fn with_options(verbosity: VerbosityLevel, show_timestamps: bool, interactive: bool) -> Self {
        Self {
            verbosity,
            show_timestamps,
            interactive,
        }
    }

    pub fn report_error(&self, error: &WebspaceError) {
        eprintln!("{}", self.format_error(error));
    }

    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    pub fn report_progress(&self, progress: &ScanProgress) {
        if let Some(line) = self.format_progress(progress) {
            if self.interactive {
                eprint!("\r{}", line);
                if progress.phase == ScanPhase::Complete {
                    eprintln!();
                }
            } else {
                eprintln!("{}", line);
            }
        }
    }

    pub fn format_error(&self, error: &WebspaceError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => self.format_error_brief(error),
            VerbosityLevel::Normal => self.format_error_normal(error),
            VerbosityLevel::Verbose => self.format_error_verbose(error),
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal | VerbosityLevel::Verbose => format!(
                "Configuration Error: {}\n{}",
                error,
                config_help(error)
            ),
        }
    }

    /// `None` when nothing should be printed for this update
    pub fn format_progress(&self, progress: &ScanProgress) -> Option<String> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        match progress.phase {
            ScanPhase::Discovery => Some("Discovering webspace files...".to_string()),
            ScanPhase::Loading | ScanPhase::Complete => {
                let percentage = if progress.total == 0 {
                    100
                } else {
                    progress.completed * 100 / progress.total
                };
                let mut line = format!(
                    "Progress: {}/{} ({}%)",
                    progress.completed, progress.total, percentage
                );
                if self.verbosity == VerbosityLevel::Verbose
                    && let Some(file) = &progress.current_file
                {
                    line.push_str(&format!(" - {}", file.display()));
                }
                Some(line)
            }
        }
    }

    fn timestamp(&self) -> String {
        if self.show_timestamps {
            format!("[{}] ", chrono::Utc::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }

    fn format_error_brief(&self, error: &WebspaceError) -> String {
        match error {
            WebspaceError::ConfigFormat { path, .. } => format!("INVALID: {}", path.display()),
            WebspaceError::InvalidUrlDefinition { webspace, url } => {
                format!("INVALID URL: {} in {}", url, webspace)
            }
            WebspaceError::ResourceNotFound { resource, .. } => {
                format!("NOT FOUND: {}", resource.display())
            }
            _ => format!("ERROR: {}", error),
        }
    }

    fn format_error_normal(&self, error: &WebspaceError) -> String {
        format!("{}{}", self.timestamp(), error)
    }

    fn format_error_verbose(&self, error: &WebspaceError) -> String {
        let mut output = self.format_error_normal(error);

        match error {
            WebspaceError::ConfigFormat { path, details } => {
                output.push_str(&format!("\nFile: {}", path.display()));
                output.push_str(&format!("\nDetails: {}", details));
                output.push_str("\nSuggestion: Check the document against webspace-1.0.xsd");
            }
            WebspaceError::InvalidUrlDefinition { .. } => {
                output.push_str(
                    "\nSuggestion: Give the url language and country (attributes or \
                     {language}/{country}/{localization} placeholders), a segment when the \
                     webspace defines segments, or a redirect",
                );
            }
            WebspaceError::ResourceNotFound { searched, .. } => {
                output.push_str("\nSearched:");
                for candidate in searched {
                    output.push_str(&format!("\n  {}", candidate.display()));
                }
                output.push_str("\nSuggestion: Add the containing directory with --search-path");
            }
            _ => {}
        }

        let mut current: &dyn std::error::Error = error;
        let mut level = 0;
        while let Some(source) = current.source() {
            if level == 0 {
                output.push_str("\nError Chain:");
            }
            level += 1;
            output.push_str(&format!("\n  {}: {}", level, source));
            current = source;
        }

        output
    }
}

fn config_help(error: &ConfigError) -> String {
    match error {
        ConfigError::Io(_) => "Check that the configuration file exists and is readable".to_string(),
        ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
            "Check the configuration file syntax (TOML/JSON format expected)".to_string()
        }
        ConfigError::UnsupportedFormat(_) => {
            "Use a .toml or .json configuration file".to_string()
        }
        ConfigError::Environment(_) => {
            "Fix or unset the WEBSPACE_CONFIG_* environment variable".to_string()
        }
        ConfigError::Validation(_) => {
            "Resolve conflicting values between file, environment, and CLI".to_string()
        }
    }
}
