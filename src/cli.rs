use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How scan results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Per-file lines followed by a summary
    #[default]
    Human,
    /// Machine readable results including the loaded webspaces
    Json,
    /// A single summary line
    Summary,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only failures
    Quiet,
    #[default]
    Normal,
    /// Error details and per-file timings
    Verbose,
}

/// Load and check webspace configuration files
#[derive(Parser, Debug, Clone)]
#[command(name = "webspace-config")]
#[command(about = "Load webspace XML configuration files and report problems")]
#[command(version)]
pub struct Cli {
    /// Webspace file, resource name, or directory of webspace files
    pub path: PathBuf,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Only report failures
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Number of webspace files loaded concurrently
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Additional directory to look up webspace resources in
    #[arg(long = "search-path", action = clap::ArgAction::Append)]
    pub search_paths: Vec<PathBuf>,

    /// Skip the XML Schema check before building the webspace
    #[arg(long = "no-schema-validation")]
    pub no_schema_validation: bool,

    /// File extensions to discover (comma-separated)
    #[arg(short = 'e', long = "extensions")]
    pub extensions: Option<String>,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum directory depth to descend into
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Show progress on stderr
    #[arg(long = "progress")]
    pub progress: bool,

    /// Stop starting new loads after the first failure
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Extensions given with `--extensions`, if any
    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_deref().map(split_list)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Split a comma-separated list, dropping empty items
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
