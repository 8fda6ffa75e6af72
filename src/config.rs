use crate::cli::{Cli, OutputFormat, VerbosityLevel, split_list};
use crate::file_discovery::FileDiscovery;
use crate::loader::XmlFileLoader;
use crate::locator::FileLocator;
use crate::scanner::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Names looked up, in order, in every configuration directory
pub const CONFIG_FILE_NAMES: [&str; 4] = [
    "webspace-config.toml",
    "webspace-config.json",
    ".webspace-config.toml",
    ".webspace-config.json",
];

const ENV_PREFIX: &str = "WEBSPACE_CONFIG_";

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the process environment
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Application configuration
///
/// Every section has defaults, so a configuration file only needs to name
/// the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub loader: LoaderConfig,
    pub discovery: DiscoveryConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Concurrent loads; the CPU count when unset
    pub threads: Option<usize>,
    pub fail_fast: bool,
    /// Check documents against the bundled XSD before building them
    pub schema_validation: bool,
    /// Directories relative resource names are looked up in
    pub search_paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub extensions: Vec<String>,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbose: bool,
    pub quiet: bool,
    pub progress: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            threads: None,
            fail_fast: false,
            schema_validation: true,
            search_paths: Vec::new(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_depth: None,
            follow_symlinks: false,
        }
    }
}

impl OutputConfig {
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

impl Config {
    /// Effective number of concurrent loads
    pub fn thread_count(&self) -> usize {
        self.loader.threads.unwrap_or_else(num_cpus::get)
    }

    pub fn build_loader(&self) -> XmlFileLoader {
        XmlFileLoader::new(FileLocator::with_search_paths(self.loader.search_paths.clone()))
            .with_schema_validation(self.loader.schema_validation)
    }

    pub fn build_discovery(&self) -> crate::error::Result<FileDiscovery> {
        Ok(FileDiscovery::new()
            .with_extensions(self.discovery.extensions.clone())
            .with_include_patterns(self.discovery.include_patterns.clone())?
            .with_exclude_patterns(self.discovery.exclude_patterns.clone())?
            .with_max_depth(self.discovery.max_depth)
            .with_follow_symlinks(self.discovery.follow_symlinks))
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            max_concurrent_loads: self.thread_count(),
            fail_fast: self.loader.fail_fast,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(cli, &SystemEnvProvider).await
    }

    pub async fn load_config_with(cli: &Cli, env: &impl EnvProvider) -> Result<Config> {
        let config = match &cli.config {
            Some(path) => Self::load_from_file(path).await?,
            None => Self::find_config_file().await?.unwrap_or_default(),
        };

        let config = Self::apply_environment_overrides_with(env, config)?;
        let config = Self::merge_with_cli(config, cli);

        Self::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;
        tracing::debug!(path = %path.display(), "reading configuration file");

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => match toml::from_str::<Config>(&content) {
                Ok(config) => Ok(config),
                Err(_) => Ok(serde_json::from_str(&content)?),
            },
        }
    }

    /// Look for a configuration file in the working directory, then in the
    /// user configuration directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut directories = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            directories.push(config_dir.join("webspace-config"));
        }

        Self::find_config_file_in(&directories).await
    }

    /// First of [`CONFIG_FILE_NAMES`] found in `directories`
    pub async fn find_config_file_in(directories: &[PathBuf]) -> Result<Option<Config>> {
        for directory in directories {
            for name in CONFIG_FILE_NAMES {
                let path = directory.join(name);
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply `WEBSPACE_CONFIG_*` overrides from `env`
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(threads) = parse_env(env, "THREADS")? {
            config.loader.threads = Some(threads);
        }
        if let Some(fail_fast) = parse_env(env, "FAIL_FAST")? {
            config.loader.fail_fast = fail_fast;
        }
        if let Some(schema_validation) = parse_env(env, "SCHEMA_VALIDATION")? {
            config.loader.schema_validation = schema_validation;
        }
        if let Some(search_paths) = env.get(&env_key("SEARCH_PATHS")) {
            config.loader.search_paths = std::env::split_paths(&search_paths)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }

        let verbose = parse_env::<bool>(env, "VERBOSE")?;
        let quiet = parse_env::<bool>(env, "QUIET")?;
        if verbose == Some(true) && quiet == Some(true) {
            return Err(ConfigError::Environment(format!(
                "{} and {} cannot both be enabled",
                env_key("VERBOSE"),
                env_key("QUIET")
            )));
        }
        if let Some(verbose) = verbose {
            config.output.verbose = verbose;
        }
        if let Some(quiet) = quiet {
            config.output.quiet = quiet;
        }
        if let Some(format) = parse_env::<OutputFormat>(env, "FORMAT")? {
            config.output.format = format;
        }

        if let Some(extensions) = env.get(&env_key("EXTENSIONS")) {
            config.discovery.extensions = split_list(&extensions);
        }
        if let Some(max_depth) = parse_env(env, "MAX_DEPTH")? {
            config.discovery.max_depth = Some(max_depth);
        }

        Ok(config)
    }

    /// Apply the options given on the command line
    ///
    /// Flags only override when set, so a value from the file or the
    /// environment survives an absent flag.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if cli.threads.is_some() {
            config.loader.threads = cli.threads;
        }
        if cli.fail_fast {
            config.loader.fail_fast = true;
        }
        if cli.no_schema_validation {
            config.loader.schema_validation = false;
        }
        config.loader.search_paths.extend(cli.search_paths.iter().cloned());

        if let Some(format) = cli.format {
            config.output.format = format;
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }
        if cli.progress {
            config.output.progress = true;
        }

        if let Some(extensions) = cli.get_extensions() {
            config.discovery.extensions = extensions;
        }
        if !cli.include_patterns.is_empty() {
            config.discovery.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            config.discovery.exclude_patterns = cli.exclude_patterns.clone();
        }
        if cli.max_depth.is_some() {
            config.discovery.max_depth = cli.max_depth;
        }

        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(threads) = config.loader.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        if config.discovery.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "At least one file extension must be specified".to_string(),
            ));
        }

        for ext in &config.discovery.extensions {
            if ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                return Err(ConfigError::Validation(format!(
                    "Invalid file extension: {}",
                    ext
                )));
            }
        }

        Ok(())
    }
}

fn env_key(name: &str) -> String {
    format!("{}{}", ENV_PREFIX, name)
}

fn parse_env<T: FromStr>(env: &impl EnvProvider, name: &str) -> Result<Option<T>> {
    let key = env_key(name);
    env.get(&key)
        .map(|value| {
            value.trim().parse().map_err(|_| {
                ConfigError::Environment(format!("Invalid {} value: {}", key, value))
            })
        })
        .transpose()
}
