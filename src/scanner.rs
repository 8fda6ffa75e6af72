//! Concurrent loading of many webspace files
//!
//! Discovery is async; each load runs on the blocking pool because the
//! loader does synchronous file IO and libxml2 work. A semaphore bounds the
//! number of loads in flight. Permits are taken in discovery order, so with
//! `fail_fast` every file after the first failure that has not been started
//! yet is reported as skipped.

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::collection::WebspaceCollection;
use crate::error::{Result, WebspaceError};
use crate::file_discovery::FileDiscovery;
use crate::loader::XmlFileLoader;
use crate::webspace::Webspace;

/// Scanner configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// Maximum number of loads running at once
    pub max_concurrent_loads: usize,
    /// Stop starting new loads after the first failure
    pub fail_fast: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: num_cpus::get(),
            fail_fast: false,
        }
    }
}

/// Outcome of loading one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    /// A complete webspace was built
    Loaded { webspace: String },
    /// The document is not a valid webspace definition
    Invalid { reason: String },
    /// The file could not be located, read or validated
    Error { message: String },
    /// The file was never loaded
    Skipped { reason: String },
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadStatus::Loaded { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, LoadStatus::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadStatus::Error { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, LoadStatus::Skipped { .. })
    }

    /// Invalid and errored files count as failures; skipped files do not
    pub fn is_failure(&self) -> bool {
        self.is_invalid() || self.is_error()
    }
}

/// Result of loading a single file
#[derive(Debug, Clone, Serialize)]
pub struct FileLoadResult {
    pub path: PathBuf,
    pub status: LoadStatus,
    pub duration: Duration,
    pub error_details: Vec<String>,
}

impl FileLoadResult {
    pub fn loaded(path: PathBuf, webspace_key: &str, duration: Duration) -> Self {
        Self {
            path,
            status: LoadStatus::Loaded {
                webspace: webspace_key.to_string(),
            },
            duration,
            error_details: Vec::new(),
        }
    }

    /// Classify a loader error as `Invalid` or `Error`
    pub fn failed(path: PathBuf, error: &WebspaceError, duration: Duration) -> Self {
        let mut error_details = vec![error.to_string()];
        if let WebspaceError::ResourceNotFound { searched, .. } = error {
            error_details.extend(
                searched
                    .iter()
                    .map(|candidate| format!("searched: {}", candidate.display())),
            );
        }

        let status = if error.is_definition_error() {
            LoadStatus::Invalid {
                reason: error.to_string(),
            }
        } else {
            LoadStatus::Error {
                message: error.to_string(),
            }
        };

        Self {
            path,
            status,
            duration,
            error_details,
        }
    }

    pub fn skipped(path: PathBuf, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            path,
            status: LoadStatus::Skipped {
                reason: reason.clone(),
            },
            duration: Duration::ZERO,
            error_details: vec![reason],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Discovery,
    Loading,
    Complete,
}

/// Progress update sent to a [`ProgressCallback`]
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub current_file: Option<PathBuf>,
    pub completed: usize,
    pub total: usize,
    pub phase: ScanPhase,
}

pub type ProgressCallback = Arc<dyn Fn(ScanProgress) + Send + Sync>;

/// Aggregated results of a scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanResults {
    pub total_files: usize,
    pub loaded_files: usize,
    pub invalid_files: usize,
    pub error_files: usize,
    pub skipped_files: usize,
    /// Sum of the per-file load durations
    pub total_duration: Duration,
    pub average_duration: Duration,
    /// Wall-clock time of the whole scan
    pub elapsed: Duration,
    pub file_results: Vec<FileLoadResult>,
    /// Successfully loaded webspaces, in discovery order
    pub webspaces: Vec<Webspace>,
}

impl ScanResults {
    /// Count `file_results`; `elapsed` is the measured wall-clock time
    pub fn aggregate(
        file_results: Vec<FileLoadResult>,
        webspaces: Vec<Webspace>,
        elapsed: Duration,
    ) -> Self {
        let total_files = file_results.len();
        let mut loaded_files = 0;
        let mut invalid_files = 0;
        let mut error_files = 0;
        let mut skipped_files = 0;
        let mut total_duration = Duration::ZERO;

        for result in &file_results {
            match result.status {
                LoadStatus::Loaded { .. } => loaded_files += 1,
                LoadStatus::Invalid { .. } => invalid_files += 1,
                LoadStatus::Error { .. } => error_files += 1,
                LoadStatus::Skipped { .. } => skipped_files += 1,
            }
            total_duration += result.duration;
        }

        let average_duration = if total_files > 0 {
            total_duration / total_files as u32
        } else {
            Duration::ZERO
        };

        Self {
            total_files,
            loaded_files,
            invalid_files,
            error_files,
            skipped_files,
            total_duration,
            average_duration,
            elapsed,
            file_results,
            webspaces,
        }
    }

    /// Every file was loaded (and there was at least one)
    pub fn all_loaded(&self) -> bool {
        self.total_files > 0 && self.loaded_files == self.total_files
    }

    pub fn has_errors(&self) -> bool {
        self.invalid_files > 0 || self.error_files > 0
    }

    /// Percentage of files that loaded
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.loaded_files as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileLoadResult> {
        self.file_results.iter().filter(|r| r.status.is_failure())
    }

    pub fn into_collection(self) -> WebspaceCollection {
        WebspaceCollection::from_webspaces(self.webspaces)
    }
}

/// Loads every webspace file below a path
pub struct WebspaceScanner {
    loader: Arc<XmlFileLoader>,
    config: ScanConfig,
}

impl WebspaceScanner {
    pub fn new(loader: XmlFileLoader, config: ScanConfig) -> Self {
        Self {
            loader: Arc::new(loader),
            config,
        }
    }

    pub fn loader(&self) -> &XmlFileLoader {
        &self.loader
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub async fn scan_path(&self, path: &Path, discovery: &FileDiscovery) -> Result<ScanResults> {
        self.scan_path_with_progress(path, discovery, None).await
    }

    /// Scan a directory (through `discovery`) or a single resource.
    ///
    /// A path that is not a directory is handed to the loader as-is, so a
    /// relative name is resolved through the loader's search paths.
    pub async fn scan_path_with_progress(
        &self,
        path: &Path,
        discovery: &FileDiscovery,
        progress: Option<ProgressCallback>,
    ) -> Result<ScanResults> {
        let start = Instant::now();
        report(&progress, None, 0, 0, ScanPhase::Discovery);

        let is_dir = tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        let files = if is_dir {
            discovery.discover_files(path).await?
        } else {
            vec![path.to_path_buf()]
        };

        tracing::info!(path = %path.display(), files = files.len(), "scanning webspace files");

        let mut results = self.load_files(files, progress.clone()).await?;
        results.elapsed = start.elapsed();

        report(
            &progress,
            None,
            results.total_files,
            results.total_files,
            ScanPhase::Complete,
        );

        tracing::info!(
            loaded = results.loaded_files,
            invalid = results.invalid_files,
            errors = results.error_files,
            skipped = results.skipped_files,
            elapsed_ms = results.elapsed.as_millis() as u64,
            "scan finished"
        );

        Ok(results)
    }

    /// Load `files` concurrently, keeping their order in the results
    pub async fn load_files(
        &self,
        files: Vec<PathBuf>,
        progress: Option<ProgressCallback>,
    ) -> Result<ScanResults> {
        let start = Instant::now();
        let total = files.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicBool::new(false));
        let semaphore = Arc::new(tokio::sync::Semaphore::new(
            self.config.max_concurrent_loads.max(1),
        ));

        let mut tasks = Vec::with_capacity(total);

        for path in files {
            if !XmlFileLoader::supports(&path) {
                tasks.push(finished(FileLoadResult::skipped(
                    path,
                    "unsupported file extension",
                )));
                continue;
            }

            let permit = Arc::clone(&semaphore).acquire_owned().await.map_err(|e| {
                WebspaceError::Concurrency {
                    details: format!("load semaphore closed: {}", e),
                }
            })?;

            if self.config.fail_fast && failed.load(Ordering::SeqCst) {
                drop(permit);
                tasks.push(finished(FileLoadResult::skipped(
                    path,
                    "not started after an earlier failure (fail-fast)",
                )));
                continue;
            }

            let loader = Arc::clone(&self.loader);
            let completed = Arc::clone(&completed);
            let failed = Arc::clone(&failed);
            let progress = progress.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                let start = Instant::now();

                let task_path = path.clone();
                let outcome = tokio::task::spawn_blocking(move || loader.load(&task_path))
                    .await
                    .map_err(|e| WebspaceError::Concurrency {
                        details: format!("load task panicked: {}", e),
                    })
                    .and_then(|loaded| loaded);
                let duration = start.elapsed();

                let (result, webspace) = match outcome {
                    Ok(webspace) => {
                        tracing::debug!(path = %path.display(), key = webspace.key(), "loaded webspace");
                        (
                            FileLoadResult::loaded(path.clone(), webspace.key(), duration),
                            Some(webspace),
                        )
                    }
                    Err(error) => {
                        tracing::debug!(path = %path.display(), %error, "webspace failed to load");
                        failed.store(true, Ordering::SeqCst);
                        (FileLoadResult::failed(path.clone(), &error, duration), None)
                    }
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                report(&progress, Some(path), done, total, ScanPhase::Loading);

                Ok::<_, WebspaceError>((result, webspace))
            }));
        }

        let outcomes = try_join_all(tasks)
            .await
            .map_err(|e| WebspaceError::Concurrency {
                details: format!("Task join error: {}", e),
            })?;

        let mut file_results = Vec::with_capacity(outcomes.len());
        let mut webspaces = Vec::new();
        for outcome in outcomes {
            let (result, webspace) = outcome?;
            file_results.push(result);
            webspaces.extend(webspace);
        }

        Ok(ScanResults::aggregate(
            file_results,
            webspaces,
            start.elapsed(),
        ))
    }
}

type LoadOutcome = Result<(FileLoadResult, Option<Webspace>)>;

fn finished(result: FileLoadResult) -> tokio::task::JoinHandle<LoadOutcome> {
    tokio::spawn(async move { Ok((result, None)) })
}

fn report(
    progress: &Option<ProgressCallback>,
    current_file: Option<PathBuf>,
    completed: usize,
    total: usize,
    phase: ScanPhase,
) {
    if let Some(callback) = progress {
        callback(ScanProgress {
            current_file,
            completed,
            total,
            phase,
        });
    }
}
