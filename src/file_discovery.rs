use crate::error::{Result, WebspaceError};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Async discovery of webspace files below a directory
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    /// Accepted extensions, compared case-insensitively (e.g. `["xml"]`)
    extensions: Vec<String>,
    include_set: Option<GlobSet>,
    exclude_set: Option<GlobSet>,
    /// Maximum directory depth below the root (None = unlimited)
    max_depth: Option<usize>,
    follow_symlinks: bool,
}

impl FileDiscovery {
    pub fn new() -> Self {
        Self {
            extensions: vec!["xml".to_string()],
            include_set: None,
            exclude_set: None,
            max_depth: None,
            follow_symlinks: false,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Only keep files matching at least one of `patterns`
    pub fn with_include_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.include_set = build_glob_set(&patterns, "include")?;
        Ok(self)
    }

    /// Drop files matching any of `patterns`
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Result<Self> {
        self.exclude_set = build_glob_set(&patterns, "exclude")?;
        Ok(self)
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Webspace files at `path`, sorted by path.
    ///
    /// A file is returned on its own when it passes the filters. Entries
    /// below a directory that cannot be read are logged and skipped.
    pub async fn discover_files(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let metadata = fs::metadata(path).await.map_err(|source| WebspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if metadata.is_file() {
            return Ok(if self.should_process(path) {
                vec![path.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let mut files = Vec::new();
        self.walk_directory(path, 0, &mut files).await?;
        files.sort();

        tracing::debug!(root = %path.display(), found = files.len(), "discovered webspace files");
        Ok(files)
    }

    /// Read the entries of `dir`, whose files sit at `depth`
    fn walk_directory<'a>(
        &'a self,
        dir: &'a Path,
        depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let io_error = |source| WebspaceError::Io {
                path: dir.to_path_buf(),
                source,
            };

            let mut read_dir = fs::read_dir(dir).await.map_err(io_error)?;

            while let Some(entry) = read_dir.next_entry().await.map_err(io_error)? {
                let entry_path = entry.path();

                if !self.follow_symlinks
                    && let Ok(file_type) = entry.file_type().await
                    && file_type.is_symlink()
                {
                    tracing::trace!(path = %entry_path.display(), "skipping symlink");
                    continue;
                }

                if let Err(e) = self.visit(&entry_path, depth, files).await {
                    tracing::warn!(path = %entry_path.display(), error = %e, "skipping unreadable entry");
                }
            }

            Ok(())
        })
    }

    async fn visit(&self, path: &Path, depth: usize, files: &mut Vec<PathBuf>) -> Result<()> {
        let metadata = fs::metadata(path).await.map_err(|source| WebspaceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        if metadata.is_file() {
            if self.should_process(path) {
                files.push(path.to_path_buf());
            }
        } else if metadata.is_dir() && self.max_depth.is_none_or(|max| depth < max) {
            self.walk_directory(path, depth + 1, files).await?;
        }

        Ok(())
    }

    /// Extension, exclude and include filters, in that order
    pub fn should_process(&self, path: &Path) -> bool {
        let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
            return false;
        };
        if !self.extensions.contains(&extension.to_lowercase()) {
            return false;
        }

        if let Some(exclude_set) = &self.exclude_set
            && exclude_set.is_match(path)
        {
            return false;
        }

        match &self.include_set {
            Some(include_set) => include_set.is_match(path),
            None => true,
        }
    }
}

impl Default for FileDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn build_glob_set(patterns: &[String], kind: &str) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                WebspaceError::Config(format!("Invalid {} pattern '{}': {}", kind, pattern, e))
            })?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|e| WebspaceError::Config(format!("Failed to build {} glob set: {}", kind, e)))
}
