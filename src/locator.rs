use std::path::{Path, PathBuf};

use crate::error::{Result, WebspaceError};

/// Resolves webspace resource names to files on disk
///
/// Absolute paths are used as-is. Relative paths are tried against the
/// working directory first, then against each search directory in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLocator {
    search_paths: Vec<PathBuf>,
}

impl FileLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Candidate locations for `resource`, in lookup order
    pub fn candidates(&self, resource: &Path) -> Vec<PathBuf> {
        if resource.is_absolute() {
            return vec![resource.to_path_buf()];
        }

        std::iter::once(resource.to_path_buf())
            .chain(self.search_paths.iter().map(|dir| dir.join(resource)))
            .collect()
    }

    /// First existing file for `resource`
    ///
    /// # Errors
    ///
    /// `WebspaceError::ResourceNotFound` listing every location tried.
    pub fn locate(&self, resource: &Path) -> Result<PathBuf> {
        let candidates = self.candidates(resource);

        if let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) {
            return Ok(found.clone());
        }

        Err(WebspaceError::ResourceNotFound {
            resource: resource.to_path_buf(),
            searched: candidates,
        })
    }
}
