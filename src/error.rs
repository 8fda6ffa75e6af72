use std::path::PathBuf;

use thiserror::Error;

/// Main error type for loading webspace configuration
#[derive(Error, Debug)]
pub enum WebspaceError {
    #[error("IO error: {path} - {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid webspace configuration: {path} - {details}")]
    ConfigFormat { path: PathBuf, details: String },

    #[error("Invalid url definition \"{url}\" in webspace \"{webspace}\"")]
    InvalidUrlDefinition { webspace: String, url: String },

    #[error("Webspace resource not found: {resource}")]
    ResourceNotFound {
        resource: PathBuf,
        searched: Vec<PathBuf>,
    },

    #[error("Unsupported resource: {path} - only .xml files can be loaded")]
    UnsupportedResource { path: PathBuf },

    #[error("LibXML2 internal error: {details}")]
    LibXml2Internal { details: String },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WebspaceError {
    /// Whether the error describes a defect in the webspace document itself
    /// rather than a problem reaching or reading it.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            WebspaceError::ConfigFormat { .. } | WebspaceError::InvalidUrlDefinition { .. }
        )
    }

    pub(crate) fn format(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        WebspaceError::ConfigFormat {
            path: path.into(),
            details: details.into(),
        }
    }
}

/// LibXML2-specific error types
#[derive(Error, Debug)]
pub enum LibXml2Error {
    #[error("Schema parsing failed: null pointer returned")]
    SchemaParseFailed,

    #[error("Validation context creation failed")]
    ValidationContextCreationFailed,

    #[error("File validation failed with code {code}: {file}")]
    ValidationFailed { code: i32, file: PathBuf },

    #[error("Memory allocation failed in libxml2")]
    MemoryAllocation,
}

impl From<LibXml2Error> for WebspaceError {
    fn from(err: LibXml2Error) -> Self {
        WebspaceError::LibXml2Internal {
            details: err.to_string(),
        }
    }
}

impl From<crate::config::ConfigError> for WebspaceError {
    fn from(err: crate::config::ConfigError) -> Self {
        WebspaceError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WebspaceError>;

/// LibXML2 result type alias
pub type LibXml2Result<T> = std::result::Result<T, LibXml2Error>;
