//! # webspace-config
//!
//! Loads webspace XML configuration files into an immutable in-memory
//! model: localization trees, segments, theme, portals with their
//! environments and URL templates. Documents are checked against the bundled
//! `webspace-1.0.xsd` through libxml2 before they are built, and whole
//! directories can be loaded concurrently.
//!
//! ```no_run
//! use webspace_config::{FileLocator, XmlFileLoader};
//!
//! let loader = XmlFileLoader::new(FileLocator::with_search_paths(vec!["config/webspaces".into()]));
//! let webspace = loader.load("sulu.io.xml")?;
//! for portal in webspace.portals() {
//!     println!("{} -> {:?}", portal.key(), portal.localizations().codes("_"));
//! }
//! # Ok::<(), webspace_config::WebspaceError>(())
//! ```

pub mod cli;
pub mod collection;
pub mod config;
pub mod error;
pub mod error_reporter;
pub mod file_discovery;
pub mod libxml2;
pub mod loader;
pub mod localization;
pub mod locator;
pub mod logging;
pub mod output;
pub mod scanner;
pub mod schema;
pub mod webspace;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use collection::WebspaceCollection;
pub use config::{Config, ConfigError, ConfigManager, EnvProvider, SystemEnvProvider};
pub use error::{LibXml2Error, Result, WebspaceError};
pub use error_reporter::ErrorReporter;
pub use file_discovery::FileDiscovery;
pub use libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};
pub use loader::{UrlAttributes, XmlFileLoader, check_url, parse_webspace};
pub use localization::{Localization, LocalizationId, LocalizationTree};
pub use locator::FileLocator;
pub use output::Output;
pub use scanner::{
    FileLoadResult, LoadStatus, ProgressCallback, ScanConfig, ScanPhase, ScanProgress,
    ScanResults, WebspaceScanner,
};
pub use schema::{WEBSPACE_NAMESPACE, WebspaceSchema};
pub use webspace::{Environment, Portal, Segment, Theme, Url, Webspace};
