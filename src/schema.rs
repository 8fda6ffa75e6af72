//! Bundled webspace XML Schema
//!
//! The XSD is compiled into the binary and parsed by libxml2 once per
//! process. Parsing is serialized by the `OnceLock`; validation afterwards
//! runs concurrently with a fresh libxml2 context per call.

use std::path::Path;
use std::sync::OnceLock;

use crate::error::{LibXml2Error, Result, WebspaceError};
use crate::libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};

/// Namespace every element of a webspace document lives in
pub const WEBSPACE_NAMESPACE: &str = "http://schemas.sulu.io/webspace/webspace";

/// Source of `webspace-1.0.xsd`
pub const WEBSPACE_XSD: &str = include_str!("../schema/webspace-1.0.xsd");

static PARSED_SCHEMA: OnceLock<std::result::Result<XmlSchemaPtr, String>> = OnceLock::new();

/// Handle to the parsed webspace schema
#[derive(Debug, Clone, Copy)]
pub struct WebspaceSchema {
    schema: &'static XmlSchemaPtr,
}

impl WebspaceSchema {
    /// Parse (first call) or reuse the bundled schema.
    ///
    /// # Errors
    ///
    /// `WebspaceError::LibXml2Internal` if libxml2 rejects the bundled XSD.
    pub fn load() -> Result<Self> {
        let parsed = PARSED_SCHEMA.get_or_init(|| {
            LibXml2Wrapper::new()
                .parse_schema_from_memory(WEBSPACE_XSD.as_bytes())
                .map_err(|e| e.to_string())
        });

        match parsed {
            Ok(schema) => Ok(Self { schema }),
            Err(details) => Err(WebspaceError::LibXml2Internal {
                details: format!("bundled webspace schema: {}", details),
            }),
        }
    }

    /// Check the document at `path` against the schema.
    ///
    /// Schema violations and documents libxml2 cannot parse are reported as
    /// `WebspaceError::ConfigFormat`.
    pub fn validate(&self, path: &Path) -> Result<()> {
        match LibXml2Wrapper::new().validate_file(self.schema, path) {
            Ok(ValidationResult::Valid) => Ok(()),
            Ok(ValidationResult::Invalid {
                error_count,
                errors,
            }) => {
                let details = if errors.is_empty() {
                    format!(
                        "document does not validate against webspace-1.0.xsd (code {})",
                        error_count
                    )
                } else {
                    errors.join("; ")
                };
                Err(WebspaceError::format(path, details))
            }
            Ok(ValidationResult::InternalError { code })
            | Err(LibXml2Error::ValidationFailed { code, .. }) => Err(WebspaceError::format(
                path,
                format!("document could not be read as XML (libxml2 code {})", code),
            )),
            Err(other) => Err(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<webspace xmlns="http://schemas.sulu.io/webspace/webspace">
    <name>Sulu CMF</name>
    <key>sulu_io</key>
    <localizations>
        <localization language="de" country="at"/>
    </localizations>
    <theme>
        <key>sulu</key>
    </theme>
    <portals>
        <portal>
            <name>Sulu CMF</name>
            <key>sulu_io</key>
            <resource-locator>
                <strategy>tree</strategy>
            </resource-locator>
            <environments>
                <environment type="prod">
                    <urls>
                        <url>{localization}.sulu.io</url>
                    </urls>
                </environment>
            </environments>
        </portal>
    </portals>
</webspace>
"#;

    #[test]
    fn test_bundled_schema_parses() {
        assert!(WebspaceSchema::load().is_ok());
        // second call reuses the parsed schema
        assert!(WebspaceSchema::load().is_ok());
    }

    #[test]
    fn test_minimal_document_validates() {
        let schema = WebspaceSchema::load().unwrap();
        let file = write_temp(MINIMAL);
        schema.validate(file.path()).unwrap();
    }

    #[test]
    fn test_missing_key_is_config_format_error() {
        let schema = WebspaceSchema::load().unwrap();
        let file = write_temp(&MINIMAL.replacen("<key>sulu_io</key>", "", 1));

        let err = schema.validate(file.path()).unwrap_err();
        assert!(matches!(err, WebspaceError::ConfigFormat { .. }));
    }

    #[test]
    fn test_wrong_namespace_is_config_format_error() {
        let schema = WebspaceSchema::load().unwrap();
        let file = write_temp(&MINIMAL.replace(WEBSPACE_NAMESPACE, "http://example.com/other"));

        let err = schema.validate(file.path()).unwrap_err();
        assert!(matches!(err, WebspaceError::ConfigFormat { .. }));
    }
}
