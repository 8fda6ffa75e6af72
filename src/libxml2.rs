//! LibXML2 FFI wrapper
//!
//! Safe wrapper around the handful of libxml2 calls needed to check a webspace
//! document against an XML Schema before it is turned into a [`crate::Webspace`].
//!
//! No mature pure-Rust XSD validator exists, so schema checks go through
//! libxml2 directly. The threading rules follow the libxml2 documentation
//! (<http://xmlsoft.org/threads.html>):
//!
//! - **Schema parsing** is NOT thread-safe and must be serialized. The bundled
//!   webspace schema is parsed exactly once behind a `OnceLock` (see
//!   [`crate::schema`]).
//! - **Validation** is thread-safe as long as every call uses its own
//!   validation context, which [`LibXml2Wrapper::validate_file`] does.
//! - **Parsed schemas** are read-only after parsing and can be shared by
//!   reference through [`XmlSchemaPtr`].

use std::ffi::CString;
use std::path::Path;
use std::ptr::NonNull;
use std::sync::Once;

use libc::{c_char, c_int, c_uint};

use crate::error::{LibXml2Error, LibXml2Result};

/// libxml2's parser and globals are initialized exactly once; the init
/// functions themselves are not thread-safe.
static LIBXML2_INIT: Once = Once::new();

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;

    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaValidateFile(
        ctxt: *const XmlSchemaValidCtxt,
        file_name: *const c_char,
        options: c_uint,
    ) -> c_int;

    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        sherr: XmlStructuredErrorFunc,
        ctx: *mut libc::c_void,
    );
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut libc::c_void,
    pub node: *mut libc::c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut libc::c_void, error: *mut xmlError)>;

/// Collects libxml2 validation messages into the `Vec<String>` passed as user data.
/// Messages are prefixed with the line number when libxml2 reports one.
unsafe extern "C" fn structured_error_callback(user_data: *mut libc::c_void, error: *mut xmlError) {
    let errors = unsafe { &mut *(user_data as *mut Vec<String>) };

    if error.is_null() {
        return;
    }

    let msg_ptr = unsafe { (*error).message };
    if msg_ptr.is_null() {
        return;
    }

    let c_str = unsafe { std::ffi::CStr::from_ptr(msg_ptr) };
    if let Ok(s) = c_str.to_str() {
        let line = unsafe { (*error).line };
        if line > 0 {
            errors.push(format!("line {}: {}", line, s.trim()));
        } else {
            errors.push(s.trim().to_string());
        }
    }
}

/// Owned handle to a parsed libxml2 schema, freed on drop.
///
/// Only shared by reference: the webspace schema lives in a `static`.
#[derive(Debug)]
pub struct XmlSchemaPtr {
    ptr: NonNull<XmlSchema>,
}

// Safety: parsed xmlSchema structures are read-only during validation and
// documented as safe to share between threads.
unsafe impl Send for XmlSchemaPtr {}
unsafe impl Sync for XmlSchemaPtr {}

impl XmlSchemaPtr {
    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.ptr.as_ptr()
    }
}

impl Drop for XmlSchemaPtr {
    fn drop(&mut self) {
        unsafe { xmlSchemaFree(self.ptr.as_ptr()) }
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Schema violations or a document libxml2 could not parse
    Invalid {
        error_count: i32,
        errors: Vec<String>,
    },
    /// Negative libxml2 return code
    InternalError { code: i32 },
}

impl ValidationResult {
    pub fn from_code(code: c_int, errors: Vec<String>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid {
                error_count: n,
                errors,
            },
            n => ValidationResult::InternalError { code: n },
        }
    }
}

/// Entry point for libxml2 schema operations.
///
/// Creating a wrapper initializes libxml2 on first use; afterwards it is
/// free to create as many as needed.
pub struct LibXml2Wrapper {
    _initialized: (),
}

impl LibXml2Wrapper {
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper { _initialized: () }
    }

    /// Parse an XML Schema held in memory.
    ///
    /// Not thread-safe in libxml2; callers must not run this concurrently.
    ///
    /// # Errors
    ///
    /// `LibXml2Error::SchemaParseFailed` if the buffer is not a usable schema,
    /// `LibXml2Error::MemoryAllocation` if libxml2 cannot create a parser context.
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        if schema_data.is_empty() {
            return Err(LibXml2Error::SchemaParseFailed);
        }

        unsafe {
            let parser_ctxt = xmlSchemaNewMemParserCtxt(
                schema_data.as_ptr() as *const c_char,
                schema_data.len() as c_int,
            );

            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            NonNull::new(schema_ptr)
                .map(|ptr| XmlSchemaPtr { ptr })
                .ok_or(LibXml2Error::SchemaParseFailed)
        }
    }

    /// Validate the file at `file_path` against `schema`.
    ///
    /// Safe to call concurrently; each call owns its validation context.
    ///
    /// # Errors
    ///
    /// `LibXml2Error::ValidationContextCreationFailed` if no context can be
    /// created, `LibXml2Error::ValidationFailed` when libxml2 reports an
    /// internal error (negative return code), e.g. for an unreadable file.
    pub fn validate_file(
        &self,
        schema: &XmlSchemaPtr,
        file_path: &Path,
    ) -> LibXml2Result<ValidationResult> {
        let failed = |code| LibXml2Error::ValidationFailed {
            code,
            file: file_path.to_path_buf(),
        };
        let c_path = file_path
            .to_str()
            .and_then(|path| CString::new(path).ok())
            .ok_or_else(|| failed(-1))?;

        let ctxt = ValidCtxt::new(schema)?;
        let mut errors: Vec<String> = Vec::new();

        let code = unsafe {
            xmlSchemaSetValidStructuredErrors(
                ctxt.0.as_ptr(),
                Some(structured_error_callback),
                &mut errors as *mut Vec<String> as *mut libc::c_void,
            );
            xmlSchemaValidateFile(ctxt.0.as_ptr(), c_path.as_ptr(), 0)
        };
        drop(ctxt);

        match ValidationResult::from_code(code, errors) {
            ValidationResult::InternalError { code } => Err(failed(code)),
            result => Ok(result),
        }
    }
}

/// Validation context for a single call, freed on drop
struct ValidCtxt(NonNull<XmlSchemaValidCtxt>);

impl ValidCtxt {
    fn new(schema: &XmlSchemaPtr) -> LibXml2Result<Self> {
        let ptr = unsafe { xmlSchemaNewValidCtxt(schema.as_ptr()) };
        NonNull::new(ptr)
            .map(ValidCtxt)
            .ok_or(LibXml2Error::ValidationContextCreationFailed)
    }
}

impl Drop for ValidCtxt {
    fn drop(&mut self) {
        unsafe { xmlSchemaFreeValidCtxt(self.0.as_ptr()) }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const THEME_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="theme">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="key" type="xs:string"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_schema_parsing_success() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper
            .parse_schema_from_memory(THEME_XSD.as_bytes())
            .unwrap();
        assert!(!schema.as_ptr().is_null());
    }

    #[test]
    fn test_schema_parsing_invalid_schema() {
        let wrapper = LibXml2Wrapper::new();
        let result = wrapper.parse_schema_from_memory(b"<invalid>not a schema</invalid>");

        match result.unwrap_err() {
            LibXml2Error::SchemaParseFailed => (),
            other => panic!("Expected SchemaParseFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_parsing_empty_data() {
        let wrapper = LibXml2Wrapper::new();
        assert!(wrapper.parse_schema_from_memory(&[]).is_err());
    }

    #[test]
    fn test_validate_file_valid_and_invalid() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper
            .parse_schema_from_memory(THEME_XSD.as_bytes())
            .unwrap();

        let valid = write_temp("<theme><key>sulu</key></theme>");
        assert_eq!(
            wrapper.validate_file(&schema, valid.path()).unwrap(),
            ValidationResult::Valid
        );

        let invalid = write_temp("<theme><name>sulu</name></theme>");
        match wrapper.validate_file(&schema, invalid.path()).unwrap() {
            ValidationResult::Invalid { error_count, errors } => {
                assert!(error_count > 0);
                assert!(errors.iter().any(|e| e.starts_with("line 1:")));
            }
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_validation_failure() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper
            .parse_schema_from_memory(THEME_XSD.as_bytes())
            .unwrap();

        let err = wrapper
            .validate_file(&schema, Path::new("/nonexistent/theme.xml"))
            .unwrap_err();
        assert!(matches!(err, LibXml2Error::ValidationFailed { .. }));
    }

    #[test]
    fn test_validation_result_from_code() {
        assert_eq!(
            ValidationResult::from_code(0, vec![]),
            ValidationResult::Valid
        );
        assert_eq!(
            ValidationResult::from_code(5, vec![]),
            ValidationResult::Invalid {
                error_count: 5,
                errors: vec![]
            }
        );
        assert_eq!(
            ValidationResult::from_code(-1, vec![]),
            ValidationResult::InternalError { code: -1 }
        );
    }
}
