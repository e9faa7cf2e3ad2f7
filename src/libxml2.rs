//! LibXML2 FFI schema engine
//!
//! Direct FFI bindings to libxml2 for XML Schema (XSD) validation. No pure
//! Rust crate validates XSD, so the system library is the engine and this
//! module is the only place that touches raw pointers.
//!
//! ## Thread Safety
//!
//! - Initialization runs exactly once through [`Once`]
//! - Schema parsing is NOT thread-safe in libxml2 and is serialized behind a
//!   process-wide lock
//! - Validation is thread-safe for distinct documents; every call creates its
//!   own validation context and only reads the shared schema
//!
//! ## Diagnostics
//!
//! libxml2 reports errors through structured callbacks. Each error is copied
//! into a [`CapturedError`] while the offending node is still alive, so the
//! node path can be resolved before the document is freed. The (domain, code)
//! pair of the first error decides the [`NativeKind`] of the failure.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use libc::{c_char, c_int, c_void};
use tracing::{debug, trace};

use crate::engine::{CompiledSchema, SchemaEngine};
use crate::error::{LibXml2Error, LibXml2Result, SchemaError};
use crate::failure::{NativeKind, RawFailure};

static LIBXML2_INIT: Once = Once::new();

/// Serializes schema parsing
static SCHEMA_PARSE_LOCK: Mutex<()> = Mutex::new(());

// Parser options for documents: no network access, no stderr output
const XML_PARSE_NOERROR: c_int = 1 << 5;
const XML_PARSE_NOWARNING: c_int = 1 << 6;
const XML_PARSE_NONET: c_int = 1 << 11;
const DOCUMENT_PARSE_OPTIONS: c_int = XML_PARSE_NOERROR | XML_PARSE_NOWARNING | XML_PARSE_NONET;

// Warnings are skipped
const XML_ERR_ERROR: c_int = 2;

// Error domains (xmlErrorDomain)
const XML_FROM_PARSER: c_int = 1;
const XML_FROM_SCHEMASV: c_int = 17;

// Schema validity error codes (xmlParserErrors), grouped by what they reject
const SCHEMAV_CHILDREN_CODES: &[(c_int, c_int)] = &[
    (1802, 1805), // undeclared, not top level, missing, wrong element
    (1810, 1810), // element content
    (1813, 1813), // extra content
    (1815, 1815), // invalid element
    (1841, 1845), // cvc-complex-type.2.x, cvc-elt.1
    (1869, 1872), // element content, document element missing
];
const SCHEMAV_TYPE_CODES: &[(c_int, c_int)] = &[
    (1824, 1826), // cvc-datatype-valid
];
const SCHEMAV_ATTRIBUTE_CODES: &[(c_int, c_int)] = &[
    (1814, 1814), // invalid attribute
    (1820, 1821), // unknown / invalid attribute
    (1859, 1868), // cvc-attribute, cvc-complex-type.3-5
];
const SCHEMAV_VALUE_CODES: &[(c_int, c_int)] = &[
    (1822, 1823), // value, facet
    (1827, 1840), // cvc-type.3.1, all facet checks
];

fn code_in(code: c_int, ranges: &[(c_int, c_int)]) -> bool {
    ranges.iter().any(|(low, high)| (*low..=*high).contains(&code))
}

/// Map a libxml2 (domain, code) pair onto a failure kind
pub fn native_kind(domain: c_int, code: c_int) -> NativeKind {
    match domain {
        XML_FROM_PARSER => NativeKind::Parse,
        XML_FROM_SCHEMASV if code_in(code, SCHEMAV_CHILDREN_CODES) => NativeKind::Children,
        XML_FROM_SCHEMASV if code_in(code, SCHEMAV_TYPE_CODES) => NativeKind::Type,
        XML_FROM_SCHEMASV if code_in(code, SCHEMAV_ATTRIBUTE_CODES) => NativeKind::Attribute,
        XML_FROM_SCHEMASV if code_in(code, SCHEMAV_VALUE_CODES) => NativeKind::Value,
        _ => NativeKind::Generic,
    }
}

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

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlNode {
    _private: [u8; 0],
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
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const xmlError)>;

#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    // Schema parsing
    pub fn xmlSchemaNewParserCtxt(url: *const c_char) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;

    // Documents
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);
    pub fn xmlGetNodePath(node: *const XmlNode) -> *mut c_char;

    // Errors
    pub fn xmlGetLastError() -> *const xmlError;
    pub fn xmlResetLastError();
}

fn init() {
    LIBXML2_INIT.call_once(|| unsafe {
        xmlInitParser();
        xmlInitGlobals();
    });
}

/// One libxml2 diagnostic, copied out of the library's buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    pub domain: i32,
    pub code: i32,
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub path: Option<String>,
}

impl CapturedError {
    /// Copy a libxml2 error
    ///
    /// # Safety
    ///
    /// `error` must be null or point to a live xmlError. With `resolve_path`,
    /// its `node`, when set, must still be owned by a live document.
    unsafe fn from_raw(error: *const xmlError, resolve_path: bool) -> Option<Self> {
        if error.is_null() {
            return None;
        }
        let error = unsafe { &*error };

        let message = if error.message.is_null() {
            String::new()
        } else {
            unsafe { CStr::from_ptr(error.message) }
                .to_string_lossy()
                .trim()
                .to_string()
        };

        let path = if !resolve_path || error.node.is_null() {
            None
        } else {
            unsafe { node_path(error.node as *const XmlNode) }
        };

        Some(CapturedError {
            domain: error.domain,
            code: error.code,
            message,
            line: u32::try_from(error.line).ok().filter(|line| *line > 0),
            column: u32::try_from(error.int2).ok().filter(|column| *column > 0),
            path,
        })
    }

    /// Message with the location appended when libxml2 knows it
    pub fn located_message(&self) -> String {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                format!("{} (line {}, column {})", self.message, line, column)
            }
            (Some(line), None) => format!("{} (line {})", self.message, line),
            _ => self.message.clone(),
        }
    }

    pub fn into_failure(self) -> RawFailure {
        let failure = RawFailure::new(
            self.located_message(),
            native_kind(self.domain, self.code),
        );
        match self.path {
            Some(path) => failure.with_path(path),
            None => failure,
        }
    }
}

unsafe fn node_path(node: *const XmlNode) -> Option<String> {
    let raw = unsafe { xmlGetNodePath(node) };
    if raw.is_null() {
        return None;
    }
    let path = unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned();
    // Allocated with libxml2's default allocator (malloc)
    unsafe { libc::free(raw as *mut c_void) };
    Some(path)
}

/// Callback for libxml2 to report errors (structured)
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *const xmlError) {
    if error.is_null() || unsafe { (*error).level } < XML_ERR_ERROR {
        return;
    }
    let errors = unsafe { &mut *(user_data as *mut Vec<CapturedError>) };
    if let Some(captured) = unsafe { CapturedError::from_raw(error, true) } {
        errors.push(captured);
    }
}

/// Thread-safe wrapper for a libxml2 schema pointer
#[derive(Debug, Clone)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: libxml2 schema structures are read-only after parsing
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and must not be freed elsewhere.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> LibXml2Result<Self> {
        if ptr.is_null() {
            return Err(LibXml2Error::SchemaParseFailed);
        }

        Ok(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = std::ptr::null_mut();
        }
    }
}

/// Owned parsed document, freed on drop
struct XmlDocPtr(*mut XmlDoc);

impl Drop for XmlDocPtr {
    fn drop(&mut self) {
        unsafe { xmlFreeDoc(self.0) }
    }
}

/// Owned validation context, freed on drop
struct ValidCtxtPtr(*mut XmlSchemaValidCtxt);

impl Drop for ValidCtxtPtr {
    fn drop(&mut self) {
        unsafe { xmlSchemaFreeValidCtxt(self.0) }
    }
}

/// Schema engine backed by libxml2
#[derive(Debug, Default, Clone, Copy)]
pub struct LibXml2Engine;

impl LibXml2Engine {
    pub fn new() -> Self {
        init();
        LibXml2Engine
    }

    /// Parse the schema at `path`, returning the compiled schema or the
    /// diagnostics libxml2 reported while rejecting it
    pub fn parse_schema(
        &self,
        path: &Path,
    ) -> LibXml2Result<Result<XmlSchemaPtr, Vec<CapturedError>>> {
        init();

        let path_str = path.to_str().ok_or_else(|| LibXml2Error::InvalidPath {
            path: path.to_path_buf(),
        })?;
        let c_path = CString::new(path_str).map_err(|_| LibXml2Error::InvalidPath {
            path: path.to_path_buf(),
        })?;

        let _guard = SCHEMA_PARSE_LOCK
            .lock()
            .map_err(|_| LibXml2Error::InternalError {
                details: "schema parse lock poisoned".to_string(),
            })?;

        let mut errors: Vec<CapturedError> = Vec::new();
        unsafe {
            let parser_ctxt = xmlSchemaNewParserCtxt(c_path.as_ptr());
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::ParserContextCreationFailed {
                    path: path.to_path_buf(),
                });
            }

            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                &mut errors as *mut Vec<CapturedError> as *mut c_void,
            );

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            if schema_ptr.is_null() {
                debug!(schema = %path.display(), errors = errors.len(), "Schema rejected by libxml2");
                return Ok(Err(errors));
            }

            Ok(Ok(XmlSchemaPtr::from_raw(schema_ptr)?))
        }
    }

    /// Validate document bytes, returning every diagnostic libxml2 raised
    ///
    /// An empty list means the document is valid.
    pub fn validate_document(
        &self,
        schema: &XmlSchemaPtr,
        document: &[u8],
    ) -> LibXml2Result<Vec<CapturedError>> {
        let size = c_int::try_from(document.len()).map_err(|_| LibXml2Error::DocumentTooLarge {
            size: document.len(),
        })?;

        unsafe {
            xmlResetLastError();
            let doc = xmlReadMemory(
                document.as_ptr() as *const c_char,
                size,
                std::ptr::null(),
                std::ptr::null(),
                DOCUMENT_PARSE_OPTIONS,
            );

            if doc.is_null() {
                // Any failure to build the tree is a well-formedness problem
                let error = CapturedError::from_raw(xmlGetLastError(), false)
                    .map(|error| CapturedError {
                        domain: XML_FROM_PARSER,
                        ..error
                    })
                    .unwrap_or_else(|| CapturedError {
                        domain: XML_FROM_PARSER,
                        code: 0,
                        message: "Document is not well-formed XML".to_string(),
                        line: None,
                        column: None,
                        path: None,
                    });
                xmlResetLastError();
                return Ok(vec![error]);
            }
            let doc = XmlDocPtr(doc);

            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }
            let valid_ctxt = ValidCtxtPtr(valid_ctxt);

            let mut errors: Vec<CapturedError> = Vec::new();
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt.0,
                Some(structured_error_callback),
                &mut errors as *mut Vec<CapturedError> as *mut c_void,
            );

            let result_code = xmlSchemaValidateDoc(valid_ctxt.0, doc.0);
            trace!(result_code, errors = errors.len(), "libxml2 validation finished");

            // Context before document: error nodes belong to the document
            drop(valid_ctxt);
            drop(doc);

            match result_code {
                0 => Ok(Vec::new()),
                n if n > 0 && !errors.is_empty() => Ok(errors),
                n if n > 0 => Ok(vec![CapturedError {
                    domain: XML_FROM_SCHEMASV,
                    code: n,
                    message: "Document does not conform to the schema".to_string(),
                    line: None,
                    column: None,
                    path: None,
                }]),
                n => Err(LibXml2Error::InternalError {
                    details: format!("xmlSchemaValidateDoc returned {}", n),
                }),
            }
        }
    }
}

impl SchemaEngine for LibXml2Engine {
    fn load_schema(&self, schema_path: &Path) -> Result<Box<dyn CompiledSchema>, SchemaError> {
        let schema_name = schema_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| schema_path.display().to_string());

        match self.parse_schema(schema_path)? {
            Ok(schema) => Ok(Box::new(LibXml2Schema {
                engine: *self,
                schema,
            })),
            Err(errors) => {
                let details = if errors.is_empty() {
                    "libxml2 could not compile the schema".to_string()
                } else {
                    errors
                        .iter()
                        .map(CapturedError::located_message)
                        .collect::<Vec<_>>()
                        .join("; ")
                };
                Err(SchemaError::Parse {
                    schema: schema_name,
                    details,
                })
            }
        }
    }
}

/// Compiled libxml2 schema
#[derive(Debug, Clone)]
pub struct LibXml2Schema {
    engine: LibXml2Engine,
    schema: XmlSchemaPtr,
}

impl CompiledSchema for LibXml2Schema {
    fn validate(&self, document: &[u8]) -> Result<(), RawFailure> {
        match self.engine.validate_document(&self.schema, document) {
            Ok(errors) => match errors.into_iter().next() {
                None => Ok(()),
                Some(first) => Err(first.into_failure()),
            },
            Err(err) => Err(RawFailure::new(err.to_string(), NativeKind::Generic)),
        }
    }
}
