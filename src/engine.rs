//! Schema engine seam
//!
//! The batch validator only needs two capabilities from a schema engine:
//! compile a schema file once, then check document bytes against it. Both are
//! traits so the libxml2 adapter can be replaced (or mocked in tests).

use std::path::Path;

use crate::error::SchemaError;
use crate::failure::RawFailure;

/// Compiles schemas from files on disk
pub trait SchemaEngine: Send + Sync {
    /// Load and compile the schema at `schema_path`
    ///
    /// The path points at a staged copy of the upload; the engine must not
    /// keep it open after returning.
    fn load_schema(&self, schema_path: &Path) -> Result<Box<dyn CompiledSchema>, SchemaError>;
}

/// A compiled schema, reusable for any number of documents
pub trait CompiledSchema: Send + Sync {
    /// Check one document, reporting the first failure when it does not conform
    fn validate(&self, document: &[u8]) -> Result<(), RawFailure>;
}
