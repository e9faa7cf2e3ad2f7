//! Failure taxonomy shared by the enrichment pipeline
//!
//! A schema engine reports a document failure as a [`RawFailure`]. Everything
//! downstream (extraction, classification, explanation, statistics) derives
//! from it without mutating it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of failure as reported by the schema engine adapter
///
/// Adapters decide the kind from their own structured diagnostics; the
/// classifier consumes it by exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeKind {
    /// Content model violation (missing, unexpected or misordered children)
    Children,
    /// Simple type / datatype violation
    Type,
    /// Attribute missing, unknown or invalid
    Attribute,
    /// Facet violation (range, length, enumeration, pattern)
    Value,
    /// Document is not well-formed
    Parse,
    /// Anything the adapter could not place
    Generic,
}

impl NativeKind {
    /// Statistics label for this kind
    pub fn error_type(self) -> ErrorType {
        match self {
            NativeKind::Children => ErrorType::ChildrenValidationError,
            NativeKind::Type => ErrorType::TypeValidationError,
            NativeKind::Attribute => ErrorType::AttributeValidationError,
            NativeKind::Value => ErrorType::ValueValidationError,
            NativeKind::Parse => ErrorType::ParseError,
            NativeKind::Generic => ErrorType::ValidationError,
        }
    }

    /// Category implied by the kind alone, `None` for [`NativeKind::Generic`]
    pub fn category(self) -> Option<Category> {
        match self {
            NativeKind::Children => Some(Category::Structure),
            NativeKind::Type => Some(Category::DataType),
            NativeKind::Attribute => Some(Category::Attribute),
            NativeKind::Value => Some(Category::Value),
            NativeKind::Parse => Some(Category::Syntax),
            NativeKind::Generic => None,
        }
    }

    /// Name of the diagnostic class, surfaced to developers
    pub fn class_name(self) -> &'static str {
        match self {
            NativeKind::Children => "ChildrenValidationError",
            NativeKind::Type => "TypeValidationError",
            NativeKind::Attribute => "AttributeValidationError",
            NativeKind::Value => "ValueValidationError",
            NativeKind::Parse => "ParseError",
            NativeKind::Generic => "ValidationError",
        }
    }
}

/// Failure reported by the schema engine for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFailure {
    pub message: String,
    pub native_kind: NativeKind,
    /// Location of the offending node when the engine exposes it
    pub path: Option<String>,
}

impl RawFailure {
    pub fn new(message: impl Into<String>, native_kind: NativeKind) -> Self {
        Self {
            message: message.into(),
            native_kind,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.native_kind.class_name(), self.message)
    }
}

/// Coarse classification that drives severity and suggestions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Structure,
    DataType,
    Attribute,
    Value,
    Syntax,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Structure => "structure",
            Category::DataType => "data_type",
            Category::Attribute => "attribute",
            Category::Value => "value",
            Category::Syntax => "syntax",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics label derived from the engine's native failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    ChildrenValidationError,
    TypeValidationError,
    AttributeValidationError,
    ValueValidationError,
    ParseError,
    ValidationError,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::ChildrenValidationError => "children_validation_error",
            ErrorType::TypeValidationError => "type_validation_error",
            ErrorType::AttributeValidationError => "attribute_validation_error",
            ErrorType::ValueValidationError => "value_validation_error",
            ErrorType::ParseError => "parse_error",
            ErrorType::ValidationError => "validation_error",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
