//! Failure classification
//!
//! Two taxonomies meet here. The engine's [`NativeKind`](crate::failure::NativeKind) maps through a fixed
//! table to an [`ErrorType`] and, usually, a [`Category`]. Independently, the
//! message text is scanned for keyword groups in a fixed priority order to
//! produce a [`MessageClass`]; that class supplies the category whenever the
//! native kind is [`NativeKind::Generic`](crate::failure::NativeKind::Generic).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::failure::{Category, ErrorType, RawFailure};

/// Keyword-derived classification of a failure message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    SyntaxError,
    SchemaValidationError,
    ElementError,
    AttributeError,
    TypeError,
    NamespaceError,
    RequiredFieldError,
    ValueError,
    StructureError,
    UnknownError,
}

/// Keyword groups in priority order; the first group with a hit wins.
///
/// Matching is by substring, so short keywords such as `ns` also hit inside
/// longer words. The order decides multi-keyword messages and must not be
/// rearranged.
const KEYWORD_GROUPS: &[(MessageClass, &[&str])] = &[
    (
        MessageClass::SyntaxError,
        &["syntax", "parse", "malformed", "unclosed", "unexpected"],
    ),
    (
        MessageClass::SchemaValidationError,
        &["schema", "validation", "invalid"],
    ),
    (MessageClass::ElementError, &["element", "tag", "child"]),
    (MessageClass::AttributeError, &["attribute", "attr"]),
    (MessageClass::TypeError, &["type", "datatype", "format"]),
    (MessageClass::NamespaceError, &["namespace", "ns"]),
    (
        MessageClass::RequiredFieldError,
        &["required", "missing", "mandatory"],
    ),
    (MessageClass::ValueError, &["value", "content", "data"]),
    (
        MessageClass::StructureError,
        &["structure", "order", "sequence"],
    ),
];

impl MessageClass {
    /// Classify a failure message by keyword group
    pub fn from_message(message: &str) -> Self {
        let lowered = message.to_lowercase();

        KEYWORD_GROUPS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|(class, _)| *class)
            .unwrap_or(MessageClass::UnknownError)
    }

    /// Category used when the engine did not report a specific kind
    pub fn category(self) -> Category {
        match self {
            MessageClass::SyntaxError => Category::Syntax,
            MessageClass::SchemaValidationError => Category::Value,
            MessageClass::ElementError => Category::Structure,
            MessageClass::AttributeError => Category::Attribute,
            MessageClass::TypeError => Category::DataType,
            MessageClass::NamespaceError => Category::Structure,
            MessageClass::RequiredFieldError => Category::Structure,
            MessageClass::ValueError => Category::Value,
            MessageClass::StructureError => Category::Structure,
            MessageClass::UnknownError => Category::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageClass::SyntaxError => "syntax_error",
            MessageClass::SchemaValidationError => "schema_validation_error",
            MessageClass::ElementError => "element_error",
            MessageClass::AttributeError => "attribute_error",
            MessageClass::TypeError => "type_error",
            MessageClass::NamespaceError => "namespace_error",
            MessageClass::RequiredFieldError => "required_field_error",
            MessageClass::ValueError => "value_error",
            MessageClass::StructureError => "structure_error",
            MessageClass::UnknownError => "unknown_error",
        }
    }

    /// Human-readable label for reports
    pub fn display_name(self) -> &'static str {
        match self {
            MessageClass::SyntaxError => "Syntax Error",
            MessageClass::SchemaValidationError => "Schema Validation Error",
            MessageClass::ElementError => "Element Error",
            MessageClass::AttributeError => "Attribute Error",
            MessageClass::TypeError => "Type Error",
            MessageClass::NamespaceError => "Namespace Error",
            MessageClass::RequiredFieldError => "Required Field Error",
            MessageClass::ValueError => "Value Error",
            MessageClass::StructureError => "Structure Error",
            MessageClass::UnknownError => "Unknown Error",
        }
    }
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub error_type: ErrorType,
    pub message_class: MessageClass,
}

/// Classify a failure into its category
pub fn classify(failure: &RawFailure) -> Category {
    classify_full(failure).category
}

/// Classify a failure into category, error type and message class
pub fn classify_full(failure: &RawFailure) -> Classification {
    let message_class = MessageClass::from_message(&failure.message);
    let category = failure
        .native_kind
        .category()
        .unwrap_or_else(|| message_class.category());

    Classification {
        category,
        error_type: failure.native_kind.error_type(),
        message_class,
    }
}
