//! Assembly of enriched failure records
//!
//! Drives extraction, classification and explanation for one [`RawFailure`]
//! and packs the results into an immutable [`EnrichedFailure`]. The whole
//! pipeline is a pure function of the raw failure.

use serde::{Deserialize, Serialize};

use crate::classifier::{MessageClass, classify_full};
use crate::explanation::{Explanation, explain};
use crate::extractor::{ExtractedFields, extract};
use crate::failure::{Category, ErrorType, NativeKind, RawFailure};

const NOT_AVAILABLE: &str = "Not available";

/// Where in the document the failure points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementContext {
    pub element_name: String,
    pub parent_element: String,
    pub attribute_name: String,
}

/// What the schema wanted versus what it got
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationContext {
    pub expected_type: String,
    pub actual_value: String,
    pub constraint_violated: String,
}

/// Developer-facing details of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalInfo {
    pub error_class: String,
    pub validation_rule: ErrorType,
    pub schema_location: String,
    pub xml_location: String,
    pub element_context: ElementContext,
    pub validation_context: ValidationContext,
}

impl TechnicalInfo {
    fn new(native_kind: NativeKind, fields: &ExtractedFields) -> Self {
        let xml_location = match fields.line {
            Some(line) => format!(
                "Line {}, Column {}",
                line,
                fields
                    .column
                    .map(|column| column.to_string())
                    .unwrap_or_else(|| "N/A".to_string())
            ),
            None => NOT_AVAILABLE.to_string(),
        };

        Self {
            error_class: native_kind.class_name().to_string(),
            validation_rule: native_kind.error_type(),
            schema_location: fields
                .xpath
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            xml_location,
            element_context: ElementContext {
                element_name: fields
                    .element
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                parent_element: "See XPath for full context".to_string(),
                attribute_name: fields.tag.clone().unwrap_or_else(|| "N/A".to_string()),
            },
            validation_context: ValidationContext {
                expected_type: fields
                    .expected
                    .clone()
                    .unwrap_or_else(|| "See schema definition".to_string()),
                actual_value: fields
                    .actual_value
                    .clone()
                    .unwrap_or_else(|| "Not provided".to_string()),
                constraint_violated: "See error message for details".to_string(),
            },
        }
    }
}

/// Document-level failure record with structured fields and guidance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedFailure {
    pub message: String,
    pub native_kind: NativeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub fields: ExtractedFields,
    pub category: Category,
    pub error_type: ErrorType,
    pub message_class: MessageClass,
    #[serde(flatten)]
    pub explanation: Explanation,
    pub technical_info: TechnicalInfo,
}

/// Enrich one raw failure
pub fn enrich(failure: &RawFailure) -> EnrichedFailure {
    let mut fields = extract(&failure.message);
    if let Some(path) = &failure.path {
        fields.xpath = Some(path.clone());
    }

    let classification = classify_full(failure);
    let explanation = explain(&failure.message, classification.category);
    let technical_info = TechnicalInfo::new(failure.native_kind, &fields);

    EnrichedFailure {
        message: failure.message.clone(),
        native_kind: failure.native_kind,
        path: failure.path.clone(),
        fields,
        category: classification.category,
        error_type: classification.error_type,
        message_class: classification.message_class,
        explanation,
        technical_info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explanation::Severity;

    #[test]
    fn test_children_scenario() {
        let failure = RawFailure::new(
            "XMLSchemaChildrenValidationError: element 'Name' missing, line 12, column 4, expected: 'Name, Age'",
            NativeKind::Children,
        );
        let enriched = enrich(&failure);

        assert_eq!(enriched.category, Category::Structure);
        assert_eq!(enriched.error_type, ErrorType::ChildrenValidationError);
        assert_eq!(enriched.fields.element.as_deref(), Some("Name"));
        assert_eq!(enriched.fields.line, Some(12));
        assert_eq!(enriched.fields.column, Some(4));
        assert_eq!(enriched.fields.expected.as_deref(), Some("'Name, Age'"));
        assert_eq!(enriched.explanation.severity, Severity::High);
        assert_eq!(enriched.technical_info.xml_location, "Line 12, Column 4");
        assert_eq!(enriched.technical_info.schema_location, "Not available");
        assert_eq!(
            enriched.technical_info.element_context.element_name,
            "Name"
        );
    }

    #[test]
    fn test_structured_path_wins_over_text() {
        let failure = RawFailure::new("bad content, path: /from/text", NativeKind::Value)
            .with_path("/from/engine");
        let enriched = enrich(&failure);

        assert_eq!(enriched.fields.xpath.as_deref(), Some("/from/engine"));
        assert_eq!(enriched.technical_info.schema_location, "/from/engine");

        let failure = RawFailure::new("bad content, path: /from/text", NativeKind::Value);
        assert_eq!(enrich(&failure).fields.xpath.as_deref(), Some("/from/text"));
    }

    #[test]
    fn test_degrades_to_general_template() {
        let failure = RawFailure::new("nothing useful here", NativeKind::Generic);
        let enriched = enrich(&failure);

        assert_eq!(enriched.category, Category::General);
        assert_eq!(enriched.error_type, ErrorType::ValidationError);
        assert_eq!(enriched.message_class, MessageClass::UnknownError);
        assert_eq!(enriched.explanation.title, "Validation Error");
        assert_eq!(enriched.message, "nothing useful here");
        assert_eq!(enriched.technical_info.xml_location, "Not available");
        assert_eq!(
            enriched.technical_info.validation_context.actual_value,
            "Not provided"
        );
        assert_eq!(enriched.technical_info.element_context.attribute_name, "N/A");
    }

    #[test]
    fn test_line_without_column() {
        let failure = RawFailure::new("Premature end of data on line 3", NativeKind::Parse);
        let enriched = enrich(&failure);
        assert_eq!(enriched.technical_info.xml_location, "Line 3, Column N/A");
        assert_eq!(enriched.technical_info.error_class, "ParseError");
    }

    #[test]
    fn test_serialized_shape_is_flat() {
        let failure = RawFailure::new("element 'a' missing, line 2", NativeKind::Children);
        let value = serde_json::to_value(enrich(&failure)).unwrap();

        assert_eq!(value["element"], "a");
        assert_eq!(value["line"], 2);
        assert_eq!(value["category"], "structure");
        assert_eq!(value["error_type"], "children_validation_error");
        assert_eq!(value["severity"], "high");
        assert_eq!(
            value["technical_info"]["validation_rule"],
            "children_validation_error"
        );
        assert!(value.get("column").is_none());
        assert!(value.get("path").is_none());
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let failure = RawFailure::new("invalid value: must be boolean", NativeKind::Generic);
        assert_eq!(enrich(&failure), enrich(&failure));
    }
}
