//! Structured field extraction from free-text failure messages
//!
//! Schema engines describe failures in prose. This module pulls out the
//! pieces a reader cares about (location, element, expected and actual
//! values) with an ordered list of patterns per field. Extraction is a
//! heuristic layer only: every field is optional and a miss is never an
//! error. Callers depend on [`extract`] alone, so the patterns can be swapped
//! for a stricter parser without touching classification or explanation.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Fields recovered from a failure message
///
/// `None` means "not found in the text", not "not applicable".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
}

impl ExtractedFields {
    /// True when nothing could be extracted
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Ordered patterns for one field, gated by cheap keyword triggers
struct FieldPatterns {
    triggers: &'static [&'static str],
    regexes: Vec<Regex>,
}

impl FieldPatterns {
    fn new(triggers: &'static [&'static str], patterns: &[&str]) -> Self {
        let regexes = patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("Failed to compile extraction pattern")
            })
            .collect();
        Self { triggers, regexes }
    }

    /// First capture of the highest-priority matching pattern
    fn first_capture<'m>(&self, message: &'m str, lowered: &str) -> Option<&'m str> {
        if !self.triggers.iter().any(|trigger| lowered.contains(trigger)) {
            return None;
        }

        self.regexes.iter().find_map(|regex| {
            regex
                .captures(message)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str())
        })
    }

    fn number(&self, message: &str, lowered: &str) -> Option<u32> {
        self.first_capture(message, lowered)
            .and_then(|digits| digits.parse().ok())
    }

    fn text(&self, message: &str, lowered: &str) -> Option<String> {
        self.first_capture(message, lowered)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

struct Patterns {
    line: FieldPatterns,
    column: FieldPatterns,
    element: FieldPatterns,
    tag: FieldPatterns,
    expected: FieldPatterns,
    actual_value: FieldPatterns,
    xpath: FieldPatterns,
}

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| Patterns {
        line: FieldPatterns::new(&["line"], &[r"line\s+(\d+)"]),
        column: FieldPatterns::new(&["column"], &[r"column\s+(\d+)"]),
        element: FieldPatterns::new(
            &["element"],
            &[
                r#"element\s+["']([^"']+)["']"#,
                r"<([^/>\s]+)",
                r#"invalid element:?\s*["']?([^"':\s]+)["']?"#,
            ],
        ),
        tag: FieldPatterns::new(
            &["tag"],
            &[
                r#"tag\s+["']([^"']+)["']"#,
                r#"invalid tag:?\s*["']?([^"':\s]+)["']?"#,
            ],
        ),
        expected: FieldPatterns::new(
            &["expected", "must be one of", "valid values are", "the set {"],
            &[
                r"expected[^:]*:\s*([^.\n]+)",
                r"expected is\s*\(\s*([^)]+?)\s*\)",
                r"must be one of:\s*([^.\n]+)",
                r"valid values are:\s*([^.\n]+)",
                r"the set \{([^}]+)\}",
            ],
        ),
        actual_value: FieldPatterns::new(
            &["value", "actual", "found"],
            &[
                r#"["']([^"']+)["'] is not a valid value"#,
                r#"value\s+["']?([^"':\s]+)["']?"#,
                r#"actual[^:]*:\s*["']?([^"':\s]+)["']?"#,
                r#"found\s+["']?([^"':\s]+)["']?"#,
            ],
        ),
        xpath: FieldPatterns::new(&["path:"], &[r"path:\s*([^\n]+)"]),
    })
}

/// Extract structured fields from a failure message
///
/// Never fails; a field whose pattern does not match is left as `None`.
pub fn extract(message: &str) -> ExtractedFields {
    let patterns = patterns();
    let lowered = message.to_lowercase();

    ExtractedFields {
        line: patterns.line.number(message, &lowered),
        column: patterns.column.number(message, &lowered),
        element: patterns.element.text(message, &lowered),
        tag: patterns.tag.text(message, &lowered),
        expected: patterns.expected.text(message, &lowered),
        actual_value: patterns.actual_value.text(message, &lowered),
        xpath: patterns.xpath.text(message, &lowered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_failure_fields() {
        let fields = extract(
            "XMLSchemaChildrenValidationError: element 'Name' missing, line 12, column 4, expected: 'Name, Age'",
        );

        assert_eq!(fields.element.as_deref(), Some("Name"));
        assert_eq!(fields.line, Some(12));
        assert_eq!(fields.column, Some(4));
        assert_eq!(fields.expected.as_deref(), Some("'Name, Age'"));
        assert_eq!(fields.tag, None);
        assert_eq!(fields.actual_value, None);
        assert_eq!(fields.xpath, None);
    }

    #[test]
    fn test_plain_message_yields_nothing() {
        let fields = extract("Something went wrong while checking the document");
        assert!(fields.is_empty());

        assert!(extract("").is_empty());
    }

    #[test]
    fn test_digits_without_line_phrasing_are_ignored() {
        let fields = extract("Quantity 42 exceeds 17");
        assert_eq!(fields.line, None);
        assert_eq!(fields.column, None);
    }

    #[test]
    fn test_non_numeric_line_is_not_found() {
        let fields = extract("error on line twelve");
        assert_eq!(fields.line, None);

        let fields = extract("line 99999999999999999999 is too far");
        assert_eq!(fields.line, None);
    }

    #[test]
    fn test_keyword_gate_is_case_insensitive() {
        let fields = extract("Parse failure at LINE 7, COLUMN 21");
        assert_eq!(fields.line, Some(7));
        assert_eq!(fields.column, Some(21));
    }

    #[test]
    fn test_element_pattern_priority() {
        // Quoted name wins over the angle-bracket shape
        let fields = extract("Element 'price' appears before <item> was closed");
        assert_eq!(fields.element.as_deref(), Some("price"));

        let fields = extract("Unknown element found: <widget attr=\"1\">");
        assert_eq!(fields.element.as_deref(), Some("widget"));

        let fields = extract("Invalid element: gadget");
        assert_eq!(fields.element.as_deref(), Some("gadget"));
    }

    #[test]
    fn test_tag_shapes() {
        let fields = extract("Unexpected tag \"footer\" at this position");
        assert_eq!(fields.tag.as_deref(), Some("footer"));

        let fields = extract("Invalid tag: banner");
        assert_eq!(fields.tag.as_deref(), Some("banner"));
    }

    #[test]
    fn test_expected_shapes() {
        let fields = extract(
            "Element 'Name': This element is not expected. Expected is ( Age ).",
        );
        assert_eq!(fields.element.as_deref(), Some("Name"));
        assert_eq!(fields.expected.as_deref(), Some("Age"));

        let fields = extract("Unit must be one of: kg, g, lb");
        assert_eq!(fields.expected.as_deref(), Some("kg, g, lb"));

        let fields = extract(
            "Element 'unit': [facet 'enumeration'] The value 'oz' is not an element of the set {'kg', 'g'}.",
        );
        assert_eq!(fields.expected.as_deref(), Some("'kg', 'g'"));
        assert_eq!(fields.actual_value.as_deref(), Some("oz"));
    }

    #[test]
    fn test_actual_value_shapes() {
        let fields = extract(
            "Element 'age': 'abc' is not a valid value of the atomic type 'xs:integer'.",
        );
        assert_eq!(fields.actual_value.as_deref(), Some("abc"));

        let fields = extract("Actual content: banana");
        assert_eq!(fields.actual_value.as_deref(), Some("banana"));

        let fields = extract("Found 'qux' where a number belongs");
        assert_eq!(fields.actual_value.as_deref(), Some("qux"));
    }

    #[test]
    fn test_xpath_is_trimmed() {
        let fields = extract("Reason: bad content\nPath:   /catalog/book[2]/price  \n");
        assert_eq!(fields.xpath.as_deref(), Some("/catalog/book[2]/price"));
    }

    #[test]
    fn test_empty_capture_after_trim_is_absent() {
        let fields = extract("expected:   ");
        assert_eq!(fields.expected, None);
    }
}
