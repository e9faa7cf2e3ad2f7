//! Human-readable explanations for classified failures
//!
//! Each [`Category`] owns one static template. Message-specific suggestions
//! are appended after the template's own, the list is capped, and the final
//! block goes through a fixed substitution pass that strips known
//! non-English fragments.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::failure::Category;

/// Upper bound on the suggestions attached to one failure
pub const MAX_SUGGESTIONS: usize = 6;

/// How urgently a failure needs attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        };
        f.write_str(label)
    }
}

/// Explanation block attached to every enriched failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub severity: Severity,
    pub icon: String,
    pub title: String,
    pub explanation: String,
    pub user_friendly_explanation: String,
    pub suggestions: Vec<String>,
    pub quick_fix: String,
}

struct Template {
    severity: Severity,
    icon: &'static str,
    title: &'static str,
    explanation: &'static str,
    user_friendly_explanation: &'static str,
    suggestions: &'static [&'static str],
    quick_fix: &'static str,
}

const STRUCTURE: Template = Template {
    severity: Severity::High,
    icon: "🏗️",
    title: "XML Structure Problem",
    explanation: "**What went wrong**: An XML element is missing or in the wrong place",
    user_friendly_explanation: "The XML file has a structural issue. This usually means a required element is missing, or elements are in the wrong order according to the schema rules.",
    suggestions: &[
        "✅ Make sure all required elements are present",
        "🔍 Check that elements are in the correct order",
        "🔒 Ensure all tags are properly closed",
        "📋 Review the schema to understand the correct structure",
    ],
    quick_fix: "Add the missing element or move it to the correct position",
};

const DATA_TYPE: Template = Template {
    severity: Severity::Medium,
    icon: "🔢",
    title: "Data Type Mismatch",
    explanation: "**What went wrong**: The value doesn't match the expected data type",
    user_friendly_explanation: "The value you provided doesn't match what the schema expects. For example, you might have provided text when a number was required, or a date in the wrong format.",
    suggestions: &[
        "📊 Check what data type is expected (text, number, date, etc.)",
        "🎯 Make sure the value format is correct",
        "📏 Review any restrictions on the values",
        "🔍 Use appropriate converters if needed",
    ],
    quick_fix: "Change the value to match the expected data type",
};

const ATTRIBUTE: Template = Template {
    severity: Severity::High,
    icon: "🏷️",
    title: "Attribute Problem",
    explanation: "**What went wrong**: A required attribute is missing or has an invalid value",
    user_friendly_explanation: "XML attributes are like properties of elements. This error means either a required attribute is missing, or an attribute has an invalid value.",
    suggestions: &[
        "➕ Add all required attributes",
        "✏️ Check that attribute names are correct",
        "💯 Ensure attribute values are valid",
        "📝 Review the schema for required attributes",
    ],
    quick_fix: "Add the missing attribute or fix its value",
};

const VALUE: Template = Template {
    severity: Severity::Medium,
    icon: "📊",
    title: "Value Out of Range",
    explanation: "**What went wrong**: The value is outside the allowed range or doesn't meet constraints",
    user_friendly_explanation: "The value you provided doesn't meet the rules defined in the schema. This could be a number that's too big or too small, or text that's too long or too short.",
    suggestions: &[
        "📈 Check the minimum and maximum allowed values",
        "🎯 Ensure the value format is correct",
        "📋 Review any constraints on the values",
        "🔢 Use values within the specified range",
    ],
    quick_fix: "Change the value to be within the allowed range",
};

const SYNTAX: Template = Template {
    severity: Severity::Critical,
    icon: "🔧",
    title: "XML Syntax Error",
    explanation: "**What went wrong**: The XML file is not properly formatted",
    user_friendly_explanation: "This is a fundamental XML formatting issue. The file doesn't follow basic XML rules, which prevents it from being processed correctly.",
    suggestions: &[
        "🔒 Make sure all tags are properly closed",
        "🔤 Check character encoding is correct",
        "🚫 Remove any invalid characters",
        "📐 Review basic XML formatting rules",
    ],
    quick_fix: "Fix the XML formatting to make it valid",
};

const GENERAL: Template = Template {
    severity: Severity::Medium,
    icon: "❓",
    title: "Validation Error",
    explanation: "**What went wrong**: The XML doesn't match the schema requirements",
    user_friendly_explanation: "The XML file doesn't conform to the rules defined in the schema. This could be due to various issues that need to be addressed.",
    suggestions: &[
        "🔍 Review the file for obvious issues",
        "📋 Check the schema requirements",
        "✅ Ensure all rules are followed",
        "🆘 Consult documentation for help",
    ],
    quick_fix: "Review the file and schema requirements",
};

fn template(category: Category) -> &'static Template {
    match category {
        Category::Structure => &STRUCTURE,
        Category::DataType => &DATA_TYPE,
        Category::Attribute => &ATTRIBUTE,
        Category::Value => &VALUE,
        Category::Syntax => &SYNTAX,
        Category::General => &GENERAL,
    }
}

/// Keyword trigger for a message-specific suggestion
enum Trigger {
    Any(&'static [&'static str]),
    All(&'static [&'static str]),
}

impl Trigger {
    fn matches(&self, lowered: &str) -> bool {
        match self {
            Trigger::Any(words) => words.iter().any(|word| lowered.contains(word)),
            Trigger::All(words) => words.iter().all(|word| lowered.contains(word)),
        }
    }
}

/// Checked in order; every match is appended.
const SPECIFIC_SUGGESTIONS: &[(Trigger, &str)] = &[
    (
        Trigger::Any(&["negative", "min"]),
        "🔢 Make sure the value is greater than or equal to the minimum required",
    ),
    (
        Trigger::Any(&["max", "exceed"]),
        "📊 Ensure the value is less than or equal to the maximum allowed",
    ),
    (
        Trigger::Any(&["required", "missing"]),
        "➕ Make sure all required elements and attributes are present",
    ),
    (
        Trigger::All(&["invalid", "unit"]),
        "📏 Check that the unit of measurement is valid",
    ),
    (
        Trigger::Any(&["boolean"]),
        "✅ Use only true or false for boolean values",
    ),
    (
        Trigger::Any(&["enumeration", "choice"]),
        "🎯 Choose a value from the allowed list only",
    ),
    (
        Trigger::Any(&["format", "pattern"]),
        "📝 Make sure the data format is correct",
    ),
    (
        Trigger::Any(&["length"]),
        "📐 Check the length of text or value",
    ),
];

/// Phrases replaced by the purity pass, applied in order
const PURITY_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("خطأ", "Error"),
    ("مشكلة", "Problem"),
    ("الحل", "Solution"),
    ("تأكد", "Make sure"),
    ("تحقق", "Check"),
    ("راجع", "Review"),
    ("استخدم", "Use"),
    ("اختر", "Choose"),
    ("أضف", "Add"),
    ("صحح", "Fix"),
    ("غيّر", "Change"),
];

/// Replace every known non-English phrase in `text`
///
/// Best effort only: text outside the substitution table is left as is.
pub fn purify(text: &str) -> String {
    PURITY_SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Suggestions triggered by keywords in the message, in trigger order
pub fn specific_suggestions(message: &str) -> Vec<&'static str> {
    let lowered = message.to_lowercase();
    SPECIFIC_SUGGESTIONS
        .iter()
        .filter(|(trigger, _)| trigger.matches(&lowered))
        .map(|(_, suggestion)| *suggestion)
        .collect()
}

impl Explanation {
    /// Run the purity substitution over every text field
    fn purified(self) -> Self {
        Self {
            severity: self.severity,
            icon: purify(&self.icon),
            title: purify(&self.title),
            explanation: purify(&self.explanation),
            user_friendly_explanation: purify(&self.user_friendly_explanation),
            suggestions: self.suggestions.iter().map(|s| purify(s)).collect(),
            quick_fix: purify(&self.quick_fix),
        }
    }
}

/// Build the explanation block for a failure message in a category
pub fn explain(message: &str, category: Category) -> Explanation {
    let template = template(category);

    let suggestions = template
        .suggestions
        .iter()
        .copied()
        .chain(specific_suggestions(message))
        .take(MAX_SUGGESTIONS)
        .map(str::to_string)
        .collect();

    Explanation {
        severity: template.severity,
        icon: template.icon.to_string(),
        title: template.title.to_string(),
        explanation: template.explanation.to_string(),
        user_friendly_explanation: template.user_friendly_explanation.to_string(),
        suggestions,
        quick_fix: template.quick_fix.to_string(),
    }
    .purified()
}
