//! Field presence, type, allowed-value and length rules.

use crate::core::document::DocumentKind;
use crate::core::metadata::Value;
use crate::core::policy::FieldType;
use crate::core::rules::{CheckContext, Outcome, Rule};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

pub struct RequiredFields {
    per_kind: FxHashMap<DocumentKind, Vec<String>>,
}

impl RequiredFields {
    pub fn new(per_kind: FxHashMap<DocumentKind, Vec<String>>) -> Self {
        RequiredFields { per_kind }
    }
}

impl Rule for RequiredFields {
    fn id(&self) -> &'static str {
        "fields.required"
    }

    fn description(&self) -> &'static str {
        "Fields required for the document kind are present and non-empty"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let Some(meta) = ctx.metadata else {
            return Outcome::skip("no frontmatter");
        };
        let required = self
            .per_kind
            .get(ctx.kind)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut violations = Vec::new();
        for field in required {
            match meta.field(field) {
                None => violations.push(format!("missing required field '{}'", field)),
                Some(value) if value.is_blank() => {
                    violations.push(format!("required field '{}' is empty", field))
                }
                Some(_) => {}
            }
        }
        Outcome::from_violations(
            violations,
            format!("{} required fields present", required.len()),
        )
    }
}

pub struct FieldTypes {
    types: BTreeMap<String, FieldType>,
}

impl FieldTypes {
    pub fn new(types: BTreeMap<String, FieldType>) -> Self {
        FieldTypes { types }
    }
}

/// Whether `value` satisfies `expected`. Blank values satisfy collection
/// types (`tags:` with nothing under it), and comma-separated strings are
/// accepted where a list is expected.
pub fn type_matches(value: &Value, expected: FieldType) -> bool {
    match expected {
        FieldType::String => matches!(value, Value::String(_)),
        FieldType::Integer => matches!(value, Value::Integer(_)),
        FieldType::Number => matches!(value, Value::Integer(_) | Value::Float(_)),
        FieldType::Boolean => matches!(value, Value::Bool(_)),
        FieldType::List => matches!(value, Value::List(_) | Value::String(_)),
        FieldType::Map => matches!(value, Value::Map(_)) || value.is_blank(),
        FieldType::Scalar => value.is_scalar(),
    }
}

impl Rule for FieldTypes {
    fn id(&self) -> &'static str {
        "fields.types"
    }

    fn description(&self) -> &'static str {
        "Declared fields hold values of the declared type"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let Some(meta) = ctx.metadata else {
            return Outcome::skip("no frontmatter");
        };
        let mut checked = 0;
        let mut violations = Vec::new();
        for (field, expected) in &self.types {
            let Some(value) = meta.field(field) else {
                continue;
            };
            checked += 1;
            if !type_matches(value, *expected) {
                violations.push(format!(
                    "field '{}' must be {} (found {})",
                    field,
                    expected.as_str(),
                    value.type_name()
                ));
            }
        }
        Outcome::from_violations(violations, format!("{} typed fields checked", checked))
    }
}

pub struct EnumMembership {
    allowed: BTreeMap<String, Vec<String>>,
}

impl EnumMembership {
    pub fn new(allowed: BTreeMap<String, Vec<String>>) -> Self {
        EnumMembership { allowed }
    }
}

impl Rule for EnumMembership {
    fn id(&self) -> &'static str {
        "fields.enum"
    }

    fn description(&self) -> &'static str {
        "Constrained fields (category, difficulty, ...) use an allowed value"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let Some(meta) = ctx.metadata else {
            return Outcome::skip("no frontmatter");
        };
        let mut violations = Vec::new();
        for (field, allowed) in &self.allowed {
            if allowed.is_empty() {
                continue;
            }
            let Some(value) = meta.field(field) else {
                continue;
            };
            for item in value.string_items() {
                if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&item)) {
                    violations.push(format!(
                        "{} '{}' is not one of: {}",
                        field,
                        item,
                        allowed.join(", ")
                    ));
                }
            }
        }
        Outcome::from_violations(violations, "constrained fields use allowed values")
    }
}

pub struct DescriptionLength {
    max_chars: usize,
}

impl DescriptionLength {
    pub fn new(max_chars: usize) -> Self {
        DescriptionLength { max_chars }
    }
}

impl Rule for DescriptionLength {
    fn id(&self) -> &'static str {
        "description.length"
    }

    fn description(&self) -> &'static str {
        "Description fits the character ceiling"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let Some(description) = ctx.metadata.and_then(|m| m.text("description")) else {
            return Outcome::skip("no description field");
        };
        let len = description.chars().count();
        if len > self.max_chars {
            Outcome::Fail(vec![format!(
                "description is {} characters (max {})",
                len, self.max_chars
            )])
        } else {
            Outcome::pass(format!("description is {} characters", len))
        }
    }
}
