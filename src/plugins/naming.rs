//! Name rules: identifier format and reserved names.

use crate::core::document::DocumentKind;
use crate::core::rules::{CheckContext, Outcome, Rule};
use rustc_hash::{FxHashMap, FxHashSet};

/// Names are lowercase kebab-case segments, optionally joined by a
/// kind-specific separator (`analyze.code-quality`), within a length ceiling.
pub struct NameFormat {
    max_len: usize,
    separators: FxHashMap<DocumentKind, String>,
}

impl NameFormat {
    pub fn new(max_len: usize, separators: FxHashMap<DocumentKind, String>) -> Self {
        NameFormat {
            max_len,
            separators,
        }
    }
}

impl Rule for NameFormat {
    fn id(&self) -> &'static str {
        "name.format"
    }

    fn description(&self) -> &'static str {
        "Name is lowercase kebab-case, uses the kind's separator and fits the length ceiling"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let Some(meta) = ctx.metadata else {
            return Outcome::skip("no frontmatter");
        };
        let Some(name) = meta.text("name") else {
            return Outcome::skip("no name field");
        };
        let separator = self.separators.get(ctx.kind).map(String::as_str);
        Outcome::from_violations(
            name_violations(&name, separator, self.max_len),
            format!("name '{}' is well-formed", name),
        )
    }
}

/// Every violated sub-condition of the name format, in a fixed order.
pub fn name_violations(name: &str, separator: Option<&str>, max_len: usize) -> Vec<String> {
    if name.is_empty() {
        return vec!["name is empty".to_string()];
    }
    let mut violations = Vec::new();

    if name.chars().any(char::is_uppercase) {
        violations.push("name must be lowercase (found uppercase characters)".to_string());
    }

    let is_separator = |c: char| separator.is_some_and(|s| s.contains(c));
    let mut invalid: Vec<char> = name
        .chars()
        .filter(|c| !(c.is_alphanumeric() || *c == '-' || is_separator(*c)))
        .collect();
    invalid.sort_unstable();
    invalid.dedup();
    if !invalid.is_empty() {
        let listed: Vec<String> = invalid.iter().map(|c| format!("'{}'", c)).collect();
        violations.push(format!(
            "name contains invalid characters: {}",
            listed.join(", ")
        ));
    }
    if name.chars().any(|c| c.is_alphanumeric() && !c.is_ascii()) {
        violations.push("name must be ASCII".to_string());
    }

    let segments: Vec<&str> = match separator {
        Some(sep) => {
            let count = name.matches(sep).count();
            if count == 0 {
                violations.push(format!(
                    "name is missing the '{}' separator (expected verb{}object)",
                    sep, sep
                ));
            } else if count > 1 {
                violations.push(format!(
                    "name must contain exactly one '{}' separator (found {})",
                    sep, count
                ));
            }
            name.split(sep).collect()
        }
        None => vec![name],
    };
    for segment in segments {
        if segment.is_empty() {
            violations.push("name has an empty segment".to_string());
        } else if segment.starts_with('-') || segment.ends_with('-') {
            violations.push(format!(
                "segment '{}' must not start or end with '-'",
                segment
            ));
        } else if segment.contains("--") {
            violations.push(format!("segment '{}' contains consecutive hyphens", segment));
        }
    }

    let len = name.chars().count();
    if len > max_len {
        violations.push(format!("name is {} characters (max {})", len, max_len));
    }
    violations
}

/// Names reserved by the library (templates, scaffolding placeholders).
pub struct RestrictedNames {
    names: FxHashSet<String>,
}

impl RestrictedNames {
    pub fn new<I: IntoIterator<Item = String>>(names: I) -> Self {
        RestrictedNames {
            names: names.into_iter().map(|n| n.trim().to_lowercase()).collect(),
        }
    }
}

impl Rule for RestrictedNames {
    fn id(&self) -> &'static str {
        "name.restricted"
    }

    fn description(&self) -> &'static str {
        "Name is not on the restricted list"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let Some(name) = ctx.metadata.and_then(|m| m.text("name")) else {
            return Outcome::skip("no name field");
        };
        if self.names.contains(&name.to_lowercase()) {
            Outcome::Fail(vec![format!("name '{}' is reserved", name)])
        } else {
            Outcome::pass(format!("name '{}' is not reserved", name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verb_object_name_passes() {
        assert!(name_violations("analyze.code-quality", Some("."), 64).is_empty());
    }

    #[test]
    fn camel_case_name_reports_casing_and_separator() {
        let v = name_violations("CodeReview", Some("."), 64);
        assert_eq!(v.len(), 2, "{:?}", v);
        assert!(v[0].contains("lowercase"));
        assert!(v[1].contains("separator"));
    }

    #[test]
    fn plain_kebab_case_without_separator_requirement() {
        assert!(name_violations("code-reviewer", None, 64).is_empty());
        let v = name_violations("code_reviewer", None, 64);
        assert_eq!(v, vec!["name contains invalid characters: '_'"]);
    }

    #[test]
    fn reports_every_violation_at_once() {
        let long = format!("Bad_{}", "x".repeat(70));
        let v = name_violations(&long, Some("."), 64);
        assert_eq!(v.len(), 4, "{:?}", v);
        assert!(v.iter().any(|m| m.contains("lowercase")));
        assert!(v.iter().any(|m| m.contains("invalid characters")));
        assert!(v.iter().any(|m| m.contains("separator")));
        assert!(v.iter().any(|m| m.contains("max 64")));
    }

    #[test]
    fn length_boundary_is_inclusive() {
        let at = "a".repeat(64);
        let over = "a".repeat(65);
        assert!(name_violations(&at, None, 64).is_empty());
        assert_eq!(name_violations(&over, None, 64).len(), 1);
    }

    #[test]
    fn structural_segment_problems() {
        assert!(name_violations("a..b", Some("."), 64)
            .iter()
            .any(|m| m.contains("exactly one")));
        assert!(name_violations("-a.b", Some("."), 64)
            .iter()
            .any(|m| m.contains("start or end")));
        assert!(name_violations("a--b", None, 64)
            .iter()
            .any(|m| m.contains("consecutive")));
    }
}
