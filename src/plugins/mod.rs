//! Built-in rules.
//!
//! Each rule is configured from the [`Policy`] at construction time; the
//! policy's `[rules.<id>]` tables then decide whether it is registered, at
//! which severity, and for which kinds.

pub mod fields;
pub mod frontmatter;
pub mod links;
pub mod naming;
pub mod references;
pub mod structure;

use crate::core::document::DocumentKind;
use crate::core::error::SkillmetaError;
use crate::core::policy::{KindPolicy, Policy};
use crate::core::rules::{Rule, RuleRegistry, RuleSettings};
use rustc_hash::FxHashMap;

/// Pseudo-rule id under which lenient parse warnings are reported.
pub const PARSE_RULE_ID: &str = "frontmatter.parse";

fn per_kind<F>(policy: &Policy, pick: F) -> FxHashMap<DocumentKind, Vec<String>>
where
    F: Fn(&KindPolicy) -> &Vec<String>,
{
    policy
        .kinds
        .iter()
        .map(|k| (DocumentKind::new(&k.name), pick(k).clone()))
        .collect()
}

/// Every built-in rule, configured from `policy`, in registration order.
pub fn builtin_rules(policy: &Policy) -> Vec<Box<dyn Rule>> {
    let separators = policy
        .kinds
        .iter()
        .filter_map(|k| {
            k.name_separator
                .as_ref()
                .map(|sep| (DocumentKind::new(&k.name), sep.clone()))
        })
        .collect();

    let mut rules: Vec<Box<dyn Rule>> = Vec::new();
    rules.push(Box::new(frontmatter::FrontmatterPresent::new(&policy.delimiter)));
    rules.push(Box::new(naming::NameFormat::new(policy.limits.name_max, separators)));
    rules.push(Box::new(naming::RestrictedNames::new(
        policy.restricted_names.iter().cloned(),
    )));
    rules.push(Box::new(fields::RequiredFields::new(per_kind(policy, |k| {
        &k.required_fields
    }))));
    rules.push(Box::new(fields::FieldTypes::new(policy.field_types.clone())));
    rules.push(Box::new(fields::EnumMembership::new(policy.effective_enums())));
    rules.push(Box::new(fields::DescriptionLength::new(
        policy.limits.description_max,
    )));
    rules.push(Box::new(structure::RequiredSections::new(per_kind(policy, |k| {
        &k.required_sections
    }))));
    rules.push(Box::new(structure::HeadingLevels));
    rules.push(Box::new(structure::LineCount::new(policy.limits.body_max_lines)));
    rules.push(Box::new(references::CrossReferences::new(
        policy.references.clone(),
    )));
    rules.push(Box::new(links::RelativeLinks));
    rules
}

/// Registry of the built-in rules with the policy's overrides applied.
pub fn builtin_registry(policy: &Policy) -> Result<RuleRegistry, SkillmetaError> {
    let rules = builtin_rules(policy);
    for id in policy.rules.keys() {
        if id != PARSE_RULE_ID && !rules.iter().any(|r| r.id() == id) {
            tracing::warn!(rule = %id, "policy configures an unknown rule");
        }
    }

    let mut registry = RuleRegistry::new();
    for rule in rules {
        let overrides = policy.rules.get(rule.id()).cloned().unwrap_or_default();
        if overrides.enabled == Some(false) {
            tracing::debug!(rule = rule.id(), "rule disabled by policy");
            continue;
        }
        let settings = RuleSettings {
            severity: overrides.severity.unwrap_or(rule.default_severity()),
            applies_to: overrides
                .applies_to
                .map(|kinds| kinds.into_iter().map(DocumentKind::new).collect()),
        };
        registry.register(rule, settings)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::policy::RuleOverride;
    use crate::core::rules::Severity;

    #[test]
    fn default_registry_has_every_builtin_rule() {
        let registry = builtin_registry(&Policy::default()).unwrap();
        assert_eq!(registry.len(), 12);
        assert!(registry.contains("name.format"));
        assert_eq!(
            registry.settings("body.line_count").unwrap().severity,
            Severity::Warning
        );
    }

    #[test]
    fn policy_overrides_disable_rescope_and_reweight() {
        let mut policy = Policy::default();
        policy.rules.insert(
            "links.relative".to_string(),
            RuleOverride {
                enabled: Some(false),
                ..RuleOverride::default()
            },
        );
        policy.rules.insert(
            "body.line_count".to_string(),
            RuleOverride {
                severity: Some(Severity::Error),
                applies_to: Some(vec!["Skill".to_string()]),
                ..RuleOverride::default()
            },
        );
        let registry = builtin_registry(&policy).unwrap();
        assert!(!registry.contains("links.relative"));
        let settings = registry.settings("body.line_count").unwrap();
        assert_eq!(settings.severity, Severity::Error);
        assert!(settings.applies(&DocumentKind::new("skill")));
        assert!(!settings.applies(&DocumentKind::new("agent")));
    }
}
