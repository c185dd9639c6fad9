//! Rule engine.
//!
//! A rule is a named, pure predicate over a document, its metadata and the
//! repository context. Rules report outcomes as values; a failed check is a
//! `RuleResult` with `passed = false`, never an `Err`. Severity and the kinds
//! a rule applies to are registration settings, so one rule implementation can
//! be blocking in one rule set and advisory in another.

use crate::core::document::{Document, DocumentKind};
use crate::core::error::SkillmetaError;
use crate::core::metadata::Metadata;
use crate::core::repo::RepoContext;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleResult {
    pub rule_id: String,
    pub passed: bool,
    pub message: String,
    pub severity: Severity,
    /// Every violated sub-condition, in check order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl RuleResult {
    pub fn is_blocking_failure(&self) -> bool {
        !self.passed && self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        !self.passed && self.severity == Severity::Warning
    }
}

/// What a rule returns; the engine attaches id and severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass(String),
    /// The rule has nothing to check (e.g. no frontmatter, field absent).
    Skip(String),
    Fail(Vec<String>),
}

impl Outcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Outcome::Pass(message.into())
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Outcome::Skip(reason.into())
    }

    /// Passes when `violations` is empty, otherwise fails with all of them.
    pub fn from_violations(violations: Vec<String>, pass_message: impl Into<String>) -> Self {
        if violations.is_empty() {
            Outcome::Pass(pass_message.into())
        } else {
            Outcome::Fail(violations)
        }
    }
}

pub struct CheckContext<'a> {
    pub document: &'a Document,
    pub metadata: Option<&'a Metadata>,
    pub repo: &'a RepoContext,
    pub kind: &'a DocumentKind,
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn default_severity(&self) -> Severity {
        Severity::Error
    }
    fn check(&self, ctx: &CheckContext<'_>) -> Outcome;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSettings {
    pub severity: Severity,
    /// `None` applies the rule to every kind.
    pub applies_to: Option<Vec<DocumentKind>>,
}

impl RuleSettings {
    pub fn applies(&self, kind: &DocumentKind) -> bool {
        self.applies_to
            .as_ref()
            .is_none_or(|kinds| kinds.contains(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleDescriptor {
    pub id: String,
    pub description: String,
    pub severity: Severity,
    pub applies_to: Vec<String>,
}

struct Registered {
    rule: Box<dyn Rule>,
    settings: RuleSettings,
}

#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Registered>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        rule: Box<dyn Rule>,
        settings: RuleSettings,
    ) -> Result<(), SkillmetaError> {
        if self.rules.iter().any(|r| r.rule.id() == rule.id()) {
            return Err(SkillmetaError::DuplicateRule(rule.id().to_string()));
        }
        self.rules.push(Registered { rule, settings });
        Ok(())
    }

    /// Registers with the rule's default severity for every kind.
    pub fn register_default(&mut self, rule: Box<dyn Rule>) -> Result<(), SkillmetaError> {
        let settings = RuleSettings {
            severity: rule.default_severity(),
            applies_to: None,
        };
        self.register(rule, settings)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rules.iter().any(|r| r.rule.id() == id)
    }

    pub fn settings(&self, id: &str) -> Option<&RuleSettings> {
        self.rules
            .iter()
            .find(|r| r.rule.id() == id)
            .map(|r| &r.settings)
    }

    /// Rules applicable to `kind`, in registration order. `None` lists all.
    pub fn descriptors(&self, kind: Option<&DocumentKind>) -> Vec<RuleDescriptor> {
        self.rules
            .iter()
            .filter(|r| kind.is_none_or(|k| r.settings.applies(k)))
            .map(|r| RuleDescriptor {
                id: r.rule.id().to_string(),
                description: r.rule.description().to_string(),
                severity: r.settings.severity,
                applies_to: r
                    .settings
                    .applies_to
                    .as_ref()
                    .map(|kinds| kinds.iter().map(|k| k.to_string()).collect())
                    .unwrap_or_else(|| vec!["*".to_string()]),
            })
            .collect()
    }

    /// Runs every rule applicable to `kind`. Each rule runs regardless of the
    /// outcome of the others.
    pub fn run_all(
        &self,
        document: &Document,
        metadata: Option<&Metadata>,
        repo: &RepoContext,
        kind: &DocumentKind,
    ) -> Vec<RuleResult> {
        let ctx = CheckContext {
            document,
            metadata,
            repo,
            kind,
        };
        self.rules
            .iter()
            .filter(|r| r.settings.applies(kind))
            .map(|r| {
                let (passed, message, details) = match r.rule.check(&ctx) {
                    Outcome::Pass(message) => (true, message, Vec::new()),
                    Outcome::Skip(reason) => (true, format!("skipped: {}", reason), Vec::new()),
                    Outcome::Fail(violations) => (false, violations.join("; "), violations),
                };
                RuleResult {
                    rule_id: r.rule.id().to_string(),
                    passed,
                    message,
                    severity: r.settings.severity,
                    details,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Always(&'static str, bool);

    impl Rule for Always {
        fn id(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "test rule"
        }
        fn check(&self, _ctx: &CheckContext<'_>) -> Outcome {
            if self.1 {
                Outcome::pass("ok")
            } else {
                Outcome::Fail(vec!["first".to_string(), "second".to_string()])
            }
        }
    }

    fn doc(kind: &str) -> Document {
        Document {
            path: PathBuf::from("x.md"),
            kind: DocumentKind::new(kind),
            raw_content: String::new(),
            metadata_raw: None,
            body: String::new(),
        }
    }

    #[test]
    fn duplicate_rule_ids_are_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register_default(Box::new(Always("a", true))).unwrap();
        let err = registry
            .register_default(Box::new(Always("a", false)))
            .unwrap_err();
        assert!(matches!(err, SkillmetaError::DuplicateRule(id) if id == "a"));
    }

    #[test]
    fn failing_rule_does_not_stop_the_others() {
        let mut registry = RuleRegistry::new();
        registry.register_default(Box::new(Always("fails", false))).unwrap();
        registry.register_default(Box::new(Always("passes", true))).unwrap();
        let d = doc("skill");
        let results = registry.run_all(&d, None, &RepoContext::default(), &d.kind);
        assert_eq!(results.len(), 2);
        assert!(!results[0].passed);
        assert_eq!(results[0].message, "first; second");
        assert_eq!(results[0].details.len(), 2);
        assert!(results[1].passed);
    }

    #[test]
    fn severity_and_scope_come_from_settings() {
        let mut registry = RuleRegistry::new();
        registry
            .register(
                Box::new(Always("advisory", false)),
                RuleSettings {
                    severity: Severity::Warning,
                    applies_to: Some(vec![DocumentKind::new("agent")]),
                },
            )
            .unwrap();
        let agent = doc("agent");
        let skill = doc("skill");
        let repo = RepoContext::default();
        let results = registry.run_all(&agent, None, &repo, &agent.kind);
        assert_eq!(results[0].severity, Severity::Warning);
        assert!(results[0].is_warning());
        assert!(!results[0].is_blocking_failure());
        assert!(registry.run_all(&skill, None, &repo, &skill.kind).is_empty());
        assert_eq!(registry.descriptors(Some(&skill.kind)).len(), 0);
        assert_eq!(registry.descriptors(None)[0].applies_to, vec!["agent"]);
    }

    #[test]
    fn running_twice_is_deterministic() {
        let mut registry = RuleRegistry::new();
        registry.register_default(Box::new(Always("a", false))).unwrap();
        let d = doc("skill");
        let repo = RepoContext::default();
        assert_eq!(
            registry.run_all(&d, None, &repo, &d.kind),
            registry.run_all(&d, None, &repo, &d.kind)
        );
    }
}
