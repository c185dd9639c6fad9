//! Validation and export policy.
//!
//! Everything that differs between content libraries lives here instead of in
//! module constants: document kinds and their discovery patterns, allowed
//! categories, restricted names, required fields and sections, field types,
//! rule severities and rule-set membership. A policy is loaded once per
//! invocation and passed to the rule registry and batch runner at
//! construction time.
//!
//! Resolution order: `--policy <file>`, `$SKILLMETA_POLICY`,
//! `<root>/.skillmeta/policy.toml`, built-in defaults.

use crate::core::document::DocumentKind;
use crate::core::error::SkillmetaError;
use crate::core::frontmatter::DEFAULT_DELIMITER;
use crate::core::parser::ParseMode;
use crate::core::rules::Severity;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const POLICY_DIR: &str = ".skillmeta";
pub const POLICY_FILE: &str = "policy.toml";
pub const POLICY_ENV: &str = "SKILLMETA_POLICY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub delimiter: String,
    pub parse_mode: ParseMode,
    /// Directory names never descended into during discovery.
    pub exclude_dirs: Vec<String>,
    /// File names never treated as documents.
    pub exclude_files: Vec<String>,
    pub categories: Vec<String>,
    pub restricted_names: Vec<String>,
    pub limits: Limits,
    pub export: ExportPolicy,
    pub kinds: Vec<KindPolicy>,
    pub field_types: BTreeMap<String, FieldType>,
    /// Field name → allowed values. `category` is checked against `categories`.
    pub enums: BTreeMap<String, Vec<String>>,
    /// Reference field → kind the referenced names must resolve to.
    pub references: BTreeMap<String, String>,
    pub rules: BTreeMap<String, RuleOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub description_max: usize,
    pub name_max: usize,
    pub body_max_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindPolicy {
    pub name: String,
    /// Collection key and file stem used by the catalog export.
    pub collection: String,
    /// Root-relative glob patterns (`*` one segment, `**` any depth).
    pub patterns: Vec<String>,
    pub required_fields: Vec<String>,
    pub required_sections: Vec<String>,
    /// When set, names must read `verb<sep>object`.
    pub name_separator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportPolicy {
    pub schema_version: String,
    pub output_dir: PathBuf,
    pub required_fields: Vec<String>,
    /// Skip documents whose validation fails with errors.
    pub require_valid: bool,
    pub manifest_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOverride {
    pub enabled: Option<bool>,
    pub severity: Option<Severity>,
    pub applies_to: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    List,
    Map,
    /// Any of string, integer, number, boolean.
    Scalar,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::List => "list",
            FieldType::Map => "map",
            FieldType::Scalar => "scalar",
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            description_max: 150,
            name_max: 64,
            body_max_lines: 500,
        }
    }
}

impl Default for ExportPolicy {
    fn default() -> Self {
        ExportPolicy {
            schema_version: "1.0.0".to_string(),
            output_dir: PathBuf::from("catalog"),
            required_fields: strings(&["name", "description", "category"]),
            require_valid: true,
            manifest_path: PathBuf::from(POLICY_DIR).join("manifest.json"),
        }
    }
}

impl Default for KindPolicy {
    fn default() -> Self {
        KindPolicy {
            name: String::new(),
            collection: String::new(),
            patterns: Vec::new(),
            required_fields: strings(&["name", "description"]),
            required_sections: Vec::new(),
            name_separator: None,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        let kinds = vec![
            KindPolicy {
                name: "skill".to_string(),
                collection: "skills".to_string(),
                patterns: strings(&["skills/**/SKILL.md"]),
                required_fields: strings(&["name", "description", "category"]),
                required_sections: strings(&["Overview", "Usage"]),
                name_separator: Some(".".to_string()),
            },
            KindPolicy {
                name: "agent".to_string(),
                collection: "agents".to_string(),
                patterns: strings(&["agents/**/*.md"]),
                ..KindPolicy::default()
            },
            KindPolicy {
                name: "command".to_string(),
                collection: "commands".to_string(),
                patterns: strings(&["commands/**/*.md"]),
                required_sections: strings(&["Usage"]),
                ..KindPolicy::default()
            },
        ];

        let field_types = [
            ("name", FieldType::String),
            ("title", FieldType::String),
            ("description", FieldType::String),
            ("category", FieldType::String),
            ("subcategory", FieldType::String),
            ("difficulty", FieldType::String),
            ("version", FieldType::Scalar),
            ("author", FieldType::String),
            ("tags", FieldType::List),
            ("use_cases", FieldType::List),
            ("related_agents", FieldType::List),
            ("related_skills", FieldType::List),
            ("related_commands", FieldType::List),
            ("dependencies", FieldType::List),
            ("contributors", FieldType::List),
            ("featured", FieldType::Boolean),
            ("verified", FieldType::Boolean),
            ("installs", FieldType::Integer),
            ("upvotes", FieldType::Integer),
            ("reviews", FieldType::Integer),
            ("rating", FieldType::Number),
        ]
        .into_iter()
        .map(|(k, t)| (k.to_string(), t))
        .collect();

        let enums = [
            ("difficulty", &["beginner", "intermediate", "advanced"][..]),
            ("frequency", &["daily", "weekly", "monthly", "occasional"][..]),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), strings(v)))
        .collect();

        let references = [
            ("related_agents", "agent"),
            ("related_skills", "skill"),
            ("related_commands", "command"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Policy {
            delimiter: DEFAULT_DELIMITER.to_string(),
            parse_mode: ParseMode::Lenient,
            exclude_dirs: strings(&[".git", "target", "node_modules", POLICY_DIR]),
            exclude_files: strings(&["README.md", "CHANGELOG.md"]),
            categories: strings(&[
                "analysis",
                "automation",
                "data",
                "design",
                "development",
                "devops",
                "documentation",
                "productivity",
                "research",
                "security",
                "testing",
            ]),
            restricted_names: strings(&[
                "template",
                "skill-template",
                "agent-template",
                "command-template",
            ]),
            limits: Limits::default(),
            export: ExportPolicy::default(),
            kinds,
            field_types,
            enums,
            references,
            rules: BTreeMap::new(),
        }
    }
}

impl Policy {
    /// Resolves the policy for `root`. An explicit path must exist.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Policy, SkillmetaError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(env_path) = std::env::var(POLICY_ENV) {
            if !env_path.trim().is_empty() {
                return Self::from_file(Path::new(env_path.trim()));
            }
        }
        let default_path = root.join(POLICY_DIR).join(POLICY_FILE);
        if default_path.is_file() {
            return Self::from_file(&default_path);
        }
        tracing::debug!("no policy file found, using built-in defaults");
        Ok(Policy::default())
    }

    pub fn from_file(path: &Path) -> Result<Policy, SkillmetaError> {
        let content = fs::read_to_string(path).map_err(|e| SkillmetaError::at_path(path, e))?;
        let policy = Self::from_toml_str(&content).map_err(|e| match e {
            SkillmetaError::PolicyError(msg) => {
                SkillmetaError::PolicyError(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded policy");
        Ok(policy)
    }

    pub fn from_toml_str(content: &str) -> Result<Policy, SkillmetaError> {
        let mut policy: Policy =
            toml::from_str(content).map_err(|e| SkillmetaError::PolicyError(e.to_string()))?;
        for kind in &mut policy.kinds {
            kind.name = kind.name.trim().to_lowercase();
            if kind.collection.trim().is_empty() {
                kind.collection = format!("{}s", kind.name);
            }
        }
        policy.check()?;
        Ok(policy)
    }

    pub fn to_toml_string(&self) -> Result<String, SkillmetaError> {
        toml::to_string_pretty(self).map_err(|e| SkillmetaError::PolicyError(e.to_string()))
    }

    /// Structural sanity checks that serde cannot express.
    pub fn check(&self) -> Result<(), SkillmetaError> {
        if self.delimiter.trim().is_empty() {
            return Err(SkillmetaError::PolicyError(
                "delimiter must not be empty".to_string(),
            ));
        }
        let mut seen = Vec::new();
        for kind in &self.kinds {
            if kind.name.trim().is_empty() {
                return Err(SkillmetaError::PolicyError(
                    "every [[kinds]] entry needs a name".to_string(),
                ));
            }
            if seen.contains(&kind.name) {
                return Err(SkillmetaError::PolicyError(format!(
                    "kind '{}' declared twice",
                    kind.name
                )));
            }
            if kind.patterns.is_empty() {
                return Err(SkillmetaError::PolicyError(format!(
                    "kind '{}' has no discovery patterns",
                    kind.name
                )));
            }
            for pattern in &kind.patterns {
                compile_pattern(pattern)?;
            }
            seen.push(kind.name.clone());
        }
        for (field, kind) in &self.references {
            if self.kind(&DocumentKind::new(kind.as_str())).is_none() {
                return Err(SkillmetaError::PolicyError(format!(
                    "reference field '{}' points at unknown kind '{}'",
                    field, kind
                )));
            }
        }
        Ok(())
    }

    pub fn kind(&self, kind: &DocumentKind) -> Option<&KindPolicy> {
        self.kinds.iter().find(|k| k.name == kind.as_str())
    }

    pub fn kind_names(&self) -> Vec<DocumentKind> {
        self.kinds.iter().map(|k| DocumentKind::new(&k.name)).collect()
    }

    /// Kinds selected by an export `--type` value; `all` selects every kind.
    /// Accepts the kind name or its collection name.
    pub fn select_kinds(&self, selector: &str) -> Result<Vec<&KindPolicy>, SkillmetaError> {
        let selector = selector.trim().to_lowercase();
        if selector == "all" {
            return Ok(self.kinds.iter().collect());
        }
        let selected: Vec<&KindPolicy> = self
            .kinds
            .iter()
            .filter(|k| k.name == selector || k.collection == selector)
            .collect();
        if selected.is_empty() {
            return Err(SkillmetaError::NotFound(format!(
                "document kind '{}' (known: {})",
                selector,
                self.kinds
                    .iter()
                    .map(|k| k.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        Ok(selected)
    }

    /// Allowed values per constrained field, with `category` folded in.
    pub fn effective_enums(&self) -> BTreeMap<String, Vec<String>> {
        let mut enums = self.enums.clone();
        if !self.categories.is_empty() {
            enums
                .entry("category".to_string())
                .or_insert_with(|| self.categories.clone());
        }
        enums
    }
}

/// Matching options for discovery patterns: `*` and `?` stay within one
/// path segment, `**/` spans any number of directories.
pub const PATTERN_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiles a root-relative discovery pattern.
pub fn compile_pattern(pattern: &str) -> Result<Pattern, SkillmetaError> {
    Pattern::new(pattern.trim_start_matches("./"))
        .map_err(|e| SkillmetaError::PolicyError(format!("bad pattern '{}': {}", pattern, e)))
}
