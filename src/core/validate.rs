//! Batch validation.
//!
//! Discovers documents under a repository root by matching root-relative
//! paths against the policy's per-kind patterns, loads and parses them, and
//! runs the rule registry over each one. Per-document work is independent and
//! runs on a bounded rayon pool; reports come back in discovery order (sorted
//! paths) and totals are reduced from the collected reports, so they do not
//! depend on scheduling.
//!
//! I/O and parse faults are captured per document. They fail that document's
//! report and never abort the batch.

use crate::core::document::{Document, DocumentKind, display_path};
use crate::core::error::{ParseError, SkillmetaError};
use crate::core::frontmatter;
use crate::core::metadata::Metadata;
use crate::core::parser::{ParseMode, ParseWarning};
use crate::core::policy::{PATTERN_OPTIONS, Policy, compile_pattern};
use crate::core::repo::{RepoContext, artifact_name_from_path, normalize_relative};
use crate::core::rules::{RuleRegistry, RuleResult, Severity};
use crate::core::time;
use crate::plugins::PARSE_RULE_ID;
use glob::Pattern;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A document path matched to its kind, before it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    /// Relative to the repository root.
    pub path: PathBuf,
    pub kind: DocumentKind,
    /// Artifact name implied by the path (`skills/demo/SKILL.md` → `demo`).
    pub path_name: Option<String>,
}

struct KindMatcher {
    kind: DocumentKind,
    source: String,
    pattern: Pattern,
}

/// Walks a repository and classifies files by kind.
pub struct Discovery {
    matchers: Vec<KindMatcher>,
    exclude_dirs: FxHashSet<String>,
    exclude_files: FxHashSet<String>,
    skip_paths: Vec<PathBuf>,
}

impl Discovery {
    pub fn new(policy: &Policy) -> Result<Self, SkillmetaError> {
        let mut matchers = Vec::new();
        for kind in &policy.kinds {
            for pattern in &kind.patterns {
                matchers.push(KindMatcher {
                    kind: DocumentKind::new(&kind.name),
                    source: pattern.clone(),
                    pattern: compile_pattern(pattern)?,
                });
            }
        }
        let mut skip_paths = Vec::new();
        if let Some(out) = normalize_relative(&policy.export.output_dir) {
            if !out.as_os_str().is_empty() {
                skip_paths.push(out);
            }
        }
        Ok(Discovery {
            matchers,
            exclude_dirs: policy.exclude_dirs.iter().cloned().collect(),
            exclude_files: policy.exclude_files.iter().cloned().collect(),
            skip_paths,
        })
    }

    /// Kind of a root-relative path; the first matching pattern wins.
    pub fn classify(&self, relative: &Path) -> Option<Discovered> {
        let file_name = relative.file_name()?.to_string_lossy();
        if self.exclude_files.contains(file_name.as_ref()) {
            return None;
        }
        let display = display_path(relative);
        self.matchers
            .iter()
            .find(|m| m.pattern.matches_with(&display, PATTERN_OPTIONS))
            .map(|m| Discovered {
                path: relative.to_path_buf(),
                kind: m.kind.clone(),
                path_name: artifact_name_from_path(relative, &m.source),
            })
    }

    /// Every document under `root`, sorted by path.
    pub fn walk(&self, root: &Path) -> Result<Vec<Discovered>, SkillmetaError> {
        fn recurse(
            discovery: &Discovery,
            root: &Path,
            dir: &Path,
            out: &mut Vec<Discovered>,
        ) -> Result<(), SkillmetaError> {
            let entries = fs::read_dir(dir).map_err(|e| SkillmetaError::at_path(dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| SkillmetaError::at_path(dir, e))?;
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .map_err(|e| SkillmetaError::at_path(&path, e))?;
                let Ok(relative) = path.strip_prefix(root) else {
                    continue;
                };
                if file_type.is_dir() {
                    let name = entry.file_name().to_string_lossy().to_string();
                    if discovery.exclude_dirs.contains(&name)
                        || discovery.skip_paths.iter().any(|p| p == relative)
                    {
                        tracing::trace!(dir = %display_path(relative), "skipping directory");
                        continue;
                    }
                    recurse(discovery, root, &path, out)?;
                } else if file_type.is_file() {
                    if let Some(found) = discovery.classify(relative) {
                        out.push(found);
                    }
                }
            }
            Ok(())
        }

        let mut out = Vec::new();
        if root.is_dir() {
            recurse(self, root, root, &mut out)?;
        } else {
            return Err(SkillmetaError::NotFound(format!(
                "repository root {}",
                root.display()
            )));
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(out)
    }
}

/// Narrows a full discovery to the given targets (files or directories,
/// relative to `root` or absolute beneath it). No targets selects everything.
pub fn select_targets(
    root: &Path,
    all: &[Discovered],
    targets: &[PathBuf],
) -> Result<Vec<Discovered>, SkillmetaError> {
    if targets.is_empty() {
        return Ok(all.to_vec());
    }
    let mut selected = Vec::new();
    let mut seen = FxHashSet::default();
    for target in targets {
        let relative = if target.is_absolute() {
            target.strip_prefix(root).ok().and_then(normalize_relative)
        } else {
            normalize_relative(target)
        };
        let Some(relative) = relative else {
            return Err(SkillmetaError::NotFound(format!(
                "{} is outside the repository root {}",
                target.display(),
                root.display()
            )));
        };
        let matched: Vec<&Discovered> = all
            .iter()
            .filter(|d| d.path.starts_with(&relative))
            .collect();
        if matched.is_empty() {
            let full = root.join(&relative);
            if full.is_file() {
                return Err(SkillmetaError::NotFound(format!(
                    "{} does not match any document pattern",
                    display_path(&relative)
                )));
            }
            if !full.exists() {
                return Err(SkillmetaError::NotFound(display_path(&relative)));
            }
        }
        for d in matched {
            if seen.insert(d.path.clone()) {
                selected.push(d.clone());
            }
        }
    }
    selected.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(selected)
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadFailure {
    Io(String),
    Parse(ParseError),
}

/// A document after reading and parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    Ready {
        document: Document,
        metadata: Option<Metadata>,
        warnings: Vec<ParseWarning>,
    },
    Failed {
        path: PathBuf,
        kind: DocumentKind,
        failure: LoadFailure,
    },
}

impl Loaded {
    pub fn path(&self) -> &Path {
        match self {
            Loaded::Ready { document, .. } => &document.path,
            Loaded::Failed { path, .. } => path,
        }
    }

    pub fn kind(&self) -> &DocumentKind {
        match self {
            Loaded::Ready { document, .. } => &document.kind,
            Loaded::Failed { kind, .. } => kind,
        }
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Loaded::Ready { metadata, .. } => metadata.as_ref(),
            Loaded::Failed { .. } => None,
        }
    }
}

/// Reads and parses one discovered document. Never fails: faults are
/// captured in the returned value.
pub fn load_document(root: &Path, found: &Discovered, delimiter: &str, mode: ParseMode) -> Loaded {
    let full = root.join(&found.path);
    let raw = match fs::read_to_string(&full) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(path = %display_path(&found.path), error = %e, "cannot read document");
            return Loaded::Failed {
                path: found.path.clone(),
                kind: found.kind.clone(),
                failure: LoadFailure::Io(e.to_string()),
            };
        }
    };
    match frontmatter::parse_document(&raw, delimiter, mode) {
        Ok(parsed) => Loaded::Ready {
            document: Document {
                path: found.path.clone(),
                kind: found.kind.clone(),
                raw_content: raw,
                metadata_raw: parsed.metadata_raw,
                body: parsed.body,
            },
            metadata: parsed.metadata,
            warnings: parsed.warnings,
        },
        Err(e) => {
            tracing::debug!(path = %display_path(&found.path), error = %e, "parse failed");
            Loaded::Failed {
                path: found.path.clone(),
                kind: found.kind.clone(),
                failure: LoadFailure::Parse(e),
            }
        }
    }
}

/// Which documents a run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub kind: Option<DocumentKind>,
    /// Matched case-insensitively against the `category` field after parsing.
    pub category: Option<String>,
}

impl Filter {
    fn keeps(&self, loaded: &Loaded) -> bool {
        if self.kind.as_ref().is_some_and(|k| k != loaded.kind()) {
            return false;
        }
        let Some(wanted) = &self.category else {
            return true;
        };
        match loaded {
            // Unreadable and unparsable documents are never filtered out.
            Loaded::Failed { .. } => true,
            Loaded::Ready { metadata, .. } => metadata
                .as_ref()
                .and_then(|m| m.text("category"))
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pass,
    Fail,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pass => "pass",
            DocumentStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub path: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub results: Vec<RuleResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub io_error: Option<String>,
}

impl ValidationReport {
    pub fn is_pass(&self) -> bool {
        self.status == DocumentStatus::Pass
    }

    /// Failed error-severity results.
    pub fn errors(&self) -> impl Iterator<Item = &RuleResult> {
        self.results.iter().filter(|r| r.is_blocking_failure())
    }

    /// Failed warning-severity results.
    pub fn warnings(&self) -> impl Iterator<Item = &RuleResult> {
        self.results.iter().filter(|r| r.is_warning())
    }

    fn from_results(path: &Path, kind: &DocumentKind, results: Vec<RuleResult>) -> Self {
        let status = if results.iter().any(RuleResult::is_blocking_failure) {
            DocumentStatus::Fail
        } else {
            DocumentStatus::Pass
        };
        ValidationReport {
            path: display_path(path),
            kind: kind.clone(),
            status,
            results,
            parse_error: None,
            io_error: None,
        }
    }

    fn from_failure(path: &Path, kind: &DocumentKind, failure: &LoadFailure) -> Self {
        let (parse_error, io_error) = match failure {
            LoadFailure::Parse(e) => (Some(e.to_string()), None),
            LoadFailure::Io(e) => (None, Some(e.clone())),
        };
        ValidationReport {
            path: display_path(path),
            kind: kind.clone(),
            status: DocumentStatus::Fail,
            results: Vec::new(),
            parse_error,
            io_error,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub documents: usize,
    pub passed: usize,
    pub failed: usize,
    /// Failed warning-severity results across all documents.
    pub warnings: usize,
}

impl Totals {
    fn of(report: &ValidationReport) -> Self {
        Totals {
            documents: 1,
            passed: usize::from(report.is_pass()),
            failed: usize::from(!report.is_pass()),
            warnings: report.warnings().count(),
        }
    }

    fn merge(self, other: Totals) -> Totals {
        Totals {
            documents: self.documents + other.documents,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            warnings: self.warnings + other.warnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub run_id: String,
    pub generated_at: String,
    pub totals: Totals,
    pub reports: Vec<ValidationReport>,
}

impl BatchReport {
    pub fn from_reports(reports: Vec<ValidationReport>) -> Self {
        let totals = reports
            .iter()
            .map(Totals::of)
            .fold(Totals::default(), Totals::merge);
        BatchReport {
            run_id: time::new_run_id(),
            generated_at: time::now_iso8601(),
            totals,
            reports,
        }
    }

    pub fn is_success(&self) -> bool {
        self.totals.failed == 0
    }

    pub fn report(&self, path: &str) -> Option<&ValidationReport> {
        self.reports.iter().find(|r| r.path == path)
    }
}

/// Loaded documents of one repository plus the context rules consult.
pub struct LoadedBatch {
    pub repo: RepoContext,
    pub documents: Vec<Loaded>,
}

pub struct BatchRunner {
    policy: Policy,
    registry: RuleRegistry,
    mode: ParseMode,
    jobs: Option<usize>,
}

impl BatchRunner {
    pub fn new(policy: Policy, registry: RuleRegistry) -> Self {
        let mode = policy.parse_mode;
        BatchRunner {
            policy,
            registry,
            mode,
            jobs: None,
        }
    }

    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// Caps worker threads; `0` lets rayon decide.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    fn pool(&self) -> Result<rayon::ThreadPool, SkillmetaError> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .build()
            .map_err(|e| SkillmetaError::PoolError(e.to_string()))
    }

    /// Discovers and loads the selected documents. The repository context
    /// indexes every document in the repository, not only the selected ones.
    pub fn load(
        &self,
        root: &Path,
        targets: &[PathBuf],
        kind: Option<&DocumentKind>,
    ) -> Result<LoadedBatch, SkillmetaError> {
        if let Some(kind) = kind {
            if self.policy.kind(kind).is_none() {
                return Err(SkillmetaError::NotFound(format!("document kind '{}'", kind)));
            }
        }
        let discovery = Discovery::new(&self.policy)?;
        let all = discovery.walk(root)?;
        let selected: Vec<Discovered> = select_targets(root, &all, targets)?
            .into_iter()
            .filter(|d| kind.is_none_or(|k| &d.kind == k))
            .collect();
        tracing::debug!(
            discovered = all.len(),
            selected = selected.len(),
            "discovery finished"
        );

        let delimiter = self.policy.delimiter.as_str();
        let mode = self.mode;
        let loaded: Vec<Loaded> = self.pool()?.install(|| {
            all.par_iter()
                .map(|found| load_document(root, found, delimiter, mode))
                .collect()
        });

        let mut repo = RepoContext::new(root);
        for found in &all {
            if let Some(name) = &found.path_name {
                repo.add_artifact(&found.kind, name);
            }
        }
        for doc in &loaded {
            if let Some(name) = doc.metadata().and_then(|m| m.text("name")) {
                repo.add_artifact(doc.kind(), &name);
            }
        }

        let wanted: FxHashSet<&Path> = selected.iter().map(|d| d.path.as_path()).collect();
        let documents: Vec<Loaded> = loaded
            .into_iter()
            .filter(|doc| wanted.contains(doc.path()))
            .collect();
        Ok(LoadedBatch { repo, documents })
    }

    /// Runs the rules over already loaded documents.
    pub fn validate_loaded(
        &self,
        batch: &LoadedBatch,
        filter: &Filter,
    ) -> Result<BatchReport, SkillmetaError> {
        let kept: Vec<&Loaded> = batch.documents.iter().filter(|l| filter.keeps(l)).collect();
        let reports: Vec<ValidationReport> = self.pool()?.install(|| {
            kept.par_iter()
                .map(|loaded| self.validate_one(loaded, &batch.repo))
                .collect()
        });
        let report = BatchReport::from_reports(reports);
        tracing::info!(
            run_id = %report.run_id,
            documents = report.totals.documents,
            failed = report.totals.failed,
            warnings = report.totals.warnings,
            "validation finished"
        );
        Ok(report)
    }

    pub fn run(
        &self,
        root: &Path,
        targets: &[PathBuf],
        filter: &Filter,
    ) -> Result<BatchReport, SkillmetaError> {
        let batch = self.load(root, targets, filter.kind.as_ref())?;
        self.validate_loaded(&batch, filter)
    }

    fn validate_one(&self, loaded: &Loaded, repo: &RepoContext) -> ValidationReport {
        match loaded {
            Loaded::Failed {
                path,
                kind,
                failure,
            } => ValidationReport::from_failure(path, kind, failure),
            Loaded::Ready {
                document,
                metadata,
                warnings,
            } => {
                tracing::debug!(path = %document.display_path(), "validating");
                let mut results = Vec::new();
                if let Some(result) = self.parse_warning_result(warnings) {
                    results.push(result);
                }
                results.extend(self.registry.run_all(
                    document,
                    metadata.as_ref(),
                    repo,
                    &document.kind,
                ));
                ValidationReport::from_results(&document.path, &document.kind, results)
            }
        }
    }

    /// Lenient-mode parse warnings, folded into one result.
    fn parse_warning_result(&self, warnings: &[ParseWarning]) -> Option<RuleResult> {
        if warnings.is_empty() {
            return None;
        }
        let overrides = self.policy.rules.get(PARSE_RULE_ID);
        if overrides.is_some_and(|o| o.enabled == Some(false)) {
            return None;
        }
        let details: Vec<String> = warnings.iter().map(|w| w.message.clone()).collect();
        Some(RuleResult {
            rule_id: PARSE_RULE_ID.to_string(),
            passed: false,
            message: details.join("; "),
            severity: overrides
                .and_then(|o| o.severity)
                .unwrap_or(Severity::Warning),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::builtin_registry;
    use tempfile::tempdir;

    const GOOD_SKILL: &str = "---\nname: analyze.code-quality\ndescription: Reviews code quality\ncategory: analysis\n---\n# Analyze\n## Overview\ntext\n## Usage\ntext\n";

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn runner() -> BatchRunner {
        let policy = Policy::default();
        let registry = builtin_registry(&policy).unwrap();
        BatchRunner::new(policy, registry).with_jobs(2)
    }

    #[test]
    fn discovery_classifies_by_pattern_and_skips_excluded_dirs() {
        let tmp = tempdir().unwrap();
        write(tmp.path(), "skills/demo/SKILL.md", GOOD_SKILL);
        write(tmp.path(), "skills/demo/README.md", "x");
        write(tmp.path(), "agents/reviewer.md", "x");
        write(tmp.path(), "agents/README.md", "x");
        write(tmp.path(), "node_modules/agents/x.md", "x");
        write(tmp.path(), "catalog/agents/y.md", "x");
        let found = Discovery::new(&Policy::default())
            .unwrap()
            .walk(tmp.path())
            .unwrap();
        let paths: Vec<String> = found.iter().map(|d| display_path(&d.path)).collect();
        assert_eq!(paths, vec!["agents/reviewer.md", "skills/demo/SKILL.md"]);
        assert_eq!(found[1].path_name.as_deref(), Some("demo"));
    }

    #[test]
    fn unterminated_block_fails_only_that_document() {
        let tmp = tempdir().unwrap();
        write(tmp.path(), "skills/good/SKILL.md", GOOD_SKILL);
        write(tmp.path(), "skills/bad/SKILL.md", "---\nname: bad.thing\n# no close\n");
        let report = runner().run(tmp.path(), &[], &Filter::default()).unwrap();
        assert_eq!(report.totals.documents, 2);
        assert_eq!(report.totals.passed, 1);
        assert_eq!(report.totals.failed, 1);
        let bad = report.report("skills/bad/SKILL.md").unwrap();
        assert!(bad.parse_error.as_deref().unwrap().contains("unterminated"));
        assert!(bad.results.is_empty());
    }

    #[test]
    fn lenient_parse_warnings_become_a_warning_result() {
        let tmp = tempdir().unwrap();
        let raw = GOOD_SKILL.replacen("category: analysis\n", "category: analysis\nstray line\n", 1);
        write(tmp.path(), "skills/good/SKILL.md", &raw);
        let report = runner().run(tmp.path(), &[], &Filter::default()).unwrap();
        let doc = &report.reports[0];
        assert!(doc.is_pass());
        assert_eq!(doc.results[0].rule_id, PARSE_RULE_ID);
        assert_eq!(doc.results[0].severity, Severity::Warning);
        assert_eq!(report.totals.warnings, 1);

        let strict = runner()
            .with_mode(ParseMode::Strict)
            .run(tmp.path(), &[], &Filter::default())
            .unwrap();
        assert!(strict.reports[0].parse_error.is_some());
    }

    #[test]
    fn category_filter_keeps_broken_documents() {
        let tmp = tempdir().unwrap();
        write(tmp.path(), "skills/good/SKILL.md", GOOD_SKILL);
        write(
            tmp.path(),
            "skills/other/SKILL.md",
            &GOOD_SKILL.replace("analysis", "testing"),
        );
        write(tmp.path(), "skills/bad/SKILL.md", "---\nunterminated: yes\n");
        let filter = Filter {
            kind: None,
            category: Some("Analysis".to_string()),
        };
        let report = runner().run(tmp.path(), &[], &filter).unwrap();
        let paths: Vec<&str> = report.reports.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["skills/bad/SKILL.md", "skills/good/SKILL.md"]);
    }

    #[test]
    fn explicit_targets_narrow_the_run() {
        let tmp = tempdir().unwrap();
        write(tmp.path(), "skills/good/SKILL.md", GOOD_SKILL);
        write(tmp.path(), "agents/reviewer.md", "---\nname: reviewer\ndescription: d\n---\n");
        write(tmp.path(), "notes/todo.md", "x");
        let runner = runner();
        let report = runner
            .run(tmp.path(), &[PathBuf::from("skills")], &Filter::default())
            .unwrap();
        assert_eq!(report.totals.documents, 1);

        let err = runner
            .run(tmp.path(), &[PathBuf::from("notes/todo.md")], &Filter::default())
            .unwrap_err();
        assert!(matches!(err, SkillmetaError::NotFound(_)));
        let err = runner
            .run(tmp.path(), &[PathBuf::from("../elsewhere")], &Filter::default())
            .unwrap_err();
        assert!(matches!(err, SkillmetaError::NotFound(_)));
    }

    #[test]
    fn references_resolve_against_the_whole_repository() {
        let tmp = tempdir().unwrap();
        let skill = GOOD_SKILL.replacen(
            "category: analysis\n",
            "category: analysis\nrelated_agents: [reviewer]\n",
            1,
        );
        write(tmp.path(), "skills/good/SKILL.md", &skill);
        write(tmp.path(), "agents/code-reviewer.md", "---\nname: reviewer\ndescription: d\n---\n");
        let runner = runner();
        let references_pass = |targets: &[PathBuf]| {
            let report = runner.run(tmp.path(), targets, &Filter::default()).unwrap();
            let doc = report.report("skills/good/SKILL.md").unwrap();
            let refs = doc
                .results
                .iter()
                .find(|r| r.rule_id == "references.exist")
                .unwrap();
            (refs.passed, refs.message.clone())
        };
        let (whole, message) = references_pass(&[]);
        assert!(whole, "{}", message);
        let (single, message) = references_pass(&[PathBuf::from("skills/good/SKILL.md")]);
        assert!(single, "{}", message);
    }

    #[test]
    fn totals_count_error_failures_not_warnings() {
        let tmp = tempdir().unwrap();
        let long_body: String = (0..600).map(|i| format!("line {}\n", i)).collect();
        write(
            tmp.path(),
            "skills/long/SKILL.md",
            &format!("{}{}", GOOD_SKILL, long_body),
        );
        write(
            tmp.path(),
            "skills/upper/SKILL.md",
            &GOOD_SKILL.replace("analyze.code-quality", "CodeReview"),
        );
        let report = runner().run(tmp.path(), &[], &Filter::default()).unwrap();
        assert_eq!(report.totals.failed, 1);
        assert_eq!(report.totals.passed, 1);
        assert_eq!(report.totals.warnings, 1);
        assert!(!report.report("skills/upper/SKILL.md").unwrap().is_pass());
    }
}
