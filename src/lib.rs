//! skillmeta: frontmatter validation and catalog export for markdown content
//! libraries.
//!
//! Documents (skills, agents, commands) open with a restricted metadata block.
//! This crate parses those blocks, checks metadata and document structure
//! against a policy, reports the results, and exports validated metadata as a
//! versioned JSON catalog plus an install manifest.
//!
//! # Pipeline
//!
//! files → [`core::frontmatter`] → [`core::parser`] → metadata →
//! [`core::rules`] (with the built-in rules in [`plugins`]) →
//! [`core::validate`] → [`core::report`] and/or [`core::catalog`]
//!
//! # Examples
//!
//! ```bash
//! # Validate the whole repository
//! skillmeta validate
//!
//! # Validate one directory and write a PR comment
//! skillmeta validate skills/analysis --output markdown --file report.md
//!
//! # Export every collection to catalog/
//! skillmeta export --type all
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: parser, document model, policy, rule engine, batch runner,
//!   reporter, catalog and manifest
//! - [`plugins`]: built-in rules

pub mod core;
pub mod plugins;

mod cli;

use crate::cli::{
    Cli, Command, ExportCli, ListFormat, ManifestCli, ManifestCommand, ParseCli, PolicyCli,
    PolicyCommand, PolicyFormat, RulesCli, ValidateCli,
};
use crate::core::catalog::{self, CatalogExporter};
use crate::core::document::{Document, DocumentKind, display_path};
use crate::core::error::SkillmetaError;
use crate::core::frontmatter;
use crate::core::manifest::{InstalledEntry, Manifest};
use crate::core::metadata::Metadata;
use crate::core::output;
use crate::core::parser::ParseMode;
use crate::core::policy::Policy;
use crate::core::report::{self, RenderOptions};
use crate::core::validate::{BatchRunner, Filter, Loaded};
use crate::core::{atomic, time};

use clap::Parser;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "SKILLMETA_LOG";

/// Exit code for documents that failed validation.
pub const EXIT_VALIDATION_FAILED: i32 = 1;
/// Exit code for operational errors (I/O, bad policy, bad arguments).
pub const EXIT_OPERATIONAL: i32 = 2;

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("skillmeta={}", default_level)));
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}

struct Context {
    root: PathBuf,
    policy_path: Option<PathBuf>,
}

impl Context {
    fn policy(&self) -> Result<Policy, SkillmetaError> {
        Policy::load(&self.root, self.policy_path.as_deref())
    }
}

/// Parses the command line, dispatches, and returns the process exit code.
pub fn run() -> Result<i32, SkillmetaError> {
    let cli = Cli::parse();
    init_logging(cli.command.log_level());

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let ctx = Context {
        root,
        policy_path: cli.policy,
    };
    tracing::debug!(root = %ctx.root.display(), "starting");

    match cli.command {
        Command::Validate(args) => run_validate(&ctx, args),
        Command::Export(args) => run_export(&ctx, args),
        Command::Rules(args) => run_rules(&ctx, args),
        Command::Parse(args) => run_parse(&ctx, args),
        Command::Manifest(args) => run_manifest(&ctx, args),
        Command::Policy(args) => run_policy(&ctx, args),
    }
}

/// Resolves a `--kind` value to one kind; `None` and `all` select every kind.
fn resolve_kind(policy: &Policy, kind: Option<&str>) -> Result<Option<DocumentKind>, SkillmetaError> {
    match kind {
        None => Ok(None),
        Some(k) if k.trim().eq_ignore_ascii_case("all") => Ok(None),
        Some(k) => {
            let selected = policy.select_kinds(k)?;
            Ok(selected.first().map(|kp| DocumentKind::new(&kp.name)))
        }
    }
}

fn color_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}

fn run_validate(ctx: &Context, args: ValidateCli) -> Result<i32, SkillmetaError> {
    let policy = ctx.policy()?;
    let filter = Filter {
        kind: resolve_kind(&policy, args.kind.as_deref())?,
        category: args.category.clone(),
    };
    let registry = plugins::builtin_registry(&policy)?;
    let mut runner = BatchRunner::new(policy, registry);
    if args.strict {
        runner = runner.with_mode(ParseMode::Strict);
    }
    if let Some(jobs) = args.jobs {
        runner = runner.with_jobs(jobs);
    }

    let report = runner.run(&ctx.root, &args.paths, &filter)?;
    let options = RenderOptions {
        verbose: args.verbose,
        color: args.file.is_none() && args.output == report::ReportFormat::Text && color_enabled(),
    };
    let rendered = report::render(&report, args.output, options);
    match &args.file {
        Some(path) => {
            atomic::write_atomic(path, rendered.as_bytes())?;
            println!(
                "validate: {} written to {} ({} failed)",
                output::plural(report.totals.documents, "document report"),
                path.display(),
                report.totals.failed
            );
        }
        None => print!("{}", rendered),
    }
    Ok(report::exit_code(&report))
}

fn run_export(ctx: &Context, args: ExportCli) -> Result<i32, SkillmetaError> {
    let policy = ctx.policy()?;
    let kinds: Vec<_> = policy.select_kinds(&args.kind)?.into_iter().cloned().collect();
    let out_dir = args
        .out
        .clone()
        .unwrap_or_else(|| ctx.root.join(&policy.export.output_dir));
    let schema_version = args
        .schema_version
        .clone()
        .unwrap_or_else(|| policy.export.schema_version.clone());
    let check_validity = policy.export.require_valid && !args.include_invalid;

    let registry = plugins::builtin_registry(&policy)?;
    let exporter = CatalogExporter::new(schema_version, policy.export.required_fields.clone());
    let mut runner = BatchRunner::new(policy, registry);
    if let Some(jobs) = args.jobs {
        runner = runner.with_jobs(jobs);
    }
    let batch = runner.load(&ctx.root, &[], None)?;
    let validation = if check_validity {
        Some(runner.validate_loaded(&batch, &Filter::default())?)
    } else {
        None
    };

    let mut total_entries = 0;
    let mut total_skipped = 0;
    for kind_policy in &kinds {
        let kind = DocumentKind::new(&kind_policy.name);
        let mut docs: Vec<(&Document, &Metadata)> = Vec::new();
        let mut pre_skipped = 0;
        for loaded in batch.documents.iter().filter(|l| l.kind() == &kind) {
            let path = display_path(loaded.path());
            match loaded {
                Loaded::Ready {
                    document,
                    metadata: Some(metadata),
                    ..
                } => {
                    let invalid = validation
                        .as_ref()
                        .is_some_and(|v| !v.report(&path).is_some_and(|r| r.is_pass()));
                    if invalid {
                        tracing::warn!(path = %path, "skipping document that fails validation");
                        pre_skipped += 1;
                        continue;
                    }
                    docs.push((document, metadata));
                }
                Loaded::Ready { metadata: None, .. } => {
                    tracing::warn!(path = %path, "skipping document without frontmatter");
                    pre_skipped += 1;
                }
                Loaded::Failed { failure, .. } => {
                    tracing::warn!(path = %path, failure = ?failure, "skipping unreadable document");
                    pre_skipped += 1;
                }
            }
        }

        let mut outcome = exporter.export(&docs, &kind_policy.collection);
        let target = catalog::catalog_path(&out_dir, &kind_policy.collection);
        catalog::write_catalog(&mut outcome.catalog, &target)?;
        let skipped = pre_skipped + outcome.skipped.len();
        total_entries += outcome.catalog.total_count;
        total_skipped += skipped;
        if !args.quiet {
            println!(
                "export: {} {} -> {} ({} skipped)",
                outcome.catalog.total_count,
                kind_policy.collection,
                target.display(),
                skipped
            );
        }
    }
    if !args.quiet {
        println!(
            "export: summary entries={} skipped={} at={}",
            total_entries,
            total_skipped,
            time::now_iso8601()
        );
    }
    Ok(0)
}

fn run_rules(ctx: &Context, args: RulesCli) -> Result<i32, SkillmetaError> {
    let policy = ctx.policy()?;
    let kind = resolve_kind(&policy, args.kind.as_deref())?;
    let registry = plugins::builtin_registry(&policy)?;
    let descriptors = registry.descriptors(kind.as_ref());
    match args.format {
        ListFormat::Json => println!("{}", serde_json::to_string_pretty(&descriptors)?),
        ListFormat::Text => {
            let width = descriptors.iter().map(|d| d.id.len()).max().unwrap_or(0);
            for d in &descriptors {
                println!(
                    "{:<width$}  {:<7}  {:<20}  {}",
                    d.id,
                    d.severity.to_string(),
                    d.applies_to.join(","),
                    d.description,
                    width = width
                );
            }
        }
    }
    Ok(0)
}

fn run_parse(ctx: &Context, args: ParseCli) -> Result<i32, SkillmetaError> {
    let policy = ctx.policy()?;
    let mode = if args.strict {
        ParseMode::Strict
    } else {
        policy.parse_mode
    };
    let raw = fs::read_to_string(&args.file).map_err(|e| SkillmetaError::at_path(&args.file, e))?;
    match frontmatter::parse_document(&raw, &policy.delimiter, mode) {
        Ok(parsed) => {
            let value = serde_json::json!({
                "path": display_path(&args.file),
                "metadata": parsed.metadata.as_ref().map(Metadata::to_json),
                "warnings": parsed.warnings,
                "body_lines": parsed.body.lines().count(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(0)
        }
        Err(e) => {
            eprintln!("parse: {}: {}", display_path(&args.file), e);
            Ok(EXIT_VALIDATION_FAILED)
        }
    }
}

/// Entries of every catalog file present in `dir`, for all policy kinds.
fn catalog_entries(policy: &Policy, dir: &Path) -> Result<Vec<serde_json::Value>, SkillmetaError> {
    let mut entries = Vec::new();
    for kind in &policy.kinds {
        let path = catalog::catalog_path(dir, &kind.collection);
        if path.is_file() {
            entries.extend(catalog::read_catalog_entries(&path)?);
        }
    }
    Ok(entries)
}

fn run_manifest(ctx: &Context, args: ManifestCli) -> Result<i32, SkillmetaError> {
    let policy = ctx.policy()?;
    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| ctx.root.join(&policy.export.manifest_path));
    let default_catalog = ctx.root.join(&policy.export.output_dir);

    match args.command {
        ManifestCommand::List { format } => {
            let manifest = Manifest::load(&manifest_path)?;
            match format {
                ListFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
                ListFormat::Text => {
                    for e in &manifest.installed {
                        println!(
                            "{}  {}  {}  {}",
                            e.name,
                            e.version,
                            e.category.as_deref().unwrap_or("-"),
                            e.installed_at
                        );
                    }
                    println!(
                        "manifest: {} installed, last sync {}",
                        manifest.installed.len(),
                        manifest.last_sync.as_deref().unwrap_or("never")
                    );
                }
            }
            Ok(0)
        }
        ManifestCommand::Record {
            name,
            version,
            category,
            source,
            description,
            catalog,
        } => {
            let dir = catalog.unwrap_or(default_catalog);
            let from_catalog = catalog_entries(&policy, &dir)?
                .iter()
                .filter_map(InstalledEntry::from_catalog_entry)
                .find(|e| e.name == name);
            if from_catalog.is_none() && version.is_none() {
                return Err(SkillmetaError::NotFound(format!(
                    "catalog entry '{}' (pass --version to record it anyway)",
                    name
                )));
            }
            let mut entry = from_catalog.unwrap_or_else(|| InstalledEntry {
                name: name.clone(),
                version: catalog::DEFAULT_VERSION.to_string(),
                category: None,
                installed_at: time::now_iso8601(),
                source: String::new(),
                description: None,
            });
            if let Some(v) = version {
                entry.version = v;
            }
            if category.is_some() {
                entry.category = category;
            }
            if let Some(s) = source {
                entry.source = s;
            }
            if description.is_some() {
                entry.description = description;
            }
            let recorded_version = entry.version.clone();
            let replaced = Manifest::update(&manifest_path, |m| Ok(m.record(entry)))?;
            println!(
                "manifest: {} {} ({})",
                if replaced.is_some() { "updated" } else { "recorded" },
                name,
                recorded_version
            );
            Ok(0)
        }
        ManifestCommand::Remove { name } => {
            let removed = Manifest::update(&manifest_path, |m| Ok(m.remove(&name)))?;
            match removed {
                Some(_) => {
                    println!("manifest: removed {}", name);
                    Ok(0)
                }
                None => Err(SkillmetaError::NotFound(format!("installed entry '{}'", name))),
            }
        }
        ManifestCommand::Sync { catalog } => {
            let dir = catalog.unwrap_or(default_catalog);
            let entries = catalog_entries(&policy, &dir)?;
            let summary = Manifest::update(&manifest_path, |m| Ok(m.sync_from(&entries)))?;
            println!(
                "manifest: sync updated={} missing={}",
                summary.updated.len(),
                summary.missing.len()
            );
            if !summary.missing.is_empty() {
                println!(
                    "manifest: not in catalog: {}",
                    output::preview_messages(&summary.missing, 5, 80)
                );
            }
            Ok(0)
        }
    }
}

fn run_policy(ctx: &Context, args: PolicyCli) -> Result<i32, SkillmetaError> {
    let policy = ctx.policy()?;
    match args.command {
        PolicyCommand::Show { format } => match format {
            PolicyFormat::Toml => print!("{}", policy.to_toml_string()?),
            PolicyFormat::Json => println!("{}", serde_json::to_string_pretty(&policy)?),
        },
    }
    Ok(0)
}
