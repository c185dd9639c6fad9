//! CLI struct definitions for the skillmeta command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use crate::core::report::ReportFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "skillmeta",
    version = env!("CARGO_PKG_VERSION"),
    about = "Validate frontmatter metadata in markdown skill, agent and command libraries and export it as a versioned JSON catalog."
)]
pub(crate) struct Cli {
    /// Repository root (defaults to the current directory).
    #[clap(long, global = true)]
    pub root: Option<PathBuf>,
    /// Policy file (overrides $SKILLMETA_POLICY and <root>/.skillmeta/policy.toml).
    #[clap(long, global = true)]
    pub policy: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum ListFormat {
    #[default]
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum PolicyFormat {
    #[default]
    Toml,
    Json,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ValidateCli {
    /// Files or directories to validate, relative to the root. Defaults to the whole root.
    pub paths: Vec<PathBuf>,
    /// Only validate documents of this kind (name or collection).
    #[clap(long)]
    pub kind: Option<String>,
    /// Only validate documents in this category.
    #[clap(long)]
    pub category: Option<String>,
    /// Report format.
    #[clap(long, value_enum, default_value_t = ReportFormat::Text)]
    pub output: ReportFormat,
    /// Write the report to this file instead of stdout.
    #[clap(long)]
    pub file: Option<PathBuf>,
    /// Show every check for every document, including passes.
    #[clap(long, short = 'v')]
    pub verbose: bool,
    /// Treat parse warnings and unsupported constructs as errors.
    #[clap(long)]
    pub strict: bool,
    /// Worker threads (0 = one per core).
    #[clap(long)]
    pub jobs: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ExportCli {
    /// Kind to export (skill, agent, command, their collection names, or all).
    #[clap(long = "type", default_value = "all")]
    pub kind: String,
    /// Output directory (defaults to the policy's export.output_dir under the root).
    #[clap(long)]
    pub out: Option<PathBuf>,
    /// Schema version stamped into the catalog.
    #[clap(long)]
    pub schema_version: Option<String>,
    /// Debug logging.
    #[clap(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,
    /// Only log warnings and errors; no per-collection lines.
    #[clap(long, short = 'q')]
    pub quiet: bool,
    /// Export documents even if they fail validation.
    #[clap(long)]
    pub include_invalid: bool,
    /// Worker threads (0 = one per core).
    #[clap(long)]
    pub jobs: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct RulesCli {
    /// Only list rules that apply to this kind.
    #[clap(long)]
    pub kind: Option<String>,
    #[clap(long, value_enum, default_value_t = ListFormat::Text)]
    pub format: ListFormat,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ParseCli {
    /// Markdown file to inspect.
    pub file: PathBuf,
    /// Fail on unsupported constructs instead of warning.
    #[clap(long)]
    pub strict: bool,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ManifestCli {
    /// Manifest file (defaults to the policy's export.manifest_path under the root).
    #[clap(long, global = true)]
    pub manifest: Option<PathBuf>,
    #[clap(subcommand)]
    pub command: ManifestCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ManifestCommand {
    /// List installed entries
    List {
        #[clap(long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },
    /// Record an installed entry, filled from the exported catalogs when present
    Record {
        name: String,
        #[clap(long)]
        version: Option<String>,
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        source: Option<String>,
        #[clap(long)]
        description: Option<String>,
        /// Catalog directory to look the entry up in.
        #[clap(long)]
        catalog: Option<PathBuf>,
    },
    /// Remove an installed entry
    Remove { name: String },
    /// Refresh installed entries from the exported catalogs
    Sync {
        /// Catalog directory (defaults to the policy's export.output_dir).
        #[clap(long)]
        catalog: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct PolicyCli {
    #[clap(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PolicyCommand {
    /// Print the effective policy
    Show {
        #[clap(long, value_enum, default_value_t = PolicyFormat::Toml)]
        format: PolicyFormat,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Validate document metadata and structure
    Validate(ValidateCli),
    /// Export validated metadata as catalog JSON files
    Export(ExportCli),
    /// List the effective rule set
    Rules(RulesCli),
    /// Print the parsed frontmatter of one file as JSON
    Parse(ParseCli),
    /// Maintain the install manifest
    Manifest(ManifestCli),
    /// Inspect the effective policy
    Policy(PolicyCli),
}

impl Command {
    /// Default log filter when $SKILLMETA_LOG is unset.
    pub fn log_level(&self) -> &'static str {
        match self {
            Command::Validate(args) if args.verbose => "debug",
            Command::Export(args) if args.verbose => "debug",
            Command::Export(args) if args.quiet => "warn",
            Command::Export(_) | Command::Manifest(_) => "info",
            _ => "warn",
        }
    }
}
