use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn skillmeta(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_skillmeta"))
        .arg("--root")
        .arg(root)
        .args(args)
        .env_remove("SKILLMETA_POLICY")
        .env_remove("SKILLMETA_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to execute skillmeta")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

const GOOD_SKILL: &str = "---\nname: analyze.code-quality\ndescription: Reviews code quality\ncategory: analysis\n---\n# Code quality\n\n## Overview\n\nText.\n\n## Usage\n\nRun it.\n";

fn clean_repo() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "skills/quality/SKILL.md", GOOD_SKILL);
    tmp
}

fn broken_repo() -> TempDir {
    let tmp = clean_repo();
    write(
        tmp.path(),
        "skills/broken/SKILL.md",
        "---\nname: Broken Name\ndescription: x\ncategory: cooking\n---\n# Broken\n",
    );
    tmp
}

#[test]
fn validate_exits_zero_when_everything_passes() {
    let repo = clean_repo();
    let output = skillmeta(repo.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("validate: PASS 1 document, 1 passed, 0 failed"));
}

#[test]
fn validate_exits_one_on_rule_failures() {
    let repo = broken_repo();
    let output = skillmeta(repo.path(), &["validate"]);
    assert_eq!(output.status.code(), Some(1));
    let text = stdout(&output);
    assert!(text.contains("skills/broken/SKILL.md"), "{}", text);
    assert!(text.contains("name.format"), "{}", text);
    assert!(text.contains("fields.enum"), "{}", text);
}

#[test]
fn validate_exits_two_on_operational_errors() {
    let repo = clean_repo();
    let missing = skillmeta(repo.path(), &["validate", "skills/nope"]);
    assert_eq!(missing.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&missing.stderr).starts_with("Error:"));

    write(repo.path(), ".skillmeta/policy.toml", "delimiter = [\n");
    let bad_policy = skillmeta(repo.path(), &["validate"]);
    assert_eq!(bad_policy.status.code(), Some(2));
}

#[test]
fn validate_json_output_is_machine_readable() {
    let repo = broken_repo();
    let output = skillmeta(repo.path(), &["validate", "--output", "json"]);
    assert_eq!(output.status.code(), Some(1));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["passed"], 1);
    assert_eq!(json["failed"], 1);
    let broken = json["documents"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["path"] == "skills/broken/SKILL.md")
        .unwrap();
    assert_eq!(broken["status"], "fail");
    assert_eq!(broken["checks"]["name.format"]["passed"], false);
}

#[test]
fn validate_writes_markdown_report_to_file() {
    let repo = broken_repo();
    let report = repo.path().join("out/report.md");
    let output = skillmeta(
        repo.path(),
        &[
            "validate",
            "--output",
            "markdown",
            "--file",
            report.to_str().unwrap(),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("written to"));
    let md = fs::read_to_string(&report).unwrap();
    assert!(md.starts_with("## ❌ Metadata validation"));
    assert!(md.contains("skills/broken/SKILL.md"));
}

#[test]
fn validate_narrows_to_explicit_paths() {
    let repo = broken_repo();
    let output = skillmeta(repo.path(), &["validate", "skills/quality"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("1 document"));
}

#[test]
fn strict_mode_turns_unsupported_constructs_into_failures() {
    let repo = clean_repo();
    write(
        repo.path(),
        "skills/anchors/SKILL.md",
        "---\nname: analyze.anchors\ndescription: Anchored\ncategory: analysis\nauthor: &a Someone\n---\n# A\n## Overview\n## Usage\n",
    );
    let lenient = skillmeta(repo.path(), &["validate", "skills/anchors"]);
    let strict = skillmeta(repo.path(), &["validate", "--strict", "skills/anchors"]);
    assert_eq!(lenient.status.code(), Some(0));
    assert!(stdout(&lenient).contains("frontmatter.parse"));
    assert_eq!(strict.status.code(), Some(1));
    assert!(stdout(&strict).contains("x parse:"));
}

#[test]
fn rules_lists_builtin_rules_as_json() {
    let repo = clean_repo();
    let output = skillmeta(repo.path(), &["rules", "--format", "json"]);
    assert!(output.status.success());
    let rules: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let ids: Vec<&str> = rules
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    for id in [
        "frontmatter.present",
        "name.format",
        "fields.required",
        "references.exist",
        "links.relative",
    ] {
        assert!(ids.contains(&id), "missing rule {}", id);
    }
}

#[test]
fn parse_prints_metadata_as_json() {
    let repo = clean_repo();
    let file = repo.path().join("skills/quality/SKILL.md");
    let output = skillmeta(repo.path(), &["parse", file.to_str().unwrap()]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["metadata"]["name"], "analyze.code-quality");
    assert_eq!(json["metadata"]["category"], "analysis");
    assert_eq!(json["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn policy_show_round_trips_as_toml() {
    let repo = clean_repo();
    let output = skillmeta(repo.path(), &["policy", "show"]);
    assert!(output.status.success());
    let text = stdout(&output);
    let parsed = skillmeta::core::policy::Policy::from_toml_str(&text).unwrap();
    assert_eq!(parsed, skillmeta::core::policy::Policy::default());
}

#[test]
fn export_writes_each_collection_and_reports_skips() {
    let repo = broken_repo();
    let output = skillmeta(repo.path(), &["export"]);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("export: summary entries=1 skipped=1"), "{}", text);
    for collection in ["skills", "agents", "commands"] {
        assert!(repo.path().join(format!("catalog/{}.json", collection)).is_file());
    }

    let out = repo.path().join("dist");
    let output = skillmeta(
        repo.path(),
        &[
            "export",
            "--type",
            "skill",
            "--include-invalid",
            "--schema-version",
            "3.1.0",
            "--out",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("skills.json")).unwrap()).unwrap();
    assert_eq!(json["metadata"]["schema_version"], "3.1.0");
    assert_eq!(json["metadata"]["total_count"], 2);
    assert!(!out.join("agents.json").exists());
}
