//! Body structure rules: required sections, heading levels, length.

use crate::core::document::DocumentKind;
use crate::core::rules::{CheckContext, Outcome, Rule, Severity};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::LazyLock;

static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("valid heading regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    /// 1-based line within the body.
    pub line: usize,
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// ATX headings of a markdown body, skipping fenced code blocks.
pub fn headings(body: &str) -> Vec<Heading> {
    let mut in_fence = false;
    let mut out = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = ATX_HEADING.captures(line) {
            out.push(Heading {
                level: caps[1].len(),
                text: caps[2].trim().to_string(),
                line: idx + 1,
            });
        }
    }
    out
}

pub struct RequiredSections {
    per_kind: FxHashMap<DocumentKind, Vec<String>>,
}

impl RequiredSections {
    pub fn new(per_kind: FxHashMap<DocumentKind, Vec<String>>) -> Self {
        RequiredSections { per_kind }
    }
}

impl Rule for RequiredSections {
    fn id(&self) -> &'static str {
        "body.sections"
    }

    fn description(&self) -> &'static str {
        "Required section headings are present, in order"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let required = match self.per_kind.get(ctx.kind) {
            Some(sections) if !sections.is_empty() => sections,
            _ => return Outcome::skip("no required sections for this kind"),
        };
        let found = headings(&ctx.document.body);
        let position = |title: &str| {
            found
                .iter()
                .position(|h| h.text.eq_ignore_ascii_case(title.trim()))
        };

        let mut violations = Vec::new();
        let mut last: Option<(usize, &str)> = None;
        for section in required {
            match position(section) {
                None => violations.push(format!("missing section '{}'", section)),
                Some(pos) => {
                    if let Some((prev_pos, prev)) = last {
                        if pos < prev_pos {
                            violations.push(format!(
                                "section '{}' must come after '{}'",
                                section, prev
                            ));
                            continue;
                        }
                    }
                    last = Some((pos, section));
                }
            }
        }
        Outcome::from_violations(
            violations,
            format!("{} required sections present", required.len()),
        )
    }
}

pub struct HeadingLevels;

impl Rule for HeadingLevels {
    fn id(&self) -> &'static str {
        "body.heading_levels"
    }

    fn description(&self) -> &'static str {
        "Heading levels never skip a level"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let found = headings(&ctx.document.body);
        let violations = found
            .windows(2)
            .filter(|pair| pair[1].level > pair[0].level + 1)
            .map(|pair| {
                format!(
                    "heading '{}' (line {}) jumps from h{} to h{}",
                    pair[1].text, pair[1].line, pair[0].level, pair[1].level
                )
            })
            .collect();
        Outcome::from_violations(violations, format!("{} headings well nested", found.len()))
    }
}

pub struct LineCount {
    max_lines: usize,
}

impl LineCount {
    pub fn new(max_lines: usize) -> Self {
        LineCount { max_lines }
    }
}

impl Rule for LineCount {
    fn id(&self) -> &'static str {
        "body.line_count"
    }

    fn description(&self) -> &'static str {
        "Body stays under the line ceiling"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let lines = ctx.document.body.lines().count();
        if lines > self.max_lines {
            Outcome::Fail(vec![format!(
                "body is {} lines (max {})",
                lines, self.max_lines
            )])
        } else {
            Outcome::pass(format!("body is {} lines", lines))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::Document;
    use crate::core::repo::RepoContext;
    use std::path::PathBuf;

    fn check(rule: &dyn Rule, body: &str) -> Outcome {
        let doc = Document {
            path: PathBuf::from("skills/x/SKILL.md"),
            kind: DocumentKind::new("skill"),
            raw_content: String::new(),
            metadata_raw: None,
            body: body.to_string(),
        };
        let repo = RepoContext::default();
        rule.check(&CheckContext {
            document: &doc,
            metadata: None,
            repo: &repo,
            kind: &doc.kind,
        })
    }

    fn sections(titles: &[&str]) -> RequiredSections {
        let mut per_kind = FxHashMap::default();
        per_kind.insert(
            DocumentKind::new("skill"),
            titles.iter().map(|t| t.to_string()).collect(),
        );
        RequiredSections::new(per_kind)
    }

    #[test]
    fn headings_skip_fenced_code_and_closing_hashes() {
        let body = "# Title ##\n\n```\n# not a heading\n```\n## Usage\n#nospace\n";
        let found = headings(body);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].text, "Title");
        assert_eq!(found[1].level, 2);
        assert_eq!(found[1].line, 6);
    }

    #[test]
    fn sections_in_order_pass() {
        let rule = sections(&["Overview", "Usage"]);
        let body = "# X\n## Overview\ntext\n## Usage\n";
        assert!(matches!(check(&rule, body), Outcome::Pass(_)));
    }

    #[test]
    fn out_of_order_and_missing_sections_are_distinguished() {
        let rule = sections(&["Overview", "Usage", "Examples"]);
        let body = "## Usage\n## Overview\n";
        match check(&rule, body) {
            Outcome::Fail(v) => {
                assert_eq!(
                    v,
                    vec![
                        "section 'Usage' must come after 'Overview'",
                        "missing section 'Examples'"
                    ]
                );
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn heading_level_jumps_are_reported() {
        let outcome = check(&HeadingLevels, "# A\n## B\n#### C\n## D\n");
        match outcome {
            Outcome::Fail(v) => assert_eq!(v, vec!["heading 'C' (line 3) jumps from h2 to h4"]),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(HeadingLevels.default_severity(), Severity::Warning);
    }

    #[test]
    fn line_ceiling_is_inclusive() {
        let rule = LineCount::new(3);
        assert!(matches!(check(&rule, "a\nb\nc\n"), Outcome::Pass(_)));
        assert!(matches!(check(&rule, "a\nb\nc\nd\n"), Outcome::Fail(_)));
    }
}
