use crate::core::rules::{CheckContext, Outcome, Rule};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"!?\[[^\]]*\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#)
        .expect("valid inline link regex")
});

static REFERENCE_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}\[[^\]]+\]:\s*<?([^\s>]+)>?").expect("valid reference regex")
});

static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]*`").expect("valid code span regex"));

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*:").expect("valid scheme regex"));

/// Local markdown links must point at files that exist, resolved relative to
/// the linking document (or to the repository root for `/`-prefixed links).
pub struct RelativeLinks;

/// Local link targets of a body with their 1-based body line numbers.
pub fn local_link_targets(body: &str) -> Vec<(usize, String)> {
    let mut in_fence = false;
    let mut out = Vec::new();
    for (idx, line) in body.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let line = INLINE_CODE.replace_all(line, "");
        let inline = INLINE_LINK.captures_iter(&line).map(|c| c[1].to_string());
        let reference = REFERENCE_DEF.captures(&line).map(|c| c[1].to_string());
        for target in inline.chain(reference) {
            if let Some(local) = local_target(&target) {
                out.push((idx + 1, local));
            }
        }
    }
    out
}

/// The path part of a link target, or `None` for external links, pure
/// anchors and templated placeholders.
fn local_target(target: &str) -> Option<String> {
    if target.starts_with('#') || target.contains('{') || SCHEME.is_match(target) {
        return None;
    }
    let path = target
        .split(['#', '?'])
        .next()
        .unwrap_or_default()
        .replace("%20", " ");
    if path.is_empty() { None } else { Some(path) }
}

fn resolve(document_dir: &Path, target: &str) -> PathBuf {
    match target.strip_prefix('/') {
        Some(root_relative) => PathBuf::from(root_relative),
        None => document_dir.join(target),
    }
}

impl Rule for RelativeLinks {
    fn id(&self) -> &'static str {
        "links.relative"
    }

    fn description(&self) -> &'static str {
        "Relative links point at files that exist"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let targets = local_link_targets(&ctx.document.body);
        if targets.is_empty() {
            return Outcome::skip("no local links");
        }
        // Body line 1 sits after both delimiter lines and the block.
        let offset = ctx
            .document
            .metadata_raw
            .as_ref()
            .map_or(0, |raw| raw.lines().count() + 2);
        let dir = ctx.document.dir();
        let violations = targets
            .iter()
            .filter(|(_, target)| !ctx.repo.exists(&resolve(dir, target)))
            .map(|(line, target)| format!("broken link '{}' (line {})", target, line + offset))
            .collect();
        Outcome::from_violations(violations, format!("{} local links resolve", targets.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::{Document, DocumentKind};
    use crate::core::repo::RepoContext;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn collects_only_local_targets() {
        let body = "\
[a](./ref.md) and [b](https://x.dev) and [c](#anchor)
`[code](nope.md)` ![img](img/logo%20big.png \"Logo\")
```
[fenced](fenced.md)
```
[ref]: ../shared/guide.md#part
[tpl]({{base}}/x.md)
";
        let targets = local_link_targets(body);
        assert_eq!(
            targets,
            vec![
                (1, "./ref.md".to_string()),
                (2, "img/logo big.png".to_string()),
                (6, "../shared/guide.md".to_string()),
            ]
        );
    }

    #[test]
    fn broken_links_report_file_line_numbers() {
        let tmp = tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("skills/demo")).unwrap();
        fs::write(tmp.path().join("skills/demo/ref.md"), "x").unwrap();
        fs::write(tmp.path().join("LICENSE"), "x").unwrap();
        let doc = Document {
            path: PathBuf::from("skills/demo/SKILL.md"),
            kind: DocumentKind::new("skill"),
            raw_content: String::new(),
            metadata_raw: Some("name: demo\n".to_string()),
            body: "[ok](ref.md)\n[root](/LICENSE)\n[bad](missing.md)\n".to_string(),
        };
        let repo = RepoContext::new(tmp.path());
        let outcome = RelativeLinks.check(&CheckContext {
            document: &doc,
            metadata: None,
            repo: &repo,
            kind: &doc.kind,
        });
        match outcome {
            Outcome::Fail(v) => assert_eq!(v, vec!["broken link 'missing.md' (line 6)"]),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
