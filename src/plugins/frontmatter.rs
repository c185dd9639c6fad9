use crate::core::rules::{CheckContext, Outcome, Rule};

/// Every document must open with a metadata block.
pub struct FrontmatterPresent {
    delimiter: String,
}

impl FrontmatterPresent {
    pub fn new(delimiter: impl Into<String>) -> Self {
        FrontmatterPresent {
            delimiter: delimiter.into(),
        }
    }
}

impl Rule for FrontmatterPresent {
    fn id(&self) -> &'static str {
        "frontmatter.present"
    }

    fn description(&self) -> &'static str {
        "Document starts with a frontmatter block"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        if ctx.document.metadata_raw.is_none() {
            return Outcome::Fail(vec![format!(
                "document has no frontmatter block (first line must be '{}')",
                self.delimiter
            )]);
        }
        match ctx.metadata {
            Some(meta) if !meta.is_empty() => {
                Outcome::pass(format!("frontmatter block with {} fields", meta.len()))
            }
            _ => Outcome::Fail(vec!["frontmatter block is empty".to_string()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::{Document, DocumentKind};
    use crate::core::metadata::{Metadata, Value};
    use crate::core::repo::RepoContext;
    use std::path::PathBuf;

    fn run(metadata_raw: Option<&str>, metadata: Option<&Metadata>) -> Outcome {
        let doc = Document {
            path: PathBuf::from("skills/a/SKILL.md"),
            kind: DocumentKind::new("skill"),
            raw_content: String::new(),
            metadata_raw: metadata_raw.map(str::to_string),
            body: String::new(),
        };
        let repo = RepoContext::default();
        let ctx = CheckContext {
            document: &doc,
            metadata,
            repo: &repo,
            kind: &doc.kind,
        };
        FrontmatterPresent::new("---").check(&ctx)
    }

    #[test]
    fn missing_block_fails() {
        assert!(matches!(run(None, None), Outcome::Fail(_)));
    }

    #[test]
    fn empty_block_fails_and_populated_block_passes() {
        let empty = Metadata::new();
        assert!(matches!(run(Some(""), Some(&empty)), Outcome::Fail(_)));

        let mut meta = Metadata::new();
        meta.insert("name", Value::String("a".into()));
        assert!(matches!(run(Some("name: a\n"), Some(&meta)), Outcome::Pass(_)));
    }
}
