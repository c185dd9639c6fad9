use crate::core::document::DocumentKind;
use crate::core::rules::{CheckContext, Outcome, Rule};

/// Names listed in relationship fields (`related_agents`, ...) must exist in
/// the repository as artifacts of the referenced kind.
pub struct CrossReferences {
    fields: Vec<(String, DocumentKind)>,
}

impl CrossReferences {
    pub fn new<I: IntoIterator<Item = (String, String)>>(fields: I) -> Self {
        CrossReferences {
            fields: fields
                .into_iter()
                .map(|(field, kind)| (field, DocumentKind::new(kind)))
                .collect(),
        }
    }
}

impl Rule for CrossReferences {
    fn id(&self) -> &'static str {
        "references.exist"
    }

    fn description(&self) -> &'static str {
        "Related agents, skills and commands resolve to existing artifacts"
    }

    fn check(&self, ctx: &CheckContext<'_>) -> Outcome {
        let Some(meta) = ctx.metadata else {
            return Outcome::skip("no frontmatter");
        };
        let mut checked = 0;
        let mut violations = Vec::new();
        for (field, kind) in &self.fields {
            let Some(value) = meta.field(field) else {
                continue;
            };
            for name in value.string_items() {
                checked += 1;
                if !ctx.repo.has_artifact(kind, &name) {
                    violations.push(format!("{}: no {} named '{}'", field, kind, name));
                }
            }
        }
        if checked == 0 && violations.is_empty() {
            return Outcome::skip("no references");
        }
        Outcome::from_violations(violations, format!("{} references resolved", checked))
    }
}
