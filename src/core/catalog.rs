//! Catalog mapping and export.
//!
//! Validated metadata is normalized (field names canonicalized, values
//! coerced to the export types) and mapped into the fixed `CatalogEntry`
//! sections. Export is partial-success: a document that cannot be mapped is
//! skipped and counted, the rest still land in the catalog.

use crate::core::atomic;
use crate::core::document::Document;
use crate::core::error::{SchemaError, SkillmetaError};
use crate::core::metadata::{Metadata, Value};
use crate::core::time;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_VERSION: &str = "1.0.0";

/// Recursively rewrites field names from `kebab-case` to `snake_case`.
/// Applying it twice yields the same metadata.
pub fn normalize_keys(metadata: &Metadata) -> Metadata {
    metadata
        .iter()
        .map(|(key, value)| (key.trim().replace('-', "_"), normalize_value(value)))
        .collect()
}

fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Map(map) => Value::Map(normalize_keys(map)),
        Value::List(items) => Value::List(items.iter().map(normalize_value).collect()),
        other => other.clone(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Identity {
    pub name: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Display {
    pub difficulty: Option<String>,
    pub time_saved: Option<String>,
    pub frequency: Option<String>,
    pub use_cases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Relationships {
    pub related_agents: Vec<String>,
    pub related_skills: Vec<String>,
    pub related_commands: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Technical {
    pub dependencies: Vec<String>,
    pub compatibility: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Example {
    pub title: String,
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analytics {
    pub installs: u64,
    pub upvotes: u64,
    pub rating: f64,
    pub reviews: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Versioning {
    pub version: String,
    pub author: Option<String>,
    pub contributors: Vec<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Discoverability {
    pub tags: Vec<String>,
    pub featured: bool,
    pub verified: bool,
    pub license: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub identity: Identity,
    pub display: Display,
    pub relationships: Relationships,
    pub technical: Technical,
    pub examples: Vec<Example>,
    pub analytics: Analytics,
    pub versioning: Versioning,
    pub discoverability: Discoverability,
    /// Root-relative path of the source document.
    pub source: String,
}

/// Section name → fields mapped from it. A field is read top-level first,
/// then from a nested map named after its section.
const SECTIONS: &[(&str, &[&str])] = &[
    (
        "identity",
        &["name", "title", "description", "category", "subcategory"],
    ),
    (
        "display",
        &["difficulty", "time_saved", "frequency", "use_cases"],
    ),
    (
        "relationships",
        &["related_agents", "related_skills", "related_commands"],
    ),
    ("technical", &["dependencies", "compatibility"]),
    ("examples", &[]),
    ("analytics", &["installs", "upvotes", "rating", "reviews"]),
    (
        "versioning",
        &["version", "author", "contributors", "created", "updated"],
    ),
    ("discoverability", &["tags", "featured", "verified", "license"]),
];

fn section_of(field: &str) -> Option<&'static str> {
    SECTIONS
        .iter()
        .find(|(_, fields)| fields.contains(&field))
        .map(|(section, _)| *section)
}

fn is_known(field: &str) -> bool {
    SECTIONS.iter().any(|(section, _)| *section == field) || section_of(field).is_some()
}

/// Keys of normalized metadata that the catalog schema has no slot for,
/// including unknown keys inside section maps (`analytics.foo`).
fn dropped_fields(normalized: &Metadata) -> Vec<String> {
    let mut dropped = Vec::new();
    for (key, value) in normalized.iter() {
        if !is_known(key) {
            dropped.push(key.to_string());
            continue;
        }
        let Some((_, fields)) = SECTIONS.iter().find(|(section, _)| *section == key) else {
            continue;
        };
        if fields.is_empty() {
            continue;
        }
        if let Some(map) = value.as_map() {
            dropped.extend(
                map.keys()
                    .filter(|inner| !fields.contains(inner))
                    .map(|inner| format!("{}.{}", key, inner)),
            );
        }
    }
    dropped
}

/// Normalized metadata with section-aware lookup.
struct Fields<'a> {
    meta: &'a Metadata,
}

impl<'a> Fields<'a> {
    fn get(&self, field: &str) -> Option<&'a Value> {
        if let Some(value) = self.meta.get(field) {
            return Some(value);
        }
        let section = section_of(field)?;
        self.meta.get(section)?.as_map()?.get(field)
    }

    fn string(&self, field: &str) -> Result<Option<String>, SchemaError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => match value.scalar_text() {
                Some(text) if text.trim().is_empty() => Ok(None),
                Some(text) => Ok(Some(text.trim().to_string())),
                None => Err(invalid(field, "a string")),
            },
        }
    }

    fn list(&self, field: &str) -> Result<Vec<String>, SchemaError> {
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(Value::Map(map)) if !map.is_empty() => Err(invalid(field, "a list")),
            Some(value) => Ok(value.string_items()),
        }
    }

    fn counter(&self, field: &str) -> Result<u64, SchemaError> {
        let Some(value) = self.get(field) else {
            return Ok(0);
        };
        if value.is_blank() {
            return Ok(0);
        }
        let parsed = match value {
            Value::Integer(i) => u64::try_from(*i).ok(),
            Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as u64),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| invalid(field, "a non-negative integer"))
    }

    fn number(&self, field: &str) -> Result<f64, SchemaError> {
        let Some(value) = self.get(field) else {
            return Ok(0.0);
        };
        if value.is_blank() {
            return Ok(0.0);
        }
        let parsed = match value {
            Value::String(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        };
        parsed
            .filter(|f| f.is_finite())
            .ok_or_else(|| invalid(field, "a number"))
    }

    fn flag(&self, field: &str) -> Result<bool, SchemaError> {
        match self.get(field) {
            None => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "no" | "false" => Ok(false),
                "yes" | "true" => Ok(true),
                _ => Err(invalid(field, "a boolean")),
            },
            Some(_) => Err(invalid(field, "a boolean")),
        }
    }

    fn examples(&self) -> Result<Vec<Example>, SchemaError> {
        let text = |v: &Value| v.scalar_text().filter(|s| !s.trim().is_empty());
        match self.meta.get("examples") {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => Ok(items
                .iter()
                .filter_map(text)
                .map(|title| Example {
                    title,
                    ..Example::default()
                })
                .collect()),
            Some(Value::Map(map)) => {
                if map.contains_key("title") || map.contains_key("input") {
                    let title = map.get("title").and_then(text).unwrap_or_default();
                    Ok(vec![Example {
                        title,
                        input: map.get("input").and_then(text),
                        output: map.get("output").and_then(text),
                    }])
                } else {
                    Ok(map
                        .iter()
                        .map(|(key, value)| Example {
                            title: key.to_string(),
                            input: text(value),
                            output: None,
                        })
                        .collect())
                }
            }
            Some(value) if value.is_blank() => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(vec![Example {
                title: s.trim().to_string(),
                ..Example::default()
            }]),
            Some(_) => Err(invalid("examples", "a list or map")),
        }
    }
}

fn invalid(field: &str, expected: &str) -> SchemaError {
    SchemaError::InvalidType {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

/// `analyze.code-quality` → `Analyze Code Quality`.
pub fn title_from_name(name: &str) -> String {
    name.split(['.', '-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps one document's metadata into a catalog entry. `required` fields must
/// be present and non-blank after normalization.
pub fn map_entry(
    document: &Document,
    metadata: &Metadata,
    required: &[String],
) -> Result<CatalogEntry, SchemaError> {
    let normalized = normalize_keys(metadata);
    let f = Fields { meta: &normalized };

    for field in required {
        let field = field.replace('-', "_");
        if f.get(&field).is_none_or(Value::is_blank) {
            return Err(SchemaError::MissingField { field });
        }
    }
    for field in dropped_fields(&normalized) {
        tracing::info!(
            path = %document.display_path(),
            field = %field,
            "dropping field not in the catalog schema"
        );
    }

    let name = f.string("name")?.unwrap_or_default();
    let title = match f.string("title")? {
        Some(title) => title,
        None => title_from_name(&name),
    };

    Ok(CatalogEntry {
        identity: Identity {
            title,
            description: f.string("description")?.unwrap_or_default(),
            category: f.string("category")?.map(|c| c.to_lowercase()),
            subcategory: f.string("subcategory")?,
            name,
        },
        display: Display {
            difficulty: f.string("difficulty")?.map(|d| d.to_lowercase()),
            time_saved: f.string("time_saved")?,
            frequency: f.string("frequency")?.map(|d| d.to_lowercase()),
            use_cases: f.list("use_cases")?,
        },
        relationships: Relationships {
            related_agents: f.list("related_agents")?,
            related_skills: f.list("related_skills")?,
            related_commands: f.list("related_commands")?,
        },
        technical: Technical {
            dependencies: f.list("dependencies")?,
            compatibility: f.list("compatibility")?,
        },
        examples: f.examples()?,
        analytics: Analytics {
            installs: f.counter("installs")?,
            upvotes: f.counter("upvotes")?,
            rating: f.number("rating")?,
            reviews: f.counter("reviews")?,
        },
        versioning: Versioning {
            version: f
                .string("version")?
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            author: f.string("author")?,
            contributors: f.list("contributors")?,
            created: f.string("created")?,
            updated: f.string("updated")?,
        },
        discoverability: Discoverability {
            tags: f.list("tags")?,
            featured: f.flag("featured")?,
            verified: f.flag("verified")?,
            license: f.string("license")?,
        },
        source: document.display_path(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub schema_version: String,
    pub export_timestamp: String,
    pub total_count: usize,
    pub last_updated: String,
    /// sha256 of the serialized entries.
    pub digest: String,
    pub collection: String,
    pub entries: Vec<CatalogEntry>,
}

impl Serialize for Catalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Header<'a> {
            schema_version: &'a str,
            export_timestamp: &'a str,
            total_count: usize,
            last_updated: &'a str,
            digest: &'a str,
        }
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(
            "metadata",
            &Header {
                schema_version: &self.schema_version,
                export_timestamp: &self.export_timestamp,
                total_count: self.total_count,
                last_updated: &self.last_updated,
                digest: &self.digest,
            },
        )?;
        map.serialize_entry(&self.collection, &self.entries)?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    pub catalog: Catalog,
    pub skipped: Vec<Skipped>,
}

pub fn entries_digest(entries: &[CatalogEntry]) -> String {
    let bytes = serde_json::to_vec(entries).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

pub struct CatalogExporter {
    schema_version: String,
    required_fields: Vec<String>,
}

impl CatalogExporter {
    pub fn new(schema_version: impl Into<String>, required_fields: Vec<String>) -> Self {
        CatalogExporter {
            schema_version: schema_version.into(),
            required_fields,
        }
    }

    /// Maps every document; unmappable ones are skipped and logged.
    pub fn export(&self, documents: &[(&Document, &Metadata)], collection: &str) -> ExportOutcome {
        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for (document, metadata) in documents {
            match map_entry(document, metadata, &self.required_fields) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(
                        path = %document.display_path(),
                        error = %e,
                        "skipping document in catalog export"
                    );
                    skipped.push(Skipped {
                        path: document.display_path(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        let now = time::now_iso8601();
        ExportOutcome {
            catalog: Catalog {
                schema_version: self.schema_version.clone(),
                export_timestamp: now.clone(),
                total_count: entries.len(),
                last_updated: now,
                digest: entries_digest(&entries),
                collection: collection.to_string(),
                entries,
            },
            skipped,
        }
    }
}

/// `<dir>/<collection>.json`
pub fn catalog_path(dir: &Path, collection: &str) -> PathBuf {
    dir.join(format!("{}.json", collection))
}

/// Keeps the previous `last_updated` stamp when the entries did not change.
pub fn carry_last_updated(catalog: &mut Catalog, previous: &Path) {
    let Ok(text) = fs::read_to_string(previous) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
        tracing::debug!(path = %previous.display(), "previous catalog is not valid JSON");
        return;
    };
    let header = &value["metadata"];
    if header["digest"].as_str() == Some(catalog.digest.as_str()) {
        if let Some(stamp) = header["last_updated"].as_str() {
            catalog.last_updated = stamp.to_string();
        }
    }
}

/// Writes the catalog atomically, carrying over `last_updated` first.
pub fn write_catalog(catalog: &mut Catalog, path: &Path) -> Result<(), SkillmetaError> {
    carry_last_updated(catalog, path);
    atomic::write_json_atomic(path, catalog)?;
    tracing::info!(
        path = %path.display(),
        entries = catalog.total_count,
        "catalog written"
    );
    Ok(())
}

/// Entries of a previously written catalog file.
pub fn read_catalog_entries(path: &Path) -> Result<Vec<serde_json::Value>, SkillmetaError> {
    let text = fs::read_to_string(path).map_err(|e| SkillmetaError::at_path(path, e))?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    let entries = value
        .as_object()
        .into_iter()
        .flat_map(|obj| obj.iter())
        .filter(|(key, _)| key.as_str() != "metadata")
        .filter_map(|(_, v)| v.as_array())
        .flatten()
        .cloned()
        .collect();
    Ok(entries)
}
