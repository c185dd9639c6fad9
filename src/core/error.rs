use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillmetaError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("I/O error at {}: {source}", .path.display())]
    PathIoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
    #[error("Schema error: {0}")]
    SchemaError(#[from] SchemaError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Policy error: {0}")]
    PolicyError(String),
    #[error("Duplicate rule id: {0}")]
    DuplicateRule(String),
    #[error("Worker pool error: {0}")]
    PoolError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl SkillmetaError {
    pub fn at_path(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SkillmetaError::PathIoError {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the frontmatter extractor and the structured-text parser.
///
/// Line numbers are 1-based and relative to the metadata block.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unterminated metadata block: no closing '{delimiter}' line")]
    Unterminated { delimiter: String },
    #[error("line {line}: expected 'key: value', found '{content}'")]
    MissingColon { line: usize, content: String },
    #[error("line {line}: empty key")]
    EmptyKey { line: usize },
    #[error("line {line}: duplicate key '{key}'")]
    DuplicateKey { line: usize, key: String },
    #[error("line {line}: unexpected indentation")]
    UnexpectedIndent { line: usize },
    #[error("line {line}: unsupported construct: {construct}")]
    Unsupported { line: usize, construct: String },
}

/// Export-time failures for a single document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("missing required field '{field}'")]
    MissingField { field: String },
    #[error("field '{field}' must be {expected}")]
    InvalidType { field: String, expected: String },
}
