//! Splits a raw document into its metadata block and body.

use crate::core::error::ParseError;
use crate::core::metadata::Metadata;
use crate::core::parser::{self, ParseMode, ParseWarning};

pub const DEFAULT_DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Text between the delimiter lines; `None` when the document has no block.
    pub metadata_raw: Option<String>,
    pub body: String,
}

/// A document after extraction and parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDocument {
    pub metadata_raw: Option<String>,
    pub metadata: Option<Metadata>,
    pub warnings: Vec<ParseWarning>,
    pub body: String,
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Extracts the block opened by a first line equal to `delimiter` and closed
/// by the next line equal to it. A missing opening line is not an error; a
/// missing closing line is.
pub fn extract(raw: &str, delimiter: &str) -> Result<Extracted, ParseError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text.split_inclusive('\n');

    let opened = lines
        .next()
        .is_some_and(|first| strip_eol(first) == delimiter);
    if !opened {
        return Ok(Extracted {
            metadata_raw: None,
            body: text.to_string(),
        });
    }

    let block_start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let mut offset = block_start;
    for line in lines {
        if strip_eol(line) == delimiter {
            return Ok(Extracted {
                metadata_raw: Some(text[block_start..offset].to_string()),
                body: text[offset + line.len()..].to_string(),
            });
        }
        offset += line.len();
    }

    Err(ParseError::Unterminated {
        delimiter: delimiter.to_string(),
    })
}

/// Extract, then parse the block (if any).
pub fn parse_document(
    raw: &str,
    delimiter: &str,
    mode: ParseMode,
) -> Result<ParsedDocument, ParseError> {
    let extracted = extract(raw, delimiter)?;
    let (metadata, warnings) = match &extracted.metadata_raw {
        Some(block) => {
            let outcome = parser::parse(block, mode)?;
            (Some(outcome.metadata), outcome.warnings)
        }
        None => (None, Vec::new()),
    };
    Ok(ParsedDocument {
        metadata_raw: extracted.metadata_raw,
        metadata,
        warnings,
        body: extracted.body,
    })
}
