//! Restricted structured-text parser for frontmatter blocks.
//!
//! Supported grammar, one construct per line:
//!
//! - `key: scalar`
//! - `key: [a, b, c]` (inline list, split on commas outside quotes)
//! - `key:` followed by indented `- item` lines (list)
//! - `key:` followed by indented `subkey: scalar` lines (one level of mapping)
//!
//! Scalars are coerced: integer and float literals become numbers,
//! `true`/`false` (any case) become booleans, matching surrounding quotes are
//! stripped and the value stays a string. Anchors, aliases, tags, flow
//! mappings, block scalars and nesting deeper than one level are rejected in
//! strict mode and skipped with a warning in lenient mode.

use crate::core::error::ParseError;
use crate::core::metadata::{Metadata, Value};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub metadata: Metadata,
    pub warnings: Vec<ParseWarning>,
}

pub fn parse(text: &str, mode: ParseMode) -> Result<ParseOutcome, ParseError> {
    let mut parser = Parser {
        mode,
        metadata: Metadata::new(),
        warnings: Vec::new(),
        open: None,
    };
    for (idx, raw) in text.lines().enumerate() {
        parser.line(idx + 1, raw)?;
    }
    parser.finish()
}

enum Block {
    Pending,
    List(Vec<Value>),
    Map(Metadata),
}

/// A top-level `key:` whose value is collected from the following indented lines.
struct OpenKey {
    key: String,
    line: usize,
    indent: Option<usize>,
    block: Block,
}

struct Parser {
    mode: ParseMode,
    metadata: Metadata,
    warnings: Vec<ParseWarning>,
    open: Option<OpenKey>,
}

impl Parser {
    fn issue(&mut self, err: ParseError) -> Result<(), ParseError> {
        match self.mode {
            ParseMode::Strict => Err(err),
            ParseMode::Lenient => {
                self.warnings.push(ParseWarning {
                    line: error_line(&err),
                    message: err.to_string(),
                });
                Ok(())
            }
        }
    }

    fn line(&mut self, line_no: usize, raw: &str) -> Result<(), ParseError> {
        let line = raw.trim_end();
        let content = line.trim_start();
        if content.is_empty() || content.starts_with('#') {
            return Ok(());
        }
        let indent = line.len() - content.len();

        if content == "---" || content == "..." {
            return self.issue(ParseError::Unsupported {
                line: line_no,
                construct: "document marker inside metadata block".to_string(),
            });
        }

        if self.belongs_to_open(indent, content) {
            return self.nested_line(line_no, indent, content);
        }

        self.close_open()?;
        if indent > 0 {
            return self.issue(ParseError::UnexpectedIndent { line: line_no });
        }

        let Some((key, rest)) = split_key_value(content).filter(|_| !content.starts_with('-'))
        else {
            return self.issue(ParseError::MissingColon {
                line: line_no,
                content: content.to_string(),
            });
        };

        let key = unquote(key);
        if key.is_empty() {
            return self.issue(ParseError::EmptyKey { line: line_no });
        }
        if key.starts_with("<<") || key.starts_with('?') {
            return self.issue(ParseError::Unsupported {
                line: line_no,
                construct: format!("complex key '{}'", key),
            });
        }

        if rest.is_empty() {
            self.open = Some(OpenKey {
                key,
                line: line_no,
                indent: None,
                block: Block::Pending,
            });
            return Ok(());
        }

        match self.value(line_no, rest)? {
            Some(value) => self.insert_top(line_no, key, value),
            None => Ok(()),
        }
    }

    fn belongs_to_open(&self, indent: usize, content: &str) -> bool {
        let Some(open) = &self.open else {
            return false;
        };
        if indent > 0 {
            return true;
        }
        // `key:` followed by `- item` at column 0.
        is_list_item(content)
            && matches!(open.block, Block::Pending | Block::List(_))
            && open.indent.unwrap_or(0) == 0
    }

    fn nested_line(&mut self, line_no: usize, indent: usize, content: &str) -> Result<(), ParseError> {
        let Some(mut open) = self.open.take() else {
            return Ok(());
        };
        let result = self.nested_into(&mut open, line_no, indent, content);
        self.open = Some(open);
        result
    }

    fn nested_into(
        &mut self,
        open: &mut OpenKey,
        line_no: usize,
        indent: usize,
        content: &str,
    ) -> Result<(), ParseError> {
        match open.indent {
            None => open.indent = Some(indent),
            Some(expected) if indent > expected => {
                return self.issue(ParseError::Unsupported {
                    line: line_no,
                    construct: "nesting deeper than one level".to_string(),
                });
            }
            Some(expected) if indent < expected => {
                return self.issue(ParseError::UnexpectedIndent { line: line_no });
            }
            Some(_) => {}
        }

        let item = is_list_item(content);
        if matches!(open.block, Block::Pending) {
            open.block = if item {
                Block::List(Vec::new())
            } else {
                Block::Map(Metadata::new())
            };
        }

        match &mut open.block {
            Block::List(items) => {
                if !item {
                    return self.issue(ParseError::Unsupported {
                        line: line_no,
                        construct: format!("mapping entry inside list '{}'", open.key),
                    });
                }
                let raw = content[1..].trim();
                if raw.is_empty() || is_list_item(raw) {
                    return self.issue(ParseError::Unsupported {
                        line: line_no,
                        construct: "empty or nested list item".to_string(),
                    });
                }
                if is_mapping_item(raw) {
                    return self.issue(ParseError::Unsupported {
                        line: line_no,
                        construct: "mapping inside list item".to_string(),
                    });
                }
                match self.value(line_no, raw)? {
                    Some(Value::List(_)) => self.issue(ParseError::Unsupported {
                        line: line_no,
                        construct: "inline list inside list item".to_string(),
                    }),
                    Some(value) => {
                        items.push(value);
                        Ok(())
                    }
                    None => Ok(()),
                }
            }
            Block::Map(map) => {
                if item {
                    return self.issue(ParseError::Unsupported {
                        line: line_no,
                        construct: format!("list item inside mapping '{}'", open.key),
                    });
                }
                let Some((key, rest)) = split_key_value(content) else {
                    return self.issue(ParseError::MissingColon {
                        line: line_no,
                        content: content.to_string(),
                    });
                };
                let key = unquote(key);
                if key.is_empty() {
                    return self.issue(ParseError::EmptyKey { line: line_no });
                }
                if rest.is_empty() {
                    return self.issue(ParseError::Unsupported {
                        line: line_no,
                        construct: "nesting deeper than one level".to_string(),
                    });
                }
                let Some(value) = self.value(line_no, rest)? else {
                    return Ok(());
                };
                if map.contains_key(&key) {
                    self.issue(ParseError::DuplicateKey {
                        line: line_no,
                        key: format!("{}.{}", open.key, key),
                    })?;
                }
                map.insert(key, value);
                Ok(())
            }
            Block::Pending => Ok(()),
        }
    }

    fn value(&mut self, line_no: usize, raw: &str) -> Result<Option<Value>, ParseError> {
        match parse_value(strip_inline_comment(raw)) {
            Ok(value) => Ok(Some(value)),
            Err(construct) => {
                self.issue(ParseError::Unsupported {
                    line: line_no,
                    construct,
                })?;
                Ok(None)
            }
        }
    }

    fn insert_top(&mut self, line_no: usize, key: String, value: Value) -> Result<(), ParseError> {
        if self.metadata.contains_key(&key) {
            self.issue(ParseError::DuplicateKey {
                line: line_no,
                key: key.clone(),
            })?;
        }
        self.metadata.insert(key, value);
        Ok(())
    }

    fn close_open(&mut self) -> Result<(), ParseError> {
        if let Some(open) = self.open.take() {
            let value = match open.block {
                Block::Pending => Value::String(String::new()),
                Block::List(items) => Value::List(items),
                Block::Map(map) => Value::Map(map),
            };
            self.insert_top(open.line, open.key, value)?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<ParseOutcome, ParseError> {
        self.close_open()?;
        Ok(ParseOutcome {
            metadata: self.metadata,
            warnings: self.warnings,
        })
    }
}

fn error_line(err: &ParseError) -> usize {
    match err {
        ParseError::Unterminated { .. } => 0,
        ParseError::MissingColon { line, .. }
        | ParseError::EmptyKey { line }
        | ParseError::DuplicateKey { line, .. }
        | ParseError::UnexpectedIndent { line }
        | ParseError::Unsupported { line, .. } => *line,
    }
}

fn is_list_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ") || content.starts_with("-\t")
}

/// `- key: value` or `- key:`; quoted items and inline lists are plain values.
fn is_mapping_item(raw: &str) -> bool {
    if raw.starts_with(['"', '\'', '[']) {
        return false;
    }
    let value = strip_inline_comment(raw);
    value.ends_with(':') || value.contains(": ") || value.contains(":\t")
}

/// Splits `key: value` at the first unquoted colon followed by whitespace or
/// end of line, falling back to the first unquoted colon.
fn split_key_value(content: &str) -> Option<(&str, &str)> {
    let mut fallback = None;
    let mut quote: Option<char> = None;
    for (idx, c) in content.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') if idx == 0 => quote = Some(c),
            (None, ':') => {
                let after = &content[idx + 1..];
                if after.is_empty() || after.starts_with(char::is_whitespace) {
                    return Some((content[..idx].trim(), after.trim()));
                }
                fallback.get_or_insert(idx);
            }
            _ => {}
        }
    }
    fallback.map(|idx| (content[..idx].trim(), content[idx + 1..].trim()))
}

/// Drops a trailing ` # comment` that sits outside quotes.
fn strip_inline_comment(raw: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_ws = false;
    for (idx, c) in raw.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '#' && prev_ws => return raw[..idx].trim_end(),
            None => {}
        }
        prev_ws = c.is_whitespace();
    }
    raw.trim()
}

fn parse_value(raw: &str) -> Result<Value, String> {
    match raw.chars().next() {
        Some('&') => Err("anchor".to_string()),
        Some('*') => Err("alias".to_string()),
        Some('!') => Err("tag".to_string()),
        Some('{') => Err("flow mapping".to_string()),
        Some('|') | Some('>') => Err("block scalar".to_string()),
        Some('[') => parse_inline_list(raw),
        _ => Ok(coerce_scalar(raw)),
    }
}

fn parse_inline_list(raw: &str) -> Result<Value, String> {
    let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) else {
        return Err("unterminated inline list".to_string());
    };
    let mut items = Vec::new();
    for item in split_outside_quotes(inner, ',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if item.starts_with('[') || item.starts_with('{') {
            return Err("nested collection inside inline list".to_string());
        }
        items.push(coerce_scalar(item));
    }
    Ok(Value::List(items))
}

fn split_outside_quotes(input: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, c) in input.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == sep => {
                parts.push(&input[start..idx]);
                start = idx + c.len_utf8();
            }
            None => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Coerces a trimmed scalar into its typed value.
pub fn coerce_scalar(raw: &str) -> Value {
    let s = raw.trim();
    if let Some(inner) = strip_quotes(s) {
        return Value::String(inner);
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if is_integer_literal(s) {
        if let Ok(i) = s.parse::<i64>() {
            return Value::Integer(i);
        }
    }
    if is_float_literal(s) {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::String(s.to_string())
}

fn strip_quotes(s: &str) -> Option<String> {
    if s.len() < 2 {
        return None;
    }
    if s.starts_with('"') && s.ends_with('"') {
        let inner = &s[1..s.len() - 1];
        return Some(inner.replace("\\\"", "\"").replace("\\\\", "\\"));
    }
    if s.starts_with('\'') && s.ends_with('\'') {
        return Some(s[1..s.len() - 1].replace("''", "'"));
    }
    None
}

fn unquote(key: &str) -> String {
    strip_quotes(key.trim()).unwrap_or_else(|| key.trim().to_string())
}

fn unsigned(s: &str) -> &str {
    s.strip_prefix(['-', '+']).unwrap_or(s)
}

fn is_integer_literal(s: &str) -> bool {
    let digits = unsigned(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_literal(s: &str) -> bool {
    let body = unsigned(s);
    let starts_ok = body.starts_with(|c: char| c.is_ascii_digit() || c == '.');
    starts_ok
        && body.bytes().any(|b| b.is_ascii_digit())
        && body.contains(['.', 'e', 'E'])
        && body
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(text: &str) -> ParseOutcome {
        parse(text, ParseMode::Lenient).expect("lenient parse")
    }

    #[test]
    fn parses_scalars_inline_lists_and_nested_maps() {
        let text = "name: test.sample\ntags: [a, b, c]\nnested:\n  x: 1\n  y: 2\n";
        let out = parse(text, ParseMode::Strict).unwrap();
        let meta = out.metadata;
        assert_eq!(meta.get("name"), Some(&Value::String("test.sample".into())));
        assert_eq!(
            meta.get("tags"),
            Some(&Value::List(vec![
                Value::String("a".into()),
                Value::String("b".into()),
                Value::String("c".into()),
            ]))
        );
        let nested = meta.get("nested").and_then(Value::as_map).unwrap();
        assert_eq!(nested.get("x"), Some(&Value::Integer(1)));
        assert_eq!(nested.get("y"), Some(&Value::Integer(2)));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn block_lists_at_indent_and_column_zero() {
        let meta = lenient("deps:\n  - alpha\n  - beta\nmore:\n- one\n- 2\n").metadata;
        assert_eq!(meta.get("deps").unwrap().string_items(), vec!["alpha", "beta"]);
        assert_eq!(
            meta.get("more"),
            Some(&Value::List(vec![Value::String("one".into()), Value::Integer(2)]))
        );
    }

    #[test]
    fn coerces_numbers_booleans_and_quotes() {
        let meta = lenient(
            "a: 42\nb: -3.5\nc: TRUE\nd: false\ne: \"42\"\nf: 'it''s'\ng: 1.2.3\nh: 1e3\n",
        )
        .metadata;
        assert_eq!(meta.get("a"), Some(&Value::Integer(42)));
        assert_eq!(meta.get("b"), Some(&Value::Float(-3.5)));
        assert_eq!(meta.get("c"), Some(&Value::Bool(true)));
        assert_eq!(meta.get("d"), Some(&Value::Bool(false)));
        assert_eq!(meta.get("e"), Some(&Value::String("42".into())));
        assert_eq!(meta.get("f"), Some(&Value::String("it's".into())));
        assert_eq!(meta.get("g"), Some(&Value::String("1.2.3".into())));
        assert_eq!(meta.get("h"), Some(&Value::Float(1000.0)));
    }

    #[test]
    fn values_keep_colons_and_drop_trailing_comments() {
        let meta = lenient("description: Note: works # trailing\nurl: \"a # b\"\n").metadata;
        assert_eq!(meta.text("description").unwrap(), "Note: works");
        assert_eq!(meta.text("url").unwrap(), "a # b");
    }

    #[test]
    fn inline_list_respects_quoted_commas() {
        let meta = lenient("tags: [\"a, b\", c, ]\nempty: []\n").metadata;
        assert_eq!(meta.get("tags").unwrap().string_items(), vec!["a, b", "c"]);
        assert_eq!(meta.get("empty"), Some(&Value::List(vec![])));
    }

    #[test]
    fn key_without_block_is_empty_string() {
        let meta = lenient("title:\nname: x\n").metadata;
        assert_eq!(meta.get("title"), Some(&Value::String(String::new())));
    }

    #[test]
    fn line_without_colon_warns_in_lenient_mode() {
        let out = lenient("name: a\njust some words\nother: b\n");
        assert_eq!(out.metadata.len(), 2);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].line, 2);
    }

    #[test]
    fn line_without_colon_fails_in_strict_mode() {
        let err = parse("name: a\njust some words\n", ParseMode::Strict).unwrap_err();
        assert!(matches!(err, ParseError::MissingColon { line: 2, .. }));
    }

    #[test]
    fn unsupported_constructs_fail_loudly_in_strict_mode() {
        let cases = [
            "base: &anchor value\n",
            "copy: *anchor\n",
            "map: {a: 1}\n",
            "text: |\n  block\n",
            "outer:\n  inner:\n    deep: 1\n",
            "outer:\n  a: 1\n    b: 2\n",
            "examples:\n  - title: Review a PR\n",
            "steps:\n- setup:\n",
        ];
        for case in cases {
            let err = parse(case, ParseMode::Strict).unwrap_err();
            assert!(
                matches!(err, ParseError::Unsupported { .. }),
                "expected unsupported for {:?}, got {:?}",
                case,
                err
            );
        }
    }

    #[test]
    fn unsupported_constructs_are_skipped_in_lenient_mode() {
        let out = lenient("base: &anchor value\nname: ok\n");
        assert!(out.metadata.get("base").is_none());
        assert_eq!(out.metadata.text("name").unwrap(), "ok");
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn list_items_keep_urls_and_quoted_colons() {
        let out = parse(
            "links:\n  - https://example.com/a\n  - \"note: quoted\"\n",
            ParseMode::Strict,
        )
        .unwrap();
        assert_eq!(
            out.metadata.get("links").unwrap().string_items(),
            vec!["https://example.com/a", "note: quoted"]
        );

        let out = lenient("examples:\n  - title: Review a PR\n  - plain\n");
        assert_eq!(out.metadata.get("examples").unwrap().string_items(), vec!["plain"]);
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].line, 2);
    }

    #[test]
    fn duplicate_keys_last_wins_leniently_and_fail_strictly() {
        let out = lenient("a: 1\na: 2\n");
        assert_eq!(out.metadata.get("a"), Some(&Value::Integer(2)));
        assert_eq!(out.warnings.len(), 1);
        assert!(matches!(
            parse("a: 1\na: 2\n", ParseMode::Strict),
            Err(ParseError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn mixing_list_items_and_entries_is_rejected() {
        let err = parse("x:\n  - a\n  b: 1\n", ParseMode::Strict).unwrap_err();
        assert!(matches!(err, ParseError::Unsupported { line: 3, .. }));
    }

    #[test]
    fn stray_indentation_is_reported() {
        let err = parse("  name: x\n", ParseMode::Strict).unwrap_err();
        assert_eq!(err, ParseError::UnexpectedIndent { line: 1 });
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let out = lenient("# heading\n\nname: a\n\n  # indented comment\n");
        assert_eq!(out.metadata.len(), 1);
        assert!(out.warnings.is_empty());
    }
}
