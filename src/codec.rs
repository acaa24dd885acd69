//! The restricted JSON dialect used on the wire and in the persisted
//! snapshot file: flat objects of string-keyed scalar values, or arrays of
//! such objects. Not a general JSON parser — there is no nesting, no
//! booleans, no `null`. The decoder is a position-tracked scanner over the
//! input, in the spirit of a buffer cursor, rather than building a generic
//! value tree.

use crate::errors::{FabricError, FabricResult};
use indexmap::IndexMap;

/// An ordered mapping from string keys to string values. Numeric-looking
/// values are rendered unquoted on the wire; everything else is quoted.
/// Internally every value is kept as the exact text it was constructed or
/// decoded from, so `decode(encode(x)) == x` holds without renormalizing
/// numeric literals.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record(IndexMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id")
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(IndexMap::from_iter(iter))
    }
}

/// True iff `s` parses as a finite decimal number (not NaN, not infinite,
/// not empty).
fn is_finite_decimal(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    matches!(s.parse::<f64>(), Ok(n) if n.is_finite())
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}

/// Encode a single flat record as `{\n  "key": value,\n  ...\n}`.
pub fn encode_record(record: &Record) -> String {
    let mut out = String::new();
    out.push('{');
    out.push('\n');
    let last = record.len().saturating_sub(1);
    for (i, (key, value)) in record.iter().enumerate() {
        out.push_str("  \"");
        escape_into(&mut out, key);
        out.push_str("\": ");
        if is_finite_decimal(value) {
            out.push_str(value);
        } else {
            out.push('"');
            escape_into(&mut out, value);
            out.push('"');
        }
        if i != last {
            out.push(',');
        }
        out.push('\n');
    }
    out.push('}');
    out
}

/// Encode an array of records as `[<obj>,<obj>,...]`.
pub fn encode_records(records: &[Record]) -> String {
    let mut out = String::new();
    out.push('[');
    let last = records.len().saturating_sub(1);
    for (i, record) in records.iter().enumerate() {
        out.push_str(&encode_record(record));
        if i != last {
            out.push(',');
        }
    }
    out.push(']');
    out
}

/// Unescape the interior of a quoted string (the slice between, not
/// including, the surrounding `"` characters).
fn unescape(inner: &str) -> FabricResult<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('/') => out.push('/'),
                Some('b') => out.push('\u{8}'),
                Some('f') => out.push('\u{c}'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('u') => {
                    let hex: String = (0..4)
                        .map(|_| chars.next())
                        .collect::<Option<String>>()
                        .ok_or_else(|| FabricError::malformed_string("truncated \\u escape"))?;
                    let code = u32::from_str_radix(&hex, 16)
                        .map_err(|_| FabricError::malformed_string("invalid \\u escape"))?;
                    out.push(
                        char::from_u32(code)
                            .ok_or_else(|| FabricError::malformed_string("invalid \\u codepoint"))?,
                    );
                }
                _ => return Err(FabricError::malformed_string("unknown escape sequence")),
            },
            '"' => return Err(FabricError::malformed_string("unescaped quote in string")),
            c => out.push(c),
        }
    }
    Ok(out)
}

fn decode_quoted(raw: &str) -> FabricResult<String> {
    if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
        return Err(FabricError::malformed_string(format!(
            "unterminated string: {raw}"
        )));
    }
    unescape(&raw[1..raw.len() - 1])
}

fn decode_value(raw: &str) -> FabricResult<String> {
    if raw.starts_with('"') {
        decode_quoted(raw)
    } else if is_finite_decimal(raw) {
        Ok(raw.to_string())
    } else {
        Err(FabricError::malformed_number(format!(
            "not a finite decimal: {raw}"
        )))
    }
}

/// Split `s` on top-level commas: commas that are not inside a quoted
/// string. A `"` preceded by an unescaped `\` does not toggle string mode.
fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            ',' if !in_string => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Decode a single flat object. Rejects `{}`, requires outer braces,
/// requires every key/value pair to be well-formed.
pub fn decode_record(text: &str) -> FabricResult<Record> {
    let trimmed = text.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') || trimmed.len() < 2 {
        return Err(FabricError::malformed_structure(
            "expected an object wrapped in { }",
        ));
    }
    let inner = trimmed[1..trimmed.len() - 1].trim();
    if inner.is_empty() {
        return Err(FabricError::malformed_structure("empty object"));
    }

    let mut record = Record::new();
    for raw_pair in split_top_level_commas(inner) {
        let pair = raw_pair.trim();
        if pair.is_empty() {
            return Err(FabricError::malformed_structure(
                "empty pair (trailing comma?)",
            ));
        }
        let colon = pair
            .find(':')
            .ok_or_else(|| FabricError::malformed_structure("pair missing ':'"))?;
        let raw_key = pair[..colon].trim();
        let raw_value = pair[colon + 1..].trim();
        if raw_key.is_empty() || raw_value.is_empty() {
            return Err(FabricError::malformed_structure("empty key or value"));
        }
        let key = decode_quoted(raw_key)?;
        let value = decode_value(raw_value)?;
        record.insert(key, value);
    }
    Ok(record)
}

/// Find the span of each top-level `{...}` object in `s`, respecting quoted
/// strings (an escaped `"` does not end a string, braces inside a string
/// don't count).
fn split_top_level_objects(s: &str) -> FabricResult<Vec<&str>> {
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    let mut depth = 0usize;
    let mut start = None;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string => {
                if depth == 0 {
                    return Err(FabricError::malformed_structure("unmatched '}'"));
                }
                depth -= 1;
                if depth == 0 {
                    let begin = start.take().expect("depth tracked begin index");
                    spans.push(&s[begin..=i]);
                }
            }
            _ => {}
        }
    }
    if depth != 0 || in_string {
        return Err(FabricError::malformed_structure(
            "unterminated object or string in array",
        ));
    }
    Ok(spans)
}

/// Decode an array of flat objects, preserving order.
pub fn decode_records(text: &str) -> FabricResult<Vec<Record>> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') || trimmed.len() < 2 {
        return Err(FabricError::malformed_structure(
            "expected an array wrapped in [ ]",
        ));
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    split_top_level_objects(inner)?
        .into_iter()
        .map(decode_record)
        .collect()
}
