//! Parser and generator for the SKILL.md metadata block.
//!
//! A manifest starts with a `---` delimiter line, carries a restricted
//! YAML-style mapping, and closes with a second `---`; everything after the
//! closing delimiter is the free-form instructions body. The supported
//! grammar is deliberately small so behavior stays predictable:
//!
//! - `key: value` pairs with bare keys
//! - scalars: bare or quoted strings, `true`/`false`/`yes`/`no` booleans
//!   (case-insensitive), `null`/`~`, integers, floats
//! - inline lists `[a, b]`, nesting allowed
//! - block lists (`- item`), including list-of-mapping entries
//! - nested mappings through two-space style indentation
//! - full-line `#` comments and blank lines, which are ignored
//!
//! Double-quoted strings understand `\\`, `\"`, `\n`, and `\t` escapes;
//! single-quoted strings are literal. Tabs in indentation, block scalars
//! (`|`/`>`), anchors, and inline `{key: value}` mappings are rejected or
//! unsupported. Every shape [`parse`] can produce is representable by
//! [`generate`], so generated manifests re-parse to equal metadata.

use serde_json::{Map, Value};
use std::fmt::Write as _;

use crate::error::SkillError;

/// Delimiter line opening and closing the metadata block.
pub const DELIMITER: &str = "---";

/// Canonical order for well-known manifest fields in generated output.
/// Unknown fields follow in map iteration order.
const FIELD_ORDER: [&str; 9] = [
    "name",
    "description",
    "license",
    "version",
    "compatibility",
    "dependencies",
    "metadata",
    "disable-model-invocation",
    "mode",
];

/// Result of splitting a manifest into metadata and instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedManifest {
    pub metadata: Map<String, Value>,
    pub body: String,
}

struct Line<'a> {
    number: usize,
    indent: usize,
    text: &'a str,
}

/// Parse a SKILL.md document into metadata and instructions body.
///
/// # Errors
///
/// Returns [`SkillError::MalformedInput`] when the opening delimiter is
/// missing or a block line does not fit the grammar, and
/// [`SkillError::UnterminatedBlock`] when the closing delimiter is absent.
pub fn parse(content: &str) -> Result<ParsedManifest, SkillError> {
    let content = content.trim_start();
    let raw: Vec<&str> = content.lines().collect();
    if raw.first().map(|l| l.trim()) != Some(DELIMITER) {
        return Err(SkillError::MalformedInput(
            "missing opening '---' delimiter".into(),
        ));
    }

    let Some(close) = raw[1..].iter().position(|l| l.trim() == DELIMITER) else {
        return Err(SkillError::UnterminatedBlock(
            "no closing '---' delimiter".into(),
        ));
    };
    let close = close + 1;

    let lines = collect_lines(&raw[1..close])?;
    let mut pos = 0;
    let metadata = if lines.is_empty() {
        Map::new()
    } else {
        parse_mapping(&lines, &mut pos, lines[0].indent)?
    };
    if pos < lines.len() {
        return Err(SkillError::MalformedInput(format!(
            "unexpected indentation on line {}",
            lines[pos].number
        )));
    }

    let body = raw[close + 1..].join("\n").trim().to_string();
    Ok(ParsedManifest { metadata, body })
}

/// Render metadata back into a delimited block, ready to prepend to an
/// instructions body. Output from [`generate`] re-parses to an equal
/// metadata map for every shape the block grammar can write. The exception
/// is a non-empty mapping nested inside an inner list: there is no written
/// form for it, so the value is emitted as its JSON text and comes back as
/// a string.
#[must_use]
pub fn generate(metadata: &Map<String, Value>) -> String {
    let mut out = String::from("---\n");
    for key in FIELD_ORDER {
        if let Some(value) = metadata.get(key) {
            write_key_value(&mut out, "", key, value, 2);
        }
    }
    for (key, value) in metadata {
        if !FIELD_ORDER.contains(&key.as_str()) {
            write_key_value(&mut out, "", key, value, 2);
        }
    }
    out.push_str("---\n");
    out
}

fn collect_lines<'a>(block: &[&'a str]) -> Result<Vec<Line<'a>>, SkillError> {
    let mut lines = Vec::with_capacity(block.len());
    for (idx, raw) in block.iter().enumerate() {
        let number = idx + 2;
        let text = raw.trim_end();
        let stripped = text.trim_start();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let leading = &text[..text.len() - stripped.len()];
        if leading.contains('\t') {
            return Err(SkillError::MalformedInput(format!(
                "tab indentation on line {number}"
            )));
        }
        lines.push(Line {
            number,
            indent: leading.len(),
            text: stripped,
        });
    }
    Ok(lines)
}

fn parse_mapping(
    lines: &[Line<'_>],
    pos: &mut usize,
    indent: usize,
) -> Result<Map<String, Value>, SkillError> {
    let mut map = Map::new();
    while let Some(line) = lines.get(*pos) {
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(SkillError::MalformedInput(format!(
                "unexpected indentation on line {}",
                line.number
            )));
        }
        if is_list_item(line.text) {
            return Err(SkillError::MalformedInput(format!(
                "list item outside a list on line {}",
                line.number
            )));
        }
        let Some((key, rest)) = split_key(line.text) else {
            return Err(SkillError::MalformedInput(format!(
                "expected 'key: value' on line {}",
                line.number
            )));
        };
        let number = line.number;
        *pos += 1;
        let value = if rest.is_empty() {
            nested_value(lines, pos, indent)?
        } else {
            parse_scalar(rest, number)?
        };
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

/// Parse the block belonging to a key (or dash) with an empty value: a
/// deeper list or mapping if one follows, otherwise null.
fn nested_value(
    lines: &[Line<'_>],
    pos: &mut usize,
    parent_indent: usize,
) -> Result<Value, SkillError> {
    match lines.get(*pos) {
        Some(next) if next.indent > parent_indent => {
            if is_list_item(next.text) {
                Ok(Value::Array(parse_list(lines, pos, next.indent)?))
            } else {
                Ok(Value::Object(parse_mapping(lines, pos, next.indent)?))
            }
        }
        _ => Ok(Value::Null),
    }
}

fn parse_list(
    lines: &[Line<'_>],
    pos: &mut usize,
    indent: usize,
) -> Result<Vec<Value>, SkillError> {
    let mut items = Vec::new();
    while let Some(line) = lines.get(*pos) {
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(SkillError::MalformedInput(format!(
                "unexpected indentation on line {}",
                line.number
            )));
        }
        let Some(rest) = item_text(line.text) else {
            return Err(SkillError::MalformedInput(format!(
                "expected '- ' list item on line {}",
                line.number
            )));
        };
        let item_indent = indent + (line.text.len() - rest.len());
        let number = line.number;
        *pos += 1;
        if rest.is_empty() {
            items.push(nested_value(lines, pos, indent)?);
        } else if let Some((key, value_text)) = split_key(rest) {
            items.push(Value::Object(parse_item_mapping(
                lines, pos, item_indent, key, value_text, number,
            )?));
        } else {
            items.push(parse_scalar(rest, number)?);
        }
    }
    Ok(items)
}

/// A list item whose dash line starts a mapping. Continuation keys sit at
/// the same column as the first key, directly below it.
fn parse_item_mapping(
    lines: &[Line<'_>],
    pos: &mut usize,
    item_indent: usize,
    first_key: &str,
    first_value: &str,
    number: usize,
) -> Result<Map<String, Value>, SkillError> {
    let mut map = Map::new();
    let value = if first_value.is_empty() {
        nested_value(lines, pos, item_indent)?
    } else {
        parse_scalar(first_value, number)?
    };
    map.insert(first_key.to_string(), value);

    while let Some(line) = lines.get(*pos) {
        if line.indent != item_indent || is_list_item(line.text) {
            break;
        }
        let Some((key, rest)) = split_key(line.text) else {
            return Err(SkillError::MalformedInput(format!(
                "expected 'key: value' on line {}",
                line.number
            )));
        };
        let number = line.number;
        *pos += 1;
        let value = if rest.is_empty() {
            nested_value(lines, pos, item_indent)?
        } else {
            parse_scalar(rest, number)?
        };
        map.insert(key.to_string(), value);
    }
    Ok(map)
}

fn is_list_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

fn item_text(text: &str) -> Option<&str> {
    let rest = text.strip_prefix('-')?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.starts_with(' ').then(|| rest.trim_start())
}

/// Split a line at the first colon that ends the key, skipping colons
/// inside quotes or glued to the value (`https://...` is not a key).
fn split_key(text: &str) -> Option<(&str, &str)> {
    let mut in_single = false;
    let mut in_double = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            ':' if !in_single && !in_double => {
                let after = &text[idx + 1..];
                if after.is_empty() || after.starts_with(' ') {
                    let key = strip_quotes(text[..idx].trim());
                    if key.is_empty() {
                        return None;
                    }
                    return Some((key, after.trim()));
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_quotes(s: &str) -> &str {
    let b = s.as_bytes();
    if b.len() >= 2 && (b[0] == b'"' || b[0] == b'\'') && b[b.len() - 1] == b[0] {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn parse_scalar(text: &str, number: usize) -> Result<Value, SkillError> {
    let text = text.trim();
    if text.starts_with('[') {
        return parse_inline_list(text, number);
    }
    if text == "{}" {
        return Ok(Value::Object(Map::new()));
    }
    if let Some(unquoted) = unquote(text, number)? {
        return Ok(Value::String(unquoted));
    }
    Ok(plain_scalar(text))
}

fn plain_scalar(text: &str) -> Value {
    if text == "~" || text.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("yes") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("no") {
        return Value::Bool(false);
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Number(n.into());
    }
    if looks_numeric(text)
        && let Ok(f) = text.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(f)
    {
        return Value::Number(n);
    }
    Value::String(text.to_string())
}

fn looks_numeric(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'.' | b'+' | b'-' | b'e' | b'E'))
}

fn unquote(text: &str, number: usize) -> Result<Option<String>, SkillError> {
    let bytes = text.as_bytes();
    if bytes.len() < 2 {
        return Ok(None);
    }
    match bytes[0] {
        b'"' => {
            if bytes[bytes.len() - 1] != b'"' {
                return Err(SkillError::MalformedInput(format!(
                    "unterminated quoted string on line {number}"
                )));
            }
            let inner = &text[1..text.len() - 1];
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(ch) = chars.next() {
                if ch != '\\' {
                    out.push(ch);
                    continue;
                }
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => {
                        return Err(SkillError::MalformedInput(format!(
                            "dangling escape on line {number}"
                        )));
                    }
                }
            }
            Ok(Some(out))
        }
        b'\'' => {
            if bytes[bytes.len() - 1] != b'\'' {
                return Err(SkillError::MalformedInput(format!(
                    "unterminated quoted string on line {number}"
                )));
            }
            Ok(Some(text[1..text.len() - 1].to_string()))
        }
        _ => Ok(None),
    }
}

fn parse_inline_list(text: &str, number: usize) -> Result<Value, SkillError> {
    if !text.ends_with(']') {
        return Err(SkillError::MalformedInput(format!(
            "unterminated inline list on line {number}"
        )));
    }
    let inner = &text[1..text.len() - 1];
    if inner.trim().is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    let mut items = Vec::new();
    for part in split_inline(inner) {
        let part = part.trim();
        if part.is_empty() {
            return Err(SkillError::MalformedInput(format!(
                "empty element in inline list on line {number}"
            )));
        }
        items.push(parse_scalar(part, number)?);
    }
    Ok(Value::Array(items))
}

/// Split inline list elements at top-level commas, respecting quotes and
/// nested brackets.
fn split_inline(inner: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_single = false;
    let mut in_double = false;
    let mut start = 0usize;
    for (idx, ch) in inner.char_indices() {
        match ch {
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            '[' if !in_single && !in_double => depth += 1,
            ']' if !in_single && !in_double => depth = depth.saturating_sub(1),
            ',' if !in_single && !in_double && depth == 0 => {
                parts.push(&inner[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&inner[start..]);
    parts
}

fn write_key_value(out: &mut String, lead: &str, key: &str, value: &Value, child_indent: usize) {
    match value {
        Value::Object(map) if map.is_empty() => {
            let _ = writeln!(out, "{lead}{key}: {{}}");
        }
        Value::Object(map) => {
            let _ = writeln!(out, "{lead}{key}:");
            write_map_body(out, map, child_indent);
        }
        Value::Array(items) if !inline_safe(items) => {
            let _ = writeln!(out, "{lead}{key}:");
            write_list(out, items, child_indent);
        }
        other => {
            let _ = writeln!(out, "{lead}{key}: {}", render_inline(other));
        }
    }
}

fn write_map_body(out: &mut String, map: &Map<String, Value>, indent: usize) {
    let pad = " ".repeat(indent);
    for (key, value) in map {
        write_key_value(out, &pad, key, value, indent + 2);
    }
}

fn write_list(out: &mut String, items: &[Value], indent: usize) {
    let pad = " ".repeat(indent);
    for item in items {
        match item {
            Value::Object(map) if !map.is_empty() => {
                let mut first = true;
                for (key, value) in map {
                    let lead = if first {
                        format!("{pad}- ")
                    } else {
                        format!("{pad}  ")
                    };
                    first = false;
                    write_key_value(out, &lead, key, value, indent + 4);
                }
            }
            other => {
                let _ = writeln!(out, "{pad}- {}", render_inline(other));
            }
        }
    }
}

/// True when every leaf is a scalar, so the list can render inline.
fn inline_safe(items: &[Value]) -> bool {
    items.iter().all(|v| match v {
        Value::Array(inner) => inline_safe(inner),
        Value::Object(map) => map.is_empty(),
        _ => true,
    })
}

fn render_inline(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => render_string(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(render_inline).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        // Mappings have no inline form in the grammar; degrade to JSON text.
        Value::Object(_) => render_string(&value.to_string()),
    }
}

fn render_string(s: &str) -> String {
    if !needs_quoting(s) {
        return s.to_string();
    }
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for ch in s.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// A bare rendering is safe only when it re-parses to the same string:
/// no quote or bracket characters, no colon that would read as a key, no
/// leading/trailing whitespace, and not a bool/null/number form.
fn needs_quoting(s: &str) -> bool {
    if s.is_empty() || s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace) {
        return true;
    }
    if s.contains(['\n', '\t', '"', '\'', '[', ']', '{', '}', ',']) {
        return true;
    }
    if s.ends_with(':') || s.contains(": ") {
        return true;
    }
    !matches!(plain_scalar(s), Value::String(_))
}
