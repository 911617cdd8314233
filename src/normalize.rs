//! Total value parsers for loosely typed spreadsheet cells.
//!
//! None of the functions here fail: malformed currency text becomes `0.0`,
//! malformed percentages become `None` and missing columns resolve to `None`.

use serde_json::{Map, Value};

/// One spreadsheet row keyed by its (unnormalized) column header.
pub type RawRow = Map<String, Value>;

/// Parses `"$33,327,940"`, `"$(1,607,943)"` or a numeric cell into a signed amount.
pub fn parse_currency(raw: Option<&Value>) -> f64 {
    match raw {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(Value::String(text)) => parse_currency_text(text),
        Some(Value::Bool(_)) | Some(Value::Array(_)) | Some(Value::Object(_)) => 0.0,
        Some(Value::Null) | None => 0.0,
    }
}

pub fn parse_currency_text(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let cleaned: String = text.chars().filter(|c| *c != '$' && *c != ',').collect();
    if cleaned.contains('(') && cleaned.contains(')') {
        let magnitude: String = cleaned.chars().filter(|c| *c != '(' && *c != ')').collect();
        return parse_float_prefix(&magnitude).map(|v| -v).unwrap_or(0.0);
    }

    parse_float_prefix(&cleaned).unwrap_or(0.0)
}

/// Parses `"2443%"` or a numeric cell. Blank cells and formula errors (`#DIV/0!`,
/// `#N/A`, ...) yield `None`.
pub fn parse_percentage(raw: Option<&Value>) -> Option<f64> {
    match raw? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(text) => parse_percentage_text(text),
        _ => None,
    }
}

pub fn parse_percentage_text(text: &str) -> Option<f64> {
    if text.is_empty() || is_formula_error(text) {
        return None;
    }
    parse_float_prefix(&text.replacen('%', "", 1))
}

/// Spreadsheet formula errors are exported as text starting with `#`.
pub fn is_formula_error(text: &str) -> bool {
    text.starts_with('#')
}

/// Looks a column up by its candidate header names.
///
/// Exact matches are tried first in candidate order, then a case-insensitive,
/// whitespace-trimmed comparison against every header present in the row.
pub fn resolve_column<'a>(row: &'a RawRow, candidates: &[&str]) -> Option<&'a Value> {
    if let Some(value) = candidates.iter().find_map(|name| row.get(*name)) {
        return Some(value);
    }

    candidates.iter().find_map(|name| {
        let wanted = name.trim().to_lowercase();
        row.iter()
            .find(|(key, _)| key.trim().to_lowercase() == wanted)
            .map(|(_, value)| value)
    })
}

/// Renders a cell as text, blank for missing or null cells.
pub fn cell_text(raw: Option<&Value>) -> String {
    match raw {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(n)) => format_number(n),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
        Some(v) => format!("{}", v),
        None => n.to_string(),
    }
}

/// Parses the longest leading decimal literal of `text`, ignoring leading
/// whitespace and any trailing garbage (`"12.5abc"` parses as `12.5`).
pub(crate) fn parse_float_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac_end = end + 1;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
