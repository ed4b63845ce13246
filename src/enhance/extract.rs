//! Best-effort JSON recovery from model output.
//!
//! Local small models frequently wrap JSON in prose, markdown fences, or emit
//! near-valid JSON. A single strict parse is not enough, so extraction runs an
//! ordered cascade of strategies; the first one that yields an object wins:
//!
//! 1. Parse the trimmed text directly.
//! 2. Strip markdown code fences and parse the inner span.
//! 3. Brace-depth scan from the first `{`, ignoring braces inside strings.
//! 4. Take the first-`{`-to-last-`}` span, apply light repairs, parse.
//! 5. Regex-extract individual known fields and assemble a partial object.
//!
//! Returns `None` only when no structure at all can be recovered. Never panics.

use regex::Regex;
use serde_json::{Map, Number, Value};

/// Recover a JSON object from arbitrary response text.
pub fn extract_json(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    parse_object(trimmed)
        .or_else(|| strip_code_fences(trimmed).and_then(|inner| parse_object(&inner)))
        .or_else(|| balanced_object(trimmed).and_then(parse_object))
        .or_else(|| repaired_span(trimmed).and_then(|fixed| parse_object(&fixed)))
        .or_else(|| scavenge_fields(trimmed))
}

/// Strict parse; succeeds only for a top-level JSON object.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Strategy 2: pull the body out of a ```json fenced block, or strip bare
/// leading/trailing fence markers.
fn strip_code_fences(text: &str) -> Option<String> {
    let fenced = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").ok()?;
    if let Some(captures) = fenced.captures(text) {
        return Some(captures[1].trim().to_string());
    }

    // Opening fence with no closing one.
    let stripped = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))?;
    Some(stripped.trim().trim_end_matches("```").trim().to_string())
}

/// Strategy 3: locate the `}` matching the first `{`, honoring quoted strings
/// and escape sequences.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, byte) in text.bytes().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strategy 4: span between the first `{` and the last `}` with light repairs.
fn repaired_span(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(repair_json(&text[start..=end]))
}

/// Remove trailing commas and close unterminated strings on lines with an odd
/// number of unescaped quotes.
fn repair_json(span: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    for line in span.lines() {
        let mut quotes = 0usize;
        let mut escaped = false;
        for c in line.chars() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                quotes += 1;
            }
        }
        if quotes % 2 == 1 {
            let trimmed = line.trim_end();
            match trimmed.strip_suffix(',') {
                Some(head) => lines.push(format!("{}\",", head)),
                None => lines.push(format!("{}\"", trimmed)),
            }
        } else {
            lines.push(line.to_string());
        }
    }
    let joined = lines.join("\n");

    match Regex::new(r",\s*([}\]])") {
        Ok(trailing_comma) => trailing_comma.replace_all(&joined, "$1").into_owned(),
        Err(_) => joined,
    }
}

/// Strategy 5: last resort. Pull whatever known fields appear in the raw text
/// and assemble a partial object; succeeds if at least one field is recovered.
fn scavenge_fields(text: &str) -> Option<Map<String, Value>> {
    let mut map = Map::new();

    if let Some(title) = capture_string(text, "title") {
        map.insert("title".to_string(), Value::String(title));
    }
    if let Some(desc) = capture_string(text, "descriptions?") {
        map.insert("descriptions".to_string(), Value::String(desc));
    }
    if let Some(reasoning) = capture_string(text, "reasoning") {
        map.insert("reasoning".to_string(), Value::String(reasoning));
    }

    let mut category = Map::new();
    if let Some(name) = capture_nested(text, "category", "name") {
        category.insert("name".to_string(), Value::String(name));
    }
    if let Some(color) = capture_nested(text, "category", "color") {
        category.insert("color".to_string(), Value::String(color));
    }
    if !category.is_empty() {
        map.insert("category".to_string(), Value::Object(category));
    }

    if let Some(score) = capture_number(text, "priority_score") {
        if let Some(n) = Number::from_f64(score) {
            map.insert("priority_score".to_string(), Value::Number(n));
        }
    }
    if let Some(confidence) = capture_number(text, "confidence") {
        if let Some(n) = Number::from_f64(confidence) {
            map.insert("confidence".to_string(), Value::Number(n));
        }
    }
    if let Some(days) = capture_days(text) {
        map.insert("deadline".to_string(), Value::Number(days.into()));
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn capture_string(text: &str, key_pattern: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, key_pattern);
    let re = Regex::new(&pattern).ok()?;
    let raw = re.captures(text)?.get(1)?.as_str();
    Some(raw.replace("\\\"", "\"").replace("\\n", "\n"))
}

fn capture_nested(text: &str, outer: &str, inner: &str) -> Option<String> {
    let pattern = format!(
        r#""{}"\s*:\s*\{{[^}}]*?"{}"\s*:\s*"([^"]*)""#,
        outer, inner
    );
    let re = Regex::new(&pattern).ok()?;
    Some(re.captures(text)?.get(1)?.as_str().to_string())
}

fn capture_number(text: &str, key: &str) -> Option<f64> {
    let pattern = format!(r#""{}"\s*:\s*"?(-?[0-9]*\.?[0-9]+)"?"#, key);
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn capture_days(text: &str) -> Option<i64> {
    let re = Regex::new(r#""deadline"\s*:\s*"?([0-9]+)"?"#).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}
