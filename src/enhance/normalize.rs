//! Response normalization: turn a possibly partial or malformed parsed mapping
//! into a fully populated, schema-correct record. This stage never fails and
//! never returns a partial record; every field gets a type-correct,
//! range-correct value.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::{Map, Number, Value};

use super::types::CategoryGuess;

/// Color assigned to the default `general` category and to category guesses
/// that arrive without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#3B82F6";
/// Category used whenever the model offered nothing usable.
pub const DEFAULT_CATEGORY_NAME: &str = "general";
/// Title used when both the model and the caller supplied an empty name.
pub const UNTITLED: &str = "Untitled Task";
/// Reasoning text for records the normalizer had to assemble itself.
pub const DEFAULT_REASONING: &str = "AI analysis completed";

/// Timestamp format used for deadlines, matching the REST layer.
pub const DEADLINE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const DEFAULT_PRIORITY: f64 = 0.5;
const DEFAULT_CONFIDENCE: f64 = 0.8;
const DEFAULT_DEADLINE_DAYS: i64 = 3;
const MIN_DEADLINE_DAYS: i64 = 1;
const MAX_DEADLINE_DAYS: i64 = 30;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_REASONING_CHARS: usize = 500;

/// Generic action-plan sentences shown when no usable description text exists,
/// so the user never sees an empty or error-looking description.
const FALLBACK_TEMPLATES: [&str; 12] = [
    "Set aside focused time for \"{task}\" and work through it step by step until it is done.",
    "Start \"{task}\" by deciding what a finished result looks like, then tackle the pieces in order.",
    "Block out time for \"{task}\", gather anything you need first, and finish with a quick review.",
    "Approach \"{task}\" in small stages: prepare, do the work, then double-check the outcome.",
    "Plan \"{task}\" for your next free slot and clear away distractions before starting.",
    "Break \"{task}\" into two or three concrete steps and complete them one at a time.",
    "Begin \"{task}\" with the most important part first, then wrap up the remaining details.",
    "Schedule \"{task}\" soon, note any blockers up front, and resolve them before diving in.",
    "Work on \"{task}\" with a clear goal in mind and confirm the result meets it before closing out.",
    "Give \"{task}\" a dedicated session: outline the approach, do the work, and verify the result.",
    "Handle \"{task}\" by choosing the first concrete action now and building momentum from there.",
    "Treat \"{task}\" as a short project: define done, do the work, and tick it off.",
];

/// Fully populated, range-valid record produced by [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTask {
    pub title: String,
    pub description: String,
    pub category: CategoryGuess,
    pub priority_score: f64,
    /// Absolute timestamp, `now + timeframe_days`.
    pub deadline: String,
    /// The day offset the deadline was derived from, clamped to 1..=30.
    pub timeframe_days: i64,
    pub confidence: f64,
    pub reasoning: String,
}

/// Pick a templated action-plan sentence embedding the task name.
pub fn creative_description<R: Rng + ?Sized>(task_name: &str, rng: &mut R) -> String {
    let template = FALLBACK_TEMPLATES
        .choose(rng)
        .copied()
        .unwrap_or(FALLBACK_TEMPLATES[0]);
    template.replace("{task}", task_name)
}

/// Produce a fully populated record from whatever the extractor recovered.
///
/// `parsed = None` (no structure recovered at all) synthesizes a complete
/// fallback record. Randomness is injected so tests can seed it.
pub fn normalize<R: Rng + ?Sized>(
    parsed: Option<Map<String, Value>>,
    task_name: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> NormalizedTask {
    let fixed = match parsed {
        Some(map) => fix_response(map, task_name, rng),
        None => fallback_record(task_name, rng),
    };
    resolve(fixed, task_name, now)
}

/// Fill every required field of a parsed mapping with a type-correct,
/// range-correct value. Idempotent: an already-fixed mapping passes through
/// unchanged.
pub fn fix_response<R: Rng + ?Sized>(
    mut data: Map<String, Value>,
    task_name: &str,
    rng: &mut R,
) -> Map<String, Value> {
    // Title: non-empty string, original input wins over nothing.
    let title_ok = data
        .get("title")
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    if !title_ok {
        data.insert("title".to_string(), Value::String(fallback_title(task_name)));
    }

    // Description: accept `description` as an alias, collapse lists to their
    // first element, fall back to a templated sentence.
    let raw_description = data
        .remove("descriptions")
        .or_else(|| data.remove("description"));
    let description = match raw_description {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::Array(items)) => items
            .into_iter()
            .find_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s),
                _ => None,
            })
            .unwrap_or_else(|| creative_description(task_name, rng)),
        _ => creative_description(task_name, rng),
    };
    data.insert(
        "descriptions".to_string(),
        Value::String(truncate_chars(&description, MAX_DESCRIPTION_CHARS)),
    );

    // Category: wrap strings, replace non-mappings, fill missing keys without
    // discarding anything else the model put there.
    let category = match data.remove("category") {
        Some(Value::String(name)) => {
            let mut map = Map::new();
            map.insert("name".to_string(), Value::String(name));
            map.insert(
                "color".to_string(),
                Value::String(DEFAULT_CATEGORY_COLOR.to_string()),
            );
            map
        }
        Some(Value::Object(mut map)) => {
            map.entry("name".to_string())
                .or_insert_with(|| Value::String(DEFAULT_CATEGORY_NAME.to_string()));
            map.entry("color".to_string())
                .or_insert_with(|| Value::String(DEFAULT_CATEGORY_COLOR.to_string()));
            map
        }
        _ => default_category(),
    };
    data.insert("category".to_string(), Value::Object(category));

    // Scores: numeric coercion, default on failure, clamp to [0, 1].
    for (field, default) in [
        ("priority_score", DEFAULT_PRIORITY),
        ("confidence", DEFAULT_CONFIDENCE),
    ] {
        let value = data
            .get(field)
            .and_then(coerce_f64)
            .unwrap_or(default)
            .clamp(0.0, 1.0);
        data.insert(field.to_string(), number(value));
    }

    // Deadline: integer day offset, clamped to the 1..=30 band the prompt asks for.
    let days = data
        .get("deadline")
        .and_then(coerce_days)
        .unwrap_or(DEFAULT_DEADLINE_DAYS)
        .clamp(MIN_DEADLINE_DAYS, MAX_DEADLINE_DAYS);
    data.insert("deadline".to_string(), Value::Number(days.into()));

    // Reasoning: bounded string.
    let reasoning = match data.get("reasoning").and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => truncate_chars(s, MAX_REASONING_CHARS),
        _ => DEFAULT_REASONING.to_string(),
    };
    data.insert("reasoning".to_string(), Value::String(reasoning));

    data
}

/// Synthesize a complete record with no model input at all.
fn fallback_record<R: Rng + ?Sized>(task_name: &str, rng: &mut R) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("title".to_string(), Value::String(fallback_title(task_name)));
    data.insert(
        "descriptions".to_string(),
        Value::String(creative_description(task_name, rng)),
    );
    data.insert("category".to_string(), Value::Object(default_category()));
    data.insert("priority_score".to_string(), number(DEFAULT_PRIORITY));
    data.insert(
        "deadline".to_string(),
        Value::Number(DEFAULT_DEADLINE_DAYS.into()),
    );
    data.insert("confidence".to_string(), number(DEFAULT_CONFIDENCE));
    data.insert(
        "reasoning".to_string(),
        Value::String(DEFAULT_REASONING.to_string()),
    );
    data
}

/// Convert a fixed mapping into the typed record, resolving the day offset to
/// an absolute timestamp.
fn resolve(data: Map<String, Value>, task_name: &str, now: DateTime<Utc>) -> NormalizedTask {
    let title = data
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| fallback_title(task_name));

    let description = data
        .get("descriptions")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let (name, color) = match data.get("category") {
        Some(Value::Object(map)) => (
            map.get("name")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_CATEGORY_NAME)
                .to_string(),
            map.get("color")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_CATEGORY_COLOR)
                .to_string(),
        ),
        _ => (
            DEFAULT_CATEGORY_NAME.to_string(),
            DEFAULT_CATEGORY_COLOR.to_string(),
        ),
    };

    let timeframe_days = data
        .get("deadline")
        .and_then(coerce_days)
        .unwrap_or(DEFAULT_DEADLINE_DAYS);

    NormalizedTask {
        title,
        description,
        category: CategoryGuess { name, color },
        priority_score: data
            .get("priority_score")
            .and_then(coerce_f64)
            .unwrap_or(DEFAULT_PRIORITY),
        deadline: days_to_timestamp(now, timeframe_days),
        timeframe_days,
        confidence: data
            .get("confidence")
            .and_then(coerce_f64)
            .unwrap_or(DEFAULT_CONFIDENCE),
        reasoning: data
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_REASONING)
            .to_string(),
    }
}

/// Absolute deadline string, `now` plus a day offset.
pub fn days_to_timestamp(now: DateTime<Utc>, days: i64) -> String {
    (now + Duration::days(days)).format(DEADLINE_FORMAT).to_string()
}

fn fallback_title(task_name: &str) -> String {
    let trimmed = task_name.trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

fn default_category() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        "name".to_string(),
        Value::String(DEFAULT_CATEGORY_NAME.to_string()),
    );
    map.insert(
        "color".to_string(),
        Value::String(DEFAULT_CATEGORY_COLOR.to_string()),
    );
    map
}

fn number(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::Number(0.into()))
}

fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_days(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
