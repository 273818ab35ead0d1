//! Recovery of JSON objects from free-form model output.
//!
//! Models rarely return clean JSON. The chain here is:
//! 1. locate the first `{...}` span,
//! 2. clean it (control characters, trailing commas, newlines),
//! 3. strict parse,
//! 4. if that fails, pull individual fields out with regexes.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use super::intent::{Intent, IntentClassifier};
use super::turn::{Classification, ClassificationSource, Entities, Reasoning, DEFAULT_CONFIDENCE};

static FIRST_BRACE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*?\}").expect("Invalid regex: brace span"));
static CONTROL_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("Invalid regex: control characters")
});
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("Invalid regex: trailing comma"));
static NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[\r\n]+\s*").expect("Invalid regex: newlines"));
static INTENT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""intent"\s*:\s*"([^"]*)""#).expect("Invalid regex: intent field")
});
static CONFIDENCE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""confidence"\s*:\s*"?(-?[0-9]*\.?[0-9]+)"#).expect("Invalid regex: confidence field")
});

/// What was found in a model reply.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonSpan {
    /// A span was found and parsed into an object.
    Object(Map<String, Value>),
    /// A span was found but did not parse. Holds the cleaned text.
    Malformed(String),
    /// No `{...}` span at all.
    Missing,
}

/// Returns the first `{...}` span of `text`.
///
/// The span starts at the first `{`. When the braces after it balance (ignoring
/// braces inside JSON strings) the span runs to the balancing brace, so nested
/// objects survive; otherwise it ends at the first `}`, a plain non-greedy match.
pub fn find_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    balanced_end(&text[start..])
        .map(|end| &text[start..start + end])
        .or_else(|| FIRST_BRACE_SPAN.find(text).map(|m| m.as_str()))
}

fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strips control characters and trailing commas, and collapses line breaks.
pub fn clean_json(span: &str) -> String {
    let without_controls = CONTROL_CHARS.replace_all(span, "").replace('\t', " ");
    let without_commas = TRAILING_COMMA.replace_all(&without_controls, "$1");
    NEWLINES.replace_all(&without_commas, " ").into_owned()
}

/// Locates, cleans and strictly parses the first JSON object in `raw`.
pub fn extract_json_object(raw: &str) -> JsonSpan {
    let Some(span) = find_json_span(raw) else {
        return JsonSpan::Missing;
    };
    let cleaned = clean_json(span);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => JsonSpan::Object(map),
        _ => JsonSpan::Malformed(cleaned),
    }
}

/// Turns a raw classification reply into a [`Classification`].
///
/// `input` is only consulted when the reply has no JSON span, in which case
/// the static regex classifier decides.
pub fn parse_classification(raw: &str, input: &str, fallback: &IntentClassifier) -> Classification {
    match extract_json_object(raw) {
        JsonSpan::Object(map) => Classification {
            intent: map
                .get("intent")
                .and_then(Value::as_str)
                .map(Intent::from_label)
                .unwrap_or(Intent::Unknown),
            confidence: map
                .get("confidence")
                .and_then(confidence_value)
                .unwrap_or(DEFAULT_CONFIDENCE),
            entities: map.get("entities").map(entities_value).unwrap_or_default(),
            source: ClassificationSource::Llm,
        },
        JsonSpan::Malformed(cleaned) => salvage_classification(&cleaned),
        JsonSpan::Missing => {
            let result = fallback.classify(input);
            Classification {
                intent: result.intent,
                confidence: result.confidence,
                entities: Entities::new(),
                source: ClassificationSource::Pattern,
            }
        }
    }
}

/// Field-by-field regex extraction from text that failed to parse.
pub fn salvage_classification(text: &str) -> Classification {
    let intent = INTENT_FIELD
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| Intent::from_label(m.as_str()))
        .unwrap_or(Intent::Unknown);
    let confidence = CONFIDENCE_FIELD
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f32>().ok())
        .map(clamp_confidence)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Classification {
        intent,
        confidence,
        entities: Entities::new(),
        source: ClassificationSource::LlmSalvaged,
    }
}

/// Turns a raw reasoning reply into a [`Reasoning`], or the static fallback.
pub fn parse_reasoning(raw: &str, intent: Intent) -> Reasoning {
    let JsonSpan::Object(map) = extract_json_object(raw) else {
        return Reasoning::fallback(intent);
    };
    let fallback = Reasoning::fallback(intent);

    Reasoning {
        key_phrases: map
            .get("key_phrases")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        justification: map
            .get("justification")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(fallback.justification),
        response_strategy: map
            .get("response_strategy")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or(fallback.response_strategy),
    }
}

fn confidence_value(value: &Value) -> Option<f32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(clamp_confidence(number as f32))
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}

fn entities_value(value: &Value) -> Entities {
    let Value::Object(map) = value else {
        return Entities::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((key.clone(), text))
        })
        .collect()
}
