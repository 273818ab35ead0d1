//! Prompt templates for the three LLM calls of the pipeline.
//!
//! A template is a fixed system text plus a user text with `{name}` slots.
//! Slots not supplied to [`PromptTemplate::format`] are left as-is, so literal
//! JSON braces inside a template are safe.

use serde::{Deserialize, Serialize};

use super::intent::Intent;

/// A system+user message pair, ready to send to a chat model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessages {
    pub system: String,
    pub user: String,
}

/// Fixed prompt template.
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub user: &'static str,
}

impl PromptTemplate {
    /// Fills `{name}` slots in both messages.
    pub fn format(&self, vars: &[(&str, &str)]) -> PromptMessages {
        PromptMessages {
            system: fill(self.system, vars),
            user: fill(self.user, vars),
        }
    }
}

/// Single pass over `template`; substituted values are never re-scanned.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Example entity types offered to the model.
pub const ENTITY_TYPES: [&str; 7] = [
    "time", "date", "location", "person", "topic", "product", "quantity",
];

pub const CLASSIFICATION_TEMPLATE: PromptTemplate = PromptTemplate {
    system: "You are an intent classification system. You analyse a single user message \
and answer with one JSON object and nothing else. No prose, no markdown.",
    user: r#"Classify the intent of the following user message.

Valid intent categories: {categories}
Example entity types: {entity_types}

Respond ONLY with a JSON object of this exact shape:
{"intent": "<category>", "confidence": <number between 0 and 1>, "entities": {"<entity_type>": "<value>"}}

User message: "{input}""#,
};

pub const RESPONSE_TEMPLATE: PromptTemplate = PromptTemplate {
    system: "You are Soul Buddy, a warm and concise conversational companion. \
Reply naturally to the user. Do not mention the intent or classification process.",
    user: r#"The user's message has been identified as: {intent}
Detected entities: {entities}

User message: "{input}"

Write a helpful, natural reply to the user. Do not mention the intent or classification process."#,
};

pub const REASONING_TEMPLATE: PromptTemplate = PromptTemplate {
    system: "You explain intent classifications. Answer with one JSON object and nothing else.",
    user: r#"The user message below was classified as "{intent}" with confidence {confidence}.

User message: "{input}"

Respond ONLY with a JSON object of this exact shape:
{"key_phrases": ["<phrase>"], "justification": "<one sentence>", "response_strategy": "<one sentence>"}"#,
};

/// Comma-separated list of every intent label.
pub fn category_list() -> String {
    Intent::ALL
        .iter()
        .map(|intent| intent.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn classification_prompt(input: &str) -> PromptMessages {
    let categories = category_list();
    let entity_types = ENTITY_TYPES.join(", ");
    CLASSIFICATION_TEMPLATE.format(&[
        ("categories", categories.as_str()),
        ("entity_types", entity_types.as_str()),
        ("input", input),
    ])
}

pub fn response_prompt(input: &str, intent: Intent, entities_json: &str) -> PromptMessages {
    RESPONSE_TEMPLATE.format(&[
        ("intent", intent.label()),
        ("entities", entities_json),
        ("input", input),
    ])
}

pub fn reasoning_prompt(input: &str, intent: Intent, confidence: f32) -> PromptMessages {
    let confidence = format!("{:.2}", confidence);
    REASONING_TEMPLATE.format(&[
        ("intent", intent.label()),
        ("confidence", confidence.as_str()),
        ("input", input),
    ])
}
