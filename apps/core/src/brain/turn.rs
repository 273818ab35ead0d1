//! Conversation Turn - Output structure for one pipeline run.
//!
//! A turn is created per request and never persisted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::intent::Intent;

/// Free-form entities pulled out of the user message, e.g. `time -> "5pm"`.
pub type Entities = BTreeMap<String, String>;

/// Confidence used when the model omits one.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Reply substituted when response generation fails.
pub const APOLOGY_RESPONSE: &str =
    "I'm sorry, I'm having trouble responding right now. Please try again in a moment.";

/// How a classification was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    /// Strict JSON parse of the model reply
    Llm,
    /// Regex salvage of a malformed JSON object
    LlmSalvaged,
    /// Static regex classifier, the model reply had no JSON object
    Pattern,
    /// The model call failed
    Failed,
}

/// Intent, confidence and entities for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    pub entities: Entities,
    pub source: ClassificationSource,
}

impl Classification {
    /// The result reported when the classification call itself failed.
    pub fn failed() -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: 0.0,
            entities: Entities::new(),
            source: ClassificationSource::Failed,
        }
    }
}

/// Structured explanation of a classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reasoning {
    pub key_phrases: Vec<String>,
    pub justification: String,
    pub response_strategy: String,
}

impl Reasoning {
    /// Used whenever the model's reasoning reply cannot be parsed.
    pub fn fallback(intent: Intent) -> Self {
        Self {
            key_phrases: Vec::new(),
            justification: format!(
                "Classified as {} but no structured reasoning was available.",
                intent
            ),
            response_strategy: "Respond directly and naturally to the user's message.".to_string(),
        }
    }
}

/// Complete result of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Original user input, trimmed
    pub input: String,
    pub intent: Intent,
    pub confidence: f32,
    pub entities: Entities,
    /// Which recovery step produced the classification
    pub source: ClassificationSource,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,
    /// Failure text from any stage; the turn itself is still well-formed
    pub error: Option<String>,
    /// Wall-clock time spent in the pipeline
    pub processing_time_ms: u64,
}
