//! Intent categories and the static regex fallback classifier.
//!
//! The regex classifier only runs when the LLM reply carries no JSON object
//! at all. Pattern groups are checked in a fixed priority order and the first
//! group with a matching pattern wins.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Confidence reported for every regex fallback classification.
pub const FALLBACK_CONFIDENCE: f32 = 0.6;

/// Detected intent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Greeting (hello, hi, good morning, etc.)
    Greeting,
    /// Question (contains ?, how, why, what, etc.)
    Question,
    /// Command/Imperative (do, create, show, etc.)
    Command,
    /// Request for facts or details about something
    InformationRequest,
    /// The user asks to have something restated or explained again
    Clarification,
    /// Opinion about the conversation or a previous answer
    Feedback,
    /// Farewell (goodbye, bye, see you, etc.)
    Goodbye,
    /// Unknown/Default
    Unknown,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Intent {
    /// Every category, in the order they are listed to clients and to the model.
    pub const ALL: [Intent; 8] = [
        Intent::Greeting,
        Intent::Question,
        Intent::Command,
        Intent::InformationRequest,
        Intent::Clarification,
        Intent::Feedback,
        Intent::Goodbye,
        Intent::Unknown,
    ];

    /// Returns the wire label for the intent
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Question => "question",
            Intent::Command => "command",
            Intent::InformationRequest => "information_request",
            Intent::Clarification => "clarification",
            Intent::Feedback => "feedback",
            Intent::Goodbye => "goodbye",
            Intent::Unknown => "unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Intent::Greeting => "Opening a conversation or saying hello",
            Intent::Question => "Asking a direct question",
            Intent::Command => "Asking the assistant to perform an action",
            Intent::InformationRequest => "Requesting facts or details about a topic",
            Intent::Clarification => "Asking for something to be restated or explained",
            Intent::Feedback => "Giving an opinion on the conversation or an answer",
            Intent::Goodbye => "Ending the conversation",
            Intent::Unknown => "Purpose could not be determined",
        }
    }

    /// Maps a model-produced label onto the closed category set.
    ///
    /// Matching ignores case, surrounding whitespace, and `-`/space versus `_`.
    /// Labels outside the set map to [`Intent::Unknown`].
    pub fn from_label(label: &str) -> Intent {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        Intent::ALL
            .into_iter()
            .find(|intent| intent.label() == normalized)
            .unwrap_or(Intent::Unknown)
    }
}

/// Result of the static regex classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentResult {
    /// Detected intent
    pub intent: Intent,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Text fragment that triggered the match
    pub matched_pattern: Option<String>,
}

/// Pattern definition for intent matching
struct IntentPattern {
    intent: Intent,
    patterns: &'static [Regex],
}

/// Intent classifier using regex patterns, first matching group wins.
pub struct IntentClassifier {
    patterns: Vec<IntentPattern>,
}

// Compile patterns once at startup
static GREETING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^\s*(hello|hi|hey|hiya|howdy|greetings|yo)\b").expect("Invalid regex: greeting words"),
        Regex::new(r"(?i)^\s*good\s+(morning|afternoon|evening|day)\b").expect("Invalid regex: time-of-day greetings"),
        Regex::new(r"(?i)^\s*(what's up|whats up|sup)\b").expect("Invalid regex: informal greetings"),
    ]
});

static QUESTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\?\s*$").expect("Invalid regex: trailing question mark"),
        Regex::new(r"(?i)^\s*(what|why|how|when|where|who|whom|whose|which)\b").expect("Invalid regex: wh-words"),
        Regex::new(r"(?i)^\s*(is|are|was|were|do|does|did|can|could|will|would|should|may|might)\s+\w+").expect("Invalid regex: auxiliary inversion"),
    ]
});

static COMMAND_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)^\s*(please\s+)?(do|make|create|generate|run|start|stop|open|close|set|turn|add|remove|delete|send|play|show|give|find|search|book|remind|write)\b").expect("Invalid regex: imperative verbs"),
        Regex::new(r"(?i)^\s*(let's|lets)\b").expect("Invalid regex: let's"),
    ]
});

static GOODBYE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(goodbye|good bye|bye|farewell|see you|see ya|take care|good night|later)\b").expect("Invalid regex: farewells"),
    ]
});

static CLARIFICATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(what do you mean|clarify|rephrase|say that again|come again|repeat that)\b").expect("Invalid regex: clarification phrases"),
        Regex::new(r"(?i)\b(i (don't|do not|didn't|did not) (understand|get it|follow))\b").expect("Invalid regex: confusion phrases"),
    ]
});

static INFORMATION_REQUEST_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\b(tell me about|information (on|about)|details (on|about)|learn about|i want to know|i'd like to know|explain)\b").expect("Invalid regex: information phrases"),
        Regex::new(r"(?i)\b(info|information|details|facts)\b").expect("Invalid regex: information nouns"),
    ]
});

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    /// Create a new intent classifier with all patterns, in priority order
    pub fn new() -> Self {
        let patterns = vec![
            IntentPattern {
                intent: Intent::Greeting,
                patterns: &GREETING_PATTERNS,
            },
            IntentPattern {
                intent: Intent::Question,
                patterns: &QUESTION_PATTERNS,
            },
            IntentPattern {
                intent: Intent::Command,
                patterns: &COMMAND_PATTERNS,
            },
            IntentPattern {
                intent: Intent::Goodbye,
                patterns: &GOODBYE_PATTERNS,
            },
            IntentPattern {
                intent: Intent::Clarification,
                patterns: &CLARIFICATION_PATTERNS,
            },
            IntentPattern {
                intent: Intent::InformationRequest,
                patterns: &INFORMATION_REQUEST_PATTERNS,
            },
        ];

        Self { patterns }
    }

    /// Classify the intent of a text
    pub fn classify(&self, text: &str) -> IntentResult {
        let text = text.trim();

        for group in &self.patterns {
            if let Some(m) = group.patterns.iter().find_map(|p| p.find(text)) {
                return IntentResult {
                    intent: group.intent,
                    confidence: FALLBACK_CONFIDENCE,
                    matched_pattern: Some(m.as_str().to_string()),
                };
            }
        }

        IntentResult {
            intent: Intent::Unknown,
            confidence: FALLBACK_CONFIDENCE,
            matched_pattern: None,
        }
    }
}
