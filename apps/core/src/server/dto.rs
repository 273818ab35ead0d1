//! Request and response bodies of the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::brain::{ClassificationSource, ConversationTurn, Entities, Intent, Reasoning};
use crate::error::AppError;

#[derive(Debug, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(min = 1))]
    pub message: String,
    /// Also run the reasoning stage for this message.
    #[serde(default)]
    pub include_reasoning: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BatchClassifyRequest {
    #[validate(length(min = 1))]
    pub messages: Vec<String>,
    #[serde(default)]
    pub include_reasoning: bool,
}

/// Rejects blank messages and messages longer than `max_chars` characters.
pub fn check_message(message: &str, max_chars: usize) -> Result<(), AppError> {
    if message.trim().is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }
    let length = message.chars().count();
    if length > max_chars {
        return Err(AppError::Validation(format!(
            "Message is {} characters long, the limit is {}",
            length, max_chars
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub request_id: String,
    pub source: ClassificationSource,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub intent: Intent,
    pub confidence: f32,
    pub entities: Entities,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Reasoning>,
    pub error: Option<String>,
    pub metadata: ResponseMetadata,
}

impl ClassifyResponse {
    pub fn from_turn(turn: ConversationTurn, model: &str) -> Self {
        Self {
            intent: turn.intent,
            confidence: turn.confidence,
            entities: turn.entities,
            response: turn.response,
            reasoning: turn.reasoning,
            error: turn.error,
            metadata: ResponseMetadata {
                processing_time_ms: turn.processing_time_ms,
                timestamp: Utc::now(),
                model: model.to_string(),
                request_id: uuid::Uuid::new_v4().to_string(),
                source: turn.source,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchMetadata {
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchClassifyResponse {
    pub results: Vec<ClassifyResponse>,
    pub total: usize,
    pub metadata: BatchMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub name: Intent,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<CategoryInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` when the LLM answers, `degraded` otherwise
    pub status: String,
    pub model: String,
    pub llm_available: bool,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_message() {
        assert!(check_message("hello", 10).is_ok());
        assert!(matches!(check_message("   ", 10), Err(AppError::Validation(_))));
        assert!(matches!(check_message("hello world", 5), Err(AppError::Validation(_))));
        // Limit counts characters, not bytes
        assert!(check_message("héllo", 5).is_ok());
    }
}
