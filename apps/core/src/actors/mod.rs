//! Actor layer around the external LLM service.

pub mod llm;
pub mod messages;
pub mod traits;
