//! # Brain Module
//!
//! Intent classification and reply generation for Soul Buddy.
//!
//! ## Components
//! - `prompts`: Fixed system+user prompt templates
//! - `intent`: Intent categories and the static regex fallback classifier
//! - `extract`: JSON recovery from free-form model output
//! - `turn`: Output data structures
//! - `pipeline`: Main orchestrator

pub mod extract;
pub mod intent;
pub mod pipeline;
pub mod prompts;
pub mod turn;

pub use intent::{Intent, IntentClassifier};
pub use pipeline::IntentPipeline;
pub use turn::{ClassificationSource, ConversationTurn, Entities, Reasoning};
