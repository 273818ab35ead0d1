//! Test Module
//!
//! ## Test Categories
//! - `mocks`: Scripted `LlmActor` used across suites
//! - `pipeline_tests`: Classification, recovery and failure semantics of the pipeline
//! - `api_tests`: HTTP routes, validation and rate limiting with a mocked LLM
//! - `integration_tests`: Full stack against a mock Ollama server

pub mod api_tests;
pub mod integration_tests;
