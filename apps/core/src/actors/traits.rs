use crate::actors::messages::AppError;
use crate::brain::prompts::PromptMessages;
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the specific implementation of the LLM, allowing for different
/// backends (e.g., a local Ollama server, a test stub) to be used interchangeably.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Sends a formatted prompt to the model and returns the raw reply text.
    async fn invoke(&self, prompt: PromptMessages) -> Result<String, AppError>;

    /// Reports whether the backing model server currently answers.
    async fn is_available(&self) -> bool {
        true
    }
}
