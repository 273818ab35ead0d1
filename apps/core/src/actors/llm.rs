use crate::actors::messages::{ActorError, AppError, LlmMessage};
use crate::actors::traits::LlmActor;
use crate::brain::prompts::PromptMessages;
use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

// --- Constants ---
const MAILBOX_CAPACITY: usize = 32;
const PING_TIMEOUT: Duration = Duration::from_secs(5);
/// Slack added on top of the HTTP timeout before the handle gives up on a reply.
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    reply_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task, so it must be
    /// called from within a runtime.
    pub fn new(config: LlmConfig) -> Result<Self, AppError> {
        let (sender, receiver) = mpsc::channel(MAILBOX_CAPACITY);
        let reply_timeout = Duration::from_secs(config.timeout_secs) + REPLY_GRACE;
        let actor = LlmActorRunner::new(receiver, config)?;
        tokio::spawn(async move { actor.run().await });
        Ok(Self {
            sender,
            reply_timeout,
        })
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn invoke(&self, prompt: PromptMessages) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Invoke {
            prompt,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Internal(e.to_string()))?;
        timeout(self.reply_timeout, recv)
            .await
            .map_err(ActorError::from)?
            .map_err(|e| ActorError::Internal(e.to_string()))?
    }

    async fn is_available(&self) -> bool {
        let (send, recv) = oneshot::channel();
        if self
            .sender
            .send(LlmMessage::Ping { responder: send })
            .await
            .is_err()
        {
            return false;
        }
        matches!(timeout(PING_TIMEOUT + REPLY_GRACE, recv).await, Ok(Ok(true)))
    }
}

// --- Wire format (Ollama /api/chat) ---
#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Clone, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

// --- Actor Runner (Internal Logic) ---

/// State shared by every in-flight request of the runner.
struct LlmBackend {
    client: Client,
    config: LlmConfig,
}

struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    backend: Arc<LlmBackend>,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, config: LlmConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            receiver,
            backend: Arc::new(LlmBackend { client, config }),
        })
    }

    async fn run(mut self) {
        info!(
            model = %self.backend.config.model,
            base_url = %self.backend.config.base_url,
            "LlmActor started"
        );

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }

        info!("LlmActor stopped");
    }

    /// Each request runs on its own task so independent requests never queue
    /// behind a slow completion.
    fn handle_message(&self, msg: LlmMessage) {
        let backend = Arc::clone(&self.backend);
        match msg {
            LlmMessage::Invoke { prompt, responder } => {
                tokio::spawn(async move {
                    let result = backend.chat(&prompt).await;
                    if let Err(e) = &result {
                        error!("LLM invocation failed: {}", e);
                    }
                    let _ = responder.send(result);
                });
            }
            LlmMessage::Ping { responder } => {
                tokio::spawn(async move {
                    let _ = responder.send(backend.ping().await);
                });
            }
        }
    }
}

impl LlmBackend {
    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.config.base_url, endpoint)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    #[instrument(skip(self, prompt), fields(model = %self.config.model))]
    async fn chat(&self, prompt: &PromptMessages) -> Result<String, AppError> {
        debug!("LLM generating for prompt: {}", prompt.user);

        let payload = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let res = self
            .authorize(self.client.post(self.url("api/chat")))
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Llm(format!(
                "Chat request failed with status {}: {}",
                status, body
            )));
        }

        let body: ChatResponse = res
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Unreadable chat response: {}", e)))?;

        body.message
            .map(|m| m.content)
            .ok_or_else(|| AppError::Llm("Chat response carried no message".to_string()))
    }

    async fn ping(&self) -> bool {
        let request = self
            .authorize(self.client.get(self.url("api/tags")))
            .timeout(PING_TIMEOUT);
        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!("LLM server answered health probe with {}", response.status());
                false
            }
            Err(e) => {
                warn!("LLM server unreachable: {}", e);
                false
            }
        }
    }
}
