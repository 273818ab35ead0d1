//! Intent Pipeline - Main orchestrator for the Brain module.
//!
//! Runs a fixed, linear sequence of stages for one message:
//!
//! `ProcessInput -> IdentifyIntent -> [ExplainIntent] -> GenerateResponse -> Done`
//!
//! `ExplainIntent` only runs when reasoning is requested. No stage loops or
//! retries, and no stage failure aborts the run: failures are written into the
//! state's error list and the run continues with a substitute value.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

use super::extract::{parse_classification, parse_reasoning};
use super::intent::IntentClassifier;
use super::prompts::{classification_prompt, reasoning_prompt, response_prompt};
use super::turn::{Classification, ConversationTurn, Reasoning, APOLOGY_RESPONSE};
use crate::actors::traits::LlmActor;

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ProcessInput,
    IdentifyIntent,
    ExplainIntent,
    GenerateResponse,
    Done,
}

impl Stage {
    /// The stage that follows `self`.
    pub fn next(self, with_reasoning: bool) -> Stage {
        match self {
            Stage::ProcessInput => Stage::IdentifyIntent,
            Stage::IdentifyIntent if with_reasoning => Stage::ExplainIntent,
            Stage::IdentifyIntent => Stage::GenerateResponse,
            Stage::ExplainIntent => Stage::GenerateResponse,
            Stage::GenerateResponse | Stage::Done => Stage::Done,
        }
    }
}

/// Mutable state threaded through the stages of one run.
#[derive(Debug, Default)]
struct PipelineState {
    input: String,
    classification: Option<Classification>,
    reasoning: Option<Reasoning>,
    response: Option<String>,
    errors: Vec<String>,
}

impl PipelineState {
    fn into_turn(self, started: Instant) -> ConversationTurn {
        let classification = self.classification.unwrap_or_else(Classification::failed);
        ConversationTurn {
            input: self.input,
            intent: classification.intent,
            confidence: classification.confidence,
            entities: classification.entities,
            source: classification.source,
            response: self.response.unwrap_or_else(|| APOLOGY_RESPONSE.to_string()),
            reasoning: self.reasoning,
            error: (!self.errors.is_empty()).then(|| self.errors.join("; ")),
            processing_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Classify-then-respond pipeline over an injected LLM.
#[derive(Clone)]
pub struct IntentPipeline {
    llm: Arc<dyn LlmActor>,
    fallback: Arc<IntentClassifier>,
}

impl IntentPipeline {
    pub fn new(llm: Arc<dyn LlmActor>) -> Self {
        Self {
            llm,
            fallback: Arc::new(IntentClassifier::new()),
        }
    }

    /// Whether the backing LLM currently answers.
    pub async fn llm_available(&self) -> bool {
        self.llm.is_available().await
    }

    /// Runs every stage for `input`. Never fails; problems land in `error`.
    #[instrument(skip(self, input), fields(input_len = input.len()))]
    pub async fn run(&self, input: &str, with_reasoning: bool) -> ConversationTurn {
        let started = Instant::now();
        let mut state = PipelineState::default();
        let mut stage = Stage::ProcessInput;

        while stage != Stage::Done {
            match stage {
                Stage::ProcessInput => self.process_input(&mut state, input),
                Stage::IdentifyIntent => self.identify_intent(&mut state).await,
                Stage::ExplainIntent => self.explain_intent(&mut state).await,
                Stage::GenerateResponse => self.generate_response(&mut state).await,
                Stage::Done => {}
            }
            stage = if state.input.is_empty() {
                Stage::Done
            } else {
                stage.next(with_reasoning)
            };
        }

        let turn = state.into_turn(started);
        info!(
            intent = %turn.intent,
            confidence = turn.confidence,
            source = ?turn.source,
            failed = turn.error.is_some(),
            elapsed_ms = turn.processing_time_ms,
            "Pipeline finished"
        );
        turn
    }

    /// Runs the pipeline for every message concurrently. Results keep input order.
    pub async fn run_batch(&self, inputs: &[String], with_reasoning: bool) -> Vec<ConversationTurn> {
        join_all(inputs.iter().map(|input| self.run(input, with_reasoning))).await
    }

    fn process_input(&self, state: &mut PipelineState, input: &str) {
        state.input = input.trim().to_string();
        if state.input.is_empty() {
            warn!("Pipeline received an empty message");
            state.errors.push("Input message is empty".to_string());
        }
    }

    async fn identify_intent(&self, state: &mut PipelineState) {
        let classification = match self.llm.invoke(classification_prompt(&state.input)).await {
            Ok(raw) => parse_classification(&raw, &state.input, &self.fallback),
            Err(e) => {
                warn!("Intent identification failed: {}", e);
                state.errors.push(format!("Intent identification failed: {}", e));
                Classification::failed()
            }
        };
        state.classification = Some(classification);
    }

    async fn explain_intent(&self, state: &mut PipelineState) {
        let (intent, confidence) = state
            .classification
            .as_ref()
            .map(|c| (c.intent, c.confidence))
            .unwrap_or_else(|| {
                let failed = Classification::failed();
                (failed.intent, failed.confidence)
            });

        let reasoning = match self
            .llm
            .invoke(reasoning_prompt(&state.input, intent, confidence))
            .await
        {
            Ok(raw) => parse_reasoning(&raw, intent),
            Err(e) => {
                warn!("Reasoning generation failed: {}", e);
                state.errors.push(format!("Reasoning generation failed: {}", e));
                Reasoning::fallback(intent)
            }
        };
        state.reasoning = Some(reasoning);
    }

    async fn generate_response(&self, state: &mut PipelineState) {
        let classification = state
            .classification
            .clone()
            .unwrap_or_else(Classification::failed);
        let entities_json =
            serde_json::to_string(&classification.entities).unwrap_or_else(|_| "{}".to_string());

        let prompt = response_prompt(&state.input, classification.intent, &entities_json);
        state.response = Some(match self.llm.invoke(prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Response generation failed: {}", e);
                state.errors.push(format!("Response generation failed: {}", e));
                APOLOGY_RESPONSE.to_string()
            }
        });
    }
}
