//! The agent orchestration loop.
//!
//! One query is driven through an explicit state machine:
//!
//! ```text
//! AwaitingModel ──ok──▶ HandlingStep ──think/observe/action/bad turn──▶ AwaitingModel
//!       │                     └──output──▶ Terminated
//!       ├──429/403, next model──▶ AwaitingModel (same transcript)
//!       └──other failure / exhausted / cancelled──▶ Aborted
//! ```
//!
//! The transcript is rebuilt for every query. The model fallback cursor is
//! owned by the loop and survives across queries.

use std::sync::Arc;
use termagent_config::AppConfig;
use termagent_core::error::{ProtocolError, ProviderError, ToolError};
use termagent_core::message::Transcript;
use termagent_core::provider::{Provider, ProviderRequest};
use termagent_core::step::{self, STEP_KINDS, StepRecord};
use termagent_core::tool::ToolRegistry;
use termagent_providers::{ModelFallback, fallback_from_config};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::prompt;
use crate::step_event::{NoopSink, StepEvent, StepSink};

/// Why a query ended without an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    /// The endpoint failed in a way no other model can fix.
    #[error("{error}")]
    Api {
        error: ProviderError,
        /// The last message submitted before the failure.
        last_message: Option<String>,
    },

    /// A retryable failure on the last model candidate.
    #[error("All model candidates exhausted (last tried {model}): {error}")]
    FallbackExhausted { error: ProviderError, model: String },

    #[error("The model returned {count} invalid responses for this query")]
    ProtocolErrorsExhausted { count: u32 },

    #[error("Reached the limit of {limit} model requests for this query")]
    IterationLimit { limit: u32 },

    #[error("Cancelled")]
    Cancelled,
}

impl AbortReason {
    /// A short suggestion for the user, when one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Api { error, .. } | Self::FallbackExhausted { error, .. } => Some(error.hint()),
            _ => None,
        }
    }

    /// The message submitted right before a fatal endpoint error.
    pub fn last_message(&self) -> Option<&str> {
        match self {
            Self::Api { last_message, .. } => last_message.as_deref(),
            _ => None,
        }
    }
}

/// How a query ended.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Terminated {
        answer: String,
        /// The candidate that produced the answer.
        model: String,
        /// Model requests made for this query.
        iterations: u32,
    },
    Aborted { reason: AbortReason, iterations: u32 },
}

impl QueryOutcome {
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }

    pub fn iterations(&self) -> u32 {
        match self {
            Self::Terminated { iterations, .. } | Self::Aborted { iterations, .. } => *iterations,
        }
    }
}

/// Named states of one query.
#[derive(Debug)]
enum LoopState {
    AwaitingModel,
    HandlingStep {
        step: Result<StepRecord, ProtocolError>,
        model: String,
    },
    Terminated {
        answer: String,
        model: String,
    },
    Aborted(AbortReason),
}

/// Per-query bookkeeping.
#[derive(Debug, Default)]
struct QueryCounters {
    requests: u32,
    protocol_errors: u32,
}

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    fallback: ModelFallback,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    temperature: Option<f32>,
    max_iterations: u32,
    max_protocol_errors: u32,
    sink: Arc<dyn StepSink>,
}

impl AgentLoop {
    /// Create a new agent loop with default caps and no event sink.
    pub fn new(
        provider: Arc<dyn Provider>,
        fallback: ModelFallback,
        tools: Arc<ToolRegistry>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            fallback,
            tools,
            system_prompt: system_prompt.into(),
            temperature: None,
            max_iterations: 25,
            max_protocol_errors: 3,
            sink: Arc::new(NoopSink),
        }
    }

    /// Wire up the loop from configuration: model candidates, built-in
    /// tools, system prompt and caps.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
    ) -> Result<Self, ProviderError> {
        let fallback = fallback_from_config(config)?;
        let tools = Arc::new(termagent_tools::default_registry(&config.tools));
        let system_prompt = prompt::system_prompt(&config.identity, &tools);

        Ok(Self::new(provider, fallback, tools, system_prompt)
            .with_temperature(config.temperature)
            .with_max_iterations(config.agent.max_iterations)
            .with_max_protocol_errors(config.agent.max_protocol_errors))
    }

    /// Maximum model requests per query.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Invalid model responses tolerated per query before aborting.
    pub fn with_max_protocol_errors(mut self, max: u32) -> Self {
        self.max_protocol_errors = max;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Send progress events to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn StepSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn fallback(&self) -> &ModelFallback {
        &self.fallback
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Resolve one user query.
    pub async fn process(&mut self, query: &str, cancel: &CancellationToken) -> QueryOutcome {
        self.process_with_transcript(query, cancel).await.0
    }

    /// Resolve one user query and hand back the transcript it produced.
    pub async fn process_with_transcript(
        &mut self,
        query: &str,
        cancel: &CancellationToken,
    ) -> (QueryOutcome, Transcript) {
        let mut transcript = Transcript::new(&self.system_prompt, query);
        let mut counters = QueryCounters::default();
        let mut state = LoopState::AwaitingModel;

        info!(
            conversation_id = %transcript.id(),
            model = %self.fallback.current_model(),
            "Processing query"
        );

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    self.await_model(&mut transcript, &mut counters, cancel)
                        .await
                }
                LoopState::HandlingStep { step, model } => {
                    self.handle_step(step, model, &mut transcript, &mut counters, cancel)
                        .await
                }
                LoopState::Terminated { answer, model } => {
                    info!(
                        conversation_id = %transcript.id(),
                        model = %model,
                        iterations = counters.requests,
                        "Query answered"
                    );
                    let outcome = QueryOutcome::Terminated {
                        answer,
                        model,
                        iterations: counters.requests,
                    };
                    return (outcome, transcript);
                }
                LoopState::Aborted(reason) => {
                    warn!(
                        conversation_id = %transcript.id(),
                        iterations = counters.requests,
                        reason = %reason,
                        last_message = ?reason.last_message(),
                        "Query aborted"
                    );
                    self.sink.emit(StepEvent::Aborted {
                        reason: reason.to_string(),
                        hint: reason.hint().map(str::to_string),
                        last_message: reason.last_message().map(str::to_string),
                    });
                    let outcome = QueryOutcome::Aborted {
                        reason,
                        iterations: counters.requests,
                    };
                    return (outcome, transcript);
                }
            };
        }
    }

    /// `AwaitingModel`: submit the transcript to the current candidate.
    async fn await_model(
        &mut self,
        transcript: &mut Transcript,
        counters: &mut QueryCounters,
        cancel: &CancellationToken,
    ) -> LoopState {
        if counters.requests >= self.max_iterations {
            return LoopState::Aborted(AbortReason::IterationLimit {
                limit: self.max_iterations,
            });
        }

        let model = self.fallback.current_model().name.clone();
        let request = ProviderRequest::json(&model, transcript.snapshot())
            .with_temperature(self.temperature);
        counters.requests += 1;

        debug!(
            conversation_id = %transcript.id(),
            model = %model,
            iteration = counters.requests,
            messages = transcript.len(),
            "Submitting transcript"
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return LoopState::Aborted(AbortReason::Cancelled),
            result = self.provider.complete(request) => result,
        };

        match result {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    debug!(model = %model, tokens = usage.total_tokens, "Response received");
                }
                let step = step::decode(&response.content);
                transcript.push_assistant(response.content);
                LoopState::HandlingStep { step, model }
            }
            Err(error) => self.on_provider_error(error, transcript),
        }
    }

    /// Classify a failed request: move to the next model or abort.
    fn on_provider_error(&mut self, error: ProviderError, transcript: &Transcript) -> LoopState {
        let model = self.fallback.current_model().name.clone();

        if !error.is_fallback_retryable() {
            return LoopState::Aborted(AbortReason::Api {
                error,
                last_message: transcript.last().map(|m| m.content.clone()),
            });
        }

        if !self.fallback.advance() {
            return LoopState::Aborted(AbortReason::FallbackExhausted { error, model });
        }

        let next = self.fallback.current_model().name.clone();
        warn!(
            conversation_id = %transcript.id(),
            from = %model,
            to = %next,
            status = ?error.status_code(),
            "Model rejected request, falling back"
        );
        self.sink.emit(StepEvent::ModelFallback {
            from: model,
            to: next,
            status: error.status_code(),
            reason: error.to_string(),
        });
        LoopState::AwaitingModel
    }

    /// `HandlingStep`: act on one decoded turn.
    async fn handle_step(
        &self,
        step: Result<StepRecord, ProtocolError>,
        model: String,
        transcript: &mut Transcript,
        counters: &mut QueryCounters,
        cancel: &CancellationToken,
    ) -> LoopState {
        let record = match step {
            Ok(record) => record,
            Err(error) => return self.on_protocol_error(error, transcript, counters),
        };

        match record {
            StepRecord::Think { content } => {
                self.sink.emit(StepEvent::Thinking { content });
                LoopState::AwaitingModel
            }
            StepRecord::Observe { content } => {
                self.sink.emit(StepEvent::Observing { content });
                LoopState::AwaitingModel
            }
            StepRecord::Action { tool, input } => {
                self.run_tool(tool, input, transcript, cancel).await
            }
            StepRecord::Output { content } => {
                self.sink.emit(StepEvent::Answer {
                    content: content.clone(),
                    model: model.clone(),
                });
                LoopState::Terminated {
                    answer: content,
                    model,
                }
            }
            StepRecord::Unexpected { step } => {
                warn!(conversation_id = %transcript.id(), step = %step, "Unexpected step kind");
                let message = format!(
                    "Unexpected step '{step}'. Valid steps are: {}.",
                    STEP_KINDS.join(", ")
                );
                self.sink.emit(StepEvent::Warning {
                    message: message.clone(),
                });
                transcript.push_observation(&message);
                LoopState::AwaitingModel
            }
        }
    }

    fn on_protocol_error(
        &self,
        error: ProtocolError,
        transcript: &mut Transcript,
        counters: &mut QueryCounters,
    ) -> LoopState {
        counters.protocol_errors += 1;
        warn!(
            conversation_id = %transcript.id(),
            count = counters.protocol_errors,
            reason = %error.reason,
            "Invalid model response"
        );
        self.sink.emit(StepEvent::Warning {
            message: error.to_string(),
        });

        if counters.protocol_errors > self.max_protocol_errors {
            return LoopState::Aborted(AbortReason::ProtocolErrorsExhausted {
                count: counters.protocol_errors,
            });
        }

        transcript.push_observation(&format!(
            "Invalid response: {}. Respond with exactly one JSON object whose \"step\" is one of {}.",
            error.reason,
            STEP_KINDS.join(", ")
        ));
        LoopState::AwaitingModel
    }

    /// Dispatch an `action` and append what the tool said as an observation.
    async fn run_tool(
        &self,
        tool: String,
        input: String,
        transcript: &mut Transcript,
        cancel: &CancellationToken,
    ) -> LoopState {
        self.sink.emit(StepEvent::ToolCall {
            tool: tool.clone(),
            input: input.clone(),
        });

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.sink.emit(StepEvent::ToolResult {
                    tool,
                    output: "Interrupted before completion".into(),
                    success: false,
                });
                return LoopState::Aborted(AbortReason::Cancelled);
            }
            result = self.tools.dispatch(&tool, &input) => result,
        };

        let (observation, success) = match result {
            Ok(output) => (output, true),
            Err(error @ ToolError::NotFound(_)) => (format!("Error: {error}"), false),
            Err(error) => {
                warn!(conversation_id = %transcript.id(), tool = %tool, error = %error, "Tool execution failed");
                (format!("Tool execution failed: {error}"), false)
            }
        };

        self.sink.emit(StepEvent::ToolResult {
            tool,
            output: observation.clone(),
            success,
        });
        transcript.push_observation(&observation);
        LoopState::AwaitingModel
    }
}
