//! Progress events emitted by the agent loop.
//!
//! `StepEvent` is what the user sees while a query runs: reasoning steps,
//! tool calls and their results, model fallbacks, warnings, and the final
//! answer. Events are handed to a [`StepSink`] synchronously, in the order
//! they happen, so a terminal renderer never has to reorder them.

use serde::{Deserialize, Serialize};

/// Events emitted by the agent while processing one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepEvent {
    /// A `think` step.
    Thinking { content: String },

    /// An `observe` step produced by the model itself.
    Observing { content: String },

    /// The model asked for a tool.
    ToolCall { tool: String, input: String },

    /// The tool finished (or failed); `output` is what the model will see.
    ToolResult {
        tool: String,
        output: String,
        success: bool,
    },

    /// The endpoint rejected the current model and the loop moved on.
    ModelFallback {
        from: String,
        to: String,
        status: Option<u16>,
        reason: String,
    },

    /// A recoverable protocol problem fed back to the model.
    Warning { message: String },

    /// The final answer and the model that produced it.
    Answer { content: String, model: String },

    /// The query ended without an answer. `last_message` is the message
    /// submitted right before a fatal endpoint error.
    Aborted {
        reason: String,
        hint: Option<String>,
        last_message: Option<String>,
    },
}

impl StepEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::Observing { .. } => "observing",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::ModelFallback { .. } => "model_fallback",
            Self::Warning { .. } => "warning",
            Self::Answer { .. } => "answer",
            Self::Aborted { .. } => "aborted",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Answer { .. } | Self::Aborted { .. })
    }
}

/// Receives progress events. Implementations must not block for long; the
/// loop waits for `emit` before taking its next step.
pub trait StepSink: Send + Sync {
    fn emit(&self, event: StepEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl StepSink for NoopSink {
    fn emit(&self, _event: StepEvent) {}
}
