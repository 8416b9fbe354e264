//! Step protocol codec.
//!
//! Every model turn must be exactly one JSON object of the form
//!
//! ```json
//! {"step": "think" | "action" | "observe" | "output", "tool": "...", "input": "...", "content": "..."}
//! ```
//!
//! `action` steps need `tool` and `input`; the other kinds need `content`.
//! Fields that do not belong to the step kind are ignored, since models
//! routinely send them as empty strings.

use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Step kinds the protocol defines, in the order the system prompt lists them.
pub const STEP_KINDS: [&str; 4] = ["think", "action", "observe", "output"];

/// One decoded model turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRecord {
    /// Intermediate reasoning.
    Think { content: String },
    /// A tool invocation request.
    Action { tool: String, input: String },
    /// The model restating an observation.
    Observe { content: String },
    /// The final answer.
    Output { content: String },
    /// A well-formed object with a step kind the protocol does not define.
    Unexpected { step: String },
}

impl StepRecord {
    /// The wire name of this step kind.
    pub fn kind(&self) -> &str {
        match self {
            StepRecord::Think { .. } => "think",
            StepRecord::Action { .. } => "action",
            StepRecord::Observe { .. } => "observe",
            StepRecord::Output { .. } => "output",
            StepRecord::Unexpected { step } => step,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StepRecord::Output { .. })
    }
}

/// Decode and validate one raw model response.
pub fn decode(raw: &str) -> Result<StepRecord, ProtocolError> {
    let body = strip_code_fence(raw.trim());

    let value: Value = serde_json::from_str(body)
        .map_err(|e| ProtocolError::new(raw, format!("response is not valid JSON ({e})")))?;

    let Value::Object(object) = value else {
        return Err(ProtocolError::new(
            raw,
            "response must be a single JSON object",
        ));
    };

    let step = match object.get("step") {
        Some(Value::String(step)) if !step.trim().is_empty() => step.trim().to_string(),
        Some(_) => {
            return Err(ProtocolError::new(raw, "field 'step' must be a non-empty string"));
        }
        None => return Err(ProtocolError::new(raw, "missing required field 'step'")),
    };

    match step.as_str() {
        "think" => Ok(StepRecord::Think {
            content: required(&object, "content", &step, raw)?,
        }),
        "observe" => Ok(StepRecord::Observe {
            content: required(&object, "content", &step, raw)?,
        }),
        "output" => Ok(StepRecord::Output {
            content: required(&object, "content", &step, raw)?,
        }),
        "action" => Ok(StepRecord::Action {
            tool: required(&object, "tool", &step, raw)?,
            input: required(&object, "input", &step, raw)?,
        }),
        _ => Ok(StepRecord::Unexpected { step }),
    }
}

/// Encode a synthetic observation as the model expects to read it.
///
/// `step` is always the first key, matching the examples in the prompt.
pub fn encode_observation(content: &str) -> String {
    format!(
        r#"{{"step":"observe","content":{}}}"#,
        Value::String(content.to_string())
    )
}

fn required(
    object: &Map<String, Value>,
    field: &str,
    step: &str,
    raw: &str,
) -> Result<String, ProtocolError> {
    match object.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(ProtocolError::new(
            raw,
            format!("'{step}' step requires a non-empty string field '{field}'"),
        )),
    }
}

/// Strip one surrounding Markdown code fence (```json ... ```), if present.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line.
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}
