//! Shared test helpers for agent loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use termagent_core::error::ProviderError;
use termagent_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

use crate::step_event::{StepEvent, StepSink};

/// A mock provider that plays back a script of results and records every
/// request it receives.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        let mut script = self.script.lock().unwrap();
        match script.pop_front() {
            Some(Ok(mut response)) => {
                response.model = request.model;
                Ok(response)
            }
            Some(Err(e)) => Err(e),
            None => panic!("ScriptedProvider: no more responses (call #{call})"),
        }
    }
}

/// Records every event it receives.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<StepEvent>>,
}

impl CollectingSink {
    pub fn events(&self) -> Vec<StepEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl StepSink for CollectingSink {
    fn emit(&self, event: StepEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// A response whose content is exactly `content`.
pub fn raw_turn(content: &str) -> ProviderResponse {
    ProviderResponse {
        content: content.to_string(),
        model: String::new(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

/// A well-formed `think`/`observe`/`output` turn.
pub fn turn(kind: &str, content: &str) -> ProviderResponse {
    raw_turn(
        &serde_json::json!({ "step": kind, "tool": "", "input": "", "content": content })
            .to_string(),
    )
}

/// A well-formed `action` turn.
pub fn action_turn(tool: &str, input: &str) -> ProviderResponse {
    raw_turn(
        &serde_json::json!({ "step": "action", "tool": tool, "input": input, "content": "" })
            .to_string(),
    )
}
