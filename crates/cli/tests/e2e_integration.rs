//! End-to-end tests for the termagent agent loop.
//!
//! These drive whole queries through the public crate APIs: transcript,
//! step codec, tool registry, model fallback and, for the HTTP scenarios,
//! the real OpenAI-compatible client against a mock server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use termagent_agent::{AbortReason, AgentLoop, QueryOutcome, StepEvent, StepSink};
use termagent_config::ToolsConfig;
use termagent_core::error::ProviderError;
use termagent_core::message::Role;
use termagent_core::provider::{Provider, ProviderRequest, ProviderResponse};
use termagent_core::step::encode_observation;
use termagent_providers::{ModelFallback, OpenAiCompatProvider};
use termagent_tools::default_registry;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Mock Provider ────────────────────────────────────────────────────────

/// A mock provider that returns scripted responses in sequence and keeps
/// every request it saw.
struct ScriptedProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop()
            .expect("ScriptedProvider: no more responses")
            .map(|mut r| {
                r.model = request.model;
                r
            })
    }
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<StepEvent>>);

impl StepSink for RecordingSink {
    fn emit(&self, event: StepEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn step(value: serde_json::Value) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        content: value.to_string(),
        model: String::new(),
        usage: None,
    })
}

fn agent_with(provider: Arc<dyn Provider>, models: &[&str]) -> AgentLoop {
    let tools = Arc::new(default_registry(&ToolsConfig::default()));
    let prompt = termagent_agent::default_system_prompt(&tools);
    AgentLoop::new(
        provider,
        ModelFallback::from_names(models.iter().copied()).unwrap(),
        tools,
        prompt,
    )
}

fn completion(content: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content.to_string() } }]
    }))
}

fn http_provider(server: &MockServer) -> Arc<dyn Provider> {
    Arc::new(
        OpenAiCompatProvider::new("e2e", server.uri(), "sk-test", Duration::from_secs(5)).unwrap(),
    )
}

// ── Scenario A: weather lookup ───────────────────────────────────────────

#[tokio::test]
async fn scenario_weather_lookup() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        step(serde_json::json!({"step": "think", "tool": "", "input": "", "content": "The user wants the weather in Patiala."})),
        step(serde_json::json!({"step": "action", "tool": "getWeatherInfo", "input": "Patiala", "content": ""})),
        step(serde_json::json!({"step": "output", "tool": "", "input": "", "content": "The weather in Patiala is 30°C."})),
    ]));
    let sink = Arc::new(RecordingSink::default());
    let mut agent = agent_with(provider.clone(), &["gemini-2.5-pro"]).with_sink(sink.clone());

    let (outcome, transcript) = agent
        .process_with_transcript("what is weather of Patiala?", &CancellationToken::new())
        .await;

    match outcome {
        QueryOutcome::Terminated {
            answer,
            model,
            iterations,
        } => {
            assert!(answer.contains("30°C"));
            assert_eq!(model, "gemini-2.5-pro");
            assert_eq!(iterations, 3);
        }
        other => panic!("expected an answer, got {other:?}"),
    }

    let messages = transcript.snapshot();
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].content, "what is weather of Patiala?");
    let observation = &messages[4];
    assert_eq!(observation.role, Role::User);
    assert_eq!(
        observation.content,
        encode_observation("Patiala has 30°C temperature.")
    );
    assert_eq!(provider.requests().len(), 3);

    let events = sink.0.lock().unwrap().clone();
    assert!(matches!(events.first(), Some(StepEvent::Thinking { .. })));
    assert!(matches!(events.last(), Some(StepEvent::Answer { .. })));
}

// ── Scenario B: a failing command, then a corrected one ──────────────────

#[cfg(unix)]
#[tokio::test]
async fn scenario_command_correction() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        step(serde_json::json!({"step": "action", "tool": "executeCommand", "input": "list", "content": ""})),
        step(serde_json::json!({"step": "think", "content": "'list' is not a command, try ls."})),
        step(serde_json::json!({"step": "action", "tool": "executeCommand", "input": "ls", "content": ""})),
        step(serde_json::json!({"step": "output", "content": "Files: Cargo.toml, src, tests"})),
    ]));
    let mut agent = agent_with(provider.clone(), &["gemini-2.5-pro"]);

    let outcome = agent.process("list files", &CancellationToken::new()).await;
    assert!(outcome.is_terminated());

    let requests = provider.requests();
    assert_eq!(requests.len(), 4);

    let failed = &requests[1].messages.last().unwrap().content;
    assert!(
        failed.contains("Tool execution failed: executeCommand"),
        "{failed}"
    );

    let listed = &requests[3].messages.last().unwrap().content;
    assert!(listed.contains("Cargo.toml"), "{listed}");
}

// ── Scenario C: 429 on the first model falls back to the second ──────────

#[tokio::test]
async fn scenario_rate_limit_fallback_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "model": "gemini-2.5-pro" })))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_string(r#"{"error":{"message":"Resource has been exhausted"}}"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({ "model": "gemini-2.5-flash" })))
        .respond_with(completion(
            serde_json::json!({"step": "output", "content": "Hello from flash"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let mut agent = agent_with(http_provider(&server), &["gemini-2.5-pro", "gemini-2.5-flash"]);
    let outcome = agent.process("hi", &CancellationToken::new()).await;

    assert_eq!(
        outcome,
        QueryOutcome::Terminated {
            answer: "Hello from flash".into(),
            model: "gemini-2.5-flash".into(),
            iterations: 2
        }
    );
    assert_eq!(agent.fallback().current_index(), 1);

    // Both requests carried the same transcript.
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    let first: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let second: serde_json::Value = serde_json::from_slice(&received[1].body).unwrap();
    assert_eq!(first["messages"], second["messages"]);
    assert_eq!(second["response_format"]["type"], "json_object");
}

// ── Scenario D: 401 aborts, the session keeps going ──────────────────────

#[tokio::test]
async fn scenario_unauthenticated_aborts_query_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"error":{"message":"API key not valid"}}"#),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(completion(
            serde_json::json!({"step": "output", "content": "second query answered"}),
        ))
        .mount(&server)
        .await;

    let mut agent = agent_with(http_provider(&server), &["gemini-2.5-pro", "gemini-2.5-flash"]);
    let cancel = CancellationToken::new();

    let first = agent.process("first", &cancel).await;
    match first {
        QueryOutcome::Aborted {
            reason: AbortReason::Api { error, last_message },
            iterations,
        } => {
            assert_eq!(error, ProviderError::Unauthenticated("API key not valid".into()));
            assert_eq!(last_message.as_deref(), Some("first"));
            assert_eq!(iterations, 1);
        }
        other => panic!("expected an abort, got {other:?}"),
    }
    assert_eq!(agent.fallback().current_index(), 0);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);

    let second = agent.process("second", &cancel).await;
    assert!(
        matches!(&second, QueryOutcome::Terminated { answer, model, .. }
            if answer == "second query answered" && model == "gemini-2.5-pro")
    );
}
