//! Advisory client tests against an in-process transport.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skirmish_advisor::message::ChatRequest;
use skirmish_advisor::prelude::*;
use skirmish_core::registry::Allegiance;
use skirmish_core::simulation::Simulation;
use skirmish_core::snapshot::GameStateData;
use skirmish_test_utils::fixtures::{ground, rifleman, spawn};

#[derive(Debug, Clone)]
enum Reply {
    Body(String),
    Fail(String),
}

/// Replays a canned reply after an optional delay and records what it was sent.
#[derive(Debug, Clone)]
struct ScriptedTransport {
    reply: Reply,
    delay: Duration,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedTransport {
    fn answering(content: &str) -> Self {
        let body = serde_json::json!({
            "id": "cmpl-test",
            "model": "llama-3",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}],
        });
        Self {
            reply: Reply::Body(body.to_string()),
            delay: Duration::ZERO,
            sent: Arc::default(),
        }
    }

    fn raw(body: &str) -> Self {
        Self {
            reply: Reply::Body(body.to_string()),
            ..Self::answering("")
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Reply::Fail(message.to_string()),
            ..Self::answering("")
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl AdvisoryTransport for ScriptedTransport {
    fn post_json(&self, url: &str, body: String) -> impl Future<Output = Result<String>> + Send {
        self.sent.lock().unwrap().push((url.to_string(), body));
        let reply = self.reply.clone();
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            match reply {
                Reply::Body(body) => Ok(body),
                Reply::Fail(message) => Err(AdvisoryError::Transport(message)),
            }
        }
    }
}

fn skirmish_state() -> GameStateData {
    let mut sim = Simulation::default();
    let a = spawn(&mut sim, Allegiance::Player, ground(0, 0), rifleman());
    let b = spawn(&mut sim, Allegiance::Enemy, ground(6, 0), rifleman());
    sim.set_target(a, b).unwrap();
    sim.save_state()
}

fn user_content(body: &str) -> String {
    let json: serde_json::Value = serde_json::from_str(body).unwrap();
    json["messages"][1]["content"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn analyze_embeds_state_under_prompt() {
    let transport = ScriptedTransport::answering("Focus fire on unit-1.");
    let client = AdvisoryClient::with_transport(AdvisorConfig::default(), transport.clone());
    let state = skirmish_state();
    let expected_state = serde_json::to_string_pretty(&state).unwrap();

    let advice = client.analyze("Provide strategic recommendations.", state).await.unwrap();
    assert_eq!(advice, "Focus fire on unit-1.");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "http://localhost:8080/v1/chat/completions");
    let content = user_content(&sent[0].1);
    assert_eq!(
        content,
        compose_prompt("Provide strategic recommendations.", &expected_state)
    );
    assert!(content.contains("\"attack_command\""));
}

#[tokio::test]
async fn request_body_matches_wire_format() {
    let transport = ScriptedTransport::answering("ok");
    let config = AdvisorConfig {
        model: "mistral".to_string(),
        temperature: 0.1,
        ..AdvisorConfig::default()
    };
    let client = AdvisoryClient::with_transport(config.clone(), transport.clone());
    client.send_prompt("status?").await.unwrap();

    let sent = transport.sent();
    let expected = serde_json::to_value(ChatRequest::new(&config, "status?")).unwrap();
    let actual: serde_json::Value = serde_json::from_str(&sent[0].1).unwrap();
    assert_eq!(actual, expected);
    assert_eq!(actual["stream"], false);
    assert_eq!(actual["model"], "mistral");
}

#[tokio::test]
async fn empty_and_malformed_replies_are_errors() {
    let empty = AdvisoryClient::with_transport(
        AdvisorConfig::default(),
        ScriptedTransport::raw(r#"{"choices": []}"#),
    );
    assert!(matches!(empty.send_prompt("?").await, Err(AdvisoryError::EmptyResponse)));

    let garbage = AdvisoryClient::with_transport(
        AdvisorConfig::default(),
        ScriptedTransport::raw("Bad Gateway"),
    );
    assert!(matches!(garbage.send_prompt("?").await, Err(AdvisoryError::Malformed(_))));
}

#[tokio::test]
async fn transport_failure_is_reported() {
    let client = AdvisoryClient::with_transport(
        AdvisorConfig::default(),
        ScriptedTransport::failing("connection refused"),
    );
    let err = client.send_prompt("?").await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
    assert!(!client.test_connection().await);
}

#[tokio::test(start_paused = true)]
async fn slow_server_times_out() {
    let config = AdvisorConfig {
        timeout_secs: 2,
        ..AdvisorConfig::default()
    };
    let transport = ScriptedTransport::answering("too late").delayed(Duration::from_secs(5));
    let client = AdvisoryClient::with_transport(config, transport);

    let err = client.analyze("?", skirmish_state()).await.unwrap_err();
    assert!(matches!(err, AdvisoryError::Timeout(d) if d == Duration::from_secs(2)));
}

#[tokio::test]
async fn connection_probe_uses_fixed_prompt() {
    let transport = ScriptedTransport::answering("OK");
    let client = AdvisoryClient::with_transport(AdvisorConfig::default(), transport.clone());
    assert!(client.test_connection().await);
    assert_eq!(user_content(&transport.sent()[0].1), CONNECTION_PROBE);
}

#[tokio::test]
async fn spawned_analysis_delivers_over_channel() {
    let transport =
        ScriptedTransport::answering("Hold position.").delayed(Duration::from_millis(20));
    let client = AdvisoryClient::with_transport(AdvisorConfig::default(), transport);

    let mut state = skirmish_state();
    let mut pending = client.spawn_analysis("Advise.", state.clone());
    assert!(pending.try_take().is_none());

    // The caller's copy is independent of the one in flight.
    state.units.clear();
    assert_eq!(pending.wait().await.unwrap(), "Hold position.");
}
