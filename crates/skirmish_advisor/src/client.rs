//! Advisory client: prompt composition, timeout and background delivery.

use skirmish_core::snapshot::GameStateData;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn};

use crate::config::AdvisorConfig;
use crate::error::{AdvisoryError, Result};
use crate::message::{compose_prompt, ChatRequest, ChatResponse};
use crate::transport::{AdvisoryTransport, ReqwestTransport};

/// Prompt used by [`AdvisoryClient::test_connection`].
pub const CONNECTION_PROBE: &str = "Respond with 'OK'";

/// Asks a chat-completion server for tactical advice.
#[derive(Debug, Clone)]
pub struct AdvisoryClient<T = ReqwestTransport> {
    config: AdvisorConfig,
    transport: T,
}

impl AdvisoryClient<ReqwestTransport> {
    /// Client talking HTTP to `config.full_url()`.
    pub fn from_config(config: AdvisorConfig) -> Result<Self> {
        Ok(Self::with_transport(config, ReqwestTransport::new()?))
    }
}

impl<T: AdvisoryTransport> AdvisoryClient<T> {
    /// Client using a custom transport.
    pub fn with_transport(config: AdvisorConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Current configuration.
    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Mutable configuration; applies to the next request.
    pub fn config_mut(&mut self) -> &mut AdvisorConfig {
        &mut self.config
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a bare prompt and returns the first reply.
    pub async fn send_prompt(&self, prompt: &str) -> Result<String> {
        let body = serde_json::to_string(&ChatRequest::new(&self.config, prompt))?;
        let url = self.config.full_url();
        let timeout = self.config.timeout();
        debug!(%url, model = %self.config.model, "Sending advisory request");

        let reply = tokio::time::timeout(timeout, self.transport.post_json(&url, body))
            .await
            .map_err(|_| AdvisoryError::Timeout(timeout))??;
        ChatResponse::first_content(&reply)
    }

    /// Sends `prompt` with `state` embedded as pretty JSON.
    ///
    /// Takes the state by value so the simulation can keep ticking while
    /// the request is in flight.
    pub async fn analyze(&self, prompt: &str, state: GameStateData) -> Result<String> {
        let state_json = serde_json::to_string_pretty(&state)?;
        info!(units = state.units.len(), game_time = state.game_time, "Requesting analysis");
        self.send_prompt(&compose_prompt(prompt, &state_json)).await
    }

    /// Round-trips a trivial prompt; `true` when any reply came back.
    pub async fn test_connection(&self) -> bool {
        match self.send_prompt(CONNECTION_PROBE).await {
            Ok(reply) => {
                info!(%reply, "Advisory connection OK");
                true
            }
            Err(e) => {
                warn!(error = %e, "Advisory connection failed");
                false
            }
        }
    }
}

impl<T: AdvisoryTransport + Clone + 'static> AdvisoryClient<T> {
    /// Runs [`analyze`](Self::analyze) on the tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn spawn_analysis(&self, prompt: impl Into<String>, state: GameStateData) -> PendingAdvice {
        let (tx, rx) = oneshot::channel();
        let client = self.clone();
        let prompt = prompt.into();
        tokio::spawn(async move {
            let result = client.analyze(&prompt, state).await;
            if tx.send(result).is_err() {
                debug!("Advice receiver dropped before delivery");
            }
        });
        PendingAdvice { rx }
    }
}

/// Handle to an analysis running in the background.
#[derive(Debug)]
pub struct PendingAdvice {
    rx: oneshot::Receiver<Result<String>>,
}

impl PendingAdvice {
    /// Non-blocking poll; `None` while the request is in flight. A result
    /// is handed out once, later polls report [`AdvisoryError::Cancelled`].
    pub fn try_take(&mut self) -> Option<Result<String>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(AdvisoryError::Cancelled)),
        }
    }

    /// Waits for the result.
    pub async fn wait(self) -> Result<String> {
        self.rx.await.unwrap_or(Err(AdvisoryError::Cancelled))
    }
}
