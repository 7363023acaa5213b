//! Delivery seam between the advisory client and the network.

use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::error::{AdvisoryError, Result};

/// Posts a JSON body and returns the reply body.
///
/// Non-success statuses are reported as [`AdvisoryError::Transport`]; the
/// client owns parsing and timeouts.
pub trait AdvisoryTransport: Send + Sync {
    /// POST `body` to `url`.
    fn post_json(&self, url: &str, body: String) -> impl Future<Output = Result<String>> + Send;
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Builds a transport with the advisor's user agent.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("skirmish-advisor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl AdvisoryTransport for ReqwestTransport {
    fn post_json(&self, url: &str, body: String) -> impl Future<Output = Result<String>> + Send {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
            debug!(%status, bytes = text.len(), "Advisory reply received");
            if !status.is_success() {
                return Err(AdvisoryError::Transport(format!("{status}\n{text}")));
            }
            Ok(text)
        }
    }
}
