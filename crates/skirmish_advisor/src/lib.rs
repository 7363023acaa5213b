//! # Skirmish Advisor
//!
//! Sends a copy of the skirmish mirror to an OpenAI-style chat-completion
//! server and returns its tactical advice.
//!
//! The simulation never waits on this crate: [`AdvisoryClient::analyze`]
//! takes an owned [`GameStateData`](skirmish_core::snapshot::GameStateData)
//! and [`AdvisoryClient::spawn_analysis`] runs it on tokio, handing back a
//! [`PendingAdvice`] the tick loop can poll.
//!
//! ## Usage
//!
//! ```ignore
//! use skirmish_advisor::prelude::*;
//!
//! let client = AdvisoryClient::from_config(AdvisorConfig::default())?;
//! let advice = client
//!     .analyze("Provide strategic recommendations.", sim.save_state())
//!     .await?;
//! ```
//!
//! Custom transports implement [`AdvisoryTransport`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod transport;

pub use client::{AdvisoryClient, PendingAdvice};
pub use config::AdvisorConfig;
pub use error::{AdvisoryError, Result};
pub use transport::{AdvisoryTransport, ReqwestTransport};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{AdvisoryClient, PendingAdvice, CONNECTION_PROBE};
    pub use crate::config::AdvisorConfig;
    pub use crate::error::{AdvisoryError, Result};
    pub use crate::message::compose_prompt;
    pub use crate::transport::{AdvisoryTransport, ReqwestTransport};
}
