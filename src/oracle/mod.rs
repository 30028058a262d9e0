#![cfg(feature = "std")]

//! Move-suggestion oracles. A request only starts generation; the reply
//! arrives later through [`OracleClient::responses`] carrying the caller's
//! correlation id.

use crate::correlator::{CorrelationId, OracleResponse};
use crate::events::EventRegistry;

pub mod heuristic;
pub mod ollama;

pub use heuristic::HeuristicOracle;
pub use ollama::{OllamaConfig, OllamaOracle};

#[async_trait::async_trait]
pub trait OracleClient: Send + Sync {
    /// Begin generating a reply to `prompt`. Returning `Ok` only means the
    /// request was accepted.
    async fn start_request(
        &self,
        id: CorrelationId,
        prompt: &str,
        model: &str,
    ) -> anyhow::Result<()>;

    /// Notification category for replies.
    fn responses(&self) -> &EventRegistry<OracleResponse>;

    async fn health(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
