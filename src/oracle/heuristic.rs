#![cfg(feature = "std")]

use std::sync::Arc;

use tokio::time::{sleep, Duration};

use crate::ai::{best_target, estimate_odds};
use crate::bitboard::Cells;
use crate::correlator::{CorrelationId, OracleResponse};
use crate::events::EventRegistry;
use crate::oracle::OracleClient;
use crate::parser::{ODDS_TAG, PLACE_TAG};
use crate::prompt::parse_grids;

pub const HEURISTIC_FUNCTION: &str = "density";

/// Local stand-in for a language model. Reads the boards back out of the
/// prompt, picks the densest unknown cell and answers in the tagged format
/// after `latency`.
pub struct HeuristicOracle {
    responses: Arc<EventRegistry<OracleResponse>>,
    latency: Duration,
}

impl HeuristicOracle {
    pub fn new(latency: Duration) -> Self {
        Self {
            responses: Arc::new(EventRegistry::new()),
            latency,
        }
    }
}

impl Default for HeuristicOracle {
    fn default() -> Self {
        Self::new(Duration::from_millis(50))
    }
}

#[async_trait::async_trait]
impl OracleClient for HeuristicOracle {
    async fn start_request(
        &self,
        id: CorrelationId,
        prompt: &str,
        _model: &str,
    ) -> anyhow::Result<()> {
        let view =
            parse_grids(prompt).ok_or_else(|| anyhow::anyhow!("prompt holds no board grids"))?;
        let shot = best_target(&view.targets, &Cells::new())
            .ok_or_else(|| anyhow::anyhow!("no unknown cells left to suggest"))?;
        let odds = estimate_odds(&view.targets, &view.defense);
        let content = format!(
            "The densest open cell is {shot}. {PLACE_TAG}{shot}| and I'll offer {ODDS_TAG}{odds}|"
        );
        log::debug!("heuristic oracle request {} -> {}", id, content);

        let responses = Arc::clone(&self.responses);
        let latency = self.latency;
        tokio::spawn(async move {
            sleep(latency).await;
            responses.emit(&OracleResponse::reply(id, content, HEURISTIC_FUNCTION));
        });
        Ok(())
    }

    fn responses(&self) -> &EventRegistry<OracleResponse> {
        &self.responses
    }
}
