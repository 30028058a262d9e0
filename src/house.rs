#![cfg(feature = "std")]

//! Plain random opponent for local games and tests.

use std::sync::Arc;

use anyhow::anyhow;
use rand::rngs::SmallRng;
use rand::Rng;
use tokio::time::{sleep, Duration};

use crate::board_view::BoardView;
use crate::config::{FeePolicy, BOARD_CELLS};
use crate::encryption::{SealMode, SealedFleet, SealedPosition};
use crate::fleet::{place_fleet, Fleet, FleetSpec};
use crate::ledger::{GameId, LedgerClient};
use crate::session::{submit_fleet, submit_shot, GameOutcome};

pub struct HousePlayer {
    ledger: Arc<dyn LedgerClient>,
    rng: SmallRng,
    poll: Duration,
    fees: FeePolicy,
    fleet: Option<Fleet>,
}

impl HousePlayer {
    pub fn new(ledger: Arc<dyn LedgerClient>, rng: SmallRng, poll: Duration) -> Self {
        Self {
            ledger,
            rng,
            poll,
            fees: FeePolicy::default(),
            fleet: None,
        }
    }

    /// Fleet committed for the current game, once placed.
    pub fn fleet(&self) -> Option<&Fleet> {
        self.fleet.as_ref()
    }

    /// Create a game and commit a cleartext fleet to it.
    pub async fn open_game(&mut self, model: &str) -> anyhow::Result<GameId> {
        let game = self.ledger.create_game(model).await?;
        let fleet = place_fleet(&mut self.rng, &FleetSpec::standard());
        let sealed = SealedFleet {
            positions: fleet
                .positions()
                .into_iter()
                .map(|p| SealedPosition::Clear(p as u8))
                .collect(),
            mode: SealMode::Cleartext,
        };
        submit_fleet(self.ledger.as_ref(), game, &sealed, self.fees).await?;
        self.fleet = Some(fleet);
        Ok(game)
    }

    /// Fire uniformly at unknown cells whenever it is our turn, until the
    /// ledger reports the game over.
    pub async fn play(&mut self, game: GameId) -> anyhow::Result<GameOutcome> {
        let me = self.ledger.account().clone();
        loop {
            let record = self.ledger.game(game).await?;
            if let Some(outcome) = GameOutcome::from_status(&record.status, &me) {
                return Ok(outcome);
            }
            if !record.is_my_turn(&me) {
                sleep(self.poll).await;
                continue;
            }
            let opponent = record
                .opponent_of(&me)
                .cloned()
                .ok_or_else(|| anyhow!("game {} has no opponent", game))?;
            let targets =
                BoardView::from_status(&self.ledger.cell_status(game, &opponent).await?)?;
            let open: Vec<usize> = (0..BOARD_CELLS).filter(|&p| !targets.is_resolved(p)).collect();
            if open.is_empty() {
                return Err(anyhow!("game {}: no cells left to fire at", game));
            }
            let position = open[self.rng.random_range(0..open.len())] as u8;
            submit_shot(self.ledger.as_ref(), game, position, self.fees).await?;
        }
    }
}
