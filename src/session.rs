#![cfg(feature = "std")]

//! One game, driven from fleet placement to the end by a polling loop.

use std::sync::Arc;

use anyhow::anyhow;
use rand::rngs::SmallRng;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::agent::Collaborators;
use crate::bitboard::Cells;
use crate::board_view::{BoardView, TurnView};
use crate::config::{AgentConfig, FeePolicy, BOARD_CELLS};
use crate::correlator::{CorrelationError, ResponseCorrelator};
use crate::encryption::{seal_fleet, EncryptionService, SealedFleet};
use crate::error::AgentError;
use crate::fleet::{place_fleet, FleetSpec};
use crate::ledger::{
    padded_fees, GameId, GameRecord, GameStatus, LedgerCall, LedgerClient, PlayerId,
    ReceiptEvent, ShotReceipt,
};
use crate::oracle::OracleClient;
use crate::parser::{extract_odds, extract_shot};
use crate::prompt::build_prompt;
use crate::retry::{RetryOutcome, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
    /// Ended without a winner, or the winner is unknown to us.
    NoContest,
}

impl GameOutcome {
    pub(crate) fn from_status(status: &GameStatus, me: &PlayerId) -> Option<Self> {
        match status {
            GameStatus::Ended { winner } => Some(Self::from_winner(winner.as_ref(), me)),
            _ => None,
        }
    }

    fn from_winner(winner: Option<&PlayerId>, me: &PlayerId) -> Self {
        match winner {
            Some(w) if w == me => GameOutcome::Won,
            Some(_) => GameOutcome::Lost,
            None => GameOutcome::NoContest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    WaitingForTurn,
    /// Sleeping for one poll interval.
    Suspended,
    EvaluatingTurn,
    AwaitingSuggestion,
    Submitting,
    GameEnded(GameOutcome),
}

/// Where a submitted position came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotSource {
    Oracle,
    /// The oracle failed, timed out or gave an unusable reply.
    Fallback,
    /// The oracle kept repeating a fired position.
    Substituted,
}

/// Result of one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    NotMyTurn,
    /// The suggestion was already fired; nothing submitted this cycle.
    Skipped { position: u8 },
    Fired {
        position: u8,
        /// Only `true` when the receipt confirmed a hit.
        hit: bool,
        source: ShotSource,
    },
    Ended(GameOutcome),
}

pub(crate) async fn submit_fleet(
    ledger: &dyn LedgerClient,
    game: GameId,
    fleet: &SealedFleet,
    policy: FeePolicy,
) -> anyhow::Result<()> {
    let call = LedgerCall::PlaceFleet {
        positions: fleet.positions.len(),
    };
    let fees = padded_fees(ledger, game, call, &policy).await?;
    ledger.place_fleet(game, fleet, fees).await
}

pub(crate) async fn submit_shot(
    ledger: &dyn LedgerClient,
    game: GameId,
    position: u8,
    policy: FeePolicy,
) -> anyhow::Result<ShotReceipt> {
    let fees = padded_fees(ledger, game, LedgerCall::FireShot { position }, &policy).await?;
    ledger.fire_shot(game, position, fees).await
}

async fn submit_odds(
    ledger: &dyn LedgerClient,
    game: GameId,
    odds: u32,
    policy: FeePolicy,
) -> anyhow::Result<()> {
    let fees = padded_fees(ledger, game, LedgerCall::UpdateOdds { odds }, &policy).await?;
    ledger.update_odds(game, odds, fees).await
}

/// Per-game orchestrator. Owns the game's fired-shots set and board view;
/// nothing here is shared with other games.
pub struct GameSession {
    game: GameId,
    ledger: Arc<dyn LedgerClient>,
    oracle: Arc<dyn OracleClient>,
    encryption: Option<Arc<dyn EncryptionService>>,
    correlator: Arc<ResponseCorrelator>,
    config: AgentConfig,
    retry: RetryPolicy,
    rng: SmallRng,
    state: TurnState,
    fired: Cells,
    view: TurnView,
    duplicate_streak: u32,
    pending_odds: Option<JoinHandle<RetryOutcome<()>>>,
}

impl GameSession {
    pub fn new(game: GameId, deps: &Collaborators, config: AgentConfig, rng: SmallRng) -> Self {
        Self {
            game,
            ledger: Arc::clone(&deps.ledger),
            oracle: Arc::clone(&deps.oracle),
            encryption: deps.encryption.clone(),
            correlator: Arc::clone(&deps.correlator),
            retry: RetryPolicy::from_config(&config),
            config,
            rng,
            state: TurnState::WaitingForTurn,
            fired: Cells::new(),
            view: TurnView::default(),
            duplicate_streak: 0,
            pending_odds: None,
        }
    }

    pub fn game(&self) -> GameId {
        self.game
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Positions this session has submitted so far.
    pub fn fired(&self) -> Cells {
        self.fired
    }

    /// Board view as of the last evaluated turn, plus confirmed shot results.
    pub fn view(&self) -> &TurnView {
        &self.view
    }

    fn me(&self) -> &PlayerId {
        self.ledger.account()
    }

    /// Take a seat if needed and commit a fleet if ours is not placed yet.
    pub async fn setup(&mut self) -> anyhow::Result<()> {
        let game = self.game;
        let ledger = Arc::clone(&self.ledger);
        let mut record = ledger.game(game).await?;
        if record.role_of(ledger.account()).is_none() {
            if record.status != GameStatus::Open {
                return Err(anyhow!("game {} has no free seat", game));
            }
            ledger.join_game(game).await?;
            log::info!("game {}: joined as {}", game, ledger.account());
            record = ledger.game(game).await?;
        }
        let role = record
            .role_of(ledger.account())
            .ok_or_else(|| anyhow!("not seated in game {} after joining", game))?;
        if record.fleets_placed[role.index()] {
            return Ok(());
        }

        let fleet = place_fleet(&mut self.rng, &FleetSpec::standard());
        let sealed = seal_fleet(self.encryption.as_deref(), &fleet).await?;
        let policy = self.config.fees;
        let ledger_ref: &dyn LedgerClient = ledger.as_ref();
        let sealed_ref = &sealed;
        self.retry
            .submit("place_fleet", move |_| {
                submit_fleet(ledger_ref, game, sealed_ref, policy)
            })
            .await
            .into_result()?;
        log::info!(
            "game {}: fleet placed ({:?}, {} cells)",
            game,
            sealed.mode,
            sealed.positions.len()
        );
        Ok(())
    }

    /// Set up, then poll until the game ends. A pending odds update is
    /// always settled before this returns.
    pub async fn run(&mut self) -> anyhow::Result<GameOutcome> {
        let result = self.drive().await;
        self.settle_odds().await;
        result
    }

    async fn drive(&mut self) -> anyhow::Result<GameOutcome> {
        self.setup().await?;
        loop {
            match self.step().await? {
                StepOutcome::Ended(outcome) => return Ok(outcome),
                other => {
                    log::debug!("game {}: {:?}", self.game, other);
                    self.state = TurnState::Suspended;
                    sleep(self.config.poll_interval()).await;
                }
            }
        }
    }

    /// One polling cycle: check ownership, refresh the view, ask the oracle,
    /// deduplicate and submit.
    pub async fn step(&mut self) -> anyhow::Result<StepOutcome> {
        if let TurnState::GameEnded(outcome) = self.state {
            return Ok(StepOutcome::Ended(outcome));
        }
        self.state = TurnState::WaitingForTurn;
        let record = self.ledger.game(self.game).await?;
        if let Some(outcome) = GameOutcome::from_status(&record.status, self.me()) {
            return Ok(self.finish(outcome).await);
        }
        if !record.is_my_turn(self.me()) {
            return Ok(StepOutcome::NotMyTurn);
        }

        self.state = TurnState::EvaluatingTurn;
        self.refresh_view(&record).await?;

        self.settle_odds().await;
        self.state = TurnState::AwaitingSuggestion;
        let model = if record.model.is_empty() {
            self.config.model.clone()
        } else {
            record.model.clone()
        };
        let (suggested, source) = match self.request_reply(&model).await {
            Ok(content) => {
                // Odds go out whether or not the reply also holds a usable shot.
                if let Some(odds) = extract_odds(&content) {
                    self.spawn_odds_update(odds);
                }
                match extract_shot(&content) {
                    Ok(shot) => (shot, ShotSource::Oracle),
                    Err(_) => self.fall_back(AgentError::UnparsableSuggestion)?,
                }
            }
            Err(e) => self.fall_back(e)?,
        };

        let (position, source) = if self.is_unfired(suggested as usize) {
            self.duplicate_streak = 0;
            (suggested, source)
        } else if self.duplicate_streak < self.config.max_duplicate_skips {
            self.duplicate_streak += 1;
            log::info!(
                "game {}: {} was already fired, skipping this cycle",
                self.game,
                suggested
            );
            self.state = TurnState::WaitingForTurn;
            return Ok(StepOutcome::Skipped {
                position: suggested,
            });
        } else {
            self.duplicate_streak = 0;
            let substitute = self.random_unfired()?;
            log::info!(
                "game {}: {} repeated again, firing at {} instead",
                self.game,
                suggested,
                substitute
            );
            (substitute, ShotSource::Substituted)
        };

        self.submit(position, source).await
    }

    async fn refresh_view(&mut self, record: &GameRecord) -> anyhow::Result<()> {
        let me = self.me().clone();
        let opponent = record
            .opponent_of(&me)
            .cloned()
            .ok_or_else(|| anyhow!("game {} has no opponent", self.game))?;
        let targets = self.ledger.cell_status(self.game, &opponent).await?;
        let defense = self.ledger.cell_status(self.game, &me).await?;
        self.view = TurnView {
            targets: BoardView::from_status(&targets)?,
            defense: BoardView::from_status(&defense)?,
        };
        Ok(())
    }

    /// Ask the oracle and wait for the correlated reply text.
    async fn request_reply(&self, model: &str) -> Result<String, AgentError> {
        let prompt = build_prompt(&self.view);
        let id = self.correlator.next_id();
        let pending = self
            .correlator
            .register(id, self.config.oracle_timeout())
            .map_err(|e| AgentError::OracleUnavailable(e.to_string()))?;
        self.oracle
            .start_request(id, &prompt, model)
            .await
            .map_err(|e| AgentError::OracleUnavailable(format!("{:#}", e)))?;
        let response = pending.wait().await.map_err(|e| match e {
            CorrelationError::Timeout { id, after } => AgentError::OracleTimeout { id, after },
            CorrelationError::Failed { cause, .. } => AgentError::OracleUnavailable(cause),
            other => AgentError::OracleUnavailable(other.to_string()),
        })?;
        log::debug!(
            "game {}: oracle {} replied via {}: {}",
            self.game,
            id,
            response.function_name,
            response.content
        );
        Ok(response.content)
    }

    fn fall_back(&mut self, cause: AgentError) -> Result<(u8, ShotSource), AgentError> {
        log::warn!("game {}: falling back to a random shot: {}", self.game, cause);
        Ok((self.random_unfired()?, ShotSource::Fallback))
    }

    fn spawn_odds_update(&mut self, odds: u32) {
        let ledger = Arc::clone(&self.ledger);
        let retry = self.retry;
        let game = self.game;
        let policy = self.config.fees;
        self.pending_odds = Some(tokio::spawn(async move {
            let ledger_ref: &dyn LedgerClient = ledger.as_ref();
            retry
                .submit("update_odds", move |_| {
                    submit_odds(ledger_ref, game, odds, policy)
                })
                .await
        }));
    }

    /// Wait for the previous odds update, logging its failure.
    async fn settle_odds(&mut self) {
        let Some(handle) = self.pending_odds.take() else {
            return;
        };
        match handle.await {
            Ok(outcome) if outcome.succeeded() => {
                log::debug!("game {}: odds update landed", self.game);
            }
            Ok(outcome) => {
                if let Err(e) = outcome.into_result() {
                    log::error!("game {}: giving up on odds update: {}", self.game, e);
                }
            }
            Err(e) => log::error!("game {}: odds update task failed: {}", self.game, e),
        }
    }

    async fn submit(&mut self, position: u8, source: ShotSource) -> anyhow::Result<StepOutcome> {
        self.state = TurnState::Submitting;
        self.fired.insert(position as usize)?;
        let game = self.game;
        let ledger = Arc::clone(&self.ledger);
        let ledger_ref: &dyn LedgerClient = ledger.as_ref();
        let policy = self.config.fees;
        let receipt = self
            .retry
            .submit("fire_shot", move |_| {
                submit_shot(ledger_ref, game, position, policy)
            })
            .await
            .into_result()?;

        let mut confirmed = None;
        let mut ended = None;
        for event in receipt.events {
            match event {
                ReceiptEvent::ShotFired(e) if e.position == position => confirmed = Some(e.hit),
                ReceiptEvent::ShotFired(_) => {}
                ReceiptEvent::GameEnded(e) => ended = Some(e.winner),
            }
        }
        let hit = match confirmed {
            Some(hit) => {
                self.view.targets.record(position as usize, hit)?;
                log::info!(
                    "game {}: fired at {} ({:?}): {}",
                    game,
                    position,
                    source,
                    if hit { "hit" } else { "miss" }
                );
                hit
            }
            // Left unresolved; the next refresh reads the authoritative board.
            None => {
                log::warn!(
                    "game {}: receipt for {} carried no shot result",
                    game,
                    position
                );
                false
            }
        };

        if let Some(winner) = ended {
            let outcome = GameOutcome::from_winner(winner.as_ref(), self.me());
            return Ok(self.finish(outcome).await);
        }
        self.state = TurnState::WaitingForTurn;
        Ok(StepOutcome::Fired {
            position,
            hit,
            source,
        })
    }

    fn is_unfired(&self, position: usize) -> bool {
        position < BOARD_CELLS
            && !self.fired.contains(position)
            && !self.view.targets.is_resolved(position)
    }

    /// Uniform choice among cells neither fired by us nor resolved.
    fn random_unfired(&mut self) -> Result<u8, AgentError> {
        let open: Vec<usize> = (0..BOARD_CELLS).filter(|&p| self.is_unfired(p)).collect();
        if open.is_empty() {
            return Err(AgentError::BoardExhausted);
        }
        let pick = open[self.rng.random_range(0..open.len())];
        Ok(pick as u8)
    }

    async fn finish(&mut self, outcome: GameOutcome) -> StepOutcome {
        self.settle_odds().await;
        self.state = TurnState::GameEnded(outcome);
        log::info!("game {}: ended, {:?}", self.game, outcome);
        StepOutcome::Ended(outcome)
    }
}
