#![cfg(feature = "std")]

//! Process-level dispatch: one isolated [`GameSession`] task per new game.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::AgentConfig;
use crate::correlator::{OracleResponse, ResponseCorrelator};
use crate::encryption::{probe_encryption, EncryptionService};
use crate::error::AgentError;
use crate::events::{GameCreated, GameEnded, GameJoined, LedgerEvents, ShotFired, SubscriptionId};
use crate::ledger::{GameId, LedgerClient};
use crate::oracle::OracleClient;
use crate::session::{GameOutcome, GameSession};

/// Client handles every game context receives explicitly.
pub struct Collaborators {
    pub ledger: Arc<dyn LedgerClient>,
    pub oracle: Arc<dyn OracleClient>,
    pub encryption: Option<Arc<dyn EncryptionService>>,
    pub correlator: Arc<ResponseCorrelator>,
    route: SubscriptionId,
}

impl Collaborators {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        oracle: Arc<dyn OracleClient>,
        encryption: Option<Arc<dyn EncryptionService>>,
    ) -> Self {
        Self::with_correlator(ledger, oracle, encryption, Arc::new(ResponseCorrelator::new()))
    }

    /// Route oracle notifications into `correlator`. Agents that share an
    /// oracle must also share the correlator so ids stay unique.
    pub fn with_correlator(
        ledger: Arc<dyn LedgerClient>,
        oracle: Arc<dyn OracleClient>,
        encryption: Option<Arc<dyn EncryptionService>>,
        correlator: Arc<ResponseCorrelator>,
    ) -> Self {
        let sink = Arc::clone(&correlator);
        let route = oracle
            .responses()
            .subscribe(move |response: &OracleResponse| {
                sink.dispatch(response.clone());
            });
        Self {
            ledger,
            oracle,
            encryption,
            correlator,
            route,
        }
    }

    /// Stop routing oracle notifications. Returns `false` if already detached.
    pub fn detach(&self) -> bool {
        self.oracle.responses().unsubscribe(self.route)
    }
}

/// New games created by other accounts, plus the subscriptions feeding them.
pub struct GameFeed {
    games: mpsc::UnboundedReceiver<GameId>,
    created: SubscriptionId,
    joined: SubscriptionId,
    shots: SubscriptionId,
    ended: SubscriptionId,
}

impl GameFeed {
    /// Next announced game, or `None` once the feed is closed.
    pub async fn next_game(&mut self) -> Option<GameId> {
        self.games.recv().await
    }

    /// Remove every subscription this feed holds.
    pub fn close(self, events: &LedgerEvents) {
        events.game_created.unsubscribe(self.created);
        events.game_joined.unsubscribe(self.joined);
        events.shot_fired.unsubscribe(self.shots);
        events.game_ended.unsubscribe(self.ended);
    }
}

#[derive(Debug)]
pub struct GameReport {
    pub game: GameId,
    /// Outcome, or the cause that stopped this game.
    pub result: Result<GameOutcome, String>,
}

pub struct Agent {
    deps: Collaborators,
    config: AgentConfig,
    seed: Option<u64>,
}

impl Agent {
    pub fn new(deps: Collaborators, config: AgentConfig) -> Self {
        Self {
            deps,
            config,
            seed: None,
        }
    }

    /// Derive every game's RNG from `seed` for reproducible runs.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.deps
    }

    /// Check required collaborators. An unreachable ledger or oracle is
    /// fatal; a broken encryption service only downgrades fleet submission.
    pub async fn preflight(&mut self) -> Result<(), AgentError> {
        self.deps
            .ledger
            .health()
            .await
            .map_err(|e| AgentError::FatalSetupFailure(format!("ledger: {:#}", e)))?;
        self.deps
            .oracle
            .health()
            .await
            .map_err(|e| AgentError::FatalSetupFailure(format!("oracle: {:#}", e)))?;
        match &self.deps.encryption {
            Some(service) => {
                if let Err(e) = probe_encryption(service.as_ref()).await {
                    log::warn!("Warning: {}; fleets will be submitted unencrypted", e);
                    self.deps.encryption = None;
                }
            }
            None => log::warn!("Warning: no encryption service configured"),
        }
        log::info!("agent {} ready", self.deps.ledger.account());
        Ok(())
    }

    /// Subscribe to the ledger's lifecycle events. Games created by other
    /// accounts are queued on the returned feed.
    pub fn listen(&self) -> GameFeed {
        let events = self.deps.ledger.events();
        let me = self.deps.ledger.account().clone();
        let (tx, games) = mpsc::unbounded_channel();

        let created = events.game_created.subscribe(move |e: &GameCreated| {
            if e.creator == me {
                return;
            }
            log::info!("game {} created by {}", e.game_id, e.creator);
            if tx.send(e.game_id).is_err() {
                log::debug!("game {} announced after the feed closed", e.game_id);
            }
        });
        let joined = events.game_joined.subscribe(|e: &GameJoined| {
            log::info!("game {} joined by {}", e.game_id, e.player);
        });
        let shots = events.shot_fired.subscribe(|e: &ShotFired| {
            log::info!(
                "game {}: {} fired at {}: {}",
                e.game_id,
                e.shooter,
                e.position,
                if e.hit { "hit" } else { "miss" }
            );
        });
        let ended = events.game_ended.subscribe(|e: &GameEnded| match &e.winner {
            Some(winner) => log::info!("game {} ended, winner {}", e.game_id, winner),
            None => log::info!("game {} ended without a winner", e.game_id),
        });

        GameFeed {
            games,
            created,
            joined,
            shots,
            ended,
        }
    }

    fn game_rng(&self, game: GameId) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(game.0)),
            None => {
                let mut seed_rng = rand::rng();
                SmallRng::from_rng(&mut seed_rng)
            }
        }
    }

    /// Play up to `max_games` games from `feed`, each on its own task, and
    /// report every one of them. A failing game never stops the others.
    pub async fn serve(&self, mut feed: GameFeed, max_games: usize) -> Vec<GameReport> {
        let mut running: Vec<(GameId, JoinHandle<anyhow::Result<GameOutcome>>)> = Vec::new();
        while running.len() < max_games {
            let Some(game) = feed.next_game().await else {
                break;
            };
            let mut session =
                GameSession::new(game, &self.deps, self.config.clone(), self.game_rng(game));
            running.push((game, tokio::spawn(async move { session.run().await })));
        }

        let mut reports = Vec::with_capacity(running.len());
        for (game, handle) in running {
            let result = match handle.await {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(e)) => {
                    log::error!("game {} stopped: {:#}", game, e);
                    Err(format!("{:#}", e))
                }
                Err(e) => {
                    log::error!("game {} task failed: {}", game, e);
                    Err(e.to_string())
                }
            };
            reports.push(GameReport { game, result });
        }
        feed.close(self.deps.ledger.events());
        reports
    }
}
