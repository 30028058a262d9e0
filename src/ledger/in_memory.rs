#![cfg(feature = "std")]

//! In-process ledger used by the local mode and by tests.
//!
//! It enforces the same rules a deployed game contract would: seats, turn
//! order, one fleet per player, no repeated shots, and a resource limit at
//! least as large as the quoted estimate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, bail};

use crate::config::{BOARD_CELLS, TOTAL_SHIP_CELLS};
use crate::encryption::{Ciphertext, SealedFleet, SealedPosition};
use crate::events::{GameCreated, GameEnded, GameJoined, LedgerEvents, ShotFired};
use crate::ledger::{
    GameId, GameRecord, GameStatus, LedgerCall, LedgerClient, PlayerId, ReceiptEvent,
    ResourceEstimate, Role, ShotReceipt, TxFees,
};

/// Recovers a plaintext position from a ciphertext submitted as a fleet.
pub type Unsealer = Box<dyn Fn(&Ciphertext) -> Option<u8> + Send + Sync>;

const UNIT_PRICE: u64 = 10;

/// Per-call counters, for tests and the local summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallLog {
    pub fleet_placements: u32,
    pub shot_attempts: u32,
    pub odds_attempts: u32,
}

#[derive(Default)]
struct Faults {
    shots: u32,
    odds: u32,
}

struct StoredGame {
    record: GameRecord,
    fleets: [Option<Vec<u8>>; 2],
    /// Shots landed on each player's board, indexed by `Role::index`.
    boards: [[u8; BOARD_CELLS]; 2],
    odds: [Option<u32>; 2],
}

#[derive(Default)]
struct LedgerState {
    next_game: u64,
    games: HashMap<GameId, StoredGame>,
    faults: Faults,
    calls: CallLog,
}

impl LedgerState {
    fn game_mut(&mut self, id: GameId) -> anyhow::Result<&mut StoredGame> {
        self.games
            .get_mut(&id)
            .ok_or_else(|| anyhow!("game {} does not exist", id))
    }
}

pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    events: LedgerEvents,
    unsealer: Option<Unsealer>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            events: LedgerEvents::new(),
            unsealer: None,
        }
    }

    /// Accept encrypted fleets, decoding each position with `unsealer`.
    pub fn with_unsealer<F>(mut self, unsealer: F) -> Self
    where
        F: Fn(&Ciphertext) -> Option<u8> + Send + Sync + 'static,
    {
        self.unsealer = Some(Box::new(unsealer));
        self
    }

    /// A client that signs every call as `account`.
    pub fn connect(self: &Arc<Self>, account: PlayerId) -> InMemoryClient {
        InMemoryClient {
            ledger: Arc::clone(self),
            account,
        }
    }

    pub fn events(&self) -> &LedgerEvents {
        &self.events
    }

    /// Reject the next `n` shot submissions as if the network dropped them.
    pub fn fail_next_shots(&self, n: u32) {
        self.lock().faults.shots = n;
    }

    /// Reject the next `n` odds updates.
    pub fn fail_next_odds_updates(&self, n: u32) {
        self.lock().faults.odds = n;
    }

    pub fn calls(&self) -> CallLog {
        self.lock().calls
    }

    pub fn record(&self, game: GameId) -> Option<GameRecord> {
        self.lock().games.get(&game).map(|g| g.record.clone())
    }

    /// Last odds accepted from `player`.
    pub fn odds(&self, game: GameId, player: &PlayerId) -> Option<u32> {
        let state = self.lock();
        let g = state.games.get(&game)?;
        let role = g.record.role_of(player)?;
        g.odds[role.index()]
    }

    /// Close a game from outside the turn flow (forfeit, admin action).
    pub fn end_game(&self, game: GameId, winner: Option<PlayerId>) -> anyhow::Result<()> {
        {
            let mut state = self.lock();
            let g = state.game_mut(game)?;
            if g.record.is_ended() {
                bail!("game {} already ended", game);
            }
            g.record.status = GameStatus::Ended {
                winner: winner.clone(),
            };
        }
        self.events.game_ended.emit(&GameEnded {
            game_id: game,
            winner,
        });
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn quote(call: LedgerCall) -> ResourceEstimate {
        let units = match call {
            LedgerCall::PlaceFleet { positions } => 50_000 + 20_000 * positions as u64,
            LedgerCall::FireShot { .. } => 60_000,
            LedgerCall::UpdateOdds { .. } => 30_000,
        };
        ResourceEstimate {
            units,
            unit_price: UNIT_PRICE,
        }
    }

    fn charge(call: LedgerCall, fees: TxFees) -> anyhow::Result<()> {
        let quote = Self::quote(call);
        if fees.limit < quote.units {
            bail!("out of resources: limit {} below {}", fees.limit, quote.units);
        }
        if fees.price < quote.unit_price {
            bail!("underpriced: {} below {}", fees.price, quote.unit_price);
        }
        Ok(())
    }

    fn unseal(&self, fleet: &SealedFleet) -> anyhow::Result<Vec<u8>> {
        let mut positions = Vec::with_capacity(fleet.positions.len());
        for sealed in &fleet.positions {
            let p = match sealed {
                SealedPosition::Clear(p) => *p,
                SealedPosition::Encrypted(ct) => {
                    let unsealer = self
                        .unsealer
                        .as_ref()
                        .ok_or_else(|| anyhow!("encrypted fleets are not supported"))?;
                    unsealer(ct).ok_or_else(|| anyhow!("ciphertext does not decode"))?
                }
            };
            positions.push(p);
        }
        if positions.len() != TOTAL_SHIP_CELLS {
            bail!(
                "fleet has {} positions, expected {}",
                positions.len(),
                TOTAL_SHIP_CELLS
            );
        }
        let mut seen = [false; BOARD_CELLS];
        for &p in &positions {
            let idx = p as usize;
            if idx >= BOARD_CELLS || seen[idx] {
                bail!("invalid or repeated fleet position {}", p);
            }
            seen[idx] = true;
        }
        Ok(positions)
    }

    fn create_game(&self, creator: &PlayerId, model: &str) -> GameId {
        let id = {
            let mut state = self.lock();
            state.next_game += 1;
            let id = GameId(state.next_game);
            state.games.insert(
                id,
                StoredGame {
                    record: GameRecord {
                        id,
                        player1: creator.clone(),
                        player2: None,
                        player1s_turn: true,
                        model: model.to_string(),
                        fleets_placed: [false, false],
                        status: GameStatus::Open,
                    },
                    fleets: [None, None],
                    boards: [[0; BOARD_CELLS]; 2],
                    odds: [None, None],
                },
            );
            id
        };
        self.events.game_created.emit(&GameCreated {
            game_id: id,
            creator: creator.clone(),
        });
        id
    }

    fn join_game(&self, game: GameId, player: &PlayerId) -> anyhow::Result<()> {
        {
            let mut state = self.lock();
            let g = state.game_mut(game)?;
            if g.record.status != GameStatus::Open {
                bail!("game {} is not open", game);
            }
            if &g.record.player1 == player {
                bail!("cannot join own game {}", game);
            }
            g.record.player2 = Some(player.clone());
            g.record.status = GameStatus::Active;
        }
        self.events.game_joined.emit(&GameJoined {
            game_id: game,
            player: player.clone(),
        });
        Ok(())
    }

    fn place_fleet(
        &self,
        game: GameId,
        player: &PlayerId,
        fleet: &SealedFleet,
        fees: TxFees,
    ) -> anyhow::Result<()> {
        Self::charge(
            LedgerCall::PlaceFleet {
                positions: fleet.positions.len(),
            },
            fees,
        )?;
        let positions = self.unseal(fleet)?;
        let mut state = self.lock();
        state.calls.fleet_placements += 1;
        let g = state.game_mut(game)?;
        if g.record.is_ended() {
            bail!("game {} has ended", game);
        }
        let role = g
            .record
            .role_of(player)
            .ok_or_else(|| anyhow!("{} is not seated in game {}", player, game))?;
        if g.fleets[role.index()].is_some() {
            bail!("fleet already placed for {}", player);
        }
        g.fleets[role.index()] = Some(positions);
        g.record.fleets_placed[role.index()] = true;
        Ok(())
    }

    fn fire_shot(
        &self,
        game: GameId,
        shooter: &PlayerId,
        position: u8,
        fees: TxFees,
    ) -> anyhow::Result<ShotReceipt> {
        Self::charge(LedgerCall::FireShot { position }, fees)?;
        let receipt = {
            let mut state = self.lock();
            state.calls.shot_attempts += 1;
            if state.faults.shots > 0 {
                state.faults.shots -= 1;
                bail!("shot submission dropped");
            }
            let g = state.game_mut(game)?;
            if !g.record.is_ready() {
                bail!("game {} is not in progress", game);
            }
            let role = g
                .record
                .role_of(shooter)
                .ok_or_else(|| anyhow!("{} is not seated in game {}", shooter, game))?;
            if g.record.mover() != role {
                bail!("not {}'s turn in game {}", shooter, game);
            }
            let idx = position as usize;
            if idx >= BOARD_CELLS {
                bail!("position {} is off the board", position);
            }
            let target = role.other().index();
            if g.boards[target][idx] != 0 {
                bail!("position {} was already fired at", position);
            }
            let hit = g.fleets[target]
                .as_ref()
                .map_or(false, |f| f.contains(&position));
            g.boards[target][idx] = if hit { 2 } else { 1 };
            g.record.player1s_turn = !g.record.player1s_turn;

            let mut events = vec![ReceiptEvent::ShotFired(ShotFired {
                game_id: game,
                shooter: shooter.clone(),
                position,
                hit,
            })];
            let sunk = g.boards[target].iter().filter(|&&c| c == 2).count();
            if sunk >= TOTAL_SHIP_CELLS {
                g.record.status = GameStatus::Ended {
                    winner: Some(shooter.clone()),
                };
                events.push(ReceiptEvent::GameEnded(GameEnded {
                    game_id: game,
                    winner: Some(shooter.clone()),
                }));
            }
            ShotReceipt { events }
        };
        for event in &receipt.events {
            match event {
                ReceiptEvent::ShotFired(e) => {
                    self.events.shot_fired.emit(e);
                }
                ReceiptEvent::GameEnded(e) => {
                    self.events.game_ended.emit(e);
                }
            }
        }
        Ok(receipt)
    }

    fn update_odds(
        &self,
        game: GameId,
        player: &PlayerId,
        odds: u32,
        fees: TxFees,
    ) -> anyhow::Result<()> {
        Self::charge(LedgerCall::UpdateOdds { odds }, fees)?;
        let mut state = self.lock();
        state.calls.odds_attempts += 1;
        if state.faults.odds > 0 {
            state.faults.odds -= 1;
            bail!("odds update dropped");
        }
        let g = state.game_mut(game)?;
        let role = g
            .record
            .role_of(player)
            .ok_or_else(|| anyhow!("{} is not seated in game {}", player, game))?;
        g.odds[role.index()] = Some(odds);
        Ok(())
    }

    fn cell_status(&self, game: GameId, player: &PlayerId) -> anyhow::Result<Vec<u8>> {
        let mut state = self.lock();
        let g = state.game_mut(game)?;
        let role: Role = g
            .record
            .role_of(player)
            .ok_or_else(|| anyhow!("{} is not seated in game {}", player, game))?;
        Ok(g.boards[role.index()].to_vec())
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// [`LedgerClient`] for one account on a shared [`InMemoryLedger`].
#[derive(Clone)]
pub struct InMemoryClient {
    ledger: Arc<InMemoryLedger>,
    account: PlayerId,
}

impl InMemoryClient {
    pub fn ledger(&self) -> &Arc<InMemoryLedger> {
        &self.ledger
    }
}

#[async_trait::async_trait]
impl LedgerClient for InMemoryClient {
    fn account(&self) -> &PlayerId {
        &self.account
    }

    fn events(&self) -> &LedgerEvents {
        &self.ledger.events
    }

    async fn health(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn create_game(&self, model: &str) -> anyhow::Result<GameId> {
        Ok(self.ledger.create_game(&self.account, model))
    }

    async fn join_game(&self, game: GameId) -> anyhow::Result<()> {
        self.ledger.join_game(game, &self.account)
    }

    async fn game(&self, game: GameId) -> anyhow::Result<GameRecord> {
        self.ledger
            .record(game)
            .ok_or_else(|| anyhow!("game {} does not exist", game))
    }

    async fn cell_status(&self, game: GameId, player: &PlayerId) -> anyhow::Result<Vec<u8>> {
        self.ledger.cell_status(game, player)
    }

    async fn estimate(&self, _game: GameId, call: LedgerCall) -> anyhow::Result<ResourceEstimate> {
        Ok(InMemoryLedger::quote(call))
    }

    async fn place_fleet(
        &self,
        game: GameId,
        fleet: &SealedFleet,
        fees: TxFees,
    ) -> anyhow::Result<()> {
        self.ledger.place_fleet(game, &self.account, fleet, fees)
    }

    async fn fire_shot(
        &self,
        game: GameId,
        position: u8,
        fees: TxFees,
    ) -> anyhow::Result<ShotReceipt> {
        self.ledger.fire_shot(game, &self.account, position, fees)
    }

    async fn update_odds(&self, game: GameId, odds: u32, fees: TxFees) -> anyhow::Result<()> {
        self.ledger.update_odds(game, &self.account, odds, fees)
    }
}
