#![cfg(feature = "std")]

//! Contract of the external ledger that owns authoritative game state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::FeePolicy;
use crate::encryption::SealedFleet;
use crate::events::{GameEnded, LedgerEvents, ShotFired};

pub mod in_memory;

pub use in_memory::{InMemoryClient, InMemoryLedger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameId(pub u64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Account address on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Seat in a game. Player 1 created the game and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Player1,
    Player2,
}

impl Role {
    pub fn other(self) -> Role {
        match self {
            Role::Player1 => Role::Player2,
            Role::Player2 => Role::Player1,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Role::Player1 => 0,
            Role::Player2 => 1,
        }
    }
}

/// Whose move it is, relative to one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOwner {
    Mine,
    Opponent,
    /// The account holds neither seat.
    NotSeated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Waiting for a second player.
    Open,
    Active,
    Ended { winner: Option<PlayerId> },
}

/// Snapshot of one game object as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: GameId,
    pub player1: PlayerId,
    pub player2: Option<PlayerId>,
    pub player1s_turn: bool,
    /// Oracle model requested by the game creator.
    pub model: String,
    pub fleets_placed: [bool; 2],
    pub status: GameStatus,
}

impl GameRecord {
    pub fn role_of(&self, player: &PlayerId) -> Option<Role> {
        if &self.player1 == player {
            Some(Role::Player1)
        } else if self.player2.as_ref() == Some(player) {
            Some(Role::Player2)
        } else {
            None
        }
    }

    pub fn player(&self, role: Role) -> Option<&PlayerId> {
        match role {
            Role::Player1 => Some(&self.player1),
            Role::Player2 => self.player2.as_ref(),
        }
    }

    /// The role allowed to fire next.
    pub fn mover(&self) -> Role {
        if self.player1s_turn {
            Role::Player1
        } else {
            Role::Player2
        }
    }

    pub fn turn_owner(&self, me: &PlayerId) -> TurnOwner {
        match self.role_of(me) {
            None => TurnOwner::NotSeated,
            Some(role) if role == self.mover() => TurnOwner::Mine,
            Some(_) => TurnOwner::Opponent,
        }
    }

    pub fn opponent_of(&self, me: &PlayerId) -> Option<&PlayerId> {
        self.role_of(me).and_then(|role| self.player(role.other()))
    }

    /// Both seats taken and both fleets committed.
    pub fn is_ready(&self) -> bool {
        self.status == GameStatus::Active && self.fleets_placed.iter().all(|&p| p)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.status, GameStatus::Ended { .. })
    }

    /// True when `me` may fire right now.
    pub fn is_my_turn(&self, me: &PlayerId) -> bool {
        self.is_ready() && self.turn_owner(me) == TurnOwner::Mine
    }
}

/// Mutating calls that need a resource estimate first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCall {
    PlaceFleet { positions: usize },
    FireShot { position: u8 },
    UpdateOdds { odds: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceEstimate {
    pub units: u64,
    pub unit_price: u64,
}

/// Resource limit and unit price attached to a mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxFees {
    pub limit: u64,
    pub price: u64,
}

impl FeePolicy {
    pub fn pad(&self, estimate: ResourceEstimate) -> TxFees {
        TxFees {
            limit: estimate.units.saturating_mul(self.limit_pct) / 100,
            price: estimate.unit_price.saturating_mul(self.price_pct) / 100,
        }
    }
}

/// Events the ledger reports back for one submitted shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptEvent {
    ShotFired(ShotFired),
    GameEnded(GameEnded),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShotReceipt {
    pub events: Vec<ReceiptEvent>,
}

/// Ledger access bound to one signing account.
#[async_trait::async_trait]
pub trait LedgerClient: Send + Sync {
    fn account(&self) -> &PlayerId;

    /// Lifecycle notifications pushed by the ledger.
    fn events(&self) -> &LedgerEvents;

    async fn health(&self) -> anyhow::Result<()>;

    async fn create_game(&self, model: &str) -> anyhow::Result<GameId>;

    async fn join_game(&self, game: GameId) -> anyhow::Result<()>;

    async fn game(&self, game: GameId) -> anyhow::Result<GameRecord>;

    /// Status of every cell on `player`'s board: 0 unknown, 1 miss, 2 hit.
    async fn cell_status(&self, game: GameId, player: &PlayerId) -> anyhow::Result<Vec<u8>>;

    async fn estimate(&self, game: GameId, call: LedgerCall) -> anyhow::Result<ResourceEstimate>;

    async fn place_fleet(&self, game: GameId, fleet: &SealedFleet, fees: TxFees)
        -> anyhow::Result<()>;

    async fn fire_shot(&self, game: GameId, position: u8, fees: TxFees)
        -> anyhow::Result<ShotReceipt>;

    async fn update_odds(&self, game: GameId, odds: u32, fees: TxFees) -> anyhow::Result<()>;
}

/// Estimate `call` and pad the result with `policy`.
pub async fn padded_fees(
    ledger: &dyn LedgerClient,
    game: GameId,
    call: LedgerCall,
    policy: &FeePolicy,
) -> anyhow::Result<TxFees> {
    let estimate = ledger.estimate(game, call).await?;
    let fees = policy.pad(estimate);
    log::debug!(
        "game {}: {:?} estimated {} units @ {}, submitting limit {} @ {}",
        game,
        call,
        estimate.units,
        estimate.unit_price,
        fees.limit,
        fees.price
    );
    Ok(fees)
}
