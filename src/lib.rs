#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod ai;
pub mod bitboard;
pub mod board_view;
mod common;
mod config;
pub mod fleet;
pub mod parser;
pub mod prompt;

#[cfg(feature = "std")]
pub mod agent;
#[cfg(feature = "std")]
pub mod correlator;
#[cfg(feature = "std")]
pub mod encryption;
#[cfg(feature = "std")]
mod error;
#[cfg(feature = "std")]
pub mod events;
#[cfg(feature = "std")]
pub mod house;
#[cfg(feature = "std")]
pub mod ledger;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod oracle;
#[cfg(feature = "std")]
pub mod retry;
#[cfg(feature = "std")]
pub mod session;

pub use ai::{best_target, density, estimate_odds};
pub use bitboard::{BitBoard, BitBoardError, Cells};
pub use board_view::{BoardView, CellStatus, TurnView};
pub use common::*;
pub use config::*;
pub use fleet::{place_fleet, ship_cells, Fleet, FleetSpec, Orientation};
pub use parser::{extract_odds, extract_shot, parse_suggestion, SuggestedMove};
pub use prompt::{build_prompt, parse_grids};

#[cfg(feature = "std")]
pub use agent::{Agent, Collaborators, GameFeed, GameReport};
#[cfg(feature = "std")]
pub use correlator::{CorrelationError, CorrelationId, OracleResponse, ResponseCorrelator};
#[cfg(feature = "std")]
pub use encryption::{probe_encryption, seal_fleet, EncryptionService};
#[cfg(feature = "std")]
pub use error::AgentError;
#[cfg(feature = "std")]
pub use events::{EventRegistry, LedgerEvents, SubscriptionId};
#[cfg(feature = "std")]
pub use house::HousePlayer;
#[cfg(feature = "std")]
pub use ledger::{GameId, GameRecord, LedgerClient, PlayerId, Role, TurnOwner};
#[cfg(feature = "std")]
pub use logging::{init_logging, LOG_ENV};
#[cfg(feature = "std")]
pub use oracle::{HeuristicOracle, OllamaConfig, OllamaOracle, OracleClient};
#[cfg(feature = "std")]
pub use retry::{RetryOutcome, RetryPolicy};
#[cfg(feature = "std")]
pub use session::{GameOutcome, GameSession, ShotSource, StepOutcome, TurnState};
