//! Read-only projection of the ledger's per-cell status arrays.
//!
//! A view is rebuilt from scratch on every poll; the only thing carried
//! between turns is the session's own fired-shots set.

use alloc::string::String;
use alloc::vec::Vec;

use crate::bitboard::Cells;
use crate::common::ViewError;
use crate::config::{BOARD_CELLS, BOARD_SIZE};

/// Authoritative status of one cell as stored on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum CellStatus {
    Unknown = 0,
    Miss = 1,
    Hit = 2,
}

impl CellStatus {
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(CellStatus::Unknown),
            1 => Some(CellStatus::Miss),
            2 => Some(CellStatus::Hit),
            _ => None,
        }
    }

    /// Glyph used in prompts: '.' unknown, 'O' miss, 'X' hit.
    pub fn glyph(self) -> char {
        match self {
            CellStatus::Unknown => '.',
            CellStatus::Miss => 'O',
            CellStatus::Hit => 'X',
        }
    }
}

/// Hits and misses recorded against one player's board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardView {
    hits: Cells,
    misses: Cells,
}

impl BoardView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project a raw status array of length `BOARD_CELLS`.
    pub fn from_status(raw: &[u8]) -> Result<Self, ViewError> {
        if raw.len() != BOARD_CELLS {
            return Err(ViewError::WrongLength {
                expected: BOARD_CELLS,
                got: raw.len(),
            });
        }
        let mut view = Self::new();
        for (position, &value) in raw.iter().enumerate() {
            match CellStatus::from_raw(value) {
                Some(CellStatus::Unknown) => {}
                Some(CellStatus::Miss) => {
                    view.misses.insert(position)?;
                }
                Some(CellStatus::Hit) => {
                    view.hits.insert(position)?;
                }
                None => return Err(ViewError::UnknownStatus { position, value }),
            }
        }
        Ok(view)
    }

    pub fn hits(&self) -> Cells {
        self.hits
    }

    pub fn misses(&self) -> Cells {
        self.misses
    }

    pub fn hit_positions(&self) -> Vec<usize> {
        self.hits.positions().collect()
    }

    pub fn miss_positions(&self) -> Vec<usize> {
        self.misses.positions().collect()
    }

    pub fn status(&self, position: usize) -> CellStatus {
        if self.hits.contains(position) {
            CellStatus::Hit
        } else if self.misses.contains(position) {
            CellStatus::Miss
        } else {
            CellStatus::Unknown
        }
    }

    pub fn is_resolved(&self, position: usize) -> bool {
        self.status(position) != CellStatus::Unknown
    }

    /// Apply a confirmed shot result locally until the next refresh.
    pub fn record(&mut self, position: usize, hit: bool) -> Result<(), ViewError> {
        if hit {
            self.misses.remove(position)?;
            self.hits.insert(position)?;
        } else {
            self.hits.remove(position)?;
            self.misses.insert(position)?;
        }
        Ok(())
    }

    /// One string per row, top to bottom.
    pub fn rows(&self) -> Vec<String> {
        (0..BOARD_SIZE)
            .map(|r| {
                (0..BOARD_SIZE)
                    .map(|c| self.status(r * BOARD_SIZE + c).glyph())
                    .collect()
            })
            .collect()
    }
}

/// Both boards as seen from this agent at the start of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TurnView {
    /// The opponent's board: results of our own shots.
    pub targets: BoardView,
    /// Our board: results of the opponent's shots.
    pub defense: BoardView,
}
