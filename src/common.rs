//! Error types shared by the placement, view and parsing core.

use crate::bitboard::BitBoardError;

/// Rejected fleet specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetSpecError {
    /// Grid must be at least 1×1.
    EmptyGrid,
    /// A ship of length zero was requested.
    ZeroLengthShip,
    /// A ship longer than the grid side can never fit.
    ShipTooLong { length: usize, grid_size: usize },
    /// The ships need more cells than the grid has.
    TooManyCells { required: usize, available: usize },
}

impl core::fmt::Display for FleetSpecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FleetSpecError::EmptyGrid => write!(f, "grid size must be positive"),
            FleetSpecError::ZeroLengthShip => write!(f, "ship length must be positive"),
            FleetSpecError::ShipTooLong { length, grid_size } => write!(
                f,
                "ship of length {} does not fit a {}x{} grid",
                length, grid_size, grid_size
            ),
            FleetSpecError::TooManyCells {
                required,
                available,
            } => write!(
                f,
                "fleet needs {} cells but the grid only has {}",
                required, available
            ),
        }
    }
}

/// Rejected per-cell status array coming from the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    WrongLength { expected: usize, got: usize },
    UnknownStatus { position: usize, value: u8 },
    BitBoard(BitBoardError),
}

impl From<BitBoardError> for ViewError {
    fn from(err: BitBoardError) -> Self {
        ViewError::BitBoard(err)
    }
}

impl core::fmt::Display for ViewError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ViewError::WrongLength { expected, got } => {
                write!(f, "cell status has {} entries, expected {}", got, expected)
            }
            ViewError::UnknownStatus { position, value } => {
                write!(f, "cell {} has unknown status {}", position, value)
            }
            ViewError::BitBoard(e) => write!(f, "BitBoard error: {}", e),
        }
    }
}

/// Oracle text that yielded no usable shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnparsableSuggestion,
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParseError::UnparsableSuggestion => {
                write!(f, "no valid shot position in oracle reply")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FleetSpecError {}
#[cfg(feature = "std")]
impl std::error::Error for ViewError {}
#[cfg(feature = "std")]
impl std::error::Error for ParseError {}
#[cfg(feature = "std")]
impl std::error::Error for BitBoardError {}
