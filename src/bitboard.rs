//! A fixed-size set of grid cells packed into one unsigned integer.
//!
//! Cells are addressed by their flat position `row * N + col`, which is the
//! numbering the ledger and the oracle both use. The type is `no_std`
//! friendly and never allocates.

use core::ops::{BitAnd, BitOr, BitOrAssign, Not};
use core::{fmt, mem};
use num_traits::{PrimInt, Unsigned, Zero};

/// Errors returned by bitboard operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitBoardError {
    /// Requested board size N*N exceeds capacity of `T::BITS`.
    SizeTooLarge { n: usize, capacity: usize },
    /// Position is outside [0, N*N).
    PositionOutOfBounds { position: usize },
}

impl fmt::Display for BitBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitBoardError::SizeTooLarge { n, capacity } => {
                write!(f, "SizeTooLarge: N*N={} exceeds T::BITS={}", n * n, capacity)
            }
            BitBoardError::PositionOutOfBounds { position } => {
                write!(f, "PositionOutOfBounds: {}", position)
            }
        }
    }
}

/// An N×N set of cells stored in the unsigned integer `T`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitBoard<T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T, const N: usize> BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    /// Number of cells on the board.
    pub const CELLS: usize = N * N;

    #[inline]
    fn mask() -> T {
        if Self::CELLS == mem::size_of::<T>() * 8 {
            !T::zero()
        } else {
            (T::one() << Self::CELLS) - T::one()
        }
    }

    /// Empty board.
    #[inline]
    pub fn new() -> Self {
        BitBoard { bits: T::zero() }
    }

    /// Fallible constructor: returns `Err(SizeTooLarge)` if N*N > T::BITS.
    pub fn try_new() -> Result<Self, BitBoardError> {
        let capacity = mem::size_of::<T>() * 8;
        if Self::CELLS > capacity {
            Err(BitBoardError::SizeTooLarge { n: N, capacity })
        } else {
            Ok(Self::new())
        }
    }

    pub fn count(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_zero()
    }

    /// True when every cell is set.
    pub fn is_full(&self) -> bool {
        self.bits == Self::mask()
    }

    /// Whether `position` is set. Out-of-range positions are never set.
    #[inline]
    pub fn contains(&self, position: usize) -> bool {
        position < Self::CELLS && ((self.bits >> position) & T::one()) != T::zero()
    }

    /// Row/column accessor for rendering.
    pub fn get(&self, row: usize, col: usize) -> Result<bool, BitBoardError> {
        if row >= N || col >= N {
            return Err(BitBoardError::PositionOutOfBounds {
                position: row * N + col,
            });
        }
        Ok(self.contains(row * N + col))
    }

    /// Set `position`; returns whether it was newly inserted.
    pub fn insert(&mut self, position: usize) -> Result<bool, BitBoardError> {
        self.check(position)?;
        let was = self.contains(position);
        self.bits = self.bits | (T::one() << position);
        Ok(!was)
    }

    /// Clear `position`; returns whether it was set.
    pub fn remove(&mut self, position: usize) -> Result<bool, BitBoardError> {
        self.check(position)?;
        let was = self.contains(position);
        self.bits = self.bits & !(T::one() << position);
        Ok(was)
    }

    #[inline]
    fn check(&self, position: usize) -> Result<(), BitBoardError> {
        if position >= Self::CELLS {
            Err(BitBoardError::PositionOutOfBounds { position })
        } else {
            Ok(())
        }
    }

    #[inline]
    pub fn into_raw(self) -> T {
        self.bits
    }

    /// Creates a bitboard from the raw integer, masking out upper bits.
    #[inline]
    pub fn from_raw(raw: T) -> Self {
        BitBoard {
            bits: raw & Self::mask(),
        }
    }

    /// Builds a board from flat positions, rejecting any out of range.
    pub fn from_positions<I>(positions: I) -> Result<Self, BitBoardError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut board = Self::new();
        for p in positions {
            board.insert(p)?;
        }
        Ok(board)
    }

    /// Iterator over set positions in ascending order.
    #[inline]
    pub fn positions(&self) -> Positions<T, N> {
        Positions {
            bits: self.bits,
            idx: 0,
        }
    }
}

impl<T, const N: usize> Default for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.positions()).finish()
    }
}

impl<T, const N: usize> fmt::Display for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..N {
            for c in 0..N {
                let cell = if self.contains(r * N + c) { '■' } else { '□' };
                write!(f, "{} ", cell)?;
            }
            if r + 1 < N {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Iterator over the set positions of a bitboard.
#[derive(Clone, Copy)]
pub struct Positions<T, const N: usize> {
    bits: T,
    idx: usize,
}

impl<T, const N: usize> Iterator for Positions<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.idx < N * N {
            let idx = self.idx;
            self.idx += 1;
            if ((self.bits >> idx) & T::one()) != T::zero() {
                return Some(idx);
            }
        }
        None
    }
}

impl<T, const N: usize> BitAnd for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        BitBoard::from_raw(self.bits & rhs.bits)
    }
}

impl<T, const N: usize> BitOr for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        BitBoard::from_raw(self.bits | rhs.bits)
    }
}

impl<T, const N: usize> BitOrAssign for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits = self.bits | rhs.bits;
    }
}

/// Complement within board bounds.
impl<T, const N: usize> Not for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn not(self) -> Self {
        Self::from_raw(!self.bits)
    }
}

/// Cell set for the standard 4×4 board.
pub type Cells = BitBoard<u16, { crate::config::BOARD_SIZE }>;
