//! Random, non-overlapping fleet placement on an N×N grid.
//!
//! Placement is an obfuscation step rather than a strategic one, so every
//! call may return a different layout.

use alloc::vec;
use alloc::vec::Vec;
use rand::Rng;

use crate::common::FleetSpecError;
use crate::config::{BOARD_SIZE, SHIP_LENGTHS};

/// Orientation of a ship segment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Consecutive positions within a single row.
    Horizontal,
    /// Positions `N` apart within a single column.
    Vertical,
}

/// Grid size plus the ordered ship lengths to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSpec {
    grid_size: usize,
    lengths: Vec<usize>,
}

impl FleetSpec {
    /// Validates that every ship fits the grid and that the fleet does not
    /// need more cells than exist.
    pub fn new(grid_size: usize, lengths: &[usize]) -> Result<Self, FleetSpecError> {
        if grid_size == 0 {
            return Err(FleetSpecError::EmptyGrid);
        }
        for &length in lengths {
            if length == 0 {
                return Err(FleetSpecError::ZeroLengthShip);
            }
            if length > grid_size {
                return Err(FleetSpecError::ShipTooLong { length, grid_size });
            }
        }
        let required: usize = lengths.iter().sum();
        let available = grid_size * grid_size;
        if required > available {
            return Err(FleetSpecError::TooManyCells {
                required,
                available,
            });
        }
        Ok(Self {
            grid_size,
            lengths: lengths.to_vec(),
        })
    }

    /// The 4×4 destroyer + submarine fleet.
    pub fn standard() -> Self {
        Self {
            grid_size: BOARD_SIZE,
            lengths: SHIP_LENGTHS.to_vec(),
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    pub fn total_cells(&self) -> usize {
        self.lengths.iter().sum()
    }
}

/// One committed fleet: the flattened ship positions, in placement order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fleet {
    grid_size: usize,
    ships: Vec<Vec<usize>>,
}

impl Fleet {
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Positions of each ship, one entry per requested length.
    pub fn ships(&self) -> &[Vec<usize>] {
        &self.ships
    }

    /// All occupied positions, ship by ship.
    pub fn positions(&self) -> Vec<usize> {
        self.ships.iter().flatten().copied().collect()
    }
}

/// Positions covered by a ship of `length` starting at `start`, or `None`
/// when it leaves the grid or wraps across a row boundary.
pub fn ship_cells(
    grid_size: usize,
    start: usize,
    length: usize,
    orientation: Orientation,
) -> Option<Vec<usize>> {
    let cells = grid_size * grid_size;
    if start >= cells {
        return None;
    }
    let row = start / grid_size;
    let mut out = Vec::with_capacity(length);
    for i in 0..length {
        let pos = match orientation {
            Orientation::Horizontal => start + i,
            Orientation::Vertical => start + i * grid_size,
        };
        if pos >= cells {
            return None;
        }
        if orientation == Orientation::Horizontal && pos / grid_size != row {
            return None;
        }
        out.push(pos);
    }
    Some(out)
}

fn fits(occupied: &[bool], grid_size: usize, start: usize, length: usize, o: Orientation) -> bool {
    match ship_cells(grid_size, start, length, o) {
        Some(cells) => cells.iter().all(|&p| !occupied[p]),
        None => false,
    }
}

fn any_fit(occupied: &[bool], grid_size: usize, length: usize) -> bool {
    (0..grid_size * grid_size).any(|start| {
        fits(occupied, grid_size, start, length, Orientation::Horizontal)
            || fits(occupied, grid_size, start, length, Orientation::Vertical)
    })
}

/// Place every ship of `spec` at a uniformly sampled start and orientation.
///
/// Each ship is rejection-sampled until a candidate fits. If the partial
/// layout leaves no legal spot for the next ship, the whole fleet is
/// restarted, so the call returns as long as some complete packing exists.
pub fn place_fleet<R: Rng + ?Sized>(rng: &mut R, spec: &FleetSpec) -> Fleet {
    let n = spec.grid_size;
    let cells = n * n;
    'fleet: loop {
        let mut occupied = vec![false; cells];
        let mut ships = Vec::with_capacity(spec.lengths.len());
        for &length in &spec.lengths {
            if !any_fit(&occupied, n, length) {
                continue 'fleet;
            }
            loop {
                let orientation = if rng.random_bool(0.5) {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                let start = rng.random_range(0..cells);
                if !fits(&occupied, n, start, length, orientation) {
                    continue;
                }
                if let Some(ship) = ship_cells(n, start, length, orientation) {
                    for &p in &ship {
                        occupied[p] = true;
                    }
                    ships.push(ship);
                    break;
                }
            }
        }
        return Fleet { grid_size: n, ships };
    }
}
