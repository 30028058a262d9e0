// Ship-placement density over the opponent board.
// Uses no_std; weights are computed with libm.

use crate::{
    bitboard::Cells,
    board_view::BoardView,
    config::{BOARD_CELLS, BOARD_SIZE, SHIP_LENGTHS, TOTAL_SHIP_CELLS},
    fleet::{ship_cells, Orientation},
};

/// Placements covering confirmed hits are weighted by this base per hit so
/// cells next to a hit dominate the map.
const HIT_BIAS: f64 = 10.0;

/// Relative likelihood of a ship segment on each unknown cell, normalised
/// to sum to one. Resolved cells score zero.
pub fn density(view: &BoardView) -> [f64; BOARD_CELLS] {
    let hits = view.hits();
    let misses = view.misses();
    let mut map = [0.0f64; BOARD_CELLS];

    for &len in SHIP_LENGTHS.iter() {
        for orient in [Orientation::Horizontal, Orientation::Vertical] {
            for start in 0..BOARD_CELLS {
                let cells = match ship_cells(BOARD_SIZE, start, len, orient) {
                    Some(c) => c,
                    None => continue,
                };
                if cells.iter().any(|&p| misses.contains(p)) {
                    continue;
                }
                let n_hits = cells.iter().filter(|&&p| hits.contains(p)).count();
                let weight = libm::pow(HIT_BIAS, n_hits as f64);
                for &p in &cells {
                    if !hits.contains(p) {
                        map[p] += weight;
                    }
                }
            }
        }
    }

    let total: f64 = map.iter().sum();
    if total > 0.0 {
        for v in map.iter_mut() {
            *v /= total;
        }
    }
    map
}

/// Highest-density unknown cell not in `exclude`, lowest position on ties.
/// Falls back to any unknown cell when the map is flat zero.
pub fn best_target(view: &BoardView, exclude: &Cells) -> Option<u8> {
    let map = density(view);
    let mut best: Option<(usize, f64)> = None;
    for (p, &score) in map.iter().enumerate() {
        if view.is_resolved(p) || exclude.contains(p) {
            continue;
        }
        match best {
            Some((_, s)) if s >= score => {}
            _ => best = Some((p, score)),
        }
    }
    best.map(|(p, _)| p as u8)
}

/// Odds the agent offers that the opponent will not win: 100 is even,
/// higher means ahead, 0 means the game is about to end.
pub fn estimate_odds(targets: &BoardView, defense: &BoardView) -> u32 {
    let made = targets.hits().count().min(TOTAL_SHIP_CELLS);
    let taken = defense.hits().count().min(TOTAL_SHIP_CELLS);
    let mine_left = TOTAL_SHIP_CELLS - taken;
    let theirs_left = TOTAL_SHIP_CELLS - made;
    if mine_left == 0 || theirs_left <= 1 {
        return 0;
    }
    if mine_left == 1 {
        return 5;
    }
    let lead = made as i64 - taken as i64;
    (100 + lead * 50).clamp(5, 500) as u32
}
