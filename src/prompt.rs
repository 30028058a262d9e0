//! Text exchanged with the oracle.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::board_view::{BoardView, TurnView};
use crate::config::{BOARD_CELLS, BOARD_SIZE};
use crate::parser::{ODDS_TAG, PLACE_TAG};

/// Render both boards and the reply contract.
pub fn build_prompt(view: &TurnView) -> String {
    let mut out = format!(
        "You're playing battleship on a {n}x{n} grid. Here's the current board state of your shots against the opponent:\n",
        n = BOARD_SIZE
    );
    for row in view.targets.rows() {
        out.push_str(&row);
        out.push('\n');
    }
    out.push_str("And here are the hits and misses made against you:\n");
    for row in view.defense.rows() {
        out.push_str(&row);
        out.push('\n');
    }
    out.push_str(&format!(
        "'.' is an unknown cell, 'O' is a miss and 'X' is a hit.\n\
         Suggest the best position to fire next as a number from 0-{last}, where 0 is the \
         top-left corner and numbering goes across then down. Format your answer as \
         {place}x| where x is the number you choose.\n\
         Also give the betting odds you offer your opponent that they won't beat you: 100 is \
         even, 150 if you're winning, 80 or 50 if you're losing, 500 if you're winning by a \
         lot, 5 if you're close to losing and 0 if the game is almost over. Format it as \
         {odds}x|.",
        last = BOARD_CELLS - 1,
        place = PLACE_TAG,
        odds = ODDS_TAG,
    ));
    out
}

fn grid_row(line: &str) -> Option<[u8; BOARD_SIZE]> {
    let line = line.trim();
    if line.chars().count() != BOARD_SIZE {
        return None;
    }
    let mut row = [0u8; BOARD_SIZE];
    for (slot, ch) in row.iter_mut().zip(line.chars()) {
        *slot = match ch {
            '.' => 0,
            'O' => 1,
            'X' => 2,
            _ => return None,
        };
    }
    Some(row)
}

/// Recover the two boards from a prompt made by [`build_prompt`]: the first
/// `BOARD_SIZE` grid rows are the targets, the next are the defense.
pub fn parse_grids(prompt: &str) -> Option<TurnView> {
    let raw: Vec<u8> = prompt
        .lines()
        .filter_map(grid_row)
        .take(2 * BOARD_SIZE)
        .flatten()
        .collect();
    if raw.len() != 2 * BOARD_CELLS {
        return None;
    }
    Some(TurnView {
        targets: BoardView::from_status(&raw[..BOARD_CELLS]).ok()?,
        defense: BoardView::from_status(&raw[BOARD_CELLS..]).ok()?,
    })
}
