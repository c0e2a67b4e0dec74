//! The rising tide.
//!
//! The waterline rises by one unit of height every [`ROUNDS_PER_LEVEL`]
//! rounds. A cell below the waterline only sinks once the sea touches it:
//! it must lie on the shore, or next to a sunk cell that is joined to the
//! shore by a chain of sunk cells. Only cells sunk before the call count, so
//! the tide creeps inland one ring of cells per round.

use crate::game::board::{BOARD_SIZE, Coord, MAX_HEIGHT, SUNK, Terrain, neighbors};

/// Rounds it takes the waterline to rise by one unit of height.
pub const ROUNDS_PER_LEVEL: u32 = 100;

/// Round at which the waterline reaches the height cap and the match ends.
pub const FLOOD_CAP_ROUND: u32 = MAX_HEIGHT as u32 * ROUNDS_PER_LEVEL;

/// Whether a cell of `height` lies below the waterline at `round`.
///
/// Exact integer form of `height < round / ROUNDS_PER_LEVEL`.
#[must_use]
pub fn below_waterline(height: i8, round: u32) -> bool {
    i64::from(height) * i64::from(ROUNDS_PER_LEVEL) < i64::from(round)
}

/// Compute the terrain after the tide of `round` has come in.
///
/// Monotonic: sunk cells are never raised, and flooding round after round
/// only ever grows the sunk set. A single call advances the sea by at most
/// one cell inland, so it is not idempotent while low ground remains next to
/// the water.
#[must_use]
pub fn flood(terrain: &Terrain, round: u32) -> Terrain {
    let sea = open_sea(terrain);
    let touches_sea = |pos: Coord| {
        pos.is_border()
            || neighbors(pos)
                .iter()
                .any(|n| sea[usize::from(n.row)][usize::from(n.col)])
    };

    let mut flooded = terrain.clone();
    for (pos, height) in terrain.iter() {
        if height != SUNK && below_waterline(height, round) && touches_sea(pos) {
            flooded.set(pos, SUNK);
        }
    }
    flooded
}

/// Sunk cells joined to the shore through other sunk cells.
fn open_sea(terrain: &Terrain) -> [[bool; BOARD_SIZE]; BOARD_SIZE] {
    let mut reached = [[false; BOARD_SIZE]; BOARD_SIZE];
    let mut frontier: Vec<Coord> = Coord::all()
        .filter(|&pos| pos.is_border() && terrain.is_sunk(pos))
        .collect();
    for pos in &frontier {
        reached[usize::from(pos.row)][usize::from(pos.col)] = true;
    }

    while let Some(pos) = frontier.pop() {
        for &next in neighbors(pos) {
            let seen = &mut reached[usize::from(next.row)][usize::from(next.col)];
            if !*seen && terrain.is_sunk(next) {
                *seen = true;
                frontier.push(next);
            }
        }
    }
    reached
}
