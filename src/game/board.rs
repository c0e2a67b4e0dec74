//! Board geometry, terrain grid and move legality.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::Index;
use std::sync::LazyLock;

use serde::Serialize;

use crate::error::MatchError;
use crate::game::RawMove;

/// Side length of the square board.
pub const BOARD_SIZE: usize = 18;

/// Index of the last row/column.
const LAST: u8 = (BOARD_SIZE - 1) as u8;

/// Height of a sunk cell.
pub const SUNK: i8 = -1;

/// Height of a city cell.
pub const CITY: i8 = 0;

/// Terrain can never be stacked higher than this.
pub const MAX_HEIGHT: i8 = 8;

/// City locations, one per agent, in canonical frame order.
pub const CITIES: [Coord; 4] = [
    Coord::new(5, 5),
    Coord::new(5, 12),
    Coord::new(12, 12),
    Coord::new(12, 5),
];

/// A cell position as (row, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Coord {
    /// Row index, 0 at the top.
    pub row: u8,
    /// Column index, 0 at the left.
    pub col: u8,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Convert an unvalidated `[row, col]` pair.
    ///
    /// Returns `None` when either component does not fit a grid index type.
    /// Values that fit but lie off the board are still returned; use
    /// [`Coord::in_bounds`] to reject those.
    #[must_use]
    pub fn from_raw([row, col]: [i64; 2]) -> Option<Self> {
        Some(Self::new(u8::try_from(row).ok()?, u8::try_from(col).ok()?))
    }

    /// The `[row, col]` pair an agent would return.
    #[must_use]
    pub const fn to_raw(self) -> [i64; 2] {
        [self.row as i64, self.col as i64]
    }

    /// Check whether this coordinate lies on the board.
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }

    /// Check whether this coordinate is one of the four cities.
    #[must_use]
    pub fn is_city(self) -> bool {
        CITIES.contains(&self)
    }

    /// Check whether this coordinate touches the open sea around the board.
    ///
    /// Off-board coordinates count as sea.
    #[must_use]
    pub const fn is_border(self) -> bool {
        self.row == 0 || self.col == 0 || self.row >= LAST || self.col >= LAST
    }

    /// Iterate over every cell of the board in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE as u8).flat_map(|row| (0..BOARD_SIZE as u8).map(move |col| Coord::new(row, col)))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A move of one unit of height from `src` to `dst`.
///
/// Coordinates are only meaningful together with the frame they were issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Move {
    /// Cell that loses one unit.
    pub src: Coord,
    /// Cell that gains one unit.
    pub dst: Coord,
}

impl Move {
    /// Create a new move.
    #[must_use]
    pub const fn new(src: Coord, dst: Coord) -> Self {
        Self { src, dst }
    }

    /// Decode an agent reply. `None` if a coordinate is not representable.
    #[must_use]
    pub fn from_raw([src, dst]: RawMove) -> Option<Self> {
        Some(Self::new(Coord::from_raw(src)?, Coord::from_raw(dst)?))
    }

    /// Encode as an agent reply.
    #[must_use]
    pub const fn to_raw(self) -> RawMove {
        [self.src.to_raw(), self.dst.to_raw()]
    }

    /// Rotate both endpoints by a quarter turn `times` times.
    #[must_use]
    pub const fn rotated(self, times: u8) -> Self {
        Self::new(rotate(times, self.src), rotate(times, self.dst))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// Rotate a coordinate by a quarter turn, `(i, j) -> (N-1-j, i)`, `times` times.
///
/// Exact for on-board coordinates; four rotations are the identity.
#[must_use]
pub const fn rotate(times: u8, coord: Coord) -> Coord {
    let mut c = coord;
    let mut remaining = times % 4;
    while remaining > 0 {
        c = Coord::new(LAST.wrapping_sub(c.col), c.row);
        remaining -= 1;
    }
    c
}

/// Map a coordinate from agent `frame`'s local view to the canonical board.
#[must_use]
pub const fn to_canonical(frame: u8, local: Coord) -> Coord {
    rotate((4 - frame % 4) % 4, local)
}

/// Map a canonical coordinate into agent `frame`'s local view.
#[must_use]
pub const fn to_local(frame: u8, canonical: Coord) -> Coord {
    rotate(frame % 4, canonical)
}

/// Taxicab distance between two cells.
#[must_use]
pub const fn dist(a: Coord, b: Coord) -> u32 {
    (a.row.abs_diff(b.row) as u32) + (a.col.abs_diff(b.col) as u32)
}

/// Up to eight neighbors of a cell, stored inline.
#[derive(Debug, Clone, Copy)]
struct Neighbors {
    cells: [Coord; 8],
    len: u8,
}

static NEIGHBOR_TABLE: LazyLock<Vec<Neighbors>> = LazyLock::new(|| {
    Coord::all()
        .map(|pos| {
            let mut entry = Neighbors {
                cells: [Coord::new(0, 0); 8],
                len: 0,
            };
            for dr in -1i16..=1 {
                for dc in -1i16..=1 {
                    if dr == 0 && dc == 0 {
                        continue;
                    }
                    let row = i16::from(pos.row) + dr;
                    let col = i16::from(pos.col) + dc;
                    if let (Ok(row), Ok(col)) = (u8::try_from(row), u8::try_from(col)) {
                        let cell = Coord::new(row, col);
                        if cell.in_bounds() {
                            entry.cells[entry.len as usize] = cell;
                            entry.len += 1;
                        }
                    }
                }
            }
            entry
        })
        .collect()
});

/// The orthogonal and diagonal neighbors of `pos` that lie on the board.
///
/// Off-board positions have no neighbors.
#[must_use]
pub fn neighbors(pos: Coord) -> &'static [Coord] {
    if !pos.in_bounds() {
        return &[];
    }
    let entry = &NEIGHBOR_TABLE[usize::from(pos.row) * BOARD_SIZE + usize::from(pos.col)];
    &entry.cells[..entry.len as usize]
}

/// The terrain grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Terrain {
    cells: [[i8; BOARD_SIZE]; BOARD_SIZE],
}

impl Terrain {
    /// A grid with every cell at `height`. Cities are not carved out.
    #[must_use]
    pub const fn filled(height: i8) -> Self {
        Self {
            cells: [[height; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// The starting island: concentric rings rising from 1 at the shore to 6
    /// in the middle, with the four cities at height 0.
    #[must_use]
    pub fn start() -> Self {
        let mut terrain = Self::filled(1);
        for pos in Coord::all() {
            let ring = pos.row.min(pos.col).min(LAST - pos.row).min(LAST - pos.col);
            terrain.cells[usize::from(pos.row)][usize::from(pos.col)] = ring.min(5) as i8 + 1;
        }
        for city in CITIES {
            terrain.set(city, CITY);
        }
        terrain
    }

    /// Build a grid from untrusted rows.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::GridDimensions`] if the grid is not 18x18 and
    /// [`MatchError::CellOutOfRange`] if a value lies outside -1..=8.
    pub fn from_rows<R: AsRef<[i64]>>(rows: &[R]) -> Result<Self, MatchError> {
        if rows.len() != BOARD_SIZE {
            return Err(MatchError::GridDimensions {
                expected: BOARD_SIZE,
                rows: rows.len(),
                row: rows.len(),
                cols: rows.first().map_or(0, |r| r.as_ref().len()),
            });
        }

        let mut terrain = Self::filled(0);
        for (row, values) in rows.iter().enumerate() {
            let values = values.as_ref();
            if values.len() != BOARD_SIZE {
                return Err(MatchError::GridDimensions {
                    expected: BOARD_SIZE,
                    rows: rows.len(),
                    row,
                    cols: values.len(),
                });
            }
            for (col, &value) in values.iter().enumerate() {
                let height = i8::try_from(value)
                    .ok()
                    .filter(|h| (SUNK..=MAX_HEIGHT).contains(h))
                    .ok_or(MatchError::CellOutOfRange { row, col, value })?;
                terrain.cells[row][col] = height;
            }
        }
        Ok(terrain)
    }

    /// Height at `pos`, or `None` off the board.
    #[must_use]
    pub fn get(&self, pos: Coord) -> Option<i8> {
        self.cells
            .get(usize::from(pos.row))
            .and_then(|row| row.get(usize::from(pos.col)))
            .copied()
    }

    /// Set the height at `pos`. Returns `false` off the board.
    pub fn set(&mut self, pos: Coord, height: i8) -> bool {
        match self
            .cells
            .get_mut(usize::from(pos.row))
            .and_then(|row| row.get_mut(usize::from(pos.col)))
        {
            Some(cell) => {
                *cell = height;
                true
            }
            None => false,
        }
    }

    /// Whether `pos` is sunk.
    #[must_use]
    pub fn is_sunk(&self, pos: Coord) -> bool {
        self.get(pos) == Some(SUNK)
    }

    /// The raw rows.
    #[must_use]
    pub const fn rows(&self) -> &[[i8; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Iterate over all cells with their heights in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Coord, i8)> + '_ {
        Coord::all().map(|pos| (pos, self[pos]))
    }

    /// Number of sunk cells.
    #[must_use]
    pub fn sunk_count(&self) -> usize {
        self.cells.iter().flatten().filter(|&&h| h == SUNK).count()
    }

    /// Move one unit of height from `mv.src` to `mv.dst` if the move is legal.
    ///
    /// Returns whether the move was applied.
    pub fn apply(&mut self, mv: Move) -> bool {
        if !is_legal(self, mv.src, mv.dst) {
            return false;
        }
        self.cells[usize::from(mv.src.row)][usize::from(mv.src.col)] -= 1;
        self.cells[usize::from(mv.dst.row)][usize::from(mv.dst.col)] += 1;
        true
    }

    /// The board as seen from agent `frame`: a fresh copy rotated so that
    /// the agent's own city sits where city 0 is on the canonical board.
    #[must_use]
    pub fn rotated_view(&self, frame: u8) -> Self {
        let mut view = Self::filled(0);
        for local in Coord::all() {
            view.cells[usize::from(local.row)][usize::from(local.col)] =
                self[to_canonical(frame, local)];
        }
        view
    }
}

impl Default for Terrain {
    fn default() -> Self {
        Self::start()
    }
}

impl Index<Coord> for Terrain {
    type Output = i8;

    fn index(&self, pos: Coord) -> &i8 {
        &self.cells[usize::from(pos.row)][usize::from(pos.col)]
    }
}

/// Whether moving one unit from `src` to `dst` is legal on `terrain`.
///
/// Both cells must be on the board and not cities, the source must have
/// height left to give and the destination must be neither sunk nor full.
#[must_use]
pub fn is_legal(terrain: &Terrain, src: Coord, dst: Coord) -> bool {
    let (Some(from), Some(to)) = (terrain.get(src), terrain.get(dst)) else {
        return false;
    };
    if from <= 0 || to == SUNK || to == MAX_HEIGHT {
        return false;
    }
    !src.is_city() && !dst.is_city()
}

/// Every legal move between neighboring cells.
#[must_use]
pub fn legal_moves(terrain: &Terrain) -> BTreeSet<Move> {
    Coord::all()
        .flat_map(|src| neighbors(src).iter().map(move |&dst| Move::new(src, dst)))
        .filter(|mv| is_legal(terrain, mv.src, mv.dst))
        .collect()
}

/// Whether `pos` is next to a sunk cell or on the shore.
#[must_use]
pub fn is_near_water(terrain: &Terrain, pos: Coord) -> bool {
    pos.is_border() || neighbors(pos).iter().any(|&n| terrain.is_sunk(n))
}
