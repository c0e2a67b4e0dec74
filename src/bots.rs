//! Built-in sample bots.
//!
//! Simple reference opponents for testing new agents and for filling seats
//! in a tournament. Every bot plays in its own frame, so "my city" is always
//! `CITIES[0]`. A bot with no legal move passes.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::game::{
    Agent, CITIES, Console, Move, RawMove, Strategy, Terrain, dist, is_near_water, legal_moves,
};

/// Coordinates at or beyond this value are too far from home for the leveler.
const LEVEL_REACH: u8 = 10;

/// The sample bots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleBot {
    /// Never moves.
    Pass,
    /// Picks any legal move.
    Random,
    /// Builds as close to home as it can.
    Nearby,
    /// Digs at the shore nearest to the other cities.
    Trench,
    /// Moves land from the interior onto the waterline.
    Border,
    /// Flattens the home quadrant.
    Level,
}

impl SampleBot {
    /// Every sample bot.
    pub const ALL: [Self; 6] = [
        Self::Pass,
        Self::Random,
        Self::Nearby,
        Self::Trench,
        Self::Border,
        Self::Level,
    ];

    /// Full name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pass => "Pass Perth",
            Self::Random => "Random Rizhao",
            Self::Nearby => "Nearby New Orleans",
            Self::Trench => "Trench Tunis",
            Self::Border => "Border Barcelona",
            Self::Level => "Level Los Angeles",
        }
    }

    /// Two-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Pass => "PR",
            Self::Random => "RZ",
            Self::Nearby => "NO",
            Self::Trench => "TN",
            Self::Border => "BC",
            Self::Level => "LA",
        }
    }

    /// One-line description of the play style.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pass => "always passes",
            Self::Random => "uniformly random legal move",
            Self::Nearby => "raises the cell closest to its own city",
            Self::Trench => "digs shore cells near the other cities",
            Self::Border => "piles interior land onto the waterline",
            Self::Level => "levels out its home quadrant",
        }
    }

    /// Build an agent playing this bot, with its own random stream.
    #[must_use]
    pub fn agent(self, seed: u64) -> Agent {
        let strategy = SampleStrategy {
            bot: self,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        };
        Agent::new(self.name(), self.code(), strategy)
    }

    /// Pick a move on `terrain`.
    fn choose(self, terrain: &Terrain, rng: &mut ChaCha8Rng) -> Option<Move> {
        let mut moves: Vec<Move> = legal_moves(terrain).into_iter().collect();
        // Nothing to do is a pass, not a fault.
        if moves.is_empty() {
            return None;
        }

        match self {
            Self::Pass => None,
            Self::Random => moves.choose(rng).copied(),
            Self::Nearby => {
                let home = CITIES[0];
                pick_min_by_key(&moves, rng, |mv| dist(home, mv.dst))
            }
            Self::Trench => pick_min_by_key(&moves, rng, |mv| {
                if is_near_water(terrain, mv.src) {
                    CITIES[1..].iter().map(|&c| dist(mv.src, c)).min().unwrap_or(u32::MAX)
                } else {
                    u32::MAX
                }
            }),
            Self::Border => {
                moves.shuffle(rng);
                let found = moves.iter().find(|mv| {
                    is_near_water(terrain, mv.dst) && !is_near_water(terrain, mv.src)
                });
                found.or(moves.first()).copied()
            }
            Self::Level => {
                moves.shuffle(rng);
                let found = moves.iter().find(|mv| {
                    let reach = mv.src.row.max(mv.src.col).max(mv.dst.row).max(mv.dst.col);
                    reach < LEVEL_REACH && terrain[mv.src] > terrain[mv.dst]
                });
                found.or(moves.first()).copied()
            }
        }
    }
}

impl fmt::Display for SampleBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

impl FromStr for SampleBot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bot| bot.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let codes: Vec<&str> = Self::ALL.iter().map(|b| b.code()).collect();
                format!("unknown bot '{s}', expected one of {}", codes.join(", "))
            })
    }
}

/// Uniform choice among the moves with the lowest key.
fn pick_min_by_key<K, F>(moves: &[Move], rng: &mut ChaCha8Rng, key: F) -> Option<Move>
where
    K: Ord + Copy,
    F: Fn(&Move) -> K,
{
    let keys: Vec<K> = moves.iter().map(&key).collect();
    let best = keys.iter().min().copied()?;
    let tied: Vec<Move> = moves
        .iter()
        .zip(&keys)
        .filter(|(_, k)| **k == best)
        .map(|(mv, _)| *mv)
        .collect();
    tied.choose(rng).copied()
}

struct SampleStrategy {
    bot: SampleBot,
    rng: Mutex<ChaCha8Rng>,
}

impl Strategy for SampleStrategy {
    fn decide(&self, terrain: &mut Terrain, _round: u32, _console: &mut Console) -> Option<RawMove> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.bot.choose(terrain, &mut rng).map(Move::to_raw)
    }
}
