#![no_main]

//! Full round fuzzer.
//!
//! Builds an arbitrary island, lets four scripted agents reply with arbitrary
//! raw moves (including garbage coordinates), and plays a handful of rounds.
//! Every step must succeed: whatever the agents send, the engine has to
//! absorb it as a forfeit or a move and keep its invariants.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rising_tide::game::{CITIES, MAX_HEIGHT, SUNK, check_invariants};
use rising_tide::{Agent, Coord, Match, MatchConfig, RawMove, Terrain};

/// Structured input for round fuzzing.
#[derive(Arbitrary, Debug)]
struct RoundInput {
    /// Heights, row-major; wrapped into -1..=8.
    cells: Vec<i8>,
    /// Replies per agent, one per round.
    replies: [Vec<Option<RawMove>>; 4],
    /// Seed for the resolution order.
    seed: u64,
    /// Number of rounds to play.
    num_rounds: u8,
}

fuzz_target!(|input: RoundInput| {
    let mut terrain = Terrain::start();
    for (pos, raw) in Coord::all().zip(input.cells.iter()) {
        terrain.set(pos, raw.rem_euclid(MAX_HEIGHT - SUNK + 1) + SUNK);
    }
    for city in CITIES {
        terrain.set(city, 0);
    }

    let agents: Vec<Agent> = input
        .replies
        .into_iter()
        .enumerate()
        .map(|(i, script)| {
            Agent::from_fn(format!("Script {i}"), format!("S{i}"), move |_, round, _| {
                script.get(round as usize % script.len().max(1)).copied().flatten()
            })
        })
        .collect();

    let config = MatchConfig {
        parallel: false,
        ..MatchConfig::default()
    };
    let mut game = match Match::with_terrain(agents, terrain, input.seed, config) {
        Ok(game) => game,
        Err(_) => return,
    };

    for _ in 0..(input.num_rounds % 16) {
        let sunk_before = game.terrain().sunk_count();
        match game.step() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => panic!("engine error: {e}"),
        }
        assert!(game.terrain().sunk_count() >= sunk_before, "land resurfaced");
    }

    let violations = check_invariants(&game);
    assert!(violations.is_empty(), "invariants violated: {violations:?}");
});
