//! End-to-end tests for complete matches.
//!
//! These run whole matches through the public API, including misbehaving
//! agents, the match log and the tournament runner.
//!
//! Run with: cargo test --release match_integration

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rising_tide::game::{CITIES, CITY, MAX_HEIGHT, SURVIVOR_SCORE, neighbors};
use rising_tide::tournament::{run_match, run_series};
use rising_tide::{Agent, Coord, Match, MatchConfig, MatchLog, SampleBot, Terrain};

fn passers() -> Vec<Agent> {
    (0..4).map(|_| SampleBot::Pass.agent(0)).collect()
}

fn sample_lineup(seed: u64) -> Vec<Agent> {
    [SampleBot::Random, SampleBot::Nearby, SampleBot::Border, SampleBot::Trench]
        .iter()
        .zip(0u64..)
        .map(|(bot, i)| bot.agent(seed.wrapping_add(i)))
        .collect()
}

#[test]
fn test_pass_match_full_length() {
    let mut game = Match::new(passers(), 42, MatchConfig::default()).unwrap();
    game.run_to_end().unwrap();

    assert_eq!(game.round(), 503);
    assert_eq!(game.scores(), Some(&[502; 4]));
    assert_eq!(game.eliminated_rounds(), &[Some(502); 4]);
    assert!(game.alive().iter().all(|&a| !a));
    for city in CITIES {
        assert_eq!(game.terrain()[city], -1);
    }
}

#[test]
fn test_walled_cities_reach_the_cap() {
    let mut terrain = Terrain::filled(2);
    for city in CITIES {
        terrain.set(city, CITY);
        for &n in neighbors(city) {
            terrain.set(n, MAX_HEIGHT);
        }
    }
    let mut game = Match::with_terrain(passers(), terrain, 0, MatchConfig::default()).unwrap();
    game.run_to_end().unwrap();

    assert_eq!(game.round(), 800);
    assert_eq!(game.scores(), Some(&[SURVIVOR_SCORE; 4]));
}

#[test]
fn test_snapshots_are_private() {
    let seen: Arc<Mutex<Vec<Terrain>>> = Arc::default();
    let recorder = {
        let seen = Arc::clone(&seen);
        Agent::from_fn("Recorder", "RC", move |terrain, _, _| {
            seen.lock().unwrap().push(terrain.clone());
            None
        })
    };
    let vandal = Agent::from_fn("Vandal", "VA", |terrain, _, _| {
        for row in 0..18 {
            for col in 0..18 {
                terrain.set(Coord::new(row, col), MAX_HEIGHT);
            }
        }
        None
    });

    let mut terrain = Terrain::start();
    // A landmark next to city 2, which agent 2 sees next to its own city.
    terrain.set(Coord::new(13, 13), MAX_HEIGHT);

    let agents = vec![
        vandal,
        SampleBot::Pass.agent(0),
        recorder,
        SampleBot::Pass.agent(0),
    ];
    let mut game = Match::with_terrain(agents, terrain.clone(), 1, MatchConfig::default()).unwrap();
    for _ in 0..3 {
        game.step().unwrap();
    }

    assert_eq!(game.terrain(), &terrain);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    for view in seen.iter() {
        assert_eq!(view, &terrain.rotated_view(2));
        assert_eq!(view[Coord::new(4, 4)], MAX_HEIGHT);
    }
}

#[test]
fn test_slow_agent_forfeits_without_failing() {
    let sleeper = Agent::from_fn("Sleepy Sydney", "SS", |_, _, console| {
        console.print("still thinking");
        thread::sleep(Duration::from_millis(200));
        Some([[3, 3], [3, 4]])
    });
    let agents = vec![
        SampleBot::Pass.agent(0),
        SampleBot::Pass.agent(0),
        sleeper,
        SampleBot::Pass.agent(0),
    ];
    let config = MatchConfig {
        time_budget: Duration::from_millis(20),
        ..MatchConfig::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slow.log");
    let mut game = Match::new(agents, 0, config)
        .unwrap()
        .with_log(MatchLog::to_file(&path).unwrap());
    let before = game.terrain().clone();

    let report = game.step().unwrap().unwrap();
    assert_eq!(report.forfeits().count(), 1);
    assert_eq!(game.forfeits(), &[0, 0, 1, 0]);
    assert_eq!(game.terrain(), &before);
    drop(game);

    // Text printed before the deadline still reaches the log.
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Sleepy Sydney has printed:\nstill thinking\nSleepy Sydney is taking too long.\n"));
}

#[test]
fn test_faulty_agent_only_loses_its_move() {
    let crasher = Agent::from_fn("Crashy Cairo", "CC", |_, _, _| panic!("out of ideas"));
    let agents = vec![
        crasher,
        SampleBot::Nearby.agent(1),
        SampleBot::Pass.agent(0),
        SampleBot::Pass.agent(0),
    ];
    let mut game = Match::new(agents, 3, MatchConfig::default()).unwrap();
    let report = game.step().unwrap().unwrap();

    assert_eq!(game.forfeits()[0], 1);
    assert_eq!(report.applied.len(), 1);
    assert_eq!(report.applied[0].0, 1);
}

#[test]
fn test_log_file_records_the_match() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.log");

    let log = MatchLog::to_file(&path).unwrap();
    let mut game = Match::new(passers(), 9, MatchConfig::default())
        .unwrap()
        .with_log(log);
    game.run_to_end().unwrap();
    drop(game);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("[R0]\n[GAME START]\nBOTS: Pass Perth, Pass Perth, Pass Perth, Pass Perth\n"));
    assert!(text.contains("[R502]\nPass Perth ELIMINATED\n"));
    assert!(text.ends_with("[GAME OVER]\nSCORES:\nPass Perth: 502\nPass Perth: 502\nPass Perth: 502\nPass Perth: 502\n"));
    // Quiet rounds leave nothing behind.
    assert!(!text.contains("[R1]"));
    assert!(!text.contains("[R501]"));
}

#[test]
fn test_sample_match_is_reproducible() {
    let config = MatchConfig::default();
    let a = run_match(77, sample_lineup(77), &config).unwrap();
    let b = run_match(77, sample_lineup(77), &config).unwrap();
    assert_eq!(a, b);
    assert!(a.rounds <= 800);
    for (score, eliminated) in a.scores.iter().zip(a.eliminated) {
        assert_eq!(*score, eliminated.unwrap_or(SURVIVOR_SCORE));
    }
}

#[test]
fn test_series_is_deterministic() {
    let config = MatchConfig::default();
    let first = run_series(4, 100, &config, sample_lineup);
    let second = run_series(4, 100, &config, sample_lineup);
    assert_eq!(first, second);
    assert_eq!(first.games_played + first.failed, 4);
    assert_eq!(first.wins.iter().sum::<u64>() + first.draws, first.games_played);
}
