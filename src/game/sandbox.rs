//! Sandboxed agent invocation.
//!
//! Each call runs the agent's decision function on its own worker thread
//! against a private rotated copy of the board, and waits for the answer on
//! a channel with a deadline. Whatever goes wrong (a panic, a slow answer, a
//! garbage answer) only ever costs the agent its move for the round.
//!
//! A worker that blows its deadline cannot be stopped. It is detached: it
//! keeps running on its own copy of the board and its reply goes into a
//! channel nobody reads any more.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, Once, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::Forfeit;
use crate::game::agent::{Agent, Console, RawMove};
use crate::game::board::{Move, Terrain, is_legal, to_canonical};

/// Wall-clock time an agent gets per decision.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(100);

/// Worker threads are named `agent-<code>`.
const AGENT_THREAD_PREFIX: &str = "agent-";

/// Outcome of one sandboxed decision.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The move in the canonical frame, `Ok(None)` for a pass.
    pub outcome: Result<Option<Move>, Forfeit>,
    /// Text the agent wrote to its console.
    pub console: String,
    /// Time from launch until the reply (or the deadline).
    pub elapsed: Duration,
}

impl Invocation {
    /// The canonical move, if the agent produced a usable one.
    #[must_use]
    pub fn candidate(&self) -> Option<Move> {
        self.outcome.as_ref().ok().copied().flatten()
    }

    /// The forfeiture, if any.
    #[must_use]
    pub fn forfeit(&self) -> Option<&Forfeit> {
        self.outcome.as_ref().err()
    }
}

/// Reply sent back from a worker thread.
type WorkerReply = (Result<Option<RawMove>, String>, Console);

/// Ask `agent` for its move.
///
/// `terrain` is the canonical board; the agent sees it rotated by `frame`
/// quarter turns. The returned move, if any, has been checked for legality
/// on that view and rotated back into the canonical frame.
#[must_use]
pub fn invoke(agent: &Agent, frame: u8, terrain: &Terrain, round: u32, budget: Duration) -> Invocation {
    silence_agent_panics();

    let view = terrain.rotated_view(frame);
    let mut scratch = view.clone();
    let strategy = agent.strategy();
    let (tx, rx) = mpsc::sync_channel::<WorkerReply>(1);
    let printed = Arc::new(Mutex::new(String::new()));
    let mut console = Console::mirrored(Arc::clone(&printed));

    let start = Instant::now();
    let spawned = thread::Builder::new()
        .name(format!("{AGENT_THREAD_PREFIX}{}", agent.code()))
        .spawn(move || {
            let reply = panic::catch_unwind(AssertUnwindSafe(|| {
                strategy.decide(&mut scratch, round, &mut console)
            }))
            .map_err(panic_message);
            // The receiver is gone if we missed the deadline.
            let _ = tx.send((reply, console));
        });

    if let Err(e) = spawned {
        return Invocation {
            outcome: Err(Forfeit::Fault {
                message: format!("could not start agent thread: {e}"),
            }),
            console: String::new(),
            elapsed: start.elapsed(),
        };
    }

    let received = rx.recv_timeout(budget);
    let elapsed = start.elapsed();

    // What a detached worker printed before the deadline.
    let printed_so_far = || printed.lock().unwrap_or_else(PoisonError::into_inner).clone();

    let (outcome, console) = match received {
        Err(RecvTimeoutError::Timeout) => (
            Err(Forfeit::Timeout {
                elapsed,
                late_reply: None,
            }),
            printed_so_far(),
        ),
        Err(RecvTimeoutError::Disconnected) => (
            Err(Forfeit::Fault {
                message: "agent thread exited without replying".to_string(),
            }),
            printed_so_far(),
        ),
        Ok((Err(message), console)) => (Err(Forfeit::Fault { message }), console.into_string()),
        Ok((Ok(reply), console)) if elapsed > budget => (
            Err(Forfeit::Timeout {
                elapsed,
                late_reply: Some(reply),
            }),
            console.into_string(),
        ),
        Ok((Ok(reply), console)) => (validate(reply, &view, frame), console.into_string()),
    };

    if let Err(forfeit) = &outcome {
        debug!(
            agent = agent.name(),
            round,
            kind = forfeit.kind(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "agent forfeits its move"
        );
    }

    Invocation {
        outcome,
        console,
        elapsed,
    }
}

/// Check a reply against the view the agent was shown and rotate it back.
fn validate(reply: Option<RawMove>, view: &Terrain, frame: u8) -> Result<Option<Move>, Forfeit> {
    let Some(raw) = reply else {
        return Ok(None);
    };
    // Coordinates that do not even fit the board type are off the board.
    let Some(local) = Move::from_raw(raw).filter(|mv| is_legal(view, mv.src, mv.dst)) else {
        return Err(Forfeit::Illegal { attempted: raw });
    };
    Ok(Some(Move::new(
        to_canonical(frame, local.src),
        to_canonical(frame, local.dst),
    )))
}

/// Render a panic payload as text.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked with a non-string payload".to_string()
    }
}

/// Keep agent panics off stderr; the sandbox reports them through the match log.
///
/// Installs a panic hook once per process that swallows reports from agent
/// worker threads and defers to the previous hook for everything else.
pub fn silence_agent_panics() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let in_agent = thread::current()
                .name()
                .is_some_and(|name| name.starts_with(AGENT_THREAD_PREFIX));
            if !in_agent {
                previous(info);
            }
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{CITIES, Coord, to_local};

    fn pass_agent() -> Agent {
        Agent::from_fn("Pass", "PS", |_, _, _| None)
    }

    #[test]
    fn test_pass_is_not_a_forfeit() {
        let inv = invoke(&pass_agent(), 0, &Terrain::start(), 0, DEFAULT_TIME_BUDGET);
        assert!(matches!(inv.outcome, Ok(None)));
        assert!(inv.candidate().is_none());
        assert!(inv.forfeit().is_none());
    }

    #[test]
    fn test_legal_move_rotated_to_canonical() {
        // In its own frame every agent moves from next to its city.
        let agent = Agent::from_fn("Mover", "MV", |_, _, _| Some([[4, 4], [4, 3]]));
        let terrain = Terrain::start();
        for frame in 0..4u8 {
            let inv = invoke(&agent, frame, &terrain, 0, DEFAULT_TIME_BUDGET);
            let mv = inv.candidate().expect("legal move");
            assert_eq!(to_local(frame, mv.src), Coord::new(4, 4));
            assert_eq!(to_local(frame, mv.dst), Coord::new(4, 3));
            // The canonical source is diagonal to this agent's city.
            let city = CITIES[usize::from(frame)];
            assert_eq!(mv.src.row.abs_diff(city.row), 1);
            assert_eq!(mv.src.col.abs_diff(city.col), 1);
        }
    }

    #[test]
    fn test_timeout_forfeits() {
        let agent = Agent::from_fn("Sleepy", "SL", |_, _, _| {
            thread::sleep(Duration::from_millis(300));
            Some([[4, 4], [4, 3]])
        });
        let inv = invoke(&agent, 0, &Terrain::start(), 0, Duration::from_millis(50));
        assert!(matches!(inv.outcome, Err(Forfeit::Timeout { .. })));
        assert!(inv.elapsed < Duration::from_millis(300));
    }

    #[test]
    fn test_timeout_keeps_console_text() {
        let agent = Agent::from_fn("Chatty", "CY", |_, round, console| {
            console.print(format!("thinking about round {round}"));
            thread::sleep(Duration::from_millis(300));
            console.print("too late");
            None
        });
        let inv = invoke(&agent, 0, &Terrain::start(), 12, Duration::from_millis(100));
        assert!(matches!(inv.outcome, Err(Forfeit::Timeout { late_reply: None, .. })));
        assert_eq!(inv.console, "thinking about round 12\n");
    }

    #[test]
    fn test_panic_becomes_fault() {
        let agent = Agent::from_fn("Crashy", "CR", |_, _, console| {
            console.print("about to crash");
            panic!("index out of range");
        });
        let inv = invoke(&agent, 2, &Terrain::start(), 3, DEFAULT_TIME_BUDGET);
        match inv.outcome {
            Err(Forfeit::Fault { message }) => assert!(message.contains("index out of range")),
            other => panic!("expected fault, got {other:?}"),
        }
        assert_eq!(inv.console, "about to crash\n");
    }

    #[test]
    fn test_negative_coordinates_are_illegal() {
        let agent = Agent::from_fn("Negative", "NG", |_, _, _| Some([[-1, 4], [4, 3]]));
        let inv = invoke(&agent, 0, &Terrain::start(), 0, DEFAULT_TIME_BUDGET);
        assert_eq!(
            inv.outcome,
            Err(Forfeit::Illegal {
                attempted: [[-1, 4], [4, 3]]
            })
        );

        let agent = Agent::from_fn("Huge", "HG", |_, _, _| Some([[4, 4], [i64::MAX, 3]]));
        let inv = invoke(&agent, 3, &Terrain::start(), 0, DEFAULT_TIME_BUDGET);
        assert!(matches!(inv.outcome, Err(Forfeit::Illegal { .. })));
    }

    #[test]
    fn test_illegal_reply() {
        // Moving out of the agent's own city is never legal.
        let agent = Agent::from_fn("Citizen", "CT", |_, _, _| Some([[5, 5], [4, 4]]));
        let inv = invoke(&agent, 1, &Terrain::start(), 0, DEFAULT_TIME_BUDGET);
        assert!(matches!(inv.outcome, Err(Forfeit::Illegal { .. })));

        let agent = Agent::from_fn("Faraway", "FA", |_, _, _| Some([[4, 4], [200, 3]]));
        let inv = invoke(&agent, 0, &Terrain::start(), 0, DEFAULT_TIME_BUDGET);
        assert!(matches!(inv.outcome, Err(Forfeit::Illegal { .. })));
    }

    #[test]
    fn test_legality_checked_against_unmodified_view() {
        // The agent empties its source cell on its copy before answering;
        // the move is judged on the board it was shown.
        let agent = Agent::from_fn("Cheater", "CH", |terrain, _, _| {
            terrain.set(Coord::new(4, 4), 0);
            terrain.set(Coord::new(4, 3), 8);
            Some([[4, 4], [4, 3]])
        });
        let terrain = Terrain::start();
        let inv = invoke(&agent, 0, &terrain, 0, DEFAULT_TIME_BUDGET);
        assert!(inv.candidate().is_some());
        assert_eq!(terrain, Terrain::start());
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert!(panic_message(Box::new(7u32)).contains("non-string"));
    }
}
