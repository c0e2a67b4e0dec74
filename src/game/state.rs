//! Match state management.

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{error, info};

use crate::error::MatchError;
use crate::game::agent::Agent;
use crate::game::board::{CITIES, CITY, SUNK, Terrain};
use crate::game::flood::FLOOD_CAP_ROUND;
use crate::game::invariants::check_invariants;
use crate::game::resolver::{RoundReport, resolve_round};
use crate::game::sandbox::DEFAULT_TIME_BUDGET;
use crate::log::MatchLog;

/// Number of agents in a match, one per city.
pub const NUM_AGENTS: usize = CITIES.len();

/// Score of every agent still standing when the match ends.
pub const SURVIVOR_SCORE: u32 = 800;

/// Configuration for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchConfig {
    /// Wall-clock budget per agent decision.
    pub time_budget: Duration,
    /// Run the agents of a round concurrently.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            parallel: true,
        }
    }
}

/// Public status of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatus {
    /// Agent name.
    pub name: String,
    /// Agent short code.
    pub code: String,
    /// Whether the agent's city is still above water.
    pub alive: bool,
    /// Round in which the city sank.
    pub eliminated_round: Option<u32>,
    /// Final score, once the match is over.
    pub score: Option<u32>,
    /// Moves forfeited so far.
    pub forfeits: u32,
}

/// Read-only snapshot of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchView {
    /// Number of rounds played.
    pub round: u32,
    /// Whether further steps are meaningful.
    pub running: bool,
    /// The board.
    pub terrain: Terrain,
    /// Agents in city order.
    pub agents: Vec<AgentStatus>,
}

/// A match in progress.
#[derive(Debug)]
pub struct Match {
    agents: Vec<Agent>,
    terrain: Terrain,
    round: u32,
    eliminated: [Option<u32>; NUM_AGENTS],
    forfeits: [u32; NUM_AGENTS],
    scores: Option<[u32; NUM_AGENTS]>,
    rng: ChaCha8Rng,
    config: MatchConfig,
    log: MatchLog,
    announced: bool,
    aborted: Option<String>,
}

impl Match {
    /// Start a match on the standard island.
    ///
    /// `seed` drives the order in which each round's moves are applied.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::AgentCount`] unless exactly four agents are given.
    pub fn new(agents: Vec<Agent>, seed: u64, config: MatchConfig) -> Result<Self, MatchError> {
        Self::with_terrain(agents, Terrain::start(), seed, config)
    }

    /// Start a match on a custom board.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::AgentCount`] unless exactly four agents are given,
    /// and [`MatchError::InvalidCity`] if a city cell is not at height 0.
    pub fn with_terrain(
        agents: Vec<Agent>,
        terrain: Terrain,
        seed: u64,
        config: MatchConfig,
    ) -> Result<Self, MatchError> {
        if agents.len() != NUM_AGENTS {
            return Err(MatchError::AgentCount(agents.len()));
        }
        if let Some((index, &city)) = CITIES.iter().enumerate().find(|(_, c)| terrain[**c] != CITY) {
            return Err(MatchError::InvalidCity {
                index,
                height: terrain[city],
            });
        }

        info!(
            seed,
            agents = ?agents.iter().map(Agent::name).collect::<Vec<_>>(),
            "match created"
        );

        Ok(Self {
            agents,
            terrain,
            round: 0,
            eliminated: [None; NUM_AGENTS],
            forfeits: [0; NUM_AGENTS],
            scores: None,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            log: MatchLog::disabled(),
            announced: false,
            aborted: None,
        })
    }

    /// Attach a match log.
    #[must_use]
    pub fn with_log(mut self, log: MatchLog) -> Self {
        self.log = log;
        self
    }

    /// The board.
    #[must_use]
    pub const fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    /// Number of rounds played so far.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// The agents, in city order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The configuration this match runs with.
    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Which agents still have a city above water.
    #[must_use]
    pub fn alive(&self) -> [bool; NUM_AGENTS] {
        CITIES.map(|city| self.terrain[city] != SUNK)
    }

    /// Round in which each agent was eliminated, `None` while alive.
    #[must_use]
    pub const fn eliminated_rounds(&self) -> &[Option<u32>; NUM_AGENTS] {
        &self.eliminated
    }

    /// Forfeited moves per agent.
    #[must_use]
    pub const fn forfeits(&self) -> &[u32; NUM_AGENTS] {
        &self.forfeits
    }

    /// Final scores, once the match is over.
    #[must_use]
    pub const fn scores(&self) -> Option<&[u32; NUM_AGENTS]> {
        self.scores.as_ref()
    }

    /// Whether further steps are meaningful: more than one agent is alive and
    /// the tide has not reached the top of the island.
    #[must_use]
    pub fn running(&self) -> bool {
        self.aborted.is_none()
            && self.alive().iter().filter(|&&a| a).count() > 1
            && self.round < FLOOD_CAP_ROUND
    }

    /// Play one round.
    ///
    /// Returns `Ok(None)` without doing anything once the match is over.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Invariant`] if the engine state is found to be
    /// inconsistent after the round. The match is then aborted for good.
    pub fn step(&mut self) -> Result<Option<RoundReport>, MatchError> {
        if let Some(reason) = &self.aborted {
            return Err(MatchError::Invariant(reason.clone()));
        }
        if !self.running() {
            return Ok(None);
        }

        let round = self.round;
        self.log.begin_round(round);
        if !self.announced {
            let names: Vec<&str> = self.agents.iter().map(Agent::name).collect();
            self.log.game_start(&names);
            self.announced = true;
        }

        let alive = self.alive();
        let (terrain, report) = resolve_round(
            &self.terrain,
            &self.agents,
            &alive,
            round,
            &mut self.rng,
            &self.config,
        );
        self.terrain = terrain;

        for turn in &report.turns {
            let name = self.agents[turn.agent].name();
            self.log.printed(name, &turn.invocation.console);
            if let Some(forfeit) = turn.invocation.forfeit() {
                self.forfeits[turn.agent] += 1;
                self.log.forfeit(name, forfeit);
            }
        }

        for (idx, city) in CITIES.iter().enumerate() {
            if self.eliminated[idx].is_none() && self.terrain[*city] == SUNK {
                self.eliminated[idx] = Some(round);
                info!(agent = self.agents[idx].name(), round, "agent eliminated");
                self.log.eliminated(self.agents[idx].name());
            }
        }

        self.round += 1;

        let violations = check_invariants(self);
        if !violations.is_empty() {
            let reason = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            error!(round, %reason, "aborting match");
            self.aborted = Some(reason.clone());
            return Err(MatchError::Invariant(reason));
        }

        if !self.running() {
            self.finalize();
        }

        Ok(Some(report))
    }

    /// Step until the match is over.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Match::step`].
    pub fn run_to_end(&mut self) -> Result<(), MatchError> {
        while self.running() {
            self.step()?;
        }
        Ok(())
    }

    /// Snapshot for collaborators.
    #[must_use]
    pub fn view(&self) -> MatchView {
        let alive = self.alive();
        let agents = self
            .agents
            .iter()
            .enumerate()
            .map(|(idx, agent)| AgentStatus {
                name: agent.name().to_string(),
                code: agent.code().to_string(),
                alive: alive[idx],
                eliminated_round: self.eliminated[idx],
                score: self.scores.map(|s| s[idx]),
                forfeits: self.forfeits[idx],
            })
            .collect();

        MatchView {
            round: self.round,
            running: self.running(),
            terrain: self.terrain.clone(),
            agents,
        }
    }

    /// Settle the scores: survivors get [`SURVIVOR_SCORE`], the rest the
    /// round they went under.
    fn finalize(&mut self) {
        let scores = self.eliminated.map(|e| e.unwrap_or(SURVIVOR_SCORE));
        self.scores = Some(scores);

        let results: Vec<(&str, u32)> = self
            .agents
            .iter()
            .zip(scores)
            .map(|(agent, score)| (agent.name(), score))
            .collect();
        info!(round = self.round, ?results, "match over");
        self.log.game_over(&results);
    }

    #[cfg(test)]
    pub(crate) fn terrain_mut(&mut self) -> &mut Terrain {
        &mut self.terrain
    }

    #[cfg(test)]
    pub(crate) fn eliminated_mut(&mut self) -> &mut [Option<u32>; NUM_AGENTS] {
        &mut self.eliminated
    }
}
