//! Pressure release through a network of valves.
//!
//! One or more agents start at the same valve with the same time budget.
//! Moving through a tunnel takes one minute and opening a valve takes one
//! more; an open valve then releases its flow rate every remaining minute.
//!
//! Only valves with a positive flow rate are worth visiting, so the search
//! never walks tunnel by tunnel. Each step moves an agent straight to a
//! closed valve using the precomputed shortest distances and opens it.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{ConfigError, ModelError};
use crate::pruning::Estimator;
use crate::puzzle::ValveScan;
use crate::search::{search, SearchConfig, SearchResult, SuccessorGenerator};
use crate::state::{ChoiceSet, SearchState, Value};

/// Distance between two locations that are not connected.
const UNREACHABLE: u32 = u32::MAX;

/// Compiled valve network with all-pairs shortest distances.
#[derive(Debug, Clone)]
pub struct ValveNetwork {
    names: Vec<String>,
    flow: Vec<u32>,
    /// `distance[from][to]` in minutes, `UNREACHABLE` if not connected
    distance: Vec<Vec<u32>>,
    /// Location of each choice; choices are the valves with positive flow
    choices: Vec<usize>,
    start: usize,
}

impl ValveNetwork {
    /// Compile a scan, with every agent starting at `start`.
    pub fn new(scan: &ValveScan, start: &str) -> Result<Self, ModelError> {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, valve) in scan.valves.iter().enumerate() {
            if index.insert(valve.name.as_str(), i).is_some() {
                return Err(ModelError::DuplicateValve(valve.name.clone()));
            }
        }

        let mut tunnels = Vec::with_capacity(scan.valves.len());
        for valve in &scan.valves {
            let mut targets = Vec::with_capacity(valve.tunnels.len());
            for to in &valve.tunnels {
                match index.get(to.as_str()) {
                    Some(&t) => targets.push(t),
                    None => {
                        return Err(ModelError::UnknownTunnel {
                            from: valve.name.clone(),
                            to: to.clone(),
                        })
                    }
                }
            }
            tunnels.push(targets);
        }

        let start = *index
            .get(start)
            .ok_or_else(|| ModelError::UnknownStart(start.to_string()))?;

        let distance: Vec<Vec<u32>> = (0..scan.valves.len())
            .map(|from| distances_from(from, &tunnels))
            .collect();

        let choices: Vec<usize> = scan
            .valves
            .iter()
            .enumerate()
            .filter(|(_, v)| v.flow_rate > 0)
            .map(|(i, _)| i)
            .collect();
        if choices.len() > ChoiceSet::CAPACITY {
            return Err(ModelError::TooManyChoices {
                count: choices.len(),
                max: ChoiceSet::CAPACITY,
            });
        }
        if let Some(&lost) = choices.iter().find(|&&c| distance[start][c] == UNREACHABLE) {
            return Err(ModelError::UnreachableValve {
                valve: scan.valves[lost].name.clone(),
                start: scan.valves[start].name.clone(),
            });
        }

        Ok(Self {
            names: scan.valves.iter().map(|v| v.name.clone()).collect(),
            flow: scan.valves.iter().map(|v| v.flow_rate).collect(),
            distance,
            choices,
            start,
        })
    }

    /// Shortest travel time between two named valves.
    pub fn distance(&self, from: &str, to: &str) -> Option<u32> {
        let from = self.location(from)?;
        let to = self.location(to)?;
        Some(self.distance[from][to]).filter(|&d| d != UNREACHABLE)
    }

    /// Names of the valves worth opening, in choice order.
    pub fn choice_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.choices.iter().map(|&c| self.names[c].as_str())
    }

    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }

    pub fn name(&self, location: usize) -> &str {
        &self.names[location]
    }

    fn location(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Initial state: `agents` agents at the start valve, every valve closed.
    pub fn root(&self, agents: usize, time: u32) -> ValveState {
        let agent = Agent {
            time_left: time,
            location: self.start,
        };
        ValveState {
            agents: SmallVec::from_elem(agent, agents),
            closed: ChoiceSet::full(self.choices.len()),
            released: 0,
        }
    }

    /// Most pressure `agents` agents can release within `time` minutes.
    pub fn max_pressure(
        &self,
        time: u32,
        agents: usize,
        config: &SearchConfig,
    ) -> Result<SearchResult, ConfigError> {
        search(&self.root(agents, time), self, self, config)
    }

    /// Minutes left after `agent` walks to `choice` and opens it, if that
    /// still leaves at least one minute of flow.
    #[inline]
    fn time_after_opening(&self, agent: Agent, choice: usize) -> Option<u32> {
        let cost = self.distance[agent.location][self.choices[choice]].checked_add(1)?;
        agent.time_left.checked_sub(cost).filter(|&t| t > 0)
    }

    #[inline]
    fn flow_of(&self, choice: usize) -> u32 {
        self.flow[self.choices[choice]]
    }

    /// Give agent `idx` each closed valve it can still open, or let it stay
    /// put, then move on to the next agent. At least one agent moves in every
    /// child.
    fn assign(
        &self,
        idx: usize,
        agents: Agents,
        closed: ChoiceSet,
        released: Value,
        moved: bool,
        out: &mut Vec<ValveState>,
    ) {
        if idx == agents.len() {
            if moved {
                out.push(ValveState::new(agents, closed, released));
            }
            return;
        }

        let agent = agents[idx];
        for choice in closed {
            let Some(time_left) = self.time_after_opening(agent, choice) else {
                continue;
            };
            let mut next = agents.clone();
            next[idx] = Agent {
                time_left,
                location: self.choices[choice],
            };
            self.assign(
                idx + 1,
                next,
                closed.without(choice),
                released.saturating_add(self.flow_of(choice).saturating_mul(time_left)),
                true,
                out,
            );
        }
        // an agent may leave a valve to a partner that reaches it later
        self.assign(idx + 1, agents, closed, released, moved, out);
    }
}

/// Breadth-first distances from one location to every other.
fn distances_from(from: usize, tunnels: &[Vec<usize>]) -> Vec<u32> {
    let mut dist = vec![UNREACHABLE; tunnels.len()];
    let mut queue = VecDeque::from([from]);
    dist[from] = 0;
    while let Some(curr) = queue.pop_front() {
        for &next in &tunnels[curr] {
            if dist[next] == UNREACHABLE {
                dist[next] = dist[curr] + 1;
                queue.push_back(next);
            }
        }
    }
    dist
}

/// One agent: where it stands and how much time it has left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Agent {
    pub time_left: u32,
    pub location: usize,
}

type Agents = SmallVec<[Agent; 2]>;

/// Snapshot of the valve search.
///
/// Agents are kept sorted, so states that differ only in which of two
/// interchangeable agents did what compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValveState {
    agents: Agents,
    closed: ChoiceSet,
    /// Pressure released by the deadline by the valves opened so far
    released: Value,
}

impl ValveState {
    fn new(mut agents: Agents, closed: ChoiceSet, released: Value) -> Self {
        agents.sort_unstable();
        Self {
            agents,
            closed,
            released,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn closed(&self) -> ChoiceSet {
        self.closed
    }

    pub fn released(&self) -> Value {
        self.released
    }
}

impl SearchState for ValveState {
    type Key = ValveState;

    fn key(&self) -> ValveState {
        self.clone()
    }

    fn value(&self) -> Value {
        self.released
    }

    fn is_terminal(&self) -> bool {
        self.closed.is_empty() || self.agents.iter().all(|a| a.time_left == 0)
    }
}

impl SuccessorGenerator<ValveState> for ValveNetwork {
    fn successors(&self, state: &ValveState) -> Vec<ValveState> {
        if state.is_terminal() {
            return Vec::new();
        }
        let mut children = Vec::new();
        self.assign(
            0,
            state.agents.clone(),
            state.closed,
            state.released,
            false,
            &mut children,
        );
        children.sort_unstable();
        children.dedup();
        children
    }
}

impl Estimator<ValveState> for ValveNetwork {
    /// Every closed valve is opened by whichever agent could reach it first,
    /// as if the agents never had to share their time between valves.
    fn upper_bound(&self, state: &ValveState) -> Value {
        let potential: Value = state
            .closed
            .iter()
            .map(|choice| {
                let best_time = state
                    .agents
                    .iter()
                    .filter_map(|&a| self.time_after_opening(a, choice))
                    .max()
                    .unwrap_or(0);
                self.flow_of(choice).saturating_mul(best_time)
            })
            .fold(0, Value::saturating_add);
        state.released.saturating_add(potential)
    }
}
