//! Depth-first branch-and-bound with bounded memoization.
//!
//! For every state the driver:
//! 1. answers from the cache if the state was resolved before,
//! 2. resolves terminal states to their own accumulated value,
//! 3. otherwise expands the state, scores each child with the estimator and
//!    explores children from the most to the least promising bound,
//!    skipping a child whose bound cannot beat the incumbent,
//! 4. resolves the state to the best of its own value and its explored
//!    children, and records the additional value in the cache.
//!
//! Exploring the most promising child first raises the incumbent early, which
//! tightens pruning for all of its siblings.
//!
//! Each invocation owns its incumbent and, unless one is supplied, its cache.
//! Nothing is shared between invocations.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{self, BoundedCache, EvictionPolicy};
use crate::error::ConfigError;
use crate::pruning::{should_prune, Estimator, Incumbent, PruningMode};
use crate::state::{SearchState, Value};
use crate::stats::SearchStats;

/// Domain policy enumerating the states reachable in one joint time step.
///
/// Must be pure: the children depend only on the parent state and static
/// domain data. Returns an empty list for terminal states.
pub trait SuccessorGenerator<S> {
    fn successors(&self, state: &S) -> Vec<S>;
}

impl<S, F> SuccessorGenerator<S> for F
where
    F: Fn(&S) -> Vec<S>,
{
    fn successors(&self, state: &S) -> Vec<S> {
        self(state)
    }
}

/// Configuration for one search invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConfig {
    /// Maximum number of memoized states
    pub cache_capacity: usize,
    /// Fraction of the cache dropped when it is full
    pub eviction_fraction: f64,
    pub eviction_policy: EvictionPolicy,
    pub pruning: PruningMode,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 1_000_000,
            eviction_fraction: 0.2,
            eviction_policy: EvictionPolicy::Oldest,
            pruning: PruningMode::Enabled,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        cache::validate(self.cache_capacity, self.eviction_fraction)
    }

    /// Fresh cache sized by this configuration.
    pub fn build_cache<K>(&self) -> Result<BoundedCache<K, Value>, ConfigError>
    where
        K: Clone + Eq + std::hash::Hash,
    {
        BoundedCache::new(
            self.cache_capacity,
            self.eviction_fraction,
            self.eviction_policy,
        )
    }
}

/// Result of a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Best total value reachable from the initial state
    pub best_value: Value,
    pub stats: SearchStats,
}

/// Find the best total value reachable from `initial`.
///
/// Uses a fresh cache and a fresh incumbent. Fails only if `config` is
/// invalid.
pub fn search<S, G, E>(
    initial: &S,
    generator: &G,
    estimator: &E,
    config: &SearchConfig,
) -> Result<SearchResult, ConfigError>
where
    S: SearchState,
    G: SuccessorGenerator<S>,
    E: Estimator<S>,
{
    let mut cache = config.build_cache()?;
    Ok(search_with_cache(
        initial,
        generator,
        estimator,
        config.pruning,
        &mut cache,
    ))
}

/// Find the best total value reachable from `initial`, memoizing into a
/// caller-supplied cache.
///
/// The cache may already hold entries written by an earlier search over the
/// same domain; they are reused as-is.
pub fn search_with_cache<S, G, E>(
    initial: &S,
    generator: &G,
    estimator: &E,
    pruning: PruningMode,
    cache: &mut BoundedCache<S::Key, Value>,
) -> SearchResult
where
    S: SearchState,
    G: SuccessorGenerator<S>,
    E: Estimator<S>,
{
    let start = Instant::now();
    let evictions_before = cache.evictions();

    debug!(
        capacity = cache.capacity(),
        cached = cache.len(),
        ?pruning,
        root_value = initial.value(),
        root_bound = estimator.upper_bound(initial),
        "starting branch-and-bound search"
    );

    let mut driver = BranchAndBound {
        generator,
        estimator,
        cache: &mut *cache,
        pruning,
        incumbent: Incumbent::unknown(),
        stats: SearchStats::default(),
    };
    let resolved = driver.explore(initial, 0);
    let best_value = driver
        .incumbent
        .value()
        .map_or(resolved, |best| best.max(resolved));

    let mut stats = driver.stats;
    stats.evictions = cache.evictions() - evictions_before;
    stats.time_total = start.elapsed();

    debug!(
        best_value,
        nodes = stats.nodes_explored,
        cache_hits = stats.cache_hits,
        hit_ratio = stats.cache_hit_ratio(),
        pruned = stats.prunings_bound,
        evictions = stats.evictions,
        elapsed = ?stats.time_total,
        "search finished"
    );

    SearchResult { best_value, stats }
}

struct BranchAndBound<'a, K, G, E> {
    generator: &'a G,
    estimator: &'a E,
    cache: &'a mut BoundedCache<K, Value>,
    pruning: PruningMode,
    incumbent: Incumbent,
    stats: SearchStats,
}

impl<K, G, E> BranchAndBound<'_, K, G, E>
where
    K: Clone + Eq + std::hash::Hash,
{
    /// Resolve `state` to the best total value reachable from it.
    fn explore<S>(&mut self, state: &S, depth: u64) -> Value
    where
        S: SearchState<Key = K>,
        G: SuccessorGenerator<S>,
        E: Estimator<S>,
    {
        self.stats.on_node_explored(depth);

        let key = state.key();
        let base = state.value();
        if let Some(additional) = self.cache.get(&key) {
            self.stats.on_cache_hit();
            return base + additional;
        }

        let mut best = base;
        if state.is_terminal() {
            self.stats.on_terminal();
        } else {
            let mut children: Vec<(Value, S)> = self
                .generator
                .successors(state)
                .into_iter()
                .map(|child| (self.estimator.upper_bound(&child), child))
                .collect();
            self.stats.on_children_generated(children.len());

            // most promising first; stable, so ties keep generator order
            children.sort_by(|a, b| b.0.cmp(&a.0));

            for (bound, child) in &children {
                if should_prune(self.pruning, &self.incumbent, *bound) {
                    self.stats.on_pruning_bound();
                    continue;
                }
                let value = self.explore(child, depth + 1);
                best = best.max(value);
                if self.incumbent.offer(value) {
                    self.stats.on_improvement();
                }
            }
        }

        if self.incumbent.offer(best) {
            self.stats.on_improvement();
        }
        self.cache.set(key, best - base);
        best
    }
}

/// Exact best value by plain recursion, with no bound and no cache.
#[cfg(test)]
pub(crate) fn exhaustive_best<S, G>(state: &S, generator: &G) -> Value
where
    S: SearchState,
    G: SuccessorGenerator<S>,
{
    generator
        .successors(state)
        .iter()
        .map(|child| exhaustive_best(child, generator))
        .fold(state.value(), Value::max)
}

/// Every state reachable from `root`, each key once, root first.
#[cfg(test)]
pub(crate) fn reachable_states<S, G>(root: &S, generator: &G) -> Vec<S>
where
    S: SearchState + Clone,
    G: SuccessorGenerator<S>,
{
    let mut seen = rustc_hash::FxHashSet::default();
    let mut states = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(state) = stack.pop() {
        if !seen.insert(state.key()) {
            continue;
        }
        stack.extend(generator.successors(&state));
        states.push(state);
    }
    states
}
