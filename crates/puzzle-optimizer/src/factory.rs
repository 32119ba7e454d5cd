//! Geode collection with a robot factory.
//!
//! A blueprint lists what each of the four robot types costs. The factory
//! starts with a single ore robot; every robot collects one unit of its
//! material per minute, and the factory builds at most one robot per minute.
//!
//! The search does not step minute by minute. A step picks the next robot type
//! to build, waits until the current robots have collected enough to pay for
//! it, and builds it. Waiting plays the role that walking plays in the valve
//! network: a cost in time paid before a choice takes effect.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, ModelError};
use crate::pruning::Estimator;
use crate::puzzle::{BlueprintSpec, Material};
use crate::search::{search, SearchConfig, SearchResult, SuccessorGenerator};
use crate::state::{ChoiceSet, SearchState, Value};

const TIERS: usize = Material::COUNT;
const GEODE: usize = Material::Geode as usize;

/// Compiled blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    id: u32,
    /// `costs[robot][material]`
    costs: [[u32; TIERS]; TIERS],
    /// Robots of a type beyond this count can never be put to use, since the
    /// factory cannot spend more of that material per minute.
    max_useful: [u32; TIERS],
}

impl TryFrom<&BlueprintSpec> for Blueprint {
    type Error = ModelError;

    fn try_from(spec: &BlueprintSpec) -> Result<Self, ModelError> {
        let mut costs = [[0; TIERS]; TIERS];
        for robot in Material::ALL {
            let recipe = spec.costs.get(&robot).ok_or(ModelError::MissingRecipe {
                id: spec.id,
                robot,
            })?;
            for (&material, &amount) in recipe {
                let allowed = material < robot || (robot == Material::Ore && material == Material::Ore);
                if amount > 0 && !allowed {
                    return Err(ModelError::CostTierViolation {
                        id: spec.id,
                        robot,
                        material,
                    });
                }
                costs[robot.index()][material.index()] = amount;
            }
        }

        let mut max_useful: [u32; TIERS] =
            std::array::from_fn(|m| costs.iter().map(|recipe| recipe[m]).max().unwrap_or(0));
        max_useful[GEODE] = u32::MAX;

        Ok(Self {
            id: spec.id,
            costs,
            max_useful,
        })
    }
}

impl Blueprint {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Initial state: one ore robot, nothing in stock.
    pub fn root(&self, time: u32) -> FactoryState {
        let mut robots = [0; TIERS];
        robots[Material::Ore.index()] = 1;
        let available = (0..TIERS)
            .filter(|&r| robots[r] < self.max_useful[r])
            .collect();
        FactoryState {
            time_left: time,
            robots,
            stock: [0; TIERS],
            available,
        }
    }

    /// Most geodes this blueprint can open within `time` minutes.
    pub fn max_geodes(&self, time: u32, config: &SearchConfig) -> Result<SearchResult, ConfigError> {
        search(&self.root(time), self, self, config)
    }

    /// Wait until `robot` is affordable, then build it. `None` if the current
    /// robots never collect what it costs, or if it would be finished too late
    /// to collect anything.
    fn build(&self, state: &FactoryState, robot: usize) -> Option<FactoryState> {
        let recipe = &self.costs[robot];
        let mut wait: u32 = 0;
        for material in 0..TIERS {
            let missing = recipe[material].saturating_sub(state.stock[material]);
            if missing == 0 {
                continue;
            }
            if state.robots[material] == 0 {
                return None;
            }
            wait = wait.max(missing.div_ceil(state.robots[material]));
        }

        let minutes = wait + 1;
        if minutes >= state.time_left {
            return None;
        }

        let mut stock = state.stock;
        for material in 0..TIERS {
            stock[material] = stock[material] + state.robots[material] * minutes - recipe[material];
        }
        let mut robots = state.robots;
        robots[robot] += 1;
        let available = if robots[robot] >= self.max_useful[robot] {
            state.available.without(robot)
        } else {
            state.available
        };

        Some(FactoryState {
            time_left: state.time_left - minutes,
            robots,
            stock,
            available,
        })
    }
}

/// Snapshot of the factory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FactoryState {
    time_left: u32,
    robots: [u32; TIERS],
    stock: [u32; TIERS],
    /// Robot types still worth building
    available: ChoiceSet,
}

impl FactoryState {
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn robots(&self, material: Material) -> u32 {
        self.robots[material.index()]
    }

    pub fn stock(&self, material: Material) -> u32 {
        self.stock[material.index()]
    }

    pub fn available(&self) -> ChoiceSet {
        self.available
    }
}

impl SearchState for FactoryState {
    type Key = FactoryState;

    fn key(&self) -> FactoryState {
        self.clone()
    }

    /// Geodes open at the deadline if nothing else is built.
    fn value(&self) -> Value {
        self.stock[GEODE] + self.robots[GEODE] * self.time_left
    }

    fn is_terminal(&self) -> bool {
        self.time_left == 0 || self.available.is_empty()
    }
}

impl SuccessorGenerator<FactoryState> for Blueprint {
    fn successors(&self, state: &FactoryState) -> Vec<FactoryState> {
        if state.is_terminal() {
            return Vec::new();
        }
        state
            .available
            .iter()
            .filter_map(|robot| self.build(state, robot))
            .collect()
    }
}

impl Estimator<FactoryState> for Blueprint {
    /// Tier by tier, assume every input except the tier directly below is
    /// free, and build one more robot of the tier every minute for as long as
    /// the most the lower tier could ever yield pays for it.
    fn upper_bound(&self, state: &FactoryState) -> Value {
        let time = state.time_left;
        let mut most = [0u32; TIERS];
        for tier in Material::ALL {
            let i = tier.index();
            let mut produced = state.stock[i] + state.robots[i] * time;
            let (mut budget, price) = match tier.previous() {
                Some(lower) => (most[lower.index()], self.costs[i][lower.index()]),
                None => (u32::MAX, 0),
            };
            for remaining in (1..time).rev() {
                if budget < price {
                    break;
                }
                budget -= price;
                produced += remaining;
            }
            most[i] = produced;
        }
        most[GEODE]
    }
}

/// Outcome of optimizing one blueprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintScore {
    pub id: u32,
    pub geodes: Value,
    pub nodes_explored: u64,
}

/// Optimize each blueprint independently, each with its own cache.
pub fn evaluate(
    blueprints: &[Blueprint],
    time: u32,
    config: &SearchConfig,
) -> Result<Vec<BlueprintScore>, ConfigError> {
    blueprints
        .iter()
        .map(|blueprint| {
            let result = blueprint.max_geodes(time, config)?;
            info!(
                blueprint = blueprint.id,
                geodes = result.best_value,
                nodes = result.stats.nodes_explored,
                "blueprint evaluated"
            );
            debug!("{}", result.stats);
            Ok(BlueprintScore {
                id: blueprint.id,
                geodes: result.best_value,
                nodes_explored: result.stats.nodes_explored,
            })
        })
        .collect()
}

/// Sum of id times geodes over all scores.
pub fn quality_level(scores: &[BlueprintScore]) -> u64 {
    scores
        .iter()
        .map(|s| u64::from(s.id) * u64::from(s.geodes))
        .sum()
}

/// Product of the geode counts.
pub fn geode_product(scores: &[BlueprintScore]) -> u64 {
    scores.iter().map(|s| u64::from(s.geodes)).product()
}

/// Evaluation preset matching the factory's state space: states repeat less
/// than in the valve network, so half the cache is dropped at once.
pub fn default_config() -> SearchConfig {
    SearchConfig {
        eviction_fraction: 0.5,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pruning::PruningMode;
    use crate::puzzle::Recipe;
    use crate::search::{exhaustive_best, reachable_states};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn first() -> Blueprint {
        Blueprint::try_from(&BlueprintSpec::standard(1, 4, 2, (3, 14), (2, 7))).unwrap()
    }

    fn second() -> Blueprint {
        Blueprint::try_from(&BlueprintSpec::standard(2, 2, 3, (3, 8), (3, 12))).unwrap()
    }

    fn random_blueprint(rng: &mut StdRng, id: u32) -> Blueprint {
        let spec = BlueprintSpec::standard(
            id,
            rng.gen_range(1..=3),
            rng.gen_range(1..=3),
            (rng.gen_range(1..=3), rng.gen_range(1..=4)),
            (rng.gen_range(1..=3), rng.gen_range(1..=4)),
        );
        Blueprint::try_from(&spec).unwrap()
    }

    #[test]
    fn test_first_example_blueprint() {
        let result = first().max_geodes(24, &default_config()).unwrap();
        assert_eq!(result.best_value, 9);
    }

    #[test]
    fn test_second_example_blueprint() {
        let result = second().max_geodes(24, &default_config()).unwrap();
        assert_eq!(result.best_value, 12);
    }

    #[test]
    fn test_quality_level_and_product() {
        let scores = evaluate(&[first(), second()], 24, &default_config()).unwrap();
        assert_eq!(quality_level(&scores), 33);
        assert_eq!(geode_product(&scores), 108);
    }

    #[test]
    fn test_root_children_wait_for_resources() {
        let blueprint = first();
        let root = blueprint.root(24);
        let children = blueprint.successors(&root);
        // nothing collects clay or obsidian yet
        assert_eq!(children.len(), 2);

        let ore = children.iter().find(|c| c.robots(Material::Ore) == 2).unwrap();
        assert_eq!(ore.time_left(), 19);
        assert_eq!(ore.stock(Material::Ore), 1);

        let clay = children.iter().find(|c| c.robots(Material::Clay) == 1).unwrap();
        assert_eq!(clay.time_left(), 21);
        assert_eq!(clay.stock(Material::Ore), 1);
    }

    #[test]
    fn test_saturated_robot_type_leaves_choices() {
        let spec = BlueprintSpec::standard(7, 2, 1, (1, 1), (1, 1));
        let blueprint = Blueprint::try_from(&spec).unwrap();
        let root = blueprint.root(20);
        // ore robots are needed for at most two ore per minute
        let ore = Material::Ore.index();
        assert!(root.available().contains(ore));
        let child = blueprint
            .successors(&root)
            .into_iter()
            .find(|c| c.robots(Material::Ore) == 2)
            .unwrap();
        assert!(!child.available().contains(ore));
    }

    #[test]
    fn test_unused_material_is_never_a_choice() {
        let mut spec = BlueprintSpec::standard(3, 4, 2, (3, 14), (2, 7));
        // geode robots no longer need obsidian, nothing needs obsidian
        spec.costs.insert(Material::Geode, Recipe::from([(Material::Ore, 2)]));
        let blueprint = Blueprint::try_from(&spec).unwrap();
        assert!(!blueprint.root(10).available().contains(Material::Obsidian.index()));
    }

    #[test]
    fn test_state_invariants_along_paths() {
        let blueprint = first();
        let root = blueprint.root(14);
        for state in reachable_states(&root, &blueprint) {
            for child in blueprint.successors(&state) {
                assert!(child.time_left() < state.time_left());
                assert!(child.available().is_subset(state.available()));
                assert!(child.value() >= state.value());
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        let blueprint = first();
        assert!(blueprint.root(0).is_terminal());
        // building anything takes at least one minute and must leave one more
        assert!(blueprint.successors(&blueprint.root(1)).is_empty());
        assert_eq!(blueprint.max_geodes(1, &default_config()).unwrap().best_value, 0);
    }

    #[test]
    fn test_estimate_is_admissible_on_example() {
        let blueprint = first();
        let root = blueprint.root(16);
        for state in reachable_states(&root, &blueprint) {
            assert!(blueprint.upper_bound(&state) >= exhaustive_best(&state, &blueprint));
        }
    }

    #[test]
    fn test_estimate_is_admissible_on_random_blueprints() {
        let mut rng = StdRng::seed_from_u64(19);
        for id in 0..20 {
            let blueprint = random_blueprint(&mut rng, id);
            let time = rng.gen_range(5..=9);
            for state in reachable_states(&blueprint.root(time), &blueprint) {
                let exact = exhaustive_best(&state, &blueprint);
                assert!(
                    blueprint.upper_bound(&state) >= exact,
                    "bound {} below exact {exact} for {state:?}",
                    blueprint.upper_bound(&state)
                );
            }
        }
    }

    #[test]
    fn test_search_is_exact_on_random_blueprints() {
        let mut rng = StdRng::seed_from_u64(24);
        let configs = [
            default_config(),
            SearchConfig {
                pruning: PruningMode::Disabled,
                ..default_config()
            },
            SearchConfig {
                cache_capacity: 1,
                ..default_config()
            },
        ];
        for id in 0..20 {
            let blueprint = random_blueprint(&mut rng, id);
            let time = rng.gen_range(5..=10);
            let exact = exhaustive_best(&blueprint.root(time), &blueprint);
            for config in &configs {
                assert_eq!(blueprint.max_geodes(time, config).unwrap().best_value, exact);
            }
        }
    }

    #[test]
    fn test_pruning_and_eviction_do_not_change_example() {
        let blueprint = first();
        let pruned = blueprint.max_geodes(18, &default_config()).unwrap().best_value;
        let unpruned = SearchConfig {
            pruning: PruningMode::Disabled,
            ..default_config()
        };
        assert_eq!(blueprint.max_geodes(18, &unpruned).unwrap().best_value, pruned);

        let tiny = SearchConfig {
            cache_capacity: 1,
            ..default_config()
        };
        assert_eq!(blueprint.max_geodes(24, &tiny).unwrap().best_value, 9);
    }

    #[test]
    fn test_monotone_in_budget() {
        let blueprint = second();
        let mut previous = 0;
        for time in (0..=24).step_by(3) {
            let best = blueprint.max_geodes(time, &default_config()).unwrap().best_value;
            assert!(best >= previous);
            previous = best;
        }
        assert_eq!(previous, 12);
    }

    #[test]
    fn test_repeated_searches_agree() {
        let a = first().max_geodes(24, &default_config()).unwrap();
        let b = first().max_geodes(24, &default_config()).unwrap();
        assert_eq!(a.best_value, b.best_value);
        assert_eq!(a.stats.nodes_explored, b.stats.nodes_explored);
        assert_eq!(a.stats.prunings_bound, b.stats.prunings_bound);
    }

    #[test]
    fn test_model_errors() {
        let mut spec = BlueprintSpec::standard(4, 4, 2, (3, 14), (2, 7));
        spec.costs.remove(&Material::Clay);
        assert_eq!(
            Blueprint::try_from(&spec).unwrap_err(),
            ModelError::MissingRecipe {
                id: 4,
                robot: Material::Clay
            }
        );

        let mut spec = BlueprintSpec::standard(5, 4, 2, (3, 14), (2, 7));
        spec.costs
            .insert(Material::Ore, Recipe::from([(Material::Clay, 1)]));
        assert_eq!(
            Blueprint::try_from(&spec).unwrap_err(),
            ModelError::CostTierViolation {
                id: 5,
                robot: Material::Ore,
                material: Material::Clay
            }
        );

        let mut spec = BlueprintSpec::standard(6, 4, 2, (3, 14), (2, 7));
        spec.costs
            .insert(Material::Geode, Recipe::from([(Material::Geode, 1)]));
        assert!(Blueprint::try_from(&spec).is_err());
    }
}
