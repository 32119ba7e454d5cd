//! Branch-and-bound optimizer for time-budgeted puzzles.
//!
//! This crate provides a depth-first branch-and-bound search over implicitly
//! generated states, with admissible upper-bound pruning and a bounded
//! memoization cache. Two puzzle domains plug into it: releasing pressure
//! from a valve network, and collecting geodes with a robot factory.

pub mod cache;
pub mod error;
pub mod factory;
pub mod logging;
pub mod pruning;
pub mod puzzle;
pub mod search;
pub mod state;
pub mod stats;
pub mod valves;

// Re-export main types
pub use cache::{BoundedCache, EvictionPolicy};
pub use error::{ConfigError, ModelError};
pub use factory::{Blueprint, BlueprintScore, FactoryState};
pub use pruning::{Estimator, Incumbent, PruningMode};
pub use puzzle::{BlueprintSpec, Material, ValveScan, ValveSpec};
pub use search::{search, search_with_cache, SearchConfig, SearchResult, SuccessorGenerator};
pub use state::{ChoiceSet, SearchState, Value};
pub use stats::SearchStats;
pub use valves::{ValveNetwork, ValveState};
