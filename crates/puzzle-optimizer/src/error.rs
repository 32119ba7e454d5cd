//! Error types for model construction and search configuration.
//!
//! The search itself never fails: every error here is raised before a search
//! starts, while an input model is compiled or a configuration is checked.

use thiserror::Error;

use crate::puzzle::Material;

/// A domain model that cannot be searched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("valve `{0}` is defined more than once")]
    DuplicateValve(String),

    #[error("valve `{from}` has a tunnel to unknown valve `{to}`")]
    UnknownTunnel { from: String, to: String },

    #[error("start valve `{0}` does not exist")]
    UnknownStart(String),

    #[error("valve `{valve}` is not reachable from start valve `{start}`")]
    UnreachableValve { valve: String, start: String },

    #[error("{count} valves have a positive flow rate, at most {max} are supported")]
    TooManyChoices { count: usize, max: usize },

    #[error("blueprint {id} has no recipe for the {robot:?} robot")]
    MissingRecipe { id: u32, robot: Material },

    #[error("blueprint {id}: the {robot:?} robot may not cost {material:?}")]
    CostTierViolation {
        id: u32,
        robot: Material,
        material: Material,
    },
}

/// A search configuration outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cache capacity must be at least 1")]
    ZeroCapacity,

    #[error("eviction fraction must be in (0, 1], got {0}")]
    EvictionFraction(f64),
}
