//! Puzzle input types, deserialized from JSON.
//!
//! These are the raw, unvalidated descriptions handed to the CLI. They are
//! compiled into searchable models by [`crate::valves::ValveNetwork`] and
//! [`crate::factory::Blueprint`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One valve of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValveSpec {
    pub name: String,
    /// Pressure released per minute once the valve is open
    pub flow_rate: u32,
    /// Valves reachable in one minute
    #[serde(default)]
    pub tunnels: Vec<String>,
}

impl ValveSpec {
    pub fn new(name: &str, flow_rate: u32, tunnels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            flow_rate,
            tunnels: tunnels.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// The complete valve scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValveScan {
    pub valves: Vec<ValveSpec>,
}

/// Material tiers, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Ore,
    Clay,
    Obsidian,
    Geode,
}

impl Material {
    pub const ALL: [Material; 4] = [
        Material::Ore,
        Material::Clay,
        Material::Obsidian,
        Material::Geode,
    ];

    pub const COUNT: usize = Self::ALL.len();

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The tier directly below, if any.
    pub fn previous(self) -> Option<Material> {
        match self {
            Material::Ore => None,
            Material::Clay => Some(Material::Ore),
            Material::Obsidian => Some(Material::Clay),
            Material::Geode => Some(Material::Obsidian),
        }
    }
}

/// Materials needed to build one robot
pub type Recipe = BTreeMap<Material, u32>;

/// A blueprint as written in the input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintSpec {
    pub id: u32,
    /// Recipe per robot type, keyed by the material the robot collects
    pub costs: BTreeMap<Material, Recipe>,
}

impl BlueprintSpec {
    /// Blueprint with the four usual recipes: ore and clay robots cost ore,
    /// obsidian robots cost ore and clay, geode robots cost ore and obsidian.
    pub fn standard(
        id: u32,
        ore_robot: u32,
        clay_robot: u32,
        obsidian_robot: (u32, u32),
        geode_robot: (u32, u32),
    ) -> Self {
        use Material::{Clay, Geode, Obsidian, Ore};

        let costs = BTreeMap::from([
            (Ore, Recipe::from([(Ore, ore_robot)])),
            (Clay, Recipe::from([(Ore, clay_robot)])),
            (Obsidian, Recipe::from([(Ore, obsidian_robot.0), (Clay, obsidian_robot.1)])),
            (Geode, Recipe::from([(Ore, geode_robot.0), (Obsidian, geode_robot.1)])),
        ]);
        Self { id, costs }
    }
}
