//! Counters collected while a search runs.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Statistics of one search invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    /// States visited, cache hits included.
    pub nodes_explored: u64,
    /// Visits answered from the cache.
    pub cache_hits: u64,
    /// States with no time or no choices left.
    pub terminals: u64,
    /// Children produced by the successor generator.
    pub children_generated: u64,
    /// Children skipped because their bound could not beat the incumbent.
    pub prunings_bound: u64,
    /// Times the incumbent improved.
    pub improvements: u64,
    /// Cache entries dropped to stay within capacity.
    pub evictions: u64,
    /// Deepest recursion level reached (root is 0).
    pub max_depth: u64,
    #[serde(with = "millis")]
    pub time_total: Duration,
}

impl SearchStats {
    #[inline]
    pub fn on_node_explored(&mut self, depth: u64) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
        self.max_depth = self.max_depth.max(depth);
    }

    #[inline]
    pub fn on_cache_hit(&mut self) {
        self.cache_hits = self.cache_hits.saturating_add(1);
    }

    #[inline]
    pub fn on_terminal(&mut self) {
        self.terminals = self.terminals.saturating_add(1);
    }

    #[inline]
    pub fn on_children_generated(&mut self, count: usize) {
        self.children_generated = self.children_generated.saturating_add(count as u64);
    }

    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_improvement(&mut self) {
        self.improvements = self.improvements.saturating_add(1);
    }

    /// Fraction of visits answered from the cache, or 0 before any visit.
    pub fn cache_hit_ratio(&self) -> f64 {
        if self.nodes_explored == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.nodes_explored as f64
        }
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search statistics:")?;
        writeln!(f, "  Nodes explored:      {}", self.nodes_explored)?;
        writeln!(
            f,
            "  Cache hits:          {} ({:.1}%)",
            self.cache_hits,
            self.cache_hit_ratio() * 100.0
        )?;
        writeln!(f, "  Terminal states:     {}", self.terminals)?;
        writeln!(f, "  Children generated:  {}", self.children_generated)?;
        writeln!(f, "  Prunings (bound):    {}", self.prunings_bound)?;
        writeln!(f, "  Improvements:        {}", self.improvements)?;
        writeln!(f, "  Evictions:           {}", self.evictions)?;
        writeln!(f, "  Max depth:           {}", self.max_depth)?;
        writeln!(f, "  Total time:          {:.2?}", self.time_total)?;
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = SearchStats::default();
        stats.on_node_explored(0);
        stats.on_node_explored(3);
        stats.on_node_explored(1);
        stats.on_cache_hit();
        stats.on_children_generated(5);

        assert_eq!(stats.nodes_explored, 3);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.children_generated, 5);
        assert!((stats.cache_hit_ratio() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_serializes_time_as_millis() {
        let stats = SearchStats {
            time_total: Duration::from_millis(1500),
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["timeTotal"], 1500);
        assert_eq!(json["nodesExplored"], 0);
    }

    #[test]
    fn test_display_summary() {
        let stats = SearchStats {
            nodes_explored: 8,
            cache_hits: 2,
            evictions: 5,
            ..Default::default()
        };
        let summary = stats.to_string();
        assert!(summary.starts_with("Search statistics:"));
        assert!(summary.contains("Nodes explored:      8"));
        assert!(summary.contains("Cache hits:          2 (25.0%)"));
        assert!(summary.contains("Evictions:           5"));
    }
}
