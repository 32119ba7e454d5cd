//! Upper bounds, the incumbent and the bound rule.
//!
//! A child is skipped when its optimistic bound cannot beat the best value
//! found so far. This is the only pruning the driver performs, so it is only
//! as good as the estimator behind it: an estimator that ever underestimates
//! makes the search return a too-small value.

use serde::{Deserialize, Serialize};

use crate::state::Value;

/// Optimistic bound on the best total value reachable from a state.
///
/// Implementations must be admissible: for every reachable state the bound is
/// at least the exact best total value, accumulated value included. They must
/// also be deterministic and cheap, linear in the number of remaining choices.
pub trait Estimator<S> {
    fn upper_bound(&self, state: &S) -> Value;
}

impl<S, F> Estimator<S> for F
where
    F: Fn(&S) -> Value,
{
    fn upper_bound(&self, state: &S) -> Value {
        self(state)
    }
}

/// Whether the driver applies the bound rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PruningMode {
    #[default]
    Enabled,
    /// Explore every child. Only useful to check that pruning never changes
    /// the result.
    Disabled,
}

/// Best total value found so far by one search invocation.
///
/// Starts unknown, below any real value, and never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Incumbent(Option<Value>);

impl Incumbent {
    pub const fn unknown() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<Value> {
        self.0
    }

    /// Record an achievable value. Returns true if it improved the incumbent.
    pub fn offer(&mut self, value: Value) -> bool {
        match self.0 {
            Some(best) if best >= value => false,
            _ => {
                self.0 = Some(value);
                true
            }
        }
    }

    /// True if a subtree bounded by `bound` cannot beat the incumbent.
    #[inline]
    pub fn dominates(&self, bound: Value) -> bool {
        self.0.is_some_and(|best| bound <= best)
    }
}

/// Apply the bound rule for one child.
#[inline]
pub fn should_prune(mode: PruningMode, incumbent: &Incumbent, bound: Value) -> bool {
    mode == PruningMode::Enabled && incumbent.dominates(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_incumbent_prunes_nothing() {
        let incumbent = Incumbent::unknown();
        assert!(!incumbent.dominates(0));
        assert!(!should_prune(PruningMode::Enabled, &incumbent, 0));
    }

    #[test]
    fn test_incumbent_is_monotone() {
        let mut incumbent = Incumbent::unknown();
        assert!(incumbent.offer(5));
        assert!(!incumbent.offer(3));
        assert!(!incumbent.offer(5));
        assert_eq!(incumbent.value(), Some(5));
        assert!(incumbent.offer(8));
        assert_eq!(incumbent.value(), Some(8));
    }

    #[test]
    fn test_bound_equal_to_incumbent_is_pruned() {
        let mut incumbent = Incumbent::unknown();
        incumbent.offer(10);
        assert!(should_prune(PruningMode::Enabled, &incumbent, 10));
        assert!(should_prune(PruningMode::Enabled, &incumbent, 9));
        assert!(!should_prune(PruningMode::Enabled, &incumbent, 11));
        assert!(!should_prune(PruningMode::Disabled, &incumbent, 0));
    }

    #[test]
    fn test_closure_estimator() {
        let estimator = |s: &u32| s * 2;
        assert_eq!(estimator.upper_bound(&21), 42);
    }
}
