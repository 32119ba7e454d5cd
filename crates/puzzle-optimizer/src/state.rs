//! Search states and the canonical set of still-available choices.
//!
//! A state is an immutable snapshot of partial progress. The driver only needs
//! three things from it: a canonical key for memoization, the value already
//! secured if nothing else happens, and whether any work is left at all.

use std::fmt;
use std::hash::Hash;

/// Value accumulated or estimated by a search. Always non-negative.
pub type Value = u32;

/// An immutable node of the implicit search graph.
pub trait SearchState {
    /// Canonical, order-independent identity of the state. Two states with
    /// equal keys must resolve to the same value.
    type Key: Clone + Eq + Hash;

    fn key(&self) -> Self::Key;

    /// Value secured so far, assuming no further action is taken.
    fn value(&self) -> Value;

    /// True when no agent has time left or no choice remains.
    fn is_terminal(&self) -> bool;
}

/// Set of choice indices in `0..64`.
///
/// Stored as a bitmask, so equal sets always have the same representation no
/// matter in which order choices were consumed.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChoiceSet(u64);

impl ChoiceSet {
    /// Largest number of distinct choices a set can hold.
    pub const CAPACITY: usize = 64;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Set holding every index in `0..count`.
    pub fn full(count: usize) -> Self {
        debug_assert!(count <= Self::CAPACITY);
        if count >= Self::CAPACITY {
            Self(u64::MAX)
        } else {
            Self((1u64 << count) - 1)
        }
    }

    #[inline]
    pub fn contains(self, index: usize) -> bool {
        index < Self::CAPACITY && self.0 & (1u64 << index) != 0
    }

    /// Copy of the set without `index`.
    #[inline]
    #[must_use]
    pub fn without(self, index: usize) -> Self {
        if index < Self::CAPACITY {
            Self(self.0 & !(1u64 << index))
        } else {
            self
        }
    }

    /// Copy of the set with `index` added.
    #[inline]
    #[must_use]
    pub fn with(self, index: usize) -> Self {
        debug_assert!(index < Self::CAPACITY);
        Self(self.0 | (1u64 << index))
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every member of `self` is also in `other`.
    #[inline]
    pub fn is_subset(self, other: Self) -> bool {
        self.0 & !other.0 == 0
    }

    /// Members in ascending order.
    pub fn iter(self) -> ChoiceIter {
        ChoiceIter(self.0)
    }
}

impl fmt::Debug for ChoiceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<usize> for ChoiceSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl IntoIterator for ChoiceSet {
    type Item = usize;
    type IntoIter = ChoiceIter;

    fn into_iter(self) -> ChoiceIter {
        self.iter()
    }
}

/// Ascending iterator over the members of a [`ChoiceSet`].
#[derive(Debug, Clone)]
pub struct ChoiceIter(u64);

impl Iterator for ChoiceIter {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.0.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for ChoiceIter {}
