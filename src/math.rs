use std::collections::BTreeSet;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Sets whose iteration order matters, for example blocks of states.
pub type OrderedSet<S> = BTreeSet<S>;

/// A bipartition splits a block of elements into the ones that satisfy some test and the ones
/// that do not. Either side may be empty, in which case the bipartition does not actually
/// separate anything, see [`Bipartition::is_proper`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bipartition<I: Ord> {
    positive: BTreeSet<I>,
    negative: BTreeSet<I>,
}

impl<I: Ord> Bipartition<I> {
    /// Splits the elements of `block` by the given predicate.
    pub fn new<X, F>(block: X, mut predicate: F) -> Self
    where
        X: IntoIterator<Item = I>,
        F: FnMut(&I) -> bool,
    {
        let (positive, negative) = block.into_iter().partition(|i| predicate(i));
        Self { positive, negative }
    }

    /// The elements for which the predicate held.
    pub fn positive(&self) -> &BTreeSet<I> {
        &self.positive
    }

    /// The elements for which the predicate did not hold.
    pub fn negative(&self) -> &BTreeSet<I> {
        &self.negative
    }

    /// Consumes `self` and returns the positive and the negative side.
    pub fn into_parts(self) -> (BTreeSet<I>, BTreeSet<I>) {
        (self.positive, self.negative)
    }

    /// Returns true if and only if both sides are non-empty.
    pub fn is_proper(&self) -> bool {
        !self.positive.is_empty() && !self.negative.is_empty()
    }

    /// Size of the smaller side.
    pub fn smaller(&self) -> usize {
        self.positive.len().min(self.negative.len())
    }

    /// Size of the larger side.
    pub fn larger(&self) -> usize {
        self.positive.len().max(self.negative.len())
    }

    /// Returns the number of elements that were split.
    pub fn size(&self) -> usize {
        self.positive.len() + self.negative.len()
    }
}
