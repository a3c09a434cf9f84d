use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use tracing::{debug, trace};

use crate::{
    math::{Bipartition, OrderedSet},
    table::MealyTable,
    Show, StateId,
};

mod tree;
pub use tree::{DiscriminationTree, NodeId};

/// A single observation: processing `input` emits `output`. Pairs are ordered by their input and
/// then by their output symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IoPair {
    /// The input symbol.
    pub input: char,
    /// The output symbol.
    pub output: char,
}

impl IoPair {
    /// Creates a new pair.
    pub fn new(input: char, output: char) -> Self {
        Self { input, output }
    }

    /// Returns true if `state` has a transition on the input of `self` that emits its output.
    /// A state without a transition on the input does not match.
    pub fn matches<Q: StateId>(&self, table: &MealyTable<Q>, state: Q) -> bool {
        table
            .transition(state, self.input)
            .is_some_and(|t| t.output() == self.output)
    }
}

impl Display for IoPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.input, self.output)
    }
}

impl Show for IoPair {
    fn show(&self) -> String {
        self.to_string()
    }
}

/// The outcome of testing a state against an [`IoPair`], as it is recorded along a path of a
/// [`DiscriminationTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label {
    /// The pair that was tested.
    pub pair: IoPair,
    /// Whether the pair was observed.
    pub matches: bool,
}

impl Label {
    /// Creates a label stating that `pair` was observed.
    pub fn matching(pair: IoPair) -> Self {
        Self {
            pair,
            matches: true,
        }
    }

    /// Creates a label stating that `pair` was not observed.
    pub fn not_matching(pair: IoPair) -> Self {
        Self {
            pair,
            matches: false,
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.matches {
            write!(f, "{}", self.pair)
        } else {
            write!(f, "not {}", self.pair)
        }
    }
}

impl Show for Label {
    fn show(&self) -> String {
        self.to_string()
    }
}

/// Records one split that was made while building a [`DiscriminationTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step<Q: StateId = u32> {
    /// The states that were split.
    pub block: BTreeSet<Q>,
    /// The pair by which the block was split.
    pub pair: IoPair,
    /// The states of the block that match the pair.
    pub positive: BTreeSet<Q>,
    /// The states of the block that do not match the pair.
    pub negative: BTreeSet<Q>,
}

impl<Q: StateId> Step<Q> {
    /// The two resulting groups together with the label that leads to them.
    pub fn groups(&self) -> [(Label, &BTreeSet<Q>); 2] {
        [
            (Label::matching(self.pair), &self.positive),
            (Label::not_matching(self.pair), &self.negative),
        ]
    }
}

impl<Q: StateId> Show for Step<Q> {
    fn show(&self) -> String {
        format!(
            "split {} by {} into {} and {}",
            self.block.show(),
            self.pair,
            self.positive.show(),
            self.negative.show()
        )
    }
}

/// What [`build_discrimination_tree`] produces: the tree and the splits that were made, in the
/// order in which the corresponding inner nodes were created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WResult<Q: StateId = u32> {
    /// The constructed tree.
    pub tree: DiscriminationTree<Q>,
    /// One entry for each inner node of the tree.
    pub steps: Vec<Step<Q>>,
}

impl<Q: StateId> WResult<Q> {
    /// Computes the labels along the path to each state, see [`extract_sequences`].
    pub fn sequences(&self) -> BTreeMap<Q, Vec<Label>> {
        extract_sequences(&self.tree)
    }
}

/// Searches the pair that splits `block` most evenly. A pair is only considered if it actually
/// separates some states, and it replaces the current best only if its smaller side is larger, or
/// if the smaller sides are equal and its larger side is smaller. Ties are therefore resolved in
/// favor of the pair that comes first.
fn best_split<Q: StateId>(
    table: &MealyTable<Q>,
    block: &BTreeSet<Q>,
    pairs: &OrderedSet<IoPair>,
) -> Option<(IoPair, Bipartition<Q>)> {
    let mut best: Option<(IoPair, Bipartition<Q>)> = None;

    for pair in pairs {
        let split = Bipartition::new(block.iter().copied(), |q| pair.matches(table, *q));
        if !split.is_proper() {
            continue;
        }
        trace!(
            "{pair} splits {} into {} and {}",
            block.show(),
            split.positive().show(),
            split.negative().show()
        );

        let improves = match &best {
            None => true,
            Some((_, current)) => {
                split.smaller() > current.smaller()
                    || (split.smaller() == current.smaller() && split.larger() < current.larger())
            }
        };
        if improves {
            best = Some((*pair, split));
        }
    }

    best
}

/// Builds a [`DiscriminationTree`] for `table`. The root holds all states and every block with at
/// least two states is split by the pair that is chosen by the balance criterion, where all
/// input/output pairs occurring in the table are candidates for every block. A block becomes a leaf
/// if it consists of a single state or if no pair separates its states.
///
/// Nodes are created in pre-order, the side that matches the pair before the other one, and the
/// returned steps follow the same order.
///
/// ```
/// use mealy_conformance::prelude::*;
///
/// let table = TableBuilder::default()
///     .with_transitions([(1, 'a', 'x', 2), (2, 'a', 'y', 1)])
///     .build()
///     .unwrap();
/// let result = build_discrimination_tree(&table);
/// assert_eq!(result.steps.len(), 1);
/// assert_eq!(result.steps[0].pair, IoPair::new('a', 'x'));
/// assert_eq!(result.tree.separating_pair(1, 2), Some(IoPair::new('a', 'x')));
/// ```
pub fn build_discrimination_tree<Q: StateId>(table: &MealyTable<Q>) -> WResult<Q> {
    let pairs = table.io_pairs();
    debug!(
        "building discrimination tree for {} states with {} candidate pairs",
        table.size(),
        pairs.len()
    );

    let mut tree = DiscriminationTree::empty();
    let mut steps = Vec::new();
    // blocks waiting to become nodes, together with the parent and the side they hang on
    let mut queue: Vec<(BTreeSet<Q>, Option<(NodeId, bool)>)> =
        vec![(table.states().collect(), None)];

    while let Some((block, slot)) = queue.pop() {
        let parent = slot.map(|(p, _)| p);

        let node = match (block.len() > 1)
            .then(|| best_split(table, &block, &pairs))
            .flatten()
        {
            Some((pair, split)) => {
                debug!(
                    "splitting {} by {pair} into {} and {}",
                    block.show(),
                    split.positive().show(),
                    split.negative().show()
                );
                let (positive, negative) = split.into_parts();
                let id = tree.add_inner(parent, block.clone(), pair);
                steps.push(Step {
                    block,
                    pair,
                    positive: positive.clone(),
                    negative: negative.clone(),
                });
                queue.push((negative, Some((id, false))));
                queue.push((positive, Some((id, true))));
                id
            }
            None => {
                if block.len() > 1 {
                    debug!("no pair separates the states {}", block.show());
                }
                tree.add_leaf(parent, block)
            }
        };

        match slot {
            Some((p, matching)) => tree.set_successor(&p, matching, node),
            None => tree.set_root(node),
        }
    }

    debug!(
        "discrimination tree has {} inner nodes and {} leaves",
        tree.inner_len(),
        tree.leaf_len()
    );
    WResult { tree, steps }
}

/// Collects for every state of `tree` the labels on the path from the root to its leaf. States that
/// share a leaf get the same list, and a tree that consists of a single leaf assigns the empty list
/// to all of its states.
pub fn extract_sequences<Q: StateId>(tree: &DiscriminationTree<Q>) -> BTreeMap<Q, Vec<Label>> {
    let mut sequences = BTreeMap::new();
    let mut stack = vec![(tree.root(), Vec::new())];

    while let Some((node, labels)) = stack.pop() {
        let (Some(pair), Some([positive, negative])) =
            (tree.try_discriminator(&node), tree.try_successors(&node))
        else {
            for q in tree.states(&node) {
                sequences.insert(*q, labels.clone());
            }
            continue;
        };

        let mut matching = labels.clone();
        matching.push(Label::matching(pair));
        let mut not_matching = labels;
        not_matching.push(Label::not_matching(pair));

        stack.push((*negative, not_matching));
        stack.push((*positive, matching));
    }

    sequences
}
