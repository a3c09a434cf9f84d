use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use thiserror::Error;
use tracing::trace;

use crate::{wmethod::IoPair, Show, StateId};

mod builder;
pub use builder::TableBuilder;

mod definition;
pub use definition::{StateDefinition, TableDefinition, TransitionDefinition};

/// Errors that can occur while building or loading a [`MealyTable`].
#[derive(Debug, Error)]
pub enum TableError {
    /// A second transition with a different target or output was given for a pair of state and
    /// input symbol that already has a transition.
    #[error("state {state} already has a different transition on input `{input}`")]
    Nondeterministic {
        /// The state, as it is shown.
        state: String,
        /// The input symbol.
        input: char,
    },
    /// A transition was added through [`TableBuilder::on_input`] before any state was selected.
    #[error("transition on input `{input}` was added before selecting a state")]
    NoStateSelected {
        /// The input symbol of the offending transition.
        input: char,
    },
    /// A state in a definition is not identified by an unsigned integer.
    #[error("encountered malformed state identifier `{0}`")]
    MalformedState(String),
    /// An input or output symbol in a definition does not consist of exactly one character.
    #[error("state {state} uses malformed symbol `{symbol}`, symbols must be exactly one character")]
    MalformedSymbol {
        /// The state in whose transitions the symbol occurs.
        state: String,
        /// The offending symbol.
        symbol: String,
    },
    /// A random table was requested with more distinct input or output symbols than there are
    /// lowercase letters.
    #[error("cannot draw {requested} distinct symbols from the 26 lowercase letters")]
    AlphabetTooLarge {
        /// The number of symbols that was asked for.
        requested: usize,
    },
    /// The definition is not valid JSON or does not have the expected shape.
    #[error("could not parse table definition: {0}")]
    Json(#[from] serde_json::Error),
    /// Reading the definition failed.
    #[error("could not read table definition: {0}")]
    Io(#[from] std::io::Error),
}

/// The target and output of a transition, this is what a pair of state and input symbol maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition<Q> {
    target: Q,
    output: char,
}

impl<Q: Copy> Transition<Q> {
    /// Creates a new transition leading to `target` that emits `output`.
    pub fn new(target: Q, output: char) -> Self {
        Self { target, output }
    }

    /// The state that is reached.
    pub fn target(&self) -> Q {
        self.target
    }

    /// The symbol that is emitted.
    pub fn output(&self) -> char {
        self.output
    }
}

/// A fully spelled out transition `source --input/output--> target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionDetail<Q> {
    /// The state in which the transition starts.
    pub source: Q,
    /// The input symbol that triggers the transition.
    pub input: char,
    /// The output symbol that is emitted.
    pub output: char,
    /// The state that is reached.
    pub target: Q,
}

impl<Q: Copy> TransitionDetail<Q> {
    /// Returns the pair of source state and input symbol, which identifies the transition.
    pub fn key(&self) -> (Q, char) {
        (self.source, self.input)
    }

    /// Returns the input/output pair of the transition.
    pub fn io_pair(&self) -> IoPair {
        IoPair::new(self.input, self.output)
    }
}

impl<Q: Show> Show for TransitionDetail<Q> {
    fn show(&self) -> String {
        format!(
            "({}, {}) : {} -> {}, {}/{}",
            self.source.show(),
            self.input,
            self.source.show(),
            self.target.show(),
            self.input,
            self.output
        )
    }
}

/// The transition table of a deterministic Mealy machine. For each state and input symbol there is
/// at most one [`Transition`], the table need not be complete.
///
/// States and symbols are kept in ordered collections, so iterating over states, over the
/// transitions of a state or over the input/output pairs always happens in ascending order. The
/// engines rely on this to break ties in a reproducible way.
///
/// A table is usually created with a [`TableBuilder`] or loaded from a JSON definition, see
/// [`MealyTable::from_json_str`]. Once built it is only ever read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealyTable<Q: StateId = u32> {
    states: BTreeSet<Q>,
    transitions: BTreeMap<Q, BTreeMap<char, Transition<Q>>>,
}

impl<Q: StateId> Default for MealyTable<Q> {
    fn default() -> Self {
        Self {
            states: BTreeSet::new(),
            transitions: BTreeMap::new(),
        }
    }
}

impl<Q: StateId> MealyTable<Q> {
    /// Creates an empty table without states.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a state without transitions, returns false if it was already present.
    pub(crate) fn insert_state(&mut self, state: Q) -> bool {
        self.states.insert(state)
    }

    /// Adds a transition and makes `source` a state. The `target` only becomes a state if it is
    /// declared or has transitions of its own, replaying from an undeclared target is impossible.
    /// Adding the very same transition twice is allowed, adding a different one for an existing pair
    /// of state and input fails.
    pub(crate) fn insert_transition(
        &mut self,
        source: Q,
        input: char,
        output: char,
        target: Q,
    ) -> Result<(), TableError> {
        self.states.insert(source);

        let transition = Transition::new(target, output);
        let outgoing = self.transitions.entry(source).or_default();
        match outgoing.get(&input) {
            Some(existing) if *existing != transition => Err(TableError::Nondeterministic {
                state: source.show(),
                input,
            }),
            Some(_) => Ok(()),
            None => {
                trace!(
                    "adding transition ({}, {input}) -> ({}, {output})",
                    source.show(),
                    target.show()
                );
                outgoing.insert(input, transition);
                Ok(())
            }
        }
    }

    /// Iterates over all states in ascending order.
    pub fn states(&self) -> impl Iterator<Item = Q> + '_ {
        self.states.iter().copied()
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns true if the table has no states at all.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns true if `state` is a state of the table.
    pub fn contains_state(&self, state: Q) -> bool {
        self.states.contains(&state)
    }

    /// Returns the transition that `state` takes on `input`, if there is one.
    pub fn transition(&self, state: Q, input: char) -> Option<Transition<Q>> {
        self.transitions
            .get(&state)
            .and_then(|outgoing| outgoing.get(&input))
            .copied()
    }

    /// Iterates over the outgoing transitions of `state`, ordered by input symbol.
    pub fn transitions_from(&self, state: Q) -> impl Iterator<Item = TransitionDetail<Q>> + '_ {
        self.transitions
            .get(&state)
            .into_iter()
            .flat_map(move |outgoing| {
                outgoing.iter().map(move |(&input, t)| TransitionDetail {
                    source: state,
                    input,
                    output: t.output,
                    target: t.target,
                })
            })
    }

    /// Iterates over all transitions, ordered by source state and then by input symbol.
    pub fn transitions(&self) -> impl Iterator<Item = TransitionDetail<Q>> + '_ {
        self.states().flat_map(move |q| self.transitions_from(q))
    }

    /// The number of transitions.
    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(|outgoing| outgoing.len()).sum()
    }

    /// Returns all input symbols that occur on some transition, in ascending order.
    pub fn inputs(&self) -> BTreeSet<char> {
        self.transitions
            .values()
            .flat_map(|outgoing| outgoing.keys().copied())
            .collect()
    }

    /// Returns all output symbols that occur on some transition, in ascending order.
    pub fn outputs(&self) -> BTreeSet<char> {
        self.transitions
            .values()
            .flat_map(|outgoing| outgoing.values().map(|t| t.output))
            .collect()
    }

    /// Returns every input/output pair that is observed on some transition, ordered by input and
    /// then by output.
    pub fn io_pairs(&self) -> BTreeSet<IoPair> {
        self.transitions().map(|t| t.io_pair()).collect()
    }

    /// Lists the pairs of state and input symbol (taken from [`Self::inputs`]) that have no transition.
    pub fn missing_transitions(&self) -> Vec<(Q, char)> {
        let inputs = self.inputs();
        self.states()
            .cartesian_product(inputs.iter().copied())
            .filter(|(q, a)| self.transition(*q, *a).is_none())
            .collect()
    }

    /// Returns true if every state has a transition for every input symbol of the table.
    pub fn is_complete(&self) -> bool {
        self.missing_transitions().is_empty()
    }

    /// Returns a string representation of the transition table, with one row per state and one
    /// column per input symbol. Cells show `target/output` or `-` if the transition is missing.
    pub fn render(&self) -> String {
        let inputs = self.inputs();
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(inputs.iter().map(|a| a.to_string())),
        );
        for q in self.states() {
            let mut row = vec![q.show()];
            for &a in &inputs {
                match self.transition(q, a) {
                    Some(t) => row.push(format!("{}/{}", t.target.show(), t.output)),
                    None => row.push("-".to_string()),
                }
            }
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::{prelude::*, tests::*};

    #[test]
    fn table_queries() {
        let table = reference_machine();
        assert_eq!(table.size(), 5);
        assert_eq!(table.transition_count(), 8);
        assert_eq!(table.transition(1, 'a'), Some(Transition::new(2, 'z')));
        assert_eq!(table.transition(1, 'b'), None);
        assert_eq!(table.transition(7, 'a'), None);
        assert_eq!(table.inputs().into_iter().collect::<String>(), "ab");
        assert_eq!(table.outputs().into_iter().collect::<String>(), "txyz");
        assert_eq!(table.missing_transitions(), vec![(1, 'b'), (5, 'b')]);
        assert!(!table.is_complete());
        assert!(twin_machine().is_complete());

        let from_two: Vec<_> = table.transitions_from(2).map(|t| (t.input, t.target)).collect();
        assert_eq!(from_two, vec![('a', 4), ('b', 3)]);
    }

    #[test]
    fn io_pairs_are_ordered() {
        let pairs: Vec<_> = reference_machine()
            .io_pairs()
            .into_iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(pairs, vec!["a/x", "a/y", "a/z", "b/t", "b/x"]);
    }

    #[test]
    fn undeclared_targets_are_no_states() {
        let table: MealyTable = TableBuilder::default()
            .with_transitions([(1, 'a', 'x', 2)])
            .build()
            .unwrap();
        assert_eq!(table.size(), 1);
        assert!(table.contains_state(1));
        assert!(!table.contains_state(2));
        assert!(table.is_complete());
        assert_eq!(replay(&table, 1, "a"), Ok("x".to_string()));
        assert!(replay(&table, 1, "aa").is_err());
    }

    #[test]
    fn empty_table() {
        let table: MealyTable = MealyTable::new();
        assert!(table.is_empty());
        assert!(table.io_pairs().is_empty());
        assert!(table.is_complete());
    }

    #[test]
    fn rendered_table_lists_every_state() {
        let rendered = sparse_machine().render();
        assert!(rendered.contains("State"));
        assert!(rendered.contains("2/z"));
        assert!(rendered.contains("1/t"));
        assert_eq!(rendered.lines().filter(|l| l.contains('│')).count(), 5);
    }
}
