use crate::StateId;

use super::{MealyTable, TableError};

/// Helper struct for the construction of a [`MealyTable`]. Transitions can be given as tuples
/// `(source, input, output, target)` or in a chained style, where a state is selected through
/// [`TableBuilder::state`] and its transitions are added with [`TableBuilder::on_input`].
///
/// Nothing is checked before [`TableBuilder::build`] is called, which fails if two different
/// transitions are given for the same pair of state and input symbol.
///
/// # Example
///
/// We want to create a Mealy machine with two states 0 and 1, where input `a` toggles between the
/// states and emits the state that is left, while `b` loops and emits `-`.
/// ```
/// use mealy_conformance::prelude::*;
///
/// let tuples: MealyTable = TableBuilder::default()
///     .with_transitions([(0, 'a', '0', 1), (0, 'b', '-', 0), (1, 'a', '1', 0), (1, 'b', '-', 1)])
///     .build()
///     .unwrap();
///
/// let chained: MealyTable = TableBuilder::default()
///     .state(0)
///     .on_input('a', 1, '0')
///     .on_input('b', 0, '-')
///     .state(1)
///     .on_input('a', 0, '1')
///     .on_input('b', 1, '-')
///     .build()
///     .unwrap();
///
/// assert_eq!(tuples, chained);
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder<Q = u32> {
    states: Vec<Q>,
    edges: Vec<(Option<Q>, char, char, Q)>,
    current: Option<Q>,
}

impl<Q> Default for TableBuilder<Q> {
    fn default() -> Self {
        Self {
            states: vec![],
            edges: vec![],
            current: None,
        }
    }
}

impl<Q: StateId> TableBuilder<Q> {
    /// Selects `state` as the source of all transitions that are subsequently added through
    /// [`Self::on_input`]. The state is created even if it never receives a transition.
    pub fn state(mut self, state: Q) -> Self {
        self.states.push(state);
        self.current = Some(state);
        self
    }

    /// Adds a transition from the currently selected state, which on `input` leads to `target`
    /// and emits `output`.
    pub fn on_input(mut self, input: char, target: Q, output: char) -> Self {
        self.edges.push((self.current, input, output, target));
        self
    }

    /// Adds states that may not have any transitions.
    pub fn with_states<I: IntoIterator<Item = Q>>(mut self, states: I) -> Self {
        self.states.extend(states);
        self
    }

    /// Adds a list of transitions given as `(source, input, output, target)`. The transitions are
    /// added in the order in which they are given.
    pub fn with_transitions<I>(mut self, transitions: I) -> Self
    where
        I: IntoIterator<Item = (Q, char, char, Q)>,
    {
        self.edges.extend(
            transitions
                .into_iter()
                .map(|(source, input, output, target)| (Some(source), input, output, target)),
        );
        self
    }

    /// Consumes `self` and builds the table.
    pub fn build(self) -> Result<MealyTable<Q>, TableError> {
        let mut table = MealyTable::new();
        for state in self.states {
            table.insert_state(state);
        }
        for (source, input, output, target) in self.edges {
            let source = source.ok_or(TableError::NoStateSelected { input })?;
            table.insert_transition(source, input, output, target)?;
        }
        Ok(table)
    }
}
