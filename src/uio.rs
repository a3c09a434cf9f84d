use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, info, trace};

use crate::{
    math::Set,
    replay::{detailed_steps, replay, used_transitions},
    table::{MealyTable, TransitionDetail},
    Show, StateId,
};

mod candidates;
pub use candidates::Candidates;

/// A transition identified by its source state and input symbol.
pub type UsedTransition<Q> = (Q, char);

/// Sequences of more than this many symbols are not explored unless configured otherwise.
pub const DEFAULT_MAX_LENGTH: usize = 3;

/// Configuration of the search for unique input/output sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UioConfig {
    /// The maximal number of input symbols of a sequence.
    pub max_length: usize,
}

impl Default for UioConfig {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl UioConfig {
    /// Sets the maximal length of sequences that are explored.
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

/// An input word together with the output it produces from some origin state and the transitions
/// that are exercised along the way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence<Q: StateId = u32> {
    input: String,
    output: String,
    used: BTreeSet<UsedTransition<Q>>,
}

impl<Q: StateId> Sequence<Q> {
    pub(crate) fn from_parts(input: String, output: String, used: BTreeSet<UsedTransition<Q>>) -> Self {
        Self {
            input,
            output,
            used,
        }
    }

    /// The input word.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The output that the input word produces from the origin state.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The pairs of state and input symbol that are exercised.
    pub fn used_transitions(&self) -> &BTreeSet<UsedTransition<Q>> {
        &self.used
    }

    /// The number of input symbols.
    pub fn len(&self) -> usize {
        self.input.chars().count()
    }

    /// Returns true if the input word is empty, which never happens for sequences produced by the
    /// search.
    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Returns true if `self` exercises none of the given transitions.
    pub fn is_disjoint_from(&self, transitions: &Set<UsedTransition<Q>>) -> bool {
        !self.used.iter().any(|t| transitions.contains(t))
    }
}

impl<Q: StateId> Show for Sequence<Q> {
    fn show(&self) -> String {
        format!("input='{}', output='{}'", self.input, self.output)
    }
}

/// Returns true if no state other than `state` produces `output` when `input` is replayed from it.
/// States that cannot process `input` at all do not produce `output`.
pub fn is_unique_for<Q: StateId>(table: &MealyTable<Q>, state: Q, input: &str, output: &str) -> bool {
    table
        .states()
        .filter(|q| *q != state)
        .all(|q| replay(table, q, input).map_or(true, |produced| produced != output))
}

/// Reasons why an [`Assignment`] does not satisfy the guarantees of the search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentViolation<Q: StateId = u32> {
    /// The sequence of a state cannot be replayed from it.
    #[error("sequence {input} cannot be replayed from state {}", .state.show())]
    NotReplayable {
        /// The state whose sequence is broken.
        state: Q,
        /// Its input word.
        input: String,
    },
    /// The sequence of a state produces a different output than the one recorded.
    #[error("sequence {input} of state {} produces {actual} instead of {expected}", .state.show())]
    WrongOutput {
        /// The state whose sequence is broken.
        state: Q,
        /// Its input word.
        input: String,
        /// The recorded output.
        expected: String,
        /// The output that is actually produced.
        actual: String,
    },
    /// Another state produces the same output on the sequence of a state.
    #[error("state {} produces the same output as state {} on {input}", .other.show(), .state.show())]
    NotUnique {
        /// The state whose sequence is not unique.
        state: Q,
        /// The state that produces the same output.
        other: Q,
        /// The input word.
        input: String,
    },
    /// A transition is exercised by the sequences of two states.
    #[error("transition ({}, {input}) is used by states {} and {}", .from.show(), .first.show(), .second.show())]
    Reused {
        /// Source state of the transition.
        from: Q,
        /// Input symbol of the transition.
        input: char,
        /// The state whose sequence used the transition first.
        first: Q,
        /// The state whose sequence used the transition again.
        second: Q,
    },
}

/// The result of a search for unique input/output sequences. Every state of the table either has
/// exactly one identifying [`Sequence`] or it is unresolved, meaning that no sequence could be found
/// within the length bound and with the transitions that were still available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<Q: StateId = u32> {
    sequences: BTreeMap<Q, Sequence<Q>>,
    unresolved: BTreeSet<Q>,
    used: BTreeSet<UsedTransition<Q>>,
    max_length: usize,
}

impl<Q: StateId> Assignment<Q> {
    /// Returns the sequence that is assigned to `state`.
    pub fn get(&self, state: &Q) -> Option<&Sequence<Q>> {
        self.sequences.get(state)
    }

    /// Iterates over the assigned states and their sequences, in ascending order of states.
    pub fn iter(&self) -> impl Iterator<Item = (&Q, &Sequence<Q>)> + '_ {
        self.sequences.iter()
    }

    /// The number of states that have a sequence.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Returns true if no state has a sequence.
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// The states for which no sequence was found.
    pub fn unresolved(&self) -> &BTreeSet<Q> {
        &self.unresolved
    }

    /// All transitions that are exercised by some assigned sequence.
    pub fn used_transitions(&self) -> &BTreeSet<UsedTransition<Q>> {
        &self.used
    }

    /// The length bound that was used during the search.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Re-derives the transitions that are taken by the sequence of `state`.
    pub fn detailed_steps(&self, table: &MealyTable<Q>, state: Q) -> Option<Vec<TransitionDetail<Q>>> {
        let sequence = self.get(&state)?;
        detailed_steps(table, state, sequence.input()).ok()
    }

    /// Replays every sequence from its state, in ascending order of states, and collects the
    /// transitions that are exercised by more than one of them. For assignments that are produced by
    /// the search, this is always empty.
    pub fn reused_transitions(&self, table: &MealyTable<Q>) -> BTreeSet<UsedTransition<Q>> {
        let mut seen = BTreeSet::new();
        let mut reused = BTreeSet::new();
        for (state, sequence) in self.iter() {
            let Ok(used) = used_transitions(table, *state, sequence.input()) else {
                continue;
            };
            reused.extend(used.iter().filter(|t| seen.contains(*t)).copied());
            seen.extend(used);
        }
        reused
    }

    /// Checks that every sequence produces its recorded output, that no other state produces the
    /// same output and that no transition is exercised by the sequences of two different states.
    pub fn verify(&self, table: &MealyTable<Q>) -> Result<(), AssignmentViolation<Q>> {
        let mut owners: BTreeMap<UsedTransition<Q>, Q> = BTreeMap::new();
        for (&state, sequence) in self.iter() {
            let input = sequence.input().to_string();
            let actual = replay(table, state, sequence.input()).map_err(|_| {
                AssignmentViolation::NotReplayable {
                    state,
                    input: input.clone(),
                }
            })?;
            if actual != sequence.output() {
                return Err(AssignmentViolation::WrongOutput {
                    state,
                    input,
                    expected: sequence.output().to_string(),
                    actual,
                });
            }
            if let Some(other) = table
                .states()
                .filter(|q| *q != state)
                .find(|q| replay(table, *q, sequence.input()).is_ok_and(|o| o == actual))
            {
                return Err(AssignmentViolation::NotUnique {
                    state,
                    other,
                    input,
                });
            }
            for &(from, symbol) in sequence.used_transitions() {
                if let Some(&first) = owners.get(&(from, symbol)) {
                    return Err(AssignmentViolation::Reused {
                        from,
                        input: symbol,
                        first,
                        second: state,
                    });
                }
                owners.insert((from, symbol), state);
            }
        }
        Ok(())
    }
}

impl<'a, Q: StateId> IntoIterator for &'a Assignment<Q> {
    type Item = (&'a Q, &'a Sequence<Q>);
    type IntoIter = std::collections::btree_map::Iter<'a, Q, Sequence<Q>>;

    fn into_iter(self) -> Self::IntoIter {
        self.sequences.iter()
    }
}

/// Picks the shortest candidate of `state` that is unique and does not exercise a forbidden
/// transition. Among candidates of the same length, the one that is enumerated first wins.
fn select<Q: StateId>(
    table: &MealyTable<Q>,
    state: Q,
    forbidden: &Set<UsedTransition<Q>>,
    max_length: usize,
) -> Option<Sequence<Q>> {
    let mut best: Option<Sequence<Q>> = None;
    for candidate in Candidates::new(table, state, forbidden, max_length) {
        if !is_unique_for(table, state, candidate.input(), candidate.output()) {
            trace!(
                "{} of state {} is not unique",
                candidate.input(),
                state.show()
            );
            continue;
        }
        if !candidate.is_disjoint_from(forbidden) {
            trace!(
                "{} of state {} uses a transition that is already taken",
                candidate.input(),
                state.show()
            );
            continue;
        }
        if best.as_ref().map_or(true, |b| candidate.len() < b.len()) {
            best = Some(candidate);
        }
    }
    best
}

/// Searches a unique input/output sequence for every state of `table`, exploring sequences of at
/// most [`DEFAULT_MAX_LENGTH`] symbols. See [`find_identifying_sequences_with`].
pub fn find_identifying_sequences<Q: StateId>(table: &MealyTable<Q>) -> Assignment<Q> {
    find_identifying_sequences_with(table, &UioConfig::default())
}

/// Searches a unique input/output sequence for every state of `table`.
///
/// The search proceeds in rounds for increasing lengths `1..=config.max_length`. In each round, the
/// states that have no sequence yet are visited in ascending order and each of them is assigned the
/// shortest of its candidates (see [`Candidates`]) which
/// - produces an output that no other state produces on the same input (see [`is_unique_for`]) and
/// - exercises no transition that is already exercised by the sequence of another state.
///
/// The transitions of an assigned sequence are reserved immediately, so states that are visited
/// later cannot use them. States that did not receive a sequence after the last round are reported
/// as [`Assignment::unresolved`].
pub fn find_identifying_sequences_with<Q: StateId>(
    table: &MealyTable<Q>,
    config: &UioConfig,
) -> Assignment<Q> {
    let mut sequences: BTreeMap<Q, Sequence<Q>> = BTreeMap::new();
    let mut forbidden: Set<UsedTransition<Q>> = Set::default();

    for length in 1..=config.max_length {
        debug!(
            "searching sequences of length at most {length}, {} states remaining",
            table.size() - sequences.len()
        );
        for state in table.states() {
            if sequences.contains_key(&state) {
                continue;
            }
            let Some(sequence) = select(table, state, &forbidden, length) else {
                continue;
            };
            debug!("assigning {} to state {}", sequence.show(), state.show());
            forbidden.extend(sequence.used_transitions().iter().copied());
            sequences.insert(state, sequence);
        }
        if sequences.len() == table.size() {
            break;
        }
    }

    let unresolved: BTreeSet<Q> = table
        .states()
        .filter(|q| !sequences.contains_key(q))
        .collect();
    info!(
        "found sequences for {} of {} states, unresolved: {}",
        sequences.len(),
        table.size(),
        unresolved.iter().map(|q| q.show()).join(", ")
    );

    Assignment {
        sequences,
        unresolved,
        used: forbidden.into_iter().collect(),
        max_length: config.max_length,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::{prelude::*, tests::*};

    fn pairs(assignment: &Assignment) -> Vec<(u32, &str, &str)> {
        assignment
            .iter()
            .map(|(q, s)| (*q, s.input(), s.output()))
            .collect()
    }

    #[test_log::test]
    fn reference_machine_sequences() {
        let table = reference_machine();
        let assignment = find_identifying_sequences(&table);

        assert_eq!(
            pairs(&assignment),
            vec![
                (2, "b", "t"),
                (3, "aa", "xx"),
                (4, "a", "y"),
                (5, "ab", "zx")
            ]
        );
        assert_eq!(assignment.unresolved(), &BTreeSet::from([1]));
        assert_eq!(
            assignment.get(&3).unwrap().used_transitions(),
            &BTreeSet::from([(2, 'a'), (3, 'a')])
        );
        assert_eq!(assignment.used_transitions().len(), 6);
        assert!(assignment.verify(&table).is_ok());
        assert!(assignment.reused_transitions(&table).is_empty());
    }

    #[test]
    fn unique_output_on_single_symbol() {
        let table: MealyTable = TableBuilder::default()
            .with_transitions([(1, 'a', 'x', 2), (2, 'a', 'y', 1)])
            .build()
            .unwrap();
        let assignment = find_identifying_sequences(&table);
        let sequence = assignment.get(&1).unwrap();
        assert_eq!((sequence.input(), sequence.output()), ("a", "x"));
        assert_eq!(sequence.used_transitions(), &BTreeSet::from([(1, 'a')]));
    }

    #[test]
    fn missing_transitions_are_no_collisions() {
        let table = sparse_machine();
        assert!(is_unique_for(&table, 1, "a", "z"));
        assert!(is_unique_for(&table, 2, "c", "x"));
        assert!(!is_unique_for(&table, 4, "b", "t"));

        let assignment = find_identifying_sequences(&table);
        assert_eq!(
            pairs(&assignment),
            vec![(1, "a", "z"), (2, "c", "x"), (3, "a", "x"), (4, "bb", "tt")]
        );
        assert!(assignment.unresolved().is_empty());
    }

    #[test]
    fn length_bound_is_respected() {
        let table = reference_machine();

        let short = find_identifying_sequences_with(&table, &UioConfig::default().with_max_length(1));
        assert_eq!(pairs(&short), vec![(2, "b", "t"), (4, "a", "y")]);
        assert_eq!(short.unresolved(), &BTreeSet::from([1, 3, 5]));
        assert_eq!(short.max_length(), 1);

        let none = find_identifying_sequences_with(&table, &UioConfig::default().with_max_length(0));
        assert!(none.is_empty());
        assert_eq!(none.unresolved().len(), 5);
    }

    #[test]
    fn indistinguishable_states_stay_unresolved() {
        let table = twin_machine();
        let assignment = find_identifying_sequences(&table);
        assert!(assignment.is_empty());
        assert_eq!(assignment.unresolved(), &BTreeSet::from([0, 1]));
    }

    #[test]
    fn trivial_tables() {
        let empty: MealyTable = MealyTable::new();
        let assignment = find_identifying_sequences(&empty);
        assert!(assignment.is_empty());
        assert!(assignment.unresolved().is_empty());

        let single: MealyTable = TableBuilder::default()
            .with_transitions([(0, 'a', 'x', 0)])
            .build()
            .unwrap();
        let assignment = find_identifying_sequences(&single);
        assert_eq!(assignment.get(&0).unwrap().input(), "a");
    }

    #[test]
    fn repeated_runs_are_independent() {
        let table = reference_machine();
        let first = find_identifying_sequences(&table);
        let second = find_identifying_sequences(&table);
        assert_eq!(first, second);
    }

    #[test]
    fn detailed_steps_of_assigned_sequences() {
        let table = reference_machine();
        let assignment = find_identifying_sequences(&table);
        let steps = assignment.detailed_steps(&table, 5).unwrap();
        assert_eq!(
            steps.iter().map(|t| (t.source, t.input, t.target)).collect::<Vec<_>>(),
            vec![(5, 'a', 3), (3, 'b', 1)]
        );
        assert!(assignment.detailed_steps(&table, 1).is_none());
    }

    #[test]
    fn verification_detects_violations() {
        let table = reference_machine();
        let forged = Assignment {
            sequences: [
                (2, Sequence::from_parts("a".into(), "x".into(), BTreeSet::from([(2, 'a')]))),
                (3, Sequence::from_parts("aa".into(), "xx".into(), BTreeSet::from([(3, 'a'), (2, 'a')]))),
            ]
            .into_iter()
            .collect(),
            unresolved: BTreeSet::new(),
            used: BTreeSet::new(),
            max_length: 3,
        };
        assert_eq!(
            forged.verify(&table),
            Err(AssignmentViolation::NotUnique {
                state: 2,
                other: 3,
                input: "a".into()
            })
        );
        assert_eq!(forged.reused_transitions(&table), BTreeSet::from([(2, 'a')]));
    }

    #[cfg(feature = "random")]
    #[test]
    fn random_tables_satisfy_invariants() {
        for seed in 0..32 {
            let table = crate::random::random_table(6, 3, 3, 0.8, seed).unwrap();
            let assignment = find_identifying_sequences(&table);
            assert!(assignment.verify(&table).is_ok(), "seed {seed}");
            assert_eq!(
                assignment.len() + assignment.unresolved().len(),
                table.size()
            );
            for (q, sequence) in &assignment {
                assert!(sequence.len() <= 3);
                assert_eq!(
                    used_transitions(&table, *q, sequence.input()).as_ref(),
                    Ok(sequence.used_transitions())
                );
            }
            assert_shortest_first(&table, &assignment);
        }
    }

    /// Replays the assignments in the order in which the search makes them, which is by length and
    /// then by state, and checks that every state got the first of its shortest qualifying candidates
    /// given the transitions that were taken before.
    #[cfg(feature = "random")]
    fn assert_shortest_first(table: &MealyTable, assignment: &Assignment) {
        let qualifies = |q: u32, c: &Sequence| is_unique_for(table, q, c.input(), c.output());

        let mut order: Vec<_> = assignment.iter().map(|(q, s)| (s.len(), *q, s)).collect();
        order.sort_by_key(|(len, q, _)| (*len, *q));

        let mut forbidden = crate::math::Set::default();
        for (len, q, sequence) in order {
            assert!(
                Candidates::new(table, q, &forbidden, len - 1).all(|c| !qualifies(q, &c)),
                "state {q} has a qualifying candidate shorter than {}",
                sequence.input()
            );
            let first = Candidates::new(table, q, &forbidden, len)
                .find(|c| c.len() == len && qualifies(q, c));
            assert_eq!(first.as_ref(), Some(sequence));
            forbidden.extend(sequence.used_transitions().iter().copied());
        }

        for &q in assignment.unresolved() {
            assert!(
                Candidates::new(table, q, &forbidden, assignment.max_length())
                    .all(|c| !qualifies(q, &c)),
                "unresolved state {q} has a qualifying candidate"
            );
        }
    }
}
