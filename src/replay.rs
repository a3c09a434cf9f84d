use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::trace;

use crate::{
    table::{MealyTable, TransitionDetail},
    word::FiniteWord,
    StateId,
};

/// Signals that a word cannot be processed from some state, because the run reaches a state that has
/// no transition on the next symbol. This is an ordinary outcome and it is different from a word that
/// is processed but produces an empty output (which only happens for the empty word).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("state {} has no transition on input `{input}` (symbol {position} of the word)", .state.show())]
pub struct Impossible<Q: StateId = u32> {
    /// The state in which the run got stuck.
    pub state: Q,
    /// The index of the symbol that could not be processed.
    pub position: usize,
    /// The symbol that could not be processed.
    pub input: char,
}

/// Iterator over the transitions that are taken when a sequence of symbols is processed from some
/// start state. Yields an [`Impossible`] and stops as soon as a symbol cannot be processed.
///
/// [`replay`], [`used_transitions`] and [`detailed_steps`] are all derived from this iterator, so
/// they agree on every prefix of a word.
#[derive(Debug, Clone)]
pub struct Walk<'a, Q: StateId, I> {
    table: &'a MealyTable<Q>,
    current: Q,
    symbols: I,
    position: usize,
    stuck: bool,
}

impl<'a, Q: StateId, I: Iterator<Item = char>> Walk<'a, Q, I> {
    /// Creates a walk through `table` that starts in `start` and processes `symbols`.
    pub fn new<J: IntoIterator<IntoIter = I>>(table: &'a MealyTable<Q>, start: Q, symbols: J) -> Self {
        Self {
            table,
            current: start,
            symbols: symbols.into_iter(),
            position: 0,
            stuck: false,
        }
    }
}

impl<'a, Q: StateId, I: Iterator<Item = char>> Iterator for Walk<'a, Q, I> {
    type Item = Result<TransitionDetail<Q>, Impossible<Q>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stuck {
            return None;
        }
        let input = self.symbols.next()?;
        let position = self.position;
        self.position += 1;

        match self.table.transition(self.current, input) {
            Some(t) => {
                let detail = TransitionDetail {
                    source: self.current,
                    input,
                    output: t.output(),
                    target: t.target(),
                };
                self.current = t.target();
                Some(Ok(detail))
            }
            None => {
                self.stuck = true;
                Some(Err(Impossible {
                    state: self.current,
                    position,
                    input,
                }))
            }
        }
    }
}

impl<Q: StateId> MealyTable<Q> {
    /// Starts a [`Walk`] through `self`, which processes `input` from `start`.
    pub fn walk<W: FiniteWord + ?Sized>(
        &self,
        start: Q,
        input: &W,
    ) -> Walk<'_, Q, std::vec::IntoIter<char>> {
        Walk::new(self, start, input.collect_vec())
    }
}

/// Runs `input` from `start` and returns the produced output, one output symbol per input symbol.
/// If some symbol cannot be processed, the [`Impossible`] that explains where the run got stuck is
/// returned instead. Replaying the empty word always succeeds with the empty output.
///
/// ```
/// use mealy_conformance::prelude::*;
///
/// let table: MealyTable = TableBuilder::default()
///     .with_transitions([(1, 'a', 'z', 2), (2, 'b', 't', 3)])
///     .build()
///     .unwrap();
/// assert_eq!(replay(&table, 1, "ab"), Ok("zt".to_string()));
/// assert_eq!(replay(&table, 1, "b").unwrap_err().state, 1);
/// ```
pub fn replay<Q: StateId, W: FiniteWord>(
    table: &MealyTable<Q>,
    start: Q,
    input: W,
) -> Result<String, Impossible<Q>> {
    Walk::new(table, start, input.symbols())
        .map(|step| step.map(|t| t.output))
        .collect::<Result<String, _>>()
        .map_err(|stuck| {
            trace!("replaying {} from {} is impossible: {stuck}", input.as_string(), start.show());
            stuck
        })
}

/// Collects the pairs of state and input symbol that are exercised when `input` is run from `start`.
pub fn used_transitions<Q: StateId, W: FiniteWord>(
    table: &MealyTable<Q>,
    start: Q,
    input: W,
) -> Result<BTreeSet<(Q, char)>, Impossible<Q>> {
    Walk::new(table, start, input.symbols())
        .map(|step| step.map(|t| t.key()))
        .collect()
}

/// Lists the transitions that are taken when `input` is run from `start`, in the order in which they
/// are taken.
pub fn detailed_steps<Q: StateId, W: FiniteWord>(
    table: &MealyTable<Q>,
    start: Q,
    input: W,
) -> Result<Vec<TransitionDetail<Q>>, Impossible<Q>> {
    Walk::new(table, start, input.symbols()).collect()
}

/// Replays `input` from every state of `table`.
pub fn replay_all<Q: StateId, W: FiniteWord>(
    table: &MealyTable<Q>,
    input: W,
) -> BTreeMap<Q, Result<String, Impossible<Q>>> {
    table
        .states()
        .map(|q| (q, replay(table, q, &input)))
        .collect()
}

/// Returns true if replaying `input` from `start` produces one of the `expected` outputs.
pub fn check<Q, W, I>(table: &MealyTable<Q>, start: Q, input: W, expected: I) -> bool
where
    Q: StateId,
    W: FiniteWord,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    match replay(table, start, input) {
        Ok(output) => expected.into_iter().any(|e| e.as_ref() == output),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::{prelude::*, tests::*};

    #[test]
    fn replay_reference_machine() {
        let table = reference_machine();
        assert_eq!(replay(&table, 1, "ab"), Ok("zt".to_string()));
        // 4 moves to 2 on a/y and 2 emits t on b
        assert_eq!(replay(&table, 4, "ab"), Ok("yt".to_string()));
        assert_eq!(replay(&table, 2, "aa"), Ok("xy".to_string()));
        assert_eq!(replay(&table, 3, "bab"), Ok("xzt".to_string()));
        assert_eq!(replay(&table, 3, ""), Ok(String::new()));
    }

    #[test]
    fn missing_transition_is_impossible() {
        let table = reference_machine();
        assert_eq!(
            replay(&table, 1, "b"),
            Err(Impossible {
                state: 1,
                position: 0,
                input: 'b'
            })
        );
        assert_eq!(
            replay(&table, 4, "bb"),
            Err(Impossible {
                state: 5,
                position: 1,
                input: 'b'
            })
        );
        // unknown states cannot process anything, but the empty word
        assert!(replay(&table, 42, "a").is_err());
        assert_eq!(replay(&table, 42, ""), Ok(String::new()));
    }

    #[test]
    fn replay_is_deterministic() {
        let table = reference_machine();
        for q in table.states() {
            for word in ["a", "b", "ab", "ba", "aab", "bab", "abba"] {
                assert_eq!(replay(&table, q, word), replay(&table, q, word));
            }
        }
    }

    #[test]
    fn sibling_walks_agree() {
        let table = reference_machine();
        let steps = detailed_steps(&table, 4, "bab").unwrap();
        assert_eq!(
            steps,
            vec![
                TransitionDetail {
                    source: 4,
                    input: 'b',
                    output: 'x',
                    target: 5
                },
                TransitionDetail {
                    source: 5,
                    input: 'a',
                    output: 'z',
                    target: 3
                },
                TransitionDetail {
                    source: 3,
                    input: 'b',
                    output: 'x',
                    target: 1
                },
            ]
        );
        let output: String = steps.iter().map(|t| t.output).collect();
        assert_eq!(replay(&table, 4, "bab"), Ok(output));
        assert_eq!(
            used_transitions(&table, 4, "bab").unwrap(),
            steps.iter().map(|t| t.key()).collect()
        );

        assert_eq!(
            used_transitions(&table, 1, "ab").unwrap(),
            [(1, 'a'), (2, 'b')].into_iter().collect()
        );
        assert!(detailed_steps(&table, 1, "bb").is_err());
        assert!(used_transitions(&table, 4, "bb").is_err());
    }

    #[test]
    fn walk_stops_when_stuck() {
        let table = reference_machine();
        let mut walk = table.walk(5, "abb");
        assert!(matches!(walk.next(), Some(Ok(_))));
        assert!(matches!(walk.next(), Some(Ok(TransitionDetail { target: 1, .. }))));
        assert!(matches!(walk.next(), Some(Err(Impossible { state: 1, .. }))));
        assert_eq!(walk.next(), None);
    }

    #[test]
    fn replay_from_every_state() {
        let table = reference_machine();
        let outputs = replay_all(&table, "a");
        assert_eq!(outputs.len(), 5);
        assert_eq!(outputs[&4], Ok("y".to_string()));
        assert_eq!(outputs[&5], Ok("z".to_string()));

        assert!(check(&table, 1, "ab", ["zt", "zx"]));
        assert!(check(&table, 2, "aa", ["xx", "xy"]));
        assert!(!check(&table, 3, "bab", ["xzx"]));
        assert!(!check(&table, 1, "b", [""]));
    }
}
