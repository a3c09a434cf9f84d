use std::collections::BTreeSet;

use crate::{math::Set, table::MealyTable, StateId};

use super::Sequence;

#[derive(Debug, Clone)]
struct Frame<Q> {
    state: Q,
    depth: usize,
    input: String,
    output: String,
    used: BTreeSet<(Q, char)>,
}

/// Lazily enumerates the candidate sequences of a state, which are all non-empty words of length at
/// most `max_length` that can be processed from the state without taking a forbidden transition.
///
/// The enumeration is a depth-first walk that tries the outgoing transitions of every state in the
/// order of their input symbols. A word is produced before any of its extensions, so for the
/// transitions `a` and `b` leading back to the start the order is `a`, `aa`, `ab`, `b`, `ba`, `bb`.
/// Instead of recursing, pending branches are kept on an explicit stack whose height is bounded by
/// `max_length` times the number of input symbols.
#[derive(Debug, Clone)]
pub struct Candidates<'a, Q: StateId> {
    table: &'a MealyTable<Q>,
    forbidden: &'a Set<(Q, char)>,
    max_length: usize,
    stack: Vec<Frame<Q>>,
}

impl<'a, Q: StateId> Candidates<'a, Q> {
    /// Starts the enumeration of the candidates of `state`, which never take one of the `forbidden`
    /// transitions and have at most `max_length` symbols.
    pub fn new(
        table: &'a MealyTable<Q>,
        state: Q,
        forbidden: &'a Set<(Q, char)>,
        max_length: usize,
    ) -> Self {
        Self {
            table,
            forbidden,
            max_length,
            stack: vec![Frame {
                state,
                depth: 0,
                input: String::new(),
                output: String::new(),
                used: BTreeSet::new(),
            }],
        }
    }

    fn expand(&mut self, frame: &Frame<Q>) {
        let start = self.stack.len();
        for t in self.table.transitions_from(frame.state) {
            if self.forbidden.contains(&t.key()) {
                continue;
            }
            let mut child = Frame {
                state: t.target,
                depth: frame.depth + 1,
                input: frame.input.clone(),
                output: frame.output.clone(),
                used: frame.used.clone(),
            };
            child.input.push(t.input);
            child.output.push(t.output);
            child.used.insert(t.key());
            self.stack.push(child);
        }
        // the smallest symbol has to be on top
        self.stack[start..].reverse();
    }
}

impl<'a, Q: StateId> Iterator for Candidates<'a, Q> {
    type Item = Sequence<Q>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.pop()?;
            if frame.depth < self.max_length {
                self.expand(&frame);
            }
            if frame.depth > 0 {
                return Some(Sequence::from_parts(frame.input, frame.output, frame.used));
            }
        }
    }
}
