//! Library for generating conformance test sequences for deterministic Mealy machines.
//!
//! A Mealy machine is given as a [`MealyTable`], which maps every state and input symbol to at most
//! one transition, consisting of a target state and the output symbol that is emitted when the
//! transition is taken. Missing transitions are allowed and are treated as an observable: a state
//! that cannot process some input behaves differently from a state that can.
//!
//! Two engines compute input words which allow an external tester to tell the states of a machine
//! apart by only observing the outputs:
//! - [`uio`] searches, for every state, a shortest *unique input/output sequence*, i.e. an input word
//!   whose output is produced by no other state. Each transition of the machine may be exercised by the
//!   sequence of at most one state, which keeps the resulting reference tests independent of each other.
//! - [`wmethod`] builds a [`DiscriminationTree`] by repeatedly splitting the set of states with the
//!   input/output pair that gives the most balanced split. Every path from the root to a leaf is a
//!   list of observations that identifies the states in that leaf.
//!
//! Both engines consume a table through [`replay`], which runs a word from some state and either yields
//! the produced output or reports that the word cannot be processed ([`Impossible`]).
//!
//! ```
//! use mealy_conformance::prelude::*;
//!
//! let table = TableBuilder::default()
//!     .with_transitions([(1, 'a', 'x', 2), (2, 'a', 'y', 1), (2, 'b', 'y', 2)])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(replay(&table, 1, "aa"), Ok("xy".to_string()));
//!
//! let assignment = find_identifying_sequences(&table);
//! assert_eq!(assignment.get(&1).map(|s| s.input()), Some("a"));
//!
//! let result = build_discrimination_tree(&table);
//! assert_eq!(result.sequences()[&1].len(), 1);
//! ```
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use mealy_conformance::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        math,
        replay::{check, detailed_steps, replay, replay_all, used_transitions, Impossible, Walk},
        table::{MealyTable, TableBuilder, TableError, Transition, TransitionDetail},
        uio::{
            find_identifying_sequences, find_identifying_sequences_with, is_unique_for,
            Assignment, AssignmentViolation, Candidates, Sequence, UioConfig, UsedTransition,
            DEFAULT_MAX_LENGTH,
        },
        word::FiniteWord,
        wmethod::{
            build_discrimination_tree, extract_sequences, DiscriminationTree, IoPair, Label,
            NodeId, Step, WResult,
        },
        Show, StateId,
    };
}

/// Contains set and map aliases as well as the [`math::Bipartition`] that is used when splitting blocks of states.
pub mod math;

/// Defines finite words over `char` symbols, which is what both engines operate on.
pub mod word;

/// The transition table of a Mealy machine, together with ways to build and load it.
pub mod table;
pub use table::MealyTable;

/// Deterministic execution of input words on a [`MealyTable`].
pub mod replay;
pub use replay::Impossible;

/// Search for unique input/output sequences.
pub mod uio;

/// Construction of discrimination trees following the W-method.
pub mod wmethod;
pub use wmethod::DiscriminationTree;

/// Console presentation of tables and of the results produced by the engines.
pub mod render;

/// Implements the generation of random Mealy tables.
#[cfg(feature = "random")]
pub mod random;

use std::{collections::BTreeSet, fmt::Debug, hash::Hash};

use itertools::Itertools;

/// Identifies a state of a [`MealyTable`]. States carry no information besides their identity, they
/// only need to be totally ordered so that both engines can process them in a fixed order.
pub trait StateId: Copy + Ord + Hash + Debug + Show {}

impl<T: Copy + Ord + Hash + Debug + Show> StateId for T {}

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state that should be
    /// for example 1, 2, 3, ... and for a transition (1, a) it should be (1, a).
    /// This is mainly used for presenting results and for debugging purposes.
    fn show(&self) -> String;

    /// Show a collection of the thing, for a collection of states this should be {1, 2, 3, ...}.
    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!("{{{}}}", iter.into_iter().map(|x| x.show()).join(", "))
    }
}

macro_rules! impl_show_for_integers {
    ($($ty:ty),*) => {
        $(
            impl Show for $ty {
                fn show(&self) -> String {
                    self.to_string()
                }

                fn show_collection<'a, I>(iter: I) -> String
                where
                    Self: 'a,
                    I: IntoIterator<Item = &'a Self>,
                {
                    format!("[{}]", iter.into_iter().map(|x| x.show()).join(", "))
                }
            }
        )*
    };
}

impl_show_for_integers!(u8, u16, u32, u64, usize, i8, i16, i32, i64);

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }

    fn show_collection<'a, I>(iter: I) -> String
    where
        Self: 'a,
        I: IntoIterator<Item = &'a Self>,
    {
        format!("\"{}\"", iter.into_iter().join(""))
    }
}

impl Show for String {
    fn show(&self) -> String {
        self.clone()
    }
}

impl Show for str {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl<S: Show> Show for [S] {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}

impl<S: Show> Show for Vec<S> {
    fn show(&self) -> String {
        S::show_collection(self.iter())
    }
}

impl<S: Show> Show for BTreeSet<S> {
    fn show(&self) -> String {
        format!("{{{}}}", self.iter().map(|x| x.show()).join(", "))
    }
}

impl<S: Show, T: Show> Show for (S, T) {
    fn show(&self) -> String {
        format!("({}, {})", self.0.show(), self.1.show())
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}
