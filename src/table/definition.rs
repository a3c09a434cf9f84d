use std::{
    collections::{BTreeMap, BTreeSet},
    io::Read,
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{MealyTable, TableError};

/// Serializable description of a [`MealyTable`] with integer states. In JSON, it looks like
/// ```json
/// {
///   "states": {
///     "1": { "transitions": { "a": { "toState": 2, "output": "z" } } },
///     "2": { "transitions": {} }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Maps each state identifier to the definition of its outgoing transitions.
    pub states: BTreeMap<String, StateDefinition>,
}

/// The outgoing transitions of one state, indexed by input symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    /// Maps each input symbol to the transition it triggers.
    #[serde(default)]
    pub transitions: BTreeMap<String, TransitionDefinition>,
}

/// A single transition of a [`StateDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDefinition {
    /// The state that is reached.
    #[serde(rename = "toState")]
    pub to_state: u32,
    /// The emitted symbol.
    pub output: String,
}

fn single_symbol(state: &str, symbol: &str) -> Result<char, TableError> {
    let mut chars = symbol.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(TableError::MalformedSymbol {
            state: state.to_string(),
            symbol: symbol.to_string(),
        }),
    }
}

impl TryFrom<TableDefinition> for MealyTable<u32> {
    type Error = TableError;

    fn try_from(definition: TableDefinition) -> Result<Self, Self::Error> {
        let mut table = MealyTable::new();

        for (key, state) in &definition.states {
            let source: u32 = key
                .trim()
                .parse()
                .map_err(|_| TableError::MalformedState(key.clone()))?;
            table.insert_state(source);

            for (input, transition) in &state.transitions {
                let input = single_symbol(key, input)?;
                let output = single_symbol(key, &transition.output)?;
                table.insert_transition(source, input, output, transition.to_state)?;
            }
        }

        let undeclared: BTreeSet<u32> = table
            .transitions()
            .map(|t| t.target)
            .filter(|q| !table.contains_state(*q))
            .collect();
        for q in undeclared {
            warn!("state {q} is only reached by transitions and has no definition of its own");
        }
        debug!(
            "loaded table with {} states and {} transitions",
            table.size(),
            table.transition_count()
        );

        Ok(table)
    }
}

impl From<&MealyTable<u32>> for TableDefinition {
    fn from(table: &MealyTable<u32>) -> Self {
        let states = table
            .states()
            .map(|q| {
                let transitions = table
                    .transitions_from(q)
                    .map(|t| {
                        (
                            t.input.to_string(),
                            TransitionDefinition {
                                to_state: t.target,
                                output: t.output.to_string(),
                            },
                        )
                    })
                    .collect();
                (q.to_string(), StateDefinition { transitions })
            })
            .collect();
        Self { states }
    }
}

impl MealyTable<u32> {
    /// Parses a table from its JSON definition, see [`TableDefinition`] for the format.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let definition: TableDefinition = serde_json::from_str(json)?;
        definition.try_into()
    }

    /// Reads and parses a JSON definition from `reader`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let definition: TableDefinition = serde_json::from_reader(reader)?;
        definition.try_into()
    }

    /// Reads and parses the JSON definition that is stored in the file at `path`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let file = std::fs::File::open(path)?;
        Self::from_json_reader(std::io::BufReader::new(file))
    }

    /// Produces the JSON definition of `self`, which can be parsed by [`Self::from_json_str`].
    pub fn to_json_string(&self) -> Result<String, TableError> {
        Ok(serde_json::to_string_pretty(&TableDefinition::from(self))?)
    }
}
