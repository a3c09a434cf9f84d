use tracing::debug;

use crate::table::{MealyTable, TableError};

const LETTERS: usize = 26;

/// The `n`-th lowercase letter after `base`, continuing with `a` after `z`.
fn nth_symbol(base: char, n: usize) -> char {
    let offset = (base as u32 - 'a' as u32 + (n % LETTERS) as u32) % LETTERS as u32;
    char::from_u32('a' as u32 + offset).unwrap_or(base)
}

/// Generates a random table with the states `0..states`. Inputs are the first `symbols` letters
/// starting at `a` and outputs are `outputs` letters starting at `x`, continuing with `a` after `z`.
/// For every state and input a transition exists with probability `density`, its target and output
/// are drawn uniformly. The same `seed` always produces the same table.
///
/// Both alphabets consist of distinct lowercase letters, asking for more than 26 symbols of either
/// kind gives [`TableError::AlphabetTooLarge`].
///
/// The algorithm is as follows:
/// 1. Add all states.
/// 2. For each state and each input, draw whether a transition exists.
/// 3. If it does, draw the target state and the output symbol and add the transition.
pub fn random_table(
    states: usize,
    symbols: usize,
    outputs: usize,
    density: f64,
    seed: u64,
) -> Result<MealyTable<u32>, TableError> {
    if let Some(requested) = [symbols, outputs].into_iter().find(|n| *n > LETTERS) {
        return Err(TableError::AlphabetTooLarge { requested });
    }

    let mut rng = fastrand::Rng::with_seed(seed);
    let mut table = MealyTable::new();
    let size = states as u32;

    for q in 0..size {
        table.insert_state(q);
    }
    if outputs == 0 {
        return Ok(table);
    }

    for q in 0..size {
        for i in 0..symbols {
            if rng.f64() >= density {
                continue;
            }
            let target = rng.u32(..size);
            let output = nth_symbol('x', rng.usize(..outputs));
            table.insert_transition(q, nth_symbol('a', i), output, target)?;
        }
    }

    debug!(
        "generated random table with {} states and {} transitions from seed {seed}",
        table.size(),
        table.transition_count()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::random_table;
    use crate::table::TableError;

    #[test]
    fn random_tables_are_reproducible() {
        let table = random_table(5, 2, 3, 0.5, 17).unwrap();
        assert_eq!(table, random_table(5, 2, 3, 0.5, 17).unwrap());
        assert_eq!(table.size(), 5);
        assert!(table.inputs().iter().all(|c| ['a', 'b'].contains(c)));
        assert!(table.outputs().iter().all(|c| ['x', 'y', 'z'].contains(c)));

        assert_eq!(random_table(4, 3, 2, 1.0, 3).unwrap().transition_count(), 12);
        assert_eq!(random_table(4, 3, 2, 0.0, 3).unwrap().transition_count(), 0);
        assert!(random_table(0, 3, 2, 1.0, 3).unwrap().is_empty());
    }

    #[test]
    fn full_alphabet_keeps_every_transition() {
        let table = random_table(3, 26, 3, 1.0, 1).unwrap();
        assert_eq!(table.transition_count(), 3 * 26);
        assert_eq!(table.inputs().len(), 26);

        assert!(matches!(
            random_table(3, 27, 3, 1.0, 1),
            Err(TableError::AlphabetTooLarge { requested: 27 })
        ));
        assert!(matches!(
            random_table(3, 2, 30, 1.0, 1),
            Err(TableError::AlphabetTooLarge { requested: 30 })
        ));
    }

    #[test]
    fn outputs_wrap_around() {
        let table = random_table(3, 1, 5, 1.0, 8).unwrap();
        assert!(table
            .outputs()
            .iter()
            .all(|c| ['x', 'y', 'z', 'a', 'b'].contains(c)));
        assert_eq!(super::nth_symbol('x', 3), 'a');
        assert_eq!(super::nth_symbol('a', 1), 'b');
    }
}
