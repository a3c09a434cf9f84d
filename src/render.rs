use std::collections::BTreeMap;

use itertools::Itertools;
use owo_colors::OwoColorize;

use crate::{
    table::MealyTable,
    uio::Assignment,
    wmethod::{DiscriminationTree, Label, Step, WResult},
    Show, StateId,
};

/// Renders the sequences of an [`Assignment`] as a table with one row per assigned state, followed
/// by the states that remained unresolved.
pub fn assignment_table<Q: StateId>(assignment: &Assignment<Q>) -> String {
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(["State", "Input", "Output", "Transitions"]);
    for (q, sequence) in assignment {
        builder.push_record([
            q.show().bold().to_string(),
            sequence.input().to_string(),
            sequence.output().to_string(),
            sequence
                .used_transitions()
                .iter()
                .map(|t| t.show())
                .join(" "),
        ]);
    }

    let mut out = builder
        .build()
        .with(tabled::settings::Style::rounded())
        .to_string();
    if !assignment.unresolved().is_empty() {
        out.push_str(&format!(
            "\nno sequence of length at most {} for {}",
            assignment.max_length(),
            assignment.unresolved().show().yellow()
        ));
    }
    out
}

/// Lists for every assigned state the transitions its sequence takes. Transitions that are taken
/// by the sequences of several states are flagged.
pub fn assignment_steps<Q: StateId>(table: &MealyTable<Q>, assignment: &Assignment<Q>) -> String {
    let reused = assignment.reused_transitions(table);
    let mut lines = vec![];

    for (q, sequence) in assignment {
        lines.push(format!(
            "{} {}/{}",
            q.show().bold(),
            sequence.input(),
            sequence.output()
        ));
        for step in assignment.detailed_steps(table, *q).unwrap_or_default() {
            if reused.contains(&step.key()) {
                lines.push(format!("  {} {}", step.show(), "(reused)".red()));
            } else {
                lines.push(format!("  {}", step.show()));
            }
        }
    }
    lines.join("\n")
}

/// Numbers the splits in the order in which they were made.
pub fn steps<Q: StateId>(steps: &[Step<Q>]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step.show()))
        .join("\n")
}

/// Draws the tree with one node per line, children indented below their parent and each prefixed
/// by the label that leads to it.
pub fn tree<Q: StateId>(tree: &DiscriminationTree<Q>) -> String {
    let mut lines = vec![];
    let mut stack = vec![(tree.root(), 0usize, None::<Label>)];

    while let Some((node, indent, label)) = stack.pop() {
        let prefix = match label {
            Some(label) => format!("{}{label}: ", "  ".repeat(indent)),
            None => String::new(),
        };
        let states = tree.states(&node).show();
        match (tree.try_discriminator(&node), tree.try_successors(&node)) {
            (Some(pair), Some([positive, negative])) => {
                lines.push(format!("{prefix}{states} split by {}", pair.bold()));
                stack.push((*negative, indent + 1, Some(Label::not_matching(pair))));
                stack.push((*positive, indent + 1, Some(Label::matching(pair))));
            }
            _ if tree.states(&node).len() > 1 => {
                lines.push(format!("{prefix}{}", states.yellow()))
            }
            _ => lines.push(format!("{prefix}{}", states.green())),
        }
    }
    lines.join("\n")
}

/// One line per state with the labels on its path, joined by `+`.
pub fn sequences<Q: StateId>(sequences: &BTreeMap<Q, Vec<Label>>) -> String {
    sequences
        .iter()
        .map(|(q, labels)| {
            let path = if labels.is_empty() {
                "-".to_string()
            } else {
                labels.iter().join(" + ")
            };
            format!("{}: {path}", q.show().bold())
        })
        .join("\n")
}

/// Combines [`steps`], [`tree`] and [`sequences`] for a [`WResult`].
pub fn w_result<Q: StateId>(result: &WResult<Q>) -> String {
    let mut parts = vec![];
    if !result.steps.is_empty() {
        parts.push(steps(&result.steps));
    }
    parts.push(tree(&result.tree));
    parts.push(sequences(&result.sequences()));
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use crate::{prelude::*, tests::*};

    #[test]
    fn render_assignment() {
        let table = reference_machine();
        let assignment = find_identifying_sequences(&table);

        let rendered = super::assignment_table(&assignment);
        assert!(rendered.contains("Input"));
        assert!(rendered.contains("zx"));
        assert!(rendered.contains("no sequence of length at most 3"));

        let steps = super::assignment_steps(&table, &assignment);
        assert_eq!(steps.lines().count(), 4 + 6);
        assert!(steps.contains("(5, a) : 5 -> 3, a/z"));
        assert!(!steps.contains("reused"));
    }

    #[test]
    fn render_w_result() {
        let result = build_discrimination_tree(&reference_machine());
        let rendered = super::w_result(&result);

        assert!(rendered.contains("1. split {1, 2, 3, 4, 5} by a/x into {2, 3} and {1, 4, 5}"));
        assert!(rendered.contains("a/x + not b/t"));
        assert!(rendered.contains("not a/x + not a/y"));

        let tree = super::tree(&result.tree);
        assert_eq!(tree.lines().count(), 7);
        assert!(tree.lines().nth(1).unwrap().starts_with("  a/x: "));
        assert!(tree.lines().nth(2).unwrap().starts_with("    b/t: "));
    }

    #[test]
    fn render_trivial_tree() {
        let result = build_discrimination_tree(&twin_machine());
        let rendered = super::w_result(&result);
        assert_eq!(rendered.lines().count(), 1 + 1 + 2);
        assert!(rendered.contains(": -"));
    }
}
