//! DOT-format rendering of the automaton graph.
//!
//! Each reachable state becomes a node named by its arena index; per pair of
//! states, one edge carries the compact range list of every symbol on which
//! the transition exists. The accept state is drawn as a double circle.

use std::fmt;

use super::{
    Nfa, StateId,
    sparse_set::SparseSet,
    state::{EPSILON, NSYMBOLS},
};

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph NFA {{")?;
        writeln!(f, "graph[size=\"7.75,10.25\"]")?;
        if let Some(accept) = self.accept() {
            writeln!(f, "  s{} [shape=doublecircle]", accept.as_usize())?;
        }

        let mut visited = SparseSet::new(self.state_count());
        let mut stack = vec![self.start()];
        visited.insert(self.start());
        while let Some(id) = stack.pop() {
            // Group this state's transitions by target, symbols ascending,
            // targets in first-appearance order.
            let mut targets: Vec<(StateId, Vec<usize>)> = Vec::new();
            for sym in 0..=NSYMBOLS {
                for &target in self.transitions(id, sym) {
                    match targets.iter_mut().find(|(seen, _)| *seen == target) {
                        Some((_, syms)) => syms.push(sym),
                        None => targets.push((target, vec![sym])),
                    }
                    if visited.insert(target) {
                        stack.push(target);
                    }
                }
            }
            for (target, syms) in &targets {
                write!(f, "  s{} -> s{} [label=\"", id.as_usize(), target.as_usize())?;
                write_ranges(f, syms)?;
                writeln!(f, "\"]")?;
            }
        }
        writeln!(f, "}}")
    }
}

/// Write a sorted symbol list as comma-separated maximal ranges.
///
/// The epsilon index renders as `e`, both alone and as the upper end of a
/// range (`250-e`).
fn write_ranges<W: fmt::Write>(out: &mut W, symbols: &[usize]) -> fmt::Result {
    let mut run_start = symbols[0];
    let mut previous = run_start;
    for &sym in &symbols[1..] {
        if sym != previous + 1 {
            write_run(out, run_start, previous)?;
            out.write_str(", ")?;
            run_start = sym;
        }
        previous = sym;
    }
    write_run(out, run_start, previous)
}

fn write_run<W: fmt::Write>(out: &mut W, start: usize, end: usize) -> fmt::Result {
    if start == end {
        if end == EPSILON {
            out.write_str("e")
        } else {
            write!(out, "{end}")
        }
    } else if end == EPSILON {
        write!(out, "{start}-e")
    } else {
        write!(out, "{start}-{end}")
    }
}
