//! Calculation of the FIRST set function.

use crate::grammar::{Grammar, SymbolID, TerminalSet};
use crate::types::{Map, Set};
use std::fmt;

/// FIRST of a symbol sequence: the terminals that can begin a derived string,
/// plus whether the sequence can derive the empty string.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SequenceFirst {
    pub terminals: TerminalSet,
    pub epsilon: bool,
}

/// The FIRST sets of every grammar symbol, computed once by fixpoint.
///
/// Epsilon membership is tracked separately from the terminal sets, so
/// `of(x)` is already "FIRST(x) without epsilon".
#[derive(Debug)]
pub struct FirstSets {
    sets: Map<SymbolID, TerminalSet>,
    nullables: Set<SymbolID>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        let mut sets: Map<SymbolID, TerminalSet> = Map::default();
        for terminal in grammar.terminals() {
            sets.insert(
                SymbolID::T(terminal.id()),
                Some(terminal.id()).into_iter().collect(),
            );
        }
        for nonterminal in grammar.nonterminals() {
            sets.insert(SymbolID::N(nonterminal.id()), TerminalSet::default());
        }
        let mut nullables = Set::default();

        // Repeat full passes over the productions until nothing changes.
        // The sets only grow and are bounded by the terminal universe.
        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.user_productions() {
                let left = SymbolID::N(production.left());

                if production.is_epsilon() {
                    changed |= nullables.insert(left);
                    continue;
                }

                let mut all_nullable = true;
                for &symbol in production.right() {
                    let added = sets
                        .get(&symbol)
                        .expect("symbol missing from the FIRST map")
                        .clone();
                    changed |= sets[&left].union_with(&added);

                    if !nullables.contains(&symbol) {
                        all_nullable = false;
                        break;
                    }
                }
                if all_nullable {
                    changed |= nullables.insert(left);
                }
            }
        }

        Self { sets, nullables }
    }

    /// `FIRST(x)` without the epsilon marker.
    pub fn of(&self, symbol: SymbolID) -> &TerminalSet {
        self.sets
            .get(&symbol)
            .expect("symbol missing from the FIRST map")
    }

    /// Whether epsilon is a member of `FIRST(x)`.
    pub fn is_nullable(&self, symbol: SymbolID) -> bool {
        self.nullables.contains(&symbol)
    }

    /// `FIRST(X1 X2 ... Xn)` by the nullable-prefix scan. The empty sequence
    /// (an epsilon alternative) yields `{ε}`.
    pub fn of_sequence(&self, sequence: &[SymbolID]) -> SequenceFirst {
        let mut result = SequenceFirst {
            terminals: TerminalSet::default(),
            epsilon: true,
        };
        for &symbol in sequence {
            result.terminals.union_with(self.of(symbol));
            if !self.is_nullable(symbol) {
                result.epsilon = false;
                break;
            }
        }
        result
    }

    // `"FIRST(E) = { (, id }"` per variable.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            for nonterminal in g.nonterminals() {
                if nonterminal.id() == crate::grammar::NonterminalID::START {
                    continue;
                }
                let symbol = SymbolID::N(nonterminal.id());
                write!(f, "FIRST({}) = {{", nonterminal)?;
                let mut first = true;
                for t in self.of(symbol).iter() {
                    write!(f, "{}{}", if first { " " } else { ", " }, g.terminal(t))?;
                    first = false;
                }
                if self.is_nullable(symbol) {
                    write!(f, "{}ε", if first { " " } else { ", " })?;
                }
                writeln!(f, " }}")?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::TerminalID;
    use SymbolID::*;

    // E -> T E1 ; E1 -> + T E1 | ε ; T -> F T1 ; T1 -> * F T1 | ε ; F -> ( E ) | id
    fn expression_grammar() -> Grammar {
        Grammar::from_str(
            "\
start: E
E  -> T E1
E1 -> + T E1 | 0
T  -> F T1
T1 -> * F T1 | 0
F  -> ( E ) | id
",
        )
        .unwrap()
    }

    fn terminal(g: &Grammar, name: &str) -> TerminalID {
        g.terminals()
            .find(|t| t.name() == name)
            .map(|t| t.id())
            .unwrap()
    }

    fn variable(g: &Grammar, name: &str) -> SymbolID {
        g.nonterminals()
            .find(|n| n.name() == name)
            .map(|n| N(n.id()))
            .unwrap()
    }

    fn set(g: &Grammar, names: &[&str]) -> TerminalSet {
        names.iter().map(|name| terminal(g, name)).collect()
    }

    #[test]
    fn first_of_terminal_is_itself() {
        let g = expression_grammar();
        let first = FirstSets::new(&g);
        for t in g.terminals() {
            let expected: TerminalSet = [t.id()].into_iter().collect();
            assert_eq!(first.of(T(t.id())), &expected);
            assert!(!first.is_nullable(T(t.id())));
        }
    }

    #[test]
    fn first_of_empty_sequence_is_epsilon() {
        let g = expression_grammar();
        let first = FirstSets::new(&g);
        let seq = first.of_sequence(&[]);
        assert!(seq.epsilon);
        assert!(seq.terminals.is_empty());
    }

    #[test]
    fn expression_grammar_first_sets() {
        let g = expression_grammar();
        let first = FirstSets::new(&g);

        let parens_id = set(&g, &["(", "id"]);
        for name in ["E", "T", "F"] {
            assert_eq!(first.of(variable(&g, name)), &parens_id, "FIRST({})", name);
            assert!(!first.is_nullable(variable(&g, name)));
        }

        assert_eq!(first.of(variable(&g, "E1")), &set(&g, &["+"]));
        assert!(first.is_nullable(variable(&g, "E1")));

        assert_eq!(first.of(variable(&g, "T1")), &set(&g, &["*"]));
        assert!(first.is_nullable(variable(&g, "T1")));
    }

    #[test]
    fn nullable_prefix_scan_stops_at_first_non_nullable() {
        let g = expression_grammar();
        let first = FirstSets::new(&g);

        // FIRST(E1 T) = {+} ∪ FIRST(T), and T is not nullable.
        let seq = first.of_sequence(&[variable(&g, "E1"), variable(&g, "T")]);
        assert_eq!(seq.terminals, set(&g, &["+", "(", "id"]));
        assert!(!seq.epsilon);

        // FIRST(E1 T1) keeps epsilon since both are nullable.
        let seq = first.of_sequence(&[variable(&g, "E1"), variable(&g, "T1")]);
        assert_eq!(seq.terminals, set(&g, &["+", "*"]));
        assert!(seq.epsilon);
    }
}
