//! Calculation of the FOLLOW set function.

use crate::first_sets::FirstSets;
use crate::grammar::{Grammar, NonterminalID, SymbolID, TerminalID, TerminalSet};
use crate::types::Map;
use std::fmt;

/// The FOLLOW sets of every variable, computed once by fixpoint.
///
/// The sets contain terminals and possibly the end-of-input marker
/// [`TerminalID::EOI`], and never the epsilon marker.
#[derive(Debug)]
pub struct FollowSets {
    sets: Map<NonterminalID, TerminalSet>,
}

impl FollowSets {
    pub fn new(grammar: &Grammar, first: &FirstSets) -> Self {
        let mut sets: Map<NonterminalID, TerminalSet> = Map::default();
        for nonterminal in grammar.nonterminals() {
            if nonterminal.id() == NonterminalID::START {
                continue;
            }
            sets.insert(nonterminal.id(), TerminalSet::default());
        }
        sets[&grammar.start_symbol()].insert(TerminalID::EOI);

        let mut changed = true;
        while changed {
            changed = false;
            for production in grammar.user_productions() {
                let a = production.left();
                let right = production.right();
                for (i, &symbol) in right.iter().enumerate() {
                    let b = match symbol {
                        SymbolID::N(b) => b,
                        SymbolID::T(..) => continue,
                    };
                    let beta = &right[i + 1..];

                    if let Some(&head) = beta.first() {
                        let added = first.of(head).clone();
                        changed |= sets[&b].union_with(&added);

                        if beta.iter().all(|s| first.is_nullable(*s)) {
                            let follow_a = sets[&a].clone();
                            changed |= sets[&b].union_with(&follow_a);
                        }
                    } else {
                        let follow_a = sets[&a].clone();
                        changed |= sets[&b].union_with(&follow_a);
                    }
                }
            }
        }

        Self { sets }
    }

    /// `FOLLOW(A)`.
    pub fn of(&self, variable: NonterminalID) -> &TerminalSet {
        self.sets
            .get(&variable)
            .expect("variable missing from the FOLLOW map")
    }

    // `"FOLLOW(E) = { ), $ }"` per variable.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            for (variable, follow) in &self.sets {
                write!(f, "FOLLOW({}) = {{", g.nonterminal(*variable))?;
                for (i, t) in follow.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { " " } else { ", " }, g.terminal(t))?;
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

    fn variable(g: &Grammar, name: &str) -> NonterminalID {
        g.nonterminals()
            .find(|n| n.name() == name)
            .map(|n| n.id())
            .unwrap()
    }

    fn set(g: &Grammar, names: &[&str]) -> TerminalSet {
        names
            .iter()
            .map(|name| match *name {
                "$" => TerminalID::EOI,
                name => g
                    .terminals()
                    .find(|t| t.name() == name)
                    .map(|t| t.id())
                    .unwrap(),
            })
            .collect()
    }

    #[test]
    fn start_symbol_is_seeded_with_the_end_marker() {
        let g = expression_grammar();
        let follow = FollowSets::new(&g, &FirstSets::new(&g));
        assert!(follow.of(g.start_symbol()).contains(TerminalID::EOI));
    }

    #[test]
    fn expression_grammar_follow_sets() {
        let g = expression_grammar();
        let follow = FollowSets::new(&g, &FirstSets::new(&g));

        let close_end = set(&g, &[")", "$"]);
        assert_eq!(follow.of(variable(&g, "E")), &close_end);
        assert_eq!(follow.of(variable(&g, "E1")), &close_end);

        let plus_close_end = set(&g, &["+", ")", "$"]);
        assert_eq!(follow.of(variable(&g, "T")), &plus_close_end);
        assert_eq!(follow.of(variable(&g, "T1")), &plus_close_end);

        assert_eq!(follow.of(variable(&g, "F")), &set(&g, &["+", "*", ")", "$"]));
    }
}
