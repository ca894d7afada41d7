//! LL(1) conflict detection and predictive table construction.

use crate::first_sets::FirstSets;
use crate::follow_sets::FollowSets;
use crate::grammar::{Grammar, NonterminalID, ProductionID, TerminalID, TerminalSet};
use crate::types::Map;
use std::fmt;

/// A single LL(1) conflict between two alternatives of the same variable.
#[derive(Debug)]
pub enum Conflict {
    /// `FIRST(α) ∩ FIRST(β)` (epsilon excluded) is non-empty.
    FirstFirst {
        left: NonterminalID,
        alt_a: ProductionID,
        alt_b: ProductionID,
        terminals: TerminalSet,
    },

    /// One alternative is nullable and the other's FIRST intersects
    /// `FOLLOW(left)`.
    FirstFollow {
        left: NonterminalID,
        nullable_alt: ProductionID,
        other_alt: ProductionID,
        terminals: TerminalSet,
    },
}

impl Conflict {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            let terminals = |f: &mut fmt::Formatter<'_>, set: &TerminalSet| {
                for (i, t) in set.iter().enumerate() {
                    write!(f, "{}{}", if i == 0 { "" } else { ", " }, g.terminal(t))?;
                }
                Ok(())
            };
            match self {
                Self::FirstFirst {
                    alt_a,
                    alt_b,
                    terminals: ts,
                    ..
                } => {
                    write!(
                        f,
                        "FIRST/FIRST conflict between `{}' and `{}' on {{ ",
                        g.production(*alt_a).display(g),
                        g.production(*alt_b).display(g),
                    )?;
                    terminals(f, ts)?;
                    write!(f, " }}")
                }
                Self::FirstFollow {
                    left,
                    nullable_alt,
                    other_alt,
                    terminals: ts,
                } => {
                    write!(
                        f,
                        "FIRST/FOLLOW conflict: `{}' is nullable and FIRST of `{}' meets FOLLOW({}) on {{ ",
                        g.production(*nullable_alt).display(g),
                        g.production(*other_alt).display(g),
                        g.nonterminal(*left),
                    )?;
                    terminals(f, ts)?;
                    write!(f, " }}")
                }
            }
        })
    }
}

/// Check every unordered pair of distinct alternatives of each variable.
/// The grammar is LL(1) iff the returned report is empty.
pub fn check(grammar: &Grammar, first: &FirstSets, follow: &FollowSets) -> Vec<Conflict> {
    let mut conflicts = vec![];

    for nonterminal in grammar.nonterminals() {
        let left = nonterminal.id();
        if left == NonterminalID::START {
            continue;
        }

        let alternatives: Vec<_> = grammar.alternatives(left).collect();
        for (i, alt_a) in alternatives.iter().enumerate() {
            let first_a = first.of_sequence(alt_a.right());
            for alt_b in &alternatives[i + 1..] {
                let first_b = first.of_sequence(alt_b.right());

                let common: TerminalSet =
                    first_a.terminals.intersection(&first_b.terminals).collect();
                if !common.is_empty() {
                    conflicts.push(Conflict::FirstFirst {
                        left,
                        alt_a: alt_a.id(),
                        alt_b: alt_b.id(),
                        terminals: common,
                    });
                }

                if first_a.epsilon {
                    let common: TerminalSet =
                        first_b.terminals.intersection(follow.of(left)).collect();
                    if !common.is_empty() {
                        conflicts.push(Conflict::FirstFollow {
                            left,
                            nullable_alt: alt_a.id(),
                            other_alt: alt_b.id(),
                            terminals: common,
                        });
                    }
                }
                if first_b.epsilon {
                    let common: TerminalSet =
                        first_a.terminals.intersection(follow.of(left)).collect();
                    if !common.is_empty() {
                        conflicts.push(Conflict::FirstFollow {
                            left,
                            nullable_alt: alt_b.id(),
                            other_alt: alt_a.id(),
                            terminals: common,
                        });
                    }
                }
            }
        }
    }

    conflicts
}

/// The predictive parsing table `M[A, a] -> alternative`.
///
/// Construction trusts the caller to run [`check`] first: for a grammar that
/// is not LL(1) colliding entries silently overwrite earlier ones
/// (last-write-wins); this is not a second conflict detector.
#[derive(Debug)]
pub struct LL1Table {
    map: Map<NonterminalID, Map<TerminalID, ProductionID>>,
}

impl LL1Table {
    pub fn generate(grammar: &Grammar, first: &FirstSets, follow: &FollowSets) -> Self {
        let mut map: Map<NonterminalID, Map<TerminalID, ProductionID>> = Map::default();
        for nonterminal in grammar.nonterminals() {
            if nonterminal.id() == NonterminalID::START {
                continue;
            }
            map.insert(nonterminal.id(), Map::default());
        }

        for production in grammar.user_productions() {
            let row = &mut map[&production.left()];
            let seq_first = first.of_sequence(production.right());

            for t in seq_first.terminals.iter() {
                row.insert(t, production.id());
            }
            if seq_first.epsilon {
                for b in follow.of(production.left()).iter() {
                    row.insert(b, production.id());
                }
            }
        }

        Self { map }
    }

    /// `M[A, a]`, if present.
    pub fn get(&self, variable: NonterminalID, terminal: TerminalID) -> Option<ProductionID> {
        self.map.get(&variable)?.get(&terminal).copied()
    }

    // `"M[E1, +] = E1 -> + T E1"` per entry.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            for (variable, row) in &self.map {
                for (terminal, production) in row {
                    writeln!(
                        f,
                        "M[{}, {}] = {}",
                        g.nonterminal(*variable),
                        g.terminal(*terminal),
                        g.production(*production).display(g),
                    )?;
                }
            }
            Ok(())
        })
    }

    /// Render as CSV: one row per variable, one column per terminal plus the
    /// end-of-input marker.
    pub fn to_csv(&self, g: &Grammar) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        out.push_str("variable");
        for terminal in g.terminals() {
            if terminal.id() == TerminalID::EOI {
                continue;
            }
            let _ = write!(out, ",{}", terminal);
        }
        out.push_str(",$\n");

        for (variable, row) in &self.map {
            let _ = write!(out, "{}", g.nonterminal(*variable));
            let mut cell = |terminal: TerminalID, out: &mut String| {
                match row.get(&terminal) {
                    Some(p) => {
                        let _ = write!(out, ",{}", g.production(*p).display(g));
                    }
                    None => out.push(','),
                }
            };
            for terminal in g.terminals() {
                if terminal.id() == TerminalID::EOI {
                    continue;
                }
                cell(terminal.id(), &mut out);
            }
            cell(TerminalID::EOI, &mut out);
            out.push('\n');
        }
        out
    }
}
