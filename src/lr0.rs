//! LR(0) items, closure computation and the canonical collection.

use crate::grammar::{Grammar, NonterminalID, ProductionID, SymbolID, TerminalID};
use crate::types::{Map, Set};
use std::{collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: u16,
}

impl StateID {
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.raw)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// An LR(0) item: one production alternative with a dot position.
///
/// The epsilon alternative has an empty right-hand side and generates exactly
/// one item, with the dot fixed at zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR0Item {
    pub production: ProductionID,
    pub dot: u16,
}

impl LR0Item {
    /// The symbol immediately after the dot, if the dot is not at the end.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.production(self.production)
            .right()
            .get(self.dot as usize)
            .copied()
    }

    pub fn is_complete(&self, g: &Grammar) -> bool {
        self.dot as usize == g.production(self.production).right().len()
    }

    // `"E -> T · E1"`, or `"F -> ·"` for the epsilon item.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            let production = g.production(self.production);
            write!(f, "{} ->", g.nonterminal(production.left()))?;
            for (i, &symbol) in production.right().iter().enumerate() {
                if i == self.dot as usize {
                    f.write_str(" ·")?;
                }
                write!(f, " {}", g.symbol_name(symbol))?;
            }
            if self.is_complete(g) {
                f.write_str(" ·")?;
            }
            Ok(())
        })
    }
}

/// One automaton state: a closed item set plus its outgoing transitions.
#[derive(Debug)]
pub struct State {
    /// The closed item set, sorted by (production, dot). This is also the
    /// canonical deduplication key of the state.
    pub items: Vec<LR0Item>,
    pub shifts: Map<TerminalID, StateID>,
    pub gotos: Map<NonterminalID, StateID>,
}

impl State {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            for item in &self.items {
                writeln!(f, "  {}", item.display(g))?;
            }
            for (t, to) in &self.shifts {
                writeln!(f, "  {} => {}", g.terminal(*t), to)?;
            }
            for (n, to) in &self.gotos {
                writeln!(f, "  {} => {}", g.nonterminal(*n), to)?;
            }
            Ok(())
        })
    }
}

/// The canonical collection of LR(0) states, reachable from the closure of
/// the augmented start item. State ids are assigned in discovery order.
#[derive(Debug)]
pub struct Automaton {
    pub states: Map<StateID, State>,
}

impl Automaton {
    pub fn generate(grammar: &Grammar) -> Self {
        let mut states = Map::<StateID, State>::default();
        let mut state_id = {
            let mut next_state_id = 0;
            move || {
                let id = StateID::from_raw(next_state_id);
                next_state_id += 1;
                id
            }
        };

        // States already discovered, keyed by their closed item set. Using
        // the full canonical set avoids misidentifying states that merely
        // share a seed item.
        let mut discovered = Map::<Vec<LR0Item>, StateID>::default();
        let mut pending = VecDeque::<(StateID, Vec<LR0Item>)>::new();

        let start_items = closure(
            grammar,
            [LR0Item {
                production: ProductionID::ACCEPT,
                dot: 0,
            }],
        );
        let start_id = state_id();
        discovered.insert(start_items.clone(), start_id);
        pending.push_back((start_id, start_items));

        while let Some((current, items)) = pending.pop_front() {
            // Kernels of the successor states, grouped by transition symbol
            // in order of first occurrence.
            let mut successors = Map::<SymbolID, Set<LR0Item>>::default();
            for item in &items {
                if let Some(symbol) = item.next_symbol(grammar) {
                    successors.entry(symbol).or_default().insert(LR0Item {
                        dot: item.dot + 1,
                        ..*item
                    });
                }
            }

            let mut shifts = Map::default();
            let mut gotos = Map::default();
            for (symbol, kernel) in successors {
                let closed = closure(grammar, kernel);
                let next = match discovered.get(&closed) {
                    Some(id) => *id,
                    None => {
                        let id = state_id();
                        discovered.insert(closed.clone(), id);
                        pending.push_back((id, closed));
                        id
                    }
                };
                match symbol {
                    SymbolID::T(t) => {
                        shifts.insert(t, next);
                    }
                    SymbolID::N(n) => {
                        gotos.insert(n, next);
                    }
                }
            }

            states.insert(
                current,
                State {
                    items,
                    shifts,
                    gotos,
                },
            );
        }

        tracing::debug!("canonical collection has {} states", states.len());
        Self { states }
    }

    pub fn state(&self, id: StateID) -> &State {
        &self.states[&id]
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            for (id, state) in &self.states {
                writeln!(f, "state {}:", id)?;
                write!(f, "{}", state.display(g))?;
            }
            Ok(())
        })
    }
}

/// Close an item set: whenever the dot stands before a variable, the dot-0
/// items of all its alternatives join the set. Breadth-first; terminates
/// because the item universe is finite and each item is added at most once.
pub fn closure(grammar: &Grammar, kernel: impl IntoIterator<Item = LR0Item>) -> Vec<LR0Item> {
    let mut items: Set<LR0Item> = kernel.into_iter().collect();
    let mut queue: VecDeque<LR0Item> = items.iter().copied().collect();

    while let Some(item) = queue.pop_front() {
        // Items with the dot before a terminal, at the end, or on the
        // epsilon alternative contribute nothing further.
        if let Some(SymbolID::N(n)) = item.next_symbol(grammar) {
            for alternative in grammar.alternatives(n) {
                let new_item = LR0Item {
                    production: alternative.id(),
                    dot: 0,
                };
                if items.insert(new_item) {
                    queue.push_back(new_item);
                }
            }
        }
    }

    let mut items: Vec<_> = items.into_iter().collect();
    items.sort_unstable();
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    // S -> a S b | c, augmented with S' -> S.
    fn balanced_grammar() -> Grammar {
        Grammar::from_str("start: S\nS -> a S b | c\n").unwrap()
    }

    fn terminal(g: &Grammar, name: &str) -> TerminalID {
        g.terminals()
            .find(|t| t.name() == name)
            .map(|t| t.id())
            .unwrap()
    }

    #[test]
    fn closure_is_idempotent() {
        let g = balanced_grammar();
        let once = closure(
            &g,
            [LR0Item {
                production: ProductionID::ACCEPT,
                dot: 0,
            }],
        );
        let twice = closure(&g, once.iter().copied());
        assert_eq!(once, twice);
    }

    #[test]
    fn start_closure_contains_all_start_alternatives() {
        let g = balanced_grammar();
        let items = closure(
            &g,
            [LR0Item {
                production: ProductionID::ACCEPT,
                dot: 0,
            }],
        );
        // S' -> · S, S -> · a S b, S -> · c
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item.dot == 0));
    }

    #[test]
    fn balanced_grammar_automaton() {
        let g = balanced_grammar();
        let automaton = Automaton::generate(&g);

        // 0: {S' -> ·S, S -> ·aSb, S -> ·c}
        // 1: {S' -> S·}          (goto on S)
        // 2: {S -> a·Sb, ...}    (shift on a, loops to itself on a)
        // 3: {S -> c·}           (shift on c)
        // 4: {S -> aS·b}         (goto on S from 2)
        // 5: {S -> aSb·}         (shift on b from 4)
        assert_eq!(automaton.state_count(), 6);

        let a = terminal(&g, "a");
        let b = terminal(&g, "b");
        let c = terminal(&g, "c");

        let start = automaton.state(StateID::from_raw(0));
        let state_s = start.gotos[&g.start_symbol()];
        let state_a = start.shifts[&a];
        let state_c = start.shifts[&c];
        assert_ne!(state_a, state_c);

        // The a-state closes over all S alternatives again and loops.
        let inner = automaton.state(state_a);
        assert_eq!(inner.shifts[&a], state_a);
        assert_eq!(inner.shifts[&c], state_c);

        let state_as = inner.gotos[&g.start_symbol()];
        let state_asb = automaton.state(state_as).shifts[&b];

        // The accept state holds exactly the completed augmented item.
        let accept = automaton.state(state_s);
        assert_eq!(
            accept.items,
            vec![LR0Item {
                production: ProductionID::ACCEPT,
                dot: 1,
            }]
        );
        assert!(automaton
            .state(state_asb)
            .items
            .iter()
            .all(|item| item.is_complete(&g)));
    }

    #[test]
    fn state_ids_are_deterministic() {
        let g = balanced_grammar();
        let first = Automaton::generate(&g);
        let second = Automaton::generate(&g);
        assert_eq!(first.state_count(), second.state_count());
        for (id, state) in &first.states {
            assert_eq!(state.items, second.state(*id).items);
            assert_eq!(state.shifts, second.state(*id).shifts);
            assert_eq!(state.gotos, second.state(*id).gotos);
        }
    }
}
