//! Conversion of the canonical collection into the LR(0) action/goto table.

use crate::grammar::{Grammar, NonterminalID, ProductionID, TerminalID};
use crate::lr0::{Automaton, StateID};
use crate::types::Map;
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateID),
    Reduce(ProductionID),
    Accept,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift(next) => write!(f, "s{}", next),
            Self::Reduce(production) => write!(f, "r{}", production.into_raw()),
            Self::Accept => f.write_str("acc"),
        }
    }
}

/// The LR(0) action/goto table.
///
/// The builder performs no LR(0)-validity check: on a grammar outside LR(0),
/// colliding action entries silently overwrite earlier ones in item order
/// (last-write-wins). Epsilon items contribute no action at all.
#[derive(Debug)]
pub struct LR0Table {
    actions: Map<StateID, Map<TerminalID, Action>>,
    gotos: Map<StateID, Map<NonterminalID, StateID>>,
    state_count: usize,
}

impl LR0Table {
    pub fn generate(grammar: &Grammar, automaton: &Automaton) -> Self {
        let mut actions = Map::<StateID, Map<TerminalID, Action>>::default();
        let mut gotos = Map::<StateID, Map<NonterminalID, StateID>>::default();

        for (&id, state) in &automaton.states {
            let row_actions = actions.entry(id).or_default();
            let row_gotos = gotos.entry(id).or_default();

            for item in &state.items {
                let production = grammar.production(item.production);

                if production.is_epsilon() {
                    // The epsilon alternative never reduces under this table
                    // model; see DESIGN.md.
                    tracing::warn!(
                        "state {}: epsilon item `{}' contributes no action",
                        id,
                        item.display(grammar),
                    );
                    continue;
                }

                if item.is_complete(grammar) {
                    if item.production == ProductionID::ACCEPT {
                        write_action(row_actions, id, TerminalID::EOI, Action::Accept, grammar);
                    } else {
                        // Reduce on every terminal and on the end marker.
                        for terminal in grammar.terminals() {
                            write_action(
                                row_actions,
                                id,
                                terminal.id(),
                                Action::Reduce(item.production),
                                grammar,
                            );
                        }
                    }
                    continue;
                }

                match item.next_symbol(grammar).expect("incomplete item") {
                    crate::grammar::SymbolID::T(t) => {
                        write_action(row_actions, id, t, Action::Shift(state.shifts[&t]), grammar);
                    }
                    crate::grammar::SymbolID::N(n) => {
                        row_gotos.insert(n, state.gotos[&n]);
                    }
                }
            }
        }

        Self {
            actions,
            gotos,
            state_count: automaton.state_count(),
        }
    }

    pub fn action(&self, state: StateID, terminal: TerminalID) -> Option<Action> {
        self.actions.get(&state)?.get(&terminal).copied()
    }

    pub fn goto(&self, state: StateID, variable: NonterminalID) -> Option<StateID> {
        self.gotos.get(&state)?.get(&variable).copied()
    }

    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        crate::util::display_fn(move |f| {
            for (state, row) in &self.actions {
                for (terminal, action) in row {
                    writeln!(
                        f,
                        "Action[{}, {}] = {}",
                        state,
                        g.terminal(*terminal),
                        action,
                    )?;
                }
            }
            for (state, row) in &self.gotos {
                for (variable, next) in row {
                    writeln!(f, "Goto[{}, {}] = {}", state, g.nonterminal(*variable), next)?;
                }
            }
            Ok(())
        })
    }

    /// Render as CSV: one row per state; action columns for every terminal
    /// plus the end marker, then goto columns for every variable.
    pub fn to_csv(&self, g: &Grammar) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        out.push_str("state");
        for terminal in g.terminals() {
            if terminal.id() == TerminalID::EOI {
                continue;
            }
            let _ = write!(out, ",{}", terminal);
        }
        out.push_str(",$");
        for nonterminal in g.nonterminals() {
            if nonterminal.id() == NonterminalID::START {
                continue;
            }
            let _ = write!(out, ",{}", nonterminal);
        }
        out.push('\n');

        for raw in 0..self.state_count {
            let state = StateID::from_raw(raw as u16);
            let _ = write!(out, "{}", state);

            let mut action_cell = |terminal: TerminalID, out: &mut String| {
                match self.action(state, terminal) {
                    Some(action) => {
                        let _ = write!(out, ",{}", action);
                    }
                    None => out.push(','),
                }
            };
            for terminal in g.terminals() {
                if terminal.id() == TerminalID::EOI {
                    continue;
                }
                action_cell(terminal.id(), &mut out);
            }
            action_cell(TerminalID::EOI, &mut out);

            for nonterminal in g.nonterminals() {
                if nonterminal.id() == NonterminalID::START {
                    continue;
                }
                match self.goto(state, nonterminal.id()) {
                    Some(next) => {
                        let _ = write!(out, ",{}", next);
                    }
                    None => out.push(','),
                }
            }
            out.push('\n');
        }
        out
    }
}

fn write_action(
    row: &mut Map<TerminalID, Action>,
    state: StateID,
    terminal: TerminalID,
    action: Action,
    g: &Grammar,
) {
    if let Some(previous) = row.insert(terminal, action) {
        if previous != action {
            // Last-write-wins, as documented; the overwrite is only logged.
            tracing::debug!(
                "state {}: overwriting {} with {} on `{}'",
                state,
                previous,
                action,
                g.terminal(terminal),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn balanced_grammar_table() {
        let g = balanced_grammar();
        let automaton = Automaton::generate(&g);
        let table = LR0Table::generate(&g, &automaton);
        assert_eq!(table.state_count(), automaton.state_count());

        let start = StateID::from_raw(0);
        let c = terminal(&g, "c");

        // Action[(0, c)] shifts to the state holding `S -> c ·`.
        let shifted = match table.action(start, c) {
            Some(Action::Shift(next)) => next,
            other => panic!("unexpected action: {:?}", other),
        };
        assert!(automaton
            .state(shifted)
            .items
            .iter()
            .all(|item| item.is_complete(&g)));

        // The c-state reduces on every terminal and on the end marker.
        for t in g.terminals() {
            assert!(matches!(
                table.action(shifted, t.id()),
                Some(Action::Reduce(..)),
            ));
        }

        // Exactly one Accept, on the end marker, in the state reached by
        // goto on S from the start state.
        let accept_state = automaton.state(start).gotos[&g.start_symbol()];
        assert_eq!(table.action(accept_state, TerminalID::EOI), Some(Action::Accept));
        let mut accepts = 0;
        for raw in 0..table.state_count() {
            let state = StateID::from_raw(raw as u16);
            for t in g.terminals() {
                if table.action(state, t.id()) == Some(Action::Accept) {
                    accepts += 1;
                }
            }
        }
        assert_eq!(accepts, 1);
    }

    #[test]
    fn epsilon_item_contributes_no_action() {
        // S -> a A ; A -> ε. The A-epsilon item never produces a reduce.
        let g = Grammar::from_str("start: S\nS -> a A\nA -> 0\n").unwrap();
        let automaton = Automaton::generate(&g);
        let table = LR0Table::generate(&g, &automaton);

        let a = terminal(&g, "a");
        let after_a = match table.action(StateID::from_raw(0), a) {
            Some(Action::Shift(next)) => next,
            other => panic!("unexpected action: {:?}", other),
        };

        // The state after shifting `a` holds `S -> a · A` and `A -> ·`; no
        // reduce action may appear there.
        for t in g.terminals() {
            assert!(!matches!(
                table.action(after_a, t.id()),
                Some(Action::Reduce(..)),
            ));
        }
    }

    #[test]
    fn tables_are_deterministic() {
        let g = balanced_grammar();
        let automaton = Automaton::generate(&g);
        let first = LR0Table::generate(&g, &automaton).to_csv(&g);
        let second = LR0Table::generate(&g, &automaton).to_csv(&g);
        assert_eq!(first, second);
    }
}
