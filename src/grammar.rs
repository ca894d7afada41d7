//! Grammar types.

use crate::{types::Map, util::display_fn};
use std::{fmt, fs, io, path::Path};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: String,
}

impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A set of terminal symbols, backed by a bit set over the dense id space.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }

    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }

    /// Add all elements of `other`, reporting whether the set grew.
    pub fn union_with(&mut self, other: &Self) -> bool {
        let before = self.inner.len();
        self.inner.union_with(&other.inner);
        self.inner.len() != before
    }

    pub fn intersection<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = TerminalID> + 'a {
        self.iter().filter(|t| other.contains(*t))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .map(|raw| raw.try_into().map(TerminalID::from_raw).unwrap())
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    /// Reserved symbol used as the fresh start symbol of the augmented grammar.
    pub const START: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: String,
}

impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}

impl ProductionID {
    /// The augmented production `S' -> S`, used only by the LR(0) path.
    pub const ACCEPT: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

/// A single production alternative `A -> X1 X2 ... Xn`.
///
/// The epsilon alternative is represented by an empty right-hand side, so it
/// cannot be mixed with other symbols by construction.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Vec<SymbolID>,
}

impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    pub fn left(&self) -> NonterminalID {
        self.left
    }

    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// Whether this is the epsilon alternative `A -> ε`.
    pub fn is_epsilon(&self) -> bool {
        self.right.is_empty()
    }

    // `"A -> X1 X2 X3"`, or `"A -> ε"` for the epsilon alternative.
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} -> ", g.nonterminals[&self.left])?;
            if self.is_epsilon() {
                return f.write_str("ε");
            }
            for (i, symbol) in self.right.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                f.write_str(g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

/// The grammar definition used to derive the parsing tables.
///
/// Immutable once built; both analysis back ends consume it by reference.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start_symbol: NonterminalID,
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GrammarDefError> {
        let source = fs::read_to_string(path).map_err(GrammarDefError::IO)?;
        Self::from_str(&source)
    }

    pub fn from_str(source: &str) -> Result<Self, GrammarDefError> {
        let ast = crate::syntax::parse(source).map_err(GrammarDefError::Syntax)?;
        Self::define(|g| crate::syntax::define_grammar(g, &ast))
    }

    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef::default();
        f(&mut def)?;
        def.end()
    }

    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    pub fn terminal(&self, id: TerminalID) -> &Terminal {
        &self.terminals[&id]
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &Nonterminal {
        &self.nonterminals[&id]
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> + '_ {
        self.terminals.values()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals.values()
    }

    /// All productions, including the augmented `ACCEPT` production.
    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values()
    }

    /// The user-written productions, without the augmented `ACCEPT` one.
    pub fn user_productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions
            .values()
            .filter(|p| p.id != ProductionID::ACCEPT)
    }

    /// The alternatives of the specified variable, in declaration order.
    pub fn alternatives(&self, left: NonterminalID) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values().filter(move |p| p.left == left)
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminals[&t].name(),
            SymbolID::N(n) => self.nonterminals[&n].name(),
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start symbol: {}", self.nonterminals[&self.start_symbol])?;

        write!(f, "terminals:")?;
        for terminal in self.terminals.values() {
            if terminal.id() == TerminalID::EOI {
                continue;
            }
            write!(f, " {}", terminal)?;
        }
        writeln!(f)?;

        write!(f, "variables:")?;
        for nonterminal in self.nonterminals.values() {
            if nonterminal.id() == NonterminalID::START {
                continue;
            }
            write!(f, " {}", nonterminal)?;
        }
        writeln!(f)?;

        writeln!(f, "productions:")?;
        for production in self.productions.values() {
            writeln!(f, "  #{}: {}", production.id().into_raw(), production.display(self))?;
        }

        Ok(())
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start: Option<NonterminalID>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_production_id: u16,
}

impl Default for GrammarDef {
    fn default() -> Self {
        let mut def = Self {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start: None,
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            next_production_id: ProductionID::OFFSET,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: "$".to_owned(),
            },
        );

        // The name is fixed up in `end()` once the start symbol is known.
        def.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                id: NonterminalID::START,
                name: String::new(),
            },
        );

        def
    }
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        if let Some(id) = self.find_terminal(name) {
            return Ok(id);
        }
        if self.find_nonterminal(name).is_some() {
            return Err(GrammarDefError::SymbolClass {
                name: name.to_owned(),
            });
        }

        let id = TerminalID::from_raw(self.next_terminal_id);
        self.next_terminal_id += 1;
        self.terminals.insert(
            id,
            Terminal {
                id,
                name: name.to_owned(),
            },
        );
        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarDefError> {
        if let Some(id) = self.find_nonterminal(name) {
            return Ok(id);
        }
        if self.find_terminal(name).is_some() {
            return Err(GrammarDefError::SymbolClass {
                name: name.to_owned(),
            });
        }

        let id = NonterminalID::from_raw(self.next_nonterminal_id);
        self.next_nonterminal_id += 1;
        self.nonterminals.insert(
            id,
            Nonterminal {
                id,
                name: name.to_owned(),
            },
        );
        Ok(id)
    }

    /// Specify a production alternative. An empty `right` denotes `A -> ε`.
    pub fn production<I>(
        &mut self,
        left: NonterminalID,
        right: I,
    ) -> Result<ProductionID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let right: Vec<_> = right.into_iter().collect();
        for production in self.productions.values() {
            if production.left == left && production.right == right {
                return Err(GrammarDefError::Other {
                    msg: "duplicate production alternative".into(),
                });
            }
        }

        let id = ProductionID::from_raw(self.next_production_id);
        self.next_production_id += 1;
        self.productions.insert(id, Production { id, left, right });
        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarDefError> {
        self.start.replace(symbol);
        Ok(())
    }

    fn find_terminal(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .values()
            .find(|t| t.id != TerminalID::EOI && t.name == name)
            .map(|t| t.id)
    }

    fn find_nonterminal(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .values()
            .find(|n| n.id != NonterminalID::START && n.name == name)
            .map(|n| n.id)
    }

    fn end(mut self) -> Result<Grammar, GrammarDefError> {
        // Fall back to the first declared nonterminal if no start symbol was given.
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .find(|id| **id != NonterminalID::START)
                .copied()
                .ok_or_else(|| GrammarDefError::Other {
                    msg: "empty nonterminal symbols".into(),
                })?,
        };

        // Every variable must have at least one production.
        for nonterminal in self.nonterminals.values() {
            if nonterminal.id == NonterminalID::START {
                continue;
            }
            if !self.productions.values().any(|p| p.left == nonterminal.id) {
                return Err(GrammarDefError::NoProduction {
                    name: nonterminal.name.clone(),
                });
            }
        }

        // Augmentation: `S' -> S`, named after the start symbol.
        let augmented_name = format!("{}'", self.nonterminals[&start].name);
        self.nonterminals[&NonterminalID::START].name = augmented_name;
        self.productions.insert(
            ProductionID::ACCEPT,
            Production {
                id: ProductionID::ACCEPT,
                left: NonterminalID::START,
                right: vec![SymbolID::N(start)],
            },
        );

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            start_symbol: start,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("IO error: {}", _0)]
    IO(io::Error),

    #[error("Syntax error: {}", _0)]
    Syntax(anyhow::Error),

    #[error("The variable `{}' has no production", name)]
    NoProduction { name: String },

    #[error("The symbol `{}' is used both as a terminal and as a variable", name)]
    SymbolClass { name: String },

    #[error("Grammar error: {}", msg)]
    Other { msg: String },
}

impl From<&str> for GrammarDefError {
    fn from(msg: &str) -> Self {
        Self::Other { msg: msg.into() }
    }
}

impl From<String> for GrammarDefError {
    fn from(msg: String) -> Self {
        Self::Other { msg }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SymbolID::*;

    #[test]
    fn builder_assigns_ids_and_augments() {
        let grammar = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let s = g.nonterminal("S")?;
            g.start_symbol(s)?;
            g.production(s, [T(a)])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(grammar.start_symbol(), NonterminalID::from_raw(1));
        assert_eq!(grammar.nonterminal(NonterminalID::START).name(), "S'");

        let accept = grammar.production(ProductionID::ACCEPT);
        assert_eq!(accept.left(), NonterminalID::START);
        assert_eq!(accept.right(), [N(grammar.start_symbol())]);
    }

    #[test]
    fn variable_without_production_is_fatal() {
        let err = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let s = g.nonterminal("S")?;
            let _dangling = g.nonterminal("T")?;
            g.start_symbol(s)?;
            g.production(s, [T(a)])?;
            Ok(())
        })
        .unwrap_err();

        assert!(matches!(err, GrammarDefError::NoProduction { name } if name == "T"));
    }

    #[test]
    fn epsilon_alternative_is_empty_sequence() {
        let grammar = Grammar::define(|g| {
            let a = g.terminal("a")?;
            let s = g.nonterminal("S")?;
            g.start_symbol(s)?;
            g.production(s, [T(a)])?;
            g.production(s, [])?;
            Ok(())
        })
        .unwrap();

        let alts: Vec<_> = grammar.alternatives(grammar.start_symbol()).collect();
        assert_eq!(alts.len(), 2);
        assert!(!alts[0].is_epsilon());
        assert!(alts[1].is_epsilon());
        assert_eq!(alts[1].display(&grammar).to_string(), "S -> ε");
    }
}
