//! Syntax support for grammar definition files.
//!
//! The format is line oriented:
//!
//! ```text
//! # comment
//! start: E
//! E  -> T E1
//! E1 -> + T E1 | 0
//! T  -> ( E ) | id
//! ```
//!
//! A `start:` line names the start symbol and must come first. Every other
//! non-empty line is one rule, with `|`-separated alternatives. An identifier
//! starting with an uppercase letter is a variable, one starting with a
//! lowercase letter is a terminal, and a fixed set of punctuation characters
//! are single-character terminals. A lone `0` denotes the epsilon alternative.

use crate::grammar::{GrammarDef, GrammarDefError, SymbolID};

pub mod ast {
    #[derive(Debug, PartialEq)]
    pub struct Grammar {
        pub start: String,
        pub rules: Vec<Rule>,
    }

    #[derive(Debug, PartialEq)]
    pub struct Rule {
        pub left: String,
        pub alternatives: Vec<Alternative>,
    }

    #[derive(Debug, PartialEq)]
    pub enum Alternative {
        Epsilon,
        Seq(Vec<Symbol>),
    }

    #[derive(Debug, PartialEq)]
    pub enum Symbol {
        Terminal(String),
        Variable(String),
    }
}

const PUNCT_TERMINALS: &[char] = &[
    '+', '-', '*', '/', '(', ')', '[', ']', '{', '}', '&', '^', '%', '$', '?', '>', '<', '=',
];

#[derive(Debug, PartialEq)]
enum Token {
    StartKeyword,
    Colon,
    Variable(String),
    Terminal(String),
    Arrow,
    Or,
    Epsilon,
    EndOfRule,
}

fn tokenize(source: &str) -> anyhow::Result<Vec<Token>> {
    let mut tokens = vec![];
    for (lineno, line) in source.lines().enumerate() {
        let lineno = lineno + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("start") {
            let rest = rest.trim_start();
            let name = rest
                .strip_prefix(':')
                .ok_or_else(|| anyhow::anyhow!("line {}: expected `:' after `start'", lineno))?
                .trim();
            anyhow::ensure!(
                name.chars().next().is_some_and(|c| c.is_ascii_uppercase()),
                "line {}: the start symbol must be a variable: `{}'",
                lineno,
                name,
            );
            tokens.push(Token::StartKeyword);
            tokens.push(Token::Colon);
            tokens.push(Token::Variable(name.to_owned()));
            continue;
        }

        tokenize_rule(line, lineno, &mut tokens)?;
        tokens.push(Token::EndOfRule);
    }
    Ok(tokens)
}

fn tokenize_rule(line: &str, lineno: usize, tokens: &mut Vec<Token>) -> anyhow::Result<()> {
    let (left, right) = line
        .split_once("->")
        .ok_or_else(|| anyhow::anyhow!("line {}: a rule requires `->': `{}'", lineno, line))?;

    let left = left.trim();
    anyhow::ensure!(!left.is_empty(), "line {}: empty left-hand side", lineno);
    anyhow::ensure!(
        left.chars().next().is_some_and(|c| c.is_ascii_uppercase())
            && left.chars().all(|c| c.is_ascii_alphanumeric()),
        "line {}: the left-hand side must be a variable: `{}'",
        lineno,
        left,
    );
    tokens.push(Token::Variable(left.to_owned()));
    tokens.push(Token::Arrow);

    for (i, alternative) in right.split('|').enumerate() {
        if i > 0 {
            tokens.push(Token::Or);
        }
        let alternative = alternative.trim();
        anyhow::ensure!(
            !alternative.is_empty(),
            "line {}: empty alternative in `{}'",
            lineno,
            line,
        );
        tokenize_alternative(alternative, lineno, tokens)?;
    }

    Ok(())
}

fn tokenize_alternative(
    alternative: &str,
    lineno: usize,
    tokens: &mut Vec<Token>,
) -> anyhow::Result<()> {
    if alternative == "0" {
        tokens.push(Token::Epsilon);
        return Ok(());
    }

    let mut chars = alternative.char_indices().peekable();
    while let Some((begin, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if c.is_ascii_alphabetic() {
            let mut end = begin + c.len_utf8();
            while let Some((i, next)) = chars.peek().copied() {
                if !next.is_ascii_alphanumeric() {
                    break;
                }
                end = i + next.len_utf8();
                chars.next();
            }
            let lexeme = alternative[begin..end].to_owned();
            if c.is_ascii_uppercase() {
                tokens.push(Token::Variable(lexeme));
            } else {
                tokens.push(Token::Terminal(lexeme));
            }
        } else if PUNCT_TERMINALS.contains(&c) {
            tokens.push(Token::Terminal(c.to_string()));
        } else {
            anyhow::bail!(
                "line {}: illegal character `{}' in `{}'",
                lineno,
                c,
                alternative,
            );
        }
    }
    Ok(())
}

/// Parse a grammar definition source into its syntax tree.
pub fn parse(source: &str) -> anyhow::Result<ast::Grammar> {
    let tokens = tokenize(source)?;
    let mut iter = tokens.into_iter();

    anyhow::ensure!(
        iter.next() == Some(Token::StartKeyword) && iter.next() == Some(Token::Colon),
        "a grammar definition must begin with a `start:' line",
    );
    let start = match iter.next() {
        Some(Token::Variable(name)) => name,
        _ => anyhow::bail!("missing start symbol"),
    };

    let mut rules = vec![];
    while let Some(token) = iter.next() {
        let left = match token {
            Token::Variable(name) => name,
            token => anyhow::bail!("expected a rule, found {:?}", token),
        };
        anyhow::ensure!(
            iter.next() == Some(Token::Arrow),
            "expected `->' after `{}'",
            left,
        );

        let mut alternatives = vec![];
        let mut seq = vec![];
        loop {
            match iter.next() {
                Some(Token::Variable(name)) => seq.push(ast::Symbol::Variable(name)),
                Some(Token::Terminal(name)) => seq.push(ast::Symbol::Terminal(name)),
                Some(Token::Epsilon) => {
                    anyhow::ensure!(
                        seq.is_empty(),
                        "the epsilon mark cannot be mixed with other symbols in `{}'",
                        left,
                    );
                    alternatives.push(ast::Alternative::Epsilon);
                }
                Some(Token::Or) => {
                    if !seq.is_empty() {
                        alternatives.push(ast::Alternative::Seq(std::mem::take(&mut seq)));
                    }
                }
                Some(Token::EndOfRule) | None => {
                    if !seq.is_empty() {
                        alternatives.push(ast::Alternative::Seq(seq));
                    }
                    break;
                }
                Some(token) => anyhow::bail!("unexpected token in rule `{}': {:?}", left, token),
            }
        }
        anyhow::ensure!(!alternatives.is_empty(), "rule `{}' has no alternative", left);
        rules.push(ast::Rule { left, alternatives });
    }
    anyhow::ensure!(!rules.is_empty(), "a grammar requires at least one rule");

    Ok(ast::Grammar { start, rules })
}

/// Register the parsed definition into a `GrammarDef`.
pub fn define_grammar(g: &mut GrammarDef, ast: &ast::Grammar) -> Result<(), GrammarDefError> {
    let start = g.nonterminal(&ast.start)?;
    g.start_symbol(start)?;

    // Declare all rule left-hand sides up front so that declaration order
    // follows the source file.
    for rule in &ast.rules {
        g.nonterminal(&rule.left)?;
    }

    for rule in &ast.rules {
        let left = g.nonterminal(&rule.left)?;
        for alternative in &rule.alternatives {
            match alternative {
                ast::Alternative::Epsilon => {
                    g.production(left, [])?;
                }
                ast::Alternative::Seq(symbols) => {
                    let mut right = Vec::with_capacity(symbols.len());
                    for symbol in symbols {
                        let id = match symbol {
                            ast::Symbol::Terminal(name) => SymbolID::T(g.terminal(name)?),
                            ast::Symbol::Variable(name) => SymbolID::N(g.nonterminal(name)?),
                        };
                        right.push(id);
                    }
                    g.production(left, right)?;
                }
            }
        }
    }

    Ok(())
}
