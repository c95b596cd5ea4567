use std::{num::NonZeroU32, str::FromStr};

use peg::str::LineCol;
use thiserror::Error;

use super::{Expr, Limits, Op};

/// Why an expression could not be parsed.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ParseError {
    /// Nothing but whitespace; there is nothing to evaluate.
    #[error("empty expression")]
    Empty,
    #[error("syntax error: {0}")]
    Syntax(#[from] peg::error::ParseError<LineCol>),
    #[error("expression ends where an operand is expected")]
    UnexpectedEnd,
    #[error("unexpected {found:?} at offset {offset}")]
    Unexpected { found: char, offset: usize },
    #[error("'d' at offset {offset} is not followed by a face count")]
    MissingFaces { offset: usize },
    #[error("')' at offset {offset} closes nothing")]
    UnmatchedClose { offset: usize },
    #[error("'(' at offset {offset} is never closed")]
    Unclosed { offset: usize },
    #[error("number at offset {offset} does not fit in 64 bits")]
    NumberTooLarge { offset: usize },
    #[error("cannot roll {count} dice at once, expected 1 to {limit}")]
    DiceCount { count: u64, limit: usize },
    #[error("parentheses nest deeper than {limit}")]
    TooDeep { limit: usize },
    #[error("expression has more than {limit} nodes")]
    TooManyNodes { limit: usize },
}

pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

// Deepest parenthesis nesting in `s`, ignoring any imbalance.
fn nesting(s: &str) -> usize {
    s.chars()
        .scan(0usize, |depth, c| {
            match c {
                '(' => *depth += 1,
                ')' => *depth = depth.saturating_sub(1),
                _ => {}
            }
            Some(*depth)
        })
        .max()
        .unwrap_or(0)
}

pub(crate) fn parse(s: &str, limits: &Limits) -> Result<Expr, ParseError> {
    if s.chars().all(is_space) {
        return Err(ParseError::Empty);
    }
    if nesting(s) > limits.max_depth {
        return Err(ParseError::TooDeep { limit: limits.max_depth });
    }
    // Every operator brings a node and an operand of its own.
    let operators = s.chars().filter(|&c| Op::from_symbol(c).is_some()).count();
    if operators.saturating_mul(2).saturating_add(1) > limits.max_nodes {
        return Err(ParseError::TooManyNodes { limit: limits.max_nodes });
    }
    let expr = expr_parser::expression(s, limits.max_dice)?;
    if expr.nodes() > limits.max_nodes {
        return Err(ParseError::TooManyNodes { limit: limits.max_nodes });
    }
    log::debug!("parsed {s:?} as {expr}");
    Ok(expr)
}

impl FromStr for Expr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s, &Limits::default())
    }
}

peg::parser! {
    grammar expr_parser(max_dice: usize) for str {
        rule ws() = quiet!{[' ' | '\t' | '\r' | '\n']*}
        rule number() -> i64 = n:$(['0'..='9']+) {? n.parse::<i64>().or(Err("i64")) }
        rule pool() -> Expr = c:$(['0'..='9']+) "d" f:number() {?
            c.parse::<u32>()
                .ok()
                .filter(|&c| c as usize <= max_dice)
                .and_then(NonZeroU32::new)
                .map(|c| Expr::pool(c, f))
                .ok_or("dice count within limits")
        }
        pub rule expression() -> Expr = ws() e:compare() ws() { e }
        rule compare() -> Expr = precedence!{
            x:(@) ws() ">" ws() y:@ { x.greater(y) }
            --
            x:(@) ws() "+" ws() y:@ { x + y }
            x:(@) ws() "-" ws() y:@ { x - y }
            --
            x:(@) ws() "*" ws() y:@ { x * y }
            --
            e:pool() { e }
            n:number() { Expr::constant(n) }
            "d" n:number() { Expr::die(n) }
            "(" ws() e:compare() ws() ")" { e }
        }
    }
}
