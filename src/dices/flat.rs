//! Parsing in two passes: a flat list of tokens where every operator carries
//! a precedence ordinal, then a fold of that list into a tree.
//!
//! Parentheses never reach the second pass. Instead each level of nesting
//! adds [`NESTING`] to the ordinal of the operators inside it, which is more
//! than the spread of [`Op::precedence`], so an operator binds tighter than
//! every operator outside its parentheses.

use std::{iter::Peekable, num::NonZeroU32, str::CharIndices};

use super::{Expr, Limits, Op, parse::is_space};
use crate::ParseError;

const NESTING: usize = 10;

#[derive(Debug, PartialEq)]
enum Token {
    Operand(Expr),
    Operator { op: Op, priority: usize },
}

struct Tokenizer<'a> {
    chars: Peekable<CharIndices<'a>>,
    limits: &'a Limits,
    nodes: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(s: &'a str, limits: &'a Limits) -> Self {
        Tokenizer { chars: s.char_indices().peekable(), limits, nodes: 0 }
    }

    // Tree nodes the tokens read so far will become.
    fn count(&mut self, nodes: usize) -> Result<(), ParseError> {
        self.nodes = self.nodes.saturating_add(nodes);
        if self.nodes > self.limits.max_nodes {
            return Err(ParseError::TooManyNodes { limit: self.limits.max_nodes });
        }
        Ok(())
    }

    // Greedily reads digits, returning the offset after the last one.
    fn digits(&mut self, start: usize) -> usize {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        end
    }

    // Face count directly after a 'd' at `offset`.
    fn faces(&mut self, s: &str, offset: usize) -> Result<i64, ParseError> {
        let start = offset + 1;
        let end = self.digits(start);
        if end == start {
            return Err(ParseError::MissingFaces { offset });
        }
        s[start..end].parse().map_err(|_| ParseError::NumberTooLarge { offset: start })
    }

    // A constant, or a dice pool if a 'd' follows the digits directly. The
    // first digit, at `start`, is already consumed.
    fn numeral(&mut self, s: &str, start: usize) -> Result<Expr, ParseError> {
        let end = self.digits(start + 1);
        let digits = &s[start..end];
        match self.chars.peek() {
            Some(&(offset, 'd')) => {
                self.chars.next();
                let faces = self.faces(s, offset)?;
                let count: u64 = digits.parse().map_err(|_| ParseError::NumberTooLarge { offset: start })?;
                let limit = self.limits.max_dice;
                let count = u32::try_from(count)
                    .ok()
                    .filter(|&c| c as usize <= limit)
                    .and_then(NonZeroU32::new)
                    .ok_or(ParseError::DiceCount { count, limit })?;
                self.count(2 * count.get() as usize - 1)?;
                Ok(Expr::pool(count, faces))
            }
            _ => {
                self.count(1)?;
                digits.parse().map(Expr::constant).map_err(|_| ParseError::NumberTooLarge { offset: start })
            }
        }
    }

    fn tokenize(mut self, s: &str) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        let mut opened: Vec<usize> = Vec::new();
        let mut want_operand = true;
        while let Some((offset, c)) = self.chars.next() {
            let unexpected = ParseError::Unexpected { found: c, offset };
            match c {
                c if is_space(c) => {}
                '0'..='9' if want_operand => {
                    tokens.push(Token::Operand(self.numeral(s, offset)?));
                    want_operand = false;
                }
                'd' if want_operand => {
                    self.count(1)?;
                    tokens.push(Token::Operand(Expr::die(self.faces(s, offset)?)));
                    want_operand = false;
                }
                '(' if want_operand => {
                    if opened.len() == self.limits.max_depth {
                        return Err(ParseError::TooDeep { limit: self.limits.max_depth });
                    }
                    opened.push(offset);
                }
                ')' if !want_operand => {
                    if opened.pop().is_none() {
                        return Err(ParseError::UnmatchedClose { offset });
                    }
                }
                c if !want_operand => {
                    let op = Op::from_symbol(c).ok_or(unexpected)?;
                    self.count(1)?;
                    tokens.push(Token::Operator { op, priority: opened.len() * NESTING + op.precedence() });
                    want_operand = true;
                }
                _ => return Err(unexpected),
            }
        }
        if tokens.is_empty() && opened.is_empty() {
            return Err(ParseError::Empty);
        }
        if want_operand {
            return Err(ParseError::UnexpectedEnd);
        }
        if let Some(&offset) = opened.last() {
            return Err(ParseError::Unclosed { offset });
        }
        Ok(tokens)
    }
}

fn reduce(operands: &mut Vec<Expr>, op: Op) -> Result<(), ParseError> {
    let right = operands.pop().ok_or(ParseError::UnexpectedEnd)?;
    let left = operands.pop().ok_or(ParseError::UnexpectedEnd)?;
    operands.push(Expr::operator(op, left, right));
    Ok(())
}

// An operator waiting on the stack is reduced as soon as an operator with
// the same or a lower ordinal arrives, which makes equal ordinals associate
// to the left.
fn fold(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    let mut operands: Vec<Expr> = Vec::new();
    let mut operators: Vec<(Op, usize)> = Vec::new();
    for token in tokens {
        match token {
            Token::Operand(e) => operands.push(e),
            Token::Operator { op, priority } => {
                while let Some(&(top, top_priority)) = operators.last() {
                    if top_priority < priority {
                        break;
                    }
                    operators.pop();
                    reduce(&mut operands, top)?;
                }
                operators.push((op, priority));
            }
        }
    }
    while let Some((op, _)) = operators.pop() {
        reduce(&mut operands, op)?;
    }
    let top = operands.pop().ok_or(ParseError::Empty)?;
    debug_assert!(operands.is_empty());
    Ok(top)
}

pub(crate) fn parse(s: &str, limits: &Limits) -> Result<Expr, ParseError> {
    let tokens = Tokenizer::new(s, limits).tokenize(s)?;
    log::trace!("{} tokens in {s:?}", tokens.len());
    fold(tokens)
}
