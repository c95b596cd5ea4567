//! Exact outcome distributions of dice arithmetic.
//!
//! An expression such as `2d6+3>10` is parsed into an [`Expr`] tree, and
//! every node of the tree is turned into a [`Pmf`], the chance of each
//! possible outcome. Dice are independent and fair, so an operator node
//! combines every outcome of its left side with every outcome of its right
//! side.
//!
//! The language has integers, dice `dN`, dice pools `MdN` (the sum of `M`
//! dice), parentheses and four left associative operators. From loosest to
//! tightest binding: `>` (`1` if the left side is greater, otherwise `0`),
//! `+` and `-`, then `*`.
//! ```
//! let dist = diceprob::evaluate("1d2+1d2").unwrap();
//! assert_eq!(dist.to_string(), "2 25.00\n3 50.00\n4 25.00");
//! ```

mod dices;
mod dist;

pub use dices::{Expr, Limits, Op, Strategy, parse::ParseError};
pub use dist::{EvalError, Pmf, percent};
use thiserror::Error;

/// Anything that can go wrong between reading an expression and its
/// distribution.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Parse `s` and compute its distribution with the default [`Limits`].
pub fn evaluate(s: &str) -> Result<Pmf, Error> {
    evaluate_with(s, Strategy::default(), &Limits::default())
}

/// Parse `s` with `strategy` and compute its distribution, staying within
/// `limits`.
pub fn evaluate_with(s: &str, strategy: Strategy, limits: &Limits) -> Result<Pmf, Error> {
    let expr = Expr::parse_with(s, strategy, limits)?;
    let dist = expr.dist_with(limits)?;
    log::debug!("{expr} has {} outcomes", dist.len());
    Ok(dist)
}
