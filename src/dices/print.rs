use std::{convert::Infallible, fmt, mem};

use super::{Evaluator, Expr, Op};

/// Displays an expression normalized, with spaces and only the parentheses
/// needed to parse back into the same tree.
/// ```
/// use diceprob::Expr;
/// let x: Expr = "(2d4 + (d5))* ((3>d2)-1)".parse().unwrap();
/// assert_eq!(x.to_string(), "(d4 + d4 + d5) * ((3 > d2) - 1)");
/// ```
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let Ok((_, res)) = self.traverse(&mut StringEvaluator);
        write!(f, "{res}")
    }
}

// Binds tighter than any operator.
const ATOM: usize = 9;

// Each value carries the precedence of its outermost operator.
struct StringEvaluator;

impl StringEvaluator {
    // Appends to the left string, which is only copied when it needs parentheses.
    fn join(op: Op, a: &mut (usize, String), b: &(usize, String)) -> Result<(), Infallible> {
        let level = op.precedence();
        if a.0 < level {
            let inner = mem::take(&mut a.1);
            a.1.reserve(inner.len() + b.1.len() + 7);
            a.1.push('(');
            a.1.push_str(&inner);
            a.1.push(')');
        }
        a.1.push(' ');
        a.1.push(op.symbol());
        a.1.push(' ');
        if b.0 <= level {
            a.1.push('(');
            a.1.push_str(&b.1);
            a.1.push(')');
        } else {
            a.1.push_str(&b.1);
        }
        a.0 = level;
        Ok(())
    }
}

impl Evaluator<(usize, String)> for StringEvaluator {
    type Error = Infallible;

    fn dice(&mut self, faces: i64) -> Result<(usize, String), Infallible> {
        Ok((ATOM, format!("d{faces}")))
    }

    fn constant(&mut self, n: i64) -> Result<(usize, String), Infallible> {
        Ok((ATOM, n.to_string()))
    }

    fn add_inplace(&mut self, a: &mut (usize, String), b: &(usize, String)) -> Result<(), Infallible> {
        StringEvaluator::join(Op::Add, a, b)
    }

    fn sub_inplace(&mut self, a: &mut (usize, String), b: &(usize, String)) -> Result<(), Infallible> {
        StringEvaluator::join(Op::Sub, a, b)
    }

    fn mul_inplace(&mut self, a: &mut (usize, String), b: &(usize, String)) -> Result<(), Infallible> {
        StringEvaluator::join(Op::Mul, a, b)
    }

    fn greater_inplace(&mut self, a: &mut (usize, String), b: &(usize, String)) -> Result<(), Infallible> {
        StringEvaluator::join(Op::Greater, a, b)
    }
}
