use std::{
    convert::Infallible,
    fmt, mem,
    num::NonZeroU32,
    ops::{Add, AddAssign, Mul, MulAssign, Sub},
};

use num::{FromPrimitive, Num};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{EvalError, ParseError, Pmf};

mod dist;
mod flat;
pub mod parse;
mod print;
mod random;

pub(crate) use dist::PmfEvaluator;

/// A binary operator of the dice arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Op {
    Add,
    Sub,
    Mul,
    /// `1` if the left side is strictly greater than the right side, else `0`.
    Greater,
}

impl Op {
    pub const ALL: [Op; 4] = [Op::Add, Op::Sub, Op::Mul, Op::Greater];

    pub fn symbol(self) -> char {
        match self {
            Op::Add => '+',
            Op::Sub => '-',
            Op::Mul => '*',
            Op::Greater => '>',
        }
    }

    pub fn from_symbol(c: char) -> Option<Op> {
        match c {
            '+' => Some(Op::Add),
            '-' => Some(Op::Sub),
            '*' => Some(Op::Mul),
            '>' => Some(Op::Greater),
            _ => None,
        }
    }

    /// Binding strength within one level of parentheses. Higher binds tighter.
    pub fn precedence(self) -> usize {
        match self {
            Op::Mul => 5,
            Op::Add | Op::Sub => 3,
            Op::Greater => 0,
        }
    }

    /// Combine two outcomes, or `None` if the result doesn't fit in an `i64`.
    pub fn apply(self, a: i64, b: i64) -> Option<i64> {
        match self {
            Op::Add => a.checked_add(b),
            Op::Sub => a.checked_sub(b),
            Op::Mul => a.checked_mul(b),
            Op::Greater => Some(i64::from(a > b)),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A dice expression, e.g. `2d6+3>10`, as a tree.
///
/// Every operator node owns both of its children; a tree is never modified
/// once it is built.
/// ```
/// use diceprob::Expr;
/// let x: Expr = "1 + 2*3".parse().unwrap();
/// assert_eq!(x, Expr::constant(1) + Expr::constant(2) * Expr::constant(3));
/// assert_eq!(x.dist::<f64>().unwrap().chance(7), Some(&1.0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expr {
    Constant(i64),
    /// A fair die with the given number of faces, numbered from 1.
    Die(i64),
    Operator { op: Op, left: Box<Expr>, right: Box<Expr> },
}

/// Which parsing algorithm to use. Both accept the same language and build
/// the same trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Strategy {
    /// Precedence climbing, building nodes while parsing.
    #[default]
    Descent,
    /// Tokens tagged with precedence ordinals, folded into a tree afterwards.
    Priority,
}

/// Bounds on the work a single expression may cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Limits {
    /// Deepest allowed nesting of parentheses.
    pub max_depth: usize,
    /// Largest `N` allowed in a dice pool `NdM`.
    pub max_dice: usize,
    /// Largest number of nodes in a parsed tree, counting every die of a pool.
    pub max_nodes: usize,
    /// Largest number of distinct outcomes of any node.
    pub max_outcomes: usize,
    /// Largest number of outcome pairs a single operator may combine.
    pub max_pairs: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_depth: 64, max_dice: 100, max_nodes: 10_000, max_outcomes: 1_000_000, max_pairs: 10_000_000 }
    }
}

impl Limits {
    pub const UNBOUNDED: Limits = Limits {
        max_depth: usize::MAX,
        max_dice: usize::MAX,
        max_nodes: usize::MAX,
        max_outcomes: usize::MAX,
        max_pairs: usize::MAX,
    };
}

// Used when traversing an `Expr`
pub(crate) trait Evaluator<T> {
    type Error;
    fn dice(&mut self, faces: i64) -> Result<T, Self::Error>;
    fn constant(&mut self, n: i64) -> Result<T, Self::Error>;
    fn add_inplace(&mut self, a: &mut T, b: &T) -> Result<(), Self::Error>;
    fn sub_inplace(&mut self, a: &mut T, b: &T) -> Result<(), Self::Error>;
    fn mul_inplace(&mut self, a: &mut T, b: &T) -> Result<(), Self::Error>;
    fn greater_inplace(&mut self, a: &mut T, b: &T) -> Result<(), Self::Error>;
}

// A state machine used in `Expr::traverse`
enum Stage<'a> {
    Visit(&'a Expr),
    Collect(Op),
}

// Finds the minimum and maximum value of an `Expr`.
struct Bounds;

impl Bounds {
    fn extremes(op: Op, a: (i64, i64), b: (i64, i64)) -> Result<(i64, i64), EvalError> {
        let mut min = i64::MAX;
        let mut max = i64::MIN;
        for (x, y) in [(a.0, b.0), (a.0, b.1), (a.1, b.0), (a.1, b.1)] {
            let v = op.apply(x, y).ok_or(EvalError::Overflow { op, left: x, right: y })?;
            min = min.min(v);
            max = max.max(v);
        }
        Ok((min, max))
    }
}

impl Evaluator<(i64, i64)> for Bounds {
    type Error = EvalError;

    fn dice(&mut self, faces: i64) -> Result<(i64, i64), EvalError> {
        if faces <= 0 {
            return Err(EvalError::NoFaces(faces));
        }
        Ok((1, faces))
    }

    fn constant(&mut self, n: i64) -> Result<(i64, i64), EvalError> {
        Ok((n, n))
    }

    fn add_inplace(&mut self, a: &mut (i64, i64), b: &(i64, i64)) -> Result<(), EvalError> {
        *a = Bounds::extremes(Op::Add, *a, *b)?;
        Ok(())
    }

    fn sub_inplace(&mut self, a: &mut (i64, i64), b: &(i64, i64)) -> Result<(), EvalError> {
        *a = Bounds::extremes(Op::Sub, *a, *b)?;
        Ok(())
    }

    fn mul_inplace(&mut self, a: &mut (i64, i64), b: &(i64, i64)) -> Result<(), EvalError> {
        *a = Bounds::extremes(Op::Mul, *a, *b)?;
        Ok(())
    }

    // 0 is reachable unless the left side always wins, 1 unless it never does.
    fn greater_inplace(&mut self, a: &mut (i64, i64), b: &(i64, i64)) -> Result<(), EvalError> {
        let always = a.0 > b.1;
        let never = a.1 <= b.0;
        *a = (i64::from(always), i64::from(!never));
        Ok(())
    }
}

// Counts the nodes of an `Expr`.
struct Nodes;

impl Evaluator<usize> for Nodes {
    type Error = Infallible;

    fn dice(&mut self, _: i64) -> Result<usize, Infallible> {
        Ok(1)
    }

    fn constant(&mut self, _: i64) -> Result<usize, Infallible> {
        Ok(1)
    }

    fn add_inplace(&mut self, a: &mut usize, b: &usize) -> Result<(), Infallible> {
        *a += b + 1;
        Ok(())
    }

    fn sub_inplace(&mut self, a: &mut usize, b: &usize) -> Result<(), Infallible> {
        *a += b + 1;
        Ok(())
    }

    fn mul_inplace(&mut self, a: &mut usize, b: &usize) -> Result<(), Infallible> {
        *a += b + 1;
        Ok(())
    }

    fn greater_inplace(&mut self, a: &mut usize, b: &usize) -> Result<(), Infallible> {
        *a += b + 1;
        Ok(())
    }
}

impl Expr {
    pub fn constant(n: i64) -> Self {
        Expr::Constant(n)
    }

    pub fn die(faces: i64) -> Self {
        Expr::Die(faces)
    }

    pub fn operator(op: Op, left: Expr, right: Expr) -> Self {
        Expr::Operator { op, left: Box::new(left), right: Box::new(right) }
    }

    #[must_use]
    pub fn greater(self, other: Expr) -> Self {
        Expr::operator(Op::Greater, self, other)
    }

    /// `count` dice with `faces` faces each, summed.
    /// ```
    /// # use std::num::NonZeroU32;
    /// # use diceprob::Expr;
    /// let pool = Expr::pool(NonZeroU32::new(3).unwrap(), 6);
    /// assert_eq!(pool.to_string(), "d6 + d6 + d6");
    /// ```
    pub fn pool(count: NonZeroU32, faces: i64) -> Self {
        (1..count.get()).fold(Expr::die(faces), |acc, _| acc + Expr::die(faces))
    }

    /// Parse `s` with the given strategy, enforcing `limits`.
    pub fn parse_with(s: &str, strategy: Strategy, limits: &Limits) -> Result<Self, ParseError> {
        match strategy {
            Strategy::Descent => parse::parse(s, limits),
            Strategy::Priority => flat::parse(s, limits),
        }
    }

    // Traverse the tree with an Evaluator, children before their parent.
    fn traverse<T, Q: Evaluator<T>>(&self, state: &mut Q) -> Result<T, Q::Error> {
        let mut stack: Vec<Stage> = vec![Stage::Visit(self)];
        let mut values: Vec<T> = Vec::new();
        while let Some(x) = stack.pop() {
            match x {
                Stage::Visit(Expr::Constant(n)) => values.push(state.constant(*n)?),
                Stage::Visit(Expr::Die(faces)) => values.push(state.dice(*faces)?),
                Stage::Visit(Expr::Operator { op, left, right }) => {
                    stack.push(Stage::Collect(*op));
                    stack.push(Stage::Visit(right));
                    stack.push(Stage::Visit(left));
                }
                Stage::Collect(op) => {
                    let (Some(bb), Some(mut aa)) = (values.pop(), values.pop()) else {
                        unreachable!("operator collected with fewer than two values");
                    };
                    match op {
                        Op::Add => state.add_inplace(&mut aa, &bb)?,
                        Op::Sub => state.sub_inplace(&mut aa, &bb)?,
                        Op::Mul => state.mul_inplace(&mut aa, &bb)?,
                        Op::Greater => state.greater_inplace(&mut aa, &bb)?,
                    }
                    values.push(aa);
                }
            }
        }
        debug_assert_eq!(values.len(), 1);
        let Some(top) = values.pop() else { unreachable!("traversal produced no value") };
        Ok(top)
    }

    /// The distribution of outcomes, using the default [`Limits`].
    /// ```
    /// use diceprob::Expr;
    /// let x: Expr = "1d2+1d2".parse().unwrap();
    /// assert_eq!(x.dist::<f64>().unwrap().to_string(), "2 25.00\n3 50.00\n4 25.00");
    /// ```
    pub fn dist<T>(&self) -> Result<Pmf<T>, EvalError>
    where
        for<'b> T: Num + FromPrimitive + Clone + AddAssign<&'b T> + MulAssign<&'b T>,
    {
        self.dist_with(&Limits::default())
    }

    /// The distribution of outcomes, failing if any node exceeds `limits`.
    pub fn dist_with<T>(&self, limits: &Limits) -> Result<Pmf<T>, EvalError>
    where
        for<'b> T: Num + FromPrimitive + Clone + AddAssign<&'b T> + MulAssign<&'b T>,
    {
        let mut e = PmfEvaluator::new(limits);
        self.traverse(&mut e)
    }

    /// Number of constants, dice and operators in the tree.
    /// ```
    /// use diceprob::Expr;
    /// let x: Expr = "3d6 > 10".parse().unwrap();
    /// assert_eq!(x.nodes(), 7);
    /// ```
    pub fn nodes(&self) -> usize {
        let Ok(n) = self.traverse(&mut Nodes);
        n
    }

    /// Smallest and largest possible outcome.
    pub fn bounds(&self) -> Result<(i64, i64), EvalError> {
        let (a, b) = self.traverse(&mut Bounds)?;
        debug_assert!(a <= b);
        Ok((a, b))
    }
}

// Children are detached onto a heap stack first, so dropping a tree of any
// depth never recurses.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        let detach = |e: &mut Expr, stack: &mut Vec<Expr>| {
            if let Expr::Operator { left, right, .. } = e {
                stack.push(mem::replace(&mut **left, Expr::Constant(0)));
                stack.push(mem::replace(&mut **right, Expr::Constant(0)));
            }
        };
        detach(self, &mut stack);
        while let Some(mut e) = stack.pop() {
            detach(&mut e, &mut stack);
        }
    }
}

impl Add<Self> for Expr {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Expr::operator(Op::Add, self, other)
    }
}

impl Sub<Self> for Expr {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Expr::operator(Op::Sub, self, other)
    }
}

impl Mul<Self> for Expr {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Expr::operator(Op::Mul, self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_symbols() {
        for op in Op::ALL {
            assert_eq!(Op::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Op::from_symbol('/'), None);
    }

    #[test]
    fn apply_overflow() {
        assert_eq!(Op::Mul.apply(i64::MAX, 2), None);
        assert_eq!(Op::Sub.apply(i64::MIN, 1), None);
        assert_eq!(Op::Greater.apply(i64::MAX, i64::MIN), Some(1));
        assert_eq!(Op::Greater.apply(3, 3), Some(0));
    }

    #[test]
    fn pool_leans_left() {
        let pool = Expr::pool(NonZeroU32::new(3).unwrap(), 4);
        assert_eq!(pool, (Expr::die(4) + Expr::die(4)) + Expr::die(4));
        assert_eq!(Expr::pool(NonZeroU32::MIN, 4), Expr::die(4));
    }

    #[test]
    fn bounds() {
        let x: Expr = "d6 - 2*d4".parse().unwrap();
        assert_eq!(x.bounds().unwrap(), (-7, 4));
        let y: Expr = "d6 > 6".parse().unwrap();
        assert_eq!(y.bounds().unwrap(), (0, 0));
        let z: Expr = "d6 > 0".parse().unwrap();
        assert_eq!(z.bounds().unwrap(), (1, 1));
        let w: Expr = "d6 > 3".parse().unwrap();
        assert_eq!(w.bounds().unwrap(), (0, 1));
    }

    #[test]
    fn bounds_match_dist() {
        let x: Expr = "(d4 - d6) * d3 + 2".parse().unwrap();
        let dist = x.dist::<f64>().unwrap();
        let (min, max) = x.bounds().unwrap();
        assert_eq!((Some(min), Some(max)), (dist.min_value(), dist.max_value()));
    }

    #[test]
    fn bounds_no_faces() {
        assert_eq!(Expr::die(0).bounds(), Err(EvalError::NoFaces(0)));
    }

    #[test]
    fn deep_tree_traversal() {
        // Deeper than a recursive walk would comfortably handle.
        let mut x = Expr::constant(0);
        for _ in 0..10_000 {
            x = Expr::constant(1) + x;
        }
        assert_eq!(x.bounds().unwrap(), (10_000, 10_000));
        assert_eq!(x.dist::<f64>().unwrap().chance(10_000), Some(&1.0));
        assert_eq!(x.nodes(), 20_001);
    }

    #[test]
    fn drop_long_chains() {
        let mut left = Expr::constant(0);
        let mut right = Expr::constant(0);
        for _ in 0..500_000 {
            left = left + Expr::die(2);
            right = Expr::die(2) * right;
        }
        drop(left);
        drop(right);
    }

    #[test]
    fn nodes() {
        assert_eq!(Expr::constant(1).nodes(), 1);
        assert_eq!(Expr::pool(NonZeroU32::new(4).unwrap(), 6).nodes(), 7);
        let x: Expr = "(d4 - d6) * d3 + 2".parse().unwrap();
        assert_eq!(x.nodes(), 7);
    }
}
