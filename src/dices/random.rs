use rand::{Rng, seq::IndexedRandom};

use crate::EvalError;

use super::{Evaluator, Expr, Op};

struct SampleEvaluator<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> SampleEvaluator<'_, R> {
    fn apply(op: Op, a: &mut i64, b: &i64) -> Result<(), EvalError> {
        *a = op.apply(*a, *b).ok_or(EvalError::Overflow { op, left: *a, right: *b })?;
        Ok(())
    }
}

impl<R: Rng + ?Sized> Evaluator<i64> for SampleEvaluator<'_, R> {
    type Error = EvalError;

    fn dice(&mut self, faces: i64) -> Result<i64, EvalError> {
        if faces <= 0 {
            return Err(EvalError::NoFaces(faces));
        }
        Ok(self.rng.random_range(1..=faces))
    }

    fn constant(&mut self, n: i64) -> Result<i64, EvalError> {
        Ok(n)
    }

    fn add_inplace(&mut self, a: &mut i64, b: &i64) -> Result<(), EvalError> {
        Self::apply(Op::Add, a, b)
    }

    fn sub_inplace(&mut self, a: &mut i64, b: &i64) -> Result<(), EvalError> {
        Self::apply(Op::Sub, a, b)
    }

    fn mul_inplace(&mut self, a: &mut i64, b: &i64) -> Result<(), EvalError> {
        Self::apply(Op::Mul, a, b)
    }

    fn greater_inplace(&mut self, a: &mut i64, b: &i64) -> Result<(), EvalError> {
        Self::apply(Op::Greater, a, b)
    }
}

fn random_leaf<R: Rng + ?Sized>(rng: &mut R, max: i64) -> Expr {
    let n = rng.random_range(1..=max);
    if rng.random_bool(0.5) { Expr::die(n) } else { Expr::constant(n) }
}

impl Expr {
    /// Evaluate the expression into a single number, rolling dice using `rng`.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<i64, EvalError> {
        let mut e = SampleEvaluator { rng };
        self.traverse(&mut e)
    }

    /// A random expression with at most `height` levels of operators, whose
    /// constants and face counts are between 1 and `max`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, height: usize, max: i64) -> Expr {
        debug_assert!(max >= 1);
        if height == 0 || rng.random_bool(0.25) {
            return random_leaf(rng, max);
        }
        let op = *Op::ALL.choose(rng).unwrap_or(&Op::Add);
        let left = Expr::random(rng, height - 1, max);
        let right = Expr::random(rng, height - 1, max);
        Expr::operator(op, left, right)
    }
}
