use std::ops::{AddAssign, MulAssign};

use num::{FromPrimitive, Num};

use crate::{EvalError, Pmf};

use super::{Evaluator, Limits, Op};

pub(crate) struct PmfEvaluator<'a> {
    limits: &'a Limits,
}

impl<'a> PmfEvaluator<'a> {
    pub(crate) fn new(limits: &'a Limits) -> Self {
        PmfEvaluator { limits }
    }

    fn combine_inplace<T>(&self, op: Op, a: &mut Pmf<T>, b: &Pmf<T>) -> Result<(), EvalError>
    where
        for<'b> T: Num + FromPrimitive + Clone + AddAssign<&'b T> + MulAssign<&'b T>,
    {
        let pairs = a.len().saturating_mul(b.len());
        if pairs > self.limits.max_pairs {
            return Err(EvalError::TooManyPairs { op, pairs, limit: self.limits.max_pairs });
        }
        let res = a.combine(b, op)?;
        log::trace!("{} x {} outcomes under '{op}' gave {}", a.len(), b.len(), res.len());
        if res.len() > self.limits.max_outcomes {
            return Err(EvalError::TooManyOutcomes { outcomes: res.len(), limit: self.limits.max_outcomes });
        }
        *a = res;
        Ok(())
    }
}

impl<T> Evaluator<Pmf<T>> for PmfEvaluator<'_>
where
    for<'b> T: Num + FromPrimitive + Clone + AddAssign<&'b T> + MulAssign<&'b T>,
{
    type Error = EvalError;

    fn dice(&mut self, faces: i64) -> Result<Pmf<T>, EvalError> {
        if faces > 0 && faces as u64 > self.limits.max_outcomes as u64 {
            return Err(EvalError::TooManyOutcomes { outcomes: faces as usize, limit: self.limits.max_outcomes });
        }
        Pmf::new_die(faces)
    }

    fn constant(&mut self, n: i64) -> Result<Pmf<T>, EvalError> {
        Ok(Pmf::new_constant(n))
    }

    fn add_inplace(&mut self, a: &mut Pmf<T>, b: &Pmf<T>) -> Result<(), EvalError> {
        self.combine_inplace(Op::Add, a, b)
    }

    fn sub_inplace(&mut self, a: &mut Pmf<T>, b: &Pmf<T>) -> Result<(), EvalError> {
        self.combine_inplace(Op::Sub, a, b)
    }

    fn mul_inplace(&mut self, a: &mut Pmf<T>, b: &Pmf<T>) -> Result<(), EvalError> {
        self.combine_inplace(Op::Mul, a, b)
    }

    fn greater_inplace(&mut self, a: &mut Pmf<T>, b: &Pmf<T>) -> Result<(), EvalError> {
        self.combine_inplace(Op::Greater, a, b)
    }
}
