//! Finite discrete probability distributions over 64-bit outcomes.
//!
//! A [`Pmf`] maps every possible outcome to its probability, stored sparsely
//! in a [`BTreeMap`] so it is always iterated from the smallest outcome up.

use std::{
    collections::{BTreeMap, btree_map::Entry},
    ops::{AddAssign, MulAssign},
};

use num::{FromPrimitive, Num};
use rand::distr::{
    Distribution,
    uniform::SampleUniform,
    weighted::{Weight, WeightedIndex},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Op;

mod print;
pub use print::percent;
#[cfg(test)]
mod tests;

/// Why a distribution could not be computed.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EvalError {
    #[error("a die needs at least one face, not {0}")]
    NoFaces(i64),
    #[error("{left} {op} {right} does not fit in 64 bits")]
    Overflow { op: Op, left: i64, right: i64 },
    #[error("{outcomes} distinct outcomes exceed the limit of {limit}")]
    TooManyOutcomes { outcomes: usize, limit: usize },
    #[error("'{op}' would combine {pairs} pairs of outcomes, more than the limit of {limit}")]
    TooManyPairs { op: Op, pairs: usize, limit: usize },
    #[error("{0} can't be represented by the probability type")]
    Unrepresentable(i64),
}

/// A probability mass function: the chance of every possible outcome.
///
/// Probabilities have type `T`, e.g. [`f64`] or `BigRational`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct Pmf<T = f64> {
    values: BTreeMap<i64, T>,
}

impl<T> Pmf<T> {
    /// Iterate through the outcomes and their chances, smallest outcome first.
    pub fn iter(&self) -> impl Iterator<Item = (i64, &T)> {
        self.values.iter().map(|(&n, p)| (n, p))
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The chance of outcome `n`, `None` if it can't occur.
    pub fn chance(&self, n: i64) -> Option<&T> {
        self.values.get(&n)
    }

    pub fn min_value(&self) -> Option<i64> {
        self.values.keys().next().copied()
    }

    pub fn max_value(&self) -> Option<i64> {
        self.values.keys().next_back().copied()
    }

    #[must_use]
    pub fn map<U, F: Fn(&T) -> U>(&self, f: F) -> Pmf<U> {
        Pmf { values: self.values.iter().map(|(&n, p)| (n, f(p))).collect() }
    }
}

impl<T> Pmf<T>
where
    for<'b> T: Num + FromPrimitive + Clone + AddAssign<&'b T> + MulAssign<&'b T>,
{
    /// `n` has a 100% chance of occurring.
    pub fn new_constant(n: i64) -> Self {
        Pmf { values: BTreeMap::from([(n, T::one())]) }
    }

    /// A fair die: every outcome from 1 to `faces` is equally likely.
    pub fn new_die(faces: i64) -> Result<Self, EvalError> {
        if faces <= 0 {
            return Err(EvalError::NoFaces(faces));
        }
        let chance = T::one() / T::from_i64(faces).ok_or(EvalError::Unrepresentable(faces))?;
        Ok(Pmf { values: (1..=faces).map(|n| (n, chance.clone())).collect() })
    }

    /// Sum of all chances; one for any distribution built by this crate.
    pub fn total(&self) -> T {
        let mut out = T::zero();
        for p in self.values.values() {
            out += p;
        }
        out
    }

    /// The expected value of the distribution.
    pub fn mean(&self) -> Option<T> {
        let mut out = T::zero();
        for (&n, p) in &self.values {
            let mut thing = T::from_i64(n)?;
            thing *= p;
            out += &thing;
        }
        Some(out)
    }

    /// The [variance](https://en.wikipedia.org/wiki/Variance) of the distribution.
    pub fn variance(&self) -> Option<T> {
        let mean = self.mean()?;
        let mut total = T::zero();
        for (&n, p) in &self.values {
            let d = T::from_i64(n)? - mean.clone();
            let mut v = d.clone() * d;
            v *= p;
            total += &v;
        }
        Some(total)
    }

    /// The distribution of `op` applied to independent outcomes of `self`
    /// and `other`.
    ///
    /// Every pair of outcomes is combined; when several pairs give the same
    /// result their chances are summed.
    /// ```
    /// use diceprob::{Op, Pmf};
    /// let d2 = Pmf::<f64>::new_die(2).unwrap();
    /// let sum = d2.combine(&d2, Op::Add).unwrap();
    /// assert_eq!(sum.iter().collect::<Vec<_>>(), [(2, &0.25), (3, &0.5), (4, &0.25)]);
    /// ```
    pub fn combine(&self, other: &Self, op: Op) -> Result<Self, EvalError> {
        let mut values: BTreeMap<i64, T> = BTreeMap::new();
        for (&a, pa) in &self.values {
            if pa.is_zero() {
                continue;
            }
            for (&b, pb) in &other.values {
                if pb.is_zero() {
                    continue;
                }
                let n = op.apply(a, b).ok_or(EvalError::Overflow { op, left: a, right: b })?;
                let mut p = pa.clone();
                p *= pb;
                match values.entry(n) {
                    Entry::Occupied(mut e) => *e.get_mut() += &p,
                    Entry::Vacant(e) => {
                        e.insert(p);
                    }
                }
            }
        }
        Ok(Pmf { values })
    }
}

impl<T: Weight + SampleUniform + PartialOrd> Pmf<T> {
    /// Convert to a [`Distribution`] over outcomes, useful for sampling.
    /// `None` if no outcome has a positive chance.
    #[must_use]
    pub fn to_rand_distribution(&self) -> Option<impl Distribution<i64> + use<T>> {
        let outcomes: Vec<i64> = self.values.keys().copied().collect();
        let index = WeightedIndex::<T>::new(self.values.values()).ok()?;
        Some(index.map(move |i| outcomes[i]))
    }
}
