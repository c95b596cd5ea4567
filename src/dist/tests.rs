use num::{BigInt, BigRational, One};
use rand::{SeedableRng, distr::Distribution};
use rand_chacha::ChaCha20Rng;

use super::*;
use crate::Expr;

fn ratio(a: i64, b: i64) -> BigRational {
    BigRational::new(BigInt::from(a), BigInt::from(b))
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn constant() {
    let c = Pmf::<f64>::new_constant(-3);
    assert_eq!(c.iter().collect::<Vec<_>>(), [(-3, &1.0)]);
}

#[test]
fn uniform() {
    for faces in [1, 2, 6, 20, 100] {
        let d = Pmf::<f64>::new_die(faces).unwrap();
        assert_eq!(d.len(), faces as usize);
        assert_eq!((d.min_value(), d.max_value()), (Some(1), Some(faces)));
        assert!(d.iter().all(|(_, &p)| p == 1.0 / faces as f64));
        assert!((d.total() - 1.0).abs() < 1e-6);
    }
    assert_eq!(Pmf::<f64>::new_die(0), Err(EvalError::NoFaces(0)));
    assert_eq!(Pmf::<f64>::new_die(-1), Err(EvalError::NoFaces(-1)));
}

#[test]
fn mass_preserved() {
    let a = Pmf::<f64>::new_die(6).unwrap();
    let b = Pmf::<f64>::new_die(4).unwrap().map(|p| p / 2.0);
    for op in Op::ALL {
        let c = a.combine(&b, op).unwrap();
        assert!(close(c.total(), a.total() * b.total()), "{op}");
    }
}

#[test]
fn commutative() {
    let x: Expr = "d4 - d3 * 2".parse().unwrap();
    let y: Expr = "d6 > 2".parse().unwrap();
    for op in [Op::Add, Op::Mul] {
        let a = Expr::operator(op, x.clone(), y.clone()).dist::<BigRational>().unwrap();
        let b = Expr::operator(op, y.clone(), x.clone()).dist::<BigRational>().unwrap();
        assert_eq!(a, b, "{op}");
    }
}

#[test]
fn collisions_summed() {
    let d2 = Pmf::<BigRational>::new_die(2).unwrap();
    let product = d2.combine(&d2, Op::Mul).unwrap();
    // (1, 2) and (2, 1) both give 2
    assert_eq!(product.len(), 3);
    assert_eq!(product.chance(1), Some(&ratio(1, 4)));
    assert_eq!(product.chance(2), Some(&ratio(1, 2)));
    assert_eq!(product.chance(4), Some(&ratio(1, 4)));
    let zero = d2.combine(&Pmf::new_constant(0), Op::Mul).unwrap();
    assert_eq!(zero.iter().collect::<Vec<_>>(), [(0, &BigRational::one())]);
}

#[test]
fn greater() {
    let x: Expr = "1d6>3".parse().unwrap();
    let dist = x.dist::<BigRational>().unwrap();
    assert_eq!(dist.iter().collect::<Vec<_>>(), [(0, &ratio(1, 2)), (1, &ratio(1, 2))]);
    let always = Expr::die(6).greater(Expr::constant(0)).dist::<f64>().unwrap();
    assert_eq!(always.len(), 1);
    assert!(close(*always.chance(1).unwrap(), 1.0));
    let exact = Expr::die(6).greater(Expr::constant(0)).dist::<BigRational>().unwrap();
    assert_eq!(exact.iter().collect::<Vec<_>>(), [(1, &BigRational::one())]);
}

#[test]
fn two_d6_plus_three() {
    let x: Expr = "2d6+3>10".parse().unwrap();
    let dist = x.dist::<BigRational>().unwrap();
    // 2d6 > 7 in 15 of 36 rolls
    assert_eq!(dist.chance(1), Some(&ratio(15, 36)));
    assert_eq!(dist.chance(0), Some(&ratio(21, 36)));
}

#[test]
fn subtraction() {
    let x: Expr = "d2 - d2".parse().unwrap();
    let dist = x.dist::<f64>().unwrap();
    assert_eq!(dist.iter().collect::<Vec<_>>(), [(-1, &0.25), (0, &0.5), (1, &0.25)]);
}

#[test]
fn mean_and_variance() {
    let x: Expr = "d6".parse().unwrap();
    let dist = x.dist::<BigRational>().unwrap();
    assert_eq!(dist.mean(), Some(ratio(7, 2)));
    assert_eq!(dist.variance(), Some(ratio(35, 12)));
    let y: Expr = "3d6".parse().unwrap();
    let dist = y.dist::<BigRational>().unwrap();
    assert_eq!(dist.mean(), Some(ratio(21, 2)));
    assert_eq!(dist.variance(), Some(ratio(35, 4)));
}

#[test]
fn f64_matches_exact() {
    let x: Expr = "(d8 - d4) * d3 + (d10 > d6) * 5".parse().unwrap();
    let exact = x.dist::<BigRational>().unwrap();
    let approx = x.dist::<f64>().unwrap();
    assert_eq!(exact.len(), approx.len());
    for ((a, pa), (b, pb)) in exact.iter().zip(approx.iter()) {
        assert_eq!(a, b);
        let pa: f64 = num::ToPrimitive::to_f64(pa).unwrap();
        assert!(close(pa, *pb), "{a}: {pa} vs {pb}");
    }
    assert_eq!(exact.total(), BigRational::one());
}

#[test]
fn sampling() {
    let dist = "d2 + d2".parse::<Expr>().unwrap().dist::<f64>().unwrap();
    let sampler = dist.to_rand_distribution().unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let mut counts = [0usize; 3];
    for _ in 0..40_000 {
        let n = sampler.sample(&mut rng);
        counts[(n - 2) as usize] += 1;
    }
    assert!(counts[1] > counts[0] && counts[1] > counts[2], "{counts:?}");
    assert!((counts[1] as f64 / 40_000.0 - 0.5).abs() < 0.02, "{counts:?}");
}

#[test]
fn sampling_needs_mass() {
    let empty = Pmf::<f64>::new_constant(1).map(|_| 0.0);
    assert!(empty.to_rand_distribution().is_none());
}

#[cfg(feature = "serde")]
#[test]
fn json() {
    let dist = "1d2+1d2".parse::<Expr>().unwrap().dist::<f64>().unwrap();
    let s = serde_json::to_string(&dist).unwrap();
    assert_eq!(s, r#"{"2":0.25,"3":0.5,"4":0.25}"#);
    assert_eq!(serde_json::from_str::<Pmf>(&s).unwrap(), dist);
}
