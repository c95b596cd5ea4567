use std::fmt;

use super::Pmf;

/// A chance as a percentage with two decimals, rounded half up.
///
/// The digits are produced from an integer, so the decimal separator is
/// always `.`.
/// ```
/// use diceprob::percent;
/// assert_eq!(percent(1.0), "100.00");
/// assert_eq!(percent(1.0 / 6.0), "16.67");
/// assert_eq!(percent(0.000_06), "0.01");
/// ```
pub fn percent(chance: f64) -> String {
    let hundredths = (chance * 100.0 * 100.0).round() as i64;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}

/// One line per outcome, smallest first: the outcome, a space and its
/// chance as a [`percent`].
/// ```
/// use diceprob::Expr;
/// let x: Expr = "1d6>3".parse().unwrap();
/// assert_eq!(x.dist::<f64>().unwrap().to_string(), "0 50.00\n1 50.00");
/// ```
impl fmt::Display for Pmf<f64> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, (n, &p)) in self.iter().enumerate() {
            if i != 0 {
                writeln!(f)?;
            }
            write!(f, "{n} {}", percent(p))?;
        }
        Ok(())
    }
}
