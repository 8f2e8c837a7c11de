//! # Quasi-polynomials
//!
//! Exact arithmetic on finite sums
//!
//! ```text
//! sum  c * x^k * exp(lambda*x)
//! ```
//!
//! with algebraic (possibly complex) coefficients `c` and rates `lambda`. Every solution of a
//! homogeneous linear ODE with constant coefficients is of this shape, the set is closed under
//! addition, multiplication and differentiation, and (for `lambda != 0` or `k >= 0`) under
//! integration. The functions `x^k e^(ax) cos(bx)` and `x^k e^(ax) sin(bx)` are represented
//! through Euler's formula, so the whole Wronskian computation happens in this ring and only the
//! final result is converted back to real trigonometric form.
//!
//! Zero testing is exact: the monomials `x^k e^(lambda x)` for distinct `(k, lambda)` are linearly
//! independent, so a quasi-polynomial is zero iff all its stored coefficients are.
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::symbolic_expand::{ExpandError, Expanded, TrigKind, trig_frequency, trig_key};
use num::{BigInt, BigRational, One};
use num_complex::Complex64;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// x^power * exp(rate*x)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuasiTerm {
    pub power: usize,
    pub rate: Number,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct QuasiPoly {
    terms: BTreeMap<QuasiTerm, Number>,
}

/// k!/(k-j)!
fn falling_factorial(k: usize, j: usize) -> BigRational {
    let mut acc = BigInt::one();
    for i in 0..j {
        acc *= BigInt::from(k - i);
    }
    BigRational::from_integer(acc)
}

impl QuasiPoly {
    pub fn zero() -> QuasiPoly {
        QuasiPoly::default()
    }

    pub fn one() -> QuasiPoly {
        QuasiPoly::constant(Number::one())
    }

    pub fn constant(c: Number) -> QuasiPoly {
        QuasiPoly::term(0, Number::zero(), c)
    }

    /// c * x^power * exp(rate*x)
    pub fn term(power: usize, rate: Number, coeff: Number) -> QuasiPoly {
        let mut result = QuasiPoly::zero();
        result.add_term(QuasiTerm { power, rate }, coeff);
        result
    }

    pub fn exponential(rate: Number) -> QuasiPoly {
        QuasiPoly::term(0, rate, Number::one())
    }

    /// x^power * exp(alpha*x) * cos(beta*x) = (x^p e^((a+ib)x) + x^p e^((a-ib)x)) / 2
    pub fn cos_term(power: usize, alpha: &Number, beta: &Number) -> QuasiPoly {
        let half = Number::from_rational(BigRational::new(1.into(), 2.into()));
        let ib = &Number::i() * beta;
        let mut result = QuasiPoly::term(power, alpha + &ib, half.clone());
        result.add_term(QuasiTerm { power, rate: alpha - &ib }, half);
        result
    }

    /// x^power * exp(alpha*x) * sin(beta*x) = (x^p e^((a+ib)x) - x^p e^((a-ib)x)) / (2i)
    pub fn sin_term(power: usize, alpha: &Number, beta: &Number) -> QuasiPoly {
        let half_i = Number::from_radical(-1, BigRational::new(1.into(), 2.into()));
        let ib = &Number::i() * beta;
        let mut result = QuasiPoly::term(power, alpha + &ib, -&half_i);
        result.add_term(QuasiTerm { power, rate: alpha - &ib }, half_i);
        result
    }

    pub fn add_term(&mut self, term: QuasiTerm, coeff: Number) {
        if coeff.is_zero() {
            return;
        }
        let entry = self.terms.entry(term.clone()).or_default();
        *entry += &coeff;
        if entry.is_zero() {
            self.terms.remove(&term);
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (&QuasiTerm, &Number)> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// (coefficient, rate) of a single exponential c*exp(rate*x): the units of the ring
    pub fn as_unit(&self) -> Option<(Number, Number)> {
        if self.terms.len() != 1 {
            return None;
        }
        self.terms
            .iter()
            .next()
            .filter(|(t, _)| t.power == 0)
            .map(|(t, c)| (c.clone(), t.rate.clone()))
    }

    /// multiplicative inverse of a unit
    pub fn inv_unit(&self) -> Option<QuasiPoly> {
        let (c, rate) = self.as_unit()?;
        Some(QuasiPoly::term(0, -&rate, c.inv()?))
    }

    pub fn scale(&self, c: &Number) -> QuasiPoly {
        let mut result = QuasiPoly::zero();
        for (t, coeff) in &self.terms {
            result.add_term(t.clone(), coeff * c);
        }
        result
    }

    pub fn diff(&self) -> QuasiPoly {
        let mut result = QuasiPoly::zero();
        for (t, c) in &self.terms {
            if t.power > 0 {
                let lowered = QuasiTerm { power: t.power - 1, rate: t.rate.clone() };
                result.add_term(lowered, c * &Number::from_integer(t.power as i64));
            }
            result.add_term(t.clone(), c * &t.rate);
        }
        result
    }

    pub fn nth_diff(&self, n: usize) -> QuasiPoly {
        let mut result = self.clone();
        for _ in 0..n {
            result = result.diff();
        }
        result
    }

    /// Antiderivative without integration constant.
    ///
    /// For `lambda != 0`:
    /// `int x^k e^(lambda x) dx = e^(lambda x) * sum_{j=0..k} (-1)^j k!/(k-j)! x^(k-j) / lambda^(j+1)`,
    /// for `lambda = 0` it is `x^(k+1)/(k+1)`.
    pub fn integrate(&self) -> QuasiPoly {
        let mut result = QuasiPoly::zero();
        for (t, c) in &self.terms {
            match t.rate.inv() {
                Some(inv) => {
                    let mut inv_power = inv.clone();
                    for j in 0..=t.power {
                        let sign = if j % 2 == 0 { BigRational::one() } else { -BigRational::one() };
                        let factor = falling_factorial(t.power, j) * sign;
                        let coeff = (c * &inv_power).scale(&factor);
                        result.add_term(QuasiTerm { power: t.power - j, rate: t.rate.clone() }, coeff);
                        inv_power = &inv_power * &inv;
                    }
                }
                None => {
                    let denom = BigRational::from_integer(BigInt::from(t.power + 1));
                    let coeff = c.scale(&denom.recip());
                    result.add_term(QuasiTerm { power: t.power + 1, rate: Number::zero() }, coeff);
                }
            }
        }
        result
    }

    /// value at x = x0 as an exponential sum: sum c*x0^k * exp(lambda*x0), stored with power 0
    pub fn eval_at(&self, x0: &Number) -> QuasiPoly {
        let mut result = QuasiPoly::zero();
        for (t, c) in &self.terms {
            let x_factor = x0.pow(t.power as i64).unwrap_or_else(Number::zero);
            result.add_term(QuasiTerm { power: 0, rate: &t.rate * x0 }, c * &x_factor);
        }
        result
    }

    /// floating point value at x
    pub fn approx(&self, x: f64) -> Complex64 {
        self.terms
            .iter()
            .map(|(t, c)| c.approx() * (t.rate.approx() * x).exp() * x.powi(t.power as i32))
            .sum()
    }

    /// Converts a real-valued quasi-polynomial to x^k e^(ax) {1, cos(bx), sin(bx)} form.
    ///
    /// Conjugate exponentials are recombined with `e^(ibx) = cos(bx) + i sin(bx)`, the frequency
    /// is stored as `b > 0`. Fails when the imaginary parts do not cancel.
    pub fn to_expanded(&self, var: &str) -> Result<Expanded, ExpandError> {
        // (power, alpha, |beta|) -> (cos part, sin part)
        let mut grouped: BTreeMap<(usize, Number, Number), (Number, Number)> = BTreeMap::new();
        for (t, c) in &self.terms {
            let alpha = t.rate.re();
            let beta = t.rate.im();
            let negative = beta.sign_real() == Ordering::Less;
            let b = beta.abs_real();
            let entry = grouped
                .entry((t.power, alpha, b.clone()))
                .or_insert_with(|| (Number::zero(), Number::zero()));
            entry.0 += c;
            if !b.is_zero() {
                let ic = &Number::i() * c;
                if negative {
                    entry.1 += &(-&ic);
                } else {
                    entry.1 += &ic;
                }
            }
        }
        let mut result = Expanded::zero(var);
        for ((power, alpha, b), (cos_part, sin_part)) in grouped {
            if !cos_part.is_real() || !sin_part.is_real() {
                return Err(ExpandError::NonReal(self.to_string()));
            }
            let base = Expanded::quasi_term(var, Number::one(), power as i64, alpha);
            if b.is_zero() {
                result = &result + &base.scale(&cos_part);
                continue;
            }
            let cos = Expanded::factor(var, trig_key(TrigKind::Cos, &b, var), 1);
            let sin = Expanded::factor(var, trig_key(TrigKind::Sin, &b, var), 1);
            result = &result + &(&base * &cos).scale(&cos_part);
            result = &result + &(&base * &sin).scale(&sin_part);
        }
        Ok(result)
    }

    /// real form of an exponential sum as a variable-free constant
    pub fn to_constant_expanded(&self, var: &str) -> Result<Expanded, ExpandError> {
        self.to_expanded(var)?.substitute_var(&Number::one())
    }

    /// quasi-polynomial form of an expansion whose factors are only sin(bx)/cos(bx) to
    /// non-negative powers and whose powers of x are non-negative
    pub fn try_from_expanded(expanded: &Expanded) -> Option<QuasiPoly> {
        let var = &expanded.var;
        let mut result = QuasiPoly::zero();
        for (m, c) in expanded.terms() {
            if m.x_power < 0 {
                return None;
            }
            let mut term = QuasiPoly::term(m.x_power as usize, m.exp_rate.clone(), c.clone());
            for (f, p) in &m.factors {
                if *p < 0 {
                    return None;
                }
                let (kind, beta) = trig_frequency(f, var)?;
                let factor = match kind {
                    TrigKind::Cos => QuasiPoly::cos_term(0, &Number::zero(), &beta),
                    TrigKind::Sin => QuasiPoly::sin_term(0, &Number::zero(), &beta),
                };
                for _ in 0..*p {
                    term = &term * &factor;
                }
            }
            result = &result + &term;
        }
        Some(result)
    }
}

impl fmt::Display for QuasiPoly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        let parts: Vec<String> = self
            .terms
            .iter()
            .map(|(t, c)| {
                let mut s = format!("({})", c);
                if t.power > 0 {
                    s.push_str(&format!("*x^{}", t.power));
                }
                if !t.rate.is_zero() {
                    s.push_str(&format!("*exp(({})*x)", t.rate));
                }
                s
            })
            .collect();
        write!(f, "{}", parts.join(" + "))
    }
}

impl<'a> std::ops::Add<&'a QuasiPoly> for &'a QuasiPoly {
    type Output = QuasiPoly;
    fn add(self, rhs: &QuasiPoly) -> QuasiPoly {
        let mut result = self.clone();
        for (t, c) in &rhs.terms {
            result.add_term(t.clone(), c.clone());
        }
        result
    }
}

impl<'a> std::ops::Sub<&'a QuasiPoly> for &'a QuasiPoly {
    type Output = QuasiPoly;
    fn sub(self, rhs: &QuasiPoly) -> QuasiPoly {
        let mut result = self.clone();
        for (t, c) in &rhs.terms {
            result.add_term(t.clone(), -c);
        }
        result
    }
}

impl<'a> std::ops::Mul<&'a QuasiPoly> for &'a QuasiPoly {
    type Output = QuasiPoly;
    fn mul(self, rhs: &QuasiPoly) -> QuasiPoly {
        let mut result = QuasiPoly::zero();
        for (t1, c1) in &self.terms {
            for (t2, c2) in &rhs.terms {
                let t = QuasiTerm {
                    power: t1.power + t2.power,
                    rate: &t1.rate + &t2.rate,
                };
                result.add_term(t, c1 * c2);
            }
        }
        result
    }
}

impl std::ops::Neg for &QuasiPoly {
    type Output = QuasiPoly;
    fn neg(self) -> QuasiPoly {
        self.scale(&-Number::one())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::Expr;
    use approx::assert_relative_eq;

    fn n(v: i64) -> Number {
        Number::from_integer(v)
    }

    fn expand(s: &str) -> Expanded {
        Expanded::from_expr(&Expr::parse_expression(s).unwrap(), "x").unwrap()
    }

    #[test]
    fn test_trig_terms_are_real() {
        let c = QuasiPoly::cos_term(1, &n(2), &n(3));
        assert_eq!(c.to_expanded("x").unwrap(), expand("x e^(2x) cos(3x)"));
        let s = QuasiPoly::sin_term(0, &n(0), &n(1));
        assert_eq!(s.to_expanded("x").unwrap(), expand("sin(x)"));
        // cos^2 + sin^2 = 1 exactly
        let one = &(&QuasiPoly::cos_term(0, &n(0), &n(1)) * &QuasiPoly::cos_term(0, &n(0), &n(1)))
            + &(&QuasiPoly::sin_term(0, &n(0), &n(1)) * &QuasiPoly::sin_term(0, &n(0), &n(1)));
        assert_eq!(one, QuasiPoly::one());
    }

    #[test]
    fn test_non_real_is_rejected() {
        let z = QuasiPoly::exponential(Number::i());
        assert!(z.to_expanded("x").is_err());
    }

    #[test]
    fn test_diff_and_integrate_are_inverse() {
        let f = &(&QuasiPoly::term(3, n(2), n(5)) + &QuasiPoly::sin_term(1, &n(-1), &n(2)))
            + &QuasiPoly::term(2, n(0), n(7));
        assert_eq!(f.integrate().diff(), f);
        // int x e^x dx = (x - 1) e^x
        let g = QuasiPoly::term(1, n(1), n(1)).integrate();
        assert_eq!(g.to_expanded("x").unwrap(), expand("x e^x - e^x"));
    }

    #[test]
    fn test_units_and_evaluation() {
        let w = QuasiPoly::term(0, n(3), n(-2));
        let inv = w.inv_unit().unwrap();
        assert_eq!(&w * &inv, QuasiPoly::one());
        assert!(QuasiPoly::term(1, n(0), n(1)).inv_unit().is_none());
        let f = &QuasiPoly::term(2, n(1), n(1)) + &QuasiPoly::cos_term(0, &n(0), &n(2));
        let at = f.eval_at(&n(0));
        assert_eq!(at, QuasiPoly::one());
        let v = f.approx(0.7);
        assert_relative_eq!(v.re, 0.49 * 0.7_f64.exp() + 1.4_f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(v.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_from_expanded() {
        let e = expand("x^2 e^x sin(x)^2 + 3");
        let q = QuasiPoly::try_from_expanded(&e).unwrap();
        assert_relative_eq!(
            q.to_expanded("x").unwrap().to_expr().eval_expression(&["x"], &[0.4]),
            e.to_expr().eval_expression(&["x"], &[0.4]),
            epsilon = 1e-12
        );
        assert_relative_eq!(q.approx(0.4).re, e.to_expr().eval_expression(&["x"], &[0.4]), epsilon = 1e-12);
        assert!(QuasiPoly::try_from_expanded(&expand("1/cos(x)")).is_none());
        assert!(QuasiPoly::try_from_expanded(&expand("e^x/x")).is_none());
        assert!(QuasiPoly::try_from_expanded(&expand("ln(x)")).is_none());
    }
}
