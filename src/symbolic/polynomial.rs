//! # Polynomials over Q and their roots
//!
//! Dense univariate polynomials with rational coefficients, stored in ascending order of powers.
//! The root finder returns exact roots (as [`Number`]s) with multiplicities:
//!
//! 1. the root 0 is split off first,
//! 2. what is left of degree at most two is solved directly,
//! 3. otherwise rational roots are found by the rational root theorem and deflated repeatedly,
//! 4. the rest is split into square-free factors (Yun's algorithm); linear and quadratic factors
//!    are solved in radicals, as are biquadratic factors `r^4 + p r^2 + q`, either through
//!    rational roots of `t^2 + p t + q` or, for a square `q = b^2`, through
//!    `(r^2 + a r + b)(r^2 - a r + b)` with `a^2 = 2b - p`.
//!
//! Whatever remains cannot be expressed in the number field and is reported as
//! [`RootError::Unresolved`].
use crate::symbolic::algebraic_number::{Number, trial_factor};
use crate::symbolic::symbolic_expand::Expanded;
use num::{BigInt, BigRational, Integer};
use num_traits::{One, Signed, Zero};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RootError {
    #[error("the zero polynomial has no finite set of roots")]
    ZeroPolynomial,
    #[error("cannot find the roots of the degree {degree} factor {factor} in closed form")]
    Unresolved { degree: usize, factor: String },
    #[error("root finding was interrupted")]
    Interrupted,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Polynomial {
    coeffs: Vec<BigRational>,
}

impl Polynomial {
    /// coefficients in ascending order, trailing zeros are dropped
    pub fn new(mut coeffs: Vec<BigRational>) -> Polynomial {
        while coeffs.last().is_some_and(|c| c.is_zero()) {
            coeffs.pop();
        }
        Polynomial { coeffs }
    }

    pub fn from_integers(coeffs: &[i64]) -> Polynomial {
        Polynomial::new(
            coeffs
                .iter()
                .map(|c| BigRational::from_integer(BigInt::from(*c)))
                .collect(),
        )
    }

    pub fn zero() -> Polynomial {
        Polynomial::default()
    }

    pub fn one() -> Polynomial {
        Polynomial::new(vec![BigRational::one()])
    }

    /// `None` for the zero polynomial
    pub fn degree(&self) -> Option<usize> {
        if self.coeffs.is_empty() {
            None
        } else {
            Some(self.coeffs.len() - 1)
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    pub fn coeffs(&self) -> &[BigRational] {
        &self.coeffs
    }

    pub fn coeff(&self, power: usize) -> BigRational {
        self.coeffs.get(power).cloned().unwrap_or_else(BigRational::zero)
    }

    pub fn leading(&self) -> Option<&BigRational> {
        self.coeffs.last()
    }

    pub fn eval(&self, x: &BigRational) -> BigRational {
        self.coeffs
            .iter()
            .rev()
            .fold(BigRational::zero(), |acc, c| acc * x + c)
    }

    pub fn eval_number(&self, x: &Number) -> Number {
        self.coeffs.iter().rev().fold(Number::zero(), |acc, c| {
            &(&acc * x) + &Number::from_rational(c.clone())
        })
    }

    pub fn derivative(&self) -> Polynomial {
        Polynomial::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, c)| c * BigRational::from_integer(BigInt::from(k)))
                .collect(),
        )
    }

    pub fn scale(&self, q: &BigRational) -> Polynomial {
        Polynomial::new(self.coeffs.iter().map(|c| c * q).collect())
    }

    /// leading coefficient 1
    pub fn monic(&self) -> Polynomial {
        match self.leading() {
            Some(lead) => self.scale(&lead.recip()),
            None => Polynomial::zero(),
        }
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        Polynomial::new((0..n).map(|k| self.coeff(k) + other.coeff(k)).collect())
    }

    pub fn sub(&self, other: &Polynomial) -> Polynomial {
        let n = self.coeffs.len().max(other.coeffs.len());
        Polynomial::new((0..n).map(|k| self.coeff(k) - other.coeff(k)).collect())
    }

    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        if self.is_zero() || other.is_zero() {
            return Polynomial::zero();
        }
        let mut coeffs = vec![BigRational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] += a * b;
            }
        }
        Polynomial::new(coeffs)
    }

    /// (quotient, remainder), `None` when dividing by zero
    pub fn div_rem(&self, divisor: &Polynomial) -> Option<(Polynomial, Polynomial)> {
        let d_deg = divisor.degree()?;
        let d_lead = divisor.leading()?.clone();
        let mut rem = self.coeffs.clone();
        if rem.len() <= d_deg {
            return Some((Polynomial::zero(), self.clone()));
        }
        let mut quot = vec![BigRational::zero(); rem.len() - d_deg];
        for k in (0..quot.len()).rev() {
            let c = &rem[k + d_deg] / &d_lead;
            if c.is_zero() {
                continue;
            }
            for (j, d) in divisor.coeffs.iter().enumerate() {
                rem[k + j] -= &c * d;
            }
            quot[k] = c;
        }
        rem.truncate(d_deg);
        Some((Polynomial::new(quot), Polynomial::new(rem)))
    }

    /// monic greatest common divisor
    pub fn gcd(&self, other: &Polynomial) -> Polynomial {
        let mut a = self.clone();
        let mut b = other.clone();
        while !b.is_zero() {
            let r = match a.div_rem(&b) {
                Some((_, r)) => r,
                None => break,
            };
            a = b;
            b = r;
        }
        a.monic()
    }

    /// exact quotient, the remainder is discarded
    fn exact_div(&self, divisor: &Polynomial) -> Polynomial {
        self.div_rem(divisor).map(|(q, _)| q).unwrap_or_default()
    }

    /// Yun's square-free decomposition: pairs (a_i, i) with self = lead * prod a_i^i, every a_i
    /// square-free, monic and non-constant
    pub fn squarefree_decomposition(&self) -> Vec<(Polynomial, usize)> {
        let mut result = Vec::new();
        if self.degree().is_none_or(|d| d == 0) {
            return result;
        }
        let f = self.monic();
        let df = f.derivative();
        let a0 = f.gcd(&df);
        let mut b = f.exact_div(&a0);
        let c = df.exact_div(&a0);
        let mut d = c.sub(&b.derivative());
        let mut i = 1;
        while b.degree().is_some_and(|deg| deg > 0) {
            let a = b.gcd(&d);
            b = b.exact_div(&a);
            let c = d.exact_div(&a);
            d = c.sub(&b.derivative());
            if a.degree().is_some_and(|deg| deg > 0) {
                result.push((a, i));
            }
            i += 1;
        }
        result
    }

    /// divides by (x - root), the remainder is discarded
    fn deflate(&self, root: &BigRational) -> Polynomial {
        let n = self.coeffs.len();
        if n < 2 {
            return Polynomial::zero();
        }
        let mut quot = vec![BigRational::zero(); n - 1];
        let mut carry = BigRational::zero();
        for k in (1..n).rev() {
            carry = &self.coeffs[k] + &carry * root;
            quot[k - 1] = carry.clone();
        }
        Polynomial::new(quot)
    }

    /// integer coefficients with the same roots
    fn integer_coefficients(&self) -> Vec<BigInt> {
        let lcm = self
            .coeffs
            .iter()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        self.coeffs
            .iter()
            .map(|c| (c * BigRational::from_integer(lcm.clone())).to_integer())
            .collect()
    }

    /// Roots with multiplicities, see the module documentation for the order.
    ///
    /// # Examples
    /// ```
    /// use RustedVarParam::symbolic::polynomial::Polynomial;
    /// use RustedVarParam::symbolic::algebraic_number::Number;
    /// // r^2 - 2r + 1
    /// let p = Polynomial::from_integers(&[1, -2, 1]);
    /// assert_eq!(p.roots().unwrap(), vec![(Number::one(), 2)]);
    /// ```
    pub fn roots(&self) -> Result<Vec<(Number, usize)>, RootError> {
        self.roots_with(|| false)
    }

    /// like [`Polynomial::roots`], calling `interrupted` between steps and giving up when it
    /// returns true
    pub fn roots_with<F: FnMut() -> bool>(&self, mut interrupted: F) -> Result<Vec<(Number, usize)>, RootError> {
        if self.is_zero() {
            return Err(RootError::ZeroPolynomial);
        }
        if interrupted() {
            return Err(RootError::Interrupted);
        }
        let mut roots: Vec<(Number, usize)> = Vec::new();
        let zeros = self.coeffs.iter().take_while(|c| c.is_zero()).count();
        if zeros > 0 {
            roots.push((Number::zero(), zeros));
        }
        let mut rest = Polynomial::new(self.coeffs[zeros..].to_vec());
        if rest.degree().is_some_and(|d| d <= 2) {
            roots.extend(rest.low_degree_roots()?);
            return Ok(roots);
        }

        for candidate in rational_root_candidates(&rest.integer_coefficients(), &mut interrupted)? {
            if rest.degree().is_none_or(|d| d == 0) {
                break;
            }
            if interrupted() {
                return Err(RootError::Interrupted);
            }
            let mut multiplicity = 0;
            while rest.degree().is_some_and(|d| d > 0) && rest.eval(&candidate).is_zero() {
                rest = rest.deflate(&candidate);
                multiplicity += 1;
            }
            if multiplicity > 0 {
                roots.push((Number::from_rational(candidate), multiplicity));
            }
        }

        for (factor, multiplicity) in rest.squarefree_decomposition() {
            if interrupted() {
                return Err(RootError::Interrupted);
            }
            for root in factor.solve_squarefree()? {
                roots.push((root, multiplicity));
            }
        }
        Ok(roots)
    }

    /// roots of a polynomial of degree at most two, rational roots in candidate order
    fn low_degree_roots(&self) -> Result<Vec<(Number, usize)>, RootError> {
        match self.degree() {
            Some(0) | None => Ok(Vec::new()),
            Some(1) => Ok(vec![(Number::from_rational(-self.coeff(0) / self.coeff(1)), 1)]),
            _ => {
                let monic = self.monic();
                let b = monic.coeff(1);
                let c = monic.coeff(0);
                if (&b * &b - BigRational::from_integer(4.into()) * &c).is_zero() {
                    let half = BigRational::new(1.into(), 2.into());
                    return Ok(vec![(Number::from_rational(-b * half), 2)]);
                }
                let mut result = quadratic_roots(&Number::from_rational(b), &c).ok_or_else(|| monic.unresolved())?;
                if let (Some(r0), Some(r1)) = (result[0].as_rational(), result[1].as_rational()) {
                    if candidate_order(&r1) < candidate_order(&r0) {
                        result.swap(0, 1);
                    }
                }
                Ok(result.into_iter().map(|r| (r, 1)).collect())
            }
        }
    }

    fn unresolved(&self) -> RootError {
        RootError::Unresolved {
            degree: self.degree().unwrap_or(0),
            factor: self.to_string_in("r"),
        }
    }

    /// roots of a monic square-free factor without rational roots
    fn solve_squarefree(&self) -> Result<Vec<Number>, RootError> {
        let unresolved = || self.unresolved();
        match self.degree() {
            Some(1) => Ok(vec![Number::from_rational(-self.coeff(0) / self.coeff(1))]),
            Some(2) => quadratic_roots(&Number::from_rational(self.coeff(1)), &self.coeff(0)).ok_or_else(unresolved),
            Some(4) if self.coeff(1).is_zero() && self.coeff(3).is_zero() => {
                let p = self.coeff(2) / self.coeff(4);
                let q = self.coeff(0) / self.coeff(4);
                biquadratic_rational_t(&p, &q)
                    .or_else(|| biquadratic_square_q(&p, &q))
                    .ok_or_else(unresolved)
            }
            _ => Err(unresolved()),
        }
    }

    /// descending form in the variable `var`, e.g. `r^2 - 2*r + 1`
    pub fn to_string_in(&self, var: &str) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut out = String::new();
        for (k, c) in self.coeffs.iter().enumerate().rev() {
            if c.is_zero() {
                continue;
            }
            let abs = c.abs();
            if out.is_empty() {
                if c.is_negative() {
                    out.push('-');
                }
            } else {
                out.push_str(if c.is_negative() { " - " } else { " + " });
            }
            let coeff = Number::from_rational(abs.clone()).to_string();
            match k {
                0 => out.push_str(&coeff),
                _ => {
                    if !abs.is_one() {
                        out.push_str(&coeff);
                        out.push('*');
                    }
                    out.push_str(var);
                    if k > 1 {
                        out.push_str(&format!("^{}", k));
                    }
                }
            }
        }
        out
    }

    /// polynomial in the independent variable of an expansion; `None` when some term is not
    /// a rational multiple of a non-negative power
    pub fn from_expanded(expanded: &Expanded) -> Option<Polynomial> {
        let mut coeffs: Vec<BigRational> = Vec::new();
        for (m, c) in expanded.terms() {
            if !m.factors.is_empty() || !m.exp_rate.is_zero() || m.x_power < 0 {
                return None;
            }
            let k = m.x_power as usize;
            if coeffs.len() <= k {
                coeffs.resize(k + 1, BigRational::zero());
            }
            coeffs[k] += c.as_rational()?;
        }
        Some(Polynomial::new(coeffs))
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_string_in("x"))
    }
}

/// (-b + sqrt(b^2-4c))/2 and (-b - sqrt(b^2-4c))/2 of r^2 + b r + c, for b with rational b^2
fn quadratic_roots(b: &Number, c: &BigRational) -> Option<Vec<Number>> {
    let disc = (b * b).as_rational()? - BigRational::from_integer(4.into()) * c;
    let sqrt_disc = Number::sqrt_rational(&disc)?;
    let half = BigRational::new(1.into(), 2.into());
    let minus_b = -b;
    Some(vec![
        (&minus_b + &sqrt_disc).scale(&half),
        (&minus_b - &sqrt_disc).scale(&half),
    ])
}

/// r^4 + p r^2 + q with rational roots t of t^2 + p t + q, r = +-sqrt(t)
fn biquadratic_rational_t(p: &BigRational, q: &BigRational) -> Option<Vec<Number>> {
    let disc = p * p - BigRational::from_integer(4.into()) * q;
    let sqrt_disc = Number::sqrt_rational(&disc)?.as_rational()?;
    let two = BigRational::from_integer(2.into());
    let mut result = Vec::new();
    for t in [(-p + &sqrt_disc) / &two, (-p - &sqrt_disc) / &two] {
        let s = Number::sqrt_rational(&t)?;
        result.push(s.clone());
        result.push(-s);
    }
    Some(result)
}

/// r^4 + p r^2 + b^2 = (r^2 + b)^2 - (2b - p) r^2 = (r^2 + a r + b)(r^2 - a r + b), a^2 = 2b - p
fn biquadratic_square_q(p: &BigRational, q: &BigRational) -> Option<Vec<Number>> {
    let b = Number::sqrt_rational(q)?.as_rational()?;
    let two = BigRational::from_integer(2.into());
    let a = Number::sqrt_rational(&(&two * &b - p))?;
    let mut result = quadratic_roots(&a, &b)?;
    result.extend(quadratic_roots(&-&a, &b)?);
    Some(result)
}

/// rank of a rational root candidate: denominator, then |numerator|, positive before negative
fn candidate_order(c: &BigRational) -> (BigInt, BigInt, bool) {
    (c.denom().clone(), c.numer().abs(), c.is_negative())
}

/// Positive divisors of n from its prime powers. A cofactor above the trial-division bound is
/// kept as a single factor, so its own divisors are missed and the roots they would give are
/// reported as unresolved by the square-free stage.
fn positive_divisors<F: FnMut() -> bool>(n: &BigInt, interrupted: &mut F) -> Result<Vec<BigInt>, RootError> {
    let (mut factors, rest) = trial_factor(n);
    if !rest.is_one() {
        factors.push((rest, 1));
    }
    let mut divisors = vec![BigInt::one()];
    for (p, count) in factors {
        if interrupted() {
            return Err(RootError::Interrupted);
        }
        let mut next = Vec::with_capacity(divisors.len() * (count as usize + 1));
        for d in &divisors {
            let mut power = d.clone();
            next.push(power.clone());
            for _ in 0..count {
                power *= &p;
                next.push(power.clone());
            }
        }
        divisors = next;
    }
    divisors.sort();
    Ok(divisors)
}

/// p/q with p | a_0, q | a_n, integers first and then by denominator, each positive before its
/// negative
fn rational_root_candidates<F: FnMut() -> bool>(
    coeffs: &[BigInt],
    interrupted: &mut F,
) -> Result<Vec<BigRational>, RootError> {
    let (Some(a0), Some(an)) = (coeffs.first(), coeffs.last()) else {
        return Ok(Vec::new());
    };
    if coeffs.len() < 2 || a0.is_zero() {
        return Ok(Vec::new());
    }
    let numerators = positive_divisors(a0, interrupted)?;
    let denominators = positive_divisors(an, interrupted)?;
    let unique: BTreeSet<BigRational> = numerators
        .iter()
        .flat_map(|p| denominators.iter().map(move |q| BigRational::new(p.clone(), q.clone())))
        .collect();
    let mut positive: Vec<BigRational> = unique.into_iter().collect();
    positive.sort_by_key(candidate_order);
    Ok(positive.into_iter().flat_map(|c| [c.clone(), -c]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::Expr;
    use approx::assert_relative_eq;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(n.into(), d.into())
    }

    #[test]
    fn test_arithmetic() {
        let a = Polynomial::from_integers(&[-1, 0, 1]); // x^2 - 1
        let b = Polynomial::from_integers(&[1, 1]); // x + 1
        let (quot, rem) = a.div_rem(&b).unwrap();
        assert_eq!(quot, Polynomial::from_integers(&[-1, 1]));
        assert!(rem.is_zero());
        assert_eq!(a.gcd(&Polynomial::from_integers(&[2, 2])), b);
        assert_eq!(quot.mul(&b), a);
        assert_eq!(a.derivative(), Polynomial::from_integers(&[0, 2]));
        assert_eq!(a.eval(&q(3, 1)), q(8, 1));
        assert_eq!(a.to_string_in("r"), "r^2 - 1");
        assert_eq!(Polynomial::from_integers(&[1, -2, 3]).to_string(), "3*x^2 - 2*x + 1");
        assert_eq!(Polynomial::zero().degree(), None);
    }

    #[test]
    fn test_squarefree_decomposition() {
        // (x - 1)^2 (x^2 + 1)
        let p = Polynomial::from_integers(&[1, -2, 2, -2, 1]);
        let d = p.squarefree_decomposition();
        assert_eq!(d, vec![
            (Polynomial::from_integers(&[1, 0, 1]), 1),
            (Polynomial::from_integers(&[-1, 1]), 2),
        ]);
    }

    #[test]
    fn test_real_roots_in_order() {
        let p = Polynomial::from_integers(&[-1, 0, 1]);
        assert_eq!(p.roots().unwrap(), vec![(Number::one(), 1), (Number::from_integer(-1), 1)]);
        // r^3 (2r - 1)
        let p = Polynomial::from_integers(&[0, 0, 0, -1, 2]);
        assert_eq!(p.roots().unwrap(), vec![
            (Number::zero(), 3),
            (Number::from_rational(q(1, 2)), 1)
        ]);
    }

    #[test]
    fn test_complex_and_irrational_roots() {
        let i = Number::i();
        assert_eq!(Polynomial::from_integers(&[1, 0, 1]).roots().unwrap(), vec![(i.clone(), 1), (-&i, 1)]);
        // r^2 + 2r + 5: -1 +- 2i
        let roots = Polynomial::from_integers(&[5, 2, 1]).roots().unwrap();
        assert_eq!(roots[0].0, &Number::from_integer(-1) + &(&Number::from_integer(2) * &i));
        // r^2 - 2
        let roots = Polynomial::from_integers(&[-2, 0, 1]).roots().unwrap();
        let s2 = Number::sqrt_rational(&q(2, 1)).unwrap();
        assert_eq!(roots, vec![(s2.clone(), 1), (-&s2, 1)]);
        // (r^2 + 1)^2
        let roots = Polynomial::from_integers(&[1, 0, 2, 0, 1]).roots().unwrap();
        assert_eq!(roots, vec![(i.clone(), 2), (-&i, 2)]);
        // r^4 + 5r^2 + 4 = (r^2 + 1)(r^2 + 4)
        let roots = Polynomial::from_integers(&[4, 0, 5, 0, 1]).roots().unwrap();
        assert_eq!(roots.len(), 4);
        for (r, m) in &roots {
            assert_eq!(*m, 1);
            assert!(Polynomial::from_integers(&[4, 0, 5, 0, 1]).eval_number(r).is_zero());
        }
    }

    #[test]
    fn test_large_coefficients() {
        // r^2 + (2^63 - 1) is solved without searching divisors
        let p = Polynomial::from_integers(&[i64::MAX, 0, 1]);
        let roots = p.roots().unwrap();
        assert_eq!(roots.len(), 2);
        for (r, m) in &roots {
            assert_eq!(*m, 1);
            assert!(!r.is_real());
            assert!(p.eval_number(r).is_zero());
        }
        // (r - 1)(r^2 + 1000000007)
        let big = 1000000007;
        let p = Polynomial::from_integers(&[-big, big, -1, 1]);
        let roots = p.roots().unwrap();
        assert_eq!(roots[0], (Number::one(), 1));
        assert_eq!(roots.len(), 3);
        for (r, _) in &roots {
            assert!(p.eval_number(r).is_zero());
        }
    }

    #[test]
    fn test_biquadratic_with_complex_squares() {
        // r^4 + 4 = (r^2 + 2r + 2)(r^2 - 2r + 2): roots -1 +- i, 1 +- i
        let p = Polynomial::from_integers(&[4, 0, 0, 0, 1]);
        let roots = p.roots().unwrap();
        let i = Number::i();
        let minus_one = Number::from_integer(-1);
        assert_eq!(roots, vec![
            (&minus_one + &i, 1),
            (&minus_one - &i, 1),
            (&Number::one() + &i, 1),
            (&Number::one() - &i, 1),
        ]);
        // r^4 + 1: the eighth roots of -1
        let p = Polynomial::from_integers(&[1, 0, 0, 0, 1]);
        let roots = p.roots().unwrap();
        assert_eq!(roots.len(), 4);
        for (r, _) in &roots {
            assert!(p.eval_number(r).is_zero());
            assert_relative_eq!(r.approx().norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_unresolved_and_interrupted() {
        // r^3 - 2 has no roots in the number field
        let p = Polynomial::from_integers(&[-2, 0, 0, 1]);
        assert!(matches!(p.roots(), Err(RootError::Unresolved { degree: 3, .. })));
        assert_eq!(Polynomial::zero().roots(), Err(RootError::ZeroPolynomial));
        let p = Polynomial::from_integers(&[-1, 0, 1]);
        assert_eq!(p.roots_with(|| true), Err(RootError::Interrupted));
    }

    #[test]
    fn test_from_expanded() {
        let e = Expanded::from_expr(&Expr::parse_expression("r^2/2 - 3r + 1").unwrap(), "r").unwrap();
        let p = Polynomial::from_expanded(&e).unwrap();
        assert_eq!(p.coeffs(), &[q(1, 1), q(-3, 1), q(1, 2)]);
        let e = Expanded::from_expr(&Expr::parse_expression("r + sin(r)").unwrap(), "r").unwrap();
        assert!(Polynomial::from_expanded(&e).is_none());
    }
}
