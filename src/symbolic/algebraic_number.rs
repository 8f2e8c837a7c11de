//! # Exact algebraic numbers
//!
//! Elements of the multi-quadratic field Q(i, sqrt(2), sqrt(3), sqrt(5), ...), that is finite sums
//! `q_1 + q_2*sqrt(s_2) + ...` with rational `q_k` and square-free integer `s_k`. A negative
//! `s_k` stands for `I*sqrt(|s_k|)`, so every root of a rational quadratic (real or complex)
//! lives in this type.
//!
//! The representation is canonical: zero coefficients are never stored and the radicals
//! `sqrt(s)` for distinct square-free `s` are linearly independent over Q. Structural equality
//! (`==`, `Hash`, `Ord`) is therefore numeric equality, which is what the root classifier and the
//! quasi-polynomial ring rely on.
//!
//! ## Example
//! ```
//! use RustedVarParam::symbolic::algebraic_number::Number;
//! use num::BigRational;
//! let half = BigRational::new(1.into(), 2.into());
//! let s = Number::sqrt_rational(&half).unwrap(); // sqrt(2)/2
//! assert_eq!(&s * &s, Number::from_rational(half));
//! assert_eq!(s.to_string(), "sqrt(2)/2");
//! ```
use num::{BigInt, BigRational, Integer, One, Signed, ToPrimitive, Zero};
use num_complex::Complex64;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// element of the multi-quadratic field: square-free radicand -> rational coefficient
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Number {
    parts: BTreeMap<i64, BigRational>,
}

fn rational_to_string(q: &BigRational) -> String {
    if q.denom().is_one() {
        q.numer().to_string()
    } else {
        format!("{}/{}", q.numer(), q.denom())
    }
}

/// trial division stops at this bound, the cofactor left above it is classified without
/// being factored
pub(crate) const TRIAL_DIVISION_LIMIT: u64 = 1 << 20;

/// Prime powers of n > 0 found by trial division up to [`TRIAL_DIVISION_LIMIT`], and the
/// cofactor that has no prime factor below the bound (1 when n is fully factored).
pub(crate) fn trial_factor(n: &BigInt) -> (Vec<(BigInt, u32)>, BigInt) {
    let mut rest = n.abs();
    let mut factors = Vec::new();
    let mut p = BigInt::from(2);
    let limit = BigInt::from(TRIAL_DIVISION_LIMIT);
    while p <= limit && &p * &p <= rest {
        let mut count = 0u32;
        while (&rest % &p).is_zero() {
            rest /= &p;
            count += 1;
        }
        if count > 0 {
            factors.push((p.clone(), count));
        }
        p += if p == BigInt::from(2) { 1 } else { 2 };
    }
    if &p * &p > rest && rest > BigInt::one() {
        // no factor up to sqrt(rest): prime
        factors.push((rest, 1));
        rest = BigInt::one();
    }
    (factors, rest)
}

/// Splits m > 0 into (s, t) with m = s*t^2 and s square-free. `None` when a cofactor above
/// the trial-division bound cannot be classified.
fn squarefree_split(m: &BigInt) -> Option<(BigInt, BigInt)> {
    let (factors, rest) = trial_factor(m);
    let mut s = BigInt::one();
    let mut t = BigInt::one();
    for (p, count) in factors {
        if count % 2 == 1 {
            s *= &p;
        }
        t *= p.pow(count / 2);
    }
    if rest.is_one() {
        return Some((s, t));
    }
    // every prime factor of rest exceeds the bound
    let root = rest.sqrt();
    if &root * &root == rest {
        t *= root;
        return Some((s, t));
    }
    let limit = BigInt::from(TRIAL_DIVISION_LIMIT);
    if rest < &limit * &limit * &limit {
        // at most two large primes, not a square: distinct
        s *= rest;
        return Some((s, t));
    }
    None
}

/// product of two basis radicals sqrt(s)*sqrt(t) = coefficient * sqrt(key)
fn basis_product(s: i64, t: i64) -> (i64, i64) {
    let g = s.abs().gcd(&t.abs());
    let key_abs = (s.abs() / g) * (t.abs() / g);
    let key = if (s < 0) != (t < 0) { -key_abs } else { key_abs };
    let coeff = if s < 0 && t < 0 { -g } else { g };
    (key, coeff)
}

/// smallest prime factor of n > 1; a cofactor without factors below the trial-division bound
/// is returned whole and acts as one generator
fn smallest_prime_factor(n: i64) -> i64 {
    let limit = TRIAL_DIVISION_LIMIT as i64;
    let mut p = 2;
    while p <= limit && p * p <= n {
        if n % p == 0 {
            return p;
        }
        p += 1;
    }
    n
}

impl Number {
    pub fn zero() -> Number {
        Number::default()
    }

    pub fn one() -> Number {
        Number::from_rational(BigRational::one())
    }

    /// imaginary unit
    pub fn i() -> Number {
        Number::from_radical(-1, BigRational::one())
    }

    pub fn from_integer(n: i64) -> Number {
        Number::from_rational(BigRational::from_integer(BigInt::from(n)))
    }

    pub fn from_rational(q: BigRational) -> Number {
        Number::from_radical(1, q)
    }

    /// q * sqrt(key) for a square-free key
    pub fn from_radical(key: i64, q: BigRational) -> Number {
        let mut parts = BTreeMap::new();
        if !q.is_zero() {
            parts.insert(key, q);
        }
        Number { parts }
    }

    /// exact square root of a rational number, `None` when the square-free part of the
    /// radicand does not fit into the radical key or cannot be determined
    pub fn sqrt_rational(q: &BigRational) -> Option<Number> {
        if q.is_zero() {
            return Some(Number::zero());
        }
        let m = q.numer().abs() * q.denom();
        let (s, t) = squarefree_split(&m)?;
        let s = s.to_i64()?;
        let key = if q.is_negative() { -s } else { s };
        let coeff = BigRational::new(t, q.denom().clone());
        Some(Number::from_radical(key, coeff))
    }

    pub fn is_zero(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.as_rational().is_some_and(|q| q.is_one())
    }

    pub fn as_rational(&self) -> Option<BigRational> {
        match self.parts.len() {
            0 => Some(BigRational::zero()),
            1 => self.parts.get(&1).cloned(),
            _ => None,
        }
    }

    /// integer value when the number is an integer fitting into i64
    pub fn as_integer(&self) -> Option<i64> {
        let q = self.as_rational()?;
        if q.denom().is_one() {
            q.numer().to_i64()
        } else {
            None
        }
    }

    pub fn is_real(&self) -> bool {
        self.parts.keys().all(|k| *k > 0)
    }

    /// real part
    pub fn re(&self) -> Number {
        Number {
            parts: self
                .parts
                .iter()
                .filter(|(k, _)| **k > 0)
                .map(|(k, q)| (*k, q.clone()))
                .collect(),
        }
    }

    /// imaginary part, itself a real number
    pub fn im(&self) -> Number {
        Number {
            parts: self
                .parts
                .iter()
                .filter(|(k, _)| **k < 0)
                .map(|(k, q)| (-*k, q.clone()))
                .collect(),
        }
    }

    /// complex conjugate
    pub fn conj(&self) -> Number {
        Number {
            parts: self
                .parts
                .iter()
                .map(|(k, q)| if *k < 0 { (*k, -q.clone()) } else { (*k, q.clone()) })
                .collect(),
        }
    }

    pub fn scale(&self, q: &BigRational) -> Number {
        if q.is_zero() {
            return Number::zero();
        }
        Number {
            parts: self.parts.iter().map(|(k, c)| (*k, c * q)).collect(),
        }
    }

    fn add_part(parts: &mut BTreeMap<i64, BigRational>, key: i64, q: BigRational) {
        let entry = parts.entry(key).or_insert_with(BigRational::zero);
        *entry += q;
        if entry.is_zero() {
            parts.remove(&key);
        }
    }

    /// multiplicative inverse, `None` for zero
    pub fn inv(&self) -> Option<Number> {
        if self.is_zero() {
            return None;
        }
        if let Some(q) = self.as_rational() {
            return Some(Number::from_rational(q.recip()));
        }
        // eliminate one generator of the field: x * conj_p(x) no longer contains sqrt(p)
        let generator = self
            .parts
            .keys()
            .filter(|k| k.abs() > 1)
            .map(|k| smallest_prime_factor(k.abs()))
            .min()
            .unwrap_or(-1);
        let contains = |k: i64| {
            if generator == -1 {
                k < 0
            } else {
                k % generator == 0
            }
        };
        let conjugate = Number {
            parts: self
                .parts
                .iter()
                .map(|(k, q)| if contains(*k) { (*k, -q.clone()) } else { (*k, q.clone()) })
                .collect(),
        };
        let norm = self * &conjugate;
        let norm_inv = norm.inv()?;
        Some(&conjugate * &norm_inv)
    }

    pub fn checked_div(&self, rhs: &Number) -> Option<Number> {
        rhs.inv().map(|inv| self * &inv)
    }

    /// integer power, `None` for a negative power of zero
    pub fn pow(&self, n: i64) -> Option<Number> {
        let base = if n < 0 { self.inv()? } else { self.clone() };
        let mut exp = n.unsigned_abs();
        let mut acc = Number::one();
        let mut sq = base;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = &acc * &sq;
            }
            sq = &sq * &sq;
            exp >>= 1;
        }
        Some(acc)
    }

    pub fn approx(&self) -> Complex64 {
        let mut z = Complex64::new(0.0, 0.0);
        for (k, q) in &self.parts {
            let c = q.to_f64().unwrap_or(f64::NAN) * (k.abs() as f64).sqrt();
            if *k < 0 {
                z.im += c;
            } else {
                z.re += c;
            }
        }
        z
    }

    /// real part as f64
    pub fn to_f64(&self) -> f64 {
        self.approx().re
    }

    /// sign of the real part, decided in floating point
    pub fn sign_real(&self) -> Ordering {
        if let Some(q) = self.re().as_rational() {
            return q.cmp(&BigRational::zero());
        }
        self.to_f64().partial_cmp(&0.0).unwrap_or(Ordering::Equal)
    }

    /// |x| for a real number
    pub fn abs_real(&self) -> Number {
        if self.sign_real() == Ordering::Less {
            -self
        } else {
            self.clone()
        }
    }

    /// every stored coefficient is negative: the number prints with a leading minus
    pub fn is_negative(&self) -> bool {
        !self.parts.is_empty() && self.parts.values().all(|q| q.is_negative())
    }

    /// binding strength of the printed form: 1 sum or negated, 2 product or quotient, 4 atom
    pub fn display_precedence(&self) -> u8 {
        if self.parts.len() > 1 || self.is_negative() {
            return 1;
        }
        match self.parts.iter().next() {
            None => 4,
            Some((k, q)) => {
                let bare_integer = *k == 1 && q.denom().is_one();
                let bare_radical = q.is_one() && (*k == -1 || *k > 1);
                if bare_integer || bare_radical { 4 } else { 2 }
            }
        }
    }

    fn term_to_string(key: i64, q: &BigRational) -> String {
        let basis = match key {
            1 => String::new(),
            -1 => "I".to_string(),
            k if k > 1 => format!("sqrt({})", k),
            k => format!("I*sqrt({})", -k),
        };
        if basis.is_empty() {
            return rational_to_string(q);
        }
        let sign = if q.is_negative() { "-" } else { "" };
        let q_abs = q.abs();
        let numer = q_abs.numer();
        let denom = q_abs.denom();
        let head = if numer.is_one() {
            basis
        } else {
            format!("{}*{}", numer, basis)
        };
        if denom.is_one() {
            format!("{}{}", sign, head)
        } else {
            format!("{}{}/{}", sign, head, denom)
        }
    }

    /// display order: rational part, imaginary unit, real radicals, imaginary radicals
    fn display_order(&self) -> Vec<(i64, &BigRational)> {
        let mut terms: Vec<(i64, &BigRational)> = self.parts.iter().map(|(k, q)| (*k, q)).collect();
        terms.sort_by_key(|(k, _)| match *k {
            1 => (0, 0),
            -1 => (1, 0),
            k if k > 0 => (2, k),
            k => (3, -k),
        });
        terms
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "0");
        }
        for (n, (k, q)) in self.display_order().into_iter().enumerate() {
            let term = Number::term_to_string(k, q);
            if n == 0 {
                write!(f, "{}", term)?;
            } else if let Some(stripped) = term.strip_prefix('-') {
                write!(f, " - {}", stripped)?;
            } else {
                write!(f, " + {}", term)?;
            }
        }
        Ok(())
    }
}

impl From<i64> for Number {
    fn from(n: i64) -> Self {
        Number::from_integer(n)
    }
}

impl From<BigRational> for Number {
    fn from(q: BigRational) -> Self {
        Number::from_rational(q)
    }
}

impl<'a> std::ops::Add<&'a Number> for &'a Number {
    type Output = Number;
    fn add(self, rhs: &Number) -> Number {
        let mut parts = self.parts.clone();
        for (k, q) in &rhs.parts {
            Number::add_part(&mut parts, *k, q.clone());
        }
        Number { parts }
    }
}

impl<'a> std::ops::Sub<&'a Number> for &'a Number {
    type Output = Number;
    fn sub(self, rhs: &Number) -> Number {
        let mut parts = self.parts.clone();
        for (k, q) in &rhs.parts {
            Number::add_part(&mut parts, *k, -q.clone());
        }
        Number { parts }
    }
}

impl<'a> std::ops::Mul<&'a Number> for &'a Number {
    type Output = Number;
    fn mul(self, rhs: &Number) -> Number {
        let mut parts = BTreeMap::new();
        for (s, p) in &self.parts {
            for (t, q) in &rhs.parts {
                let (key, coeff) = basis_product(*s, *t);
                Number::add_part(&mut parts, key, p * q * BigRational::from_integer(coeff.into()));
            }
        }
        Number { parts }
    }
}

impl std::ops::Neg for &Number {
    type Output = Number;
    fn neg(self) -> Number {
        Number {
            parts: self.parts.iter().map(|(k, q)| (*k, -q.clone())).collect(),
        }
    }
}

impl std::ops::Add for Number {
    type Output = Number;
    fn add(self, rhs: Number) -> Number {
        &self + &rhs
    }
}

impl std::ops::Sub for Number {
    type Output = Number;
    fn sub(self, rhs: Number) -> Number {
        &self - &rhs
    }
}

impl std::ops::Mul for Number {
    type Output = Number;
    fn mul(self, rhs: Number) -> Number {
        &self * &rhs
    }
}

impl std::ops::Neg for Number {
    type Output = Number;
    fn neg(self) -> Number {
        -&self
    }
}

impl std::ops::AddAssign<&Number> for Number {
    fn add_assign(&mut self, rhs: &Number) {
        for (k, q) in &rhs.parts {
            Number::add_part(&mut self.parts, *k, q.clone());
        }
    }
}
