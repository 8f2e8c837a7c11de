//! # Expanded normal form
//!
//! A canonical representation of expressions in one independent variable `x`:
//!
//! ```text
//! sum  coefficient * x^k * exp(a*x) * f_1^p_1 * ... * f_m^p_m
//! ```
//!
//! with an exact algebraic `coefficient`, integer `k`, exact rate `a` and opaque factors `f_j`
//! (trigonometric functions, logarithms, non-polynomial denominators, symbols such as `c1`)
//! raised to integer powers. Products are fully distributed, like terms are collected, and the
//! following canonicalisations are applied while expanding:
//!
//! - `e^u` and `exp(u)` agree, constant exponentials `exp(c)` are merged into one factor
//! - `tan(u)` becomes `sin(u)*cos(u)^-1`
//! - `sin(b*x)` / `cos(b*x)` are stored with `b > 0` (the sign moves into the coefficient)
//! - division by a single term inverts it, division by a sum becomes a factor with power -1
//!
//! Two expressions that expand to the same `Expanded` are equal; the converse holds for the
//! quasi-polynomial part of the algebra, which is all the solver needs for its exact checks.
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::symbolic_engine::Expr;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpandError {
    #[error("division by zero in {0}")]
    DivisionByZero(String),
    #[error("exponent {0} is too large to expand")]
    ExponentTooLarge(i64),
    #[error("expression {0} is not real-valued")]
    NonReal(String),
}

const MAX_EXPANDED_POWER: i64 = 64;

/// x^x_power * exp(exp_rate*x) * product of factors
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Monomial {
    pub factors: BTreeMap<Expr, i64>,
    pub x_power: i64,
    pub exp_rate: Number,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrigKind {
    Sin,
    Cos,
}

/// canonical factor sin(b*x) / cos(b*x)
pub fn trig_key(kind: TrigKind, beta: &Number, var: &str) -> Expr {
    let arg = if beta.is_one() {
        Expr::var(var)
    } else {
        Expr::Mul(Expr::Const(beta.clone()).boxed(), Expr::var(var).boxed())
    };
    match kind {
        TrigKind::Sin => Expr::sin(arg.boxed()),
        TrigKind::Cos => Expr::cos(arg.boxed()),
    }
}

/// inverse of `trig_key`: kind and frequency of a canonical trigonometric factor
pub fn trig_frequency(factor: &Expr, var: &str) -> Option<(TrigKind, Number)> {
    let (kind, arg) = match factor {
        Expr::sin(arg) => (TrigKind::Sin, arg),
        Expr::cos(arg) => (TrigKind::Cos, arg),
        _ => return None,
    };
    match arg.as_ref() {
        Expr::Var(name) if name == var => Some((kind, Number::one())),
        Expr::Mul(c, v) => match (c.as_ref(), v.as_ref()) {
            (Expr::Const(beta), Expr::Var(name)) if name == var => Some((kind, beta.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn exp_const_rate(factor: &Expr) -> Option<&Number> {
    match factor {
        Expr::Exp(arg) => arg.as_number(),
        _ => None,
    }
}

impl Monomial {
    pub fn unit() -> Monomial {
        Monomial::default()
    }

    pub fn is_unit(&self) -> bool {
        self.factors.is_empty() && self.x_power == 0 && self.exp_rate.is_zero()
    }

    /// multiplies by factor^power, merging constant exponentials exp(c) into a single factor
    pub fn insert_factor(&mut self, factor: Expr, power: i64) {
        if power == 0 {
            return;
        }
        if let Some(c) = exp_const_rate(&factor) {
            let scaled = c * &Number::from_integer(power);
            let existing = self
                .factors
                .iter()
                .find(|(f, _)| exp_const_rate(f).is_some())
                .map(|(f, p)| (f.clone(), *p));
            let mut total = scaled;
            if let Some((old, old_power)) = existing {
                self.factors.remove(&old);
                if let Some(old_c) = exp_const_rate(&old) {
                    total = &total + &(old_c * &Number::from_integer(old_power));
                }
            }
            if !total.is_zero() {
                self.factors.insert(Expr::Exp(Expr::Const(total).boxed()), 1);
            }
            return;
        }
        let entry = self.factors.entry(factor.clone()).or_insert(0);
        *entry += power;
        if *entry == 0 {
            self.factors.remove(&factor);
        }
    }

    pub fn mul(&self, other: &Monomial) -> Monomial {
        let mut result = self.clone();
        result.x_power += other.x_power;
        result.exp_rate = &result.exp_rate + &other.exp_rate;
        for (f, p) in &other.factors {
            result.insert_factor(f.clone(), *p);
        }
        result
    }

    pub fn inverse(&self) -> Monomial {
        let mut result = Monomial {
            factors: BTreeMap::new(),
            x_power: -self.x_power,
            exp_rate: -&self.exp_rate,
        };
        for (f, p) in &self.factors {
            result.insert_factor(f.clone(), -p);
        }
        result
    }

    pub fn contains_var(&self, var: &str) -> bool {
        self.x_power != 0
            || !self.exp_rate.is_zero()
            || self.factors.keys().any(|f| f.contains_variable(var))
    }

    /// (factors free of `var`, everything else)
    pub fn split_var_free(&self, var: &str) -> (Monomial, Monomial) {
        let mut free = Monomial::unit();
        let mut dependent = Monomial {
            factors: BTreeMap::new(),
            x_power: self.x_power,
            exp_rate: self.exp_rate.clone(),
        };
        for (f, p) in &self.factors {
            if f.contains_variable(var) {
                dependent.factors.insert(f.clone(), *p);
            } else {
                free.factors.insert(f.clone(), *p);
            }
        }
        (free, dependent)
    }

    /// the monomial without `factor`
    pub fn without_factor(&self, factor: &Expr) -> Monomial {
        let mut result = self.clone();
        result.factors.remove(factor);
        result
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expanded {
    pub var: String,
    terms: BTreeMap<Monomial, Number>,
}

impl Expanded {
    pub fn zero(var: &str) -> Expanded {
        Expanded {
            var: var.to_string(),
            terms: BTreeMap::new(),
        }
    }

    pub fn constant(var: &str, value: Number) -> Expanded {
        Expanded::from_monomial(var, Monomial::unit(), value)
    }

    pub fn one(var: &str) -> Expanded {
        Expanded::constant(var, Number::one())
    }

    pub fn from_monomial(var: &str, monomial: Monomial, coeff: Number) -> Expanded {
        let mut result = Expanded::zero(var);
        result.add_term(monomial, coeff);
        result
    }

    /// c * x^k * exp(a*x)
    pub fn quasi_term(var: &str, coeff: Number, power: i64, rate: Number) -> Expanded {
        let monomial = Monomial {
            factors: BTreeMap::new(),
            x_power: power,
            exp_rate: rate,
        };
        Expanded::from_monomial(var, monomial, coeff)
    }

    /// factor^power with coefficient 1
    pub fn factor(var: &str, factor: Expr, power: i64) -> Expanded {
        let mut monomial = Monomial::unit();
        monomial.insert_factor(factor, power);
        Expanded::from_monomial(var, monomial, Number::one())
    }

    pub fn symbol(var: &str, name: &str) -> Expanded {
        Expanded::factor(var, Expr::var(name), 1)
    }

    pub fn add_term(&mut self, monomial: Monomial, coeff: Number) {
        if coeff.is_zero() {
            return;
        }
        let entry = self.terms.entry(monomial.clone()).or_default();
        *entry += &coeff;
        if entry.is_zero() {
            self.terms.remove(&monomial);
        }
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Number)> {
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

    /// value of a term-free or unit-monomial expansion
    pub fn as_constant(&self) -> Option<Number> {
        match self.terms.len() {
            0 => Some(Number::zero()),
            1 => self
                .terms
                .iter()
                .next()
                .filter(|(m, _)| m.is_unit())
                .map(|(_, c)| c.clone()),
            _ => None,
        }
    }

    pub fn single_term(&self) -> Option<(&Monomial, &Number)> {
        if self.terms.len() == 1 {
            self.terms.iter().next()
        } else {
            None
        }
    }

    /// terms grouped by their factors free of the variable: free part -> the rest
    pub fn group_by_free_factors(&self) -> BTreeMap<Monomial, Expanded> {
        let mut groups: BTreeMap<Monomial, Expanded> = BTreeMap::new();
        for (m, c) in &self.terms {
            let (free, dependent) = m.split_var_free(&self.var);
            groups
                .entry(free)
                .or_insert_with(|| Expanded::zero(&self.var))
                .add_term(dependent, c.clone());
        }
        groups
    }

    pub fn scale(&self, c: &Number) -> Expanded {
        let mut result = Expanded::zero(&self.var);
        for (m, coeff) in &self.terms {
            result.add_term(m.clone(), coeff * c);
        }
        result
    }

    pub fn mul_monomial(&self, monomial: &Monomial, c: &Number) -> Expanded {
        let mut result = Expanded::zero(&self.var);
        for (m, coeff) in &self.terms {
            result.add_term(m.mul(monomial), coeff * c);
        }
        result
    }

    pub fn pow(&self, n: u32) -> Expanded {
        let mut acc = Expanded::one(&self.var);
        for _ in 0..n {
            acc = &acc * self;
        }
        acc
    }

    /// 1/self: exact for a single term, an opaque factor with power -1 for a sum
    pub fn reciprocal(&self) -> Result<Expanded, ExpandError> {
        if self.is_zero() {
            return Err(ExpandError::DivisionByZero("1/0".to_string()));
        }
        if let Some((m, c)) = self.single_term() {
            if let Some(inv) = c.inv() {
                return Ok(Expanded::from_monomial(&self.var, m.inverse(), inv));
            }
        }
        // leading coefficient 1, so that proportional denominators share one factor
        let lead_inv = self
            .terms
            .values()
            .next_back()
            .and_then(|c| c.inv())
            .ok_or_else(|| ExpandError::DivisionByZero(self.to_string()))?;
        let key = self.scale(&lead_inv).to_expr();
        Ok(Expanded::factor(&self.var, key, -1).scale(&lead_inv))
    }

    /// true when any term depends on the independent variable
    pub fn contains_var(&self) -> bool {
        self.terms.keys().any(|m| m.contains_var(&self.var))
    }

    /// names of all symbols other than the independent variable
    pub fn free_symbols(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for m in self.terms.keys() {
            for f in m.factors.keys() {
                for name in f.free_symbols_except(&self.var) {
                    names.insert(name);
                }
            }
        }
        names
    }

    /// replaces the symbol `name` by an expansion
    pub fn substitute_symbol(&self, name: &str, value: &Expanded) -> Result<Expanded, ExpandError> {
        let symbol = Expr::var(name);
        let mut result = Expanded::zero(&self.var);
        for (m, c) in &self.terms {
            match m.factors.get(&symbol) {
                None => result.add_term(m.clone(), c.clone()),
                Some(p) => {
                    let rest = Expanded::from_monomial(&self.var, m.without_factor(&symbol), c.clone());
                    let power = if *p >= 0 {
                        value.pow(*p as u32)
                    } else {
                        value.pow(p.unsigned_abs() as u32).reciprocal()?
                    };
                    result = &result + &(&rest * &power);
                }
            }
        }
        Ok(result)
    }

    /// `Some(k)` when self = k * other for a constant k
    pub fn ratio_constant(&self, other: &Expanded) -> Option<Number> {
        if self.is_zero() || other.is_zero() || self.terms.len() != other.terms.len() {
            return None;
        }
        let mut ratio: Option<Number> = None;
        for ((m1, c1), (m2, c2)) in self.terms.iter().zip(other.terms.iter()) {
            if m1 != m2 {
                return None;
            }
            let r = c1.checked_div(c2)?;
            match &ratio {
                None => ratio = Some(r),
                Some(existing) if *existing == r => {}
                Some(_) => return None,
            }
        }
        ratio
    }

    /// derivative with respect to the independent variable
    pub fn diff(&self) -> Result<Expanded, ExpandError> {
        let var = self.var.clone();
        let mut result = Expanded::zero(&var);
        for (m, c) in &self.terms {
            if m.x_power != 0 {
                let mut dm = m.clone();
                dm.x_power -= 1;
                result.add_term(dm, c * &Number::from_integer(m.x_power));
            }
            if !m.exp_rate.is_zero() {
                result.add_term(m.clone(), c * &m.exp_rate);
            }
            for (f, p) in &m.factors {
                if !f.contains_variable(&var) {
                    continue;
                }
                let mut rest = m.without_factor(f);
                rest.insert_factor(f.clone(), p - 1);
                let df = Expanded::from_expr(&f.diff(&var), &var)?;
                result = &result + &df.mul_monomial(&rest, &(c * &Number::from_integer(*p)));
            }
        }
        Ok(result)
    }

    pub fn nth_diff(&self, n: usize) -> Result<Expanded, ExpandError> {
        let mut result = self.clone();
        for _ in 0..n {
            result = result.diff()?;
        }
        Ok(result)
    }

    /// exact value at x = x0 as a variable-free expansion
    pub fn substitute_var(&self, x0: &Number) -> Result<Expanded, ExpandError> {
        let var = self.var.clone();
        let mut result = Expanded::zero(&var);
        for (m, c) in &self.terms {
            let x_factor = x0
                .pow(m.x_power)
                .ok_or_else(|| ExpandError::DivisionByZero(format!("{}^{}", var, m.x_power)))?;
            let mut term = Expanded::constant(&var, c * &x_factor);
            let rate = &m.exp_rate * x0;
            if !rate.is_zero() {
                term = &term * &Expanded::factor(&var, Expr::Exp(Expr::Const(rate).boxed()), 1);
            }
            for (f, p) in &m.factors {
                let value = f.set_variable(&var, x0).simplify_();
                let expanded = Expanded::from_expr(&value, &var)?;
                let powered = if *p >= 0 {
                    expanded.pow(*p as u32)
                } else {
                    expanded.pow(p.unsigned_abs() as u32).reciprocal()?
                };
                term = &term * &powered;
            }
            result = &result + &term;
        }
        Ok(result)
    }

    /// EXPANSION

    /// Expands an expression into the canonical form.
    ///
    /// # Example
    /// ```
    /// use RustedVarParam::symbolic::symbolic_engine::Expr;
    /// use RustedVarParam::symbolic::symbolic_expand::Expanded;
    /// let e = Expr::parse_expression("(x + 1)^2 - x^2").unwrap();
    /// assert_eq!(Expanded::from_expr(&e, "x").unwrap().to_string(), "1 + 2*x");
    /// ```
    pub fn from_expr(expr: &Expr, var: &str) -> Result<Expanded, ExpandError> {
        match expr {
            Expr::Var(name) if name == var => Ok(Expanded::quasi_term(var, Number::one(), 1, Number::zero())),
            Expr::Var(name) => Ok(Expanded::symbol(var, name)),
            Expr::Const(n) => Ok(Expanded::constant(var, n.clone())),
            Expr::Add(lhs, rhs) => {
                Ok(&Expanded::from_expr(lhs, var)? + &Expanded::from_expr(rhs, var)?)
            }
            Expr::Sub(lhs, rhs) => {
                Ok(&Expanded::from_expr(lhs, var)? - &Expanded::from_expr(rhs, var)?)
            }
            Expr::Mul(lhs, rhs) => {
                Ok(&Expanded::from_expr(lhs, var)? * &Expanded::from_expr(rhs, var)?)
            }
            Expr::Div(lhs, rhs) => {
                let denominator = Expanded::from_expr(rhs, var)?;
                if denominator.is_zero() {
                    return Err(ExpandError::DivisionByZero(expr.to_string()));
                }
                Ok(&Expanded::from_expr(lhs, var)? * &denominator.reciprocal()?)
            }
            Expr::Pow(base, exp) => Expanded::expand_power(base, exp, var),
            Expr::Exp(arg) => Expanded::expand_exp(&Expanded::from_expr(arg, var)?),
            Expr::Ln(arg) => Expanded::expand_ln(&Expanded::from_expr(arg, var)?),
            Expr::sin(arg) => Expanded::expand_trig(TrigKind::Sin, &Expanded::from_expr(arg, var)?),
            Expr::cos(arg) => Expanded::expand_trig(TrigKind::Cos, &Expanded::from_expr(arg, var)?),
            Expr::tg(arg) => {
                let a = Expanded::from_expr(arg, var)?;
                let sin = Expanded::expand_trig(TrigKind::Sin, &a)?;
                let cos = Expanded::expand_trig(TrigKind::Cos, &a)?;
                Ok(&sin * &cos.reciprocal()?)
            }
        }
    }

    fn expand_power(base: &Expr, exp: &Expr, var: &str) -> Result<Expanded, ExpandError> {
        if let Expr::Exp(inner) = base {
            let product = Expr::Mul(Box::new(exp.clone()), inner.clone());
            return Expanded::from_expr(&Expr::Exp(product.boxed()), var);
        }
        if exp.contains_variable(var) || !exp.is_constant() {
            // b^e = exp(e*ln(b))
            let rewritten = Expr::Exp(Expr::Mul(Box::new(exp.clone()), Expr::Ln(Box::new(base.clone())).boxed()).boxed());
            return Expanded::from_expr(&rewritten, var);
        }
        let e = exp.fold_constant();
        let b = Expanded::from_expr(base, var)?;
        if let Some(k) = e.as_ref().and_then(|n| n.as_integer()) {
            if k.abs() > MAX_EXPANDED_POWER && b.single_term().is_none() {
                return Err(ExpandError::ExponentTooLarge(k));
            }
            if let Some((m, c)) = b.single_term() {
                let coeff = c
                    .pow(k)
                    .ok_or_else(|| ExpandError::DivisionByZero(format!("0^{}", k)))?;
                let mut monomial = Monomial {
                    factors: BTreeMap::new(),
                    x_power: m.x_power * k,
                    exp_rate: &m.exp_rate * &Number::from_integer(k),
                };
                for (f, p) in &m.factors {
                    monomial.insert_factor(f.clone(), p * k);
                }
                return Ok(Expanded::from_monomial(var, monomial, coeff));
            }
            return if k >= 0 {
                Ok(b.pow(k as u32))
            } else {
                b.pow(k.unsigned_abs() as u32).reciprocal()
            };
        }
        if let (Some(c), Some(power)) = (b.as_constant(), e.as_ref()) {
            let folded = Expr::Pow(Expr::Const(c).boxed(), Expr::Const(power.clone()).boxed()).simplify_();
            if let Expr::Const(n) = folded {
                return Ok(Expanded::constant(var, n));
            }
        }
        let exponent = match e {
            Some(n) => Expr::Const(n),
            None => exp.clone(),
        };
        Ok(Expanded::factor(var, Expr::Pow(b.to_expr().boxed(), exponent.boxed()), 1))
    }

    fn expand_exp(arg: &Expanded) -> Result<Expanded, ExpandError> {
        let var = arg.var.clone();
        let mut rate = Number::zero();
        let mut constant = Number::zero();
        let mut rest = Expanded::zero(&var);
        for (m, c) in arg.terms() {
            if m.is_unit() {
                constant = &constant + c;
            } else if m.factors.is_empty() && m.x_power == 1 && m.exp_rate.is_zero() {
                rate = &rate + c;
            } else {
                rest.add_term(m.clone(), c.clone());
            }
        }
        let mut monomial = Monomial {
            factors: BTreeMap::new(),
            x_power: 0,
            exp_rate: rate,
        };
        if !constant.is_zero() {
            monomial.insert_factor(Expr::Exp(Expr::Const(constant).boxed()), 1);
        }
        if !rest.is_zero() {
            monomial.insert_factor(Expr::Exp(rest.to_expr().boxed()), 1);
        }
        Ok(Expanded::from_monomial(&var, monomial, Number::one()))
    }

    fn expand_ln(arg: &Expanded) -> Result<Expanded, ExpandError> {
        let var = arg.var.clone();
        if arg.is_zero() {
            return Err(ExpandError::DivisionByZero("ln(0)".to_string()));
        }
        if let Some((m, c)) = arg.single_term() {
            // ln(exp(c0)*exp(a*x)) = c0 + a*x
            let only_exponentials = c.is_one()
                && m.x_power == 0
                && m.factors.keys().all(|f| exp_const_rate(f).is_some());
            if only_exponentials {
                let mut result = Expanded::quasi_term(&var, m.exp_rate.clone(), 1, Number::zero());
                for f in m.factors.keys() {
                    if let Some(c0) = exp_const_rate(f) {
                        result = &result + &Expanded::constant(&var, c0.clone());
                    }
                }
                return Ok(result);
            }
        }
        Ok(Expanded::factor(&var, Expr::Ln(arg.to_expr().boxed()), 1))
    }

    fn expand_trig(kind: TrigKind, arg: &Expanded) -> Result<Expanded, ExpandError> {
        let var = arg.var.clone();
        if arg.is_zero() {
            return Ok(match kind {
                TrigKind::Sin => Expanded::zero(&var),
                TrigKind::Cos => Expanded::one(&var),
            });
        }
        // linear argument b*x or a constant: canonical sign b > 0
        let linear = arg.single_term().and_then(|(m, c)| {
            let is_linear = m.factors.is_empty() && m.exp_rate.is_zero() && (m.x_power == 1 || m.x_power == 0);
            if is_linear && c.is_real() { Some((m.x_power, c.clone())) } else { None }
        });
        if let Some((power, beta)) = linear {
            let negative = beta.sign_real() == Ordering::Less;
            let beta = beta.abs_real();
            let key = if power == 1 {
                trig_key(kind, &beta, &var)
            } else {
                match kind {
                    TrigKind::Sin => Expr::sin(Expr::Const(beta).boxed()),
                    TrigKind::Cos => Expr::cos(Expr::Const(beta).boxed()),
                }
            };
            let sign = if negative && kind == TrigKind::Sin { -Number::one() } else { Number::one() };
            return Ok(Expanded::factor(&var, key, 1).scale(&sign));
        }
        let key = match kind {
            TrigKind::Sin => Expr::sin(arg.to_expr().boxed()),
            TrigKind::Cos => Expr::cos(arg.to_expr().boxed()),
        };
        Ok(Expanded::factor(&var, key, 1))
    }

    /// CONVERSION BACK TO EXPRESSION TREES

    fn term_to_expr(&self, m: &Monomial, coeff_abs: &Number) -> Expr {
        let var = Expr::var(&self.var);
        let mut numerator: Vec<Expr> = Vec::new();
        let mut denominator: Vec<Expr> = Vec::new();
        let power_of = |base: Expr, p: i64| if p == 1 { base } else { base.pow(Expr::num(p)) };
        // constants and symbols lead: c1*x*exp(x)*sin(x)
        let (free, dependent) = m.split_var_free(&self.var);
        for (f, p) in &free.factors {
            if *p > 0 {
                numerator.push(power_of(f.clone(), *p));
            } else {
                denominator.push(power_of(f.clone(), -*p));
            }
        }
        if m.x_power > 0 {
            numerator.push(power_of(var.clone(), m.x_power));
        } else if m.x_power < 0 {
            denominator.push(power_of(var.clone(), -m.x_power));
        }
        if !m.exp_rate.is_zero() {
            let arg = if m.exp_rate.is_one() {
                var.clone()
            } else {
                Expr::Mul(Expr::Const(m.exp_rate.clone()).boxed(), var.clone().boxed())
            };
            numerator.push(arg.exp());
        }
        for (f, p) in &dependent.factors {
            if *p > 0 {
                numerator.push(power_of(f.clone(), *p));
            } else {
                denominator.push(power_of(f.clone(), -*p));
            }
        }
        let product = |items: Vec<Expr>| items.into_iter().reduce(|acc, e| Expr::Mul(acc.boxed(), e.boxed()));
        let mut num = product(numerator);
        if let Some(q) = coeff_abs.as_rational() {
            let p = q.numer().clone();
            let d = q.denom().clone();
            let p_expr = Expr::rational(num::BigRational::from_integer(p.clone()));
            num = match num {
                Some(n) if num::One::is_one(&p) => Some(n),
                Some(n) => Some(Expr::Mul(p_expr.boxed(), n.boxed())),
                None => Some(p_expr),
            };
            if !num::One::is_one(&d) {
                denominator.insert(0, Expr::rational(num::BigRational::from_integer(d)));
            }
        } else {
            num = match num {
                Some(n) => Some(Expr::Mul(Expr::Const(coeff_abs.clone()).boxed(), n.boxed())),
                None => Some(Expr::Const(coeff_abs.clone())),
            };
        }
        let num = num.unwrap_or_else(|| Expr::num(1));
        match product(denominator) {
            Some(den) => Expr::Div(num.boxed(), den.boxed()),
            None => num,
        }
    }

    /// expression tree of the expansion, terms in canonical order
    pub fn to_expr(&self) -> Expr {
        let mut result: Option<Expr> = None;
        for (m, c) in &self.terms {
            let negative = c.is_negative();
            let coeff_abs = if negative { -c } else { c.clone() };
            let term = self.term_to_expr(m, &coeff_abs);
            result = Some(match (result, negative) {
                (None, false) => term,
                (None, true) => -term,
                (Some(acc), false) => Expr::Add(acc.boxed(), term.boxed()),
                (Some(acc), true) => Expr::Sub(acc.boxed(), term.boxed()),
            });
        }
        result.unwrap_or_else(|| Expr::num(0))
    }
}

impl fmt::Display for Expanded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_expr())
    }
}

impl<'a> std::ops::Add<&'a Expanded> for &'a Expanded {
    type Output = Expanded;
    fn add(self, rhs: &Expanded) -> Expanded {
        debug_assert_eq!(self.var, rhs.var);
        let mut result = self.clone();
        for (m, c) in &rhs.terms {
            result.add_term(m.clone(), c.clone());
        }
        result
    }
}

impl<'a> std::ops::Sub<&'a Expanded> for &'a Expanded {
    type Output = Expanded;
    fn sub(self, rhs: &Expanded) -> Expanded {
        debug_assert_eq!(self.var, rhs.var);
        let mut result = self.clone();
        for (m, c) in &rhs.terms {
            result.add_term(m.clone(), -c);
        }
        result
    }
}

impl<'a> std::ops::Mul<&'a Expanded> for &'a Expanded {
    type Output = Expanded;
    fn mul(self, rhs: &Expanded) -> Expanded {
        debug_assert_eq!(self.var, rhs.var);
        let mut result = Expanded::zero(&self.var);
        for (m1, c1) in &self.terms {
            for (m2, c2) in &rhs.terms {
                result.add_term(m1.mul(m2), c1 * c2);
            }
        }
        result
    }
}

impl std::ops::Neg for &Expanded {
    type Output = Expanded;
    fn neg(self) -> Expanded {
        self.scale(&-Number::one())
    }
}
