use crate::symbolic::algebraic_number::Number;
use crate::symbolic::quasi_polynomial::QuasiPoly;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_expand::{ExpandError, Expanded, Monomial, TrigKind, trig_frequency, trig_key};
use num::{BigInt, BigRational};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrationError {
    #[error("no elementary antiderivative found for {0}")]
    NoElementaryForm(String),
    #[error("integration was interrupted")]
    Interrupted,
    #[error(transparent)]
    Expand(#[from] ExpandError),
}

type FactorMap = BTreeMap<Expr, i64>;

fn rational(n: i64, d: i64) -> Number {
    Number::from_rational(BigRational::new(BigInt::from(n), BigInt::from(d)))
}

impl Expanded {
    /// SYMBOLIC INTEGRATION

    /// Indefinite integral with respect to the independent variable, without constant of
    /// integration.
    ///
    /// Factors free of the variable (symbols, constant exponentials) are pulled out. The
    /// quasi-polynomial part `x^k e^(ax) cos(bx)...` is integrated exactly; the remaining terms
    /// are grouped by their opaque factors and tried against a short table:
    /// - `x^n` for negative `n`, with `x^-1 -> ln(x)`
    /// - `x^n * ln(x)` by parts
    /// - `k * g'(x) * g(x)^p`, giving `k*ln(g)` for `p = -1` and `k*g^(p+1)/(p+1)` otherwise
    /// - `sin(bx)^m * cos(bx)^p` with a negative power: `sec`, `csc` and their squares directly,
    ///   other powers reduced with `sin^2 = 1 - cos^2` or `cos^2 = 1 - sin^2`
    ///
    /// # Examples
    /// ```
    /// use RustedVarParam::symbolic::symbolic_engine::Expr;
    /// use RustedVarParam::symbolic::symbolic_expand::Expanded;
    /// let e = Expr::parse_expression("-sin(x)/cos(x)").unwrap();
    /// let integral = Expanded::from_expr(&e, "x").unwrap().integrate().unwrap();
    /// assert_eq!(integral.to_string(), "ln(cos(x))");
    /// ```
    pub fn integrate(&self) -> Result<Expanded, IntegrationError> {
        self.integrate_with(|| false)
    }

    /// like [`Expanded::integrate`], giving up with [`IntegrationError::Interrupted`] as soon as
    /// `interrupted` returns true
    pub fn integrate_with<F: FnMut() -> bool>(&self, mut interrupted: F) -> Result<Expanded, IntegrationError> {
        let var = self.var.clone();
        let mut result = Expanded::zero(&var);
        for (free, dependent) in self.group_by_free_factors() {
            if interrupted() {
                return Err(IntegrationError::Interrupted);
            }
            let integral = integrate_dependent(&dependent, &mut interrupted)?;
            result = &result + &integral.mul_monomial(&free, &Number::one());
        }
        Ok(result)
    }
}

/// integral of terms that all depend on the variable
fn integrate_dependent<F: FnMut() -> bool>(
    integrand: &Expanded,
    interrupted: &mut F,
) -> Result<Expanded, IntegrationError> {
    let var = integrand.var.clone();
    let mut quasi = QuasiPoly::zero();
    let mut groups: BTreeMap<FactorMap, Expanded> = BTreeMap::new();
    for (m, c) in integrand.terms() {
        let single = Expanded::from_monomial(&var, m.clone(), c.clone());
        match QuasiPoly::try_from_expanded(&single) {
            Some(q) => quasi = &quasi + &q,
            None => {
                let bare = Monomial {
                    factors: BTreeMap::new(),
                    x_power: m.x_power,
                    exp_rate: m.exp_rate.clone(),
                };
                groups
                    .entry(m.factors.clone())
                    .or_insert_with(|| Expanded::zero(&var))
                    .add_term(bare, c.clone());
            }
        }
    }
    let mut result = quasi.integrate().to_expanded(&var)?;
    for (factors, group) in groups {
        if interrupted() {
            return Err(IntegrationError::Interrupted);
        }
        result = &result + &integrate_group(&factors, &group, interrupted)?;
    }
    Ok(result)
}

/// integral of (sum c x^k e^(ax)) * prod factors
fn integrate_group<F: FnMut() -> bool>(
    factors: &FactorMap,
    group: &Expanded,
    interrupted: &mut F,
) -> Result<Expanded, IntegrationError> {
    let var = group.var.clone();
    let x = Expr::var(&var);
    let integrand = || {
        let mut m = Monomial::unit();
        for (f, p) in factors {
            m.insert_factor(f.clone(), *p);
        }
        group.mul_monomial(&m, &Number::one()).to_string()
    };

    if factors.is_empty() {
        return integrate_negative_powers(group).ok_or_else(|| IntegrationError::NoElementaryForm(integrand()));
    }

    let ln_x = Expr::Ln(x.clone().boxed());
    if factors.len() == 1 && factors.get(&ln_x) == Some(&1) {
        if let Some(result) = integrate_power_times_ln(group, &ln_x) {
            return Ok(result);
        }
    }

    // k * g' * g^p
    for (g, p) in factors {
        let mut rest_monomial = Monomial::unit();
        for (f, q) in factors {
            if f != g {
                rest_monomial.insert_factor(f.clone(), *q);
            }
        }
        let rest = group.mul_monomial(&rest_monomial, &Number::one());
        let dg = Expanded::from_expr(&g.diff(&var), &var)?;
        let Some(k) = rest.ratio_constant(&dg) else {
            continue;
        };
        if *p == -1 {
            let ln_g = Expanded::from_expr(&Expr::Ln(g.clone().boxed()), &var)?;
            return Ok(ln_g.scale(&k));
        }
        let coeff = &k * &rational(1, p + 1);
        return Ok(Expanded::factor(&var, g.clone(), p + 1).scale(&coeff));
    }

    if let Some(result) = integrate_trig_quotient(factors, group, interrupted)? {
        return Ok(result);
    }
    Err(IntegrationError::NoElementaryForm(integrand()))
}

/// (b, m, p) when the factors are exactly sin(bx)^m and cos(bx)^p with one frequency b
fn trig_powers(factors: &FactorMap, var: &str) -> Option<(Number, i64, i64)> {
    let mut beta: Option<Number> = None;
    let (mut m, mut p) = (0, 0);
    for (f, power) in factors {
        let (kind, b) = trig_frequency(f, var)?;
        if beta.as_ref().is_some_and(|existing| *existing != b) {
            return None;
        }
        beta = Some(b);
        match kind {
            TrigKind::Sin => m += power,
            TrigKind::Cos => p += power,
        }
    }
    beta.map(|b| (b, m, p))
}

/// c * sin(bx)^m * cos(bx)^p for a constant c:
/// - int sec = ln((1 + sin)/cos)/b, int csc = ln((1 - cos)/sin)/b
/// - int sec^2 = tan/b, int csc^2 = -cot/b
/// - m >= 2 over a power of cos and p >= 2 over a power of sin are reduced by the Pythagorean
///   identity and integrated term by term
fn integrate_trig_quotient<F: FnMut() -> bool>(
    factors: &FactorMap,
    group: &Expanded,
    interrupted: &mut F,
) -> Result<Option<Expanded>, IntegrationError> {
    let var = group.var.clone();
    let (Some(c), Some((beta, m, p))) = (group.as_constant(), trig_powers(factors, &var)) else {
        return Ok(None);
    };
    let Some(beta_inv) = beta.inv() else {
        return Ok(None);
    };
    let scale = &c * &beta_inv;
    let sin = trig_key(TrigKind::Sin, &beta, &var);
    let cos = trig_key(TrigKind::Cos, &beta, &var);
    let power = |f: &Expr, k: i64| Expanded::factor(&var, f.clone(), k);
    let ln_of = |arg: Expanded| Expanded::from_expr(&Expr::Ln(arg.to_expr().boxed()), &var);
    let one = Expanded::one(&var);
    let result = match (m, p) {
        (0, -1) => ln_of(&(&one + &power(&sin, 1)) * &power(&cos, -1))?.scale(&scale),
        (-1, 0) => ln_of(&(&one - &power(&cos, 1)) * &power(&sin, -1))?.scale(&scale),
        (0, -2) => (&power(&sin, 1) * &power(&cos, -1)).scale(&scale),
        (-2, 0) => (&power(&cos, 1) * &power(&sin, -1)).scale(&-&scale),
        (m, p) if m >= 2 && p < 0 => {
            let rest = power(&sin, m - 2);
            let rewritten = &(&rest * &power(&cos, p)) - &(&rest * &power(&cos, p + 2));
            integrate_dependent(&rewritten.scale(&c), interrupted)?
        }
        (m, p) if p >= 2 && m < 0 => {
            let rest = power(&cos, p - 2);
            let rewritten = &(&rest * &power(&sin, m)) - &(&rest * &power(&sin, m + 2));
            integrate_dependent(&rewritten.scale(&c), interrupted)?
        }
        _ => return Ok(None),
    };
    Ok(Some(result))
}

/// c * x^n for n < 0 without exponentials; x^-1 gives ln(x)
fn integrate_negative_powers(group: &Expanded) -> Option<Expanded> {
    let var = group.var.clone();
    let mut result = Expanded::zero(&var);
    for (m, c) in group.terms() {
        if !m.exp_rate.is_zero() {
            return None;
        }
        let term = if m.x_power == -1 {
            Expanded::factor(&var, Expr::Ln(Expr::var(&var).boxed()), 1).scale(c)
        } else {
            Expanded::quasi_term(&var, c * &rational(1, m.x_power + 1), m.x_power + 1, Number::zero())
        };
        result = &result + &term;
    }
    Some(result)
}

/// int x^n ln(x) dx = x^(n+1) ln(x)/(n+1) - x^(n+1)/(n+1)^2, and ln(x)^2/2 for n = -1
fn integrate_power_times_ln(group: &Expanded, ln_x: &Expr) -> Option<Expanded> {
    let var = group.var.clone();
    let mut result = Expanded::zero(&var);
    for (m, c) in group.terms() {
        if !m.exp_rate.is_zero() {
            return None;
        }
        let n = m.x_power;
        let term = if n == -1 {
            Expanded::factor(&var, ln_x.clone(), 2).scale(&(c * &rational(1, 2)))
        } else {
            let power = Expanded::quasi_term(&var, Number::one(), n + 1, Number::zero());
            let with_ln = (&power * &Expanded::factor(&var, ln_x.clone(), 1)).scale(&rational(1, n + 1));
            let without = power.scale(&rational(1, (n + 1) * (n + 1)));
            (&with_ln - &without).scale(c)
        };
        result = &result + &term;
    }
    Some(result)
}

impl Expr {
    /// indefinite integral of an expression in `var`, without constant of integration
    pub fn integrate(&self, var: &str) -> Result<Expr, IntegrationError> {
        Ok(Expanded::from_expr(self, var)?.integrate()?.to_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn expand(s: &str) -> Expanded {
        Expanded::from_expr(&Expr::parse_expression(s).unwrap(), "x").unwrap()
    }

    /// F' == f numerically
    fn check_antiderivative(f: &str, points: &[f64]) {
        let integrand = Expr::parse_expression(f).unwrap();
        let integral = integrand.integrate("x").unwrap();
        let derivative = integral.diff("x");
        for &p in points {
            assert_relative_eq!(
                derivative.eval_expression(&["x"], &[p]),
                integrand.eval_expression(&["x"], &[p]),
                epsilon = 1e-9,
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_quasi_polynomial_integrals() {
        assert_eq!(expand("x e^x").integrate().unwrap(), expand("x e^x - e^x"));
        assert_eq!(expand("2x").integrate().unwrap(), expand("x^2"));
        assert_eq!(expand("cos(x)").integrate().unwrap(), expand("sin(x)"));
        check_antiderivative("x^2 e^(-x) sin(2x)", &[0.1, 0.8, 1.7]);
        check_antiderivative("3 + x^3 - e^(2x) cos(x)^2", &[0.1, 0.8, 1.7]);
    }

    #[test]
    fn test_logarithmic_integrals() {
        assert_eq!(expand("1/x").integrate().unwrap().to_string(), "ln(x)");
        assert_eq!(expand("x^-3").integrate().unwrap(), expand("-1/(2 x^2)"));
        check_antiderivative("x ln(x)", &[0.5, 1.5]);
        check_antiderivative("ln(x)/x", &[0.5, 1.5]);
        check_antiderivative("(2x + 1)/(x^2 + x + 1)", &[0.5, 1.5]);
        check_antiderivative("-sin(x)/cos(x)", &[0.2, 0.9]);
        check_antiderivative("sin(x) cos(x)^3", &[0.2, 0.9]);
    }

    #[test]
    fn test_trigonometric_quotients() {
        assert_eq!(expand("1/cos(x)^2").integrate().unwrap(), expand("sin(x)/cos(x)"));
        assert_eq!(expand("tan(x)").integrate().unwrap(), expand("-ln(cos(x))"));
        check_antiderivative("1/cos(x)", &[0.2, 0.9, -1.1]);
        check_antiderivative("1/sin(x)", &[0.2, 0.9, 2.5]);
        check_antiderivative("-sin(x)^2/cos(x)", &[0.2, 0.9]);
        check_antiderivative("sin(x)^4/cos(x)", &[0.2, 0.9]);
        check_antiderivative("cos(x)^2/sin(x)", &[0.2, 0.9]);
        check_antiderivative("3 sin(2x)^2/cos(2x)", &[0.1, 0.5]);
        check_antiderivative("sin(x)^2/cos(x)^2", &[0.2, 0.9]);
    }

    #[test]
    fn test_constants_are_pulled_out() {
        let e = Expanded::from_expr(&Expr::parse_expression("c1 e^x + c2 x").unwrap(), "x").unwrap();
        let i = e.integrate().unwrap();
        assert_eq!(i, Expanded::from_expr(&Expr::parse_expression("c1 e^x + c2 x^2/2").unwrap(), "x").unwrap());
    }

    #[test]
    fn test_non_elementary_is_an_error() {
        assert!(matches!(expand("e^x/x").integrate(), Err(IntegrationError::NoElementaryForm(_))));
        assert!(matches!(expand("sin(x)/x").integrate(), Err(IntegrationError::NoElementaryForm(_))));
        assert_eq!(expand("x").integrate_with(|| true), Err(IntegrationError::Interrupted));
    }
}
