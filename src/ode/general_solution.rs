//! # General solution assembler
//!
//! Combines the homogeneous part `c1*FSS_1 + ... + cn*FSS_n` with the particular part
//! `u1(x)*FSS_1 + ... + un(x)*FSS_n` into one expansion, and checks candidate solutions by
//! substituting them back into the equation.
use crate::ode::equation_parser::EquationSpec;
use crate::ode::particular_coefficients::ParticularCoefficients;
use crate::ode::root_classifier::{FundamentalSet, HomogeneousSolution};
use crate::ode::vop_error::VopResult;
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::quasi_polynomial::QuasiPoly;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_expand::{Expanded, Monomial};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt;

/// result of the particular stage
#[derive(Clone, Debug, PartialEq)]
pub struct ParticularSolution {
    pub coefficients: ParticularCoefficients,
    /// u_1(x)..u_n(x)
    pub integrated: Vec<Expanded>,
    /// u_1*FSS_1 + ... + u_n*FSS_n
    pub solution: Expanded,
}

impl fmt::Display for ParticularSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.solution)
    }
}

/// Sum of u_i*FSS_i. Quasi-polynomial coefficients are multiplied in the exact ring, so that
/// products of trigonometric factors come out in canonical real form.
pub fn assemble_particular(
    fss: &FundamentalSet,
    coefficients: ParticularCoefficients,
    integrated: Vec<Expanded>,
) -> VopResult<ParticularSolution> {
    let solution = match quasi_product_sum(fss, &integrated)? {
        Some(sum) => sum,
        None => {
            let mut sum = Expanded::zero(&fss.var);
            for (u, basis) in integrated.iter().zip(fss.expanded()) {
                sum = &sum + &(u * &basis);
            }
            sum
        }
    };
    info!("particular solution: {}", solution);
    Ok(ParticularSolution {
        coefficients,
        integrated,
        solution,
    })
}

/// u_1*FSS_1 + ... + u_n*FSS_n in the quasi-polynomial ring, factors free of x (symbols,
/// exp(c)) carried alongside; `None` when some u_i has a part outside the ring
fn quasi_product_sum(fss: &FundamentalSet, integrated: &[Expanded]) -> VopResult<Option<Expanded>> {
    let mut by_constant: BTreeMap<Monomial, QuasiPoly> = BTreeMap::new();
    for (u, basis) in integrated.iter().zip(fss.quasi()) {
        for (free, dependent) in u.group_by_free_factors() {
            let Some(q) = QuasiPoly::try_from_expanded(&dependent) else {
                return Ok(None);
            };
            let entry = by_constant.entry(free).or_insert_with(QuasiPoly::zero);
            *entry = &*entry + &(&q * &basis);
        }
    }
    let mut sum = Expanded::zero(&fss.var);
    for (free, q) in by_constant {
        sum = &sum + &q.to_expanded(&fss.var)?.mul_monomial(&free, &Number::one());
    }
    Ok(Some(sum))
}

/// y = sum c_i*FSS_i + y_p, in expanded form
#[derive(Clone, Debug, PartialEq)]
pub struct GeneralSolution {
    pub var: String,
    pub expanded: Expanded,
    pub constants: Vec<String>,
}

impl GeneralSolution {
    pub fn to_expr(&self) -> Expr {
        self.expanded.to_expr()
    }

    pub fn pretty(&self) -> String {
        format!("y({}) = {}", self.var, self.expanded)
    }
}

impl fmt::Display for GeneralSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.expanded)
    }
}

pub fn assemble_general(homogeneous: &HomogeneousSolution, particular: &ParticularSolution) -> GeneralSolution {
    let expanded = &homogeneous.solution + &particular.solution;
    info!("general solution: {}", expanded);
    GeneralSolution {
        var: homogeneous.fss.var.clone(),
        expanded,
        constants: homogeneous.constants.clone(),
    }
}

/// L[y] - f with L the differential operator of the equation
pub fn residual(spec: &EquationSpec, y: &Expanded) -> VopResult<Expanded> {
    let mut lhs = Expanded::zero(&spec.independent_var);
    let mut derivative = y.clone();
    for (k, a) in spec.characteristic.coeffs().iter().enumerate() {
        if k > 0 {
            derivative = derivative.diff()?;
        }
        lhs = &lhs + &derivative.scale(&Number::from_rational(a.clone()));
    }
    Ok(&lhs - &spec.forcing_expanded)
}

/// outcome of substituting a solution into the equation
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    /// the residual vanishes identically
    pub exact: bool,
    /// largest |L[y] - f| / (1 + |f|) over the finite sample points, constants set to 1
    pub max_residual: f64,
    pub points_checked: usize,
}

impl Verification {
    pub fn is_valid(&self, tolerance: f64) -> bool {
        self.exact || (self.points_checked > 0 && self.max_residual <= tolerance)
    }
}

/// Exact residual check, with a numeric check at `points` when the canonical form cannot
/// decide (identities like sin^2 + cos^2 = 1 between opaque factors are not applied).
pub fn verify(spec: &EquationSpec, y: &Expanded, points: &[f64]) -> VopResult<Verification> {
    let r = residual(spec, y)?;
    if r.is_zero() {
        debug!("residual vanishes identically");
        return Ok(Verification {
            exact: true,
            max_residual: 0.0,
            points_checked: points.len(),
        });
    }
    let residual_expr = r.to_expr();
    let forcing = spec.forcing_expanded.to_expr();
    let mut names = vec![spec.independent_var.clone()];
    names.extend(r.free_symbols());
    let names_ref: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
    let mut max_residual: f64 = 0.0;
    let mut points_checked = 0;
    for &p in points {
        let mut values = vec![1.0; names.len()];
        values[0] = p;
        let value = residual_expr.eval_expression(&names_ref, &values);
        let scale = 1.0 + forcing.eval_expression(&names_ref[..1], &[p]).abs();
        if value.is_finite() && scale.is_finite() {
            max_residual = max_residual.max(value.abs() / scale);
            points_checked += 1;
        }
    }
    debug!("numeric residual {} at {} points", max_residual, points_checked);
    Ok(Verification {
        exact: false,
        max_residual,
        points_checked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Utils::config::SolverConfig;

    fn spec(equation: &str) -> EquationSpec {
        EquationSpec::parse(equation, &SolverConfig::default()).unwrap()
    }

    fn expand(s: &str) -> Expanded {
        Expanded::from_expr(&Expr::parse_expression(s).unwrap(), "x").unwrap()
    }

    #[test]
    fn test_residual_of_known_solutions() {
        let s = spec("y'' - 2y' + y = e^x");
        assert!(residual(&s, &expand("c1 e^x + c2 x e^x + x^2 e^x/2")).unwrap().is_zero());
        assert!(!residual(&s, &expand("x e^x")).unwrap().is_zero());
    }

    #[test]
    fn test_numeric_verification() {
        let s = spec("y'' + y = 1/cos(x)");
        let y = expand("ln(cos(x)) cos(x) + x sin(x)");
        let v = verify(&s, &y, &[0.1, 0.5, 1.0]).unwrap();
        assert!(!v.exact);
        assert_eq!(v.points_checked, 3);
        assert!(v.is_valid(1e-9));
        let wrong = verify(&s, &expand("x sin(x)"), &[0.1, 0.5, 1.0]).unwrap();
        assert!(!wrong.is_valid(1e-6));
    }
}
