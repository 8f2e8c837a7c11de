//! # Particular coefficient solver
//!
//! Solves `W * U' = (0, ..., 0, f/a_n)` for the derivatives of the variation coefficients. With
//! Cramer's rule and expansion of the replaced column the solution is
//!
//! ```text
//! u_i' = f * C(n-1, i) / (a_n * det W)
//! ```
//!
//! where `C(n-1, i)` are the cofactors of the last row and `a_n` is the leading coefficient of
//! the characteristic polynomial, so that the system belongs to the normalized operator. The Wronskian of a fundamental set is
//! `W(0) * exp((sum of roots) * x)`, a unit of the quasi-polynomial ring, so the division is exact.
use crate::ode::equation_parser::EquationSpec;
use crate::ode::vop_error::{VopError, VopResult};
use crate::ode::wronskian::Wronskian;
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::quasi_polynomial::QuasiPoly;
use crate::symbolic::symbolic_expand::Expanded;
use log::{debug, info};
use std::fmt;

/// u_i'(x): exact when the forcing is a quasi-polynomial, an expansion otherwise
#[derive(Clone, Debug, PartialEq)]
pub enum CoefficientDerivative {
    Exact(QuasiPoly),
    Symbolic(Expanded),
}

impl CoefficientDerivative {
    pub fn to_expanded(&self, var: &str) -> VopResult<Expanded> {
        match self {
            CoefficientDerivative::Exact(q) => Ok(q.to_expanded(var)?),
            CoefficientDerivative::Symbolic(e) => Ok(e.clone()),
        }
    }
}

impl fmt::Display for CoefficientDerivative {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CoefficientDerivative::Exact(q) => match q.to_expanded("x") {
                Ok(e) => write!(f, "{}", e),
                Err(_) => write!(f, "{}", q),
            },
            CoefficientDerivative::Symbolic(e) => write!(f, "{}", e),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParticularCoefficients {
    pub wronskian: Wronskian,
    pub determinant: QuasiPoly,
    pub derivatives: Vec<CoefficientDerivative>,
}

pub fn solve_coefficients(wronskian: Wronskian, spec: &EquationSpec) -> VopResult<ParticularCoefficients> {
    let var = spec.independent_var.as_str();
    let (determinant, cofactors) = wronskian.matrix.determinant_with_last_row_cofactors();
    if determinant.is_zero() {
        return Err(VopError::SingularWronskian("the determinant is identically zero".to_string()));
    }
    let det_inv = determinant.inv_unit().ok_or_else(|| {
        VopError::SingularWronskian(format!("the determinant {} is not an exponential monomial", determinant))
    })?;
    info!("Wronskian determinant: {}", determinant.to_expanded(var)?);

    let lead = spec
        .characteristic
        .leading()
        .ok_or_else(|| VopError::DegreeMismatch("the characteristic polynomial is zero".to_string()))?;
    let normalization = Number::from_rational(lead.recip());
    let forcing_qp = spec.forcing_qp.as_ref().map(|f| f.scale(&normalization));
    let forcing_expanded = spec.forcing_expanded.scale(&normalization);

    let mut derivatives = Vec::with_capacity(cofactors.len());
    for (i, cofactor) in cofactors.iter().enumerate() {
        let weight = cofactor * &det_inv;
        let derivative = match &forcing_qp {
            Some(f) => CoefficientDerivative::Exact(&weight * f),
            None => CoefficientDerivative::Symbolic(&weight.to_expanded(var)? * &forcing_expanded),
        };
        debug!("u{}' = {}", i + 1, derivative.to_expanded(var)?);
        derivatives.push(derivative);
    }
    Ok(ParticularCoefficients {
        wronskian,
        determinant,
        derivatives,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Utils::config::SolverConfig;
    use crate::ode::limits::SolverLimits;
    use crate::ode::root_classifier::solve_homogeneous;
    use crate::symbolic::symbolic_engine::Expr;

    fn coefficients(equation: &str) -> (EquationSpec, ParticularCoefficients) {
        let spec = EquationSpec::parse(equation, &SolverConfig::default()).unwrap();
        let h = solve_homogeneous(&spec, &SolverLimits::unlimited()).unwrap();
        let c = solve_coefficients(Wronskian::build(&h.fss), &spec).unwrap();
        (spec, c)
    }

    fn expand(s: &str) -> Expanded {
        Expanded::from_expr(&Expr::parse_expression(s).unwrap(), "x").unwrap()
    }

    #[test]
    fn test_exact_coefficients() {
        let (_, c) = coefficients("y'' - 2y' + y = e^x");
        assert_eq!(c.derivatives.len(), 2);
        assert!(matches!(c.derivatives[0], CoefficientDerivative::Exact(_)));
        assert_eq!(c.derivatives[0].to_expanded("x").unwrap(), expand("-x"));
        assert_eq!(c.derivatives[1].to_expanded("x").unwrap(), expand("1"));
    }

    #[test]
    fn test_symbolic_coefficients() {
        let (_, c) = coefficients("y'' + y = 1/cos(x)");
        assert!(matches!(c.derivatives[0], CoefficientDerivative::Symbolic(_)));
        assert_eq!(c.derivatives[0].to_expanded("x").unwrap(), expand("-sin(x)/cos(x)"));
        assert_eq!(c.derivatives[1].to_expanded("x").unwrap(), expand("1"));
    }

    #[test]
    fn test_leading_coefficient_is_divided_out() {
        // 2y'' + 3y' + y = 4 behaves like y'' + 1.5y' + 0.5y = 2
        let (_, c) = coefficients("2y'' + 3y' + y = 4");
        let (_, monic) = coefficients("y'' + 1.5y' + 0.5y = 2");
        assert_eq!(c.derivatives, monic.derivatives);
        let (_, c) = coefficients("3y'' + 3y = 3/cos(x)");
        assert_eq!(c.derivatives[0].to_expanded("x").unwrap(), expand("-sin(x)/cos(x)"));
        assert_eq!(c.derivatives[1].to_expanded("x").unwrap(), expand("1"));
    }

    #[test]
    fn test_system_is_satisfied() {
        // sum_i W[j][i] * u_i' = 0 for j < n-1 and f for j = n-1
        let (spec, c) = coefficients("y''' - y' = x e^(2x)");
        let f = spec.forcing_qp.clone().unwrap();
        let u: Vec<QuasiPoly> = c
            .derivatives
            .iter()
            .map(|d| match d {
                CoefficientDerivative::Exact(q) => q.clone(),
                CoefficientDerivative::Symbolic(_) => panic!("expected exact coefficients"),
            })
            .collect();
        for j in 0..3 {
            let mut row = QuasiPoly::zero();
            for (i, ui) in u.iter().enumerate() {
                row = &row + &(c.wronskian.matrix.get(j, i) * ui);
            }
            if j < 2 {
                assert!(row.is_zero());
            } else {
                assert_eq!(row, f);
            }
        }
    }
}
