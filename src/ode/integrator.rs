//! Integration of the coefficient derivatives u_i'(x) into u_i(x), without integration constants.
use crate::ode::limits::SolverLimits;
use crate::ode::particular_coefficients::CoefficientDerivative;
use crate::ode::vop_error::{VopError, VopResult};
use crate::symbolic::symbolic_expand::Expanded;
use crate::symbolic::symbolic_integration::IntegrationError;
use log::{info, warn};

/// u_1..u_n; exact derivatives are integrated in closed form, symbolic ones by the rule table
pub fn integrate_coefficients(
    derivatives: &[CoefficientDerivative],
    var: &str,
    limits: &SolverLimits,
) -> VopResult<Vec<Expanded>> {
    let guard = limits.start();
    let mut integrated = Vec::with_capacity(derivatives.len());
    for (i, derivative) in derivatives.iter().enumerate() {
        guard.check()?;
        let u = match derivative {
            CoefficientDerivative::Exact(q) => q.integrate().to_expanded(var)?,
            CoefficientDerivative::Symbolic(e) => match e.integrate_with(|| guard.interrupted()) {
                Ok(u) => u,
                Err(IntegrationError::Interrupted) => {
                    guard.check()?;
                    return Err(VopError::Cancelled);
                }
                Err(IntegrationError::NoElementaryForm(_)) => {
                    warn!("no elementary antiderivative of u{}' = {}", i + 1, e);
                    return Err(VopError::NonElementaryIntegral {
                        index: i + 1,
                        integrand: e.to_string(),
                    });
                }
                Err(IntegrationError::Expand(err)) => return Err(err.into()),
            },
        };
        info!("u{} = {}", i + 1, u);
        integrated.push(u);
    }
    info!("coefficients integrated in {:?}", guard.elapsed());
    Ok(integrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::algebraic_number::Number;
    use crate::symbolic::quasi_polynomial::QuasiPoly;
    use crate::symbolic::symbolic_engine::Expr;
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    fn expand(s: &str) -> Expanded {
        Expanded::from_expr(&Expr::parse_expression(s).unwrap(), "x").unwrap()
    }

    #[test]
    fn test_mixed_coefficients() {
        let derivatives = vec![
            CoefficientDerivative::Exact(QuasiPoly::term(1, Number::zero(), Number::from_integer(-1))),
            CoefficientDerivative::Symbolic(expand("1/x")),
        ];
        let u = integrate_coefficients(&derivatives, "x", &SolverLimits::unlimited()).unwrap();
        assert_eq!(u[0], expand("-x^2/2"));
        assert_eq!(u[1], expand("ln(x)"));
    }

    #[test]
    fn test_non_elementary_reports_index() {
        let derivatives = vec![
            CoefficientDerivative::Symbolic(expand("1")),
            CoefficientDerivative::Symbolic(expand("e^x/x")),
        ];
        let err = integrate_coefficients(&derivatives, "x", &SolverLimits::unlimited()).unwrap_err();
        assert!(matches!(err, VopError::NonElementaryIntegral { index: 2, .. }));
    }

    #[test]
    fn test_cancelled() {
        let limits = SolverLimits::unlimited().with_cancel_flag(Arc::new(AtomicBool::new(true)));
        let derivatives = vec![CoefficientDerivative::Symbolic(expand("1/x"))];
        assert_eq!(integrate_coefficients(&derivatives, "x", &limits), Err(VopError::Cancelled));
    }
}
