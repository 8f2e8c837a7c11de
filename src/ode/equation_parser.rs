//! # Equation parser
//!
//! Turns `"y'' - 2y' + y = e^x"` into the characteristic polynomial `r^2 - 2*r + 1` and the
//! forcing term `exp(x)`.
//!
//! Every derivative marker of the dependent variable (`y`, `y'`, `y''`, ..., or `y(3)`, `y^(3)`)
//! is replaced by a marker symbol, the left-hand side is expanded and each term must then be a
//! rational multiple of exactly one marker. This rejects non-linear terms (`y^2`, `y*y'`),
//! variable coefficients (`x*y'`) and stray symbols with a parse error.
use crate::Utils::config::SolverConfig;
use crate::ode::vop_error::{VopError, VopResult};
use crate::symbolic::polynomial::Polynomial;
use crate::symbolic::quasi_polynomial::QuasiPoly;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_expand::Expanded;
use log::{debug, info};
use num::BigRational;
use num_traits::Zero;
use regex::Regex;
use std::fmt;

const MARKER_PREFIX: &str = "__d";

#[derive(Clone, Debug, PartialEq)]
pub struct EquationSpec {
    pub raw: String,
    pub independent_var: String,
    pub characteristic_var: String,
    pub characteristic: Polynomial,
    pub order: usize,
    pub forcing: Expr,
    pub forcing_expanded: Expanded,
    /// the forcing as an exact quasi-polynomial, when it is one
    pub forcing_qp: Option<QuasiPoly>,
}

fn marker_order(name: &str) -> Option<usize> {
    name.strip_prefix(MARKER_PREFIX)?.parse().ok()
}

/// rewrites derivative markers of `dependent` into marker symbols `(__dk)`
fn replace_derivative_markers(lhs: &str, dependent: &str) -> VopResult<String> {
    // the leading group keeps "2y" working while rejecting identifiers that merely end in y
    let pattern = format!(r"(^|[^A-Za-z_]){}\b(?:\s*\^?\(\s*(\d+)\s*\)|('*))", regex::escape(dependent));
    let re = Regex::new(&pattern).map_err(|e| VopError::Config(e.to_string()))?;
    Ok(re
        .replace_all(lhs, |caps: &regex::Captures| {
            let order = match (caps.get(2), caps.get(3)) {
                (Some(explicit), _) => explicit.as_str().to_string(),
                (None, Some(primes)) => primes.as_str().len().to_string(),
                (None, None) => "0".to_string(),
            };
            let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            format!("{}({}{})", prefix, MARKER_PREFIX, order)
        })
        .into_owned())
}

impl EquationSpec {
    /// Parses `LHS = RHS`.
    ///
    /// # Examples
    /// ```
    /// use RustedVarParam::ode::equation_parser::EquationSpec;
    /// use RustedVarParam::Utils::config::SolverConfig;
    /// let spec = EquationSpec::parse("y'' - 2y' + y = e^x", &SolverConfig::default()).unwrap();
    /// assert_eq!(spec.order, 2);
    /// assert_eq!(spec.characteristic_string(), "r^2 - 2*r + 1");
    /// assert_eq!(spec.forcing_expanded.to_string(), "exp(x)");
    /// ```
    pub fn parse(raw: &str, config: &SolverConfig) -> VopResult<EquationSpec> {
        let x = config.independent_var.as_str();
        let sides: Vec<&str> = raw.split('=').collect();
        if sides.len() != 2 {
            return Err(VopError::Parse(format!(
                "expected exactly one '=' in '{}', found {}",
                raw,
                sides.len() - 1
            )));
        }
        let (lhs, rhs) = (sides[0].trim(), sides[1].trim());
        let characteristic = EquationSpec::parse_lhs(lhs, config)?;
        let order = match characteristic.degree() {
            None => return Err(VopError::DegreeMismatch(format!("'{}' is identically zero", lhs))),
            Some(0) => {
                return Err(VopError::DegreeMismatch(format!(
                    "'{}' contains no derivative of {}",
                    lhs, config.dependent_var
                )));
            }
            Some(n) => n,
        };

        let forcing = Expr::parse_expression(rhs)?;
        let strangers = forcing.free_symbols_except(x);
        if !strangers.is_empty() {
            return Err(VopError::Parse(format!(
                "the right-hand side may only depend on {}, found {:?}",
                x, strangers
            )));
        }
        let forcing_expanded = Expanded::from_expr(&forcing, x)?;
        let forcing_qp = QuasiPoly::try_from_expanded(&forcing_expanded);
        info!(
            "equation {}: characteristic polynomial {}, order {}, forcing {}",
            raw,
            characteristic.to_string_in(&config.characteristic_var),
            order,
            forcing_expanded
        );
        debug!("forcing is a quasi-polynomial: {}", forcing_qp.is_some());
        Ok(EquationSpec {
            raw: raw.to_string(),
            independent_var: x.to_string(),
            characteristic_var: config.characteristic_var.clone(),
            characteristic,
            order,
            forcing,
            forcing_expanded,
            forcing_qp,
        })
    }

    fn parse_lhs(lhs: &str, config: &SolverConfig) -> VopResult<Polynomial> {
        let x = config.independent_var.as_str();
        let rewritten = replace_derivative_markers(lhs, &config.dependent_var)?;
        debug!("left-hand side {} rewritten to {}", lhs, rewritten);
        let expanded = Expanded::from_expr(&Expr::parse_expression(&rewritten)?, x)?;
        let mut coeffs: Vec<BigRational> = Vec::new();
        for (m, c) in expanded.terms() {
            let not_linear = || {
                VopError::Parse(format!(
                    "the left-hand side '{}' is not linear in {} with constant coefficients",
                    lhs, config.dependent_var
                ))
            };
            if m.x_power != 0 || !m.exp_rate.is_zero() {
                return Err(not_linear());
            }
            let order = match (m.factors.len(), m.factors.iter().next()) {
                (1, Some((Expr::Var(name), 1))) => match marker_order(name) {
                    Some(k) => k,
                    None => {
                        return Err(VopError::Parse(format!(
                            "unexpected symbol {} on the left-hand side",
                            name
                        )));
                    }
                },
                (0, _) => {
                    return Err(VopError::Parse(format!(
                        "the left-hand side '{}' has a term without {}",
                        lhs, config.dependent_var
                    )));
                }
                _ => return Err(not_linear()),
            };
            let coeff = c.as_rational().ok_or_else(|| {
                VopError::Parse(format!("coefficient {} of the left-hand side is not rational", c))
            })?;
            if coeffs.len() <= order {
                coeffs.resize(order + 1, BigRational::zero());
            }
            coeffs[order] += coeff;
        }
        Ok(Polynomial::new(coeffs))
    }

    pub fn characteristic_string(&self) -> String {
        self.characteristic.to_string_in(&self.characteristic_var)
    }
}

impl fmt::Display for EquationSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} (characteristic polynomial {}, order {}, forcing {})",
            self.raw,
            self.characteristic_string(),
            self.order,
            self.forcing_expanded
        )
    }
}
