//! # Initial condition solver
//!
//! Each condition `y^(k)(x0) = y0` gives one linear equation in the constants `c1..cn`:
//!
//! ```text
//! sum_i FSS_i^(k)(x0) * c_i = y0 - y_p^(k)(x0)
//! ```
//!
//! The matrix entries are exponential sums `sum q * e^(mu)` with algebraic `q` and `mu`, a ring
//! with an exact zero test, so the system is solved by cofactors (Cramer's rule) without
//! rounding. Conditions are taken as given, a repeated derivative order is not merged.
use crate::ode::general_solution::GeneralSolution;
use crate::ode::root_classifier::FundamentalSet;
use crate::ode::vop_error::{VopError, VopResult};
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::parse_expr::decimal_to_rational;
use crate::symbolic::quasi_matrix::{QuasiMatrix, index_subsets};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_expand::Expanded;
use crate::symbolic::utils::linspace;
use log::{info, warn};
use num::BigRational;
use regex::Regex;
use std::fmt;

/// y^(order)(x0) = y0
#[derive(Clone, Debug, PartialEq)]
pub struct ConditionTriple {
    pub order: usize,
    pub x0: BigRational,
    pub y0: BigRational,
}

/// signed decimal literal -> exact rational
fn parse_decimal(literal: &str) -> Option<BigRational> {
    let (negative, digits) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }
    let value = decimal_to_rational(int_part, frac_part);
    Some(if negative { -value } else { value })
}

impl ConditionTriple {
    pub fn new(order: usize, x0: BigRational, y0: BigRational) -> ConditionTriple {
        ConditionTriple { order, x0, y0 }
    }

    /// Parses `y''(0.5) = -1.25`; the order is the number of primes.
    ///
    /// # Examples
    /// ```
    /// use RustedVarParam::ode::initial_conditions::ConditionTriple;
    /// use num::BigRational;
    /// let c = ConditionTriple::parse("y'(0) = 2.5", "y").unwrap();
    /// assert_eq!(c.order, 1);
    /// assert_eq!(c.y0, BigRational::new(5.into(), 2.into()));
    /// ```
    pub fn parse(condition: &str, dependent_var: &str) -> VopResult<ConditionTriple> {
        let pattern = format!(
            r"^\s*{}('*)\s*\(\s*([+-]?[\d.]+)\s*\)\s*=\s*([+-]?[\d.]+)\s*$",
            regex::escape(dependent_var)
        );
        let re = Regex::new(&pattern).map_err(|e| VopError::Config(e.to_string()))?;
        let invalid = || {
            VopError::Parse(format!(
                "invalid initial condition '{}', expected {}<primes>(<x0>) = <y0>",
                condition, dependent_var
            ))
        };
        let caps = re.captures(condition).ok_or_else(invalid)?;
        let order = caps.get(1).map(|m| m.as_str().len()).unwrap_or(0);
        let x0 = caps.get(2).and_then(|m| parse_decimal(m.as_str())).ok_or_else(invalid)?;
        let y0 = caps.get(3).and_then(|m| parse_decimal(m.as_str())).ok_or_else(invalid)?;
        Ok(ConditionTriple { order, x0, y0 })
    }
}

impl fmt::Display for ConditionTriple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "y{}({}) = {}", "'".repeat(self.order), self.x0, self.y0)
    }
}

/// general solution with every constant resolved
#[derive(Clone, Debug, PartialEq)]
pub struct FinalSolution {
    pub var: String,
    pub expanded: Expanded,
    /// c_i and their values, in index order
    pub constants: Vec<(String, Expanded)>,
    pub conditions: Vec<ConditionTriple>,
    pub log: Vec<String>,
}

impl FinalSolution {
    pub fn to_expr(&self) -> Expr {
        self.expanded.to_expr()
    }

    pub fn pretty(&self) -> String {
        format!("y({}) = {}", self.var, self.expanded)
    }

    /// numeric closure; refuses expressions that still contain symbols
    pub fn lambdify(&self) -> VopResult<Box<dyn Fn(f64) -> f64>> {
        self.to_expr()
            .lambdify1D(&self.var)
            .map_err(VopError::UnresolvedConstants)
    }

    /// (x, y) pairs on `n` equidistant points of [x_min, x_max]
    pub fn sample(&self, x_min: f64, x_max: f64, n: usize) -> VopResult<Vec<(f64, f64)>> {
        let f = self.lambdify()?;
        Ok(linspace(x_min, x_max, n).into_iter().map(|x| (x, f(x))).collect())
    }
}

impl fmt::Display for FinalSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.expanded)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConditionOutcome {
    Resolved(FinalSolution),
    /// the conditions do not fix the constants; `log` lists the equations built so far
    Unresolved { reason: String, log: Vec<String> },
}

impl ConditionOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ConditionOutcome::Resolved(_))
    }

    pub fn log(&self) -> &[String] {
        match self {
            ConditionOutcome::Resolved(solution) => &solution.log,
            ConditionOutcome::Unresolved { log, .. } => log,
        }
    }
}

/// Resolves `c1..cn` of `general` from exactly n conditions.
///
/// `particular` is the constant-free part of the general solution. A wrong number of conditions
/// is an error; a system without a unique solution is reported as `Unresolved`.
pub fn solve_conditions(
    general: &GeneralSolution,
    fss: &FundamentalSet,
    particular: &Expanded,
    conditions: &[ConditionTriple],
) -> VopResult<ConditionOutcome> {
    let n = fss.len();
    if conditions.len() != n {
        return Err(VopError::ConditionCount {
            expected: n,
            found: conditions.len(),
        });
    }
    let mut log = Vec::with_capacity(2 * n);
    match resolve(general, fss, particular, conditions, &mut log) {
        Ok(outcome) => Ok(outcome),
        Err(VopError::Algebra(reason)) => {
            warn!("initial conditions cannot be evaluated: {}", reason);
            Ok(ConditionOutcome::Unresolved { reason, log })
        }
        Err(e) => Err(e),
    }
}

fn resolve(
    general: &GeneralSolution,
    fss: &FundamentalSet,
    particular: &Expanded,
    conditions: &[ConditionTriple],
    log: &mut Vec<String>,
) -> VopResult<ConditionOutcome> {
    let var = general.var.as_str();
    let n = fss.len();
    let mut matrix = QuasiMatrix::zeros(n, n);
    let mut rhs = Vec::with_capacity(n);
    for (row, condition) in conditions.iter().enumerate() {
        let x0 = Number::from_rational(condition.x0.clone());
        for (i, basis) in fss.functions.iter().enumerate() {
            matrix.set(row, i, basis.to_quasi().nth_diff(condition.order).eval_at(&x0));
        }
        let at_x0 = general.expanded.nth_diff(condition.order)?.substitute_var(&x0)?;
        let line = format!("{}: {} = {}", condition, at_x0, condition.y0);
        info!("{}", line);
        log.push(line);
        let particular_at_x0 = particular.nth_diff(condition.order)?.substitute_var(&x0)?;
        rhs.push(&Expanded::constant(var, Number::from_rational(condition.y0.clone())) - &particular_at_x0);
    }

    let determinant = matrix.determinant();
    if determinant.is_zero() {
        let rank = matrix.rank();
        let reason = if raises_rank(&matrix, &rhs, rank, var)? {
            "the initial conditions are inconsistent".to_string()
        } else {
            "the initial conditions do not determine the constants uniquely".to_string()
        };
        warn!("{} (rank {} of {})", reason, rank, n);
        log.push(reason.clone());
        return Ok(ConditionOutcome::Unresolved {
            reason,
            log: std::mem::take(log),
        });
    }

    // numerators of Cramer's rule: b expanded along column i
    let mut numerators = Vec::with_capacity(n);
    for i in 0..n {
        let mut numerator = Expanded::zero(var);
        for (k, b) in rhs.iter().enumerate() {
            let cofactor = matrix.cofactor(k, i).to_constant_expanded(var)?;
            numerator = &numerator + &(b * &cofactor);
        }
        numerators.push(numerator);
    }

    let det_inv = match determinant.inv_unit() {
        Some(inv) => inv.to_constant_expanded(var)?,
        None => determinant.to_constant_expanded(var)?.reciprocal()?,
    };
    let mut constants = Vec::with_capacity(n);
    let mut expanded = general.expanded.clone();
    for (name, numerator) in general.constants.iter().zip(numerators) {
        let value = &numerator * &det_inv;
        let line = format!("{} = {}", name, value);
        info!("{}", line);
        log.push(line);
        expanded = expanded.substitute_symbol(name, &value)?;
        constants.push((name.clone(), value));
    }

    let remaining: Vec<String> = expanded
        .free_symbols()
        .into_iter()
        .filter(|s| general.constants.contains(s))
        .collect();
    if !remaining.is_empty() {
        let reason = format!("the constants {:?} remain after substitution", remaining);
        warn!("{}", reason);
        log.push(reason.clone());
        return Ok(ConditionOutcome::Unresolved {
            reason,
            log: std::mem::take(log),
        });
    }
    info!("final solution: {}", expanded);
    Ok(ConditionOutcome::Resolved(FinalSolution {
        var: var.to_string(),
        expanded,
        constants,
        conditions: conditions.to_vec(),
        log: std::mem::take(log),
    }))
}

/// Whether appending the column `rhs` raises the rank of `matrix` from `rank`: some minor of
/// order rank + 1 through the appended column does not vanish.
fn raises_rank(matrix: &QuasiMatrix, rhs: &[Expanded], rank: usize, var: &str) -> VopResult<bool> {
    if rank >= rhs.len() {
        return Ok(false);
    }
    for rows in index_subsets(rhs.len(), rank + 1) {
        for cols in index_subsets(matrix.ncols, rank) {
            let mut minor = Expanded::zero(var);
            // expansion along the appended last column
            for (j, row) in rows.iter().enumerate() {
                let others: Vec<usize> = rows.iter().copied().filter(|r| r != row).collect();
                let cofactor = matrix.submatrix(&others, &cols).determinant().to_constant_expanded(var)?;
                let term = &rhs[*row] * &cofactor;
                minor = if (j + rank) % 2 == 0 { &minor + &term } else { &minor - &term };
            }
            if !minor.is_zero() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Utils::config::SolverConfig;
    use crate::ode::equation_parser::EquationSpec;
    use crate::ode::general_solution::{GeneralSolution, ParticularSolution, assemble_general, assemble_particular};
    use crate::ode::integrator::integrate_coefficients;
    use crate::ode::limits::SolverLimits;
    use crate::ode::particular_coefficients::solve_coefficients;
    use crate::ode::root_classifier::{HomogeneousSolution, solve_homogeneous};
    use crate::ode::wronskian::Wronskian;
    use approx::assert_relative_eq;

    fn pipeline(equation: &str) -> (HomogeneousSolution, ParticularSolution, GeneralSolution) {
        let spec = EquationSpec::parse(equation, &SolverConfig::default()).unwrap();
        let limits = SolverLimits::unlimited();
        let h = solve_homogeneous(&spec, &limits).unwrap();
        let c = solve_coefficients(Wronskian::build(&h.fss), &spec).unwrap();
        let u = integrate_coefficients(&c.derivatives, "x", &limits).unwrap();
        let p = assemble_particular(&h.fss, c, u).unwrap();
        let g = assemble_general(&h, &p);
        (h, p, g)
    }

    fn conditions(strings: &[&str]) -> Vec<ConditionTriple> {
        strings.iter().map(|s| ConditionTriple::parse(s, "y").unwrap()).collect()
    }

    fn half() -> Expanded {
        Expanded::constant("x", Number::from_rational(BigRational::new(1.into(), 2.into())))
    }

    #[test]
    fn test_parse_conditions() {
        let c = ConditionTriple::parse(" y''( -0.5 ) = 3", "y").unwrap();
        assert_eq!(c.order, 2);
        assert_eq!(c.x0, BigRational::new((-1).into(), 2.into()));
        assert_eq!(c.to_string(), "y''(-1/2) = 3");
        assert!(ConditionTriple::parse("y(0) = ", "y").is_err());
        assert!(ConditionTriple::parse("z(0) = 1", "y").is_err());
        assert!(ConditionTriple::parse("y(.) = 1", "y").is_err());
    }

    #[test]
    fn test_cosh_constants() {
        let (h, p, g) = pipeline("y'' - y = 0");
        let outcome = solve_conditions(&g, &h.fss, &p.solution, &conditions(&["y(0) = 1", "y'(0) = 0"])).unwrap();
        let ConditionOutcome::Resolved(f) = outcome else {
            panic!("expected a unique solution");
        };
        assert_eq!(f.constants[0].1, half());
        assert_eq!(f.constants[1].1, half());
        assert!(f.expanded.free_symbols().is_empty());
        let y = f.lambdify().unwrap();
        assert_relative_eq!(y(0.7), 0.7_f64.cosh(), epsilon = 1e-12);
        assert_eq!(f.log.len(), 4);
    }

    #[test]
    fn test_conditions_away_from_zero() {
        // y = x^2 e^x / 2 + c1 e^x + c2 x e^x with y(1) = 0, y'(1) = 0
        let (h, p, g) = pipeline("y'' - 2y' + y = e^x");
        let outcome = solve_conditions(&g, &h.fss, &p.solution, &conditions(&["y(1) = 0", "y'(1) = 0"])).unwrap();
        let ConditionOutcome::Resolved(f) = outcome else {
            panic!("expected a unique solution");
        };
        // (x - 1)^2 e^x / 2
        let samples = f.sample(0.0, 2.0, 5).unwrap();
        for (x, y) in samples {
            assert_relative_eq!(y, (x - 1.0) * (x - 1.0) * x.exp() / 2.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_wrong_count() {
        let (h, p, g) = pipeline("y'' - y = 0");
        assert_eq!(
            solve_conditions(&g, &h.fss, &p.solution, &conditions(&["y(0) = 1"])),
            Err(VopError::ConditionCount { expected: 2, found: 1 })
        );
    }

    #[test]
    fn test_singular_systems() {
        let (h, p, g) = pipeline("y'' - y = 0");
        let outcome = solve_conditions(&g, &h.fss, &p.solution, &conditions(&["y(0) = 1", "y(0) = 1"])).unwrap();
        match outcome {
            ConditionOutcome::Unresolved { reason, .. } => assert!(reason.contains("uniquely")),
            ConditionOutcome::Resolved(_) => panic!("expected a singular system"),
        }
        let outcome = solve_conditions(&g, &h.fss, &p.solution, &conditions(&["y(0) = 1", "y(0) = 2"])).unwrap();
        match outcome {
            ConditionOutcome::Unresolved { reason, log } => {
                assert!(reason.contains("inconsistent"));
                assert_eq!(log.len(), 3);
            }
            ConditionOutcome::Resolved(_) => panic!("expected a singular system"),
        }
    }

    #[test]
    fn test_rank_deficient_third_order_system() {
        // y = c1 + c2 e^x + c3 e^-x: three copies of the condition at 0 leave rank 1
        let (h, p, g) = pipeline("y''' - y' = 0");
        let reason = |strings: &[&str]| match solve_conditions(&g, &h.fss, &p.solution, &conditions(strings)).unwrap() {
            ConditionOutcome::Unresolved { reason, .. } => reason,
            ConditionOutcome::Resolved(_) => panic!("expected a singular system"),
        };
        assert!(reason(&["y(0)=1", "y(0)=2", "y(0)=1"]).contains("inconsistent"));
        assert!(reason(&["y(0)=1", "y(0)=1", "y(0)=1"]).contains("uniquely"));
        // rank 2: y(0) once and y'(0) twice
        assert!(reason(&["y(0)=1", "y'(0)=0", "y'(0)=3"]).contains("inconsistent"));
        assert!(reason(&["y(0)=1", "y'(0)=3", "y'(0)=3"]).contains("uniquely"));
    }

    #[test]
    fn test_unresolved_constants_refuse_sampling() {
        let (_, _, g) = pipeline("y'' - y = 0");
        let unresolved = FinalSolution {
            var: "x".to_string(),
            expanded: g.expanded.clone(),
            constants: vec![],
            conditions: vec![],
            log: vec![],
        };
        assert_eq!(
            unresolved.sample(0.0, 1.0, 3).err(),
            Some(VopError::UnresolvedConstants(vec!["c1".to_string(), "c2".to_string()]))
        );
    }
}
