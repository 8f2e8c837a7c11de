use crate::ode::root_classifier::FundamentalSet;
use crate::symbolic::quasi_matrix::QuasiMatrix;
use crate::symbolic::quasi_polynomial::QuasiPoly;
use log::debug;
use nalgebra::DMatrix;

/// Wronskian matrix of a fundamental set: row 0 holds the basis functions, row j the j-th
/// derivatives, columns follow the order of the set
#[derive(Clone, Debug, PartialEq)]
pub struct Wronskian {
    pub matrix: QuasiMatrix,
}

impl Wronskian {
    pub fn build(fss: &FundamentalSet) -> Wronskian {
        let n = fss.len();
        let mut rows: Vec<Vec<QuasiPoly>> = Vec::with_capacity(n);
        if n > 0 {
            rows.push(fss.quasi());
        }
        for j in 1..n {
            let next = rows[j - 1].iter().map(|e| e.diff()).collect();
            rows.push(next);
        }
        debug!("Wronskian of order {} built", n);
        Wronskian {
            matrix: QuasiMatrix::from_rows(rows),
        }
    }

    pub fn order(&self) -> usize {
        self.matrix.nrows
    }

    /// exact determinant
    pub fn determinant(&self) -> QuasiPoly {
        self.matrix.determinant()
    }

    /// floating point matrix at x
    pub fn evaluate(&self, x: f64) -> DMatrix<f64> {
        self.matrix.evaluate(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Utils::config::SolverConfig;
    use crate::ode::equation_parser::EquationSpec;
    use crate::ode::limits::SolverLimits;
    use crate::ode::root_classifier::solve_homogeneous;
    use crate::symbolic::algebraic_number::Number;
    use approx::assert_relative_eq;

    fn wronskian(equation: &str) -> Wronskian {
        let spec = EquationSpec::parse(equation, &SolverConfig::default()).unwrap();
        let h = solve_homogeneous(&spec, &SolverLimits::unlimited()).unwrap();
        Wronskian::build(&h.fss)
    }

    #[test]
    fn test_rows_are_successive_derivatives() {
        let w = wronskian("y''' - y' = 0");
        assert_eq!(w.order(), 3);
        for j in 1..3 {
            for i in 0..3 {
                assert_eq!(w.matrix.get(j, i), &w.matrix.get(j - 1, i).diff());
            }
        }
    }

    #[test]
    fn test_determinant_is_exponential_monomial() {
        // W = W(0) * exp((sum of roots) x)
        let w = wronskian("y'' - 2y' + y = 0");
        assert_eq!(w.determinant(), QuasiPoly::exponential(Number::from_integer(2)));
        let w = wronskian("y'' + 2y' + 5y = 0");
        let (c, rate) = w.determinant().as_unit().unwrap();
        assert_eq!(c, Number::from_integer(2));
        assert_eq!(rate, Number::from_integer(-2));
        let numeric = w.evaluate(0.37).determinant();
        assert_relative_eq!(numeric, 2.0 * (-0.74_f64).exp(), epsilon = 1e-12);
    }
}
