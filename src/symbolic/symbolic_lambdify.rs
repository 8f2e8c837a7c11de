use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    /// LAMBDIFICATION - Converting Symbolic Expressions to Executable Functions

    /// Converts a symbolic expression of one variable into an executable Rust closure.
    ///
    /// Constants are converted to f64 once, when the closure is built. Any variable other
    /// than `var` makes the conversion fail; the names of the offending variables are returned
    /// so the caller can report them (typically unresolved integration constants).
    ///
    /// # Examples
    /// ```
    /// use RustedVarParam::symbolic::symbolic_engine::Expr;
    /// let x = Expr::Var("x".to_string());
    /// let f = x.pow(Expr::num(2)); // x^2
    /// let func = f.lambdify1D("x").unwrap();
    /// assert_eq!(func(3.0), 9.0);
    /// let g = Expr::var("c1") * Expr::var("x");
    /// assert_eq!(g.lambdify1D("x").err(), Some(vec!["c1".to_string()]));
    /// ```
    pub fn lambdify1D(&self, var: &str) -> Result<Box<dyn Fn(f64) -> f64>, Vec<String>> {
        let unresolved = self.free_symbols_except(var);
        if !unresolved.is_empty() {
            return Err(unresolved);
        }
        Ok(self.lambdify1D_unchecked())
    }

    fn lambdify1D_unchecked(&self) -> Box<dyn Fn(f64) -> f64> {
        match self {
            Expr::Var(_) => Box::new(|x| x),
            Expr::Const(val) => {
                let val = val.to_f64();
                Box::new(move |_| val)
            }
            Expr::Add(lhs, rhs) => {
                let lhs_fn = lhs.lambdify1D_unchecked();
                let rhs_fn = rhs.lambdify1D_unchecked();
                Box::new(move |x| lhs_fn(x) + rhs_fn(x))
            }
            Expr::Sub(lhs, rhs) => {
                let lhs_fn = lhs.lambdify1D_unchecked();
                let rhs_fn = rhs.lambdify1D_unchecked();
                Box::new(move |x| lhs_fn(x) - rhs_fn(x))
            }
            Expr::Mul(lhs, rhs) => {
                let lhs_fn = lhs.lambdify1D_unchecked();
                let rhs_fn = rhs.lambdify1D_unchecked();
                Box::new(move |x| lhs_fn(x) * rhs_fn(x))
            }
            Expr::Div(lhs, rhs) => {
                let lhs_fn = lhs.lambdify1D_unchecked();
                let rhs_fn = rhs.lambdify1D_unchecked();
                Box::new(move |x| lhs_fn(x) / rhs_fn(x))
            }
            Expr::Pow(base, exp) => {
                let base_fn = base.lambdify1D_unchecked();
                match exp.as_number().and_then(|n| n.as_integer()) {
                    Some(k) if k.abs() <= i32::MAX as i64 => {
                        let k = k as i32;
                        Box::new(move |x| base_fn(x).powi(k))
                    }
                    _ => {
                        let exp_fn = exp.lambdify1D_unchecked();
                        Box::new(move |x| base_fn(x).powf(exp_fn(x)))
                    }
                }
            }
            Expr::Exp(expr) => {
                let expr_fn = expr.lambdify1D_unchecked();
                Box::new(move |x| expr_fn(x).exp())
            }
            Expr::Ln(expr) => {
                let expr_fn = expr.lambdify1D_unchecked();
                Box::new(move |x| expr_fn(x).ln())
            }
            Expr::sin(expr) => {
                let expr_fn = expr.lambdify1D_unchecked();
                Box::new(move |x| expr_fn(x).sin())
            }
            Expr::cos(expr) => {
                let expr_fn = expr.lambdify1D_unchecked();
                Box::new(move |x| expr_fn(x).cos())
            }
            Expr::tg(expr) => {
                let expr_fn = expr.lambdify1D_unchecked();
                Box::new(move |x| expr_fn(x).tan())
            }
        }
    } // end of lambdify1D

    /// values of a one-variable expression on a grid of points
    pub fn lambdify1D_from_linspace(
        &self,
        var: &str,
        start: f64,
        end: f64,
        num_values: usize,
    ) -> Result<Vec<(f64, f64)>, Vec<String>> {
        let f = self.lambdify1D(var)?;
        Ok(crate::symbolic::utils::linspace(start, end, num_values)
            .into_iter()
            .map(|x| (x, f(x)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lambdify_matches_eval_expression() {
        let x = Expr::var("x");
        let e = Expr::Ln(Box::new(Expr::cos(x.clone().boxed()))) * x.clone()
            + Expr::Div(x.clone().exp().boxed(), (x.clone() + Expr::num(2)).boxed());
        let f = e.lambdify1D("x").unwrap();
        for v in [0.1, 0.4, 1.2] {
            assert_relative_eq!(f(v), e.eval_expression(&["x"], &[v]), epsilon = 1e-14);
        }
    }

    #[test]
    fn test_negative_base_integer_power() {
        let e = Expr::var("x").pow(Expr::num(3));
        let f = e.lambdify1D("x").unwrap();
        assert_relative_eq!(f(-2.0), -8.0);
    }

    #[test]
    fn test_linspace_sampling() {
        let e = Expr::num(2) * Expr::var("x");
        let samples = e.lambdify1D_from_linspace("x", 0.0, 1.0, 3).unwrap();
        assert_eq!(samples.len(), 3);
        assert_relative_eq!(samples[1].1, 1.0);
        assert!(Expr::var("c1").lambdify1D_from_linspace("x", 0.0, 1.0, 3).is_err());
    }
}
