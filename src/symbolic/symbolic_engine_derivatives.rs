//! # Symbolic Engine Derivatives Module
//!
//! Extends the symbolic engine with analytical differentiation and direct numerical evaluation.
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - analytical derivative (product, quotient and chain rules)
//! - `n_th_derivative1D()` - higher-order derivatives
//!
//! ### Function evaluation
//! - `eval_expression()` - direct evaluation without closure creation
//!
//! ### Utilities
//! - `all_arguments_are_variables()` - sorted list of the free variable names
//! - `sym_to_str()` - pretty string form of the expression
use crate::symbolic::symbolic_engine::Expr;

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical derivative of the expression with respect to a variable.
    ///
    /// Implements the standard differentiation rules:
    /// - Power rule: d/dx(x^n) = n*x^(n-1) for an exponent free of `var`
    /// - Product rule: d/dx(f*g) = f'*g + f*g'
    /// - Quotient rule: d/dx(f/g) = (f'*g - f*g')/g^2
    /// - Chain rule: d/dx(f(g(x))) = f'(g(x))*g'(x)
    ///
    /// The result is not simplified; call `simplify_()` or expand it.
    ///
    /// # Examples
    /// ```
    /// use RustedVarParam::symbolic::symbolic_engine::Expr;
    /// let x = Expr::Var("x".to_string());
    /// let f = x.clone().pow(Expr::num(2)); // x^2
    /// let df_dx = f.diff("x").simplify_(); // 2*x
    /// assert_eq!(df_dx.to_string(), "2*x");
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::num(1)
                } else {
                    Expr::num(0)
                }
            }
            Expr::Const(_) => Expr::num(0),
            Expr::Add(lhs, rhs) => Expr::Add(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Sub(lhs, rhs) => Expr::Sub(Box::new(lhs.diff(var)), Box::new(rhs.diff(var))),
            Expr::Mul(lhs, rhs) => Expr::Add(
                Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                Box::new(Expr::Mul(lhs.clone(), Box::new(rhs.diff(var)))),
            ),
            Expr::Div(lhs, rhs) => Expr::Div(
                Box::new(Expr::Sub(
                    Box::new(Expr::Mul(Box::new(lhs.diff(var)), rhs.clone())),
                    Box::new(Expr::Mul(Box::new(rhs.diff(var)), lhs.clone())),
                )),
                Box::new(Expr::Mul(rhs.clone(), rhs.clone())),
            ),
            Expr::Pow(base, exp) if !exp.contains_variable(var) => Expr::Mul(
                Box::new(Expr::Mul(
                    exp.clone(),
                    Box::new(Expr::Pow(
                        base.clone(),
                        Box::new(Expr::Sub(exp.clone(), Box::new(Expr::num(1)))),
                    )),
                )),
                Box::new(base.diff(var)),
            ),
            // b^e = exp(e*ln(b))
            Expr::Pow(base, exp) => Expr::Mul(
                Box::new(self.clone()),
                Box::new(Expr::Add(
                    Box::new(Expr::Mul(Box::new(exp.diff(var)), Box::new(Expr::Ln(base.clone())))),
                    Box::new(Expr::Div(
                        Box::new(Expr::Mul(exp.clone(), Box::new(base.diff(var)))),
                        base.clone(),
                    )),
                )),
            ),
            Expr::Exp(expr) => {
                Expr::Mul(Box::new(Expr::Exp(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::Ln(expr) => Expr::Div(Box::new(expr.diff(var)), expr.clone()),
            Expr::sin(expr) => {
                Expr::Mul(Box::new(Expr::cos(expr.clone())), Box::new(expr.diff(var)))
            }
            Expr::cos(expr) => Expr::Mul(
                Box::new(Expr::Mul(Box::new(Expr::num(-1)), Box::new(Expr::sin(expr.clone())))),
                Box::new(expr.diff(var)),
            ),
            Expr::tg(expr) => Expr::Mul(
                Box::new(Expr::Div(
                    Box::new(Expr::num(1)),
                    Box::new(Expr::Pow(Box::new(Expr::cos(expr.clone())), Box::new(Expr::num(2)))),
                )),
                Box::new(expr.diff(var)),
            ),
        }
    }

    /// n-th derivative with respect to `var`, simplified after every step
    pub fn n_th_derivative1D(&self, var: &str, n: usize) -> Expr {
        let mut expr = self.clone();
        for _ in 0..n {
            expr = expr.diff(var).simplify_();
        }
        expr
    }

    /// sorted, deduplicated names of all variables of the expression
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Expr::Var(name) => vars.push(name.clone()),
            Expr::Const(_) => {}
            _ => {
                for arg in self.args() {
                    arg.collect_variables(vars);
                }
            }
        }
    }

    /// variables other than `var`
    pub fn free_symbols_except(&self, var: &str) -> Vec<String> {
        self.all_arguments_are_variables()
            .into_iter()
            .filter(|name| name != var)
            .collect()
    }

    /// Evaluates the expression for the given variable values.
    ///
    /// Constants contribute their real part. A variable missing from `vars` evaluates to NaN.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> f64 {
        match self {
            Expr::Var(name) => match vars.iter().position(|x| x == name) {
                Some(index) => values[index],
                None => f64::NAN,
            },
            Expr::Const(val) => val.to_f64(),
            Expr::Add(lhs, rhs) => lhs.eval_expression(vars, values) + rhs.eval_expression(vars, values),
            Expr::Sub(lhs, rhs) => lhs.eval_expression(vars, values) - rhs.eval_expression(vars, values),
            Expr::Mul(lhs, rhs) => lhs.eval_expression(vars, values) * rhs.eval_expression(vars, values),
            Expr::Div(lhs, rhs) => lhs.eval_expression(vars, values) / rhs.eval_expression(vars, values),
            Expr::Pow(base, exp) => {
                let base_val = base.eval_expression(vars, values);
                match exp.as_number().and_then(|n| n.as_integer()) {
                    Some(k) if k.abs() <= i32::MAX as i64 => base_val.powi(k as i32),
                    _ => base_val.powf(exp.eval_expression(vars, values)),
                }
            }
            Expr::Exp(expr) => expr.eval_expression(vars, values).exp(),
            Expr::Ln(expr) => expr.eval_expression(vars, values).ln(),
            Expr::sin(expr) => expr.eval_expression(vars, values).sin(),
            Expr::cos(expr) => expr.eval_expression(vars, values).cos(),
            Expr::tg(expr) => expr.eval_expression(vars, values).tan(),
        }
    }

    /// pretty human-readable string
    pub fn sym_to_str(&self) -> String {
        self.to_string()
    }
}
