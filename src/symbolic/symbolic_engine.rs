//! # Symbolic Engine Module
//!
//! Core expression tree of the crate. Expressions are parsed from strings (see
//! [`crate::symbolic::parse_expr`]), differentiated analytically, simplified, converted into the
//! canonical expanded form of [`crate::symbolic::symbolic_expand`] and finally turned into plain
//! Rust closures for numeric evaluation.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - symbolic variables like "x", "c1"
//! - **Constants**: `Const(Number)` - exact algebraic constants (rationals, square roots, I)
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow` - basic arithmetic
//! - **Functions**: `Exp`, `Ln`, `sin`, `cos`, `tg`
//!
//! ### Key Methods
//! - `Symbols(symbols: &str)` - create multiple variables from comma-separated string
//! - `diff(var: &str)` - analytical differentiation
//! - `simplify_()` - constant folding and trivial identities
//! - `set_variable()` - substitute a variable with an exact value
//! - `lambdify1D()` - convert to an executable function of one argument
//!
//! ## Code Features
//!
//! 1. **Recursive Expression Tree**: uses Box<Expr> for nested expressions
//! 2. **Operator Overloading**: implements std::ops traits (Add, Sub, Mul, Div, Neg)
//! 3. **Exact constants**: constants never round, so `sqrt(2)^2` folds back to `2`
//! 4. **Total order**: `Expr` is `Ord + Hash`, so expressions can be used as keys of the
//!    monomial maps of the expanded form
//! 5. **Non-standard Function Names**: the tangent variant is called `tg`, printing uses `tan`

#![allow(non_camel_case_types)]

use crate::symbolic::algebraic_number::Number;
use num::BigRational;
use std::collections::HashMap;
use std::fmt;

/// Core symbolic expression enum representing mathematical expressions as an abstract syntax tree.
///
/// # Examples
/// ```
/// use RustedVarParam::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = Expr::Add(Box::new(x), Box::new(Expr::num(2)));
/// assert_eq!(expr.to_string(), "x + 2");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "c1")
    Var(String),
    /// Exact numerical constant
    Const(Number),
    /// Addition operation: left + right
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction operation: left - right
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication operation: left * right
    Mul(Box<Expr>, Box<Expr>),
    /// Division operation: left / right
    Div(Box<Expr>, Box<Expr>),
    /// Power operation: base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// Exponential function: e^x
    Exp(Box<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Box<Expr>),
    /// Sine function: sin(x)
    sin(Box<Expr>),
    /// Cosine function: cos(x)
    cos(Box<Expr>),
    /// Tangent function: tan(x)
    tg(Box<Expr>),
}

const PREC_SUM: u8 = 1;
const PREC_PRODUCT: u8 = 2;
const PREC_POWER: u8 = 3;
const PREC_ATOM: u8 = 4;

impl Expr {
    /// negative constant or a product led by one: printed with a leading minus
    fn negated_form(&self) -> Option<Expr> {
        match self {
            Expr::Const(n) if n.is_negative() => Some(Expr::Const(-n)),
            Expr::Mul(lhs, rhs) => lhs.negated_form().map(|neg| {
                if neg.is_one() {
                    rhs.as_ref().clone()
                } else {
                    Expr::Mul(neg.boxed(), rhs.clone())
                }
            }),
            Expr::Div(lhs, rhs) => lhs
                .negated_form()
                .map(|neg| Expr::Div(neg.boxed(), rhs.clone())),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Var(_) => PREC_ATOM,
            Expr::Const(n) => n.display_precedence(),
            Expr::Add(_, _) | Expr::Sub(_, _) => PREC_SUM,
            Expr::Mul(_, _) | Expr::Div(_, _) if self.negated_form().is_some() => PREC_SUM,
            Expr::Mul(_, _) | Expr::Div(_, _) => PREC_PRODUCT,
            Expr::Pow(_, _) => PREC_POWER,
            _ => PREC_ATOM,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter, min_prec: u8) -> fmt::Result {
        let parens = self.precedence() < min_prec;
        if parens {
            write!(f, "(")?;
        }
        match self {
            Expr::Var(name) => write!(f, "{}", name)?,
            Expr::Const(val) => write!(f, "{}", val)?,
            Expr::Add(lhs, rhs) => {
                lhs.fmt_prec(f, PREC_SUM)?;
                match rhs.negated_form() {
                    Some(neg) => {
                        write!(f, " - ")?;
                        neg.fmt_prec(f, PREC_PRODUCT)?;
                    }
                    None => {
                        write!(f, " + ")?;
                        rhs.fmt_prec(f, PREC_SUM)?;
                    }
                }
            }
            Expr::Sub(lhs, rhs) => {
                lhs.fmt_prec(f, PREC_SUM)?;
                write!(f, " - ")?;
                rhs.fmt_prec(f, PREC_PRODUCT)?;
            }
            Expr::Mul(lhs, rhs) => match self.negated_form() {
                Some(neg) => {
                    write!(f, "-")?;
                    neg.fmt_prec(f, PREC_PRODUCT)?;
                }
                None => {
                    lhs.fmt_prec(f, PREC_PRODUCT)?;
                    write!(f, "*")?;
                    rhs.fmt_prec(f, PREC_PRODUCT)?;
                }
            },
            Expr::Div(lhs, rhs) => match self.negated_form() {
                Some(neg) => {
                    write!(f, "-")?;
                    neg.fmt_prec(f, PREC_PRODUCT)?;
                }
                None => {
                    lhs.fmt_prec(f, PREC_PRODUCT)?;
                    write!(f, "/")?;
                    rhs.fmt_prec(f, PREC_POWER)?;
                }
            },
            Expr::Pow(base, exp) => {
                base.fmt_prec(f, PREC_ATOM)?;
                write!(f, "^")?;
                exp.fmt_prec(f, PREC_ATOM)?;
            }
            Expr::Exp(expr) => write!(f, "exp({})", expr)?,
            Expr::Ln(expr) => write!(f, "ln({})", expr)?,
            Expr::sin(expr) => write!(f, "sin({})", expr)?,
            Expr::cos(expr) => write!(f, "cos({})", expr)?,
            Expr::tg(expr) => write!(f, "tan({})", expr)?,
        }
        if parens {
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// Display implementation for pretty printing symbolic expressions.
///
/// Parentheses are only emitted where operator precedence requires them, and a sum whose
/// right operand carries a negative leading constant is printed as a subtraction.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_prec(f, PREC_SUM)
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Mul(Box::new(Expr::num(-1)), Box::new(self))
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Creates multiple symbolic variables from a comma-separated string.
    ///
    /// # Examples
    /// ```
    /// use RustedVarParam::symbolic::symbolic_engine::Expr;
    /// let vars = Expr::Symbols("c1, c2, c3");
    /// assert_eq!(vars.len(), 3);
    /// ```
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Expr::Var(s.to_string()))
            .collect()
    }

    /// indexed family of symbols: `IndexedVars(3, "c")` gives c1, c2, c3 (numbering starts at 1)
    pub fn IndexedVars(num_vars: usize, var_name: &str) -> (Vec<Expr>, Vec<String>) {
        let names: Vec<String> = (1..=num_vars).map(|i| format!("{}{}", var_name, i)).collect();
        let vars = names.iter().map(|n| Expr::Var(n.clone())).collect();
        (vars, names)
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn num(n: i64) -> Expr {
        Expr::Const(Number::from_integer(n))
    }

    pub fn rational(q: BigRational) -> Expr {
        Expr::Const(Number::from_rational(q))
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn exp(self) -> Expr {
        Expr::Exp(self.boxed())
    }

    pub fn ln(self) -> Expr {
        Expr::Ln(self.boxed())
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(n) if n.is_zero())
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(n) if n.is_one())
    }

    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Expr::Const(n) => Some(n),
            _ => None,
        }
    }

    /// applies `f` to every direct argument and rebuilds the node
    pub fn map_args<F: FnMut(&Expr) -> Expr>(&self, mut f: F) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => Expr::Add(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Sub(lhs, rhs) => Expr::Sub(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Mul(lhs, rhs) => Expr::Mul(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Div(lhs, rhs) => Expr::Div(f(lhs).boxed(), f(rhs).boxed()),
            Expr::Pow(base, exp) => Expr::Pow(f(base).boxed(), f(exp).boxed()),
            Expr::Exp(expr) => Expr::Exp(f(expr).boxed()),
            Expr::Ln(expr) => Expr::Ln(f(expr).boxed()),
            Expr::sin(expr) => Expr::sin(f(expr).boxed()),
            Expr::cos(expr) => Expr::cos(f(expr).boxed()),
            Expr::tg(expr) => Expr::tg(f(expr).boxed()),
        }
    }

    /// direct arguments of the node
    pub fn args(&self) -> Vec<&Expr> {
        match self {
            Expr::Var(_) | Expr::Const(_) => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => vec![lhs, rhs],
            Expr::Exp(expr) | Expr::Ln(expr) | Expr::sin(expr) | Expr::cos(expr) | Expr::tg(expr) => {
                vec![expr]
            }
        }
    }

    /// Substitutes a variable with an exact constant value throughout the expression.
    pub fn set_variable(&self, var: &str, value: &Number) -> Expr {
        match self {
            Expr::Var(name) if name == var => Expr::Const(value.clone()),
            _ => self.map_args(|arg| arg.set_variable(var, value)),
        }
    }

    /// Substitutes multiple variables with constant values using a HashMap.
    pub fn set_variable_from_map(&self, var_map: &HashMap<String, Number>) -> Expr {
        match self {
            Expr::Var(name) => match var_map.get(name) {
                Some(value) => Expr::Const(value.clone()),
                None => self.clone(),
            },
            _ => self.map_args(|arg| arg.set_variable_from_map(var_map)),
        }
    }

    /// Replaces every occurrence of a variable by an expression.
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.map_args(|arg| arg.substitute_variable(var, expr)),
        }
    }

    pub fn rename_variable(&self, old_var: &str, new_var: &str) -> Expr {
        match self {
            Expr::Var(name) if name == old_var => Expr::Var(new_var.to_string()),
            _ => self.map_args(|arg| arg.rename_variable(old_var, new_var)),
        }
    }

    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            _ => self.args().iter().any(|arg| arg.contains_variable(var_name)),
        }
    }

    /// true when no node of the tree is a variable
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Var(_) => false,
            Expr::Const(_) => true,
            _ => self.args().iter().all(|arg| arg.is_constant()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_precedence() {
        let x = Expr::var("x");
        let e = (x.clone() + Expr::num(1)) * (x.clone() - Expr::num(2));
        assert_eq!(e.to_string(), "(x + 1)*(x - 2)");
        let e = x.clone().pow(Expr::rational(BigRational::new(1.into(), 2.into())));
        assert_eq!(e.to_string(), "x^(1/2)");
        let e = x.clone() + (-x.clone().exp());
        assert_eq!(e.to_string(), "x - exp(x)");
        let e = Expr::Div(Box::new(Expr::num(1)), Box::new(Expr::cos(x.clone().boxed())));
        assert_eq!(e.to_string(), "1/cos(x)");
        let e = Expr::Sub(x.clone().boxed(), (x.clone() + Expr::num(1)).boxed());
        assert_eq!(e.to_string(), "x - (x + 1)");
    }

    #[test]
    fn test_set_and_substitute() {
        let x = Expr::var("x");
        let c = Expr::var("c1");
        let e = c.clone() * x.clone().exp();
        let replaced = e.set_variable("c1", &Number::from_integer(3));
        assert_eq!(replaced, Expr::num(3) * x.clone().exp());
        assert!(!replaced.contains_variable("c1"));
        assert!(replaced.contains_variable("x"));
        let subs = e.substitute_variable("x", &(x.clone() + Expr::num(1)));
        assert_eq!(subs.to_string(), "c1*exp(x + 1)");
        assert!(Expr::Ln(Expr::num(2).boxed()).is_constant());
    }

    #[test]
    fn test_indexed_vars() {
        let (vars, names) = Expr::IndexedVars(2, "u");
        assert_eq!(names, vec!["u1".to_string(), "u2".to_string()]);
        assert_eq!(vars[1], Expr::var("u2"));
        assert_eq!(Expr::Symbols("a, ,b").len(), 2);
    }
}
