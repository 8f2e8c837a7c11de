//! # Symbolic Expression Simplification Module
//!
//! Bottom-up simplification of expression trees:
//!
//! 1. **Constant Folding**: exact arithmetic on `Const` nodes, including integer powers and
//!    square roots of rationals
//! 2. **Algebraic Identities**: x + 0 = x, x * 1 = x, 0 * x = 0, x ^ 1 = x, x / 1 = x
//! 3. **Function Identities**: exp(0) = 1, ln(1) = 0, sin(0) = 0, cos(0) = 1, ln(exp(a)) = a
//! 4. **Power Rules**: (exp(a))^b = exp(a*b), (a^m)^n = a^(m*n) for integer m, n
//!
//! Collecting like terms is not done here; the canonical form for that purpose is
//! [`crate::symbolic::symbolic_expand::Expanded`].
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::symbolic_engine::Expr;
use num::{BigInt, One};

/// c^q for an exact constant and a rational exponent, when the result stays in the field
fn fold_power(base: &Number, exponent: &Number) -> Option<Number> {
    let q = exponent.as_rational()?;
    if q.denom().is_one() {
        let k: i64 = num::ToPrimitive::to_i64(q.numer())?;
        return base.pow(k);
    }
    if *q.denom() == BigInt::from(2) {
        let b = base.as_rational()?;
        let root = Number::sqrt_rational(&b)?;
        let k: i64 = num::ToPrimitive::to_i64(q.numer())?;
        return root.pow(k);
    }
    None
}

impl Expr {
    //___________________________________SIMPLIFICATION____________________________________

    /// Simplifies the expression by folding constants and applying trivial identities.
    ///
    /// ## Examples
    /// - `2 * 3 + x * 1` → `6 + x`
    /// - `exp(x)^2` → `exp(2*x)`
    /// - `sqrt(8)` (parsed as `8^(1/2)`) → `2*sqrt(2)`
    pub fn simplify_(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => {
                let a = lhs.simplify_();
                let b = rhs.simplify_();
                match (&a, &b) {
                    (Expr::Const(x), Expr::Const(y)) => Expr::Const(x + y),
                    _ if a.is_zero() => b,
                    _ if b.is_zero() => a,
                    _ => Expr::Add(a.boxed(), b.boxed()),
                }
            }
            Expr::Sub(lhs, rhs) => {
                let a = lhs.simplify_();
                let b = rhs.simplify_();
                match (&a, &b) {
                    (Expr::Const(x), Expr::Const(y)) => Expr::Const(x - y),
                    _ if b.is_zero() => a,
                    _ if a == b => Expr::num(0),
                    _ if a.is_zero() => Expr::Mul(Expr::num(-1).boxed(), b.boxed()).simplify_(),
                    _ => Expr::Sub(a.boxed(), b.boxed()),
                }
            }
            Expr::Mul(lhs, rhs) => {
                let a = lhs.simplify_();
                let b = rhs.simplify_();
                match (&a, &b) {
                    (Expr::Const(x), Expr::Const(y)) => Expr::Const(x * y),
                    _ if a.is_zero() || b.is_zero() => Expr::num(0),
                    _ if a.is_one() => b,
                    _ if b.is_one() => a,
                    (Expr::Const(x), Expr::Mul(inner_l, inner_r)) => match inner_l.as_ref() {
                        Expr::Const(y) => Expr::Mul(Expr::Const(x * y).boxed(), inner_r.clone()),
                        _ => Expr::Mul(a.boxed(), b.boxed()),
                    },
                    (_, Expr::Const(_)) => Expr::Mul(b.boxed(), a.boxed()),
                    _ => Expr::Mul(a.boxed(), b.boxed()),
                }
            }
            Expr::Div(lhs, rhs) => {
                let a = lhs.simplify_();
                let b = rhs.simplify_();
                match (&a, &b) {
                    (Expr::Const(x), Expr::Const(y)) => match x.checked_div(y) {
                        Some(q) => Expr::Const(q),
                        None => Expr::Div(a.boxed(), b.boxed()),
                    },
                    _ if b.is_one() => a,
                    _ if a.is_zero() && !b.is_zero() => Expr::num(0),
                    _ if a == b && !b.is_zero() => Expr::num(1),
                    _ => Expr::Div(a.boxed(), b.boxed()),
                }
            }
            Expr::Pow(base, exp) => {
                let b = base.simplify_();
                let e = exp.simplify_();
                if e.is_zero() {
                    return Expr::num(1);
                }
                if e.is_one() {
                    return b;
                }
                if b.is_one() {
                    return Expr::num(1);
                }
                match (&b, &e) {
                    (Expr::Const(x), Expr::Const(y)) => match fold_power(x, y) {
                        Some(v) => Expr::Const(v),
                        None => Expr::Pow(b.boxed(), e.boxed()),
                    },
                    (Expr::Exp(arg), _) => {
                        Expr::Exp(Expr::Mul(e.clone().boxed(), arg.clone()).boxed()).simplify_()
                    }
                    (Expr::Pow(inner_base, inner_exp), Expr::Const(n)) => {
                        match (inner_exp.as_number().and_then(|m| m.as_integer()), n.as_integer()) {
                            (Some(m), Some(k)) => Expr::Pow(
                                inner_base.clone(),
                                Expr::num(m * k).boxed(),
                            )
                            .simplify_(),
                            _ => Expr::Pow(b.boxed(), e.boxed()),
                        }
                    }
                    _ => Expr::Pow(b.boxed(), e.boxed()),
                }
            }
            Expr::Exp(arg) => {
                let a = arg.simplify_();
                if a.is_zero() {
                    return Expr::num(1);
                }
                match a {
                    Expr::Ln(inner) => *inner,
                    other => Expr::Exp(other.boxed()),
                }
            }
            Expr::Ln(arg) => {
                let a = arg.simplify_();
                if a.is_one() {
                    return Expr::num(0);
                }
                match a {
                    Expr::Exp(inner) => *inner,
                    other => Expr::Ln(other.boxed()),
                }
            }
            Expr::sin(arg) => {
                let a = arg.simplify_();
                if a.is_zero() { Expr::num(0) } else { Expr::sin(a.boxed()) }
            }
            Expr::cos(arg) => {
                let a = arg.simplify_();
                if a.is_zero() { Expr::num(1) } else { Expr::cos(a.boxed()) }
            }
            Expr::tg(arg) => {
                let a = arg.simplify_();
                if a.is_zero() { Expr::num(0) } else { Expr::tg(a.boxed()) }
            }
        }
    }

    /// exact value of a constant expression, when folding reduces it to a single number
    pub fn fold_constant(&self) -> Option<Number> {
        match self.simplify_() {
            Expr::Const(n) => Some(n),
            _ => None,
        }
    }
}
