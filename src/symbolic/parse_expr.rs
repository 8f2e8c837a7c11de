//! # Expression parser
//!
//! Recursive-descent parser built on nom that turns strings like `2x^2 - 3e^(2x)sin(x)` into
//! [`Expr`] trees.
//!
//! Grammar (lowest binding first):
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary | power)*      -- a bare power is implicit multiplication
//! unary  := ('-' | '+') unary | power
//! power  := atom (('^' | '**') exponent)?           -- right associative, exponent may be signed
//! atom   := number | '(' expr ')' | function '(' expr ')' | identifier
//! ```
//! Decimal literals are read exactly (`0.25` is `1/4`). The identifier `e` is Euler's number and
//! becomes `exp(1)`, so `e^u` simplifies to `exp(u)`. Known functions: `exp`, `ln`, `log`
//! (natural), `sin`, `cos`, `tan`/`tg`, `sqrt`.
use crate::symbolic::symbolic_engine::Expr;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{multispace0, satisfy},
    combinator::{opt, recognize},
    multi::fold_many0,
    sequence::{delimited, pair, preceded},
};
use num::{BigInt, BigRational, One, Zero};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    NomError(String),
    #[error("Unconsumed input: {0}")]
    UnconsumedInput(String),
    #[error("Empty expression")]
    Empty,
}

const FUNCTIONS: [&str; 8] = ["exp", "ln", "log", "sin", "cos", "tan", "tg", "sqrt"];

/// "8.25" -> 33/4, ".5" -> 1/2, "8." -> 8
pub fn decimal_to_rational(integer_part: &str, fractional_part: &str) -> BigRational {
    let int_val: BigInt = integer_part.parse().unwrap_or_else(|_| BigInt::zero());
    if fractional_part.is_empty() {
        return BigRational::from_integer(int_val);
    }
    let mut denominator = BigInt::one();
    for _ in 0..fractional_part.len() {
        denominator *= 10;
    }
    let frac_val: BigInt = fractional_part.parse().unwrap_or_else(|_| BigInt::zero());
    BigRational::new(int_val * &denominator + frac_val, denominator)
}

fn digit_error(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
}

fn parse_number(input: &str) -> IResult<&str, Expr> {
    let is_digit = |c: char| c.is_ascii_digit();
    let (remaining, (int_part, maybe_frac)) =
        pair(take_while(is_digit), opt(pair(tag("."), take_while(is_digit)))).parse(input)?;
    let frac_part = maybe_frac.map(|(_, frac)| frac).unwrap_or("");
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(digit_error(input));
    }
    Ok((remaining, Expr::rational(decimal_to_rational(int_part, frac_part))))
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn parse_parens(input: &str) -> IResult<&str, Expr> {
    delimited(tag("("), parse_expr, preceded(multispace0, tag(")"))).parse(input)
}

fn apply_function(name: &str, arg: Expr) -> Expr {
    match name {
        "exp" => Expr::Exp(arg.boxed()),
        "ln" | "log" => Expr::Ln(arg.boxed()),
        "sin" => Expr::sin(arg.boxed()),
        "cos" => Expr::cos(arg.boxed()),
        "tan" | "tg" => Expr::tg(arg.boxed()),
        _ => Expr::Pow(arg.boxed(), Expr::rational(BigRational::new(1.into(), 2.into())).boxed()),
    }
}

/// function call, Euler's number or a plain variable
fn parse_name(input: &str) -> IResult<&str, Expr> {
    let (rest, name) = parse_identifier(input)?;
    if FUNCTIONS.contains(&name) {
        let (rest, arg) = preceded(multispace0, parse_parens).parse(rest)?;
        return Ok((rest, apply_function(name, arg)));
    }
    if name == "e" {
        return Ok((rest, Expr::Exp(Expr::num(1).boxed())));
    }
    Ok((rest, Expr::Var(name.to_string())))
}

fn parse_atom(input: &str) -> IResult<&str, Expr> {
    preceded(multispace0, alt((parse_number, parse_parens, parse_name))).parse(input)
}

// right associative: 2^3^4 = 2^(3^4)
fn parse_power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = parse_atom(input)?;
    let (input, caret) = opt(preceded(multispace0, alt((tag("**"), tag("^"))))).parse(input)?;
    if caret.is_none() {
        return Ok((input, base));
    }
    let (input, exp) = parse_power_exponent(input)?;
    Ok((input, Expr::Pow(base.boxed(), exp.boxed())))
}

fn parse_power_exponent(input: &str) -> IResult<&str, Expr> {
    let (input, sign) = opt(preceded(multispace0, alt((tag("-"), tag("+"))))).parse(input)?;
    match sign {
        Some("-") => {
            let (input, exp) = parse_power_exponent(input)?;
            Ok((input, -exp))
        }
        Some(_) => parse_power_exponent(input),
        None => parse_power(input),
    }
}

fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let (input, sign) = opt(preceded(multispace0, alt((tag("-"), tag("+"))))).parse(input)?;
    match sign {
        Some("-") => {
            let (input, expr) = parse_unary(input)?;
            Ok((input, -expr))
        }
        Some(_) => parse_unary(input),
        None => parse_power(input),
    }
}

/// next token can start an implicitly multiplied factor: 2x, x(x+1), (x+1)(x-1), 3 sin(x)
fn starts_factor(input: &str) -> bool {
    input
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '(' || c == '.')
}

fn parse_term(input: &str) -> IResult<&str, Expr> {
    let (mut input, mut acc) = parse_unary(input)?;
    loop {
        let (rest, op) = opt(preceded(multispace0, alt((tag("*"), tag("/"))))).parse(input)?;
        match op {
            Some("*") => {
                let (rest, rhs) = parse_unary(rest)?;
                acc = Expr::Mul(acc.boxed(), rhs.boxed());
                input = rest;
            }
            Some(_) => {
                let (rest, rhs) = parse_unary(rest)?;
                acc = Expr::Div(acc.boxed(), rhs.boxed());
                input = rest;
            }
            None if starts_factor(input) => {
                let (rest, rhs) = parse_power(input)?;
                acc = Expr::Mul(acc.boxed(), rhs.boxed());
                input = rest;
            }
            None => break,
        }
    }
    Ok((input, acc))
}

fn parse_expr(input: &str) -> IResult<&str, Expr> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, alt((tag("+"), tag("-")))), parse_term),
        move || init.clone(),
        |acc, (op, val)| match op {
            "+" => Expr::Add(acc.boxed(), val.boxed()),
            _ => Expr::Sub(acc.boxed(), val.boxed()),
        },
    )
    .parse(input)
}

/// parses a whole string into an expression; trailing garbage is an error
pub fn parse_expression_func(input: &str) -> Result<Expr, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let (remaining, expr) = parse_expr(input).map_err(|e| ParseError::NomError(format!("{}", e)))?;
    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(ParseError::UnconsumedInput(remaining.to_string()));
    }
    Ok(expr)
}

impl Expr {
    /// parse a string into a symbolic expression
    /// # Example
    /// ```
    /// use RustedVarParam::symbolic::symbolic_engine::Expr;
    /// let e = Expr::parse_expression("2x e^(3x)").unwrap();
    /// assert_eq!(e.eval_expression(&["x"], &[0.0]), 0.0);
    /// ```
    pub fn parse_expression(input: &str) -> Result<Expr, ParseError> {
        parse_expression_func(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn eval(input: &str, x: f64) -> f64 {
        parse_expression_func(input).unwrap().eval_expression(&["x"], &[x])
    }

    #[test]
    fn test_parse_numbers_exactly() {
        assert_eq!(
            parse_expression_func("0.25").unwrap(),
            Expr::rational(BigRational::new(1.into(), 4.into()))
        );
        assert_eq!(parse_expression_func(".5").unwrap().to_string(), "1/2");
        assert_eq!(parse_expression_func("12").unwrap(), Expr::num(12));
    }

    #[test]
    fn test_parse_arithmetic_and_precedence() {
        assert_relative_eq!(eval("1 + 2*3 - 4/2", 0.0), 5.0);
        assert_relative_eq!(eval("2^3^2", 0.0), 512.0);
        assert_relative_eq!(eval("-x^2", 3.0), -9.0);
        assert_relative_eq!(eval("x^-1", 4.0), 0.25);
        assert_relative_eq!(eval("x**2", 5.0), 25.0);
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_relative_eq!(eval("2x", 1.5), 3.0);
        assert_relative_eq!(eval("3x^2", 2.0), 12.0);
        assert_relative_eq!(eval("(x+1)(x-1)", 3.0), 8.0);
        assert_relative_eq!(eval("x(x+1)", 2.0), 6.0);
        assert_relative_eq!(eval("2 sin(x)", 0.5), 2.0 * 0.5_f64.sin());
        assert_relative_eq!(eval("2x - 1", 2.0), 3.0);
    }

    #[test]
    fn test_functions_and_euler_number() {
        assert_relative_eq!(eval("e^x", 1.0), std::f64::consts::E, epsilon = 1e-12);
        assert_relative_eq!(eval("x e^(2x)", 0.5), 0.5 * 1.0_f64.exp(), epsilon = 1e-12);
        assert_relative_eq!(eval("1/cos(x)", 0.3), 1.0 / 0.3_f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(eval("tan(x) + ln(x)", 0.7), 0.7_f64.tan() + 0.7_f64.ln(), epsilon = 1e-12);
        assert_relative_eq!(eval("sqrt(x)", 9.0), 3.0, epsilon = 1e-12);
        let e = parse_expression_func("e^x").unwrap().simplify_();
        assert_eq!(e, Expr::Exp(Expr::var("x").boxed()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_expression_func("x +"), Err(ParseError::UnconsumedInput(_))));
        assert!(parse_expression_func("sin").is_err());
        assert!(parse_expression_func("(x").is_err());
        assert_eq!(parse_expression_func("   "), Err(ParseError::Empty));
        assert!(matches!(parse_expression_func("x = 1"), Err(ParseError::UnconsumedInput(_))));
    }
}
