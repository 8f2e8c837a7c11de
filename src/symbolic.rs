#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedVarParam::symbolic::symbolic_engine::Expr;
/// let input = "x^2 e^(3x) - sin(2x)/x";
/// let parsed_expression = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", parsed_expression);
/// let parsed_function = parsed_expression.lambdify1D("x").unwrap();
/// println!("{}, Rust function: {}  \n", input, parsed_function(1.0));
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) holds the symbolic expression tree `Expr` with exact constants
/// 2) turns a symbolic expression into a Rust function
/// 3) turns a symbolic expression into a string expression for printing and control results
///# Example#
/// ```
/// use RustedVarParam::symbolic::symbolic_engine::Expr;
/// let input = "exp(x) + ln(c1)";
///   // here you've got symbolic expression
///   let parsed_expression = Expr::parse_expression(input).unwrap();
///   // return vec of all arguments
///   let  all = parsed_expression.all_arguments_are_variables();
///   assert_eq!(all, vec!["c1".to_string(), "x".to_string()]);
///   // differentiate with respect to x
///   let df_dx = parsed_expression.diff("x").simplify_();
///   println!("df_dx = {}", df_dx);
///   // evaluate the expression
///   let f_res = parsed_expression.eval_expression(&["x", "c1"], &[0.0, 1.0]);
///   assert_eq!(f_res, 1.0);
/// ```
pub mod symbolic_engine;
/// analytical derivatives and direct numerical evaluation of expressions
pub mod symbolic_engine_derivatives;
/// conversion of expressions into closures
pub mod symbolic_lambdify;
/// constant folding and algebraic identities
pub mod symbolic_simplify;
/// exact numbers of the field Q(i, sqrt(2), sqrt(3), ...) used as constants everywhere
pub mod algebraic_number;
/// canonical expanded form of expressions in one variable: exact zero tests and equality
pub mod symbolic_expand;
/// exact ring of sums c*x^k*exp(lambda*x): basis functions, Wronskians and their integrals
pub mod quasi_polynomial;
/// matrices over the quasi-polynomial ring with exact determinants and cofactors
pub mod quasi_matrix;
/// polynomials over Q, square-free decomposition and exact roots
pub mod polynomial;
/// closed-form antiderivatives of expanded expressions
pub mod symbolic_integration;
pub mod utils;
