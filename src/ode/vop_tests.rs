use crate::Utils::config::SolverConfig;
use crate::ode::initial_conditions::ConditionOutcome;
use crate::ode::vop_error::VopError;
use crate::ode::vop_solver::{SolverStage, VariationOfParameters};
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_expand::Expanded;
use crate::symbolic::utils::{linspace, max_abs_difference, numerical_derivative};
use approx::assert_relative_eq;
use num::BigRational;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

fn quiet() -> SolverConfig {
    SolverConfig {
        loglevel: Some("off".to_string()),
        ..SolverConfig::default()
    }
}

fn solved(equation: &str) -> VariationOfParameters {
    let mut solver = VariationOfParameters::with_config(equation, quiet()).unwrap();
    solver.solve().unwrap();
    solver
}

fn expand(s: &str) -> Expanded {
    Expanded::from_expr(&Expr::parse_expression(s).unwrap(), "x").unwrap()
}

#[test]
fn test_fundamental_sets() {
    let cases = [
        ("y'' - y = 0", "[exp(x), exp(-x)]"),
        ("y'' + y = 0", "[cos(x), sin(x)]"),
        ("y'' - 2y' + y = e^x", "[exp(x), x*exp(x)]"),
        ("y''' - y'' + y' - y = 0", "[exp(x), cos(x), sin(x)]"),
    ];
    for (equation, fss) in cases {
        let mut solver = VariationOfParameters::with_config(equation, quiet()).unwrap();
        let h = solver.solve_homogeneous().unwrap();
        assert_eq!(h.fss.to_string(), fss, "{}", equation);
        assert_eq!(h.fss.len(), solver.spec.order);
    }
}

#[test]
fn test_repeated_root_particular() {
    let solver = solved("y'' - 2y' + y = e^x");
    assert_eq!(solver.particular().unwrap().solution, expand("x^2 e^x / 2"));
    assert_eq!(
        solver.general().unwrap().expanded,
        expand("c1 e^x + c2 x e^x + x^2 e^x / 2")
    );
    assert!(solver.verify_solution().unwrap().exact);
}

#[test]
fn test_initial_conditions_of_cosh() {
    let mut solver = solved("y'' - y = 0");
    let outcome = solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 0"]).unwrap();
    assert!(outcome.is_resolved());
    let f = solver.final_solution().unwrap();
    let half = Expanded::constant("x", Number::from_rational(BigRational::new(1.into(), 2.into())));
    assert_eq!(f.constants, vec![("c1".to_string(), half.clone()), ("c2".to_string(), half)]);
    assert_eq!(f.expanded, expand("e^x/2 + e^(-x)/2"));
    assert_eq!(solver.stage(), SolverStage::Finalized);
}

#[test]
fn test_oracle() {
    let equations = [
        "y'' - 2y' + y = e^x",
        "y''' - y' = x e^(2x)",
        "y'' + 4y = sin(2x)",
        "y'' + 2y' + 5y = x^2 + e^(-x) cos(2x)",
        "y'''' - y = cos(x)",
        "y'' + y = 1/cos(x)",
        "y'' - 2y' + y = e^x/x",
        "2y'' + 3y' + y = 4",
        "3y''' - 3y' = 6x",
        "y'' + y = tan(x)",
        "y'''' + 4y = x",
        "y'' + y = e",
    ];
    for equation in equations {
        let solver = solved(equation);
        let v = solver.verify_solution().unwrap();
        assert!(v.is_valid(1e-8), "{}: residual {}", equation, v.max_residual);
        // real basis only
        assert!(!solver.get_general_solution_pretty().contains('I'), "{}", equation);
    }
}

#[test]
fn test_leading_coefficient() {
    let solver = solved("2y'' + 3y' + y = 4");
    assert_eq!(solver.particular().unwrap().solution, expand("4"));
    assert!(solver.verify_solution().unwrap().exact);
}

#[test]
fn test_tangent_forcing() {
    let solver = solved("y'' + y = tan(x)");
    let particular = solver.particular().unwrap().solution.to_expr().lambdify1D("x").unwrap();
    for x in linspace(-1.2, 1.2, 13) {
        let expected = -x.cos() * ((1.0 + x.sin()) / x.cos()).ln();
        assert_relative_eq!(particular(x), expected, epsilon = 1e-10);
    }
}

#[test]
fn test_complex_biquadratic_roots() {
    let mut solver = VariationOfParameters::with_config("y'''' + 4y = 0", quiet()).unwrap();
    let h = solver.solve_homogeneous().unwrap();
    assert_eq!(h.fss.len(), 4);
    assert!(!h.fss.to_string().contains('I'));
    assert_eq!(
        h.fss.to_string(),
        "[exp(-x)*cos(x), exp(-x)*sin(x), exp(x)*cos(x), exp(x)*sin(x)]"
    );
}

#[test]
fn test_large_coefficient() {
    let mut solver = VariationOfParameters::with_config("y'' + 9223372036854775807y = 0", quiet()).unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.homogeneous().unwrap().fss.len(), 2);
    assert!(solver.verify_solution().unwrap().exact);
}

#[test]
fn test_constant_exponential_forcing() {
    let solver = solved("y'' + y = e");
    assert_eq!(solver.particular().unwrap().solution, expand("e"));
    assert_eq!(
        solver.general().unwrap().expanded,
        expand("c1 cos(x) + c2 sin(x) + e")
    );
}

#[test]
fn test_wronskian_is_nonsingular() {
    for equation in ["y'' - y = 0", "y'' + 2y' + 5y = 0", "y'''' + 2y'' + y = 0", "y''' = x"] {
        let solver = solved(equation);
        let c = &solver.particular().unwrap().coefficients;
        assert!(!c.determinant.is_zero());
        for x in [0.0, 0.37, 1.3] {
            assert!(c.wronskian.evaluate(x).determinant().abs() > 1e-12, "{} at {}", equation, x);
        }
    }
}

#[test]
fn test_secant_forcing() {
    let solver = solved("y'' + y = 1/cos(x)");
    let particular = solver.particular().unwrap().solution.to_expr().lambdify1D("x").unwrap();
    for x in linspace(-1.2, 1.2, 13) {
        assert_relative_eq!(particular(x), x.cos().ln() * x.cos() + x * x.sin(), epsilon = 1e-12);
    }
}

#[test]
fn test_final_solution_satisfies_equation() {
    let mut solver = solved("y'' + y = 1/cos(x)");
    solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 0"]).unwrap();
    let y = solver.final_solution().unwrap().lambdify().unwrap();
    let h = 1e-4;
    assert_relative_eq!(y(0.0), 1.0, epsilon = 1e-12);
    assert!(numerical_derivative(|x| y(x), &[0.0], h)[0].abs() < 1e-7);
    let xs = linspace(-1.0, 1.0, 9);
    let d2y = numerical_derivative(|x| (y(x + h) - y(x - h)) / (2.0 * h), &xs, h);
    let lhs: Vec<f64> = xs.iter().zip(&d2y).map(|(x, d)| d + y(*x)).collect();
    let rhs: Vec<f64> = xs.iter().map(|x| 1.0 / x.cos()).collect();
    assert!(max_abs_difference(&lhs, &rhs) < 1e-4);
}

#[test]
fn test_logarithmic_coefficient() {
    let solver = solved("y'' - 2y' + y = e^x/x");
    let u = &solver.particular().unwrap().integrated;
    assert_eq!(u[0], expand("-x"));
    assert_eq!(u[1], expand("ln(x)"));
    let particular = solver.particular().unwrap().solution.to_expr().lambdify1D("x").unwrap();
    for x in linspace(0.2, 3.0, 8) {
        assert_relative_eq!(particular(x), -x * x.exp() + x * x.exp() * x.ln(), epsilon = 1e-10);
    }
}

#[test]
fn test_non_elementary_integral() {
    let mut solver = VariationOfParameters::with_config("y'' - 3y' + 2y = 1/x", quiet()).unwrap();
    solver.solve_homogeneous().unwrap();
    assert!(matches!(
        solver.solve_particular(),
        Err(VopError::NonElementaryIntegral { .. })
    ));
    assert_eq!(solver.stage(), SolverStage::HomogeneousSolved);
    assert!(solver.particular().is_none());
}

#[test]
fn test_condition_count() {
    let mut solver = solved("y'' - y = 0");
    assert_eq!(
        solver.apply_condition_strings(&["y(0) = 1"]),
        Err(VopError::ConditionCount { expected: 2, found: 1 })
    );
    assert_eq!(
        solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 0", "y''(0) = 1"]),
        Err(VopError::ConditionCount { expected: 2, found: 3 })
    );
    assert_eq!(solver.stage(), SolverStage::GeneralSolved);
    assert_eq!(solver.get_final_solution_pretty(), "not computed");
}

#[test]
fn test_stage_order() {
    let mut solver = VariationOfParameters::with_config("y'' + y = x", quiet()).unwrap();
    assert_eq!(solver.get_general_solution_pretty(), "not computed");
    assert!(matches!(solver.solve_particular(), Err(VopError::StageOrder { .. })));
    assert!(matches!(solver.create_general_solution(), Err(VopError::StageOrder { .. })));
    assert!(matches!(
        solver.apply_condition_strings(&["y(0) = 0", "y'(0) = 0"]),
        Err(VopError::StageOrder { .. })
    ));
    assert!(matches!(solver.verify_solution(), Err(VopError::StageOrder { .. })));
    assert!(matches!(solver.sample(0.0, 1.0, 3), Err(VopError::StageOrder { .. })));
    assert_eq!(solver.stage(), SolverStage::Unsolved);
}

#[test]
fn test_idempotent_stages() {
    let mut solver = solved("y'' + y = x");
    let h = solver.solve_homogeneous().unwrap().clone();
    let p = solver.solve_particular().unwrap().clone();
    let g = solver.create_general_solution().unwrap().clone();
    assert_eq!(solver.solve_homogeneous().unwrap(), &h);
    assert_eq!(solver.solve_particular().unwrap(), &p);
    assert_eq!(solver.create_general_solution().unwrap(), &g);
    assert_eq!(solver.stage(), SolverStage::GeneralSolved);
    assert_eq!(p.solution, expand("x"));
    assert_eq!(g.expanded, expand("c1 cos(x) + c2 sin(x) + x"));
}

#[test]
fn test_repeated_conditions_keep_last_final_solution() {
    let mut solver = solved("y'' + y = x");
    let first = solver.apply_condition_strings(&["y(0) = 0", "y'(0) = 1"]).unwrap();
    assert!(first.is_resolved());
    assert_eq!(solver.final_solution().unwrap().expanded, expand("x"));
    let second = solver.apply_condition_strings(&["y(0) = 0", "y(0) = 1"]).unwrap();
    assert!(matches!(second, ConditionOutcome::Unresolved { .. }));
    assert_eq!(solver.final_solution().unwrap().expanded, expand("x"));
    assert_eq!(solver.last_outcome(), Some(&second));
    let third = solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 1"]).unwrap();
    assert!(third.is_resolved());
    assert_eq!(solver.final_solution().unwrap().expanded, expand("cos(x) + x"));
}

#[test]
fn test_sampling() {
    let mut solver = solved("y'' + y = 0");
    solver.apply_condition_strings(&["y(0) = 0", "y'(0) = 1"]).unwrap();
    let samples = solver.sample_default(0.0, 3.0).unwrap();
    assert_eq!(samples.len(), 400);
    for (x, y) in samples {
        assert_relative_eq!(y, x.sin(), epsilon = 1e-12);
    }
    let path = std::env::temp_dir().join("vop_tests_samples.txt");
    let filename = path.to_string_lossy().to_string();
    solver.save_samples(0.0, 1.0, &filename).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 401);
    assert!(content.starts_with("x\ty"));
}

#[test]
fn test_custom_variables() {
    let config = SolverConfig {
        independent_var: "t".to_string(),
        dependent_var: "z".to_string(),
        ..quiet()
    };
    let mut solver = VariationOfParameters::with_config("z'' + z = 0", config).unwrap();
    solver.solve().unwrap();
    assert_eq!(solver.homogeneous().unwrap().fss.to_string(), "[cos(t), sin(t)]");
    let outcome = solver.apply_condition_strings(&["z(0) = 0", "z'(0) = 1"]).unwrap();
    assert!(outcome.is_resolved());
    assert_eq!(solver.final_solution().unwrap().to_string(), "sin(t)");
}

#[test]
fn test_cancelled_solver_keeps_stage() {
    let mut solver = VariationOfParameters::with_config("y'' - y = x", quiet()).unwrap();
    solver.set_cancel_flag(Arc::new(AtomicBool::new(true)));
    assert_eq!(solver.solve_homogeneous().err(), Some(VopError::Cancelled));
    assert_eq!(solver.stage(), SolverStage::Unsolved);
}
