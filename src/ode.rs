/// # Variation of parameters for linear ODEs with constant coefficients
///
/// The solver runs these stages in order:
/// parser -> root classifier -> Wronskian -> coefficient solver -> integrator -> general
/// solution -> (optional) initial conditions.
///# Example
/// ```
/// use RustedVarParam::ode::vop_solver::VariationOfParameters;
/// let mut solver = VariationOfParameters::new("y'' + y = 1/cos(x)").unwrap();
/// solver.solve().unwrap();
/// println!("{}", solver.get_general_solution_pretty());
/// let outcome = solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 0"]).unwrap();
/// assert!(outcome.is_resolved());
/// let samples = solver.sample(0.0, 1.0, 11).unwrap();
/// assert_eq!(samples.len(), 11);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod vop_solver;
/// equation string -> characteristic polynomial and forcing term
pub mod equation_parser;
/// roots with multiplicities -> fundamental solution set
pub mod root_classifier;
pub mod wronskian;
/// u_i' from the Wronskian system
pub mod particular_coefficients;
pub mod integrator;
/// homogeneous + particular part, residual check
pub mod general_solution;
/// constants c1..cn from conditions y^(k)(x0) = y0
pub mod initial_conditions;
pub mod limits;
pub mod vop_error;
#[cfg(test)]
mod vop_tests;
