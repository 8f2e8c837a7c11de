#![allow(non_snake_case)]
use RustedVarParam::Utils::config::SolverConfig;
use RustedVarParam::ode::initial_conditions::ConditionOutcome;
use RustedVarParam::ode::vop_solver::VariationOfParameters;
use RustedVarParam::symbolic::symbolic_engine::Expr;
use RustedVarParam::symbolic::symbolic_expand::Expanded;

fn main() {
    let example = 2;
    match example {
        0 => {
            // parse, expand and integrate an expression
            let input = "x e^(2x) + 1/x";
            let parsed_expression = Expr::parse_expression(input).unwrap();
            println!(" parsed_expression {}", parsed_expression);
            let expanded = Expanded::from_expr(&parsed_expression, "x").unwrap();
            println!(" expanded {}", expanded);
            let integral = expanded.integrate().unwrap();
            println!(" integral {}", integral);
            let df_dx = integral.diff().unwrap();
            println!(" derivative of the integral {} \n", df_dx);
        }
        1 => {
            // stage by stage
            let mut solver = VariationOfParameters::new("y'' - 2y' + y = e^x").unwrap();
            let homogeneous = solver.solve_homogeneous().unwrap();
            println!("roots {}, FSS {}", homogeneous.roots, homogeneous.fss);
            let particular = solver.solve_particular().unwrap();
            println!("particular solution {}", particular);
            solver.create_general_solution().unwrap();
            println!("{}", solver.get_general_solution_pretty());
            match solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 0"]).unwrap() {
                ConditionOutcome::Resolved(final_solution) => {
                    for line in &final_solution.log {
                        println!("{}", line);
                    }
                    println!("{}", final_solution.pretty());
                }
                ConditionOutcome::Unresolved { reason, .. } => println!("{}", reason),
            }
        }
        2 => {
            // whole pipeline with the logger on, then sampling for a plot
            let mut solver = VariationOfParameters::new("y'' + y = 1/cos(x)").unwrap();
            solver.solve().unwrap();
            let outcome = solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 0"]).unwrap();
            println!("resolved: {}", outcome.is_resolved());
            println!("{}", solver.get_final_solution_pretty());
            println!("verification {:?}", solver.verify_solution().unwrap());
            let samples = solver.sample(-1.2, 1.2, 7).unwrap();
            println!("samples {:?}", samples);
        }
        3 => {
            // configuration from TOML
            let config = SolverConfig::from_toml_str(
                r#"
                loglevel = "debug"
                timeout_ms = 2000
                independent_var = "t"
                "#,
            )
            .unwrap();
            let mut solver = VariationOfParameters::with_config("y''' - y' = t e^(2t)", config).unwrap();
            match solver.solve() {
                Ok(general) => println!("y(t) = {}", general),
                Err(e) => println!("error: {}", e),
            }
        }
        _ => {
            println!("no such example");
        }
    }
}
