//! # Variation of parameters solver
//!
//! Stateful front end of the pipeline. Each stage stores its immutable record and advances the
//! stage tag; a stage may only run after its predecessor, and running it again returns the stored
//! record.
//!
//! # Examples
//! ```
//! use RustedVarParam::ode::vop_solver::VariationOfParameters;
//! let mut solver = VariationOfParameters::new("y'' - 2y' + y = e^x").unwrap();
//! solver.solve_homogeneous().unwrap();
//! solver.solve_particular().unwrap();
//! solver.create_general_solution().unwrap();
//! let outcome = solver.apply_condition_strings(&["y(0) = 1", "y'(0) = 0"]).unwrap();
//! assert!(outcome.is_resolved());
//! assert!(solver.verify_solution().unwrap().is_valid(1e-9));
//! ```
use crate::Utils::config::SolverConfig;
use crate::Utils::logger::{init_logger, save_samples_to_file};
use crate::ode::equation_parser::EquationSpec;
use crate::ode::general_solution::{
    GeneralSolution, ParticularSolution, Verification, assemble_general, assemble_particular, verify,
};
use crate::ode::initial_conditions::{ConditionOutcome, ConditionTriple, FinalSolution, solve_conditions};
use crate::ode::integrator::integrate_coefficients;
use crate::ode::limits::SolverLimits;
use crate::ode::particular_coefficients::solve_coefficients;
use crate::ode::root_classifier::{HomogeneousSolution, solve_homogeneous};
use crate::ode::vop_error::{VopError, VopResult};
use crate::ode::wronskian::Wronskian;
use crate::symbolic::utils::linspace;
use log::info;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;
use strum_macros::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum SolverStage {
    Unsolved,
    HomogeneousSolved,
    ParticularSolved,
    GeneralSolved,
    Finalized,
}

pub struct VariationOfParameters {
    pub config: SolverConfig,
    limits: SolverLimits,
    pub spec: EquationSpec,
    stage: SolverStage,
    homogeneous: Option<HomogeneousSolution>,
    particular: Option<ParticularSolution>,
    general: Option<GeneralSolution>,
    final_solution: Option<FinalSolution>,
    last_outcome: Option<ConditionOutcome>,
}

const NOT_COMPUTED: &str = "not computed";

fn require<'a, T>(record: &'a Option<T>, operation: &str, required: SolverStage, current: SolverStage) -> VopResult<&'a T> {
    record.as_ref().ok_or_else(|| VopError::StageOrder {
        operation: operation.to_string(),
        required: required.to_string(),
        current: current.to_string(),
    })
}

impl VariationOfParameters {
    pub fn new(equation: &str) -> VopResult<VariationOfParameters> {
        VariationOfParameters::with_config(equation, SolverConfig::default())
    }

    pub fn with_config(equation: &str, config: SolverConfig) -> VopResult<VariationOfParameters> {
        config.validate()?;
        let spec = EquationSpec::parse(equation, &config)?;
        let limits = config.limits();
        Ok(VariationOfParameters {
            config,
            limits,
            spec,
            stage: SolverStage::Unsolved,
            homogeneous: None,
            particular: None,
            general: None,
            final_solution: None,
            last_outcome: None,
        })
    }

    /// shares a cancel flag with the caller; stages check it while running
    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.limits = self.limits.clone().with_cancel_flag(flag);
    }

    pub fn stage(&self) -> SolverStage {
        self.stage
    }

    pub fn homogeneous(&self) -> Option<&HomogeneousSolution> {
        self.homogeneous.as_ref()
    }

    pub fn particular(&self) -> Option<&ParticularSolution> {
        self.particular.as_ref()
    }

    pub fn general(&self) -> Option<&GeneralSolution> {
        self.general.as_ref()
    }

    pub fn final_solution(&self) -> Option<&FinalSolution> {
        self.final_solution.as_ref()
    }

    /// outcome of the last `apply_initial_conditions` call
    pub fn last_outcome(&self) -> Option<&ConditionOutcome> {
        self.last_outcome.as_ref()
    }

    fn advance(&mut self, stage: SolverStage) {
        if stage > self.stage {
            self.stage = stage;
        }
    }

    // STAGES

    pub fn solve_homogeneous(&mut self) -> VopResult<&HomogeneousSolution> {
        if self.homogeneous.is_none() {
            info!("solving the homogeneous equation of {}", self.spec);
            let h = solve_homogeneous(&self.spec, &self.limits)?;
            self.homogeneous = Some(h);
            self.advance(SolverStage::HomogeneousSolved);
        }
        require(&self.homogeneous, "solve_homogeneous", SolverStage::HomogeneousSolved, self.stage)
    }

    pub fn solve_particular(&mut self) -> VopResult<&ParticularSolution> {
        if self.particular.is_none() {
            let h = require(&self.homogeneous, "solve_particular", SolverStage::HomogeneousSolved, self.stage)?;
            let wronskian = Wronskian::build(&h.fss);
            let coefficients = solve_coefficients(wronskian, &self.spec)?;
            let integrated = integrate_coefficients(&coefficients.derivatives, &self.spec.independent_var, &self.limits)?;
            let p = assemble_particular(&h.fss, coefficients, integrated)?;
            self.particular = Some(p);
            self.advance(SolverStage::ParticularSolved);
        }
        require(&self.particular, "solve_particular", SolverStage::ParticularSolved, self.stage)
    }

    pub fn create_general_solution(&mut self) -> VopResult<&GeneralSolution> {
        if self.general.is_none() {
            let stage = self.stage;
            let h = require(&self.homogeneous, "create_general_solution", SolverStage::HomogeneousSolved, stage)?;
            let p = require(&self.particular, "create_general_solution", SolverStage::ParticularSolved, stage)?;
            let g = assemble_general(h, p);
            self.general = Some(g);
            self.advance(SolverStage::GeneralSolved);
        }
        require(&self.general, "create_general_solution", SolverStage::GeneralSolved, self.stage)
    }

    /// Resolves the constants from exactly `order` conditions. May be called repeatedly; an
    /// unresolved outcome keeps the previous final solution.
    pub fn apply_initial_conditions(&mut self, conditions: &[ConditionTriple]) -> VopResult<ConditionOutcome> {
        let stage = self.stage;
        let g = require(&self.general, "apply_initial_conditions", SolverStage::GeneralSolved, stage)?;
        let h = require(&self.homogeneous, "apply_initial_conditions", SolverStage::HomogeneousSolved, stage)?;
        let p = require(&self.particular, "apply_initial_conditions", SolverStage::ParticularSolved, stage)?;
        let outcome = solve_conditions(g, &h.fss, &p.solution, conditions)?;
        if let ConditionOutcome::Resolved(f) = &outcome {
            self.final_solution = Some(f.clone());
            self.advance(SolverStage::Finalized);
        }
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// conditions in the form `y''(0) = 1`
    pub fn apply_condition_strings(&mut self, conditions: &[&str]) -> VopResult<ConditionOutcome> {
        let triples = conditions
            .iter()
            .map(|c| ConditionTriple::parse(c, &self.config.dependent_var))
            .collect::<VopResult<Vec<_>>>()?;
        self.apply_initial_conditions(&triples)
    }

    /// Runs the stages up to the general solution with the configured logger.
    pub fn solve(&mut self) -> VopResult<&GeneralSolution> {
        let logging = init_logger(self.config.loglevel.as_deref());
        if logging {
            info!(" \n \n Program started with loglevel: {:?}", self.config.loglevel);
        }
        let start = Instant::now();
        self.solve_homogeneous()?;
        self.solve_particular()?;
        self.create_general_solution()?;
        info!(" \n \n Program ended in {} ms", start.elapsed().as_millis());
        require(&self.general, "solve", SolverStage::GeneralSolved, self.stage)
    }

    // OUTPUT

    pub fn get_general_solution_pretty(&self) -> String {
        match &self.general {
            Some(g) => g.pretty(),
            None => NOT_COMPUTED.to_string(),
        }
    }

    pub fn get_final_solution_pretty(&self) -> String {
        match &self.final_solution {
            Some(f) => f.pretty(),
            None => NOT_COMPUTED.to_string(),
        }
    }

    /// Substitutes the general solution into the equation (constants set to 1 for the numeric
    /// fallback).
    pub fn verify_solution(&self) -> VopResult<Verification> {
        let g = require(&self.general, "verify_solution", SolverStage::GeneralSolved, self.stage)?;
        verify(&self.spec, &g.expanded, &linspace(0.15, 0.95, 9))
    }

    pub fn sample(&self, x_min: f64, x_max: f64, n: usize) -> VopResult<Vec<(f64, f64)>> {
        let f = require(&self.final_solution, "sample", SolverStage::Finalized, self.stage)?;
        f.sample(x_min, x_max, n)
    }

    /// sample on `config.sample_points` points
    pub fn sample_default(&self, x_min: f64, x_max: f64) -> VopResult<Vec<(f64, f64)>> {
        self.sample(x_min, x_max, self.config.sample_points)
    }

    pub fn save_samples(&self, x_min: f64, x_max: f64, filename: &str) -> VopResult<()> {
        let samples = self.sample_default(x_min, x_max)?;
        save_samples_to_file(
            &samples,
            (&self.spec.independent_var, &self.config.dependent_var),
            filename,
        )?;
        info!("{} samples saved to {}", samples.len(), filename);
        Ok(())
    }
}
