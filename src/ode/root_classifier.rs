//! # Root classifier
//!
//! Finds the roots of the characteristic polynomial with their multiplicities and turns them into
//! the fundamental solution set (FSS) of real basis functions:
//!
//! - a real root `a` of multiplicity `m` gives `x^i e^(ax)` for `i = 0..m-1`,
//! - a conjugate pair `a +- ib` of multiplicity `m` gives `x^i e^(ax) cos(bx)`,
//!   `x^i e^(ax) sin(bx)` for `i = 0..m-1`, one pair per `i`.
//!
//! Roots are visited in the order of the root finder; a pair is processed once, through the key
//! `(Re, |Im|)`. The order of the FSS is the column order of the Wronskian and fixes the indices
//! of the constants `c1..cn`.
use crate::ode::equation_parser::EquationSpec;
use crate::ode::limits::SolverLimits;
use crate::ode::vop_error::{VopError, VopResult};
use crate::symbolic::algebraic_number::Number;
use crate::symbolic::polynomial::RootError;
use crate::symbolic::quasi_polynomial::QuasiPoly;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_expand::{Expanded, TrigKind, trig_key};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt;
use strum_macros::Display;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum BasisKind {
    Exponential,
    Cosine,
    Sine,
}

/// x^power * exp(alpha*x) * {1, cos(beta*x), sin(beta*x)}
#[derive(Clone, Debug, PartialEq)]
pub struct BasisFunction {
    pub power: usize,
    pub alpha: Number,
    pub beta: Number,
    pub kind: BasisKind,
}

impl BasisFunction {
    pub fn to_quasi(&self) -> QuasiPoly {
        match self.kind {
            BasisKind::Exponential => QuasiPoly::term(self.power, self.alpha.clone(), Number::one()),
            BasisKind::Cosine => QuasiPoly::cos_term(self.power, &self.alpha, &self.beta),
            BasisKind::Sine => QuasiPoly::sin_term(self.power, &self.alpha, &self.beta),
        }
    }

    pub fn to_expanded(&self, var: &str) -> Expanded {
        let base = Expanded::quasi_term(var, Number::one(), self.power as i64, self.alpha.clone());
        let trig = match self.kind {
            BasisKind::Exponential => return base,
            BasisKind::Cosine => trig_key(TrigKind::Cos, &self.beta, var),
            BasisKind::Sine => trig_key(TrigKind::Sin, &self.beta, var),
        };
        &base * &Expanded::factor(var, trig, 1)
    }

    pub fn to_expr(&self, var: &str) -> Expr {
        self.to_expanded(var).to_expr()
    }
}

/// roots with multiplicities, in the order of the root finder
#[derive(Clone, Debug, PartialEq)]
pub struct RootSet {
    pub roots: Vec<(Number, usize)>,
}

impl RootSet {
    pub fn total_multiplicity(&self) -> usize {
        self.roots.iter().map(|(_, m)| m).sum()
    }
}

impl fmt::Display for RootSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.roots.iter().map(|(r, m)| format!("{}:{}", r, m)).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FundamentalSet {
    pub var: String,
    pub functions: Vec<BasisFunction>,
}

impl FundamentalSet {
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn expanded(&self) -> Vec<Expanded> {
        self.functions.iter().map(|b| b.to_expanded(&self.var)).collect()
    }

    pub fn quasi(&self) -> Vec<QuasiPoly> {
        self.functions.iter().map(|b| b.to_quasi()).collect()
    }
}

impl fmt::Display for FundamentalSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let parts: Vec<String> = self.expanded().iter().map(|e| e.to_string()).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

/// result of the homogeneous stage
#[derive(Clone, Debug, PartialEq)]
pub struct HomogeneousSolution {
    pub roots: RootSet,
    pub fss: FundamentalSet,
    /// c1*FSS_1 + ... + cn*FSS_n
    pub solution: Expanded,
    pub constants: Vec<String>,
}

impl fmt::Display for HomogeneousSolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.solution)
    }
}

#[derive(Tabled)]
struct BasisRow {
    constant: String,
    root: String,
    multiplicity: usize,
    function: String,
}

/// exact roots of the characteristic polynomial; gives up when the limits are exceeded
pub fn find_roots(spec: &EquationSpec, limits: &SolverLimits) -> VopResult<RootSet> {
    let guard = limits.start();
    match spec.characteristic.roots_with(|| guard.interrupted()) {
        Ok(roots) => {
            let set = RootSet { roots };
            info!("roots of {}: {}", spec.characteristic_string(), set);
            Ok(set)
        }
        Err(RootError::Interrupted) => {
            guard.check()?;
            Err(VopError::Cancelled)
        }
        Err(e) => {
            warn!("root finding failed: {}", e);
            Err(e.into())
        }
    }
}

/// Builds the FSS in root order; its size must equal the order of the equation.
pub fn classify(roots: &RootSet, order: usize, var: &str) -> VopResult<FundamentalSet> {
    let mut processed: BTreeSet<(Number, Number)> = BTreeSet::new();
    let mut functions = Vec::with_capacity(order);
    for (root, multiplicity) in &roots.roots {
        let alpha = root.re();
        let beta = root.im().abs_real();
        if !processed.insert((alpha.clone(), beta.clone())) {
            continue;
        }
        for power in 0..*multiplicity {
            if beta.is_zero() {
                functions.push(BasisFunction {
                    power,
                    alpha: alpha.clone(),
                    beta: Number::zero(),
                    kind: BasisKind::Exponential,
                });
            } else {
                for kind in [BasisKind::Cosine, BasisKind::Sine] {
                    functions.push(BasisFunction {
                        power,
                        alpha: alpha.clone(),
                        beta: beta.clone(),
                        kind,
                    });
                }
            }
        }
    }
    if functions.len() != order {
        return Err(VopError::BasisSizeMismatch {
            expected: order,
            found: functions.len(),
        });
    }
    Ok(FundamentalSet {
        var: var.to_string(),
        functions,
    })
}

/// roots, FSS and the homogeneous solution c1*FSS_1 + ... + cn*FSS_n
pub fn solve_homogeneous(spec: &EquationSpec, limits: &SolverLimits) -> VopResult<HomogeneousSolution> {
    let roots = find_roots(spec, limits)?;
    let fss = classify(&roots, spec.order, &spec.independent_var)?;
    let (_, constants) = Expr::IndexedVars(fss.len(), "c");
    let var = spec.independent_var.as_str();
    let mut solution = Expanded::zero(var);
    for (c, basis) in constants.iter().zip(fss.expanded()) {
        solution = &solution + &(&Expanded::symbol(var, c) * &basis);
    }
    log_basis_table(&roots, &fss, &constants);
    info!("homogeneous solution: {}", solution);
    Ok(HomogeneousSolution {
        roots,
        fss,
        solution,
        constants,
    })
}

fn log_basis_table(roots: &RootSet, fss: &FundamentalSet, constants: &[String]) {
    let mut rows = Vec::with_capacity(fss.len());
    for (i, basis) in fss.functions.iter().enumerate() {
        let root = if basis.beta.is_zero() {
            basis.alpha.clone()
        } else {
            &basis.alpha + &(&Number::i() * &basis.beta)
        };
        let multiplicity = roots
            .roots
            .iter()
            .find(|(r, _)| *r == root)
            .map(|(_, m)| *m)
            .unwrap_or(0);
        let root = if basis.beta.is_zero() { root.to_string() } else { format!("{} +- I*{}", basis.alpha, basis.beta) };
        rows.push(BasisRow {
            constant: constants[i].clone(),
            root,
            multiplicity,
            function: basis.to_expanded(&fss.var).to_string(),
        });
    }
    let mut table = Table::new(&rows);
    table.with(Style::modern_rounded());
    info!("\n \n FUNDAMENTAL SOLUTION SET \n \n {}", table);
}
