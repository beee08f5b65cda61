//! The boundary to a MIP engine.
//!
//! A backend takes an [`Ilp`] and hands back a 0/1 assignment and a status.
//! It never looks at what the variables mean.

mod microlp;
mod scip;

pub use microlp::MicroLpSolver;
pub use scip::ScipSolver;

use crate::error::SolverError;
use crate::ilp::Ilp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    /// The time budget ran out; `assignment` holds the incumbent if there is
    /// one, but it is not proven optimal.
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverOutput {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    /// variable name -> value
    pub assignment: BTreeMap<String, f64>,
}

impl SolverOutput {
    pub fn infeasible() -> Self {
        Self {
            status: SolveStatus::Infeasible,
            objective: None,
            assignment: BTreeMap::new(),
        }
    }

    pub fn value(&self, var: &str) -> f64 {
        self.assignment.get(var).copied().unwrap_or(0.0)
    }
}

/// A MIP engine. Implementations are plain values without per-solve state,
/// so one instance can serve any number of independent solves.
pub trait MipSolver {
    fn solve(&self, ilp: &Ilp) -> Result<SolverOutput, SolverError>;
}

impl<S: MipSolver + ?Sized> MipSolver for &S {
    fn solve(&self, ilp: &Ilp) -> Result<SolverOutput, SolverError> {
        (**self).solve(ilp)
    }
}

impl<S: MipSolver + ?Sized> MipSolver for Box<S> {
    fn solve(&self, ilp: &Ilp) -> Result<SolverOutput, SolverError> {
        (**self).solve(ilp)
    }
}
