use crate::closure::closure;
use crate::error::{KeyError, SolverError};
use crate::extract::{extract, mismatch, validate};
use crate::fd::{attributes_of, FunctionalDependency};
use crate::model::{build_model, ModelPlan};
use crate::solver::{MipSolver, SolveStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Debug};

/// A verified answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateKey<T: Ord> {
    pub key: BTreeSet<T>,
    /// Closure of `key`, recomputed after solving.
    pub closure: BTreeSet<T>,
    /// Objective reported by the solver; `None` when no solver was needed.
    pub objective: Option<f64>,
    /// Derivation rounds the model allowed (0 without a model).
    pub rounds: usize,
}

/// Lifecycle of one solve, for tracing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Built,
    Submitted,
    Solved,
    Infeasible,
    TimedOut,
    Failed,
    Validated,
    Returned,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Built => "BUILT",
            Stage::Submitted => "SUBMITTED",
            Stage::Solved => "SOLVED",
            Stage::Infeasible => "INFEASIBLE",
            Stage::TimedOut => "TIMEOUT",
            Stage::Failed => "FAILED",
            Stage::Validated => "VALIDATED",
            Stage::Returned => "RETURNED",
        };
        f.write_str(s)
    }
}

fn enter(stage: Stage) {
    log::debug!("solve -> {}", stage);
}

/// Smallest set of attributes whose closure under `fds` contains `target`.
pub fn minimal_core<T, S>(
    fds: &[FunctionalDependency<T>],
    target: &BTreeSet<T>,
    solver: &S,
) -> Result<CandidateKey<T>, KeyError>
where
    T: Ord + Clone + Debug,
    S: MipSolver + ?Sized,
{
    let model = match build_model(fds, target)? {
        ModelPlan::Trivial(key) => {
            let cl = closure(fds, &key);
            if !cl.is_superset(target) {
                return Err(mismatch(format!(
                    "trivial answer {:?} does not cover the target",
                    key
                )));
            }
            log::info!("minimal core of size {} found without a solver", key.len());
            return Ok(CandidateKey {
                key,
                closure: cl,
                objective: None,
                rounds: 0,
            });
        }
        ModelPlan::Model(m) => m,
    };
    enter(Stage::Built);

    enter(Stage::Submitted);
    let output = match solver.solve(model.ilp()) {
        Ok(o) => o,
        Err(e) => {
            enter(Stage::Failed);
            log::warn!("solver failed: {}", e);
            return Err(e.into());
        }
    };

    match output.status {
        SolveStatus::Optimal => enter(Stage::Solved),
        SolveStatus::Timeout => {
            enter(Stage::TimedOut);
            return Err(KeyError::Timeout);
        }
        SolveStatus::Infeasible => {
            // every target is covered by the full attribute set, so this is a
            // modelling or solver defect rather than an answer
            enter(Stage::Infeasible);
            log::error!("key model reported infeasible");
            return Err(SolverError::UnexpectedStatus("key model is infeasible".to_string()).into());
        }
    }

    let key = extract(&model, &output);
    let cl = validate(fds, target, &model, &key, output.objective)?;
    enter(Stage::Validated);

    log::info!(
        "minimal core of size {} ({} modelled attribute(s), {} round(s))",
        key.len(),
        model.attributes().len(),
        model.rounds()
    );
    enter(Stage::Returned);
    Ok(CandidateKey {
        key,
        closure: cl,
        objective: output.objective,
        rounds: model.rounds(),
    })
}

/// Minimum-cardinality candidate key of the schema `(universe, fds)`.
///
/// Every attribute mentioned by `fds` must belong to `universe`.
pub fn candidate_key<T, S>(
    universe: &BTreeSet<T>,
    fds: &[FunctionalDependency<T>],
    solver: &S,
) -> Result<CandidateKey<T>, KeyError>
where
    T: Ord + Clone + Debug,
    S: MipSolver + ?Sized,
{
    if let Some(a) = attributes_of(fds).difference(universe).next() {
        return Err(KeyError::UnknownAttribute(format!("{:?}", a)));
    }
    let found = minimal_core(fds, universe, solver)?;
    if &found.closure != universe {
        return Err(mismatch(format!(
            "closure {:?} differs from the schema",
            found.closure
        )));
    }
    Ok(found)
}
