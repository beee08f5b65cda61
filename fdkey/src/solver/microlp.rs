use crate::error::SolverError;
use crate::ilp::{Ilp, LinearExpr, ObjSense, Sense};
use crate::solver::{MipSolver, SolveStatus, SolverOutput};
use good_lp::{
    constraint, microlp, variable, variables, Expression, ResolutionError, Solution, SolverModel,
    Variable,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

/// In-process 0/1 solver: the model is handed to `good_lp` and solved with
/// the pure-Rust `microlp` backend, so no external binary is needed.
///
/// With a `time_limit` the solve runs on a worker thread; when the limit
/// passes the worker is abandoned and the result reads
/// [`SolveStatus::Timeout`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroLpSolver {
    pub time_limit: Option<Duration>,
}

impl MicroLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl MipSolver for MicroLpSolver {
    fn solve(&self, ilp: &Ilp) -> Result<SolverOutput, SolverError> {
        check_binary(ilp)?;
        let Some(limit) = self.time_limit else {
            return solve_now(ilp);
        };

        let (tx, rx) = mpsc::channel();
        let owned = ilp.clone();
        thread::Builder::new()
            .name("fdkey-microlp".to_string())
            .spawn(move || {
                // the receiver is gone once the limit has passed
                let _ = tx.send(solve_now(&owned));
            })?;

        match rx.recv_timeout(limit) {
            Ok(res) => res,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("microlp: time limit of {:?} reached", limit);
                Ok(SolverOutput {
                    status: SolveStatus::Timeout,
                    objective: None,
                    assignment: BTreeMap::new(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(SolverError::Backend("solver thread exited without a result".to_string()))
            }
        }
    }
}

/// Every variable a row or the objective mentions must be declared binary.
fn check_binary(ilp: &Ilp) -> Result<(), SolverError> {
    let declared: HashSet<&String> = ilp.order.iter().collect();
    let exprs = std::iter::once(&ilp.objective).chain(ilp.constraints.iter().map(|c| &c.expr));
    for e in exprs {
        if let Some(v) = e.terms.keys().find(|v| !declared.contains(v)) {
            return Err(SolverError::Unsupported(format!("variable `{}` is not binary", v)));
        }
    }
    Ok(())
}

fn to_expression(e: &LinearExpr, vars: &HashMap<&str, Variable>) -> Expression {
    let mut out = Expression::from(e.constant);
    for (name, c) in &e.terms {
        if let Some(&v) = vars.get(name.as_str()) {
            out += *c * v;
        }
    }
    out
}

fn solve_now(ilp: &Ilp) -> Result<SolverOutput, SolverError> {
    let mut problem_vars = variables!();
    let vars: HashMap<&str, Variable> = ilp
        .order
        .iter()
        .map(|name| (name.as_str(), problem_vars.add(variable().binary())))
        .collect();

    let objective = to_expression(&ilp.objective, &vars);
    let unsolved = match ilp.sense {
        ObjSense::Minimize => problem_vars.minimise(objective),
        ObjSense::Maximize => problem_vars.maximise(objective),
    };
    let mut problem = unsolved.using(microlp);
    for c in &ilp.constraints {
        let lhs = to_expression(&c.expr, &vars);
        problem.add_constraint(match c.sense {
            Sense::Le => constraint!(lhs <= c.rhs),
            Sense::Ge => constraint!(lhs >= c.rhs),
            Sense::Eq => constraint!(lhs == c.rhs),
        });
    }

    let solution = match problem.solve() {
        Ok(s) => s,
        Err(ResolutionError::Infeasible) => return Ok(SolverOutput::infeasible()),
        Err(e) => return Err(SolverError::Backend(e.to_string())),
    };

    let assignment: BTreeMap<String, f64> = vars
        .iter()
        .map(|(name, &v)| (name.to_string(), solution.value(v).round()))
        .collect();
    let objective = ilp.objective.eval(&assignment);
    Ok(SolverOutput {
        status: SolveStatus::Optimal,
        objective: Some(objective),
        assignment,
    })
}
