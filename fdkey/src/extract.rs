//! Decoding a solver assignment back into attributes, and re-checking it
//! against the closure engine before anyone sees it.

use crate::closure::{closure, derivation_rounds};
use crate::error::KeyError;
use crate::fd::FunctionalDependency;
use crate::model::KeyModel;
use crate::solver::SolverOutput;
use std::collections::BTreeSet;
use std::fmt::Debug;

/// Binary values at or above this read as 1.
const ONE: f64 = 1.0 - 1e-6;

/// Attributes selected in round 0, plus the model's isolated attributes.
pub fn extract<T: Ord + Clone>(model: &KeyModel<T>, output: &SolverOutput) -> BTreeSet<T> {
    let mut key: BTreeSet<T> = model
        .attributes()
        .iter()
        .enumerate()
        .filter(|(i, _)| output.value(&model.selection_var(*i)) >= ONE)
        .map(|(_, a)| a.clone())
        .collect();
    key.extend(model.isolated().iter().cloned());
    key
}

/// Re-verify an extracted key: its closure must cover `target`, and its size
/// must match the objective the solver reported for the modelled part.
///
/// Returns the verified closure.
pub fn validate<T: Ord + Clone + Debug>(
    fds: &[FunctionalDependency<T>],
    target: &BTreeSet<T>,
    model: &KeyModel<T>,
    key: &BTreeSet<T>,
    objective: Option<f64>,
) -> Result<BTreeSet<T>, KeyError> {
    let cl = closure(fds, key);
    if !cl.is_superset(target) {
        let missing: Vec<&T> = target.difference(&cl).collect();
        return Err(mismatch(format!(
            "closure of {:?} misses {:?}",
            key, missing
        )));
    }

    let objective =
        objective.ok_or_else(|| mismatch("solver reported no objective value".to_string()))?;
    let expected = objective.round() as i64 + model.isolated().len() as i64;
    if (objective - objective.round()).abs() > 1e-6 || key.len() as i64 != expected {
        return Err(mismatch(format!(
            "key {:?} has {} attribute(s) but the objective is {} (+{} isolated)",
            key,
            key.len(),
            objective,
            model.isolated().len()
        )));
    }

    // the chosen set must also close within the model's round budget
    let used = derivation_rounds(fds, key).len() - 1;
    if used > model.rounds() {
        return Err(mismatch(format!(
            "key {:?} needs {} round(s), the model allows {}",
            key,
            used,
            model.rounds()
        )));
    }

    Ok(cl)
}

/// Logs the failed check before handing back the error.
pub(crate) fn mismatch(msg: String) -> KeyError {
    log::error!("validation mismatch: {}", msg);
    KeyError::ValidationMismatch(msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd::Fd;
    use crate::model::{build_model, ModelPlan};
    use crate::solver::SolveStatus;
    use std::collections::BTreeMap;

    fn chain() -> (Vec<Fd<&'static str>>, BTreeSet<&'static str>, KeyModel<&'static str>) {
        let fds = vec![Fd::singleton("A", "B"), Fd::singleton("B", "C")];
        let target = BTreeSet::from(["A", "B", "C", "Z"]);
        let ModelPlan::Model(m) = build_model(&fds, &target).unwrap() else {
            panic!("expected a model");
        };
        (fds, target, m)
    }

    fn output(selected: &[&str], objective: f64) -> SolverOutput {
        let assignment: BTreeMap<String, f64> =
            selected.iter().map(|v| (v.to_string(), 1.0)).collect();
        SolverOutput {
            status: SolveStatus::Optimal,
            objective: Some(objective),
            assignment,
        }
    }

    #[test]
    fn test_extract_reads_round_zero_and_isolated() {
        let (_, _, m) = chain();
        // D__0__0 is A; D__1__1 is a later layer and must not count
        let key = extract(&m, &output(&["D__0__0", "D__1__1"], 1.0));
        assert_eq!(key, BTreeSet::from(["A", "Z"]));
    }

    #[test]
    fn test_extract_tolerates_float_noise() {
        let (_, _, m) = chain();
        let mut out = output(&[], 1.0);
        out.assignment.insert("D__0__0".into(), 0.9999999);
        out.assignment.insert("D__0__1".into(), 1e-9);
        assert_eq!(extract(&m, &out), BTreeSet::from(["A", "Z"]));
    }

    #[test]
    fn test_validate_accepts_good_key() {
        let (fds, target, m) = chain();
        let key = BTreeSet::from(["A", "Z"]);
        let cl = validate(&fds, &target, &m, &key, Some(1.0)).unwrap();
        assert_eq!(cl, target);
    }

    #[test]
    fn test_validate_rejects_non_key() {
        let (fds, target, m) = chain();
        let key = BTreeSet::from(["B", "Z"]);
        let err = validate(&fds, &target, &m, &key, Some(1.0)).unwrap_err();
        assert!(matches!(err, KeyError::ValidationMismatch(_)));
    }

    #[test]
    fn test_validate_rejects_size_mismatch() {
        let (fds, target, m) = chain();
        let key = BTreeSet::from(["A", "B", "Z"]);
        assert!(matches!(
            validate(&fds, &target, &m, &key, Some(1.0)),
            Err(KeyError::ValidationMismatch(_))
        ));
        assert!(matches!(
            validate(&fds, &target, &m, &BTreeSet::from(["A", "Z"]), None),
            Err(KeyError::ValidationMismatch(_))
        ));
    }

    #[test]
    fn test_mismatch_keeps_message() {
        let _ = env_logger::builder().is_test(true).try_init();
        match mismatch("closure of {B} misses {A}".to_string()) {
            KeyError::ValidationMismatch(m) => assert_eq!(m, "closure of {B} misses {A}"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
