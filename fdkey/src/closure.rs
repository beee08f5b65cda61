//! Attribute-set closure under a fixed set of functional dependencies.

use crate::fd::FunctionalDependency;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Closure of `start` under `fds`: the smallest superset of `start` such that
/// every dependency whose left side is contained also has its right side
/// contained.
///
/// Each dependency keeps a count of left-hand attributes still missing, and
/// newly derived attributes are queued so that every (attribute, dependency)
/// incidence is visited once.
pub fn closure<'a, T, I>(fds: &[FunctionalDependency<T>], start: I) -> BTreeSet<T>
where
    T: Ord + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut out: BTreeSet<T> = start.into_iter().cloned().collect();
    let mut missing: Vec<usize> = fds.iter().map(|fd| fd.lhs().len()).collect();
    let mut waiting: BTreeMap<&T, Vec<usize>> = BTreeMap::new();
    let mut queue: VecDeque<T> = out.iter().cloned().collect();

    for (i, fd) in fds.iter().enumerate() {
        if fd.lhs().is_empty() {
            for y in fd.rhs() {
                if out.insert(y.clone()) {
                    queue.push_back(y.clone());
                }
            }
        } else {
            for x in fd.lhs() {
                waiting.entry(x).or_default().push(i);
            }
        }
    }

    while let Some(v) = queue.pop_front() {
        let Some(ids) = waiting.get(&v) else { continue };
        for &i in ids {
            missing[i] -= 1;
            if missing[i] == 0 {
                for y in fds[i].rhs() {
                    if out.insert(y.clone()) {
                        queue.push_back(y.clone());
                    }
                }
            }
        }
    }

    out
}

/// Whether the closure of `candidate` covers all of `universe`.
pub fn is_superkey<T: Ord + Clone>(
    fds: &[FunctionalDependency<T>],
    universe: &BTreeSet<T>,
    candidate: &BTreeSet<T>,
) -> bool {
    closure(fds, candidate).is_superset(universe)
}

/// Round-by-round layers of the naive fixed-point scan.
///
/// Layer 0 is `start` itself; layer `r + 1` holds the attributes first
/// derived by applying, simultaneously, every dependency whose left side lies
/// within layers `0..=r`. The union of all layers equals [`closure`].
pub fn derivation_rounds<'a, T, I>(fds: &[FunctionalDependency<T>], start: I) -> Vec<BTreeSet<T>>
where
    T: Ord + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut known: BTreeSet<T> = start.into_iter().cloned().collect();
    let mut layers = vec![known.clone()];
    loop {
        let mut next = BTreeSet::new();
        for fd in fds {
            if fd.lhs().is_subset(&known) {
                next.extend(fd.rhs().iter().filter(|y| !known.contains(*y)).cloned());
            }
        }
        if next.is_empty() {
            return layers;
        }
        known.extend(next.iter().cloned());
        layers.push(next);
    }
}
