use fdkey::{candidate_key, closure, fds, is_superkey, minimal_core, Fd, KeyError, MicroLpSolver, ScipSolver};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::time::Duration;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn attrs(xs: &[&str]) -> BTreeSet<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

fn key_of(universe: &BTreeSet<String>, deps: &[Fd<String>]) -> BTreeSet<String> {
    let found = candidate_key(universe, deps, &MicroLpSolver::new()).unwrap();
    assert!(is_superkey(deps, universe, &found.key));
    assert_eq!(&found.closure, universe);
    found.key
}

#[test]
fn chain_has_single_attribute_key() {
    init();
    let deps = fds! { A -> B; B -> C; };
    assert_eq!(key_of(&attrs(&["A", "B", "C"]), &deps), attrs(&["A"]));
}

#[test]
fn no_dependencies_means_whole_schema() {
    let r = attrs(&["A", "B"]);
    assert_eq!(key_of(&r, &[]), r);
}

#[test]
fn composite_key() {
    let deps = fds! { A, B -> C; C -> D; };
    assert_eq!(key_of(&attrs(&["A", "B", "C", "D"]), &deps), attrs(&["A", "B"]));
}

#[test]
fn symmetric_dependencies_give_either_key() {
    let r = attrs(&["A", "B"]);
    let deps = fds! { A -> B; B -> A; };
    let key = key_of(&r, &deps);
    assert_eq!(key.len(), 1);
    assert!(is_superkey(&deps, &r, &attrs(&["A"])));
    assert!(is_superkey(&deps, &r, &attrs(&["B"])));
}

#[test]
fn canonical_core() {
    let deps = fds! { A -> B; B -> C; A, D -> E; };
    assert_eq!(key_of(&attrs(&["A", "B", "C", "D", "E"]), &deps), attrs(&["A", "D"]));
}

#[test]
fn single_determinant() {
    let deps = fds! { A -> B; A -> C; A -> D; };
    assert_eq!(key_of(&attrs(&["A", "B", "C", "D"]), &deps), attrs(&["A"]));
}

#[test]
fn constants_need_no_key_attributes() {
    let deps = fds! { -> A; A -> B; };
    assert!(key_of(&attrs(&["A", "B"]), &deps).is_empty());
}

#[test]
fn constant_alone_in_target() {
    let deps = fds! { -> A; };
    let found = minimal_core(&deps, &attrs(&["A"]), &MicroLpSolver::new()).unwrap();
    assert!(found.key.is_empty());
}

#[test]
fn two_sources_into_one_sink() {
    let deps = fds! { A -> C; B -> C; };
    assert_eq!(key_of(&attrs(&["A", "B", "C"]), &deps), attrs(&["A", "B"]));
}

#[test]
fn diamond() {
    let deps = fds! { A -> C; B -> C; C -> D; };
    assert_eq!(key_of(&attrs(&["A", "B", "C", "D"]), &deps).len(), 2);
}

#[test]
fn long_chain_with_shortcuts() {
    let xs: Vec<String> = (0..10).map(|i| format!("X{}", i)).collect();
    let mut deps: Vec<Fd<String>> = xs.windows(2).map(|w| Fd::singleton(w[0].clone(), w[1].clone())).collect();
    deps.push(Fd::singleton(xs[0].clone(), xs[5].clone()));
    deps.push(Fd::singleton(xs[3].clone(), xs[9].clone()));
    let r: BTreeSet<String> = xs.iter().cloned().collect();
    assert_eq!(key_of(&r, &deps), attrs(&["X0"]));
}

#[test]
fn isolated_attributes_are_always_in_the_key() {
    let deps = fds! { A -> B; };
    assert_eq!(key_of(&attrs(&["A", "B", "Q", "Z"]), &deps), attrs(&["A", "Q", "Z"]));
}

#[test]
fn foreign_attribute_is_rejected() {
    let deps = fds! { A -> Q; };
    let err = candidate_key(&attrs(&["A", "B"]), &deps, &MicroLpSolver::new()).unwrap_err();
    assert!(matches!(err, KeyError::UnknownAttribute(_)));
}

#[test]
fn planted_core_is_recovered() {
    init();
    let mut rng = StdRng::seed_from_u64(0);
    let xs: Vec<String> = (0..20).map(|i| format!("X{}", i)).collect();
    let core: Vec<String> = xs.choose_multiple(&mut rng, 3).cloned().collect();
    let mut deps = vec![];
    for v in &xs {
        if !core.contains(v) {
            let k = rng.gen_range(1..=3);
            let lhs: Vec<String> = core.choose_multiple(&mut rng, k).cloned().collect();
            deps.push(Fd::new(lhs, [v.clone()]));
        }
    }
    let r: BTreeSet<String> = xs.iter().cloned().collect();
    assert_eq!(key_of(&r, &deps).len(), 3);
}

/// `k` disjoint three-cycles `Gi_0 -> Gi_1 -> Gi_2 -> Gi_0`; every key picks
/// one attribute per cycle.
fn cycles(k: usize) -> (BTreeSet<String>, Vec<Fd<String>>) {
    let mut r = BTreeSet::new();
    let mut deps = vec![];
    for g in 0..k {
        let names: Vec<String> = (0..3).map(|i| format!("G{}_{}", g, i)).collect();
        for i in 0..3 {
            deps.push(Fd::singleton(names[i].clone(), names[(i + 1) % 3].clone()));
        }
        r.extend(names);
    }
    (r, deps)
}

#[test]
fn disjoint_cycles_need_one_attribute_each() {
    init();
    let (r, deps) = cycles(3);
    let key = key_of(&r, &deps);
    assert_eq!(key.len(), 3);
    for g in 0..3 {
        let prefix = format!("G{}_", g);
        assert_eq!(key.iter().filter(|a| a.starts_with(&prefix)).count(), 1);
    }
}

#[test]
fn expired_time_limit_is_a_timeout() {
    init();
    let (r, deps) = cycles(12);
    let solver = MicroLpSolver::new().with_time_limit(Duration::ZERO);
    let err = candidate_key(&r, &deps, &solver).unwrap_err();
    assert!(matches!(err, KeyError::Timeout), "got {:?}", err);
}

/// Smallest key by trying every subset, for cross-checking.
fn brute_force_min(universe: &[u8], deps: &[Fd<u8>]) -> usize {
    let full: BTreeSet<u8> = universe.iter().copied().collect();
    (0u32..1 << universe.len())
        .filter_map(|mask| {
            let s: BTreeSet<u8> = universe
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, a)| *a)
                .collect();
            (closure(deps, &s) == full).then_some(s.len())
        })
        .min()
        .unwrap()
}

#[test]
fn random_schemas_match_exhaustive_search() {
    init();
    let mut rng = StdRng::seed_from_u64(11);
    let universe: Vec<u8> = (0..6).collect();
    let r: BTreeSet<u8> = universe.iter().copied().collect();
    for _ in 0..60 {
        let n = rng.gen_range(0..6);
        let deps: Vec<Fd<u8>> = (0..n)
            .map(|_| {
                let lhs: Vec<u8> = universe.iter().copied().filter(|_| rng.gen_bool(0.3)).collect();
                let rhs: Vec<u8> = universe.iter().copied().filter(|_| rng.gen_bool(0.3)).collect();
                Fd::new(lhs, rhs)
            })
            .collect();
        let found = candidate_key(&r, &deps, &MicroLpSolver::new()).unwrap();
        assert!(is_superkey(&deps, &r, &found.key));
        assert_eq!(found.key.len(), brute_force_min(&universe, &deps), "deps: {:?}", deps);
    }
}

#[test]
#[ignore = "needs the `scip` binary (or SCIP_BIN)"]
fn scip_agrees_with_microlp() {
    init();
    let deps = fds! { A -> B; B -> C; A, D -> E; };
    let r = attrs(&["A", "B", "C", "D", "E"]);
    let solver = ScipSolver::from_env().with_time_limit(60.0);
    let found = candidate_key(&r, &deps, &solver).unwrap();
    assert_eq!(found.key, attrs(&["A", "D"]));
    assert_eq!(found.objective, Some(2.0));
}
