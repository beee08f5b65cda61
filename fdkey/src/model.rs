//! Lowering of "the closure of the chosen attributes covers the target" into
//! a flat 0/1 program.
//!
//! Closure is unrolled over a fixed number of rounds. With `n` modelled
//! attributes there are `n + 1` layers of derivation variables:
//!
//! * `D__r__i = 1` iff attribute `i` is known after round `r`. Layer 0 is the
//!   choice itself, so `D__0__i` doubles as the selection variable.
//! * `F__r__k = 1` iff single-rhs dependency `k` fires between round `r` and
//!   `r + 1`, i.e. every attribute of its left side is in layer `r`.
//!
//! and the constraints pin each variable to exactly that meaning:
//!
//! ```text
//! F[r-1,k] <= D[r-1,j]                         for j in lhs(k)
//! F[r-1,k] >= sum_j D[r-1,j] - (|lhs(k)| - 1)
//! D[r,u]   >= D[r-1,u]
//! D[r,u]   >= F[r-1,k]                         for k deriving u
//! D[r,u]   <= D[r-1,u] + sum_k F[r-1,k]
//! D[n,t]    = 1                                for t in target
//! ```
//!
//! Each round either derives a new attribute or the closure is stable, so `n`
//! rounds always suffice.

use crate::closure::closure;
use crate::error::KeyError;
use crate::fd::{attributes_of, FunctionalDependency};
use crate::ilp::{Constraint, Ilp, LinearExpr, ObjSense, Sense};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// A dependency after decomposition and renaming: `lhs -> rhs`, by id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Rule {
    lhs: Vec<usize>,
    rhs: usize,
}

/// The 0/1 program for one solve, plus what is needed to decode it.
#[derive(Clone, Debug)]
pub struct KeyModel<T> {
    ilp: Ilp,
    attrs: Vec<T>,
    isolated: BTreeSet<T>,
    rounds: usize,
}

impl<T> KeyModel<T> {
    pub fn ilp(&self) -> &Ilp {
        &self.ilp
    }

    /// Modelled attributes, indexed by id.
    pub fn attributes(&self) -> &[T] {
        &self.attrs
    }

    /// Target attributes that occur in no dependency. They belong to every
    /// answer and are not part of the program.
    pub fn isolated(&self) -> &BTreeSet<T> {
        &self.isolated
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn selection_var(&self, id: usize) -> String {
        derived_var(0, id)
    }
}

/// Result of model construction.
#[derive(Clone, Debug)]
pub enum ModelPlan<T> {
    /// The answer needs no solver.
    Trivial(BTreeSet<T>),
    Model(KeyModel<T>),
}

pub(crate) fn derived_var(round: usize, id: usize) -> String {
    format!("D__{}__{}", round, id)
}

pub(crate) fn fire_var(round: usize, rule: usize) -> String {
    format!("F__{}__{}", round, rule)
}

/// Build the program whose optimum is a smallest set covering `target`.
pub fn build_model<T>(
    fds: &[FunctionalDependency<T>],
    target: &BTreeSet<T>,
) -> Result<ModelPlan<T>, KeyError>
where
    T: Ord + Clone + Debug,
{
    let fd_attrs = attributes_of(fds);

    let mut everything = fd_attrs.clone();
    everything.extend(target.iter().cloned());
    let reach = closure(fds, &everything);
    if !reach.is_superset(target) {
        let missing: Vec<&T> = target.difference(&reach).collect();
        return Err(KeyError::NoKeyExists {
            missing: format!("{:?}", missing),
        });
    }

    let isolated: BTreeSet<T> = target.difference(&fd_attrs).cloned().collect();
    let free = closure(fds, &BTreeSet::new());
    if target.iter().all(|t| isolated.contains(t) || free.contains(t)) {
        log::debug!(
            "target covered without a solver: {} isolated attribute(s)",
            isolated.len()
        );
        return Ok(ModelPlan::Trivial(isolated));
    }

    let attrs: Vec<T> = fd_attrs.into_iter().collect();
    let ids: BTreeMap<&T, usize> = attrs.iter().enumerate().map(|(i, a)| (a, i)).collect();

    let rules: Vec<Rule> = fds
        .iter()
        .flat_map(|fd| fd.decompose())
        .filter_map(|fd| {
            let y = fd.rhs().iter().next()?;
            Some(Rule {
                lhs: fd.lhs().iter().map(|a| ids[a]).collect(),
                rhs: ids[y],
            })
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let targets: Vec<usize> = target
        .iter()
        .filter(|t| !isolated.contains(*t))
        .map(|t| ids[t])
        .collect();

    let mut gen = Generator::new(attrs.len(), rules);
    gen.emit_rounds();
    gen.emit_cover(&targets);
    gen.emit_objective();
    gen.ilp.normalize();

    log::debug!(
        "key model: {} attribute(s), {} rule(s), {} round(s), {} variable(s), {} constraint(s)",
        attrs.len(),
        gen.rules.len(),
        gen.rounds,
        gen.ilp.binaries.len(),
        gen.ilp.constraints.len()
    );

    Ok(ModelPlan::Model(KeyModel {
        ilp: gen.ilp,
        attrs,
        isolated,
        rounds: gen.rounds,
    }))
}

struct Generator {
    ilp: Ilp,
    n: usize,
    rounds: usize,
    rules: Vec<Rule>,
    /// attribute id -> rules deriving it
    producers: Vec<Vec<usize>>,
    cst_id: usize,
}

impl Generator {
    fn new(n: usize, rules: Vec<Rule>) -> Self {
        let mut producers = vec![vec![]; n];
        for (k, rule) in rules.iter().enumerate() {
            producers[rule.rhs].push(k);
        }
        let mut ilp = Ilp::new();
        ilp.sense = ObjSense::Minimize;
        Self {
            ilp,
            n,
            rounds: n,
            rules,
            producers,
            cst_id: 0,
        }
    }

    fn next_cst_id(&mut self) -> usize {
        let n = self.cst_id;
        self.cst_id += 1;
        n
    }

    fn push(&mut self, prefix: &str, expr: LinearExpr, sense: Sense, rhs: f64) {
        let cid = self.next_cst_id();
        self.ilp.constraints.push(Constraint {
            name: format!("{}_{}", prefix, cid),
            expr,
            sense,
            rhs,
        });
    }

    fn emit_rounds(&mut self) {
        // declare layer by layer so that branching solvers decide the
        // selection first
        for r in 0..=self.rounds {
            for i in 0..self.n {
                self.ilp.binary(derived_var(r, i));
            }
            if r < self.rounds {
                for k in 0..self.rules.len() {
                    self.ilp.binary(fire_var(r, k));
                }
            }
        }

        for r in 1..=self.rounds {
            for k in 0..self.rules.len() {
                self.emit_and(r - 1, k);
            }
            for u in 0..self.n {
                self.emit_or(r, u);
            }
        }
    }

    /// `F[r,k] = AND_{j in lhs(k)} D[r,j]`
    fn emit_and(&mut self, r: usize, k: usize) {
        let f = fire_var(r, k);
        let lhs: Vec<String> = self.rules[k].lhs.iter().map(|&j| derived_var(r, j)).collect();

        for d in &lhs {
            let e = LinearExpr::from_var(&f, 1.0).sub(LinearExpr::from_var(d, 1.0));
            self.push("and_ub", e, Sense::Le, 0.0);
        }

        // an empty lhs makes this F >= 1: constants fire in every round
        let mut e = LinearExpr::from_var(&f, 1.0).sub(LinearExpr::sum(&lhs, 1.0));
        e.add_inplace(&LinearExpr::from_const(lhs.len() as f64 - 1.0));
        self.push("and_lb", e, Sense::Ge, 0.0);
    }

    /// `D[r,u] = D[r-1,u] OR (OR_{k -> u} F[r-1,k])`
    fn emit_or(&mut self, r: usize, u: usize) {
        let cur = derived_var(r, u);
        let prev = derived_var(r - 1, u);
        let fires: Vec<String> = self.producers[u].iter().map(|&k| fire_var(r - 1, k)).collect();

        let keep = LinearExpr::from_var(&cur, 1.0).sub(LinearExpr::from_var(&prev, 1.0));
        self.push("keep", keep, Sense::Ge, 0.0);

        for f in &fires {
            let e = LinearExpr::from_var(&cur, 1.0).sub(LinearExpr::from_var(f, 1.0));
            self.push("fire", e, Sense::Ge, 0.0);
        }

        let mut ub = LinearExpr::from_var(&cur, 1.0).sub(LinearExpr::from_var(&prev, 1.0));
        ub.sub_inplace(&LinearExpr::sum(&fires, 1.0));
        self.push("or_ub", ub, Sense::Le, 0.0);
    }

    fn emit_cover(&mut self, targets: &[usize]) {
        for &t in targets {
            let d = derived_var(self.rounds, t);
            self.push("cover", LinearExpr::from_var(&d, 1.0), Sense::Eq, 1.0);
        }
    }

    fn emit_objective(&mut self) {
        let sel: Vec<String> = (0..self.n).map(|i| derived_var(0, i)).collect();
        self.ilp.objective = LinearExpr::sum(&sel, 1.0);
    }
}
