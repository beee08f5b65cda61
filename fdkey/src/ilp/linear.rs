use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: BTreeMap<String, f64>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn zero() -> Self {
        Self::default()
    }
    pub fn from_const(v: f64) -> Self {
        let mut e = Self::zero();
        e.constant = v;
        e
    }
    pub fn from_var(v: &str, c: f64) -> Self {
        let mut e = Self::zero();
        if c != 0.0 {
            e.terms.insert(v.to_string(), c);
        }
        e
    }
    /// `Σ c·v` over the given variables, all with the same coefficient.
    pub fn sum<'a, I: IntoIterator<Item = &'a String>>(vars: I, c: f64) -> Self {
        let mut e = Self::zero();
        for v in vars {
            e.add_inplace(&Self::from_var(v, c));
        }
        e
    }
    pub fn add_inplace(&mut self, other: &LinearExpr) {
        self.constant += other.constant;
        for (k, v) in other.terms.iter() {
            *self.terms.entry(k.clone()).or_insert(0.0) += *v;
        }
        self.terms.retain(|_, c| c.abs() > 1e-12);
    }
    pub fn sub_inplace(&mut self, other: &LinearExpr) {
        self.constant -= other.constant;
        for (k, v) in other.terms.iter() {
            *self.terms.entry(k.clone()).or_insert(0.0) -= *v;
        }
        self.terms.retain(|_, c| c.abs() > 1e-12);
    }
    pub fn sub(mut self, other: LinearExpr) -> LinearExpr {
        self.sub_inplace(&other);
        self
    }
    /// Value under a full assignment; unassigned variables count as zero.
    pub fn eval(&self, assignment: &BTreeMap<String, f64>) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * assignment.get(v).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr, // lhs
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    pub fn is_satisfied(&self, assignment: &BTreeMap<String, f64>, tol: f64) -> bool {
        let lhs = self.expr.eval(assignment);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// A pure 0/1 linear program: every variable is listed in `binaries`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ilp {
    pub objective: LinearExpr,
    pub sense: ObjSense,
    pub constraints: Vec<Constraint>,
    pub binaries: BTreeSet<String>,
    /// Declaration order of `binaries`; solvers that branch use it.
    pub order: Vec<String>,
}

impl Ilp {
    pub fn new() -> Self {
        Self {
            objective: LinearExpr::zero(),
            sense: ObjSense::Minimize,
            constraints: vec![],
            binaries: BTreeSet::new(),
            order: vec![],
        }
    }

    /// Declare a binary variable. Re-declaring is a no-op.
    pub fn binary(&mut self, name: impl Into<String>) -> String {
        let name = name.into();
        if self.binaries.insert(name.clone()) {
            self.order.push(name.clone());
        }
        name
    }

    /// Move constants of every constraint to its right-hand side and drop the
    /// objective constant.
    pub fn normalize(&mut self) {
        for c in self.constraints.iter_mut() {
            if c.expr.constant.abs() > 1e-12 {
                c.rhs -= c.expr.constant;
                c.expr.constant = 0.0;
            }
        }
        self.objective.constant = 0.0;
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for Ilp {
    fn default() -> Self {
        Self::new()
    }
}
