//! Minimum-cardinality candidate keys of a relational schema.
//!
//! Given attributes `R` and functional dependencies `F`, [`candidate_key`]
//! finds a smallest `K` with `closure(K, F) = R`. The search is exact: the
//! closure condition is unrolled into a 0/1 program ([`model`]), handed to a
//! [`MipSolver`], and the answer is re-checked with the closure engine before
//! it is returned.
//!
//! ```no_run
//! use fdkey::{candidate_key, fds, ScipSolver};
//! use std::collections::BTreeSet;
//!
//! let deps = fds! { A, B -> C; C -> D; };
//! let schema: BTreeSet<String> = ["A", "B", "C", "D"].map(String::from).into();
//! let found = candidate_key(&schema, &deps, &ScipSolver::from_env())?;
//! assert_eq!(found.key.len(), 2);
//! # Ok::<(), fdkey::KeyError>(())
//! ```

extern crate self as fdkey;

pub mod closure;
pub mod error;
pub mod extract;
pub mod fd;
pub mod ilp;
pub mod model;
pub mod solve;
pub mod solver;

pub use closure::{closure, derivation_rounds, is_superkey};
pub use error::{KeyError, SolverError};
pub use fd::{attributes_of, Fd, FunctionalDependency};
pub use fdkey_macros::fds;
pub use solve::{candidate_key, minimal_core, CandidateKey};
pub use solver::{MicroLpSolver, MipSolver, ScipSolver, SolveStatus, SolverOutput};
