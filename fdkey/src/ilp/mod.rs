//! Flat 0/1 linear programs and their LP-file rendering.

mod linear;
mod lp_format;

pub use linear::{Constraint, Ilp, LinearExpr, ObjSense, Sense};
pub use lp_format::emit_lp;

impl Ilp {
    /// Render as CPLEX-LP text (SCIP-compatible).
    pub fn to_lp(&self) -> String {
        emit_lp(self)
    }
}
