//! CPLEX-LP text output, the format `scip` reads with `read <file>.lp`.

use crate::ilp::linear::{Ilp, LinearExpr, ObjSense, Sense};
use std::fmt::Write;

pub fn emit_lp(ilp: &Ilp) -> String {
    // LP files only allow constants on the rhs
    let mut ilp = ilp.clone();
    ilp.normalize();

    let mut out = String::new();
    match ilp.sense {
        ObjSense::Minimize => out.push_str("Minimize\n obj: "),
        ObjSense::Maximize => out.push_str("Maximize\n obj: "),
    }
    out.push_str(&fmt_lin(&ilp.objective));
    out.push('\n');
    out.push_str("Subject To\n");
    for c in &ilp.constraints {
        let _ = writeln!(
            out,
            " {}: {} {} {}",
            c.name,
            fmt_lin(&c.expr),
            fmt_sense(c.sense),
            fmt_num(c.rhs)
        );
    }
    out.push_str("Binary\n");
    for b in &ilp.order {
        let _ = writeln!(out, " {}", b);
    }
    out.push_str("End\n");
    out
}

fn fmt_sense(s: Sense) -> &'static str {
    match s {
        Sense::Le => "<=",
        Sense::Ge => ">=",
        Sense::Eq => "=",
    }
}

fn fmt_num(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.6}", v)
    }
}

fn fmt_lin(e: &LinearExpr) -> String {
    let mut parts: Vec<String> = vec![];
    for (n, c) in e.terms.iter() {
        if (c - 1.0).abs() < 1e-12 {
            parts.push(format!("+1 {}", n));
        } else if (c + 1.0).abs() < 1e-12 {
            parts.push(format!("-1 {}", n));
        } else {
            parts.push(format!("{:+.6} {}", c, n));
        }
    }
    if parts.is_empty() {
        // an empty row must still mention a variable
        parts.push("0 __zero".to_string());
    }
    parts.join(" ")
}
