use crate::error::SolverError;
use crate::ilp::Ilp;
use crate::solver::{MipSolver, SolveStatus, SolverOutput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Runs the `scip` command-line solver on an LP file.
///
/// The model is written to `model.lp` inside a fresh temporary directory (or
/// `work_dir` when set), SCIP is driven through its interactive shell on
/// stdin, and the solution file it writes is parsed back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScipSolver {
    /// Executable to run.
    pub program: String,
    /// Passed as `set limits time`.
    pub time_limit_secs: Option<f64>,
    /// Extra `set <path> <value>` lines, e.g. `("limits/gap", "0")`.
    pub settings: Vec<(String, String)>,
    /// Keep `model.lp` / `model.sol` here instead of a temporary directory.
    pub work_dir: Option<PathBuf>,
}

impl Default for ScipSolver {
    fn default() -> Self {
        Self {
            program: "scip".to_string(),
            time_limit_secs: None,
            settings: vec![],
            work_dir: None,
        }
    }
}

impl ScipSolver {
    /// Default settings, with the executable taken from `SCIP_BIN` if set.
    pub fn from_env() -> Self {
        let program = std::env::var("SCIP_BIN").unwrap_or_else(|_| "scip".to_string());
        Self {
            program,
            ..Self::default()
        }
    }

    pub fn with_time_limit(mut self, secs: f64) -> Self {
        self.time_limit_secs = Some(secs);
        self
    }

    fn script(&self, lp_path: &Path, sol_path: &Path) -> String {
        let mut cmds = format!("read {}\n", lp_path.display());
        if let Some(t) = self.time_limit_secs {
            cmds.push_str(&format!("set limits time {}\n", t));
        }
        for (k, v) in &self.settings {
            cmds.push_str(&format!("set {} {}\n", k.replace('/', " "), v));
        }
        cmds.push_str("set write printzeros TRUE\n");
        cmds.push_str("optimize\n");
        cmds.push_str(&format!("write solution {}\n", sol_path.display()));
        cmds.push_str("quit\n");
        cmds
    }

    fn run_in(&self, dir: &Path, ilp: &Ilp) -> Result<SolverOutput, SolverError> {
        let lp_path = dir.join("model.lp");
        let sol_path = dir.join("model.sol");
        std::fs::write(&lp_path, ilp.to_lp())?;
        // a stale solution from an earlier run in `work_dir` must not be read
        if sol_path.exists() {
            std::fs::remove_file(&sol_path)?;
        }

        log::debug!("running `{}` on {}", self.program, lp_path.display());
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SolverError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| SolverError::Parse("scip stdin not captured".to_string()))?;
            stdin.write_all(self.script(&lp_path, &sol_path).as_bytes())?;
        }

        let out = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
        if !out.status.success() {
            log::warn!("`{}` exited with {}", self.program, out.status);
            return Err(SolverError::Exit {
                program: self.program.clone(),
                status: out.status,
                stdout,
                stderr,
            });
        }

        let sol_txt = std::fs::read_to_string(&sol_path).map_err(|e| {
            SolverError::MissingSolution(format!(
                "{}: {}\n--- stdout ---\n{}",
                sol_path.display(),
                e,
                stdout
            ))
        })?;
        parse_scip_sol(&sol_txt)
    }
}

impl MipSolver for ScipSolver {
    fn solve(&self, ilp: &Ilp) -> Result<SolverOutput, SolverError> {
        match &self.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                self.run_in(dir, ilp)
            }
            None => {
                let tmp = tempfile::tempdir()?;
                self.run_in(tmp.path(), ilp)
            }
        }
    }
}

fn parse_status(s: &str) -> Result<SolveStatus, SolverError> {
    let s = s.trim().to_ascii_lowercase();
    if s.contains("optimal") {
        Ok(SolveStatus::Optimal)
    } else if s.contains("infeasible") {
        Ok(SolveStatus::Infeasible)
    } else if s.contains("time limit") || s.contains("node limit") {
        Ok(SolveStatus::Timeout)
    } else {
        Err(SolverError::UnexpectedStatus(s))
    }
}

/// Parse a SCIP `.sol` file.
/// - `solution status: ...` gives the status
/// - `objective value: ...` gives the objective if present
/// - `<var> <value> (obj:..)` lines give the assignment
pub(crate) fn parse_scip_sol(sol: &str) -> Result<SolverOutput, SolverError> {
    let mut status = None;
    let mut objective = None;
    let mut assignment = BTreeMap::new();

    for line in sol.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("solution status:") {
            status = Some(parse_status(rest)?);
            continue;
        }
        if let Some(rest) = line.strip_prefix("objective value:") {
            let v = rest
                .trim()
                .parse::<f64>()
                .map_err(|e| SolverError::Parse(format!("objective `{}`: {}", rest.trim(), e)))?;
            objective = Some(v);
            continue;
        }
        if line.starts_with("no solution available") {
            continue;
        }

        let mut it = line.split_whitespace();
        let (Some(name), Some(val)) = (it.next(), it.next()) else {
            continue;
        };
        match val.parse::<f64>() {
            Ok(v) => {
                assignment.insert(name.to_string(), v);
            }
            Err(_) => return Err(SolverError::Parse(format!("bad assignment line `{}`", line))),
        }
    }

    let status =
        status.ok_or_else(|| SolverError::Parse("no `solution status:` line".to_string()))?;
    Ok(SolverOutput {
        status,
        objective,
        assignment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ilp::{Constraint, LinearExpr, Sense};

    #[test]
    fn test_parse_optimal_solution() {
        let sol = "solution status: optimal solution found\n\
                   objective value:                                    1\n\
                   D__0__0                                             1 \t(obj:1)\n\
                   D__0__1                                             0 \t(obj:1)\n";
        let out = parse_scip_sol(sol).unwrap();
        assert_eq!(out.status, SolveStatus::Optimal);
        assert_eq!(out.objective, Some(1.0));
        assert_eq!(out.value("D__0__0"), 1.0);
        assert_eq!(out.value("D__0__1"), 0.0);
    }

    #[test]
    fn test_parse_infeasible_and_time_limit() {
        let out = parse_scip_sol("solution status: infeasible\nno solution available\n").unwrap();
        assert_eq!(out.status, SolveStatus::Infeasible);
        assert!(out.assignment.is_empty());

        let out = parse_scip_sol("solution status: time limit reached\nobjective value: 4\nx 1\n").unwrap();
        assert_eq!(out.status, SolveStatus::Timeout);
        assert_eq!(out.objective, Some(4.0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_scip_sol("x 1\n"), Err(SolverError::Parse(_))));
        assert!(matches!(
            parse_scip_sol("solution status: user interrupt\n"),
            Err(SolverError::UnexpectedStatus(_))
        ));
        assert!(matches!(
            parse_scip_sol("solution status: optimal solution found\nx one\n"),
            Err(SolverError::Parse(_))
        ));
    }

    #[test]
    fn test_script() {
        let s = ScipSolver {
            time_limit_secs: Some(2.5),
            settings: vec![("limits/gap".into(), "0".into())],
            ..ScipSolver::default()
        };
        let script = s.script(Path::new("/t/model.lp"), Path::new("/t/model.sol"));
        assert_eq!(
            script,
            "read /t/model.lp\nset limits time 2.5\nset limits gap 0\nset write printzeros TRUE\noptimize\nwrite solution /t/model.sol\nquit\n"
        );
    }

    #[test]
    fn test_missing_binary_is_spawn_error() {
        let s = ScipSolver {
            program: "/nonexistent/fdkey-scip".into(),
            ..ScipSolver::default()
        };
        let mut ilp = Ilp::new();
        let x = ilp.binary("x");
        ilp.constraints.push(Constraint {
            name: "c".into(),
            expr: LinearExpr::from_var(&x, 1.0),
            sense: Sense::Ge,
            rhs: 1.0,
        });
        assert!(matches!(s.solve(&ilp), Err(SolverError::Spawn { .. })));
    }

    #[test]
    fn test_config_from_json() {
        let s: ScipSolver = serde_json::from_str(r#"{"program": "/opt/scip/bin/scip", "time_limit_secs": 10.0}"#).unwrap();
        assert_eq!(s.program, "/opt/scip/bin/scip");
        assert_eq!(s.time_limit_secs, Some(10.0));
        assert!(s.settings.is_empty());
    }
}
