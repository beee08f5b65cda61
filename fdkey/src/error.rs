use thiserror::Error;

/// Failures of a solver invocation. The adapter reports them as-is; nothing
/// here is retried.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The solver executable could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("solver i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The solver ran but exited unsuccessfully.
    #[error("`{program}` exited with {status}\n--- stdout ---\n{stdout}\n--- stderr ---\n{stderr}")]
    Exit {
        program: String,
        status: std::process::ExitStatus,
        stdout: String,
        stderr: String,
    },
    #[error("solver reported a solution but none was written: {0}")]
    MissingSolution(String),
    #[error("cannot parse solver output: {0}")]
    Parse(String),
    /// The in-process backend failed for a reason other than infeasibility.
    #[error("solver backend: {0}")]
    Backend(String),
    /// The model uses something this backend cannot handle.
    #[error("unsupported model: {0}")]
    Unsupported(String),
    /// A status the pipeline cannot turn into an answer, e.g. an infeasible
    /// key model.
    #[error("unexpected solver status: {0}")]
    UnexpectedStatus(String),
}

/// Errors of the key-finding pipeline.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Even the full attribute set does not cover the target.
    #[error("no key exists: closure of all attributes misses {missing}")]
    NoKeyExists { missing: String },
    /// A dependency mentions an attribute outside the schema.
    #[error("dependency mentions attribute `{0}` outside the schema")]
    UnknownAttribute(String),
    /// The solver ran out of its time budget.
    #[error("solver timed out")]
    Timeout,
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// The solver's answer failed independent re-verification.
    #[error("validation mismatch: {0}")]
    ValidationMismatch(String),
}
