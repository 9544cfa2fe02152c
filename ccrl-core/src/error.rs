use thiserror::Error;

/// Configuration, invariant and adapter contract failures raised by this workspace.
///
/// Errors coming from an underlying environment are never converted into this type, they travel
/// through `anyhow` unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    #[error("unsupported suite: {suite}. Expected one of {allowed:?}")]
    UnsupportedSuite {
        suite: String,
        allowed: &'static [&'static str],
    },
    #[error("malformed task `{task}` for suite `{suite}`: expected {expected}")]
    MalformedTask {
        suite: &'static str,
        task: String,
        expected: &'static str,
    },
    #[error("malformed environment name `{0}`: expected `<suite>:<task>`")]
    MalformedEnvName(String),
    #[error("unknown agent `{agent}`. Expected one of {allowed:?}")]
    UnknownAgent {
        agent: String,
        allowed: &'static [&'static str],
    },
    #[error("a log directory is required")]
    MissingLogDir,
    #[error("a scoring logger is already active in this process")]
    LoggerAlreadyActive,
    #[error("action has {got} elements, the action space expects {expected}")]
    ActionSizeMismatch { expected: usize, got: usize },
    #[error("episode ending at step {total_steps} has a non-finite score {score}")]
    NonFiniteScore { total_steps: u64, score: String },
    #[error("cannot concatenate observation `{name}`: {reason}")]
    ObservationMismatch { name: String, reason: String },
}
