pub mod buffer;
pub mod env;
pub mod error;
pub mod logger;
pub mod rng;
pub mod wrappers;

pub use buffer::{Buffer, DType};
pub use env::{DynEnv, Env, EnvironmentDescription, ObservationDict, SnapShot, Space};
pub use error::EnvError;
pub use logger::{
    BudgetExhausted, LifecycleGuard, LoggerConfig, LoggerLicense, Outcome, ScoreRecord,
    ScoringLogger,
};
