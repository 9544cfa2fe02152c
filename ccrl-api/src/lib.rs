//! Builds scored environments, describes experiments, drives episodes and expands sweeps into
//! job descriptions.

pub mod builders;
pub mod driver;
pub mod experiments;
pub mod launch;

pub use builders::env::{
    CanonicalEnv, EnvRequest, ScoredEnv, Suite, SuiteLoader, TaskId, make_environment_with,
};
