//! Python-backed suite loaders: Gymnasium for `gym` tasks and dm_control for `control` tasks.

mod control;
mod gym;
mod numpy;

pub use control::ControlEnv;
pub use gym::GymEnv;

use anyhow::Result;
use ccrl_api::{ScoredEnv, SuiteLoader, make_environment_with};
use ccrl_core::{DynEnv, Env, ObservationDict};
use std::path::Path;

/// Loads raw environments through the embedded Python interpreter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PythonSuites;

impl SuiteLoader for PythonSuites {
    fn load_gym(&self, id: &str) -> Result<DynEnv> {
        Ok(Box::new(GymEnv::new(id)?))
    }

    fn load_control(
        &self,
        domain: &str,
        task: &str,
    ) -> Result<Box<dyn Env<Observation = ObservationDict>>> {
        Ok(Box::new(ControlEnv::new(domain, task)?))
    }
}

/// Builds the scored, canonical environment for `suite`/`task`. May be called once per process.
pub fn make_environment(suite: &str, task: &str, log_dir: impl AsRef<Path>) -> Result<ScoredEnv> {
    make_environment_with(PythonSuites, suite, task, log_dir)
}
