use anyhow::Result;
use ccrl_core::{
    DynEnv, Env, EnvError, LoggerConfig, LoggerLicense, ObservationDict, ScoringLogger,
    logger::claim_process_license,
    wrappers::{CanonicalSpec, ConcatObservation, SinglePrecision},
};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};

pub const VALID_TASK_SUITES: &[&str] = &["gym", "control"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suite {
    Gym,
    Control,
}

impl Suite {
    pub fn as_str(&self) -> &'static str {
        match self {
            Suite::Gym => "gym",
            Suite::Control => "control",
        }
    }
}

impl FromStr for Suite {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gym" => Ok(Suite::Gym),
            "control" => Ok(Suite::Control),
            _ => Err(EnvError::UnsupportedSuite {
                suite: s.to_owned(),
                allowed: VALID_TASK_SUITES,
            }),
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task within a suite. Control tasks are `domain:task`, split on the first colon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskId {
    Gym(String),
    Control { domain: String, task: String },
}

impl TaskId {
    pub fn parse(suite: Suite, task: &str) -> Result<Self, EnvError> {
        match suite {
            Suite::Gym => Ok(TaskId::Gym(task.to_owned())),
            Suite::Control => {
                let (domain, task_name) =
                    task.split_once(':')
                        .ok_or_else(|| EnvError::MalformedTask {
                            suite: "control",
                            task: task.to_owned(),
                            expected: "`<domain>:<task>`",
                        })?;
                Ok(TaskId::Control {
                    domain: domain.to_owned(),
                    task: task_name.to_owned(),
                })
            }
        }
    }

    pub fn suite(&self) -> Suite {
        match self {
            TaskId::Gym(_) => Suite::Gym,
            TaskId::Control { .. } => Suite::Control,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Gym(id) => write!(f, "{id}"),
            TaskId::Control { domain, task } => write!(f, "{domain}:{task}"),
        }
    }
}

/// Constructs raw suite environments. The simulators live outside this workspace, an
/// implementation typically reaches into Gymnasium or dm_control.
pub trait SuiteLoader {
    fn load_gym(&self, id: &str) -> Result<DynEnv>;
    fn load_control(
        &self,
        domain: &str,
        task: &str,
    ) -> Result<Box<dyn Env<Observation = ObservationDict>>>;
}

impl<L: SuiteLoader + ?Sized> SuiteLoader for &L {
    fn load_gym(&self, id: &str) -> Result<DynEnv> {
        (**self).load_gym(id)
    }

    fn load_control(
        &self,
        domain: &str,
        task: &str,
    ) -> Result<Box<dyn Env<Observation = ObservationDict>>> {
        (**self).load_control(domain, task)
    }
}

pub trait EnvBuilderTrait {
    type Env: Env;

    fn build_env(&self) -> Result<Self::Env>;
}

impl<E: Env, F> EnvBuilderTrait for F
where
    F: Fn() -> Result<E>,
{
    type Env = E;

    fn build_env(&self) -> Result<Self::Env> {
        (self)()
    }
}

/// Environment after the fixed adapter chain, before scoring.
pub type CanonicalEnv = SinglePrecision<CanonicalSpec<DynEnv>>;
pub type ScoredEnv = ScoringLogger<CanonicalEnv>;

/// Builds unscored canonical environments for one task. Useful wherever an extra environment is
/// needed next to the scored one, since only one scoring logger may exist per process.
pub struct SuiteEnvBuilder<L> {
    loader: L,
    task: TaskId,
}

impl<L: SuiteLoader> SuiteEnvBuilder<L> {
    pub fn new(loader: L, task: TaskId) -> Self {
        Self { loader, task }
    }

    pub fn task(&self) -> &TaskId {
        &self.task
    }
}

impl<L: SuiteLoader> EnvBuilderTrait for SuiteEnvBuilder<L> {
    type Env = CanonicalEnv;

    fn build_env(&self) -> Result<Self::Env> {
        tracing::info!(suite = %self.task.suite(), task = %self.task, "building environment");
        let env: DynEnv = match &self.task {
            TaskId::Gym(id) => self.loader.load_gym(id)?,
            TaskId::Control { domain, task } => {
                let env = self.loader.load_control(domain, task)?;
                Box::new(ConcatObservation::new(env))
            }
        };
        Ok(SinglePrecision::new(CanonicalSpec::new(env, true)))
    }
}

/// A validated `make_environment` call: every configuration error has been reported by the
/// time one of these exists.
#[derive(Debug, Clone)]
pub struct EnvRequest {
    pub task: TaskId,
    pub logger_config: LoggerConfig,
}

impl EnvRequest {
    pub fn parse(suite: &str, task: &str, log_dir: impl AsRef<Path>) -> Result<Self, EnvError> {
        let suite = suite.parse::<Suite>()?;
        let task = TaskId::parse(suite, task)?;
        let log_dir = log_dir.as_ref();
        if log_dir.as_os_str().is_empty() {
            return Err(EnvError::MissingLogDir);
        }
        Ok(Self {
            task,
            logger_config: LoggerConfig::new(log_dir),
        })
    }

    pub fn with_step_budget(mut self, step_budget: u64) -> Self {
        self.logger_config = self.logger_config.with_step_budget(step_budget);
        self
    }

    pub fn build<L: SuiteLoader>(self, loader: L, license: LoggerLicense) -> Result<ScoredEnv> {
        let env = SuiteEnvBuilder::new(loader, self.task).build_env()?;
        ScoringLogger::with_license(env, self.logger_config, license)
    }
}

/// Builds the scored environment for `suite`/`task`, claiming the process-wide logger license.
pub fn make_environment_with<L: SuiteLoader>(
    loader: L,
    suite: &str,
    task: &str,
    log_dir: impl AsRef<Path>,
) -> Result<ScoredEnv> {
    let request = EnvRequest::parse(suite, task, log_dir)?;
    let license = claim_process_license()?;
    request.build(loader, license)
}

#[cfg(test)]
mod test {
    use super::{Suite, TaskId};
    use ccrl_core::EnvError;

    #[test]
    fn control_tasks_split_on_first_colon() {
        assert_eq!(
            TaskId::parse(Suite::Control, "walker:walk"),
            Ok(TaskId::Control {
                domain: "walker".into(),
                task: "walk".into()
            })
        );
        assert_eq!(
            TaskId::parse(Suite::Control, "ball_in_cup:catch:extra"),
            Ok(TaskId::Control {
                domain: "ball_in_cup".into(),
                task: "catch:extra".into()
            })
        );
    }

    #[test]
    fn gym_ids_are_passed_through() {
        assert_eq!(
            TaskId::parse(Suite::Gym, "HalfCheetah-v2"),
            Ok(TaskId::Gym("HalfCheetah-v2".into()))
        );
    }

    #[test]
    fn control_task_without_colon_is_malformed() {
        assert!(matches!(
            TaskId::parse(Suite::Control, "walker"),
            Err(EnvError::MalformedTask { .. })
        ));
    }

    #[test]
    fn unknown_suite_names_the_allowed_set() {
        let err = "other".parse::<Suite>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("other"));
        assert!(message.contains("\"gym\""));
        assert!(message.contains("\"control\""));
    }
}
