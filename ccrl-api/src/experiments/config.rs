use super::agents::{AgentConfig, AgentKind};
use crate::builders::env::Suite;
use anyhow::Result;
use ccrl_core::{EnvError, LoggerConfig};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// `<suite>:<task>`, split on the first colon: `control:walker:walk` is suite `control` with task
/// `walker:walk`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvName {
    pub suite: Suite,
    pub task: String,
}

impl FromStr for EnvName {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (suite, task) = s
            .split_once(':')
            .ok_or_else(|| EnvError::MalformedEnvName(s.to_owned()))?;
        Ok(Self {
            suite: suite.parse()?,
            task: task.to_owned(),
        })
    }
}

impl fmt::Display for EnvName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.suite, self.task)
    }
}

impl Default for EnvName {
    fn default() -> Self {
        Self {
            suite: Suite::Control,
            task: "walker:walk".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    pub agent: AgentConfig,
    pub env_name: EnvName,
    pub seed: u64,
    pub logdir: PathBuf,
    pub max_num_actor_steps: u64,
    pub eval_every: u64,
    pub evaluation_episodes: usize,
    pub run_distributed: bool,
    pub num_distributed_actors: usize,
}

impl ExperimentConfig {
    pub fn new(agent: AgentKind, env_name: EnvName, logdir: impl Into<PathBuf>) -> Self {
        let (max_num_actor_steps, num_distributed_actors) = match agent {
            AgentKind::Ppo => (1_100_000, 64),
            AgentKind::Dmpo | AgentKind::D4pg => (1_000_000, 4),
        };
        Self {
            agent: AgentConfig::for_agent(agent, env_name.suite),
            env_name,
            seed: 0,
            logdir: logdir.into(),
            max_num_actor_steps,
            eval_every: 50_000,
            evaluation_episodes: 10,
            run_distributed: false,
            num_distributed_actors,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_num_actor_steps(mut self, steps: u64) -> Self {
        self.max_num_actor_steps = steps;
        self
    }

    pub fn with_run_distributed(mut self, run_distributed: bool) -> Self {
        self.run_distributed = run_distributed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.logdir.as_os_str().is_empty() {
            return Err(EnvError::MissingLogDir.into());
        }
        anyhow::ensure!(
            self.max_num_actor_steps > 0,
            "max_num_actor_steps must be positive"
        );
        Ok(())
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig::new(&self.logdir)
    }
}

#[cfg(test)]
mod test {
    use super::{EnvName, ExperimentConfig};
    use crate::{builders::env::Suite, experiments::agents::AgentKind};
    use ccrl_core::EnvError;

    #[test]
    fn env_name_keeps_the_rest_as_task() {
        let name: EnvName = "control:walker:walk".parse().unwrap();
        assert_eq!(name.suite, Suite::Control);
        assert_eq!(name.task, "walker:walk");
        assert_eq!(name.to_string(), "control:walker:walk");

        let name: EnvName = "gym:HalfCheetah-v2".parse().unwrap();
        assert_eq!(name.suite, Suite::Gym);
        assert_eq!(name.task, "HalfCheetah-v2");
    }

    #[test]
    fn env_name_errors() {
        assert_eq!(
            "walker".parse::<EnvName>(),
            Err(EnvError::MalformedEnvName("walker".into()))
        );
        assert!(matches!(
            "atari:pong".parse::<EnvName>(),
            Err(EnvError::UnsupportedSuite { .. })
        ));
    }

    #[test]
    fn defaults_follow_the_agent() {
        let ppo = ExperimentConfig::new(AgentKind::Ppo, EnvName::default(), "/tmp/run");
        assert_eq!(ppo.max_num_actor_steps, 1_100_000);
        assert_eq!(ppo.num_distributed_actors, 64);
        let mpo = ExperimentConfig::new(AgentKind::Dmpo, EnvName::default(), "/tmp/run");
        assert_eq!(mpo.max_num_actor_steps, 1_000_000);
        assert_eq!(mpo.num_distributed_actors, 4);
        assert_eq!(mpo.eval_every, 50_000);
        assert_eq!(mpo.evaluation_episodes, 10);
    }

    #[test]
    fn logdir_is_required() {
        let config = ExperimentConfig::new(AgentKind::Ppo, EnvName::default(), "");
        let err = config.validate().unwrap_err();
        assert_eq!(err.downcast_ref::<EnvError>(), Some(&EnvError::MissingLogDir));
    }
}
