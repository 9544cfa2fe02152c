//! Hyperparameters for the agents the experiments run. The learning algorithms themselves are
//! external; these structs are the data handed to them.

use crate::builders::env::Suite;
use ccrl_core::EnvError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const VALID_AGENTS: &[&str] = &["ppo", "dmpo", "d4pg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Ppo,
    Dmpo,
    D4pg,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Ppo => "ppo",
            AgentKind::Dmpo => "dmpo",
            AgentKind::D4pg => "d4pg",
        }
    }

    pub fn all() -> [AgentKind; 3] {
        [AgentKind::D4pg, AgentKind::Dmpo, AgentKind::Ppo]
    }
}

impl FromStr for AgentKind {
    type Err = EnvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ppo" => Ok(AgentKind::Ppo),
            "dmpo" => Ok(AgentKind::Dmpo),
            "d4pg" => Ok(AgentKind::D4pg),
            _ => Err(EnvError::UnknownAgent {
                agent: s.to_owned(),
                allowed: VALID_AGENTS,
            }),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpoConfig {
    pub unroll_length: usize,
    pub num_minibatches: usize,
    pub num_epochs: usize,
    pub batch_size: usize,
    pub normalize_advantage: bool,
    pub max_abs_reward: f64,
    pub entropy_cost: f64,
    pub discount: f64,
    pub adam_epsilon: f64,
    /// Running mean/std normalization of observations.
    pub normalize_observations: bool,
    pub layer_sizes: Vec<usize>,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            unroll_length: 256,
            num_minibatches: 8,
            num_epochs: 3,
            batch_size: 64,
            normalize_advantage: true,
            max_abs_reward: 10.,
            entropy_cost: 0.01,
            discount: 0.997,
            adam_epsilon: 1e-5,
            normalize_observations: true,
            layer_sizes: vec![256, 256, 256],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticType {
    NonDistributional,
    MixtureOfGaussians,
    Categorical2d,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MpoConfig {
    pub critic_type: CriticType,
    pub epsilon_mean: f64,
    pub samples_per_insert: f64,
    pub learning_rate: f64,
    /// Transitions are built from `n_step` returns.
    pub n_step: usize,
    pub sgd_steps_per_learner_step: usize,
    pub policy_layer_sizes: Vec<usize>,
    pub critic_layer_sizes: Vec<usize>,
    pub policy_init_scale: f64,
    pub vmin: f64,
    pub vmax: f64,
}

impl MpoConfig {
    pub fn vmax_for(suite: Suite) -> f64 {
        match suite {
            Suite::Gym => 1600.,
            Suite::Control => 150.,
        }
    }

    pub fn for_suite(suite: Suite) -> Self {
        let vmax = Self::vmax_for(suite);
        Self {
            critic_type: CriticType::Categorical,
            epsilon_mean: 0.01,
            samples_per_insert: 64.,
            learning_rate: 3e-4,
            n_step: 4,
            sgd_steps_per_learner_step: 1,
            policy_layer_sizes: vec![256, 256, 256],
            critic_layer_sizes: vec![256, 256, 256],
            policy_init_scale: 0.5,
            vmin: -vmax,
            vmax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct D4pgConfig {
    pub learning_rate: f64,
    pub sigma: f64,
    pub policy_layer_sizes: Vec<usize>,
    pub critic_layer_sizes: Vec<usize>,
    pub vmin: f64,
    pub vmax: f64,
}

impl D4pgConfig {
    pub fn vmax_for(suite: Suite) -> f64 {
        match suite {
            Suite::Gym => 1000.,
            Suite::Control => 150.,
        }
    }

    pub fn for_suite(suite: Suite) -> Self {
        let vmax = Self::vmax_for(suite);
        Self {
            learning_rate: 3e-4,
            sigma: 0.2,
            policy_layer_sizes: vec![256, 256, 256],
            critic_layer_sizes: vec![256, 256, 256],
            vmin: -vmax,
            vmax,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "lowercase")]
pub enum AgentConfig {
    Ppo(PpoConfig),
    Dmpo(MpoConfig),
    D4pg(D4pgConfig),
}

impl AgentConfig {
    pub fn for_agent(kind: AgentKind, suite: Suite) -> Self {
        match kind {
            AgentKind::Ppo => AgentConfig::Ppo(PpoConfig::default()),
            AgentKind::Dmpo => AgentConfig::Dmpo(MpoConfig::for_suite(suite)),
            AgentKind::D4pg => AgentConfig::D4pg(D4pgConfig::for_suite(suite)),
        }
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            AgentConfig::Ppo(_) => AgentKind::Ppo,
            AgentConfig::Dmpo(_) => AgentKind::Dmpo,
            AgentConfig::D4pg(_) => AgentKind::D4pg,
        }
    }
}
