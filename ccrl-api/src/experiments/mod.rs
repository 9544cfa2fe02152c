pub mod agents;
pub mod config;

pub use agents::{AgentConfig, AgentKind, D4pgConfig, MpoConfig, PpoConfig};
pub use config::{EnvName, ExperimentConfig};
