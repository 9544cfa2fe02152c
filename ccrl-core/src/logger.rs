use crate::{
    buffer::Buffer,
    env::{Env, EnvironmentDescription, SnapShot},
    error::EnvError,
};
use anyhow::Result;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::Instant,
};

pub const DEFAULT_STEP_BUDGET: u64 = 1_100_000;
pub const SCORES_FILE_NAME: &str = "scores.jsonl";

/// A claim-once cell. The first [`LifecycleGuard::claim`] hands out a [`LoggerLicense`], every
/// later claim fails with [`EnvError::LoggerAlreadyActive`]. Claims are never released.
pub struct LifecycleGuard(OnceCell<()>);

impl LifecycleGuard {
    pub const fn new() -> Self {
        Self(OnceCell::new())
    }

    pub fn claim(&self) -> Result<LoggerLicense, EnvError> {
        self.0
            .set(())
            .map_err(|_| EnvError::LoggerAlreadyActive)?;
        Ok(LoggerLicense { _private: () })
    }

    pub fn is_claimed(&self) -> bool {
        self.0.get().is_some()
    }
}

impl Default for LifecycleGuard {
    fn default() -> Self {
        Self::new()
    }
}

static PROCESS_GUARD: LifecycleGuard = LifecycleGuard::new();

/// Capability required to construct a [`ScoringLogger`].
#[derive(Debug)]
pub struct LoggerLicense {
    _private: (),
}

/// Claims the process-wide logger license. Succeeds at most once per process.
pub fn claim_process_license() -> Result<LoggerLicense, EnvError> {
    PROCESS_GUARD.claim()
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub file_name: String,
    pub step_budget: u64,
}

impl LoggerConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            file_name: SCORES_FILE_NAME.to_owned(),
            step_budget: DEFAULT_STEP_BUDGET,
        }
    }

    pub fn with_step_budget(mut self, step_budget: u64) -> Self {
        self.step_budget = step_budget;
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

/// One line of the scores file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub xs: u64,
    pub ys: f64,
}

/// The step budget has been used up and the process is expected to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetExhausted {
    pub total_steps: u64,
}

impl BudgetExhausted {
    pub fn banner() -> String {
        let rule = "-".repeat(79);
        format!("{rule}\nREACHED ENOUGH STEPS; STOPPING!\n{rule}")
    }

    /// Prints the termination banner and exits with status 0 without unwinding.
    pub fn halt(self) -> ! {
        tracing::info!(total_steps = self.total_steps, "step budget exhausted");
        println!("{}", Self::banner());
        let _ = std::io::stdout().flush();
        std::process::exit(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Continue(T),
    BudgetExhausted(BudgetExhausted),
}

impl<T> Outcome<T> {
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, Outcome::BudgetExhausted(_))
    }

    pub fn into_continue(self) -> Option<T> {
        match self {
            Outcome::Continue(value) => Some(value),
            Outcome::BudgetExhausted(_) => None,
        }
    }

    /// Returns the value, or stops the process if the budget ran out.
    pub fn or_halt(self) -> T {
        match self {
            Outcome::Continue(value) => value,
            Outcome::BudgetExhausted(exhausted) => exhausted.halt(),
        }
    }
}

/// Accumulates per-episode reward and appends one JSON line per finished episode.
///
/// The total step counter counts both `reset` and `step` calls. Once it reaches the configured
/// budget the `try_` methods report [`Outcome::BudgetExhausted`]; the [`Env`] implementation
/// turns that into an immediate process exit.
pub struct ScoringLogger<E> {
    env: E,
    scores_path: PathBuf,
    step_budget: u64,
    score: f64,
    total: u64,
    start: Instant,
    _license: LoggerLicense,
}

impl<E: Env> ScoringLogger<E> {
    /// Claims the process-wide license. A second logger in the same process is rejected.
    pub fn new(env: E, config: LoggerConfig) -> Result<Self> {
        let license = claim_process_license()?;
        Self::with_license(env, config, license)
    }

    pub fn with_license(env: E, config: LoggerConfig, license: LoggerLicense) -> Result<Self> {
        if config.log_dir.as_os_str().is_empty() {
            return Err(EnvError::MissingLogDir.into());
        }
        fs::create_dir_all(&config.log_dir)?;
        let scores_path = config.log_dir.join(&config.file_name);
        tracing::info!(
            scores = %scores_path.display(),
            step_budget = config.step_budget,
            "scoring logger active"
        );
        Ok(Self {
            env,
            scores_path,
            step_budget: config.step_budget,
            score: 0.,
            total: 0,
            start: Instant::now(),
            _license: license,
        })
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn into_inner(self) -> E {
        self.env
    }

    pub fn total_steps(&self) -> u64 {
        self.total
    }

    pub fn episode_score(&self) -> f64 {
        self.score
    }

    pub fn step_budget(&self) -> u64 {
        self.step_budget
    }

    pub fn scores_path(&self) -> &Path {
        &self.scores_path
    }

    /// Wall clock minutes since construction, rounded to one decimal.
    pub fn elapsed_minutes(&self) -> f64 {
        let mins = self.start.elapsed().as_secs_f64() / 60.;
        (mins * 10.).round() / 10.
    }

    fn budget_check<T>(&self, value: T) -> Outcome<T> {
        if self.total >= self.step_budget {
            Outcome::BudgetExhausted(BudgetExhausted {
                total_steps: self.total,
            })
        } else {
            Outcome::Continue(value)
        }
    }

    /// Starts a new episode. The reset counts towards the step budget, so a reset can be the call
    /// that ends the run.
    pub fn try_reset(&mut self, seed: u64) -> Result<Outcome<E::Observation>> {
        self.score = 0.;
        self.total += 1;
        let observation = self.env.reset(seed)?;
        Ok(self.budget_check(observation))
    }

    pub fn try_step(&mut self, action: Buffer) -> Result<Outcome<SnapShot<E::Observation>>> {
        self.total += 1;
        let snapshot = self.env.step(action)?;
        self.score += snapshot.reward;
        if snapshot.is_last() {
            self.record_episode()?;
            self.score = 0.;
        }
        Ok(self.budget_check(snapshot))
    }

    fn record_episode(&self) -> Result<()> {
        if !self.score.is_finite() {
            return Err(EnvError::NonFiniteScore {
                total_steps: self.total,
                score: self.score.to_string(),
            }
            .into());
        }
        let mins = self.elapsed_minutes();
        println!("episode done! {} {:?} {:?}", self.total, mins, self.score);
        let record = ScoreRecord {
            xs: self.total,
            ys: self.score,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.scores_path)?;
        writeln!(file, "{}", serde_json::to_string(&record)?)?;
        tracing::debug!(xs = record.xs, ys = record.ys, "episode recorded");
        Ok(())
    }
}

impl<E: Env> Env for ScoringLogger<E> {
    type Observation = E::Observation;

    fn reset(&mut self, seed: u64) -> Result<Self::Observation> {
        Ok(self.try_reset(seed)?.or_halt())
    }

    fn step(&mut self, action: Buffer) -> Result<SnapShot<Self::Observation>> {
        Ok(self.try_step(action)?.or_halt())
    }

    fn env_description(&self) -> EnvironmentDescription {
        self.env.env_description()
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}
