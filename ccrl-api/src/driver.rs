use anyhow::Result;
use ccrl_core::{
    BudgetExhausted, Buffer, DType, Env, EnvironmentDescription, Outcome, ScoringLogger,
    SnapShot, Space, rng::next_seed,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Chooses actions for a scored environment. Learning agents live outside this workspace and
/// plug in here.
pub trait Actor {
    fn select_action(&mut self, observation: &Buffer) -> Result<Buffer>;

    fn observe(&mut self, _snapshot: &SnapShot<Buffer>) {}
}

/// Uniform actions in the canonical `[-1, 1]` range, or a uniformly chosen one-hot action for a
/// discrete action space.
pub struct RandomActor {
    rng: StdRng,
    action_space: Space,
}

impl RandomActor {
    pub fn new(description: &EnvironmentDescription, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            action_space: description.action_space.clone(),
        }
    }
}

impl Actor for RandomActor {
    fn select_action(&mut self, _observation: &Buffer) -> Result<Buffer> {
        match &self.action_space {
            Space::Discrete(n) => {
                anyhow::ensure!(*n > 0, "discrete action space has no actions");
                let mut data = vec![0.; *n];
                data[self.rng.random_range(0..*n)] = 1.;
                Ok(Buffer::from_vec(data, DType::F32))
            }
            space => {
                let data = (0..space.size())
                    .map(|_| self.rng.random_range(-1.0..=1.0))
                    .collect();
                Ok(Buffer::from_vec(data, space.dtype().unwrap_or(DType::F32)))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The actor step limit was reached before the logger's budget.
    StepLimit { actor_steps: u64, episodes: u64 },
    BudgetExhausted(BudgetExhausted),
}

/// Runs whole episodes until either `max_actor_steps` actions were taken or the logger reports
/// that its step budget is exhausted. The caller decides what to do with the latter; the binary
/// halts the process.
pub fn run_episodes<E, A>(
    logger: &mut ScoringLogger<E>,
    actor: &mut A,
    max_actor_steps: u64,
) -> Result<RunOutcome>
where
    E: Env<Observation = Buffer>,
    A: Actor + ?Sized,
{
    let mut actor_steps = 0;
    let mut episodes = 0;
    loop {
        if actor_steps >= max_actor_steps {
            return Ok(RunOutcome::StepLimit {
                actor_steps,
                episodes,
            });
        }
        let mut observation = match logger.try_reset(next_seed())? {
            Outcome::Continue(observation) => observation,
            Outcome::BudgetExhausted(exhausted) => return Ok(RunOutcome::BudgetExhausted(exhausted)),
        };
        loop {
            if actor_steps >= max_actor_steps {
                return Ok(RunOutcome::StepLimit {
                    actor_steps,
                    episodes,
                });
            }
            let action = actor.select_action(&observation)?;
            let snapshot = match logger.try_step(action)? {
                Outcome::Continue(snapshot) => snapshot,
                Outcome::BudgetExhausted(exhausted) => {
                    return Ok(RunOutcome::BudgetExhausted(exhausted));
                }
            };
            actor_steps += 1;
            actor.observe(&snapshot);
            let last = snapshot.is_last();
            observation = snapshot.state;
            if last {
                episodes += 1;
                tracing::debug!(episodes, actor_steps, "episode finished");
                break;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Actor, RandomActor, RunOutcome, run_episodes};
    use anyhow::Result;
    use ccrl_core::{
        BudgetExhausted, Buffer, DType, Env, EnvironmentDescription, LifecycleGuard,
        LoggerConfig, ScoringLogger, SnapShot, Space,
    };

    struct Corridor {
        length: usize,
        t: usize,
    }

    impl Env for Corridor {
        type Observation = Buffer;

        fn reset(&mut self, _seed: u64) -> Result<Buffer> {
            self.t = 0;
            Ok(Buffer::full(0., 2, DType::F32))
        }

        fn step(&mut self, action: Buffer) -> Result<SnapShot<Buffer>> {
            assert!(action.data.iter().all(|a| (-1. ..=1.).contains(a)));
            self.t += 1;
            Ok(SnapShot::new(
                Buffer::full(self.t as f64, 2, DType::F32),
                1.,
                false,
                self.t == self.length,
            ))
        }

        fn env_description(&self) -> EnvironmentDescription {
            EnvironmentDescription::new(
                Space::continuous_from_dims(vec![2], DType::F32),
                Space::bounded(
                    Buffer::full(-1., 3, DType::F32),
                    Buffer::full(1., 3, DType::F32),
                ),
                DType::F32,
            )
        }
    }

    struct Counting {
        observed: usize,
    }

    impl Actor for Counting {
        fn select_action(&mut self, _observation: &Buffer) -> Result<Buffer> {
            Ok(Buffer::full(0., 3, DType::F32))
        }

        fn observe(&mut self, _snapshot: &SnapShot<Buffer>) {
            self.observed += 1;
        }
    }

    #[test]
    fn stops_at_actor_step_limit() -> Result<()> {
        static GUARD: LifecycleGuard = LifecycleGuard::new();
        let dir = tempfile::tempdir()?;
        let mut logger = ScoringLogger::with_license(
            Corridor { length: 4, t: 0 },
            LoggerConfig::new(dir.path()),
            GUARD.claim()?,
        )?;
        let mut actor = Counting { observed: 0 };
        let outcome = run_episodes(&mut logger, &mut actor, 10)?;
        assert_eq!(
            outcome,
            RunOutcome::StepLimit {
                actor_steps: 10,
                episodes: 2
            }
        );
        assert_eq!(actor.observed, 10);
        // 3 resets + 10 steps
        assert_eq!(logger.total_steps(), 13);
        Ok(())
    }

    #[test]
    fn limit_on_an_episode_boundary_skips_the_next_reset() -> Result<()> {
        static GUARD: LifecycleGuard = LifecycleGuard::new();
        let dir = tempfile::tempdir()?;
        let mut logger = ScoringLogger::with_license(
            Corridor { length: 5, t: 0 },
            LoggerConfig::new(dir.path()).with_step_budget(13),
            GUARD.claim()?,
        )?;
        let mut actor = Counting { observed: 0 };
        let outcome = run_episodes(&mut logger, &mut actor, 10)?;
        assert_eq!(
            outcome,
            RunOutcome::StepLimit {
                actor_steps: 10,
                episodes: 2
            }
        );
        // 2 resets + 10 steps
        assert_eq!(logger.total_steps(), 12);
        Ok(())
    }

    #[test]
    fn zero_step_limit_touches_nothing() -> Result<()> {
        static GUARD: LifecycleGuard = LifecycleGuard::new();
        let dir = tempfile::tempdir()?;
        let mut logger = ScoringLogger::with_license(
            Corridor { length: 5, t: 0 },
            LoggerConfig::new(dir.path()),
            GUARD.claim()?,
        )?;
        let outcome = run_episodes(&mut logger, &mut Counting { observed: 0 }, 0)?;
        assert_eq!(
            outcome,
            RunOutcome::StepLimit {
                actor_steps: 0,
                episodes: 0
            }
        );
        assert_eq!(logger.total_steps(), 0);
        Ok(())
    }

    #[test]
    fn random_actor_picks_one_hot_actions_for_discrete_spaces() -> Result<()> {
        let description = EnvironmentDescription::new(
            Space::continuous_from_dims(vec![4], DType::F32),
            Space::Discrete(2),
            DType::F32,
        );
        let mut actor = RandomActor::new(&description, 0);
        let observation = Buffer::full(0., 4, DType::F32);
        let mut hits = [0; 2];
        for _ in 0..1000 {
            let action = actor.select_action(&observation)?;
            assert_eq!(action.len(), 2);
            let hot: Vec<_> = (0..2).filter(|i| action.data[*i] == 1.).collect();
            assert_eq!(hot.len(), 1);
            assert_eq!(action.data.iter().sum::<f64>(), 1.);
            hits[hot[0]] += 1;
        }
        assert!(hits.iter().all(|h| *h > 0));
        Ok(())
    }

    #[test]
    fn reports_exhausted_budget() -> Result<()> {
        static GUARD: LifecycleGuard = LifecycleGuard::new();
        let dir = tempfile::tempdir()?;
        let mut logger = ScoringLogger::with_license(
            Corridor { length: 3, t: 0 },
            LoggerConfig::new(dir.path()).with_step_budget(9),
            GUARD.claim()?,
        )?;
        let description = logger.env_description();
        let mut actor = RandomActor::new(&description, 3);
        let outcome = run_episodes(&mut logger, &mut actor, u64::MAX)?;
        assert_eq!(
            outcome,
            RunOutcome::BudgetExhausted(BudgetExhausted { total_steps: 9 })
        );
        let text = std::fs::read_to_string(logger.scores_path())?;
        assert_eq!(text.lines().count(), 2);
        Ok(())
    }
}
