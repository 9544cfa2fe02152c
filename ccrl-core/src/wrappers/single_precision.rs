use crate::{
    buffer::{Buffer, DType},
    env::{Env, EnvironmentDescription, SnapShot},
};
use anyhow::Result;

/// Downcasts every numeric field the environment reports to single precision.
///
/// Actions travel the other way: they are cast to whatever precision the wrapped environment
/// declares for its action space.
pub struct SinglePrecision<E> {
    env: E,
    inner_action_dtype: Option<DType>,
}

impl<E: Env<Observation = Buffer>> SinglePrecision<E> {
    pub fn new(env: E) -> Self {
        let inner_action_dtype = env.env_description().action_space.dtype();
        Self {
            env,
            inner_action_dtype,
        }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }
}

impl<E: Env<Observation = Buffer>> Env for SinglePrecision<E> {
    type Observation = Buffer;

    fn reset(&mut self, seed: u64) -> Result<Buffer> {
        Ok(self.env.reset(seed)?.cast(DType::F32))
    }

    fn step(&mut self, action: Buffer) -> Result<SnapShot<Buffer>> {
        let action = match self.inner_action_dtype {
            Some(dtype) => action.cast(dtype),
            None => action,
        };
        let mut snapshot = self.env.step(action)?.map_state(|s| s.cast(DType::F32));
        snapshot.reward = DType::F32.round(snapshot.reward);
        Ok(snapshot)
    }

    fn env_description(&self) -> EnvironmentDescription {
        let inner = self.env.env_description();
        EnvironmentDescription {
            observation_space: inner.observation_space.with_dtype(DType::F32),
            action_space: inner.action_space.with_dtype(DType::F32),
            reward_dtype: DType::F32,
        }
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}
