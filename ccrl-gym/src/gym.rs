use crate::numpy::{bounds, shape_and_dtype, to_buffer};
use anyhow::{Result, anyhow};
use ccrl_core::{Buffer, DType, Env, EnvironmentDescription, SnapShot, Space};
use pyo3::{
    PyObject, PyResult, Python,
    types::{PyAnyMethods, PyDict},
};

pub struct GymEnv {
    env: PyObject,
    description: EnvironmentDescription,
}

impl GymEnv {
    pub fn new(name: &str) -> Result<GymEnv> {
        tracing::debug!(name, "gymnasium.make");
        let env = Python::with_gil(|py| {
            let gym = py.import("gymnasium")?;
            let kwargs = PyDict::new(py);
            let make = gym.getattr("make")?;
            let env = make.call((name,), Some(&kwargs))?;
            let gym_spaces = py.import("gymnasium.spaces")?;
            let action_space = env.getattr("action_space")?;
            let action_space = if action_space.is_instance(&gym_spaces.getattr("Discrete")?)? {
                Space::Discrete(action_space.getattr("n")?.extract()?)
            } else if action_space.is_instance(&gym_spaces.getattr("Box")?)? {
                let (min, max) = bounds(py, &action_space, "low", "high")?;
                Space::bounded(min, max)
            } else {
                let repr: String = action_space.repr()?.extract()?;
                return Err(anyhow!("unsupported gym action space: {repr}"));
            };
            let observation_space = env.getattr("observation_space")?;
            let (dims, dtype) = shape_and_dtype(&observation_space)?;
            let observation_space = Space::continuous_from_dims(dims, dtype);
            Ok(GymEnv {
                env: env.into(),
                description: EnvironmentDescription::new(
                    observation_space,
                    action_space,
                    DType::F64,
                ),
            })
        })?;
        Ok(env)
    }
}

/// Index of the hot entry of a one-hot action.
fn one_hot_index(action: &Buffer) -> Result<usize> {
    action
        .data
        .iter()
        .position(|v| *v > 0.)
        .ok_or_else(|| anyhow!("discrete action {:?} has no hot entry", action.data))
}

impl Env for GymEnv {
    type Observation = Buffer;

    fn reset(&mut self, seed: u64) -> Result<Buffer> {
        let state = Python::with_gil(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("seed", seed)?;
            let state = self.env.call_method(py, "reset", (), Some(&kwargs))?;
            let state = state.bind(py);
            to_buffer(py, &state.get_item(0)?)
        })?;
        Ok(state)
    }

    fn step(&mut self, action: Buffer) -> Result<SnapShot<Buffer>> {
        let snapshot = Python::with_gil(|py| {
            let step = match &self.description.action_space {
                Space::Discrete(_) => {
                    let action = one_hot_index(&action)?;
                    self.env.call_method(py, "step", (action,), None)?
                }
                _ => {
                    let np = py.import("numpy")?;
                    let action = np.call_method1("asarray", (action.to_data(),))?;
                    self.env.call_method(py, "step", (action,), None)?
                }
            };
            let step = step.bind(py);
            let next_state = to_buffer(py, &step.get_item(0)?)?;
            let reward: f64 = step.get_item(1)?.extract()?;
            let terminated: bool = step.get_item(2)?.extract()?;
            let truncated: bool = step.get_item(3)?.extract()?;
            anyhow::Ok(SnapShot::new(next_state, reward, terminated, truncated))
        })?;
        Ok(snapshot)
    }

    fn env_description(&self) -> EnvironmentDescription {
        self.description.clone()
    }

    fn close(&mut self) -> Result<()> {
        Python::with_gil(|py| {
            self.env.call_method0(py, "close")?;
            PyResult::Ok(())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::one_hot_index;
    use ccrl_core::{Buffer, DType};

    #[test]
    fn one_hot_actions_map_to_indices() {
        let action = Buffer::from_vec(vec![0., 0., 1., 0.], DType::F32);
        assert_eq!(one_hot_index(&action).unwrap(), 2);
        assert!(one_hot_index(&Buffer::full(0., 3, DType::F32)).is_err());
    }
}
