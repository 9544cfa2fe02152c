use crate::numpy::{bounds, shape_and_dtype, to_buffer};
use anyhow::Result;
use ccrl_core::{Buffer, DType, Env, EnvironmentDescription, ObservationDict, SnapShot, Space};
use pyo3::{Bound, PyAny, PyObject, PyResult, Python, types::PyAnyMethods};

/// A dm_control suite task. Observations keep the named parts the task reports.
pub struct ControlEnv {
    env: PyObject,
    description: EnvironmentDescription,
}

impl ControlEnv {
    pub fn new(domain: &str, task: &str) -> Result<ControlEnv> {
        tracing::debug!(domain, task, "dm_control.suite.load");
        let env = Python::with_gil(|py| {
            let suite = py.import("dm_control.suite")?;
            let env = suite.call_method1("load", (domain, task))?;

            let action_spec = env.call_method0("action_spec")?;
            let (min, max) = bounds(py, &action_spec, "minimum", "maximum")?;
            let action_space = Space::bounded(min, max);

            let observation_spec = env.call_method0("observation_spec")?;
            let mut parts = vec![];
            for item in observation_spec.call_method0("items")?.try_iter()? {
                let (name, spec): (String, Bound<'_, PyAny>) = item?.extract()?;
                let (dims, dtype) = shape_and_dtype(&spec)?;
                parts.push((name, Space::continuous_from_dims(dims, dtype)));
            }

            PyResult::Ok(ControlEnv {
                env: env.into(),
                description: EnvironmentDescription::new(
                    Space::Dict(parts),
                    action_space,
                    DType::F64,
                ),
            })
        })?;
        Ok(env)
    }

    fn observation(
        &self,
        py: Python<'_>,
        time_step: &Bound<'_, PyAny>,
    ) -> PyResult<ObservationDict> {
        let observation = time_step.getattr("observation")?;
        let mut parts = vec![];
        if let Space::Dict(spaces) = &self.description.observation_space {
            for (name, _) in spaces {
                parts.push((name.clone(), to_buffer(py, &observation.get_item(name)?)?));
            }
        }
        Ok(ObservationDict(parts))
    }
}

impl Env for ControlEnv {
    type Observation = ObservationDict;

    fn reset(&mut self, seed: u64) -> Result<ObservationDict> {
        let observation = Python::with_gil(|py| {
            // numpy RandomState seeds are 32 bit
            let random = self.env.bind(py).getattr("task")?.getattr("random")?;
            random.call_method1("seed", (seed % (1 << 32),))?;
            let time_step = self.env.call_method0(py, "reset")?;
            self.observation(py, time_step.bind(py))
        })?;
        Ok(observation)
    }

    fn step(&mut self, action: Buffer) -> Result<SnapShot<ObservationDict>> {
        let snapshot = Python::with_gil(|py| {
            let np = py.import("numpy")?;
            let action = np.call_method1("asarray", (action.to_data(),))?;
            let time_step = self.env.call_method1(py, "step", (action,))?;
            let time_step = time_step.bind(py);
            let state = self.observation(py, time_step)?;
            let reward: Option<f64> = time_step.getattr("reward")?.extract()?;
            let last: bool = time_step.call_method0("last")?.extract()?;
            let discount: Option<f64> = time_step.getattr("discount")?.extract()?;
            // a zero discount on the last step is a true termination, anything else a time limit
            let terminated = last && discount == Some(0.);
            PyResult::Ok(SnapShot::new(
                state,
                reward.unwrap_or(0.),
                terminated,
                last && !terminated,
            ))
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
