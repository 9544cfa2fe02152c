use crate::{
    buffer::{Buffer, DType},
    env::{Env, EnvironmentDescription, ObservationDict, SnapShot, Space},
    error::EnvError,
};
use anyhow::Result;

/// Flattens every named observation and concatenates them into a single vector.
///
/// Parts are concatenated in the order the observation space lists them, not the order in which
/// the environment happens to return them.
pub struct ConcatObservation<E> {
    env: E,
    names: Vec<String>,
}

impl<E: Env<Observation = ObservationDict>> ConcatObservation<E> {
    pub fn new(env: E) -> Self {
        let names = match env.env_description().observation_space {
            Space::Dict(spaces) => spaces.into_iter().map(|(name, _)| name).collect(),
            _ => vec![],
        };
        Self { env, names }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    fn concat(&self, observation: ObservationDict) -> Result<Buffer> {
        if self.names.is_empty() {
            return Ok(Buffer::concat(observation.iter().map(|(_, b)| b)));
        }
        let parts = self
            .names
            .iter()
            .map(|name| {
                observation.get(name).ok_or_else(|| EnvError::ObservationMismatch {
                    name: name.clone(),
                    reason: "missing from the returned observation".into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Buffer::concat(parts))
    }
}

impl<E: Env<Observation = ObservationDict>> Env for ConcatObservation<E> {
    type Observation = Buffer;

    fn reset(&mut self, seed: u64) -> Result<Buffer> {
        let observation = self.env.reset(seed)?;
        self.concat(observation)
    }

    fn step(&mut self, action: Buffer) -> Result<SnapShot<Buffer>> {
        let snapshot = self.env.step(action)?;
        snapshot.try_map_state(|observation| self.concat(observation))
    }

    fn env_description(&self) -> EnvironmentDescription {
        let inner = self.env.env_description();
        let observation_space = &inner.observation_space;
        let dtype = observation_space.dtype().unwrap_or(DType::F64);
        EnvironmentDescription {
            observation_space: Space::continuous_from_dims(vec![observation_space.size()], dtype),
            ..inner
        }
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}

#[cfg(test)]
mod test {
    use super::ConcatObservation;
    use crate::{
        buffer::{Buffer, DType},
        env::{Env, EnvironmentDescription, ObservationDict, SnapShot, Space},
        error::EnvError,
    };
    use anyhow::Result;

    struct WalkerLike {
        swap_order: bool,
        drop_velocity: bool,
    }

    impl WalkerLike {
        fn observation(&self) -> ObservationDict {
            let orientations = (
                "orientations".to_string(),
                Buffer::new(vec![1., 2., 3., 4.], vec![2, 2], DType::F64),
            );
            let height = ("height".to_string(), Buffer::from_vec(vec![5.], DType::F64));
            let velocity = ("velocity".to_string(), Buffer::from_vec(vec![6., 7.], DType::F64));
            let mut parts = vec![orientations, height, velocity];
            if self.swap_order {
                parts.reverse();
            }
            if self.drop_velocity {
                parts.retain(|(name, _)| name != "velocity");
            }
            ObservationDict(parts)
        }
    }

    impl Env for WalkerLike {
        type Observation = ObservationDict;

        fn reset(&mut self, _seed: u64) -> Result<ObservationDict> {
            Ok(self.observation())
        }

        fn step(&mut self, _action: Buffer) -> Result<SnapShot<ObservationDict>> {
            Ok(SnapShot::new(self.observation(), 1., false, false))
        }

        fn env_description(&self) -> EnvironmentDescription {
            EnvironmentDescription::new(
                Space::Dict(vec![
                    (
                        "orientations".into(),
                        Space::continuous_from_dims(vec![2, 2], DType::F64),
                    ),
                    ("height".into(), Space::continuous_from_dims(vec![], DType::F64)),
                    ("velocity".into(), Space::continuous_from_dims(vec![2], DType::F64)),
                ]),
                Space::bounded(
                    Buffer::full(-1., 2, DType::F64),
                    Buffer::full(1., 2, DType::F64),
                ),
                DType::F64,
            )
        }
    }

    #[test]
    fn concatenates_in_space_order() -> Result<()> {
        let mut env = ConcatObservation::new(WalkerLike {
            swap_order: true,
            drop_velocity: false,
        });
        let obs = env.reset(0)?;
        assert_eq!(obs.data, vec![1., 2., 3., 4., 5., 6., 7.]);
        assert_eq!(obs.shape, vec![7]);
        let snapshot = env.step(Buffer::full(0., 2, DType::F64))?;
        assert_eq!(snapshot.state.data, obs.data);
        Ok(())
    }

    #[test]
    fn description_is_flat() {
        let env = ConcatObservation::new(WalkerLike {
            swap_order: false,
            drop_velocity: false,
        });
        let description = env.env_description();
        assert_eq!(description.observation_size(), 7);
        assert!(matches!(
            description.observation_space,
            Space::Continuous { size: 7, .. }
        ));
    }

    #[test]
    fn missing_part_is_an_error() {
        let mut env = ConcatObservation::new(WalkerLike {
            swap_order: false,
            drop_velocity: true,
        });
        let err = env.reset(0).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EnvError>(),
            Some(EnvError::ObservationMismatch { name, .. }) if name == "velocity"
        ));
    }
}
