use crate::{
    buffer::Buffer,
    env::{Env, EnvironmentDescription, SnapShot, Space},
    error::EnvError,
};
use anyhow::Result;

/// Presents a bounded continuous action space as `[-1, 1]` in every dimension.
///
/// Incoming actions are (optionally) clipped to `[-1, 1]` and then linearly rescaled to the
/// native bounds. A dimension whose native bound is not finite has nothing to rescale to, so the
/// clipped value is passed through. Discrete and unbounded action spaces are left alone.
pub struct CanonicalSpec<E> {
    env: E,
    clip: bool,
    bounds: Option<(Buffer, Buffer)>,
}

impl<E: Env> CanonicalSpec<E> {
    pub fn new(env: E, clip: bool) -> Self {
        let bounds = match env.env_description().action_space {
            Space::Continuous {
                min: Some(min),
                max: Some(max),
                ..
            } => Some((min, max)),
            _ => None,
        };
        Self { env, clip, bounds }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    fn scale_action(&self, action: Buffer) -> Result<Buffer> {
        let Some((min, max)) = &self.bounds else {
            return Ok(action);
        };
        if action.len() != min.len() {
            return Err(EnvError::ActionSizeMismatch {
                expected: min.len(),
                got: action.len(),
            }
            .into());
        }
        let data = action
            .data
            .iter()
            .zip(min.data.iter().zip(max.data.iter()))
            .map(|(a, (lo, hi))| {
                let a = if self.clip { a.clamp(-1., 1.) } else { *a };
                if lo.is_finite() && hi.is_finite() {
                    lo + (a + 1.) * (hi - lo) / 2.
                } else {
                    a
                }
            })
            .collect();
        Ok(Buffer::new(data, min.shape.clone(), min.dtype))
    }
}

impl<E: Env> Env for CanonicalSpec<E> {
    type Observation = E::Observation;

    fn reset(&mut self, seed: u64) -> Result<Self::Observation> {
        self.env.reset(seed)
    }

    fn step(&mut self, action: Buffer) -> Result<SnapShot<Self::Observation>> {
        let action = self.scale_action(action)?;
        self.env.step(action)
    }

    fn env_description(&self) -> EnvironmentDescription {
        let inner = self.env.env_description();
        match &self.bounds {
            Some((min, _)) => {
                let lo = Buffer::new(vec![-1.; min.len()], min.shape.clone(), min.dtype);
                let hi = Buffer::new(vec![1.; min.len()], min.shape.clone(), min.dtype);
                EnvironmentDescription {
                    action_space: Space::bounded(lo, hi),
                    ..inner
                }
            }
            None => inner,
        }
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }
}

#[cfg(test)]
mod test {
    use super::CanonicalSpec;
    use crate::{
        buffer::{Buffer, DType},
        env::{Env, EnvironmentDescription, SnapShot, Space},
        error::EnvError,
    };
    use anyhow::Result;

    /// Echoes the received action back as the observation.
    struct Echo {
        min: Vec<f64>,
        max: Vec<f64>,
    }

    impl Env for Echo {
        type Observation = Buffer;

        fn reset(&mut self, _seed: u64) -> Result<Buffer> {
            Ok(Buffer::full(0., self.min.len(), DType::F64))
        }

        fn step(&mut self, action: Buffer) -> Result<SnapShot<Buffer>> {
            Ok(SnapShot::new(action, 0., false, false))
        }

        fn env_description(&self) -> EnvironmentDescription {
            EnvironmentDescription::new(
                Space::continuous_from_dims(vec![self.min.len()], DType::F64),
                Space::bounded(
                    Buffer::from_vec(self.min.clone(), DType::F64),
                    Buffer::from_vec(self.max.clone(), DType::F64),
                ),
                DType::F64,
            )
        }
    }

    fn echo() -> Echo {
        Echo {
            min: vec![0., -2., f64::NEG_INFINITY],
            max: vec![10., 2., f64::INFINITY],
        }
    }

    #[test]
    fn reports_unit_bounds() {
        let env = CanonicalSpec::new(echo(), true);
        let Space::Continuous {
            min: Some(min),
            max: Some(max),
            size,
            ..
        } = env.env_description().action_space
        else {
            panic!("expected a bounded action space");
        };
        assert_eq!(size, 3);
        assert!(min.data.iter().all(|v| *v == -1.));
        assert!(max.data.iter().all(|v| *v == 1.));
    }

    #[test]
    fn rescales_and_clips() -> Result<()> {
        let mut env = CanonicalSpec::new(echo(), true);
        let out = env.step(Buffer::from_vec(vec![0., 5., -0.25], DType::F64))?;
        assert_eq!(out.state.data, vec![5., 2., -0.25]);
        let out = env.step(Buffer::from_vec(vec![-1., -7., 3.], DType::F64))?;
        assert_eq!(out.state.data, vec![0., -2., 1.]);
        Ok(())
    }

    #[test]
    fn without_clip_out_of_range_actions_extrapolate() -> Result<()> {
        let mut env = CanonicalSpec::new(echo(), false);
        let out = env.step(Buffer::from_vec(vec![2., 0., 0.], DType::F64))?;
        assert_eq!(out.state.data[0], 15.);
        Ok(())
    }

    #[test]
    fn wrong_action_size_is_rejected() {
        let mut env = CanonicalSpec::new(echo(), true);
        let err = env
            .step(Buffer::from_vec(vec![0.], DType::F64))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EnvError>(),
            Some(&EnvError::ActionSizeMismatch {
                expected: 3,
                got: 1
            })
        );
    }
}
