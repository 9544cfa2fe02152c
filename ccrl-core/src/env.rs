use crate::buffer::{Buffer, DType};
use anyhow::Result;
use derive_more::{Deref, DerefMut};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Space {
    Discrete(usize),
    Continuous {
        min: Option<Buffer>,
        max: Option<Buffer>,
        size: usize,
        dtype: DType,
    },
    /// Named sub-spaces, in the order the environment reports them.
    Dict(Vec<(String, Space)>),
}

impl Space {
    pub fn continuous_from_dims(dims: Vec<usize>, dtype: DType) -> Self {
        Self::Continuous {
            min: None,
            max: None,
            size: dims.iter().product(),
            dtype,
        }
    }

    pub fn bounded(min: Buffer, max: Buffer) -> Self {
        let size = min.len();
        let dtype = min.dtype;
        Self::Continuous {
            min: Some(min),
            max: Some(max),
            size,
            dtype,
        }
    }

    pub fn size(&self) -> usize {
        match &self {
            Self::Discrete(size) => *size,
            Self::Continuous { size, .. } => *size,
            Self::Dict(spaces) => spaces.iter().map(|(_, space)| space.size()).sum(),
        }
    }

    pub fn dtype(&self) -> Option<DType> {
        match &self {
            Self::Discrete(_) => None,
            Self::Continuous { dtype, .. } => Some(*dtype),
            Self::Dict(spaces) => spaces.iter().filter_map(|(_, space)| space.dtype()).max_by_key(
                |dtype| match dtype {
                    DType::F32 => 0,
                    DType::F64 => 1,
                },
            ),
        }
    }

    /// Returns the space with every continuous part re-tagged to `dtype`, bounds included.
    pub fn with_dtype(&self, dtype: DType) -> Self {
        match self {
            Self::Discrete(n) => Self::Discrete(*n),
            Self::Continuous { min, max, size, .. } => Self::Continuous {
                min: min.as_ref().map(|b| b.cast(dtype)),
                max: max.as_ref().map(|b| b.cast(dtype)),
                size: *size,
                dtype,
            },
            Self::Dict(spaces) => Self::Dict(
                spaces
                    .iter()
                    .map(|(name, space)| (name.clone(), space.with_dtype(dtype)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDescription {
    pub observation_space: Space,
    pub action_space: Space,
    pub reward_dtype: DType,
}

impl EnvironmentDescription {
    pub fn new(observation_space: Space, action_space: Space, reward_dtype: DType) -> Self {
        Self {
            observation_space,
            action_space,
            reward_dtype,
        }
    }

    pub fn action_size(&self) -> usize {
        self.action_space.size()
    }

    pub fn observation_size(&self) -> usize {
        self.observation_space.size()
    }
}

/// Multi-part observation as produced by the control suite, before concatenation.
#[derive(Debug, Clone, PartialEq, Default, Deref, DerefMut)]
pub struct ObservationDict(pub Vec<(String, Buffer)>);

impl ObservationDict {
    pub fn get(&self, name: &str) -> Option<&Buffer> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, b)| b)
    }
}

pub type Info = BTreeMap<String, f64>;

/// One environment transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapShot<O> {
    pub state: O,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl<O> SnapShot<O> {
    pub fn new(state: O, reward: f64, terminated: bool, truncated: bool) -> Self {
        Self {
            state,
            reward,
            terminated,
            truncated,
            info: Info::new(),
        }
    }

    /// Whether this transition ends the episode.
    pub fn is_last(&self) -> bool {
        self.terminated || self.truncated
    }

    pub fn map_state<P>(self, f: impl FnOnce(O) -> P) -> SnapShot<P> {
        SnapShot {
            state: f(self.state),
            reward: self.reward,
            terminated: self.terminated,
            truncated: self.truncated,
            info: self.info,
        }
    }

    pub fn try_map_state<P>(self, f: impl FnOnce(O) -> Result<P>) -> Result<SnapShot<P>> {
        Ok(SnapShot {
            state: f(self.state)?,
            reward: self.reward,
            terminated: self.terminated,
            truncated: self.truncated,
            info: self.info,
        })
    }
}

pub trait Env {
    type Observation: Clone;

    fn reset(&mut self, seed: u64) -> Result<Self::Observation>;
    fn step(&mut self, action: Buffer) -> Result<SnapShot<Self::Observation>>;
    fn env_description(&self) -> EnvironmentDescription;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<E: Env + ?Sized> Env for Box<E> {
    type Observation = E::Observation;

    fn reset(&mut self, seed: u64) -> Result<Self::Observation> {
        (**self).reset(seed)
    }

    fn step(&mut self, action: Buffer) -> Result<SnapShot<Self::Observation>> {
        (**self).step(action)
    }

    fn env_description(&self) -> EnvironmentDescription {
        (**self).env_description()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Type erased environment with flat observations, the shape every adapter after the
/// suite-specific one works with.
pub type DynEnv = Box<dyn Env<Observation = Buffer>>;
