use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    F32,
    F64,
}

impl DType {
    /// Maps a numpy dtype name onto the two precisions we track. Anything that is not explicitly
    /// single precision is stored as double precision.
    pub fn from_numpy_name(name: &str) -> Self {
        match name {
            "float32" | "float16" | "bfloat16" => DType::F32,
            _ => DType::F64,
        }
    }

    pub fn round(&self, value: f64) -> f64 {
        match self {
            DType::F32 => value as f32 as f64,
            DType::F64 => value,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "float32"),
            DType::F64 => write!(f, "float64"),
        }
    }
}

/// Flat numeric storage shared by observations, actions and space bounds.
///
/// Values are always held as `f64`; the dtype tag records the precision the environment reports.
/// A buffer tagged [`DType::F32`] only ever holds values that round-trip through `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub data: Vec<f64>,
    pub shape: Vec<usize>,
    pub dtype: DType,
}

impl Buffer {
    pub fn new(data: Vec<f64>, shape: Vec<usize>, dtype: DType) -> Self {
        let data = data.into_iter().map(|v| dtype.round(v)).collect();
        Self { data, shape, dtype }
    }

    pub fn from_vec(data: Vec<f64>, dtype: DType) -> Self {
        let shape = vec![data.len()];
        Self::new(data, shape, dtype)
    }

    pub fn full(value: f64, size: usize, dtype: DType) -> Self {
        Self::from_vec(vec![value; size], dtype)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn cast(&self, dtype: DType) -> Self {
        Self::new(self.data.clone(), self.shape.clone(), dtype)
    }

    /// Element-wise clamp. Bounds must have the same number of elements as `self`.
    pub fn clamp(&self, min: &Self, max: &Self) -> Self {
        let data = self
            .data
            .iter()
            .zip(min.data.iter().zip(max.data.iter()))
            .map(|(v, (lo, hi))| v.max(*lo).min(*hi))
            .collect();
        Self::new(data, self.shape.clone(), self.dtype)
    }

    /// Flattens and concatenates `parts` in order. The widest precision among the parts wins.
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Buffer>) -> Self {
        let mut data = vec![];
        let mut dtype = DType::F32;
        for part in parts {
            if part.dtype == DType::F64 {
                dtype = DType::F64;
            }
            data.extend_from_slice(&part.data);
        }
        Self::from_vec(data, dtype)
    }

    pub fn to_data(self) -> Vec<f64> {
        self.data
    }

    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.data.iter().map(|v| *v as f32).collect()
    }
}
