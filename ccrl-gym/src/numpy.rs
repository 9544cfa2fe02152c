use ccrl_core::{Buffer, DType};
use pyo3::{Bound, PyAny, PyResult, Python, types::PyAnyMethods};

/// Copies any array-like (numpy array, scalar, list) into a [`Buffer`], keeping its shape and
/// recording its precision.
pub(crate) fn to_buffer(py: Python<'_>, value: &Bound<'_, PyAny>) -> PyResult<Buffer> {
    let np = py.import("numpy")?;
    let array = np.call_method1("asarray", (value,))?;
    let dtype: String = array.getattr("dtype")?.getattr("name")?.extract()?;
    let mut shape: Vec<usize> = array.getattr("shape")?.extract()?;
    let data: Vec<f64> = array
        .call_method1("astype", ("float64",))?
        .call_method0("ravel")?
        .call_method0("tolist")?
        .extract()?;
    if shape.is_empty() {
        shape.push(data.len());
    }
    Ok(Buffer::new(data, shape, DType::from_numpy_name(&dtype)))
}

pub(crate) fn shape_and_dtype(spec: &Bound<'_, PyAny>) -> PyResult<(Vec<usize>, DType)> {
    let shape: Vec<usize> = spec.getattr("shape")?.extract()?;
    let dtype: String = spec.getattr("dtype")?.getattr("name")?.extract()?;
    Ok((shape, DType::from_numpy_name(&dtype)))
}

/// Bounds of a spec that declares `low`/`high` (Gymnasium) or `minimum`/`maximum` (dm_control),
/// broadcast to the spec's shape.
pub(crate) fn bounds(
    py: Python<'_>,
    spec: &Bound<'_, PyAny>,
    low: &str,
    high: &str,
) -> PyResult<(Buffer, Buffer)> {
    let np = py.import("numpy")?;
    let shape = spec.getattr("shape")?;
    let dtype = spec.getattr("dtype")?;
    let broadcast = |name: &str| -> PyResult<Buffer> {
        let value = np.call_method1("broadcast_to", (spec.getattr(name)?, &shape))?;
        let value = value.call_method1("astype", (&dtype,))?;
        to_buffer(py, &value)
    };
    Ok((broadcast(low)?, broadcast(high)?))
}
