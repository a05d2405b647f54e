//! Python Bindings
//!
//! Exposes the reactive engine to Python as the `_core` extension module:
//!
//! ```python
//! from ripple._core import Signal, Memo, effect, batch
//!
//! s = Signal(1)
//! log = []
//! effect(lambda: log.append(s.get()))
//! with batch():
//!     s.set(3)
//!     s.set(4)
//! assert log == [1, 4]
//! ```
//!
//! Every object is bound to the interpreter thread that created it
//! (`unsendable`). Exceptions raised by Python callbacks travel through the
//! engine as [`ReactiveError::Callback`] and are re-raised unchanged.

use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::error::ReactiveError;
use crate::reactive::{self, Batch, Memo, Signal};

/// A Python object stored in a signal.
struct PyValue(PyObject);

impl Clone for PyValue {
    fn clone(&self) -> Self {
        Python::with_gil(|py| Self(self.0.clone_ref(py)))
    }
}

fn to_reactive(err: PyErr) -> ReactiveError {
    ReactiveError::callback(err)
}

fn to_py(err: ReactiveError) -> PyErr {
    match err {
        ReactiveError::Callback(inner) => match inner.downcast::<PyErr>() {
            Ok(py_err) => *py_err,
            Err(other) => PyRuntimeError::new_err(other.to_string()),
        },
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

/// Python-exposed Signal type.
#[pyclass(unsendable, name = "Signal")]
struct PySignal {
    inner: Signal<PyValue>,
}

#[pymethods]
impl PySignal {
    #[new]
    fn new(initial: PyObject) -> Self {
        Self {
            inner: Signal::new(PyValue(initial)),
        }
    }

    fn get(&self) -> PyObject {
        self.inner.get().0
    }

    #[pyo3(name = "use")]
    fn track(&self) {
        self.inner.track();
    }

    fn leak(&self) -> PyObject {
        self.inner.leak().0
    }

    fn set(&self, value: PyObject) -> PyResult<()> {
        self.inner.set(PyValue(value)).map_err(to_py)
    }

    fn notify(&self) -> PyResult<()> {
        self.inner.notify().map_err(to_py)
    }

    #[getter]
    fn id(&self) -> u64 {
        self.inner.id().raw()
    }

    fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }

    fn __repr__(&self, py: Python<'_>) -> String {
        let value = self.inner.leak();
        let repr = value
            .0
            .bind(py)
            .repr()
            .map(|r| r.to_string())
            .unwrap_or_else(|_| "?".to_string());
        format!(
            "Signal(id={}, value={}, subscribers={})",
            self.inner.id().raw(),
            repr,
            self.inner.subscriber_count()
        )
    }
}

/// Python-exposed Memo type.
#[pyclass(unsendable, name = "Memo")]
struct PyMemo {
    inner: Memo<PyValue>,
}

#[pymethods]
impl PyMemo {
    #[new]
    fn new(func: PyObject) -> PyResult<Self> {
        let inner = Memo::try_new(move || {
            Python::with_gil(|py| func.call0(py).map(PyValue).map_err(to_reactive))
        })
        .map_err(to_py)?;
        Ok(Self { inner })
    }

    fn get(&self) -> PyObject {
        self.inner.get().0
    }
}

/// Context manager returned by `batch()`.
#[pyclass(unsendable, name = "Batch")]
struct PyBatch {
    open: Option<Batch>,
}

#[pymethods]
impl PyBatch {
    fn __enter__(&mut self) {
        self.open = Some(reactive::batch());
    }

    fn __exit__(
        &mut self,
        _exc_type: PyObject,
        _exc_value: PyObject,
        _traceback: PyObject,
    ) -> PyResult<bool> {
        if let Some(batch) = self.open.take() {
            batch.finish().map_err(to_py)?;
        }
        // Never suppress the body's exception.
        Ok(false)
    }
}

/// Run `func(*args)` now and again whenever a signal it read changes.
#[pyfunction]
#[pyo3(name = "effect", signature = (func, *args))]
fn py_effect(func: PyObject, args: &Bound<'_, PyTuple>) -> PyResult<()> {
    let args = args.clone().unbind();
    reactive::effect_with((func, args), |(func, args): &(PyObject, Py<PyTuple>)| {
        Python::with_gil(|py| {
            func.bind(py)
                .call1(args.bind(py).clone())
                .map(drop)
                .map_err(to_reactive)
        })
    })
    .map_err(to_py)
}

/// Create a batch context manager.
#[pyfunction]
#[pyo3(name = "batch")]
fn py_batch() -> PyBatch {
    PyBatch { open: None }
}

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PySignal>()?;
    m.add_class::<PyMemo>()?;
    m.add_class::<PyBatch>()?;
    m.add_function(wrap_pyfunction!(py_effect, m)?)?;
    m.add_function(wrap_pyfunction!(py_batch, m)?)?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
