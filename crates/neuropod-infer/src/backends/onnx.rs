use crate::{Backend, ModelSource, NeuropodError, Result, Session};
use ndarray::{ArrayD, ArrayViewD};
use neuropod_base::{Tensor, TensorValue};
use ort::session::Session as OrtSession;
use ort::session::run_options::{OutputSelector, RunOptions};
use ort::tensor::{PrimitiveTensorElementType, TensorElementType};
use ort::value::{DynValue, Tensor as OrtTensor};
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::OnceLock;

static ORT_INIT: OnceLock<()> = OnceLock::new();

/// Commit the process-wide ORT environment. Sessions are per executor; the
/// environment is shared by all of them for the life of the process.
fn ensure_ort_init() {
    ORT_INIT.get_or_init(|| {
        match ort::init().with_name("neuropod").commit() {
            Ok(_) => log::debug!("[onnx] runtime environment initialized"),
            Err(e) => log::warn!("[onnx] failed to commit runtime environment: {e}"),
        }
    });
}

/// ONNX Runtime backend
#[derive(Debug, Clone, Default)]
pub struct OnnxBackend {
    intra_threads: Option<usize>,
}

impl OnnxBackend {
    pub fn new() -> Self {
        ensure_ort_init();
        Self::default()
    }

    /// Number of threads ORT uses inside one operator. Left to ORT when unset.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    pub fn intra_threads(&self) -> Option<usize> {
        self.intra_threads
    }
}

impl Backend for OnnxBackend {
    fn name(&self) -> &str {
        "onnx"
    }

    fn graph_extension(&self) -> &str {
        "onnx"
    }

    fn load_graph(&self, model: ModelSource) -> Result<Box<dyn Session>> {
        ensure_ort_init();
        let origin = match &model {
            ModelSource::File(path) => path.clone(),
            ModelSource::Memory(_) => PathBuf::from("<memory>"),
        };

        let mut builder = OrtSession::builder().map_err(|e| {
            NeuropodError::load(&origin, format!("failed to create session builder: {e}"))
        })?;
        if let Some(threads) = self.intra_threads {
            builder = builder.with_intra_threads(threads).map_err(|e| {
                NeuropodError::load(&origin, format!("failed to set intra-op threads: {e}"))
            })?;
        }

        let session = match model {
            ModelSource::File(path) => builder.commit_from_file(&path),
            ModelSource::Memory(bytes) => builder.commit_from_memory(&bytes),
        }
        .map_err(|e| NeuropodError::load(&origin, format!("failed to parse graph: {e}")))?;

        log::debug!("[onnx] session created for {}", origin.display());
        Ok(Box::new(OnnxSession { session }))
    }
}

pub struct OnnxSession {
    session: OrtSession,
}

impl Session for OnnxSession {
    fn run(
        &mut self,
        feeds: Vec<(String, TensorValue)>,
        fetches: &[String],
    ) -> Result<HashMap<String, TensorValue>> {
        let mut inputs: Vec<(String, DynValue)> = Vec::with_capacity(feeds.len());
        for (name, value) in feeds {
            let value = value_to_ort(&name, value)?;
            inputs.push((name, value));
        }

        if let Some(name) = fetches
            .iter()
            .find(|name| !self.session.outputs.iter().any(|o| &o.name == *name))
        {
            return Err(NeuropodError::Execution(format!(
                "graph has no output named '{name}'"
            )));
        }

        // only the fetched outputs are computed; ORT prunes nodes nothing requested
        let selector = fetches
            .iter()
            .fold(OutputSelector::no_default(), |selector, name| selector.with(name.as_str()));
        let options = RunOptions::new()
            .map_err(|e| NeuropodError::Execution(format!("failed to create run options: {e}")))?
            .with_outputs(selector);
        let outputs = self
            .session
            .run_with_options(inputs, &options)
            .map_err(|e| NeuropodError::Execution(format!("inference failed: {e}")))?;

        let mut result = HashMap::with_capacity(fetches.len());
        for name in fetches {
            let value = outputs.get(name.as_str()).ok_or_else(|| {
                NeuropodError::Execution(format!("graph has no output named '{name}'"))
            })?;
            result.insert(name.clone(), ort_to_value(name, value)?);
        }
        Ok(result)
    }
}

fn value_to_ort(name: &str, value: TensorValue) -> Result<DynValue> {
    match value {
        TensorValue::Float32(t) => primitive_to_ort(name, t),
        TensorValue::Float64(t) => primitive_to_ort(name, t),
        TensorValue::Int8(t) => primitive_to_ort(name, t),
        TensorValue::Int16(t) => primitive_to_ort(name, t),
        TensorValue::Int32(t) => primitive_to_ort(name, t),
        TensorValue::Int64(t) => primitive_to_ort(name, t),
        TensorValue::UInt8(t) => primitive_to_ort(name, t),
        TensorValue::UInt16(t) => primitive_to_ort(name, t),
        TensorValue::UInt32(t) => primitive_to_ort(name, t),
        TensorValue::UInt64(t) => primitive_to_ort(name, t),
        TensorValue::String(t) => {
            let array = tensor_to_ndarray(t)?;
            let tensor = OrtTensor::from_string_array(&array).map_err(|e| {
                NeuropodError::Execution(format!("failed to create string tensor '{name}': {e}"))
            })?;
            Ok(tensor.into_dyn())
        }
        // ORT has no untyped element kind; text goes in as string tensors
        bytes @ TensorValue::Bytes(_) => match bytes.into_strings() {
            Ok(strings) => value_to_ort(name, strings),
            Err((_, index)) => Err(NeuropodError::Execution(format!(
                "input '{name}' element {index} is not UTF-8"
            ))),
        },
    }
}

fn primitive_to_ort<T>(name: &str, tensor: Tensor<T>) -> Result<DynValue>
where
    T: PrimitiveTensorElementType + Debug + Clone + 'static,
{
    let array = tensor_to_ndarray(tensor)?;
    let tensor = OrtTensor::from_array(array).map_err(|e| {
        NeuropodError::Execution(format!("failed to create tensor '{name}': {e}"))
    })?;
    Ok(tensor.into_dyn())
}

fn ort_to_value(name: &str, value: &DynValue) -> Result<TensorValue> {
    let element_type = value
        .dtype()
        .tensor_type()
        .ok_or_else(|| NeuropodError::Execution(format!("output '{name}' is not a tensor")))?;

    Ok(match element_type {
        TensorElementType::Float32 => TensorValue::Float32(extract(name, value)?),
        TensorElementType::Float64 => TensorValue::Float64(extract(name, value)?),
        TensorElementType::Int8 => TensorValue::Int8(extract(name, value)?),
        TensorElementType::Int16 => TensorValue::Int16(extract(name, value)?),
        TensorElementType::Int32 => TensorValue::Int32(extract(name, value)?),
        TensorElementType::Int64 => TensorValue::Int64(extract(name, value)?),
        TensorElementType::Uint8 => TensorValue::UInt8(extract(name, value)?),
        TensorElementType::Uint16 => TensorValue::UInt16(extract(name, value)?),
        TensorElementType::Uint32 => TensorValue::UInt32(extract(name, value)?),
        TensorElementType::Uint64 => TensorValue::UInt64(extract(name, value)?),
        TensorElementType::String => {
            let array = value.try_extract_string_array().map_err(|e| {
                NeuropodError::Execution(format!("failed to read string output '{name}': {e}"))
            })?;
            TensorValue::String(ndarray_to_tensor(array.view())?)
        }
        other => {
            return Err(NeuropodError::Execution(format!(
                "output '{name}' has unsupported element type {other:?}"
            )));
        }
    })
}

fn extract<T>(name: &str, value: &DynValue) -> Result<Tensor<T>>
where
    T: PrimitiveTensorElementType + Clone + 'static,
{
    let array = value.try_extract_array::<T>().map_err(|e| {
        NeuropodError::Execution(format!("failed to read output '{name}': {e}"))
    })?;
    ndarray_to_tensor(array)
}

/// Convert a neuropod tensor into an owned ndarray
pub fn tensor_to_ndarray<T>(tensor: Tensor<T>) -> Result<ArrayD<T>> {
    ArrayD::from_shape_vec(tensor.shape, tensor.data).map_err(|e| {
        NeuropodError::Execution(format!("failed to create ndarray from tensor: {e}"))
    })
}

/// Copy an ndarray view into a row-major neuropod tensor
pub fn ndarray_to_tensor<T: Clone>(array: ArrayViewD<'_, T>) -> Result<Tensor<T>> {
    let shape = array.shape().to_vec();
    let data = array.iter().cloned().collect();
    Ok(Tensor::new(shape, data)?)
}
