//! Graph executor for neuropod packages.
//!
//! A package directory carries a serialized graph, a `node_name_mapping`
//! from package tensor names to engine tensor names, and a framework-agnostic
//! input/output spec. [`GraphExecutor`] loads the graph once and runs it for
//! each request, speaking package names on the outside and engine names to
//! the [`Backend`].

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod executor;
pub mod modelsource;
pub mod package;
pub mod session;
pub mod spec;

pub use backend::Backend;
pub use config::{Dim, EngineConfig, NeuropodConfig, NodeNameMapping, TensorSpec};
pub use error::{NeuropodError, Result};
pub use executor::{Executor, GraphExecutor};
pub use modelsource::ModelSource;
pub use package::PackageLayout;
pub use session::Session;
pub use spec::validate_tensors_against_specs;

#[cfg(feature = "onnx")]
pub use backends::OnnxBackend;

pub use neuropod_base::{DType, Tensor, TensorMap, TensorValue};
