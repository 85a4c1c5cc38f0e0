use crate::config::{EngineConfig, NeuropodConfig, NodeNameMapping, TensorSpec};
use crate::spec::validate_tensors_against_specs;
use crate::{Backend, ModelSource, NeuropodError, PackageLayout, Result, Session};
use neuropod_base::{TensorMap, TensorValue};
use std::path::Path;

/// A loaded neuropod that can run inference
pub trait Executor {
    /// The package's declared name, platform and tensor specs
    fn neuropod_config(&self) -> &NeuropodConfig;

    /// Run the model on inputs the caller already validated
    fn forward(&mut self, inputs: TensorMap) -> Result<TensorMap>;

    /// Validate `inputs` against the input spec, run the model, and
    /// validate the outputs against the output spec.
    fn infer(&mut self, inputs: TensorMap) -> Result<TensorMap> {
        validate_tensors_against_specs(&inputs, &self.neuropod_config().input_spec)?;
        let outputs = self.forward(inputs)?;
        validate_tensors_against_specs(&outputs, &self.neuropod_config().output_spec)?;
        Ok(outputs)
    }
}

/// Executes a serialized graph, translating package tensor names to engine
/// tensor names through the package's `node_name_mapping`.
///
/// The graph session is owned by this executor and released when it is
/// dropped. `forward` takes `&mut self`; callers that share one executor
/// across threads serialize access themselves.
pub struct GraphExecutor {
    config: NeuropodConfig,
    node_name_mapping: NodeNameMapping,
    session: Box<dyn Session>,
}

impl GraphExecutor {
    /// Load a package with the default ONNX Runtime backend
    #[cfg(feature = "onnx")]
    pub fn load(neuropod_path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_backend(neuropod_path, &crate::backends::OnnxBackend::new())
    }

    /// Load a package, deserializing its graph with `backend`
    ///
    /// # Errors
    /// [`NeuropodError::Load`] if either config file is missing or malformed,
    /// `node_name_mapping` is absent, or the graph file is missing or cannot
    /// be parsed by the backend.
    pub fn load_with_backend(neuropod_path: impl AsRef<Path>, backend: &dyn Backend) -> Result<Self> {
        let layout = PackageLayout::new(neuropod_path.as_ref());
        let config = NeuropodConfig::load(&layout.neuropod_config())?;
        let engine_config = EngineConfig::load(&layout.engine_config())?;

        let graph_path = layout.graph_file(backend.graph_extension());
        if !graph_path.is_file() {
            return Err(NeuropodError::load(&graph_path, "graph file not found"));
        }
        let session = backend.load_graph(ModelSource::File(graph_path))?;

        for spec in config.input_spec.iter().chain(&config.output_spec) {
            if !engine_config.node_name_mapping.contains(&spec.name) {
                log::warn!(
                    "[{}] '{}' has no node_name_mapping entry; forward will fail",
                    config.name,
                    spec.name
                );
            }
        }
        log::debug!(
            "[{}] loaded {} graph from {} ({} mapped tensors)",
            config.name,
            backend.name(),
            layout.root().display(),
            engine_config.node_name_mapping.len()
        );

        Ok(Self::from_parts(config, engine_config.node_name_mapping, session))
    }

    /// Assemble an executor from an already loaded session
    pub fn from_parts(
        config: NeuropodConfig,
        node_name_mapping: NodeNameMapping,
        session: Box<dyn Session>,
    ) -> Self {
        Self {
            config,
            node_name_mapping,
            session,
        }
    }

    pub fn node_name_mapping(&self) -> &NodeNameMapping {
        &self.node_name_mapping
    }
}

fn resolve_all<'a>(
    mapping: &'a NodeNameMapping,
    specs: &'a [TensorSpec],
) -> Result<Vec<(&'a TensorSpec, &'a str)>> {
    specs
        .iter()
        .map(|spec| Ok((spec, mapping.resolve(&spec.name)?)))
        .collect()
}

impl Executor for GraphExecutor {
    fn neuropod_config(&self) -> &NeuropodConfig {
        &self.config
    }

    fn forward(&mut self, mut inputs: TensorMap) -> Result<TensorMap> {
        let outputs = resolve_all(&self.node_name_mapping, &self.config.output_spec)?;
        let feeds_spec = resolve_all(&self.node_name_mapping, &self.config.input_spec)?;

        let mut fetches: Vec<String> = Vec::with_capacity(outputs.len());
        for (_, engine_name) in &outputs {
            if !fetches.iter().any(|f| f == engine_name) {
                fetches.push(engine_name.to_string());
            }
        }

        let mut feeds = Vec::with_capacity(feeds_spec.len());
        for (spec, engine_name) in &feeds_spec {
            let value = inputs.remove(&spec.name).ok_or_else(|| {
                NeuropodError::Execution(format!("no value supplied for input '{}'", spec.name))
            })?;
            feeds.push((engine_name.to_string(), value));
        }

        log::trace!(
            "[{}] running graph: feeds {:?}, fetches {:?}",
            self.config.name,
            feeds.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            fetches
        );
        let mut produced = self.session.run(feeds, &fetches)?;

        let mut result = TensorMap::with_capacity(outputs.len());
        for (spec, engine_name) in &outputs {
            let shared = outputs.iter().filter(|(_, e)| e == engine_name).count() > 1;
            let value = if shared {
                produced.get(*engine_name).cloned()
            } else {
                produced.remove(*engine_name)
            };
            let value = value.ok_or_else(|| {
                NeuropodError::Execution(format!(
                    "engine did not produce '{engine_name}' for output '{}'",
                    spec.name
                ))
            })?;

            let value = if spec.dtype.is_string() {
                normalize_string_output(&self.config.name, &spec.name, value)
            } else {
                value
            };
            result.insert(spec.name.clone(), value);
        }

        Ok(result)
    }
}

/// Give a string-declared output the string element type
///
/// Engines may hand text back as an untyped byte container. Such a value is
/// decoded as a whole, whatever its rank; if any element is not UTF-8 the
/// value is left untouched. Typed values pass through unchanged.
fn normalize_string_output(model: &str, name: &str, value: TensorValue) -> TensorValue {
    match value.into_strings() {
        Ok(value) => value,
        Err((value, index)) => {
            log::warn!(
                "[{model}] output '{name}' is declared string but element {index} is not UTF-8; \
                 leaving it as bytes"
            );
            value
        }
    }
}
