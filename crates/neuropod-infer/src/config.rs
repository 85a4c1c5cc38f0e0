use crate::{NeuropodError, Result};
use neuropod_base::DType;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// One dimension of a declared tensor shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dim {
    /// Exact size
    Fixed(usize),
    /// Any size, but every dimension with the same symbol must agree
    /// within one call
    Symbol(String),
    /// `null` in the config
    Any,
}

/// Declaration of one named tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub name: String,
    pub dtype: DType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<Dim>>,
}

impl TensorSpec {
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape: None,
        }
    }

    pub fn with_shape(mut self, shape: Vec<Dim>) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// Framework-agnostic package description, `<package>/config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuropodConfig {
    pub name: String,
    pub platform: String,
    pub input_spec: Vec<TensorSpec>,
    pub output_spec: Vec<TensorSpec>,
}

impl NeuropodConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: NeuropodConfig = read_json(path)?;
        check_unique_names(path, "input_spec", &config.input_spec)?;
        check_unique_names(path, "output_spec", &config.output_spec)?;
        Ok(config)
    }
}

fn check_unique_names(path: &Path, field: &str, specs: &[TensorSpec]) -> Result<()> {
    let mut seen = HashSet::new();
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(NeuropodError::load(
                path,
                format!("duplicate tensor name '{}' in {field}", spec.name),
            ));
        }
    }
    Ok(())
}

/// Translation from package tensor names to engine tensor names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeNameMapping(HashMap<String, String>);

impl NodeNameMapping {
    pub fn resolve(&self, name: &str) -> Result<&str> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| NeuropodError::NameResolution {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NodeNameMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Engine sidecar, `<package>/0/config.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub node_name_mapping: NodeNameMapping,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        read_json(path)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|e| NeuropodError::load(path, e))?;
    serde_json::from_str(&text).map_err(|e| NeuropodError::load(path, e))
}
