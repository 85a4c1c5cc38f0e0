use std::path::{Path, PathBuf};

/// Fixed on-disk layout of a neuropod package
///
/// ```text
/// <root>/config.json               neuropod config (name, platform, specs)
/// <root>/0/config.json             engine config (node_name_mapping)
/// <root>/0/data/model.<ext>        serialized graph
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PackageLayout {
    root: PathBuf,
}

impl PackageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn neuropod_config(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn model_dir(&self) -> PathBuf {
        self.root.join("0")
    }

    pub fn engine_config(&self) -> PathBuf {
        self.model_dir().join("config.json")
    }

    pub fn graph_file(&self, extension: &str) -> PathBuf {
        self.model_dir().join("data").join(format!("model.{extension}"))
    }
}
