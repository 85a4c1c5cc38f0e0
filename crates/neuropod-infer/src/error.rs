use neuropod_base::TensorError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum NeuropodError {
    /// The package could not be loaded; no executor exists
    Load { path: PathBuf, reason: String },
    /// A declared tensor name has no entry in `node_name_mapping`
    NameResolution { name: String },
    /// The engine failed while running the graph
    Execution(String),
    /// Tensors did not match the package's input or output spec
    InvalidInput(String),
    Tensor(TensorError),
}

impl NeuropodError {
    pub fn load(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        NeuropodError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_load(&self) -> bool {
        matches!(self, NeuropodError::Load { .. })
    }

    pub fn is_name_resolution(&self) -> bool {
        matches!(self, NeuropodError::NameResolution { .. })
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, NeuropodError::Execution(_))
    }
}

impl fmt::Display for NeuropodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeuropodError::Load { path, reason } => {
                write!(f, "failed to load {}: {reason}", path.display())
            }
            NeuropodError::NameResolution { name } => {
                write!(f, "tensor '{name}' is not in node_name_mapping")
            }
            NeuropodError::Execution(msg) => write!(f, "execution error: {msg}"),
            NeuropodError::InvalidInput(msg) => write!(f, "invalid tensors: {msg}"),
            NeuropodError::Tensor(err) => write!(f, "tensor error: {err}"),
        }
    }
}

impl std::error::Error for NeuropodError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NeuropodError::Tensor(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TensorError> for NeuropodError {
    fn from(err: TensorError) -> Self {
        NeuropodError::Tensor(err)
    }
}

pub type Result<T> = std::result::Result<T, NeuropodError>;
