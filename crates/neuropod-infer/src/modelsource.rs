use std::fmt;
use std::path::PathBuf;

/// Serialized graph handed to a [`crate::Backend`]
pub enum ModelSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

impl fmt::Debug for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSource::File(path) => f.debug_tuple("File").field(path).finish(),
            ModelSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
        }
    }
}
