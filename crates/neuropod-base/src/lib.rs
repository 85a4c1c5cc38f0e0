pub mod dtype;
pub mod logging;
pub mod tensor;
pub mod value;

pub use dtype::{DType, UnknownDType};
pub use logging::{init_logger, LogSink, NeuropodLogger};
pub use tensor::{Tensor, TensorError};
pub use value::{TensorMap, TensorValue};

// Re-export log crate so downstream crates can use neuropod_base::log::*
pub use log;
