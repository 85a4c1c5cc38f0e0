use crate::{DType, Tensor};
use std::collections::HashMap;

/// Named tensors crossing the executor boundary
pub type TensorMap = HashMap<String, TensorValue>;

/// A tensor tagged with its element kind
///
/// The variant is chosen once, where the value enters the process (caller
/// input or engine output), so nothing downstream has to probe element
/// types at runtime. `Bytes` is the untyped container: elements are raw
/// byte strings the producer could not or did not decode.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    Float32(Tensor<f32>),
    Float64(Tensor<f64>),
    Int8(Tensor<i8>),
    Int16(Tensor<i16>),
    Int32(Tensor<i32>),
    Int64(Tensor<i64>),
    UInt8(Tensor<u8>),
    UInt16(Tensor<u16>),
    UInt32(Tensor<u32>),
    UInt64(Tensor<u64>),
    String(Tensor<String>),
    Bytes(Tensor<Vec<u8>>),
}

/// Dispatch `$body` over every variant with `$t` bound to the inner tensor
macro_rules! each_variant {
    ($value:expr, $t:ident => $body:expr) => {
        match $value {
            TensorValue::Float32($t) => $body,
            TensorValue::Float64($t) => $body,
            TensorValue::Int8($t) => $body,
            TensorValue::Int16($t) => $body,
            TensorValue::Int32($t) => $body,
            TensorValue::Int64($t) => $body,
            TensorValue::UInt8($t) => $body,
            TensorValue::UInt16($t) => $body,
            TensorValue::UInt32($t) => $body,
            TensorValue::UInt64($t) => $body,
            TensorValue::String($t) => $body,
            TensorValue::Bytes($t) => $body,
        }
    };
}

impl TensorValue {
    /// Declared element type, `None` for untyped byte containers
    pub fn dtype(&self) -> Option<DType> {
        match self {
            TensorValue::Float32(_) => Some(DType::Float32),
            TensorValue::Float64(_) => Some(DType::Float64),
            TensorValue::Int8(_) => Some(DType::Int8),
            TensorValue::Int16(_) => Some(DType::Int16),
            TensorValue::Int32(_) => Some(DType::Int32),
            TensorValue::Int64(_) => Some(DType::Int64),
            TensorValue::UInt8(_) => Some(DType::UInt8),
            TensorValue::UInt16(_) => Some(DType::UInt16),
            TensorValue::UInt32(_) => Some(DType::UInt32),
            TensorValue::UInt64(_) => Some(DType::UInt64),
            TensorValue::String(_) => Some(DType::String),
            TensorValue::Bytes(_) => None,
        }
    }

    /// Element kind name for messages; untyped containers report "bytes"
    pub fn kind_name(&self) -> &'static str {
        self.dtype().map_or("bytes", |dtype| dtype.as_str())
    }

    pub fn shape(&self) -> &[usize] {
        each_variant!(self, t => &t.shape)
    }

    pub fn len(&self) -> usize {
        each_variant!(self, t => t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32(&self) -> Option<&Tensor<f32>> {
        match self {
            TensorValue::Float32(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&Tensor<String>> {
        match self {
            TensorValue::String(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Tensor<Vec<u8>>> {
        match self {
            TensorValue::Bytes(t) => Some(t),
            _ => None,
        }
    }

    /// Decode an untyped byte container into a string tensor
    ///
    /// Every element must be valid UTF-8; otherwise the value is handed back
    /// unchanged together with the index of the first bad element. Values
    /// that are not `Bytes` are returned as-is.
    pub fn into_strings(self) -> Result<TensorValue, (TensorValue, usize)> {
        match self {
            TensorValue::Bytes(bytes) => {
                match bytes.try_map(|b| std::str::from_utf8(b).map(str::to_owned)) {
                    Ok(strings) => Ok(TensorValue::String(strings)),
                    Err((index, _)) => Err((TensorValue::Bytes(bytes), index)),
                }
            }
            other => Ok(other),
        }
    }
}

macro_rules! impl_from_tensor {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Tensor<$t>> for TensorValue {
                fn from(tensor: Tensor<$t>) -> Self {
                    TensorValue::$variant(tensor)
                }
            }
        )*
    };
}

impl_from_tensor!(
    f32 => Float32,
    f64 => Float64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    String => String,
    Vec<u8> => Bytes,
);
