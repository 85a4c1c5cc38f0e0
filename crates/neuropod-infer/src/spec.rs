use crate::config::{Dim, TensorSpec};
use crate::{NeuropodError, Result};
use neuropod_base::TensorMap;
use std::collections::HashMap;

/// Check a set of named tensors against a declared spec
///
/// Every declared tensor must be present with the declared dtype and no
/// undeclared tensors may appear. When a shape is declared, ranks and fixed
/// dimensions must match and every symbolic dimension must resolve to one
/// size across all tensors in `tensors`.
pub fn validate_tensors_against_specs(tensors: &TensorMap, specs: &[TensorSpec]) -> Result<()> {
    let mut symbols: HashMap<&str, (usize, &str)> = HashMap::new();

    for spec in specs {
        let value = tensors.get(&spec.name).ok_or_else(|| {
            NeuropodError::InvalidInput(format!("missing tensor '{}'", spec.name))
        })?;

        if value.dtype() != Some(spec.dtype) {
            return Err(NeuropodError::InvalidInput(format!(
                "tensor '{}' has dtype {}, expected {}",
                spec.name,
                value.kind_name(),
                spec.dtype
            )));
        }

        let Some(dims) = &spec.shape else {
            continue;
        };
        let shape = value.shape();
        if shape.len() != dims.len() {
            return Err(NeuropodError::InvalidInput(format!(
                "tensor '{}' has rank {}, expected {}",
                spec.name,
                shape.len(),
                dims.len()
            )));
        }

        for (axis, (dim, &size)) in dims.iter().zip(shape).enumerate() {
            match dim {
                Dim::Any => {}
                Dim::Fixed(expected) if *expected == size => {}
                Dim::Fixed(expected) => {
                    return Err(NeuropodError::InvalidInput(format!(
                        "tensor '{}' has size {size} on axis {axis}, expected {expected}",
                        spec.name
                    )));
                }
                Dim::Symbol(symbol) => match symbols.get(symbol.as_str()) {
                    Some(&(bound, owner)) if bound != size => {
                        return Err(NeuropodError::InvalidInput(format!(
                            "tensor '{}' has size {size} on axis {axis} for symbol '{symbol}', \
                             but '{owner}' bound it to {bound}",
                            spec.name
                        )));
                    }
                    Some(_) => {}
                    None => {
                        symbols.insert(symbol.as_str(), (size, spec.name.as_str()));
                    }
                },
            }
        }
    }

    if let Some(extra) = tensors
        .keys()
        .find(|name| !specs.iter().any(|spec| &spec.name == *name))
    {
        return Err(NeuropodError::InvalidInput(format!(
            "tensor '{extra}' is not in the spec"
        )));
    }

    Ok(())
}
