use crate::Result;
use neuropod_base::TensorValue;
use std::collections::HashMap;

/// A loaded graph bound to a live execution context
///
/// Names on this trait are engine tensor names, never package names.
pub trait Session: Send {
    /// Run the graph once, binding `feeds` and computing `fetches`
    ///
    /// The returned map is keyed by fetch name. Engine failures are reported
    /// as [`crate::NeuropodError::Execution`].
    fn run(
        &mut self,
        feeds: Vec<(String, TensorValue)>,
        fetches: &[String],
    ) -> Result<HashMap<String, TensorValue>>;
}
