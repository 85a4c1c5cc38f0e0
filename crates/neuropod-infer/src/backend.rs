use crate::{ModelSource, Result, Session};

/// An inference engine able to turn a serialized graph into a [`Session`]
pub trait Backend {
    fn name(&self) -> &str;

    /// File extension of the graph under `0/data/model.<ext>`
    fn graph_extension(&self) -> &str;

    /// Deserialize `model` into a fresh session that shares no execution
    /// state with sessions created earlier.
    fn load_graph(&self, model: ModelSource) -> Result<Box<dyn Session>>;
}
