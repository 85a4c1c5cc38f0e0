#![allow(dead_code)]

use neuropod_infer::{Backend, ModelSource, NeuropodError, Result, Session, Tensor, TensorValue};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Package directory under the system temp dir, removed on drop
pub struct TestPackage {
    pub root: PathBuf,
}

impl TestPackage {
    pub fn new(test_name: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "neuropod-infer-test-{}-{}",
            std::process::id(),
            test_name
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("0").join("data")).expect("Failed to create package dir");
        Self { root }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn neuropod_config(self, json: &str) -> Self {
        fs::write(self.root.join("config.json"), json).expect("Failed to write config");
        self
    }

    pub fn engine_config(self, json: &str) -> Self {
        fs::write(self.root.join("0").join("config.json"), json).expect("Failed to write config");
        self
    }

    pub fn graph(self, extension: &str, bytes: &[u8]) -> Self {
        let path = self.root.join("0").join("data").join(format!("model.{extension}"));
        fs::write(path, bytes).expect("Failed to write graph");
        self
    }
}

impl Drop for TestPackage {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.root).ok();
    }
}

pub const ADDITION_CONFIG: &str = r#"{
    "name": "addition_model",
    "platform": "mock",
    "input_spec": [
        {"name": "x1", "dtype": "float32", "shape": ["batch"]},
        {"name": "x2", "dtype": "float32", "shape": ["batch"]}
    ],
    "output_spec": [
        {"name": "y", "dtype": "float32", "shape": ["batch"]}
    ]
}"#;

pub const ADDITION_MAPPING: &str = r#"{
    "node_name_mapping": {"x1": "import/x1:0", "x2": "import/x2:0", "y": "import/y:0"}
}"#;

pub const ADDITION_GRAPH: &str = "add import/x1:0 import/x2:0 -> import/y:0\n";

pub fn f32_input(values: &[f32]) -> TensorValue {
    TensorValue::Float32(Tensor::from_vec(values.to_vec()))
}

pub fn addition_inputs(x1: &[f32], x2: &[f32]) -> HashMap<String, TensorValue> {
    HashMap::from([
        ("x1".to_string(), f32_input(x1)),
        ("x2".to_string(), f32_input(x2)),
    ])
}

/// One line of the mock graph format
#[derive(Debug, Clone)]
enum Node {
    Add { a: String, b: String },
    Identity { input: String },
    Bytes { shape: Vec<usize>, items: Vec<Vec<u8>> },
    Strings { shape: Vec<usize>, items: Vec<String> },
    Fail,
}

/// Backend reading a line-per-node text graph
///
/// ```text
/// add <a> <b> -> <out>              float32 elementwise sum
/// identity <a> -> <out>
/// bytes <out> <d0,d1,..> <items..>  untyped byte-string constant
/// badbytes <out>                    byte constant that is not UTF-8
/// strings <out> <d0,d1,..> <items..>
/// fail <out>                        errors when evaluated
/// ```
///
/// Every node evaluation is appended to `evaluated`.
#[derive(Default, Clone)]
pub struct MockBackend {
    pub evaluated: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn evaluated(&self) -> Vec<String> {
        self.evaluated.lock().unwrap().clone()
    }
}

fn parse_shape(text: &str) -> Option<Vec<usize>> {
    text.split(',').map(|d| d.parse().ok()).collect()
}

fn parse_graph(text: &str) -> std::result::Result<HashMap<String, Node>, String> {
    let mut nodes = HashMap::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (out, node) = match tokens.as_slice() {
            ["add", a, b, "->", out] => (
                *out,
                Node::Add {
                    a: a.to_string(),
                    b: b.to_string(),
                },
            ),
            ["identity", input, "->", out] => (
                *out,
                Node::Identity {
                    input: input.to_string(),
                },
            ),
            ["bytes", out, shape, items @ ..] => (
                *out,
                Node::Bytes {
                    shape: parse_shape(shape).ok_or(format!("bad shape in '{line}'"))?,
                    items: items.iter().map(|i| i.as_bytes().to_vec()).collect(),
                },
            ),
            ["badbytes", out] => (
                *out,
                Node::Bytes {
                    shape: vec![2],
                    items: vec![b"ok".to_vec(), vec![0xff, 0xfe]],
                },
            ),
            ["strings", out, shape, items @ ..] => (
                *out,
                Node::Strings {
                    shape: parse_shape(shape).ok_or(format!("bad shape in '{line}'"))?,
                    items: items.iter().map(|i| i.to_string()).collect(),
                },
            ),
            ["fail", out] => (*out, Node::Fail),
            _ => return Err(format!("unparsable node '{line}'")),
        };
        nodes.insert(out.to_string(), node);
    }
    Ok(nodes)
}

impl Backend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn graph_extension(&self) -> &str {
        "graph"
    }

    fn load_graph(&self, model: ModelSource) -> Result<Box<dyn Session>> {
        let (origin, bytes) = match model {
            ModelSource::File(path) => {
                let bytes = fs::read(&path).map_err(|e| NeuropodError::load(&path, e))?;
                (path, bytes)
            }
            ModelSource::Memory(bytes) => (PathBuf::from("<memory>"), bytes),
        };
        let text = String::from_utf8(bytes).map_err(|e| NeuropodError::load(&origin, e))?;
        let nodes = parse_graph(&text).map_err(|e| NeuropodError::load(&origin, e))?;
        Ok(Box::new(MockSession {
            nodes,
            evaluated: Arc::clone(&self.evaluated),
        }))
    }
}

struct MockSession {
    nodes: HashMap<String, Node>,
    evaluated: Arc<Mutex<Vec<String>>>,
}

impl MockSession {
    fn eval(&self, name: &str, feeds: &HashMap<String, TensorValue>) -> Result<TensorValue> {
        if let Some(value) = feeds.get(name) {
            return Ok(value.clone());
        }
        let node = self
            .nodes
            .get(name)
            .ok_or_else(|| NeuropodError::Execution(format!("missing required input '{name}'")))?;
        self.evaluated.lock().unwrap().push(name.to_string());

        match node {
            Node::Add { a, b } => {
                let (a, b) = (self.eval(a, feeds)?, self.eval(b, feeds)?);
                let (Some(a), Some(b)) = (a.as_f32(), b.as_f32()) else {
                    return Err(NeuropodError::Execution("add expects float32".to_string()));
                };
                if a.shape != b.shape {
                    return Err(NeuropodError::Execution(format!(
                        "incompatible shapes {:?} and {:?}",
                        a.shape, b.shape
                    )));
                }
                let data = a.data.iter().zip(&b.data).map(|(x, y)| x + y).collect();
                Ok(TensorValue::Float32(Tensor::new(a.shape.clone(), data)?))
            }
            Node::Identity { input } => self.eval(input, feeds),
            Node::Bytes { shape, items } => {
                Ok(TensorValue::Bytes(Tensor::new(shape.clone(), items.clone())?))
            }
            Node::Strings { shape, items } => {
                Ok(TensorValue::String(Tensor::new(shape.clone(), items.clone())?))
            }
            Node::Fail => Err(NeuropodError::Execution(format!("node '{name}' failed"))),
        }
    }
}

impl Session for MockSession {
    fn run(
        &mut self,
        feeds: Vec<(String, TensorValue)>,
        fetches: &[String],
    ) -> Result<HashMap<String, TensorValue>> {
        let feeds: HashMap<String, TensorValue> = feeds.into_iter().collect();
        fetches
            .iter()
            .map(|name| Ok((name.clone(), self.eval(name, &feeds)?)))
            .collect()
    }
}
