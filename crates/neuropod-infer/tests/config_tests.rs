mod common;

use common::{TestPackage, ADDITION_CONFIG, ADDITION_MAPPING};
use neuropod_infer::{DType, Dim, EngineConfig, NeuropodConfig, PackageLayout};

#[test]
fn test_load_neuropod_config() {
    let package = TestPackage::new("config-neuropod").neuropod_config(ADDITION_CONFIG);
    let layout = PackageLayout::new(package.path());

    let config = NeuropodConfig::load(&layout.neuropod_config()).unwrap();

    assert_eq!(config.name, "addition_model");
    assert_eq!(config.platform, "mock");
    let names: Vec<&str> = config.input_spec.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["x1", "x2"]);
    assert_eq!(config.output_spec[0].dtype, DType::Float32);
    assert_eq!(
        config.output_spec[0].shape,
        Some(vec![Dim::Symbol("batch".to_string())])
    );
}

#[test]
fn test_neuropod_config_without_shape() {
    let package = TestPackage::new("config-no-shape").neuropod_config(
        r#"{"name": "m", "platform": "onnx",
            "input_spec": [{"name": "s", "dtype": "string"}], "output_spec": []}"#,
    );
    let config = NeuropodConfig::load(&PackageLayout::new(package.path()).neuropod_config()).unwrap();
    assert_eq!(config.input_spec[0].dtype, DType::String);
    assert_eq!(config.input_spec[0].shape, None);
}

#[test]
fn test_neuropod_config_unknown_dtype() {
    let package = TestPackage::new("config-bad-dtype").neuropod_config(
        r#"{"name": "m", "platform": "onnx",
            "input_spec": [{"name": "s", "dtype": "quaternion"}], "output_spec": []}"#,
    );
    let err = NeuropodConfig::load(&PackageLayout::new(package.path()).neuropod_config())
        .unwrap_err();
    assert!(err.is_load());
    assert!(err.to_string().contains("quaternion"));
}

#[test]
fn test_neuropod_config_duplicate_names() {
    let package = TestPackage::new("config-duplicate").neuropod_config(
        r#"{"name": "m", "platform": "onnx",
            "input_spec": [{"name": "a", "dtype": "int32"}, {"name": "a", "dtype": "int64"}],
            "output_spec": []}"#,
    );
    let err = NeuropodConfig::load(&PackageLayout::new(package.path()).neuropod_config())
        .unwrap_err();
    assert!(err.to_string().contains("duplicate tensor name 'a'"));
}

#[test]
fn test_neuropod_config_missing_file() {
    let package = TestPackage::new("config-missing");
    let err = NeuropodConfig::load(&PackageLayout::new(package.path()).neuropod_config())
        .unwrap_err();
    assert!(err.is_load());
}

#[test]
fn test_load_engine_config() {
    let package = TestPackage::new("config-engine").engine_config(ADDITION_MAPPING);
    let config = EngineConfig::load(&PackageLayout::new(package.path()).engine_config()).unwrap();

    assert_eq!(config.node_name_mapping.len(), 3);
    assert_eq!(config.node_name_mapping.resolve("y").unwrap(), "import/y:0");
}

#[test]
fn test_engine_config_ignores_extra_keys() {
    let package = TestPackage::new("config-engine-extra")
        .engine_config(r#"{"node_name_mapping": {"a": "b"}, "custom_ops": []}"#);
    let config = EngineConfig::load(&PackageLayout::new(package.path()).engine_config()).unwrap();
    assert!(config.node_name_mapping.contains("a"));
}

#[test]
fn test_engine_config_mapping_must_be_object() {
    let package = TestPackage::new("config-engine-list")
        .engine_config(r#"{"node_name_mapping": ["a", "b"]}"#);
    let err = EngineConfig::load(&PackageLayout::new(package.path()).engine_config()).unwrap_err();
    assert!(err.is_load());
}
