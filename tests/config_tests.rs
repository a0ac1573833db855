use pathquill::config::Config;
use pathquill::treepath::OutputFormat;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.output, OutputFormat::Text);
    assert_eq!(config.node_budget, 1_000_000);
    assert_eq!(config.max_results, None);
    assert!(!config.paths_only);
    assert_eq!(config.budget(), Some(1_000_000));
}

#[test]
fn test_custom_config() {
    let config = Config {
        output: OutputFormat::Json,
        node_budget: 500,
        max_results: Some(10),
        paths_only: true,
    };

    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.budget(), Some(500));
    assert_eq!(config.max_results, Some(10));
    assert!(config.paths_only);
}

#[test]
fn test_serialize_default_config() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("Failed to serialize config");

    assert!(toml_str.contains("output = \"text\""));
    assert!(toml_str.contains("node_budget = 1000000"));
    assert!(toml_str.contains("paths_only = false"));
    assert!(!toml_str.contains("max_results"));
}

#[test]
fn test_empty_file_gives_defaults() {
    let config: Config = toml::from_str("").expect("Failed to parse empty config");
    assert_eq!(config, Config::default());
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.toml");

    let config = Config {
        output: OutputFormat::Yaml,
        node_budget: 0,
        max_results: Some(3),
        paths_only: true,
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.budget(), None);
}

#[test]
fn test_load_from_malformed_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "output = [not valid").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid config file"));
}

#[test]
fn test_load_from_unknown_output() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "output = \"csv\"").unwrap();

    assert!(Config::load_from(&path).is_err());
}
