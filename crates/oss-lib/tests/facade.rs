use oss_lib::config::{Schema, SchemaFragment};
use oss_lib::routing::{RouteEntry, group_routes};
use oss_lib::{ConfigError, ConfigLoader, ResolvedSources};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;

#[test]
fn loads_through_facade() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("service.yaml");
    std::fs::write(&path, "port: 8080\n").expect("write config");

    let defaults = json!({"host": "localhost", "port": 80});
    let loader = ConfigLoader::new()
        .with_defaults(defaults.as_object().cloned().unwrap_or_default())
        .with_schema(
            SchemaFragment::new()
                .property("host", Schema::String)
                .property("port", Schema::Integer),
        );
    let sources = ResolvedSources {
        config_path: Some(path),
        ..ResolvedSources::default()
    };

    let config = loader.load(&sources).expect("valid config");
    assert_eq!(config["host"], json!("localhost"));
    assert_eq!(config["port"], json!(8080));
}

#[test]
fn reports_unknown_keys_through_facade() {
    let loader = ConfigLoader::new().with_defaults(
        json!({"stray": true})
            .as_object()
            .cloned()
            .unwrap_or_default(),
    );
    let err = loader
        .load(&ResolvedSources::default())
        .expect_err("undeclared key");
    assert!(matches!(err, ConfigError::Validation { .. }));
}

#[test]
fn exposes_route_grouping() {
    let entries = group_routes([(
        "/health".to_string(),
        "GET".to_string(),
        "health".to_string(),
    )]);
    assert_eq!(
        entries,
        vec![RouteEntry {
            uri: "/health".to_string(),
            methods: vec!["GET".to_string()],
            endpoint: "health".to_string(),
        }]
    );
}
