//! Start-up pipeline against process-wide state.
//!
//! Logging and the published config are global, so everything touching them
//! runs inside one test to keep the steps ordered.

use clap::{Arg, Command};
use log::LevelFilter;
use oss_lib_config::{
    Config, ConfigError, ConfigLoader, ResolvedSources, Schema, SchemaFragment, published,
    setup_config, setup_logging,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const PREFIX: &str = "OSS_LIB_BOOTSTRAP_TEST";

fn loader() -> ConfigLoader {
    let defaults = json!({"host": "localhost", "port": 80, "db": {"pool": 4, "name": "app"}});
    ConfigLoader::new()
        .with_defaults(defaults.as_object().cloned().unwrap_or_default())
        .with_schema(
            SchemaFragment::new()
                .property("host", Schema::String)
                .property("port", Schema::Integer)
                .property("db", Schema::Any),
        )
}

#[test]
fn bootstrap_pipeline() {
    let dir = TempDir::new().expect("tempdir");

    // Re-invocation replaces the previous logging configuration.
    setup_logging(None, true).expect("debug logging");
    assert_eq!(log::max_level(), LevelFilter::Debug);
    setup_logging(None, false).expect("default logging");
    assert_eq!(log::max_level(), LevelFilter::Warn);

    let log_conf = dir.path().join("logging.yaml");
    fs::write(&log_conf, "level: error\nformat: \"{levelname}: {message}\"\n").expect("write");
    setup_logging(Some(&log_conf), false).expect("file logging");
    assert_eq!(log::max_level(), LevelFilter::Error);
    setup_logging(Some(&log_conf), true).expect("file logging with debug");
    assert_eq!(log::max_level(), LevelFilter::Debug);

    let bad_log_conf = dir.path().join("bad-logging.yaml");
    fs::write(&bad_log_conf, "level: loud\n").expect("write");
    assert!(matches!(
        setup_logging(Some(&bad_log_conf), false),
        Err(ConfigError::Logging(_))
    ));
    assert!(matches!(
        setup_logging(Some(&dir.path().join("missing.yaml")), false),
        Err(ConfigError::FileRead { .. })
    ));

    // Nothing is published before a successful setup.
    assert_eq!(published(), None);
    let invalid = dir.path().join("invalid.yaml");
    fs::write(&invalid, "port: eighty\n").expect("write");
    let err = loader()
        .setup(&ResolvedSources {
            config_path: Some(invalid),
            ..ResolvedSources::default()
        })
        .expect_err("port must be an integer");
    assert!(err.to_string().contains("port"));
    assert_eq!(Config::current(), None);

    // Setup merges, validates and publishes.
    let conf = dir.path().join("service.yaml");
    fs::write(&conf, "port: 8080\ndb:\n  name: prod\n").expect("write");
    let sources = ResolvedSources {
        config_path: Some(conf.clone()),
        log_config_path: None,
        debug: true,
    };
    let config = setup_config(&loader(), &sources).expect("setup");
    assert_eq!(config["port"], json!(8080));
    assert_eq!(config["db"], json!({"pool": 4, "name": "prod"}));
    assert_eq!(Config::current(), Some(config.clone()));
    assert_eq!(log::max_level(), LevelFilter::Debug);

    // Command-line flags feed the same pipeline; caller arguments survive.
    let override_conf = dir.path().join("override.yaml");
    fs::write(&override_conf, "host: example.org\n").expect("write");
    let command = Command::new("svc").arg(Arg::new("workers").long("workers"));
    let (config, matches) = loader()
        .process_args_from(
            PREFIX,
            Some(command),
            [
                "svc",
                "--config-file",
                override_conf.to_str().expect("utf-8 path"),
                "--workers",
                "3",
            ],
        )
        .expect("process args");
    assert_eq!(config["host"], json!("example.org"));
    assert_eq!(config["port"], json!(80));
    assert_eq!(
        matches.get_one::<String>("workers").map(String::as_str),
        Some("3")
    );
    assert_eq!(published(), Some(config));
    assert_eq!(log::max_level(), LevelFilter::Warn);

    // The prefix is checked before anything else.
    assert!(matches!(
        loader().process_args_from("bad-prefix", None, ["svc"]),
        Err(ConfigError::InvalidPrefix(_))
    ));
    assert!(matches!(
        loader().process_env("123svc"),
        Err(ConfigError::InvalidPrefix(_))
    ));
}
