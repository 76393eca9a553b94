//! Setup inside a process whose host already installed a `log` logger.

use log::LevelFilter;
use oss_lib_config::{ConfigLoader, ResolvedSources, published, setup_logging};
use pretty_assertions::assert_eq;

#[test]
fn setup_keeps_host_logger() {
    env_logger::builder()
        .is_test(true)
        .try_init()
        .expect("host logger");

    let config = ConfigLoader::new()
        .setup(&ResolvedSources::default())
        .expect("setup with a host logger");
    assert!(config.is_empty());
    assert_eq!(log::max_level(), LevelFilter::Warn);
    assert_eq!(published(), Some(config));

    setup_logging(None, true).expect("debug logging with a host logger");
    assert_eq!(log::max_level(), LevelFilter::Debug);
}
