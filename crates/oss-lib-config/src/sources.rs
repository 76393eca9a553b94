//! Resolution of config sources from environment variables and flags.
//!
//! Precedence is command-line flags over `{PREFIX}_*` environment variables
//! over built-in defaults (no file, default logging, no debug).

use crate::ConfigError;
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::debug;
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

const SERVICE_PREFIX_PATTERN: &str = r"^[A-Z][_A-Z0-9]*$";

/// Clap argument id for `--config-file`.
pub const CONFIG_PATH_ARG: &str = "config_path";
/// Clap argument id for `--log-config-file`.
pub const LOG_CONFIG_PATH_ARG: &str = "log_config_path";
/// Clap argument id for `--debug`.
pub const DEBUG_ARG: &str = "debug";

/// Effective locations and flags used to bootstrap a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSources {
    /// Path to the YAML config file.
    pub config_path: Option<PathBuf>,
    /// Path to the YAML logging config file.
    pub log_config_path: Option<PathBuf>,
    /// Force DEBUG logging and dump the merged config.
    pub debug: bool,
}

impl ResolvedSources {
    /// Read `{PREFIX}_CONF`, `{PREFIX}_LOG_CONF` and `{PREFIX}_DEBUG` from the
    /// process environment.
    pub fn from_env(service_prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(service_prefix, |name| std::env::var_os(name))
    }

    /// Resolve sources through an arbitrary variable lookup.
    ///
    /// Paths are taken as raw OS strings. Debug is enabled only by the exact
    /// value `"true"`.
    pub fn from_lookup<F>(service_prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        check_service_prefix(service_prefix)?;
        let names = EnvNames::new(service_prefix);
        let sources = Self {
            config_path: lookup(&names.config).map(PathBuf::from),
            log_config_path: lookup(&names.log_config).map(PathBuf::from),
            debug: lookup(&names.debug).as_deref() == Some(OsStr::new("true")),
        };
        debug!(
            "resolved environment sources (prefix={}, config_set={}, log_config_set={}, debug={})",
            service_prefix,
            sources.config_path.is_some(),
            sources.log_config_path.is_some(),
            sources.debug
        );
        Ok(sources)
    }

    /// Overlay values parsed by [`register_arguments`] flags.
    ///
    /// Paths given on the command line win; `--debug` can only switch debug on.
    pub fn with_matches(mut self, matches: &ArgMatches) -> Self {
        if let Some(path) = matches.get_one::<PathBuf>(CONFIG_PATH_ARG) {
            self.config_path = Some(path.clone());
        }
        if let Some(path) = matches.get_one::<PathBuf>(LOG_CONFIG_PATH_ARG) {
            self.log_config_path = Some(path.clone());
        }
        if matches.get_flag(DEBUG_ARG) {
            self.debug = true;
        }
        self
    }
}

/// Environment variable names for a service prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvNames {
    pub config: String,
    pub log_config: String,
    pub debug: String,
}

impl EnvNames {
    pub fn new(service_prefix: &str) -> Self {
        Self {
            config: format!("{service_prefix}_CONF"),
            log_config: format!("{service_prefix}_LOG_CONF"),
            debug: format!("{service_prefix}_DEBUG"),
        }
    }
}

/// Ensure the prefix starts with an uppercase letter and contains only
/// uppercase letters, digits and underscores.
pub fn check_service_prefix(service_prefix: &str) -> Result<(), ConfigError> {
    let Ok(pattern) = Regex::new(SERVICE_PREFIX_PATTERN) else {
        return Err(ConfigError::InvalidPrefix(service_prefix.to_string()));
    };
    if pattern.is_match(service_prefix) {
        Ok(())
    } else {
        Err(ConfigError::InvalidPrefix(service_prefix.to_string()))
    }
}

/// Add `--config-file`, `--log-config-file` and `--debug` to a command.
pub fn register_arguments(command: Command, service_prefix: &str) -> Command {
    let names = EnvNames::new(service_prefix);
    command
        .arg(
            Arg::new(CONFIG_PATH_ARG)
                .long("config-file")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help(format!(
                    "Path to a configuration file, overrides the {} environment variable.",
                    names.config
                )),
        )
        .arg(
            Arg::new(LOG_CONFIG_PATH_ARG)
                .long("log-config-file")
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help(format!(
                    "Path to a logging configuration file, overrides the {} environment variable.",
                    names.log_config
                )),
        )
        .arg(
            Arg::new(DEBUG_ARG)
                .long("debug")
                .action(ArgAction::SetTrue)
                .help(format!(
                    "Set the logging level to DEBUG, overrides the {} environment variable (default: false).",
                    names.debug
                )),
        )
}

/// Parse the process arguments on top of the process environment.
///
/// When `command` is `None` a bare command named after the prefix is used.
/// The returned matches also hold any arguments the caller registered.
pub fn parse_args(
    service_prefix: &str,
    command: Option<Command>,
) -> Result<(ArgMatches, ResolvedSources), ConfigError> {
    parse_args_from(service_prefix, command, std::env::args_os(), |name| {
        std::env::var_os(name)
    })
}

/// Parse explicit arguments on top of an arbitrary variable lookup.
pub fn parse_args_from<I, T, F>(
    service_prefix: &str,
    command: Option<Command>,
    args: I,
    lookup: F,
) -> Result<(ArgMatches, ResolvedSources), ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    F: Fn(&str) -> Option<OsString>,
{
    check_service_prefix(service_prefix)?;
    let command = command.unwrap_or_else(|| Command::new(service_prefix.to_lowercase()));
    let matches = register_arguments(command, service_prefix).try_get_matches_from(args)?;
    let sources = ResolvedSources::from_lookup(service_prefix, lookup)?.with_matches(&matches);
    Ok((matches, sources))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, OsString> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), OsString::from(value)))
            .collect()
    }

    fn full_env() -> HashMap<String, OsString> {
        env(&[
            ("CEAGLE_CONF", "conf"),
            ("CEAGLE_LOG_CONF", "log-conf"),
            ("CEAGLE_DEBUG", "true"),
        ])
    }

    fn full_sources() -> ResolvedSources {
        ResolvedSources {
            config_path: Some(PathBuf::from("conf")),
            log_config_path: Some(PathBuf::from("log-conf")),
            debug: true,
        }
    }

    fn resolve(prefix: &str, vars: &HashMap<String, OsString>) -> ResolvedSources {
        ResolvedSources::from_lookup(prefix, |name| vars.get(name).cloned()).expect("sources")
    }

    #[test]
    fn accepts_valid_prefixes() {
        for prefix in ["CEAGLE_SUFFIX", "CEAGLE_123_SUFFIX", "CEAGLE1_23_SUFFIX", "A"] {
            check_service_prefix(prefix).expect(prefix);
        }
    }

    #[test]
    fn rejects_invalid_prefixes() {
        for prefix in ["123ceagle", "123CEAGLE", "ceagle", "-CEAGLE", "", "_CEAGLE", "CE-AGLE"] {
            assert!(
                matches!(
                    check_service_prefix(prefix),
                    Err(ConfigError::InvalidPrefix(ref value)) if value == prefix
                ),
                "prefix {prefix:?} should be rejected"
            );
        }
    }

    #[test]
    fn reads_all_prefixed_variables() {
        assert_eq!(resolve("CEAGLE", &full_env()), full_sources());
    }

    #[test]
    fn ignores_variables_of_other_prefixes() {
        let mut vars = full_env();
        vars.insert("_CONF".to_string(), "conf2".into());
        vars.insert("HEALTH_CONF".to_string(), "conf3".into());
        assert_eq!(resolve("CEAGLE", &vars), full_sources());
        assert_eq!(resolve("HEALTH", &full_env()), ResolvedSources::default());
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        assert_eq!(resolve("CEAGLE", &HashMap::new()), ResolvedSources::default());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_kept() {
        use std::os::unix::ffi::OsStringExt;

        let raw = OsString::from_vec(b"/etc/svc/\xffconf.yaml".to_vec());
        let mut vars = HashMap::new();
        vars.insert("CEAGLE_CONF".to_string(), raw.clone());
        vars.insert("CEAGLE_LOG_CONF".to_string(), raw.clone());
        let sources = resolve("CEAGLE", &vars);
        assert_eq!(sources.config_path, Some(PathBuf::from(&raw)));
        assert_eq!(sources.log_config_path, Some(PathBuf::from(raw)));
    }

    #[test]
    fn debug_requires_exact_true() {
        for value in ["True", "TRUE", "1", "yes", ""] {
            let vars = env(&[("CEAGLE_DEBUG", value)]);
            assert!(!resolve("CEAGLE", &vars).debug, "{value:?} must not enable debug");
        }
    }

    #[test]
    fn invalid_prefix_fails_before_lookup() {
        let err = ResolvedSources::from_lookup("ceagle", |_| panic!("lookup must not run"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPrefix(_)));
    }

    #[test]
    fn registers_three_arguments() {
        let command = register_arguments(Command::new("svc"), "CEAGLE");
        let ids: Vec<&str> = command
            .get_arguments()
            .map(|arg| arg.get_id().as_str())
            .collect();
        assert_eq!(ids, vec![CONFIG_PATH_ARG, LOG_CONFIG_PATH_ARG, DEBUG_ARG]);

        let config = command
            .get_arguments()
            .find(|arg| arg.get_id().as_str() == CONFIG_PATH_ARG)
            .expect("config arg");
        assert_eq!(config.get_long(), Some("config-file"));
        let help = config.get_help().expect("help").to_string();
        assert!(help.contains("CEAGLE_CONF"));
    }

    #[test]
    fn flags_override_environment() {
        let vars = env(&[("CEAGLE_CONF", "env.yaml"), ("CEAGLE_LOG_CONF", "env-log.yaml")]);
        let (_, sources) = parse_args_from(
            "CEAGLE",
            None,
            ["svc", "--config-file", "cli.yaml", "--debug"],
            |name| vars.get(name).cloned(),
        )
        .expect("parse");
        assert_eq!(
            sources,
            ResolvedSources {
                config_path: Some(PathBuf::from("cli.yaml")),
                log_config_path: Some(PathBuf::from("env-log.yaml")),
                debug: true,
            }
        );
    }

    #[test]
    fn environment_debug_survives_without_flag() {
        let vars = env(&[("CEAGLE_DEBUG", "true")]);
        let (_, sources) =
            parse_args_from("CEAGLE", None, ["svc"], |name| vars.get(name).cloned())
                .expect("parse");
        assert!(sources.debug);
    }

    #[test]
    fn caller_arguments_are_kept() {
        let command = Command::new("svc").arg(Arg::new("port").long("port"));
        let (matches, sources) = parse_args_from(
            "CEAGLE",
            Some(command),
            ["svc", "--port", "8080"],
            |_| None,
        )
        .expect("parse");
        assert_eq!(
            matches.get_one::<String>("port").map(String::as_str),
            Some("8080")
        );
        assert_eq!(sources, ResolvedSources::default());
    }

    #[test]
    fn unknown_flag_is_an_error() {
        let err = parse_args_from("CEAGLE", None, ["svc", "--bogus"], |_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Cli(_)));
    }
}
