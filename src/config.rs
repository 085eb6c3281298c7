//! Configuration loading for mcp-proxmox.
//!
//! Configuration is resolved from an ordered chain of sources; the first
//! source that produces a configuration wins:
//!
//! 1. **Environment variables** - `PROXMOX_HOST` + `PROXMOX_TOKEN_ID` +
//!    `PROXMOX_TOKEN_SECRET` (plus optional `PROXMOX_*` settings)
//! 2. **JSON file** via `--config <path>`, or else the `PROXMOX_MCP_CONFIG`
//!    environment variable
//!
//! A complete environment always wins, even when a config file is also
//! supplied. An incomplete environment is not an error on its own; it only
//! surfaces (as the list of unset variables) when no file is available
//! either.
//!
//! The JSON file format:
//!
//! ```json
//! {
//!   "proxmox": { "host": "pve.example.com", "port": 8006, "verify_ssl": true, "service": "PVE" },
//!   "auth": { "user": "root@pam", "token_name": "mcp", "token_value": "..." },
//!   "logging": { "level": "INFO" }
//! }
//! ```

use std::fmt;
use std::net::Ipv6Addr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::Parser;
use serde::Deserialize;
use tracing::debug;

use crate::logging;

pub const ENV_HOST: &str = "PROXMOX_HOST";
pub const ENV_PORT: &str = "PROXMOX_PORT";
pub const ENV_TOKEN_ID: &str = "PROXMOX_TOKEN_ID";
pub const ENV_TOKEN_SECRET: &str = "PROXMOX_TOKEN_SECRET";
pub const ENV_VERIFY_SSL: &str = "PROXMOX_VERIFY_SSL";
pub const ENV_SSL_CERT: &str = "PROXMOX_SSL_CERT";
pub const ENV_SERVICE: &str = "PROXMOX_SERVICE";
pub const ENV_LOG_LEVEL: &str = "PROXMOX_LOG_LEVEL";
pub const ENV_USER: &str = "PROXMOX_USER";
pub const ENV_CONFIG_PATH: &str = "PROXMOX_MCP_CONFIG";

const DEFAULT_PORT: u16 = 8006;
const DEFAULT_USER: &str = "root@pam";
const DEFAULT_LOG_LEVEL: &str = "INFO";

/// CLI arguments parsed by `clap`.
#[derive(Parser)]
#[command(name = "mcp-proxmox", version, about = "Read-only MCP server for Proxmox VE")]
pub struct Cli {
    /// Path to config file (JSON). Only used when the PROXMOX_* environment is incomplete.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Errors raised while resolving configuration. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "No configuration found: {} not set and no config file given (use --config or PROXMOX_MCP_CONFIG)",
        .missing.join(", ")
    )]
    NotFound { missing: Vec<&'static str> },
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

/// Validated configuration. Built once at startup and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub proxmox: ProxmoxConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the Proxmox API.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxmoxConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
    /// PEM file with an additional trusted CA certificate.
    #[serde(default)]
    pub ssl_cert: Option<PathBuf>,
    #[serde(default)]
    pub service: Service,
}

/// API token credential.
#[derive(Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// `user@realm`
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub token_name: String,
    #[serde(default)]
    pub token_value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Which Proxmox product the API belongs to. Decides the token header format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Service {
    #[default]
    Pve,
    Pbs,
    Pmg,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ProxmoxConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            verify_ssl: true,
            ssl_cert: None,
            service: Service::Pve,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

// Keep the secret out of logs and error reports.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user", &self.user)
            .field("token_name", &self.token_name)
            .field("token_value", &"<redacted>")
            .finish()
    }
}

impl FromStr for Service {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PVE" => Ok(Service::Pve),
            "PBS" => Ok(Service::Pbs),
            "PMG" => Ok(Service::Pmg),
            _ => Err(ConfigError::InvalidField {
                field: "proxmox.service",
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Service {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Service::Pve => "PVE",
            Service::Pbs => "PBS",
            Service::Pmg => "PMG",
        })
    }
}

impl Config {
    /// Check that every required field is present and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("proxmox.host", &self.proxmox.host),
            ("auth.user", &self.auth.user),
            ("auth.token_name", &self.auth.token_name),
            ("auth.token_value", &self.auth.token_value),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ConfigError::MissingField(*field));
        }
        if !valid_host(&self.proxmox.host) {
            return Err(ConfigError::InvalidField {
                field: "proxmox.host",
                value: self.proxmox.host.clone(),
            });
        }
        if logging::level_directive(&self.logging.level).is_none() {
            return Err(ConfigError::InvalidField {
                field: "logging.level",
                value: self.logging.level.clone(),
            });
        }
        Ok(())
    }
}

/// A bare hostname or address. The port is configured separately, so a
/// colon is only allowed inside an IPv6 literal.
fn valid_host(host: &str) -> bool {
    if host.contains(['/', '@']) || host.chars().any(char::is_whitespace) {
        return false;
    }
    if !host.contains(':') {
        return true;
    }
    let literal = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    literal.parse::<Ipv6Addr>().is_ok()
}

/// One strategy in the resolution chain.
pub trait ConfigSource {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "nothing here, try the next source".
    fn load(&self) -> Result<Option<Config>, ConfigError>;
}

/// Run the sources in order and return the first configuration produced.
pub fn resolve(sources: &[&dyn ConfigSource]) -> Result<Option<Config>, ConfigError> {
    for source in sources {
        if let Some(config) = source.load()? {
            debug!(source = source.name(), "configuration resolved");
            return Ok(Some(config));
        }
    }
    Ok(None)
}

type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Builds a configuration from `PROXMOX_*` environment variables.
pub struct EnvSource {
    lookup: Lookup,
}

impl EnvSource {
    /// Read from the process environment.
    pub fn process() -> Self {
        Self::with_lookup(|key| std::env::var(key).ok())
    }

    /// Read through an arbitrary lookup function.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Look up a variable; empty values count as unset.
    pub fn var(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.is_empty())
    }

    /// Required variables that are currently unset.
    pub fn missing(&self) -> Vec<&'static str> {
        [ENV_HOST, ENV_TOKEN_ID, ENV_TOKEN_SECRET]
            .into_iter()
            .filter(|key| self.var(key).is_none())
            .collect()
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn load(&self) -> Result<Option<Config>, ConfigError> {
        let (host, token_id, token_secret) = match (
            self.var(ENV_HOST),
            self.var(ENV_TOKEN_ID),
            self.var(ENV_TOKEN_SECRET),
        ) {
            (Some(h), Some(id), Some(secret)) => (h, id, secret),
            _ => return Ok(None),
        };

        // "user@realm!tokenname"
        let (user, token_name) = match token_id.rsplit_once('!') {
            Some((user, name)) => (user.to_string(), name.to_string()),
            None => (
                self.var(ENV_USER)
                    .unwrap_or_else(|| DEFAULT_USER.to_string()),
                token_id,
            ),
        };

        let port = match self.var(ENV_PORT) {
            Some(p) => p.trim().parse().map_err(|_| ConfigError::InvalidField {
                field: ENV_PORT,
                value: p.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let verify_ssl = self
            .var(ENV_VERIFY_SSL)
            .map_or(true, |v| parse_verify_flag(&v));

        let service = match self.var(ENV_SERVICE) {
            Some(s) => s.parse()?,
            None => Service::Pve,
        };

        let config = Config {
            proxmox: ProxmoxConfig {
                host,
                port,
                verify_ssl,
                ssl_cert: self.var(ENV_SSL_CERT).map(PathBuf::from),
                service,
            },
            auth: AuthConfig {
                user,
                token_name,
                token_value: token_secret,
            },
            logging: LoggingConfig {
                level: self
                    .var(ENV_LOG_LEVEL)
                    .unwrap_or_else(default_log_level),
                file: None,
            },
        };
        config.validate()?;
        Ok(Some(config))
    }
}

/// Loads a JSON config file, if a path was given.
pub struct FileSource {
    path: Option<PathBuf>,
}

impl FileSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.map(|p| expand_tilde(&p)),
        }
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&self) -> Result<Option<Config>, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        load_from_file(path).map(Some)
    }
}

/// Load and validate configuration from the process environment or a config file.
pub fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    load_config_from(cli.config.as_deref(), EnvSource::process())
}

/// Resolve configuration with an explicit environment source.
///
/// The file path is `explicit_path` if given, else `PROXMOX_MCP_CONFIG`
/// as seen through `env`.
pub fn load_config_from(explicit_path: Option<&Path>, env: EnvSource) -> Result<Config, ConfigError> {
    let file_path = explicit_path
        .map(Path::to_path_buf)
        .or_else(|| env.var(ENV_CONFIG_PATH).map(PathBuf::from));
    let file = FileSource::new(file_path);

    match resolve(&[&env, &file])? {
        Some(config) => Ok(config),
        None => Err(ConfigError::NotFound {
            missing: env.missing(),
        }),
    }
}

fn load_from_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config: Config = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    config.validate()?;
    Ok(config)
}

/// `false`, `0` and `no` (any case) disable certificate verification.
fn parse_verify_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "false" | "0" | "no"
    )
}

/// Expand a leading `~` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> EnvSource {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvSource::with_lookup(move |key| map.get(key).cloned())
    }

    fn full_env() -> Vec<(&'static str, &'static str)> {
        vec![
            (ENV_HOST, "test.proxmox.com"),
            (ENV_TOKEN_ID, "test@pve!test_token"),
            (ENV_TOKEN_SECRET, "test_value"),
            (ENV_LOG_LEVEL, "DEBUG"),
        ]
    }

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    const FILE_CONFIG: &str = r#"{
        "proxmox": { "host": "file.proxmox.com", "port": 8443, "verify_ssl": false, "service": "PVE" },
        "auth": { "user": "file@pam", "token_name": "file_token", "token_value": "file_value" },
        "logging": { "level": "WARNING" }
    }"#;

    #[test]
    fn env_config_parses_token_id() {
        let config = load_config_from(None, env(&full_env())).unwrap();
        assert_eq!(config.proxmox.host, "test.proxmox.com");
        assert_eq!(config.auth.user, "test@pve");
        assert_eq!(config.auth.token_name, "test_token");
        assert_eq!(config.auth.token_value, "test_value");
        assert_eq!(config.logging.level, "DEBUG");
    }

    #[test]
    fn env_config_defaults() {
        let config = load_config_from(None, env(&full_env()[..3])).unwrap();
        assert_eq!(config.proxmox.port, 8006);
        assert!(config.proxmox.verify_ssl);
        assert_eq!(config.proxmox.service, Service::Pve);
        assert!(config.proxmox.ssl_cert.is_none());
        assert_eq!(config.logging.level, "INFO");
    }

    #[test]
    fn env_config_does_not_touch_file() {
        // A path that cannot be read must not matter when env is complete.
        let config = load_config_from(
            Some(Path::new("/nonexistent/mcp-proxmox.json")),
            env(&full_env()),
        )
        .unwrap();
        assert_eq!(config.proxmox.host, "test.proxmox.com");
    }

    #[test]
    fn env_wins_over_file() {
        let file = write_config(FILE_CONFIG);
        let config = load_config_from(Some(file.path()), env(&full_env())).unwrap();
        assert_eq!(config.proxmox.host, "test.proxmox.com");
        assert_eq!(config.proxmox.port, 8006);
        assert!(config.proxmox.verify_ssl);
        assert_eq!(config.auth.user, "test@pve");
        assert_eq!(config.auth.token_name, "test_token");
        assert_eq!(config.auth.token_value, "test_value");
        assert_eq!(config.logging.level, "DEBUG");
    }

    #[test]
    fn token_id_without_separator_uses_user_var() {
        let mut vars = full_env();
        vars[1] = (ENV_TOKEN_ID, "plain_token");
        vars.push((ENV_USER, "ops@pve"));
        let config = load_config_from(None, env(&vars)).unwrap();
        assert_eq!(config.auth.user, "ops@pve");
        assert_eq!(config.auth.token_name, "plain_token");
    }

    #[test]
    fn token_id_without_separator_defaults_to_root() {
        let mut vars = full_env();
        vars[1] = (ENV_TOKEN_ID, "plain_token");
        let config = load_config_from(None, env(&vars)).unwrap();
        assert_eq!(config.auth.user, "root@pam");
        assert_eq!(config.auth.token_name, "plain_token");
    }

    #[test]
    fn token_id_splits_on_last_separator() {
        let mut vars = full_env();
        vars[1] = (ENV_TOKEN_ID, "we!rd@pve!tok");
        let config = load_config_from(None, env(&vars)).unwrap();
        assert_eq!(config.auth.user, "we!rd@pve");
        assert_eq!(config.auth.token_name, "tok");
    }

    #[test]
    fn verify_ssl_falsy_values() {
        for value in ["false", "False", "0", "no", "NO"] {
            let mut vars = full_env();
            vars.push((ENV_VERIFY_SSL, value));
            let config = load_config_from(None, env(&vars)).unwrap();
            assert!(!config.proxmox.verify_ssl, "{value} should disable verification");
        }
        for value in ["true", "1", "yes", "anything"] {
            let mut vars = full_env();
            vars.push((ENV_VERIFY_SSL, value));
            let config = load_config_from(None, env(&vars)).unwrap();
            assert!(config.proxmox.verify_ssl, "{value} should keep verification");
        }
    }

    #[test]
    fn env_optional_settings() {
        let mut vars = full_env();
        vars.extend([
            (ENV_PORT, "8007"),
            (ENV_SERVICE, "pbs"),
            (ENV_SSL_CERT, "/etc/ssl/pve.pem"),
        ]);
        let config = load_config_from(None, env(&vars)).unwrap();
        assert_eq!(config.proxmox.port, 8007);
        assert_eq!(config.proxmox.service, Service::Pbs);
        assert_eq!(
            config.proxmox.ssl_cert.as_deref(),
            Some(Path::new("/etc/ssl/pve.pem"))
        );
    }

    #[test]
    fn env_invalid_port_is_error() {
        let mut vars = full_env();
        vars.push((ENV_PORT, "eighty"));
        let err = load_config_from(None, env(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField { field: ENV_PORT, .. }
        ));
    }

    #[test]
    fn env_unknown_service_is_error() {
        let mut vars = full_env();
        vars.push((ENV_SERVICE, "ESXI"));
        let err = load_config_from(None, env(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn partial_env_falls_back_to_file() {
        let file = write_config(FILE_CONFIG);
        let vars = [(ENV_HOST, "test.proxmox.com")];
        let config = load_config_from(Some(file.path()), env(&vars)).unwrap();
        assert_eq!(config.proxmox.host, "file.proxmox.com");
        assert_eq!(config.proxmox.port, 8443);
        assert!(!config.proxmox.verify_ssl);
        assert_eq!(config.auth.user, "file@pam");
        assert_eq!(config.logging.level, "WARNING");
    }

    #[test]
    fn empty_env_value_counts_as_missing() {
        let vars = [
            (ENV_HOST, "test.proxmox.com"),
            (ENV_TOKEN_ID, "test@pve!t"),
            (ENV_TOKEN_SECRET, ""),
        ];
        match load_config_from(None, env(&vars)).unwrap_err() {
            ConfigError::NotFound { missing } => assert_eq!(missing, vec![ENV_TOKEN_SECRET]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn config_path_from_env_var() {
        let file = write_config(FILE_CONFIG);
        let path = file.path().to_string_lossy().to_string();
        let vars = [(ENV_CONFIG_PATH, path.as_str())];
        let config = load_config_from(None, env(&vars)).unwrap();
        assert_eq!(config.proxmox.host, "file.proxmox.com");
    }

    #[test]
    fn no_source_lists_missing_vars() {
        let err = load_config_from(None, env(&[])).unwrap_err();
        match &err {
            ConfigError::NotFound { missing } => {
                assert_eq!(missing, &vec![ENV_HOST, ENV_TOKEN_ID, ENV_TOKEN_SECRET]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("PROXMOX_HOST"));
    }

    #[test]
    fn file_defaults_for_optional_fields() {
        let file = write_config(
            r#"{"proxmox": {"host": "pve"}, "auth": {"user": "u@pam", "token_name": "t", "token_value": "v"}}"#,
        );
        let config = load_config_from(Some(file.path()), env(&[])).unwrap();
        assert_eq!(config.proxmox.port, 8006);
        assert!(config.proxmox.verify_ssl);
        assert_eq!(config.proxmox.service, Service::Pve);
        assert_eq!(config.logging.level, "INFO");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn file_missing_host() {
        let file = write_config(
            r#"{"proxmox": {"host": ""}, "auth": {"user": "u@pam", "token_name": "t", "token_value": "v"}}"#,
        );
        let err = load_config_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("proxmox.host")));
    }

    #[test]
    fn file_missing_token_value() {
        let file = write_config(
            r#"{"proxmox": {"host": "pve"}, "auth": {"user": "u@pam", "token_name": "t"}}"#,
        );
        let err = load_config_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("auth.token_value")));
    }

    #[test]
    fn file_invalid_json() {
        let file = write_config("{ not json");
        let err = load_config_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn file_unknown_service() {
        let file = write_config(
            r#"{"proxmox": {"host": "pve", "service": "xen"}, "auth": {"user": "u", "token_name": "t", "token_value": "v"}}"#,
        );
        let err = load_config_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn file_unreadable() {
        let err = load_config_from(Some(Path::new("/nonexistent/mcp-proxmox.json")), env(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn host_with_port_is_rejected() {
        let mut vars = full_env();
        vars[0] = (ENV_HOST, "pve.example.com:8006");
        let err = load_config_from(None, env(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField { field: "proxmox.host", ref value } if value == "pve.example.com:8006"
        ));

        let file = write_config(
            r#"{"proxmox": {"host": "https://pve"}, "auth": {"user": "u", "token_name": "t", "token_value": "v"}}"#,
        );
        let err = load_config_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field: "proxmox.host", .. }));
    }

    #[test]
    fn ipv6_hosts_are_accepted() {
        for host in ["fd00::10", "[fd00::10]", "::1", "10.0.0.5", "pve-01.lan"] {
            let mut vars = full_env();
            vars[0] = (ENV_HOST, host);
            let config = load_config_from(None, env(&vars)).unwrap();
            assert_eq!(config.proxmox.host, host);
        }
    }

    #[test]
    fn env_unknown_log_level_is_error() {
        let mut vars = full_env();
        vars[3] = (ENV_LOG_LEVEL, "verbose");
        let err = load_config_from(None, env(&vars)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidField { field: "logging.level", ref value } if value == "verbose"
        ));
    }

    #[test]
    fn file_unknown_log_level_is_error() {
        let file = write_config(
            r#"{"proxmox": {"host": "pve"}, "auth": {"user": "u", "token_name": "t", "token_value": "v"}, "logging": {"level": "chatty"}}"#,
        );
        let err = load_config_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { field: "logging.level", .. }));
    }

    #[test]
    fn log_level_names_are_case_insensitive() {
        for level in ["trace", "Debug", "warning", "CRITICAL"] {
            let mut vars = full_env();
            vars[3] = (ENV_LOG_LEVEL, level);
            let config = load_config_from(None, env(&vars)).unwrap();
            assert_eq!(config.logging.level, level);
        }
    }

    #[test]
    fn debug_redacts_token_value() {
        let config = load_config_from(None, env(&full_env())).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("test_value"));
        assert!(rendered.contains("<redacted>"));
    }
}
