use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};

use crate::error::DoltMiddlewareError;
use crate::identifier::{validate_branch_name, validate_database_name};

const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Connection parameters for a Dolt sql-server.
///
/// Built once per process and treated as immutable afterwards. When `dsn` is set
/// it is used verbatim and the discrete fields are ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoltConfig {
    /// Raw connection string override.
    pub dsn: Option<String>,
    pub host: String,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Database selected at connect time; `None` uses the server default.
    pub database_name: Option<String>,
    pub port: u16,
    /// Materialize DATE/DATETIME/TIMESTAMP columns as timestamps.
    pub parse_time: bool,
    pub multi_statement: bool,
    pub tls: bool,
    pub tls_ca_file: Option<PathBuf>,
    /// Branch pinned on every pooled ad-hoc session.
    pub branch: Option<String>,
    pub pool_max_size: u32,
}

impl Default for DoltConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            host: String::new(),
            user: String::new(),
            password: String::new(),
            database_name: None,
            port: 0,
            parse_time: false,
            multi_statement: false,
            tls: false,
            tls_ca_file: None,
            branch: None,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
        }
    }
}

impl DoltConfig {
    #[must_use]
    pub fn builder(host: impl Into<String>, user: impl Into<String>, port: u16) -> DoltConfigBuilder {
        DoltConfigBuilder::new(host, user, port)
    }

    /// Check that the fields needed to build a connection string are present.
    ///
    /// # Errors
    /// Returns `NoHostDefined`, `NoUserDefined` or `NoPortDefined` (in that order)
    /// when no DSN override is set and the field is empty or zero.
    pub fn validate(&self) -> Result<(), DoltMiddlewareError> {
        if self.dsn_override().is_some() {
            return Ok(());
        }
        if self.host.trim().is_empty() {
            return Err(DoltMiddlewareError::NoHostDefined);
        }
        if self.user.trim().is_empty() {
            return Err(DoltMiddlewareError::NoUserDefined);
        }
        if self.port == 0 {
            return Err(DoltMiddlewareError::NoPortDefined);
        }
        Ok(())
    }

    /// `user:password@host:port/[database][?options]`, or the override verbatim.
    ///
    /// Options appear only when enabled, always in the order `parseTime`,
    /// `multiStatements`, `tls`.
    #[must_use]
    pub fn connection_string(&self) -> String {
        self.compose_connection_string(&self.password)
    }

    /// Same as [`connection_string`](Self::connection_string) with the password
    /// masked, for logging. A DSN override is reduced to its host part.
    #[must_use]
    pub fn redacted_connection_string(&self) -> String {
        if let Some(dsn) = self.dsn_override() {
            return match dsn.rsplit_once('@') {
                Some((_, rest)) => format!("***@{rest}"),
                None => "***".to_string(),
            };
        }
        self.compose_connection_string("***")
    }

    fn compose_connection_string(&self, password: &str) -> String {
        if let Some(dsn) = self.dsn_override() {
            return dsn.to_string();
        }
        let mut out = format!(
            "{}:{}@{}:{}/{}",
            self.user,
            password,
            self.host,
            self.port,
            self.database().unwrap_or_default()
        );
        let options = self.enabled_options();
        if !options.is_empty() {
            out.push('?');
            out.push_str(&options.join("&"));
        }
        out
    }

    fn enabled_options(&self) -> Vec<&'static str> {
        let mut options = Vec::new();
        if self.parse_time {
            options.push("parseTime=true");
        }
        if self.multi_statement {
            options.push("multiStatements=true");
        }
        if self.tls {
            options.push("tls=true");
        }
        options
    }

    /// The DSN override, ignoring blank strings.
    #[must_use]
    pub fn dsn_override(&self) -> Option<&str> {
        self.dsn.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// Connect-time database, ignoring blank strings.
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.database_name.as_deref().filter(|d| !d.trim().is_empty())
    }

    /// Pinned ad-hoc branch, ignoring blank strings.
    #[must_use]
    pub fn pinned_branch(&self) -> Option<&str> {
        self.branch.as_deref().filter(|b| !b.trim().is_empty())
    }

    /// Driver options derived from this configuration.
    ///
    /// # Errors
    /// Returns a validation error, `InvalidIdentifier` for a malformed database or
    /// pinned branch name, or `ConfigError` if the DSN override is not parseable.
    pub fn connect_options(&self) -> Result<MySqlConnectOptions, DoltMiddlewareError> {
        self.validate()?;
        if let Some(branch) = self.pinned_branch() {
            validate_branch_name(branch)?;
        }

        let mut options = if let Some(dsn) = self.dsn_override() {
            let url = if dsn.contains("://") {
                dsn.to_string()
            } else {
                format!("mysql://{dsn}")
            };
            MySqlConnectOptions::from_str(&url).map_err(|e| {
                DoltMiddlewareError::ConfigError(format!("invalid DSN override: {e}"))
            })?
        } else {
            let mut options = MySqlConnectOptions::new()
                .host(&self.host)
                .port(self.port)
                .username(&self.user)
                .password(&self.password);
            if let Some(db) = self.database() {
                options = options.database(validate_database_name(db)?);
            }
            options
        };

        options = match (&self.tls_ca_file, self.tls) {
            (Some(ca), _) => options.ssl_mode(MySqlSslMode::VerifyCa).ssl_ca(ca),
            (None, true) => options.ssl_mode(MySqlSslMode::Required),
            (None, false) if self.dsn_override().is_none() => {
                options.ssl_mode(MySqlSslMode::Disabled)
            }
            (None, false) => options,
        };
        Ok(options)
    }

    /// Read configuration from `DOLT_*` environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError` if a numeric or boolean variable does not parse.
    pub fn from_env() -> Result<Self, DoltMiddlewareError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a caller-supplied lookup.
    ///
    /// # Errors
    /// Returns `ConfigError` if a numeric or boolean value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DoltMiddlewareError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| -> Result<bool, DoltMiddlewareError> {
            match get(key) {
                None => Ok(false),
                Some(v) => parse_flag(key, &v),
            }
        };

        let mut config = DoltConfig {
            dsn: get("DOLT_DSN"),
            host: get("DOLT_HOST").unwrap_or_default(),
            user: get("DOLT_USER").unwrap_or_default(),
            password: lookup("DOLT_PASSWORD").unwrap_or_default(),
            database_name: get("DOLT_DATABASE"),
            parse_time: flag("DOLT_PARSE_TIME")?,
            multi_statement: flag("DOLT_MULTI_STATEMENT")?,
            tls: flag("DOLT_TLS")?,
            tls_ca_file: get("DOLT_TLS_CA_FILE").map(PathBuf::from),
            branch: get("DOLT_BRANCH"),
            ..DoltConfig::default()
        };
        if let Some(port) = get("DOLT_PORT") {
            config.port = port.trim().parse().map_err(|e| {
                DoltMiddlewareError::ConfigError(format!("DOLT_PORT {port:?}: {e}"))
            })?;
        }
        if let Some(size) = get("DOLT_POOL_MAX_SIZE") {
            config.pool_max_size = size.trim().parse().map_err(|e| {
                DoltMiddlewareError::ConfigError(format!("DOLT_POOL_MAX_SIZE {size:?}: {e}"))
            })?;
        }
        Ok(config)
    }

    /// Load configuration from a JSON file (missing fields take defaults).
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DoltMiddlewareError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DoltMiddlewareError::ConfigError(format!("reading {}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            DoltMiddlewareError::ConfigError(format!("parsing {}: {e}", path.display()))
        })
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, DoltMiddlewareError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DoltMiddlewareError::ConfigError(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

/// Fluent builder for [`DoltConfig`].
#[derive(Debug, Clone)]
pub struct DoltConfigBuilder {
    config: DoltConfig,
}

impl DoltConfigBuilder {
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>, port: u16) -> Self {
        Self {
            config: DoltConfig {
                host: host.into(),
                user: user.into(),
                port,
                ..DoltConfig::default()
            },
        }
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = password.into();
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database_name = Some(database.into());
        self
    }

    #[must_use]
    pub fn branch(mut self, branch: impl Into<String>) -> Self {
        self.config.branch = Some(branch.into());
        self
    }

    #[must_use]
    pub fn parse_time(mut self, enabled: bool) -> Self {
        self.config.parse_time = enabled;
        self
    }

    #[must_use]
    pub fn multi_statement(mut self, enabled: bool) -> Self {
        self.config.multi_statement = enabled;
        self
    }

    #[must_use]
    pub fn tls(mut self, enabled: bool) -> Self {
        self.config.tls = enabled;
        self
    }

    #[must_use]
    pub fn tls_ca_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tls = true;
        self.config.tls_ca_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.config.dsn = Some(dsn.into());
        self
    }

    #[must_use]
    pub fn pool_max_size(mut self, size: u32) -> Self {
        self.config.pool_max_size = size;
        self
    }

    #[must_use]
    pub fn finish(self) -> DoltConfig {
        self.config
    }
}
