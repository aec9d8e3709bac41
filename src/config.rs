use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::DbMakerError;

/// Options that travel with a connection into every statement it prepares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Lower-case every column key of fetched rows.
    pub idcap: bool,
    /// Ask a native driver to case-fold column names itself.
    pub dbidcap: bool,
}

impl ConnectOptions {
    #[must_use]
    pub fn with_idcap(mut self, idcap: bool) -> Self {
        self.idcap = idcap;
        self
    }

    #[must_use]
    pub fn with_dbidcap(mut self, dbidcap: bool) -> Self {
        self.dbidcap = dbidcap;
        self
    }
}

/// Connection configuration as handed over by the host.
///
/// Deserializes from the usual config map; the two case flags accept booleans as well as `0`/`1`
/// (numbers or strings):
/// ```rust
/// use dbmaker_middleware::prelude::*;
///
/// let cfg = DbMakerConfig::from_json(serde_json::json!({
///     "dsn": "TESTDB",
///     "username": "SYSADM",
///     "password": "",
///     "idcap": 1,
/// }))?;
/// assert!(cfg.idcap);
/// # Ok::<(), DbMakerError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbMakerConfig {
    pub dsn: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub prefix_indexes: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub idcap: bool,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub dbidcap: bool,
}

impl DbMakerConfig {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(dsn: impl Into<String>) -> DbMakerConfigBuilder {
        DbMakerConfigBuilder::new(dsn)
    }

    /// Parse a config map.
    ///
    /// # Errors
    /// Returns `DbMakerError::Json` if the value does not match the config shape and
    /// `DbMakerError::ConfigError` if the DSN is empty.
    pub fn from_json(value: JsonValue) -> Result<Self, DbMakerError> {
        let cfg: DbMakerConfig = serde_json::from_value(value)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `DbMakerError::ConfigError` if the DSN is empty.
    pub fn validate(&self) -> Result<(), DbMakerError> {
        if self.dsn.trim().is_empty() {
            return Err(DbMakerError::ConfigError(
                "a DBMaker connection requires a non-empty `dsn`".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            idcap: self.idcap,
            dbidcap: self.dbidcap,
        }
    }

    /// Prefix applied to index names generated by blueprints.
    #[must_use]
    pub fn index_prefix(&self) -> &str {
        if self.prefix_indexes { &self.prefix } else { "" }
    }
}

/// Fluent builder for [`DbMakerConfig`].
#[derive(Debug, Clone)]
pub struct DbMakerConfigBuilder {
    cfg: DbMakerConfig,
}

impl DbMakerConfigBuilder {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            cfg: DbMakerConfig::new(dsn),
        }
    }

    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.cfg.username = username.into();
        self.cfg.password = password.into();
        self
    }

    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cfg.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn prefix_indexes(mut self, prefix_indexes: bool) -> Self {
        self.cfg.prefix_indexes = prefix_indexes;
        self
    }

    #[must_use]
    pub fn idcap(mut self, idcap: bool) -> Self {
        self.cfg.idcap = idcap;
        self
    }

    #[must_use]
    pub fn dbidcap(mut self, dbidcap: bool) -> Self {
        self.cfg.dbidcap = dbidcap;
        self
    }

    #[must_use]
    pub fn finish(self) -> DbMakerConfig {
        self.cfg
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(false),
        JsonValue::Bool(b) => Ok(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(de::Error::invalid_value(
                Unexpected::Other("number other than 0 or 1"),
                &"a 0/1 flag",
            )),
        },
        JsonValue::String(s) => match s.trim() {
            "" | "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            other => Err(de::Error::invalid_value(Unexpected::Str(other), &"a 0/1 flag")),
        },
        _ => Err(de::Error::custom("expected a boolean or 0/1 flag")),
    }
}
