//! Connection factories and the native → emulated fallback.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ConnectOptions, DbMakerConfig};
use crate::connection::{DbConnection, DbMakerConnection};
use crate::driver::OdbcDriver;
use crate::emulation::EmulatedConnection;
use crate::error::DbMakerError;

/// DSN scheme a native driver expects.
pub const NATIVE_DSN_PREFIX: &str = "odbc:";

/// Something that can open a [`DbConnection`] for a DSN.
pub trait ConnectionFactory: Send + Sync {
    /// Open a connection to `dsn` with the credentials in `config`.
    ///
    /// # Errors
    /// Returns `DbMakerError::ConnectionError` (or any other variant) when no connection can be
    /// established.
    fn connect(
        &self,
        dsn: &str,
        config: &DbMakerConfig,
        options: ConnectOptions,
    ) -> Result<Box<dyn DbConnection>, DbMakerError>;
}

/// The emulated path: an [`EmulatedConnection`] over an [`OdbcDriver`].
#[derive(Clone)]
pub struct OdbcConnectionFactory {
    driver: Arc<dyn OdbcDriver>,
}

impl OdbcConnectionFactory {
    pub fn new(driver: impl OdbcDriver + 'static) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }

    #[must_use]
    pub fn from_shared(driver: Arc<dyn OdbcDriver>) -> Self {
        Self { driver }
    }
}

#[cfg(feature = "odbc")]
impl Default for OdbcConnectionFactory {
    fn default() -> Self {
        Self::new(crate::driver::OdbcApiDriver::new())
    }
}

impl ConnectionFactory for OdbcConnectionFactory {
    fn connect(
        &self,
        dsn: &str,
        config: &DbMakerConfig,
        options: ConnectOptions,
    ) -> Result<Box<dyn DbConnection>, DbMakerError> {
        let conn = EmulatedConnection::open(
            self.driver.as_ref(),
            dsn,
            &config.username,
            &config.password,
            options,
        )?;
        Ok(Box::new(conn))
    }
}

impl fmt::Debug for OdbcConnectionFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OdbcConnectionFactory").finish_non_exhaustive()
    }
}

/// Picks the connection path once per connect: native when a native factory is registered and
/// succeeds, the emulated fallback otherwise.
///
/// ```rust,no_run
/// use dbmaker_middleware::prelude::*;
///
/// fn tables(driver: impl OdbcDriver + 'static) -> Result<Vec<CustomDbRow>, DbMakerError> {
///     let connector = Connector::new(OdbcConnectionFactory::new(driver));
///     let cfg = DbMakerConfig::builder("TESTDB").credentials("SYSADM", "").finish();
///     let mut db = connector.connect_database(&cfg)?;
///     db.select("select * from SYSTABLE", &[])
/// }
/// ```
#[derive(Clone)]
pub struct Connector {
    native: Option<Arc<dyn ConnectionFactory>>,
    fallback: Arc<dyn ConnectionFactory>,
}

impl Connector {
    /// A connector that only has the fallback path.
    pub fn new(fallback: impl ConnectionFactory + 'static) -> Self {
        Self {
            native: None,
            fallback: Arc::new(fallback),
        }
    }

    /// Fallback over the real ODBC driver.
    #[cfg(feature = "odbc")]
    #[must_use]
    pub fn odbc() -> Self {
        Self::new(OdbcConnectionFactory::default())
    }

    /// Register a native factory to try first.
    #[must_use]
    pub fn with_native(mut self, native: impl ConnectionFactory + 'static) -> Self {
        self.native = Some(Arc::new(native));
        self
    }

    /// Open a connection for `config`.
    ///
    /// The native factory receives the DSN with the `odbc:` scheme; the fallback receives the
    /// DSN exactly as configured. A native failure is logged and never surfaced.
    ///
    /// # Errors
    /// Returns `DbMakerError::ConfigError` for an empty DSN and `DbMakerError::ConnectionError`
    /// when the fallback cannot connect either.
    pub fn connect(&self, config: &DbMakerConfig) -> Result<Box<dyn DbConnection>, DbMakerError> {
        config.validate()?;
        let dsn = config.dsn.as_str();

        if let Some(native) = &self.native {
            let native_dsn = native_dsn(dsn);
            let options = ConnectOptions::default().with_dbidcap(config.dbidcap);
            match native.connect(&native_dsn, config, options) {
                Ok(conn) => {
                    debug!(dsn = %native_dsn, "native DBMaker connection open");
                    return Ok(conn);
                }
                Err(err) => {
                    warn!(dsn = %native_dsn, error = %err, "native DBMaker connection failed, falling back to ODBC emulation");
                }
            }
        } else {
            debug!(dsn, "no native DBMaker driver registered, using ODBC emulation");
        }

        self.fallback
            .connect(dsn, config, config.connect_options())
            .map_err(|err| match err {
                DbMakerError::ConnectionError(_) => err,
                other => DbMakerError::ConnectionError(other.to_string()),
            })
    }

    /// [`Connector::connect`] wrapped in a [`DbMakerConnection`] that carries the config's table
    /// prefix and index prefix.
    ///
    /// # Errors
    /// Same as [`Connector::connect`].
    pub fn connect_database(
        &self,
        config: &DbMakerConfig,
    ) -> Result<DbMakerConnection, DbMakerError> {
        let conn = self.connect(config)?;
        Ok(DbMakerConnection::from_config(conn, config))
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("native", &self.native.is_some())
            .finish_non_exhaustive()
    }
}

fn native_dsn(dsn: &str) -> String {
    if dsn.starts_with(NATIVE_DSN_PREFIX) {
        dsn.to_string()
    } else {
        format!("{NATIVE_DSN_PREFIX}{dsn}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_dsn_is_prefixed_once() {
        assert_eq!(native_dsn("TESTDB"), "odbc:TESTDB");
        assert_eq!(native_dsn("odbc:TESTDB"), "odbc:TESTDB");
    }
}
