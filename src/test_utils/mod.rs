/// Scriptable ODBC driver for exercising the emulation layer without a database.
pub mod mock_driver;
/// Native-driver stand-in for connector tests.
pub mod native;

pub use mock_driver::{ExecutedStatement, MockDriver, MockEvent};
pub use native::MockNativeFactory;

use crate::config::DbMakerConfig;
use crate::connection::DbMakerConnection;
use crate::connector::{Connector, OdbcConnectionFactory};
use crate::error::DbMakerError;

/// A [`DbMakerConnection`] over `driver`, through the regular fallback path.
///
/// # Errors
/// Returns `DbMakerError::ConnectionError` if the driver refuses to open.
pub fn mock_database(
    driver: &MockDriver,
    config: &DbMakerConfig,
) -> Result<DbMakerConnection, DbMakerError> {
    Connector::new(OdbcConnectionFactory::new(driver.clone())).connect_database(config)
}
