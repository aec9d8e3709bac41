//! Stand-in for a host-supplied native driver.

use std::sync::{Arc, Mutex, PoisonError};

use crate::config::{ConnectOptions, DbMakerConfig};
use crate::connection::{DbConnection, DbStatement};
use crate::connector::ConnectionFactory;
use crate::emulation::EmulatedConnection;
use crate::error::DbMakerError;
use crate::types::ConnectionKind;

use super::MockDriver;

/// A [`ConnectionFactory`] that either always fails or opens connections on a [`MockDriver`]
/// reporting [`ConnectionKind::Native`]. Every attempt is recorded.
#[derive(Debug, Clone)]
pub struct MockNativeFactory {
    driver: Option<MockDriver>,
    failure: String,
    attempts: Arc<Mutex<Vec<(String, ConnectOptions)>>>,
}

impl MockNativeFactory {
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            driver: None,
            failure: message.to_string(),
            attempts: Arc::default(),
        }
    }

    #[must_use]
    pub fn backed_by(driver: MockDriver) -> Self {
        Self {
            driver: Some(driver),
            failure: String::new(),
            attempts: Arc::default(),
        }
    }

    /// DSNs this factory was asked to open.
    #[must_use]
    pub fn attempted_dsns(&self) -> Vec<String> {
        self.attempts()
            .into_iter()
            .map(|(dsn, _)| dsn)
            .collect()
    }

    #[must_use]
    pub fn attempts(&self) -> Vec<(String, ConnectOptions)> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ConnectionFactory for MockNativeFactory {
    fn connect(
        &self,
        dsn: &str,
        config: &DbMakerConfig,
        options: ConnectOptions,
    ) -> Result<Box<dyn DbConnection>, DbMakerError> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((dsn.to_string(), options));
        let Some(driver) = &self.driver else {
            return Err(DbMakerError::ConnectionError(self.failure.clone()));
        };
        let inner =
            EmulatedConnection::open(driver, dsn, &config.username, &config.password, options)?;
        Ok(Box::new(NativeConnection(inner)))
    }
}

struct NativeConnection(EmulatedConnection);

impl DbConnection for NativeConnection {
    fn prepare(&mut self, sql: &str) -> Result<Box<dyn DbStatement>, DbMakerError> {
        self.0.prepare(sql)
    }

    fn exec(&mut self, sql: &str) -> Result<(), DbMakerError> {
        self.0.exec(sql)
    }

    fn begin_transaction(&mut self) -> Result<(), DbMakerError> {
        self.0.begin_transaction()
    }

    fn commit(&mut self) -> Result<(), DbMakerError> {
        self.0.commit()
    }

    fn roll_back(&mut self) -> Result<(), DbMakerError> {
        self.0.roll_back()
    }

    fn kind(&self) -> ConnectionKind {
        ConnectionKind::Native
    }
}
