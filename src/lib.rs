//! DBMaker adapter for a query-builder style database layer.
//!
//! Connections are opened through a [`Connector`]: a host-supplied native driver is tried
//! first, and the ODBC-backed emulation in [`emulation`] takes over when it is missing or
//! fails. Either way the rest of the crate talks to the [`DbConnection`] contract.
//!
//! On top of that sit the DBMaker dialects: [`query::DbMakerQueryGrammar`] for DML,
//! [`schema::DbMakerSchemaGrammar`] for DDL and catalog introspection, and
//! [`query::DbMakerProcessor`] for recovering serial ids after inserts.
//!
//! ```rust,no_run
//! use dbmaker_middleware::prelude::*;
//!
//! fn first_user(driver: impl OdbcDriver + 'static) -> Result<(), DbMakerError> {
//!     let config = DbMakerConfig::builder("DBSAMPLE5")
//!         .credentials("SYSADM", "")
//!         .finish();
//!     let connector = Connector::new(OdbcConnectionFactory::new(driver));
//!     let mut db = connector.connect_database(&config)?;
//!     let id = db
//!         .table("users")
//!         .insert_get_id(record([("name", "alice")]))?;
//!     println!("{id:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod connector;
pub mod driver;
pub mod emulation;
pub mod error;
pub mod prelude;
pub mod query;
pub mod results;
pub mod schema;
pub mod translation;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConnectOptions, DbMakerConfig, DbMakerConfigBuilder};
pub use connection::{DbConnection, DbMakerConnection, DbStatement, SharedConnection};
pub use connector::{ConnectionFactory, Connector, OdbcConnectionFactory};
pub use error::DbMakerError;
pub use results::CustomDbRow;
pub use types::{ConnectionKind, DriverParam, InsertId, ParamKey, RowValues};
