//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::config::{ConnectOptions, DbMakerConfig, DbMakerConfigBuilder};
pub use crate::connection::{DbConnection, DbMakerConnection, DbStatement, SharedConnection};
pub use crate::connector::{ConnectionFactory, Connector, OdbcConnectionFactory};
pub use crate::driver::{OdbcConnectionHandle, OdbcDriver, OdbcStatementHandle};
pub use crate::emulation::{EmulatedConnection, EmulatedStatement, ParameterMap};
pub use crate::error::DbMakerError;
pub use crate::query::{
    DbMakerProcessor, DbMakerQueryGrammar, Direction, Query, QueryBuilder, QueryTranslator,
    Record, record,
};
pub use crate::results::CustomDbRow;
pub use crate::schema::{
    Blueprint, ColumnDefinition, ColumnType, DbMakerSchemaGrammar, SchemaBuilder,
    SchemaTranslator,
};
pub use crate::translation::translate_named_params;
pub use crate::types::{ConnectionKind, DriverParam, InsertId, ParamKey, RowValues};

#[cfg(feature = "odbc")]
pub use crate::driver::OdbcApiDriver;
