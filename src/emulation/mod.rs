//! Standard connection/statement behavior emulated on top of a call-based ODBC driver.

pub mod connection;
pub mod statement;

pub use connection::EmulatedConnection;
pub use statement::{EmulatedStatement, ParameterMap};
