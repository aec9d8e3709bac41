use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::connection::DbMakerConnection;
use crate::error::DbMakerError;
use crate::types::{InsertId, RowValues};

/// Session catalog holding the last serial value generated on this connection.
pub const LAST_SERIAL_CATALOG: &str = "sysconinfo";

static NUMERIC: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?\s*$").ok()
});

/// Numeric-string test with the usual scripting-language rules: optional surrounding
/// whitespace, optional sign, decimal or exponent forms. Hex and empty strings are not numeric.
#[must_use]
pub fn is_numeric(text: &str) -> bool {
    NUMERIC.as_ref().is_some_and(|re| re.is_match(text))
}

/// Post-processing of DBMaker results.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbMakerProcessor;

impl DbMakerProcessor {
    /// Run an insert, then read back the generated serial.
    ///
    /// DBMaker has no `RETURNING`; the id is `max(LAST_SERIAL)` from the session catalog, read
    /// in a second round trip. An insert from elsewhere on the same session in between would be
    /// reported instead.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the insert or the catalog read fails.
    pub fn process_insert_get_id(
        self,
        conn: &mut DbMakerConnection,
        sql: &str,
        rows: &[Vec<RowValues>],
    ) -> Result<InsertId, DbMakerError> {
        conn.insert_rows(sql, rows)?;
        let id = conn
            .catalog_table(LAST_SERIAL_CATALOG)
            .max("LAST_SERIAL")?
            .unwrap_or(RowValues::Null);
        debug!(?id, "last serial");
        Ok(Self::insert_id(id))
    }

    /// Integer id when `value` is numeric, the raw value otherwise.
    #[must_use]
    pub fn insert_id(value: RowValues) -> InsertId {
        match value {
            RowValues::Int(id) => InsertId::Int(id),
            #[allow(clippy::cast_possible_truncation)]
            RowValues::Float(f) if f.is_finite() => InsertId::Int(f.trunc() as i64),
            RowValues::Text(text) if is_numeric(&text) => match parse_integral(&text) {
                Some(id) => InsertId::Int(id),
                None => InsertId::Raw(RowValues::Text(text)),
            },
            other => InsertId::Raw(other),
        }
    }
}

fn parse_integral(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(id) = text.parse::<i64>() {
        return Some(id);
    }
    let float = text.parse::<f64>().ok()?;
    if !float.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(float.trunc() as i64)
}
