use tracing::debug;

use crate::config::ConnectOptions;
use crate::connection::DbStatement;
use crate::driver::{OdbcConnectionHandle, OdbcStatementHandle};
use crate::error::DbMakerError;
use crate::results::{CustomDbRow, rows_keys_to_lower};
use crate::translation::translate_named_params;
use crate::types::{ParamKey, RowValues};

/// Insertion-ordered parameter bindings of one statement.
///
/// A key bound a second time keeps its original position. Entries without a value go to the
/// driver as NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    entries: Vec<(ParamKey, Option<RowValues>)>,
}

impl ParameterMap {
    /// A map pre-populated with `names`, none of them bound yet.
    #[must_use]
    pub fn with_names(names: &[String]) -> Self {
        Self {
            entries: names
                .iter()
                .map(|name| (ParamKey::Named(name.clone()), None))
                .collect(),
        }
    }

    pub fn bind(&mut self, key: ParamKey, value: RowValues) {
        match self.entries.iter_mut().find(|(known, _)| *known == key) {
            Some((_, slot)) => *slot = Some(value),
            None => self.entries.push((key, Some(value))),
        }
    }

    /// Bound value for `key`; `None` when the key is absent or unbound.
    #[must_use]
    pub fn value(&self, key: &ParamKey) -> Option<&RowValues> {
        self.entries
            .iter()
            .find(|(known, _)| known == key)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &ParamKey> {
        self.entries.iter().map(|(key, _)| key)
    }

    /// Values in insertion order, unbound entries as NULL.
    #[must_use]
    pub fn positional_values(&self) -> Vec<RowValues> {
        self.entries
            .iter()
            .map(|(_, value)| value.clone().unwrap_or(RowValues::Null))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A prepared statement emulated over an ODBC statement handle.
///
/// Named `:param` tokens are rewritten to `?` at construction; the driver only ever sees
/// positional placeholders. Values go out in the order the parameter map holds them, and the
/// map is emptied after every execution, so a reused statement starts from a clean slate.
pub struct EmulatedStatement {
    sql: String,
    names: Vec<String>,
    params: ParameterMap,
    handle: Box<dyn OdbcStatementHandle>,
    options: ConnectOptions,
}

impl EmulatedStatement {
    /// Translate `raw_sql` and prepare it on `conn`.
    ///
    /// # Errors
    /// Returns `DbMakerError::DriverExecutionError` if the driver cannot prepare the translated
    /// text.
    pub fn new(
        conn: &mut dyn OdbcConnectionHandle,
        raw_sql: &str,
        options: ConnectOptions,
    ) -> Result<Self, DbMakerError> {
        let translated = translate_named_params(raw_sql);
        debug!(
            sql = %translated.sql,
            params = translated.names.len(),
            placeholders = translated.placeholders,
            "preparing emulated statement"
        );
        let handle = conn.prepare(&translated.sql)?;
        let params = ParameterMap::with_names(&translated.names);
        Ok(Self {
            sql: translated.sql.into_owned(),
            names: translated.names,
            params,
            handle,
            options,
        })
    }

    /// SQL as sent to the driver.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Named tokens found in the original text, in order of first appearance.
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn parameters(&self) -> &ParameterMap {
        &self.params
    }
}

impl DbStatement for EmulatedStatement {
    fn bind_value(&mut self, key: ParamKey, value: RowValues) {
        self.params.bind(key, value);
    }

    fn execute(&mut self) -> Result<(), DbMakerError> {
        let values = self.params.positional_values();
        self.params.clear();
        debug!(sql = %self.sql, values = values.len(), "executing emulated statement");
        self.handle.execute(&values)
    }

    fn fetch(&mut self) -> Result<Option<CustomDbRow>, DbMakerError> {
        self.handle.fetch_row()
    }

    fn fetch_all(&mut self) -> Result<Vec<CustomDbRow>, DbMakerError> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch()? {
            rows.push(row);
        }
        if self.options.idcap {
            rows = rows_keys_to_lower(&rows);
        }
        Ok(rows)
    }

    fn row_count(&mut self) -> Result<i64, DbMakerError> {
        self.handle.row_count()
    }
}

impl std::fmt::Debug for EmulatedStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulatedStatement")
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::OdbcDriver;
    use crate::test_utils::MockDriver;

    fn prepare(driver: &MockDriver, sql: &str, options: ConnectOptions) -> EmulatedStatement {
        let mut conn = driver.open("TESTDB", "SYSADM", "").unwrap();
        EmulatedStatement::new(conn.as_mut(), sql, options).unwrap()
    }

    #[test]
    fn scanned_names_start_unbound() {
        let driver = MockDriver::new();
        let stmt = prepare(
            &driver,
            "select * from t where a = :a and b = :b",
            ConnectOptions::default(),
        );
        assert_eq!(stmt.sql(), "select * from t where a = ? and b = ?");
        assert_eq!(stmt.parameter_names(), [":a", ":b"]);
        assert_eq!(stmt.parameters().len(), 2);
        assert_eq!(stmt.parameters().value(&":a".into()), None);
        assert_eq!(driver.prepared_sql(), ["select * from t where a = ? and b = ?"]);
    }

    #[test]
    fn rebinding_overwrites_in_place_and_unknown_keys_append() {
        let driver = MockDriver::new();
        let mut stmt = prepare(
            &driver,
            "update t set a = :a where id = :id",
            ConnectOptions::default(),
        );
        stmt.bind_value(":id".into(), RowValues::Int(1));
        stmt.bind_value(":a".into(), RowValues::Text("x".into()));
        stmt.bind_value(":id".into(), RowValues::Int(2));
        stmt.bind_value(":extra".into(), RowValues::Bool(true));

        let keys: Vec<String> = stmt.parameters().keys().map(ToString::to_string).collect();
        assert_eq!(keys, [":a", ":id", ":extra"]);
        assert_eq!(stmt.parameters().value(&":id".into()), Some(&RowValues::Int(2)));

        stmt.execute().unwrap();
        assert_eq!(
            driver.executed()[0].params,
            vec![
                RowValues::Text("x".into()),
                RowValues::Int(2),
                RowValues::Bool(true)
            ]
        );
    }

    #[test]
    fn unbound_names_are_sent_as_null() {
        let driver = MockDriver::new();
        let mut stmt = prepare(&driver, "select :a, :b from t", ConnectOptions::default());
        stmt.bind_value(":b".into(), RowValues::Int(5));
        stmt.execute().unwrap();
        assert_eq!(
            driver.executed()[0].params,
            vec![RowValues::Null, RowValues::Int(5)]
        );
    }

    #[test]
    fn map_is_cleared_after_execute_even_on_failure() {
        let driver = MockDriver::new();
        driver.fail_on("broken", "syntax error");

        let mut ok = prepare(&driver, "select * from t where id = :id", ConnectOptions::default());
        ok.bind_value(":id".into(), RowValues::Int(1));
        ok.execute().unwrap();
        assert!(ok.parameters().is_empty());
        ok.execute().unwrap();
        assert!(driver.executed()[1].params.is_empty());

        let mut bad = prepare(&driver, "select broken from t where id = :id", ConnectOptions::default());
        bad.bind_value(":id".into(), RowValues::Int(1));
        let err = bad.execute().unwrap_err();
        assert!(matches!(err, DbMakerError::DriverExecutionError(_)));
        assert!(bad.parameters().is_empty());
    }

    #[test]
    fn fetch_yields_one_row_at_a_time() {
        let driver = MockDriver::new();
        driver.on_query(
            "from users",
            vec![
                CustomDbRow::from_pairs([("ID", RowValues::Int(1))]),
                CustomDbRow::from_pairs([("ID", RowValues::Int(2))]),
            ],
        );
        let mut stmt = prepare(&driver, "select ID from users", ConnectOptions::default());
        stmt.execute().unwrap();
        assert_eq!(stmt.fetch().unwrap().unwrap().get("ID"), Some(&RowValues::Int(1)));
        assert_eq!(stmt.fetch().unwrap().unwrap().get("ID"), Some(&RowValues::Int(2)));
        assert!(stmt.fetch().unwrap().is_none());
    }

    #[test]
    fn fetch_all_folds_keys_with_idcap() {
        let driver = MockDriver::new();
        driver.on_query(
            "from users",
            vec![CustomDbRow::from_pairs([
                ("NAME", RowValues::Text("Ann".into())),
                ("META", RowValues::JSON(serde_json::json!({"Tags": [{"Key": 1}]}))),
            ])],
        );

        let mut stmt = prepare(
            &driver,
            "select NAME, META from users",
            ConnectOptions::default().with_idcap(true),
        );
        stmt.execute().unwrap();
        let rows = stmt.fetch_all().unwrap();
        assert_eq!(rows[0].column_names.as_slice(), ["name", "meta"]);
        assert_eq!(
            rows[0].get("meta"),
            Some(&RowValues::JSON(serde_json::json!({"tags": [{"key": 1}]})))
        );

        let mut plain = prepare(&driver, "select NAME, META from users", ConnectOptions::default());
        plain.execute().unwrap();
        assert_eq!(plain.fetch_all().unwrap()[0].column_names.as_slice(), ["NAME", "META"]);
    }

    #[test]
    fn fetch_all_on_empty_result_is_empty() {
        let driver = MockDriver::new();
        let mut stmt = prepare(&driver, "select * from empty_table", ConnectOptions::default());
        stmt.execute().unwrap();
        assert!(stmt.fetch_all().unwrap().is_empty());
    }

    #[test]
    fn row_count_comes_from_driver() {
        let driver = MockDriver::new();
        driver.on_statement("delete from t", 3);
        let mut stmt = prepare(&driver, "delete from t", ConnectOptions::default());
        stmt.execute().unwrap();
        assert_eq!(stmt.row_count().unwrap(), 3);
    }
}
